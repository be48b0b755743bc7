// LinkVault services
// Services provide record stores, crypto, settings and the pure link helpers.

pub mod categorizer;
pub mod crypto_service;
pub mod link_metadata;
pub mod link_view;
pub mod local_record_store;
pub mod record_store;
pub mod settings_engine;
pub mod share_intent;
pub mod supabase_store;
