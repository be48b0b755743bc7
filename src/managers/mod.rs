// LinkVault state managers
// Managers own client-side state: the signed-in session and the cached link collection.

pub mod link_store;
pub mod listeners;
pub mod session_manager;
