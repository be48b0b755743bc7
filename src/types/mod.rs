// LinkVault shared type definitions
// Each submodule defines types used across the client core.

pub mod errors;
pub mod link;
pub mod session;
pub mod settings;
