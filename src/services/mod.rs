// src/services/mod.rs
//
// Shared services: the identity provider bridge and the record stores
// built on the persistence engine

pub mod google;
pub mod todos;
pub mod users;

// Re-export commonly used types for convenience
pub use google::{GoogleService, IdentityProvider};
pub use todos::TodoStore;
pub use users::UserStore;
