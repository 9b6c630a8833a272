//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Google OAuth login and callback
//! - Session token (JWT) issuing and verification
//! - The session gate in front of protected routes
//! - AuthedUser extractor for protected handlers

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod session;
pub mod token;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
pub use session::require_session;
