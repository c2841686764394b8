pub mod account_service;
pub mod auth_provider;
pub mod auth_service;
pub mod card_parser;
pub mod firebase_auth;
pub mod registration_service;
pub mod session_service;
pub mod user_service;

pub use auth_provider::*;
pub use session_service::*;
pub use user_service::*;
