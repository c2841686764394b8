pub mod auth_state;
pub mod scanned_data;
pub mod user;

pub use auth_state::*;
pub use scanned_data::*;
pub use user::*;
