// Inventory collaborator
// Read-only item lookup used to validate reservation item selections

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;

pub use error::*;
pub use handlers::*;
pub use models::*;
pub use repository::*;
