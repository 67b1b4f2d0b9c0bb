// Reservation domain
// Pure booking rules (catalog, windows, pricing, fees, lifecycle) plus the
// repository, service and HTTP layers around them

pub mod cancellation;
pub mod catalog;
pub mod conflicts;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod price_calculator;
pub mod repository;
pub mod service;
pub mod status_machine;
pub mod window;

pub use cancellation::*;
pub use catalog::*;
pub use conflicts::*;
pub use error::*;
pub use handlers::*;
pub use lifecycle::*;
pub use models::*;
pub use price_calculator::*;
pub use repository::*;
pub use service::*;
pub use status_machine::*;
pub use window::*;
