pub mod config;
pub mod error;
pub mod index;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod providers;
pub mod reconciler;
pub mod session;
pub mod slots;

pub use error::SlotError;
