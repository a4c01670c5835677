//! API layer - health and metrics endpoints

pub mod health;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::ApiState;
