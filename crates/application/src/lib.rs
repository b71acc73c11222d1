//! Application layer - Use cases and orchestration
//!
//! Contains the seat availability engine, the booking transaction engine,
//! and the port definitions their infrastructure adapters implement.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
