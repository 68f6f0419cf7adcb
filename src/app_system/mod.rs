//! System orchestration, startup, and shutdown logic.

pub mod telemetry;
pub mod tracker_system;

pub use telemetry::*;
pub use tracker_system::*;
