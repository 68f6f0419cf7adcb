//! The order store: owns every order and the identifier sequencer.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
