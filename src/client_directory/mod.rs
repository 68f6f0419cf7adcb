//! Client records, stored in a generic [`ResourceActor`](crate::actor_framework::ResourceActor).

pub mod entity;
pub mod error;

pub use error::*;
