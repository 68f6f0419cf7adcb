//! Order tracking core: public identifiers, submission rate limiting, order
//! status lifecycle, delivery calendar feed and CSV export.

pub mod clients;

pub mod actor_framework;
pub mod app_system;
pub mod calendar;
pub mod client_directory;
pub mod clock;
pub mod config;
pub mod domain;
pub mod export;
pub mod lifecycle;
pub mod messages;
pub mod order_store;
pub mod rate_limiter;
pub mod sequencer;

#[cfg(test)]
mod mock_framework;
