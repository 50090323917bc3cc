//! Event-booking API: sign-up, token authentication, owner-gated event
//! management and idempotent event registration.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod state;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test_support;
