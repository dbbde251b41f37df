pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod event_sourcing;
pub mod metrics;
pub mod pagination;
pub mod seed;

#[cfg(test)]
pub(crate) mod testing;
