//! Per-user point balances backed by an append-only transaction history
//!
//! Every balance-mutating operation runs under a per-user lock handed out by
//! [`locks::LockRegistry`]. Operations are [`tower::Service`] implementations on
//! [`commands::DomainLogic`], which talks to storage through the traits in [`ports`].

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod locks;
pub mod ports;
pub mod telemetry;

pub use commands::{DomainLogic, Error};
pub use config::{Config, ConfigError};
