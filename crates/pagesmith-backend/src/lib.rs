//! Backend implementations of `RemoteStore`
//!
//! - `client` - HTTP client against the builder REST API
//! - `fake` - in-memory store with a call log, for tests and offline work
//! - `config` - connection settings, loadable from the environment

pub mod client;
pub mod config;
pub mod fake;
mod models;

pub use client::BuilderClient;
pub use config::RemoteConfig;
pub use fake::{FakeRemoteStore, StoreCall};
