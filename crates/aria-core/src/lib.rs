//! # aria-core
//!
//! Shared vocabulary for the Aria context augmentation engine.
//!
//! - **Errors**: [`ConfigError`] (fatal at startup) and [`ValidationError`]
//!   (caller input rejected before any network call)
//! - **Retry**: [`RetryConfig`] and exponential backoff with jitter
//! - **Tokens**: [`TokenEstimator`] strategy with the `chars / 4` default
//! - **Logging**: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod retry;
pub mod tokens;

pub use errors::{ConfigError, ValidationError};
pub use retry::RetryConfig;
pub use tokens::{CharRatioEstimator, TokenEstimator};
