//! # aria-guidance
//!
//! Rule-triggered procedural guidance for the agent prompt.
//!
//! Pipeline: [`GuidanceRegistry`] (definitions + compiled rules) →
//! [`detect`] over the recent-dialogue window → [`select`] under a token
//! budget.
//!
//! - Triggers are a sum type: keyword sets (`any`/`all`/`none`) or regexes
//! - Malformed rules fail at load time with [`aria_core::ConfigError`]
//! - Matching and selection are pure and hold no state between calls

#![deny(unsafe_code)]

pub mod budget;
pub mod engine;
pub mod matcher;
pub mod registry;
pub mod rules;
pub mod types;

pub use budget::{GuidanceSelection, select};
pub use engine::GuidanceEngine;
pub use matcher::{build_window, detect};
pub use registry::GuidanceRegistry;
pub use rules::{CompiledRule, CompiledTrigger};
pub use types::{Detection, GuidanceDefinition, Trigger, TriggerRule};
