#![doc = "drillkit-core: core logic library for drillkit."]

//! This crate holds the drill workflows (register, delete, publish), the
//! traits every external backend is reached through, and the error taxonomy.
//! HTTP adapters and the CLI live in the `drillkit` crate.
//!
//! # Usage
//! Construct a workflow with references to concrete backends and call it:
//! [`register::Registrar`], [`delete::Deleter`], [`publish::publish`].

pub mod contract;
pub mod delete;
pub mod error;
pub mod fingerprint;
pub mod inputs;
pub mod publish;
pub mod register;
pub mod thumbnail;

pub use error::{DrillError, Result};
