//! Panini: semantic atom collection, integration and the autonomy driver.
//!
//! The library crates do the work: `panini_collectors` writes stores,
//! `panini_store` loads, unifies and reports. This crate adds the
//! configuration layer and the [`autonomy`] loop behind the `panini` binary.

pub mod autonomy;
pub mod config;

pub use config::{PaniniConfig, CONFIG_FILE};
