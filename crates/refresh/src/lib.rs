//! Keeps a globe overlay in sync with its source.
//!
//! The [`OverlayController`] accepts a file path or endpoint address, turns it
//! into a layer through the [`SourceFetcher`] and [`OverlayParser`] seams, and
//! swaps that layer into the engine's [`layers::LayerCollection`]. An optional
//! fixed-rate timer repeats the cycle until the interval is cleared.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod fetch;
pub mod parser;
pub mod policy;
pub mod scheduler;
pub mod source;
mod triggers;

#[cfg(test)]
mod test_support;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use events::*;
pub use fetch::*;
pub use parser::*;
pub use policy::*;
pub use scheduler::*;
pub use source::*;
