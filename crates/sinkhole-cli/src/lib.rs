//! # sinkhole-cli
//!
//! Command-line front end for the sinkhole engine.
//!
//! - **config**: read, change and rewrite settings with the same validation
//!   the engine applies at runtime
//! - **log**: append to, follow and inspect the shared log ring

pub mod cli;

pub use cli::run;
