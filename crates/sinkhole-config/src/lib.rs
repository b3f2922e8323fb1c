//! sinkhole-config: typed settings store for the sinkhole engine.
//!
//! Settings start from defaults and are overlaid by a TOML file. Each setting
//! is registered in [`item::ITEMS`] with its key path, type and validation
//! rule; the reader, the writer and the command line are all driven by that
//! registry.
//!
//! Runtime changes go through [`ConfigStore::set_from_text`]: the text is
//! parsed for the key's type, a full copy of the settings is built and
//! checked, and only then swapped in. Readers hold `Arc` snapshots.

pub mod error;
pub mod item;
pub mod loader;
pub mod parse;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod writer;

pub use error::ConfigError;
pub use item::{ApplyMode, ConfItem, ItemKind, Value};
pub use resolver::{DependentCheck, ResolverCheck, ResolverConfig};
pub use settings::Settings;
pub use store::{ConfigStore, SetOutcome};
pub use writer::write_toml;

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
