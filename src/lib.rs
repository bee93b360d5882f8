// modelstore - Models and plugins over a reducer store
//
// This is the library crate: model definitions, the store, the plugin protocol
// and the loading plugin. The binary crate (main.rs) runs a small demo.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod plugin;
pub mod plugins;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{ConfigManager, LoggingSettings, Settings};
pub use model::{Action, Model, ModelValidationError};
pub use plugin::{EffectScope, Middleware, Plugin};
pub use plugins::loading::{ConfigError, LoadingOptions, LoadingPlugin, LoadingState, LoadingValue};
pub use store::{
    DispatchError, DispatchFuture, EffectContext, InitError, ModelDispatcher, Store, StoreConfig,
    StoreEvent, init,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
