//! Plugins shipped with the crate.
//!
//! - [`loading`]: in-flight effect tracking

pub mod loading;

pub use loading::{LoadingOptions, LoadingPlugin, LoadingState};
