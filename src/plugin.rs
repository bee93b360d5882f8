//! Plugin hook protocol.
//!
//! Plugins are handed to [`init`](crate::store::init) and live as long as the store.
//! The store visits them at fixed points of its lifecycle:
//!
//! 1. [`Plugin::models`] during `init`, to inject plugin-owned models (and their reducers)
//! 2. [`Plugin::on_model`] for every user model, at `init` and on every later `add_model`
//! 3. [`Plugin::on_store_created`] once the store is fully built
//! 4. [`Plugin::middleware`] once during `init`; the middleware then sees every action
//! 5. [`Plugin::on_effect`] synchronously before every effect body starts

use crate::model::{Action, Model};
use crate::store::Store;
use std::sync::Arc;

/// Scope held for the lifetime of one effect invocation.
///
/// The store drops it inside the effect task once the effect body settled,
/// whatever the outcome, so release logic belongs in `Drop`.
pub trait EffectScope: Send {}

/// Observes every action before it is reduced
pub trait Middleware: Send + Sync {
    fn on_action(&self, action: &Action);
}

/// A store plugin
pub trait Plugin: Send + Sync {
    /// Plugin name, used in logs
    fn name(&self) -> &str;

    /// Models owned by the plugin, registered before any user model
    fn models(&self) -> Vec<Model> {
        Vec::new()
    }

    /// Called for every user model registered with the store
    fn on_model(&self, _store: &Store, _model: &Model) {}

    /// Called once the store is fully initialized
    fn on_store_created(&self, _store: &Store) {}

    /// Middleware contributed by the plugin
    fn middleware(&self) -> Option<Arc<dyn Middleware>> {
        None
    }

    /// Called before an effect body starts; the returned scope is released when it settles
    fn on_effect(&self, _store: &Store, _model: &str, _effect: &str) -> Option<Box<dyn EffectScope>> {
        None
    }
}
