//! Loading plugin - tracks in-flight effects.
//!
//! The plugin injects a model (named `loading` unless configured otherwise) whose
//! state mirrors a set of [`LoadingCounters`]:
//!
//! ```text
//! loading.global                  any tracked effect in flight
//! loading.models.<model>          any tracked effect of <model> in flight
//! loading.effects.<model>.<name>  <model>/<name> in flight
//! ```
//!
//! Every tracked effect dispatch is bracketed by two actions handled by that
//! model's reducers:
//! 1. `<name>/show`, dispatched synchronously before the effect body starts
//! 2. `<name>/hide`, dispatched when the body settles, from the drop of a
//!    [`LoadingGuard`], so it fires on success, error and panic alike
//!
//! Both carry `{ "name": <model>, "action": <effect> }` as payload. The plugin
//! never touches the effect's result, so errors reach the caller unchanged.

mod config;
mod counter;
mod filter;
mod state;

pub use config::{ConfigError, DEFAULT_NAME, LoadingConfig, LoadingOptions};
pub use counter::LoadingCounters;
pub use filter::ActionFilter;
pub use state::{LoadingState, LoadingValue};

use crate::model::{Action, Model, action_type};
use crate::plugin::{EffectScope, Plugin};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of show/hide actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPayload {
    /// Model name
    pub name: String,

    /// Effect name
    pub action: String,
}

impl BracketPayload {
    fn to_value(&self) -> Value {
        serde_json::json!({ "name": self.name, "action": self.action })
    }
}

/// Plugin tracking in-flight effects per effect, per model and globally
///
/// The plugin itself holds only its configuration. Counters live in each
/// store's `<name>` model, so one plugin can be shared by several stores.
pub struct LoadingPlugin {
    config: LoadingConfig,
}

impl LoadingPlugin {
    /// Validate options and build the plugin
    pub fn new(options: LoadingOptions) -> Result<Self, ConfigError> {
        Ok(Self::with_config(options.validate()?))
    }

    /// Build the plugin from an untyped options object
    pub fn from_value(options: Value) -> Result<Self, ConfigError> {
        Self::new(LoadingOptions::from_value(options)?)
    }

    pub fn with_config(config: LoadingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoadingConfig {
        &self.config
    }

    /// Current loading state of `store`
    pub fn state(&self, store: &Store) -> Option<LoadingState> {
        LoadingState::from_store(store, self.config.name())
    }

    /// Reducer for show (`increment = true`) or hide
    fn bracket_reducer(increment: bool) -> impl Fn(&Value, &Action) -> Value + Send + Sync + 'static {
        move |state, action| {
            let target: BracketPayload = match serde_json::from_value(action.payload.clone()) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("Ignoring {} with malformed payload: {}", action.action_type, e);
                    return state.clone();
                }
            };
            let mut counters = match LoadingCounters::from_value(state) {
                Ok(counters) => counters,
                Err(e) => {
                    tracing::warn!("Ignoring {}: unreadable loading state: {}", action.action_type, e);
                    return state.clone();
                }
            };

            if increment {
                let count = counters.show(&target.name, &target.action);
                tracing::debug!("show {}/{} -> {}", target.name, target.action, count);
            } else {
                match counters.hide(&target.name, &target.action) {
                    Some(count) => {
                        tracing::debug!("hide {}/{} -> {}", target.name, target.action, count)
                    }
                    None => tracing::warn!(
                        "hide {}/{} without a matching show, clamped at 0",
                        target.name,
                        target.action
                    ),
                }
            }
            counters.to_value()
        }
    }
}

impl Default for LoadingPlugin {
    fn default() -> Self {
        Self::with_config(LoadingConfig::default())
    }
}

impl Plugin for LoadingPlugin {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn models(&self) -> Vec<Model> {
        let as_number = self.config.as_number();
        let model = Model::new(self.config.name(), LoadingCounters::new().to_value())
            .reducer("show", Self::bracket_reducer(true))
            .reducer("hide", Self::bracket_reducer(false))
            .view(move |state| match LoadingCounters::from_value(state) {
                Ok(counters) => counters.view(as_number).to_value(),
                Err(_) => state.clone(),
            });
        vec![model]
    }

    fn on_model(&self, store: &Store, model: &Model) {
        if model.name() == self.config.name() {
            return;
        }

        // Read, register and write back under the store's state lock, so a
        // concurrent show or hide is never overwritten
        let registered = store.update_model(self.config.name(), |state| {
            match LoadingCounters::from_value(state) {
                Ok(mut counters) => {
                    counters.register(model.name(), model.effect_names());
                    *state = counters.to_value();
                }
                Err(e) => tracing::warn!("Cannot register {}: unreadable loading state: {}", model.name(), e),
            }
        });
        if !registered {
            tracing::warn!("Loading model {} is not registered", self.config.name());
        }
    }

    fn on_store_created(&self, _store: &Store) {
        tracing::debug!(
            "Loading plugin ready: name={}, as_number={}, filter={:?}",
            self.config.name(),
            self.config.as_number(),
            self.config.filter()
        );
    }

    fn on_effect(&self, store: &Store, model: &str, effect: &str) -> Option<Box<dyn EffectScope>> {
        if !self.config.filter().is_tracked(&action_type(model, effect)) {
            tracing::trace!("{}/{} is not tracked", model, effect);
            return None;
        }

        let payload = BracketPayload {
            name: model.to_string(),
            action: effect.to_string(),
        }
        .to_value();

        if let Err(e) = store.reduce(Action::new(self.config.show_type(), payload.clone())) {
            tracing::warn!("Failed to dispatch {}: {}", self.config.show_type(), e);
            return None;
        }

        Some(Box::new(LoadingGuard {
            store: store.clone(),
            hide: Some(Action::new(self.config.hide_type(), payload)),
        }))
    }
}

/// Dispatches the paired hide action when dropped
pub struct LoadingGuard {
    store: Store,
    hide: Option<Action>,
}

impl EffectScope for LoadingGuard {}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if let Some(action) = self.hide.take() {
            if let Err(e) = self.store.reduce(action) {
                tracing::warn!("Failed to dispatch hide: {}", e);
            }
        }
    }
}
