// Store module
//
// The Store owns the root state (one JSON value per model) behind an RwLock,
// routes actions to reducers and effects, runs plugin hooks and broadcasts
// change events to subscribers.

mod dispatch;

pub use dispatch::{DispatchError, DispatchFuture, EffectContext, ModelDispatcher};

use crate::metrics::Metrics;
use crate::model::{Action, Effect, Model, ModelValidationError, Reducer};
use crate::plugin::{EffectScope, Middleware, Plugin};
use crate::plugins::loading::ConfigError;
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Capacity of the store event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Root state: model name to model state, in registration order
pub type RootState = IndexMap<String, Value>;

/// Errors that abort store construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("invalid plugin configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid model: {0}")]
    Model(#[from] ModelValidationError),
}

/// Events broadcast to [`Store::subscribe`] receivers
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    /// An action passed middleware and is about to be handled
    ActionDispatched { action_type: String },

    /// A model's state was replaced
    StateChanged { model: String },

    /// A model was registered
    ModelAdded { model: String },
}

/// Everything `init` needs
#[derive(Default)]
pub struct StoreConfig {
    models: Vec<Model>,
    plugins: Vec<Arc<dyn Plugin>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    runtime: Option<Handle>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn models(mut self, models: impl IntoIterator<Item = Model>) -> Self {
        self.models.extend(models);
        self
    }

    pub fn plugin(self, plugin: impl Plugin + 'static) -> Self {
        self.plugin_arc(Arc::new(plugin))
    }

    /// Register a shared plugin, keeping a typed handle on the caller's side
    pub fn plugin_arc(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn middleware_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Runtime used for effects dispatched from outside any tokio context.
    ///
    /// Defaults to the runtime `init` is called from, if any.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }
}

/// Build a store: register plugin models, then user models (running every
/// plugin's `on_model` hook), then notify plugins the store exists.
pub fn init(config: StoreConfig) -> Result<Store, InitError> {
    let StoreConfig {
        models,
        plugins,
        mut middlewares,
        runtime,
    } = config;

    middlewares.extend(plugins.iter().filter_map(|plugin| plugin.middleware()));

    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let store = Store {
        inner: Arc::new(StoreInner {
            state: RwLock::new(IndexMap::new()),
            registry: RwLock::new(IndexMap::new()),
            plugins,
            middlewares,
            event_tx,
            metrics: Arc::new(Metrics::new()),
            runtime: runtime.or_else(|| Handle::try_current().ok()),
        }),
    };

    for plugin in &store.inner.plugins {
        for model in plugin.models() {
            model.validate()?;
            store.insert_model(model)?;
        }
    }

    for model in models {
        store.add_model(model)?;
    }

    for plugin in &store.inner.plugins {
        plugin.on_store_created(&store);
    }

    let plugin_names: Vec<&str> = store.inner.plugins.iter().map(|p| p.name()).collect();
    tracing::info!(
        "Store initialized: models={:?}, plugins={:?}, middlewares={}",
        store.model_names(),
        plugin_names,
        store.inner.middlewares.len()
    );

    Ok(store)
}

struct StoreInner {
    state: RwLock<RootState>,
    registry: RwLock<IndexMap<String, Model>>,
    plugins: Vec<Arc<dyn Plugin>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    event_tx: broadcast::Sender<StoreEvent>,
    metrics: Arc<Metrics>,
    runtime: Option<Handle>,
}

/// Resolved destination of an action
enum Target {
    Reducer(Reducer),
    Effect(Effect),
}

/// Shared handle to a store
///
/// Cloning is cheap; every clone sees the same state, plugins and subscribers.
///
/// # Usage
///
/// - [`dispatch()`](Self::dispatch) / [`model()`](Self::model) to send actions
/// - [`get_state()`](Self::get_state) or [`read()`](Self::read) to observe state
/// - [`subscribe()`](Self::subscribe) to listen for [`StoreEvent`]s
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Register a model after initialization.
    ///
    /// Every plugin's `on_model` hook runs for the new model.
    pub fn add_model(&self, model: Model) -> Result<(), ModelValidationError> {
        model.validate()?;
        self.insert_model(model.clone())?;

        for plugin in &self.inner.plugins {
            plugin.on_model(self, &model);
        }

        tracing::info!(
            "Model registered: {} (reducers={}, effects={})",
            model.name(),
            model.reducer_names().count(),
            model.effect_names().count()
        );
        Ok(())
    }

    fn insert_model(&self, model: Model) -> Result<(), ModelValidationError> {
        let name = model.name().to_string();
        {
            let mut registry = self.write_registry();
            if registry.contains_key(&name) {
                return Err(ModelValidationError::DuplicateModel(name));
            }
            self.write_state().insert(name.clone(), model.state().clone());
            registry.insert(name.clone(), model);
        }

        self.emit(StoreEvent::ModelAdded { model: name });
        Ok(())
    }

    /// Dispatch an action.
    ///
    /// Reducers are applied before this returns. Effects are started on a tokio
    /// task before this returns, after every plugin's `on_effect` hook ran.
    ///
    /// # Example
    /// ```ignore
    /// store.dispatch(Action::to("count", "addOne", Value::Null));
    /// let value = store.dispatch(Action::to("count", "timeout", Value::Null)).await?;
    /// ```
    pub fn dispatch(&self, action: Action) -> DispatchFuture {
        match self.try_dispatch(action) {
            Ok(future) => future,
            Err(e) => {
                tracing::warn!("Dispatch rejected: {}", e);
                DispatchFuture::failed(e)
            }
        }
    }

    /// Dispatch a reducer action synchronously and return the model's new stored state
    pub fn reduce(&self, action: Action) -> Result<Value, DispatchError> {
        let (model, action_name) = target_of(&action)?;
        match self.resolve(model, action_name)? {
            Target::Reducer(reducer) => {
                let model = model.to_string();
                self.before_dispatch(&action);
                Ok(self.apply_reducer(&model, &reducer, &action))
            }
            Target::Effect(_) => Err(DispatchError::NotAReducer(action.action_type.clone())),
        }
    }

    fn try_dispatch(&self, action: Action) -> Result<DispatchFuture, DispatchError> {
        let (model, action_name) = target_of(&action)?;
        let (model, action_name) = (model.to_string(), action_name.to_string());

        match self.resolve(&model, &action_name)? {
            Target::Reducer(reducer) => {
                self.before_dispatch(&action);
                let state = self.apply_reducer(&model, &reducer, &action);
                Ok(DispatchFuture::ready(Ok(state)))
            }
            Target::Effect(effect) => {
                let runtime = Handle::try_current()
                    .ok()
                    .or_else(|| self.inner.runtime.clone())
                    .ok_or_else(|| DispatchError::NoRuntime(action.action_type.clone()))?;

                self.before_dispatch(&action);
                Ok(self.run_effect(&runtime, &model, &action_name, effect, action))
            }
        }
    }

    fn resolve(&self, model: &str, action: &str) -> Result<Target, DispatchError> {
        let registry = self.read_registry();
        let entry = registry
            .get(model)
            .ok_or_else(|| DispatchError::UnknownModel(model.to_string()))?;

        if let Some(reducer) = entry.get_reducer(action) {
            return Ok(Target::Reducer(Arc::clone(reducer)));
        }
        if let Some(effect) = entry.get_effect(action) {
            return Ok(Target::Effect(Arc::clone(effect)));
        }
        Err(DispatchError::UnknownAction {
            model: model.to_string(),
            action: action.to_string(),
        })
    }

    fn before_dispatch(&self, action: &Action) {
        for middleware in &self.inner.middlewares {
            middleware.on_action(action);
        }
        self.inner.metrics.record_action();
        self.emit(StoreEvent::ActionDispatched {
            action_type: action.action_type.clone(),
        });
    }

    fn apply_reducer(&self, model: &str, reducer: &Reducer, action: &Action) -> Value {
        let new_state = {
            let mut state = self.write_state();
            let slot = state.entry(model.to_string()).or_insert(Value::Null);
            *slot = reducer(slot, action);
            slot.clone()
        };

        tracing::debug!("Reduced {}", action.action_type);
        self.inner.metrics.record_reducer();
        self.emit(StoreEvent::StateChanged {
            model: model.to_string(),
        });
        new_state
    }

    fn run_effect(
        &self,
        runtime: &Handle,
        model: &str,
        effect_name: &str,
        effect: Effect,
        action: Action,
    ) -> DispatchFuture {
        // Scopes are acquired synchronously so their side effects are visible
        // as soon as dispatch returns.
        let scopes: Vec<Box<dyn EffectScope>> = self
            .inner
            .plugins
            .iter()
            .filter_map(|plugin| plugin.on_effect(self, model, effect_name))
            .collect();

        let ctx = EffectContext {
            payload: action.payload,
            meta: action.meta,
            root_state: self.get_state(),
            dispatch: self.model(model),
        };
        let body = effect(ctx);

        let metrics = Arc::clone(&self.inner.metrics);
        let action_type = action.action_type;
        metrics.record_effect_started();
        tracing::debug!("Effect started: {}", action_type);

        let task = runtime.spawn(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(body).catch_unwind().await;
            drop(scopes);

            let result = match outcome {
                Ok(result) => result,
                Err(payload) => {
                    metrics.record_effect_settled(false, started.elapsed());
                    tracing::warn!("Effect panicked: {}", action_type);
                    panic::resume_unwind(payload)
                }
            };

            metrics.record_effect_settled(result.is_ok(), started.elapsed());
            match &result {
                Ok(_) => tracing::debug!("Effect finished: {}", action_type),
                Err(e) => tracing::debug!("Effect failed: {}: {}", action_type, e),
            }
            result
        });

        DispatchFuture::running(task)
    }

    /// Dispatcher bound to one model
    pub fn model(&self, name: &str) -> ModelDispatcher {
        ModelDispatcher::new(self.clone(), name)
    }

    /// Snapshot of the root state as a JSON object, each model rendered
    /// through its view
    pub fn get_state(&self) -> Value {
        let registry = self.read_registry();
        let state = self.read_state();
        Value::Object(
            state
                .iter()
                .map(|(name, value)| (name.clone(), render(&registry, name, value)))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Snapshot of one model's rendered state
    pub fn model_state(&self, name: &str) -> Option<Value> {
        let registry = self.read_registry();
        let state = self.read_state();
        state.get(name).map(|value| render(&registry, name, value))
    }

    /// Update a model's stored state outside of a reducer.
    ///
    /// The closure runs under the state write lock, so it is atomic with
    /// respect to reducers. Reserved for plugins maintaining their own models;
    /// returns `false` if the model is not registered.
    pub fn update_model<F>(&self, name: &str, update_fn: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        let updated = match self.write_state().get_mut(name) {
            Some(state) => {
                update_fn(state);
                true
            }
            None => false,
        };

        if updated {
            self.emit(StoreEvent::StateChanged {
                model: name.to_string(),
            });
        }
        updated
    }

    /// Names of all registered models, plugin models first
    pub fn model_names(&self) -> Vec<String> {
        self.read_registry().keys().cloned().collect()
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.read_registry().contains_key(name)
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is not an error
        let _ = self.inner.event_tx.send(event);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RootState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RootState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, IndexMap<String, Model>> {
        self.inner.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, IndexMap<String, Model>> {
        self.inner.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn render(registry: &IndexMap<String, Model>, name: &str, state: &Value) -> Value {
    match registry.get(name) {
        Some(model) => model.render(state),
        None => state.clone(),
    }
}

fn target_of(action: &Action) -> Result<(&str, &str), DispatchError> {
    action
        .target()
        .ok_or_else(|| DispatchError::MalformedActionType(action.action_type.clone()))
}
