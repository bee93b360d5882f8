//! Model definitions.
//!
//! A [`Model`] is a named slice of state plus the actions that operate on it:
//! - **Reducers**: synchronous `(state, action) -> state` transitions
//! - **Effects**: asynchronous operations that may dispatch reducers and are the
//!   only actions plugins can observe as "in flight"
//!
//! Every action is addressed by its fully-qualified type `"<model>/<action>"`, so
//! neither model names nor action names may contain the separator.

pub mod action;

pub use action::{
    Action, ACTION_SEPARATOR, action_type, is_qualified_action, is_valid_identifier,
    split_action_type,
};

use crate::store::EffectContext;
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Synchronous state transition: receives the current model state and the action
pub type Reducer = Arc<dyn Fn(&Value, &Action) -> Value + Send + Sync>;

/// Future returned by an effect
pub type EffectFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// Asynchronous model operation
pub type Effect = Arc<dyn Fn(EffectContext) -> EffectFuture + Send + Sync>;

/// Renders stored state into the state readers see
pub type View = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Errors raised when a model definition cannot be registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    #[error("model \"name\" [string] is required")]
    MissingName,

    #[error("invalid model name {0:?}: must not contain '/' or whitespace")]
    InvalidName(String),

    #[error("invalid action name {action:?} in model {model:?}: must not contain '/' or whitespace")]
    InvalidActionName { model: String, action: String },

    #[error("action {action:?} in model {model:?} is declared as both a reducer and an effect")]
    DuplicateAction { model: String, action: String },

    #[error("model {0:?} is already registered")]
    DuplicateModel(String),
}

/// A named unit of state with its reducers and effects
#[derive(Clone)]
pub struct Model {
    name: String,
    state: Value,
    reducers: IndexMap<String, Reducer>,
    effects: IndexMap<String, Effect>,
    view: Option<View>,
}

impl Model {
    /// Create a model with its initial state and no actions
    pub fn new(name: impl Into<String>, state: Value) -> Self {
        Self {
            name: name.into(),
            state,
            reducers: IndexMap::new(),
            effects: IndexMap::new(),
            view: None,
        }
    }

    /// Add a reducer
    ///
    /// # Example
    /// ```ignore
    /// let count = Model::new("count", json!(0))
    ///     .reducer("addOne", |state, _| json!(state.as_i64().unwrap_or(0) + 1));
    /// ```
    pub fn reducer<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&Value, &Action) -> Value + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Arc::new(reducer));
        self
    }

    /// Add an effect
    ///
    /// The closure is called once per dispatch; the future it returns is what
    /// plugins bracket as "in flight".
    pub fn effect<F, Fut>(mut self, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(EffectContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.effects
            .insert(name.into(), Arc::new(move |ctx| effect(ctx).boxed()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Initial state
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn reducer_names(&self) -> impl Iterator<Item = &str> {
        self.reducers.keys().map(String::as_str)
    }

    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn get_reducer(&self, name: &str) -> Option<&Reducer> {
        self.reducers.get(name)
    }

    pub fn get_effect(&self, name: &str) -> Option<&Effect> {
        self.effects.get(name)
    }

    /// Render stored state before it is exposed.
    ///
    /// Reducers keep receiving the stored state; `get_state`, `model_state` and
    /// effect contexts see the rendered one.
    pub fn view<F>(mut self, view: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.view = Some(Arc::new(view));
        self
    }

    /// State as readers see it
    pub fn render(&self, state: &Value) -> Value {
        match &self.view {
            Some(view) => view(state),
            None => state.clone(),
        }
    }

    /// Check the model can be registered with a store.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.is_empty() {
            return Err(ModelValidationError::MissingName);
        }
        if !is_valid_identifier(&self.name) {
            return Err(ModelValidationError::InvalidName(self.name.clone()));
        }

        for action in self.reducers.keys().chain(self.effects.keys()) {
            if !is_valid_identifier(action) {
                return Err(ModelValidationError::InvalidActionName {
                    model: self.name.clone(),
                    action: action.clone(),
                });
            }
        }

        if let Some(action) = self.reducers.keys().find(|r| self.effects.contains_key(*r)) {
            return Err(ModelValidationError::DuplicateAction {
                model: self.name.clone(),
                action: action.clone(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("reducers", &self.reducers.keys().collect::<Vec<_>>())
            .field("effects", &self.effects.keys().collect::<Vec<_>>())
            .field("view", &self.view.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count_model() -> Model {
        Model::new("count", json!(0))
            .reducer("addOne", |state, _| json!(state.as_i64().unwrap_or(0) + 1))
            .effect("timeout", |_ctx| async { Ok(Value::Null) })
    }

    #[test]
    fn test_valid_model() {
        let model = count_model();
        assert!(model.validate().is_ok());
        assert_eq!(model.reducer_names().collect::<Vec<_>>(), vec!["addOne"]);
        assert_eq!(model.effect_names().collect::<Vec<_>>(), vec!["timeout"]);
        assert_eq!(model.render(&json!(3)), json!(3));
    }

    #[test]
    fn test_missing_name_rejected() {
        let model = Model::new("", json!(0));
        assert_eq!(model.validate(), Err(ModelValidationError::MissingName));
    }

    #[test]
    fn test_invalid_model_name_rejected() {
        let model = Model::new("count/other", json!(0));
        assert!(matches!(model.validate(), Err(ModelValidationError::InvalidName(_))));
    }

    #[test]
    fn test_invalid_reducer_name_rejected() {
        let model = Model::new("a", json!(42)).reducer("model/invalid/name", |_, _| json!(43));
        assert_eq!(
            model.validate(),
            Err(ModelValidationError::InvalidActionName {
                model: "a".to_string(),
                action: "model/invalid/name".to_string(),
            })
        );
    }

    #[test]
    fn test_reducer_and_effect_with_same_name_rejected() {
        let model = Model::new("a", json!(0))
            .reducer("load", |s, _| s.clone())
            .effect("load", |_ctx| async { Ok(Value::Null) });

        assert!(matches!(
            model.validate(),
            Err(ModelValidationError::DuplicateAction { .. })
        ));
    }

    #[test]
    fn test_view_renders_stored_state() {
        let model = Model::new("flag", json!(2)).view(|state| json!(state.as_i64().unwrap_or(0) > 0));

        assert_eq!(model.render(model.state()), json!(true));
        assert_eq!(model.render(&json!(0)), json!(false));
    }

    #[test]
    fn test_debug_lists_action_names() {
        let debug = format!("{:?}", count_model());
        assert!(debug.contains("addOne"));
        assert!(debug.contains("timeout"));
    }
}
