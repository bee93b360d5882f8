use super::Store;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors produced by the store itself while routing an action.
///
/// Errors returned by effect bodies are never wrapped in this type; they reach
/// the caller as the exact `anyhow::Error` the effect produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("action type {0:?} is not of the form \"model/action\"")]
    MalformedActionType(String),

    #[error("model {0:?} is not registered")]
    UnknownModel(String),

    #[error("model {model:?} has no action {action:?}")]
    UnknownAction { model: String, action: String },

    #[error("{0:?} is an effect and cannot be reduced synchronously")]
    NotAReducer(String),

    #[error("effect {0:?} dispatched outside of a tokio runtime")]
    NoRuntime(String),

    #[error("effect task was cancelled before completing")]
    Cancelled,

    #[error("dispatch result was already taken")]
    AlreadyCompleted,
}

/// Awaitable result of [`Store::dispatch`].
///
/// Reducer dispatches are applied before `dispatch` returns and resolve
/// immediately with the model's new state. Effect dispatches run on a tokio task
/// that starts whether or not this future is awaited; dropping it detaches the
/// effect without cancelling it.
#[derive(Debug)]
pub struct DispatchFuture {
    inner: DispatchState,
}

#[derive(Debug)]
enum DispatchState {
    Ready(Option<anyhow::Result<Value>>),
    Running(JoinHandle<anyhow::Result<Value>>),
}

impl DispatchFuture {
    pub(crate) fn ready(result: anyhow::Result<Value>) -> Self {
        Self {
            inner: DispatchState::Ready(Some(result)),
        }
    }

    pub(crate) fn failed(error: DispatchError) -> Self {
        Self::ready(Err(error.into()))
    }

    pub(crate) fn running(task: JoinHandle<anyhow::Result<Value>>) -> Self {
        Self {
            inner: DispatchState::Running(task),
        }
    }

    /// Whether this dispatch spawned an effect task
    pub fn is_effect(&self) -> bool {
        matches!(self.inner, DispatchState::Running(_))
    }

    /// Whether the result is available without waiting
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            DispatchState::Ready(result) => result.is_some(),
            DispatchState::Running(task) => task.is_finished(),
        }
    }
}

impl Future for DispatchFuture {
    type Output = anyhow::Result<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            DispatchState::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(DispatchError::AlreadyCompleted.into())),
            ),
            DispatchState::Running(task) => match Pin::new(task).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                // A panicking effect panics its awaiting caller, like a synchronous call would
                Poll::Ready(Err(join_error)) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Poll::Ready(Err(_)) => Poll::Ready(Err(DispatchError::Cancelled.into())),
            },
        }
    }
}

/// Dispatch surface bound to one model: `store.model("count").call("addOne", json!(null))`
#[derive(Clone)]
pub struct ModelDispatcher {
    store: Store,
    model: String,
}

impl ModelDispatcher {
    pub(crate) fn new(store: Store, model: impl Into<String>) -> Self {
        Self {
            store,
            model: model.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.model
    }

    /// Dispatch `<model>/<action>` with a payload
    pub fn call(&self, action: &str, payload: Value) -> DispatchFuture {
        self.store
            .dispatch(crate::model::Action::to(&self.model, action, payload))
    }

    /// Dispatch `<model>/<action>` with a payload and a meta object
    pub fn call_with_meta(&self, action: &str, payload: Value, meta: Value) -> DispatchFuture {
        self.store.dispatch(
            crate::model::Action::to(&self.model, action, payload).with_meta(meta),
        )
    }

    /// Current state of the bound model
    pub fn state(&self) -> Option<Value> {
        self.store.model_state(&self.model)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Everything an effect body receives
pub struct EffectContext {
    /// Action payload
    pub payload: Value,

    /// Action meta, passed through untouched
    pub meta: Option<Value>,

    /// Snapshot of the root state taken when the effect was dispatched
    pub root_state: Value,

    /// Dispatcher for the effect's own model
    pub dispatch: ModelDispatcher,
}

impl EffectContext {
    pub fn store(&self) -> &Store {
        self.dispatch.store()
    }
}
