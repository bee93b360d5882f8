use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Separator between the model and action halves of an action type.
pub const ACTION_SEPARATOR: char = '/';

/// A single model or action name: no separator, no whitespace.
static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/\s]+$").expect("Invalid identifier regex"));

/// A fully-qualified `model/action` name.
static QUALIFIED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^/\s]+/[^/\s]+$").expect("Invalid action type regex"));

/// An action flowing through the store.
///
/// The `action_type` is always fully qualified (`"count/addOne"`). Payload and meta
/// are free-form JSON and are handed to reducers and effects untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default)]
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Action {
    /// Create an action without meta
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
            meta: None,
        }
    }

    /// Create an action addressed to `model/action`
    pub fn to(model: &str, action: &str, payload: Value) -> Self {
        Self::new(action_type(model, action), payload)
    }

    /// Attach a meta object
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Split the action type into `(model, action)`.
    ///
    /// Returns `None` for malformed types such as `"count"` or `"a/b/c"`.
    pub fn target(&self) -> Option<(&str, &str)> {
        split_action_type(&self.action_type)
    }
}

/// Build the fully-qualified action type for a model action
pub fn action_type(model: &str, action: &str) -> String {
    format!("{model}{ACTION_SEPARATOR}{action}")
}

/// Split `"model/action"` into its halves
pub fn split_action_type(action_type: &str) -> Option<(&str, &str)> {
    if !is_qualified_action(action_type) {
        return None;
    }
    action_type.split_once(ACTION_SEPARATOR)
}

/// Check that a model or action name can be used as one half of an action type
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(name)
}

/// Check that a string is a well-formed `model/action` name
pub fn is_qualified_action(action_type: &str) -> bool {
    QUALIFIED_PATTERN.is_match(action_type)
}
