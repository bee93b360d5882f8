use super::filter::ActionFilter;
use crate::model::{action_type, is_qualified_action, is_valid_identifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// State key and action prefix used when no name is configured
pub const DEFAULT_NAME: &str = "loading";

/// Invalid loading plugin configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("malformed loading options: {0}")]
    Malformed(String),

    #[error("loading plugin name must be a non-empty string without '/' or whitespace, got {0:?}")]
    InvalidName(String),

    #[error("loading plugin cannot have both a whitelist and a blacklist")]
    ConflictingLists,

    #[error("{list} entry {entry:?} must be of the form \"model/action\"")]
    InvalidActionName { list: &'static str, entry: String },
}

/// Raw plugin options, as written by users.
///
/// Deserializes from settings files (`as_number`) as well as from
/// camelCase JSON objects (`asNumber`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "asNumber")]
    pub as_number: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<Vec<String>>,
}

impl LoadingOptions {
    /// Parse options from an untyped JSON object
    ///
    /// Type mismatches (`name: 42`, `whitelist: "some/action"`) become
    /// [`ConfigError::Malformed`].
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Expose integer counts instead of booleans
    pub fn numeric(mut self) -> Self {
        self.as_number = true;
        self
    }

    pub fn with_whitelist<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_blacklist<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the options once, at plugin construction
    pub fn validate(self) -> Result<LoadingConfig, ConfigError> {
        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        if !is_valid_identifier(&name) {
            return Err(ConfigError::InvalidName(name));
        }

        let whitelist = self.whitelist.filter(|list| !list.is_empty());
        let blacklist = self.blacklist.filter(|list| !list.is_empty());

        let filter = match (whitelist, blacklist) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingLists),
            (Some(list), None) => ActionFilter::whitelist(check_entries("whitelist", list)?),
            (None, Some(list)) => ActionFilter::blacklist(check_entries("blacklist", list)?),
            (None, None) => ActionFilter::All,
        };

        Ok(LoadingConfig {
            name,
            as_number: self.as_number,
            filter,
        })
    }
}

fn check_entries(list: &'static str, entries: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if let Some(entry) = entries.iter().find(|entry| !is_qualified_action(entry)) {
        return Err(ConfigError::InvalidActionName {
            list,
            entry: entry.clone(),
        });
    }
    Ok(entries)
}

/// Validated, immutable plugin configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingConfig {
    name: String,
    as_number: bool,
    filter: ActionFilter,
}

impl LoadingConfig {
    /// State key and action prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_number(&self) -> bool {
        self.as_number
    }

    pub fn filter(&self) -> &ActionFilter {
        &self.filter
    }

    /// `"<name>/show"`
    pub fn show_type(&self) -> String {
        action_type(&self.name, "show")
    }

    /// `"<name>/hide"`
    pub fn hide_type(&self) -> String {
        action_type(&self.name, "hide")
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            as_number: false,
            filter: ActionFilter::All,
        }
    }
}
