use crate::store::Store;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One exposed loading value: a flag in boolean mode, a count in numeric mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadingValue {
    Flag(bool),
    Count(usize),
}

impl LoadingValue {
    pub fn from_count(count: usize, as_number: bool) -> Self {
        if as_number {
            Self::Count(count)
        } else {
            Self::Flag(count > 0)
        }
    }

    /// Whether anything is in flight
    pub fn is_loading(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Count(count) => *count > 0,
        }
    }

    /// The raw count, when exposed in numeric mode
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Flag(_) => None,
            Self::Count(count) => Some(*count),
        }
    }
}

impl From<LoadingValue> for Value {
    fn from(value: LoadingValue) -> Self {
        match value {
            LoadingValue::Flag(flag) => Value::Bool(flag),
            LoadingValue::Count(count) => Value::from(count),
        }
    }
}

/// The loading sub-state as it appears in the store under the plugin name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingState {
    pub global: LoadingValue,
    pub models: IndexMap<String, LoadingValue>,
    pub effects: IndexMap<String, IndexMap<String, LoadingValue>>,
}

impl LoadingState {
    /// Read the loading sub-state stored under `name`
    pub fn from_store(store: &Store, name: &str) -> Option<Self> {
        let value = store.model_state(name)?;
        serde_json::from_value(value).ok()
    }

    pub fn model(&self, model: &str) -> Option<LoadingValue> {
        self.models.get(model).copied()
    }

    pub fn effect(&self, model: &str, effect: &str) -> Option<LoadingValue> {
        self.effects
            .get(model)
            .and_then(|slots| slots.get(effect))
            .copied()
    }

    /// JSON form stored as model state
    pub fn to_value(&self) -> Value {
        let models: Map<String, Value> = self
            .models
            .iter()
            .map(|(model, value)| (model.clone(), Value::from(*value)))
            .collect();

        let effects: Map<String, Value> = self
            .effects
            .iter()
            .map(|(model, slots)| {
                let slots: Map<String, Value> = slots
                    .iter()
                    .map(|(effect, value)| (effect.clone(), Value::from(*value)))
                    .collect();
                (model.clone(), Value::Object(slots))
            })
            .collect();

        let mut state = Map::new();
        state.insert("global".to_string(), self.global.into());
        state.insert("models".to_string(), Value::Object(models));
        state.insert("effects".to_string(), Value::Object(effects));
        Value::Object(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(as_number: bool) -> LoadingState {
        let value = |count| LoadingValue::from_count(count, as_number);
        LoadingState {
            global: value(2),
            models: IndexMap::from([("count".to_string(), value(2))]),
            effects: IndexMap::from([(
                "count".to_string(),
                IndexMap::from([
                    ("timeout1".to_string(), value(2)),
                    ("timeout2".to_string(), value(0)),
                ]),
            )]),
        }
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(
            sample(true).to_value(),
            json!({
                "global": 2,
                "models": { "count": 2 },
                "effects": { "count": { "timeout1": 2, "timeout2": 0 } }
            })
        );
    }

    #[test]
    fn test_boolean_value() {
        assert_eq!(
            sample(false).to_value(),
            json!({
                "global": true,
                "models": { "count": true },
                "effects": { "count": { "timeout1": true, "timeout2": false } }
            })
        );
    }

    #[test]
    fn test_value_parses_back() {
        let state = sample(true);
        let parsed: LoadingState = serde_json::from_value(state.to_value()).unwrap();

        assert_eq!(parsed, state);
        assert_eq!(parsed.effect("count", "timeout1").and_then(|v| v.count()), Some(2));
        assert!(!parsed.effect("count", "timeout2").unwrap().is_loading());
    }

    #[test]
    fn test_loading_value_accessors() {
        assert!(LoadingValue::Flag(true).is_loading());
        assert_eq!(LoadingValue::Flag(true).count(), None);
        assert!(!LoadingValue::Count(0).is_loading());
        assert_eq!(LoadingValue::Count(3).count(), Some(3));
    }
}
