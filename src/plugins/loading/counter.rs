use super::state::{LoadingState, LoadingValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-flight effect counters.
///
/// Counts are kept per effect and aggregated incrementally per model and
/// globally, so that at any instant:
/// - `models[m] == sum(effects[m][*])`
/// - `global == sum(models[*])`
///
/// A hide without a matching show is clamped: the counter stays at zero and
/// nothing else changes.
///
/// The counters are the stored state of the loading model; their JSON form has
/// the same shape as the numeric view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingCounters {
    global: usize,
    models: IndexMap<String, usize>,
    effects: IndexMap<String, IndexMap<String, usize>>,
}

impl LoadingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read counters back from stored model state
    pub fn from_value(state: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(state)
    }

    pub fn to_value(&self) -> Value {
        self.view(true).to_value()
    }

    /// Create zero entries for a model and its effects, keeping existing counts
    pub fn register<'a>(&mut self, model: &str, effects: impl IntoIterator<Item = &'a str>) {
        self.models.entry(model.to_string()).or_insert(0);
        let slots = self.effects.entry(model.to_string()).or_default();
        for effect in effects {
            slots.entry(effect.to_string()).or_insert(0);
        }
    }

    /// Count one more in-flight invocation; returns the effect's new count
    pub fn show(&mut self, model: &str, effect: &str) -> usize {
        let count = self
            .effects
            .entry(model.to_string())
            .or_default()
            .entry(effect.to_string())
            .or_insert(0);
        *count += 1;
        let count = *count;

        *self.models.entry(model.to_string()).or_insert(0) += 1;
        self.global += 1;
        count
    }

    /// Count one invocation as settled; returns the effect's new count, or
    /// `None` if there was nothing in flight to settle
    pub fn hide(&mut self, model: &str, effect: &str) -> Option<usize> {
        let count = self
            .effects
            .get_mut(model)
            .and_then(|slots| slots.get_mut(effect))
            .filter(|count| **count > 0)?;
        *count -= 1;
        let count = *count;

        if let Some(model_count) = self.models.get_mut(model) {
            *model_count = model_count.saturating_sub(1);
        }
        self.global = self.global.saturating_sub(1);
        Some(count)
    }

    pub fn global(&self) -> usize {
        self.global
    }

    pub fn model(&self, model: &str) -> usize {
        self.models.get(model).copied().unwrap_or(0)
    }

    pub fn effect(&self, model: &str, effect: &str) -> usize {
        self.effects
            .get(model)
            .and_then(|slots| slots.get(effect))
            .copied()
            .unwrap_or(0)
    }

    /// Exposed view: raw counts when `as_number`, `count > 0` flags otherwise
    pub fn view(&self, as_number: bool) -> LoadingState {
        let value = |count: usize| LoadingValue::from_count(count, as_number);

        LoadingState {
            global: value(self.global),
            models: self
                .models
                .iter()
                .map(|(model, count)| (model.clone(), value(*count)))
                .collect(),
            effects: self
                .effects
                .iter()
                .map(|(model, slots)| {
                    let slots: IndexMap<String, LoadingValue> = slots
                        .iter()
                        .map(|(effect, count)| (effect.clone(), value(*count)))
                        .collect();
                    (model.clone(), slots)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_creates_zero_entries() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout1", "timeout2"]);
        counters.register("empty", Vec::<&str>::new());

        assert_eq!(counters.global(), 0);
        assert_eq!(counters.model("count"), 0);
        assert_eq!(counters.effect("count", "timeout1"), 0);

        let view = counters.view(true);
        assert_eq!(view.models.get("empty"), Some(&LoadingValue::Count(0)));
        assert_eq!(view.effects["count"].len(), 2);
    }

    #[test]
    fn test_register_keeps_existing_counts() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout"]);
        counters.show("count", "timeout");

        counters.register("count", ["timeout", "other"]);

        assert_eq!(counters.effect("count", "timeout"), 1);
        assert_eq!(counters.effect("count", "other"), 0);
        assert_eq!(counters.model("count"), 1);
    }

    #[test]
    fn test_overlapping_shows_accumulate() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout"]);

        assert_eq!(counters.show("count", "timeout"), 1);
        assert_eq!(counters.show("count", "timeout"), 2);
        assert_eq!(counters.global(), 2);
        assert_eq!(counters.model("count"), 2);

        assert_eq!(counters.hide("count", "timeout"), Some(1));
        assert_eq!(counters.hide("count", "timeout"), Some(0));
        assert_eq!(counters.global(), 0);
    }

    #[test]
    fn test_show_creates_unregistered_slots() {
        let mut counters = LoadingCounters::new();
        counters.show("late", "fetch");

        assert_eq!(counters.effect("late", "fetch"), 1);
        assert_eq!(counters.model("late"), 1);
        assert_eq!(counters.global(), 1);
    }

    #[test]
    fn test_hide_without_show_is_clamped() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout1", "timeout2"]);
        counters.show("count", "timeout2");

        assert_eq!(counters.hide("count", "timeout1"), None);
        assert_eq!(counters.hide("missing", "timeout1"), None);

        assert_eq!(counters.effect("count", "timeout1"), 0);
        assert_eq!(counters.model("count"), 1);
        assert_eq!(counters.global(), 1);
    }

    #[test]
    fn test_models_aggregate_their_effects() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout1", "timeout2"]);
        counters.register("user", ["fetch"]);

        counters.show("count", "timeout1");
        counters.show("count", "timeout2");
        counters.show("user", "fetch");

        assert_eq!(counters.model("count"), 2);
        assert_eq!(counters.model("user"), 1);
        assert_eq!(counters.global(), 3);

        counters.hide("count", "timeout1");
        assert_eq!(counters.model("count"), 1);
        assert_eq!(counters.global(), 2);
    }

    #[test]
    fn test_stored_form_reads_back() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout"]);
        counters.show("count", "timeout");

        let stored = counters.to_value();
        assert_eq!(
            stored,
            serde_json::json!({ "global": 1, "models": { "count": 1 }, "effects": { "count": { "timeout": 1 } } })
        );
        assert_eq!(LoadingCounters::from_value(&stored).unwrap(), counters);
        assert!(LoadingCounters::from_value(&serde_json::json!("busy")).is_err());
    }

    #[test]
    fn test_boolean_view() {
        let mut counters = LoadingCounters::new();
        counters.register("count", ["timeout1", "timeout2"]);
        counters.show("count", "timeout1");
        counters.show("count", "timeout1");

        let view = counters.view(false);
        assert_eq!(view.global, LoadingValue::Flag(true));
        assert_eq!(view.models["count"], LoadingValue::Flag(true));
        assert_eq!(view.effects["count"]["timeout1"], LoadingValue::Flag(true));
        assert_eq!(view.effects["count"]["timeout2"], LoadingValue::Flag(false));
    }
}
