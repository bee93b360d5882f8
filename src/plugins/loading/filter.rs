use std::collections::HashSet;

/// Decides which effects are tracked, by fully-qualified action name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionFilter {
    /// Every effect is tracked
    #[default]
    All,

    /// Only the listed actions are tracked
    Whitelist(HashSet<String>),

    /// Every action except the listed ones is tracked
    Blacklist(HashSet<String>),
}

impl ActionFilter {
    pub fn whitelist<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Whitelist(actions.into_iter().map(Into::into).collect())
    }

    pub fn blacklist<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Blacklist(actions.into_iter().map(Into::into).collect())
    }

    /// Whether `"model/action"` is tracked (exact match)
    pub fn is_tracked(&self, action_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Whitelist(actions) => actions.contains(action_type),
            Self::Blacklist(actions) => !actions.contains(action_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tracks_everything() {
        assert!(ActionFilter::All.is_tracked("count/timeout"));
        assert!(ActionFilter::default().is_tracked("any/thing"));
    }

    #[test]
    fn test_whitelist() {
        let filter = ActionFilter::whitelist(["count/timeout"]);
        assert!(filter.is_tracked("count/timeout"));
        assert!(!filter.is_tracked("count/timeout2"));
        assert!(!filter.is_tracked("some/action"));
    }

    #[test]
    fn test_blacklist() {
        let filter = ActionFilter::blacklist(["count/timeout"]);
        assert!(!filter.is_tracked("count/timeout"));
        assert!(filter.is_tracked("count/timeout2"));
    }

    #[test]
    fn test_match_is_exact() {
        let filter = ActionFilter::whitelist(["count/Timeout"]);
        assert!(!filter.is_tracked("count/timeout"));
        assert!(!filter.is_tracked("count/Timeout "));
    }
}
