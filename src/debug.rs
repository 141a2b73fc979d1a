//! Shapes selected for verbose build logging

use std::collections::HashSet;

/// A case-insensitive set of shape names
///
/// With prefix matching enabled, a name also matches when its prefix is in
/// the set. The prefix of `Friendly_Infantry_Unit` is `friendly_infantry`;
/// names with fewer than two `_` use their first five characters.
#[derive(Debug, Clone, Default)]
pub struct DebugShapeSet {
    names: HashSet<String>,
    prefixes: HashSet<String>,
    match_prefix: bool,
}

impl DebugShapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    pub fn with_prefix_matching(mut self, enabled: bool) -> Self {
        self.match_prefix = enabled;
        self
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_lowercase());
        self.prefixes.insert(prefix(name));
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        if self.names.contains(&name.to_lowercase()) {
            return true;
        }
        self.match_prefix && self.prefixes.contains(&prefix(name))
    }
}

/// Lowercased name up to its second `_`, or its first five characters
fn prefix(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut underscores = lower.match_indices('_').map(|(i, _)| i);
    match (underscores.next(), underscores.next()) {
        (Some(_), Some(second)) => lower[..second].to_string(),
        _ => lower.chars().take(5).collect(),
    }
}
