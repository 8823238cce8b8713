//! Variable bindings supplied to a template at render time.

use serde::Serialize;

/// Ordered set of named prompt variables.
///
/// A variable may be bound to `None` to mark an optional field that the
/// caller left out; guarded sections test for exactly that.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PromptVars {
    entries: Vec<(String, Option<String>)>,
}

impl PromptVars {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a required value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, Some(value.to_string()));
        self
    }

    /// Binds an optional value; `None` leaves the variable unset.
    #[must_use]
    pub fn with_optional(mut self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        self.insert(name, value.map(|v| v.to_string()));
        self
    }

    /// Inserts or replaces a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Returns the bound value, if the variable is present and set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Whether the variable is present and set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over variable names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of bound variables, set or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no variables are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_bindings_replace_earlier_ones() {
        let mut vars = PromptVars::new().with("name", "Kettle");
        vars.insert("name", Some("Toaster".to_owned()));

        assert_eq!(vars.get("name"), Some("Toaster"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn optional_none_is_present_but_unset() {
        let vars = PromptVars::new().with_optional("photo", None::<String>);

        assert_eq!(vars.names().collect::<Vec<_>>(), vec!["photo"]);
        assert!(!vars.is_set("photo"));
        assert_eq!(vars.get("photo"), None);
    }

    #[test]
    fn numbers_render_via_display() {
        let vars = PromptVars::new().with("price", 329.99);
        assert_eq!(vars.get("price"), Some("329.99"));
    }
}
