// SPDX-License-Identifier: PMPL-1.0-or-later
//! Selection of alerts for bulk actions
//!
//! The set only ever holds identifiers that are visible under the current
//! filter. Callers must [`SelectionSet::reconcile`] after every criteria or
//! collection change so a bulk action cannot reach an alert the user no
//! longer sees.

use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Add `id`; returns false when it was already selected
    pub fn insert(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Membership becomes exactly `visible_ids`
    pub fn select_all<I, S>(&mut self, visible_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ids = visible_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop every member that is no longer visible
    ///
    /// Returns the identifiers that were dropped.
    pub fn reconcile<I, S>(&mut self, visible_ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let visible: HashSet<String> = visible_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let dropped: Vec<String> = self
            .ids
            .iter()
            .filter(|id| !visible.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &dropped {
            self.ids.remove(id);
        }
        dropped
    }

    /// Derived "select all" flag
    pub fn is_all_selected<I, S>(&self, visible_ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let visible: HashSet<String> = visible_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        !visible.is_empty()
            && visible.len() == self.ids.len()
            && visible.iter().all(|id| self.ids.contains(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Snapshot of the selection handed to a bulk action, in sorted order
    pub fn targets(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        selection.toggle("a");
        selection.toggle("b");
        assert!(selection.contains("a"));
        assert_eq!(selection.len(), 2);

        selection.toggle("a");
        assert!(!selection.contains("a"));
        assert_eq!(selection.targets(), vec!["b"]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut selection = SelectionSet::new();
        assert!(selection.insert("a"));
        assert!(!selection.insert("a"));
        assert_eq!(selection.targets(), vec!["a"]);
    }

    #[test]
    fn test_select_all_then_clear() {
        let visible = ["a", "b", "c"];
        let mut selection = SelectionSet::new();

        selection.select_all(visible);
        assert!(selection.is_all_selected(visible));

        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.is_all_selected(visible));
    }

    #[test]
    fn test_all_selected_requires_non_empty_view() {
        let selection = SelectionSet::new();
        let nothing: [&str; 0] = [];
        assert!(!selection.is_all_selected(nothing));
    }

    #[test]
    fn test_all_selected_false_for_partial_selection() {
        let mut selection = SelectionSet::new();
        selection.toggle("a");
        assert!(!selection.is_all_selected(["a", "b"]));
        selection.toggle("b");
        assert!(selection.is_all_selected(["b", "a"]));
    }

    #[test]
    fn test_reconcile_drops_only_hidden_members() {
        let mut selection = SelectionSet::new();
        selection.select_all(["a", "b", "c", "d"]);

        let visible = vec!["b".to_string(), "d".to_string(), "e".to_string()];
        let dropped = selection.reconcile(&visible);

        assert_eq!(dropped, vec!["a", "c"]);
        assert_eq!(selection.targets(), vec!["b", "d"]);
        assert!(selection.iter().all(|id| visible.iter().any(|v| v == id)));
        // Reconcile never adds
        assert!(!selection.contains("e"));
    }

    #[test]
    fn test_reconcile_with_empty_view_empties_selection() {
        let mut selection = SelectionSet::new();
        selection.select_all(["x", "y"]);
        let nothing: Vec<String> = Vec::new();
        selection.reconcile(&nothing);
        assert!(selection.is_empty());
    }
}
