//! Per-batch bookkeeping for deferred foreign keys.
//!
//! A [`BatchState`] lives for one DDL run. It remembers which models already
//! had their `CREATE TABLE` emitted and which references are waiting for a
//! target table, and is dropped when the run ends.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::{DdlError, Result};

/// A foreign key field waiting for its target table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PendingReference {
    /// Name of the referencing model.
    pub model: String,
    /// Name of the relation field on the referencing model.
    pub field: String,
}

impl PendingReference {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }
}

/// References grouped by the name of the model they point to.
pub type ReferenceMap = IndexMap<String, Vec<PendingReference>>;

/// Mutable state of one DDL batch.
#[derive(Debug, Default)]
pub struct BatchState {
    known_models: IndexSet<String>,
    pending: ReferenceMap,
    cross_schema: ReferenceMap,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a model's table exists from here on.
    pub fn mark_known(&mut self, model: &str) {
        self.known_models.insert(model.to_string());
    }

    pub fn is_known(&self, model: &str) -> bool {
        self.known_models.contains(model)
    }

    /// Defer a reference until `target` is created.
    pub fn defer(&mut self, target: &str, reference: PendingReference) {
        self.pending
            .entry(target.to_string())
            .or_default()
            .push(reference);
    }

    /// Move a reference into the cross-schema set.
    pub fn defer_cross_schema(&mut self, target: &str, reference: PendingReference) {
        self.cross_schema
            .entry(target.to_string())
            .or_default()
            .push(reference);
    }

    /// Remove and return the references waiting on `target`.
    pub fn take_pending(&mut self, target: &str) -> Vec<PendingReference> {
        self.pending.shift_remove(target).unwrap_or_default()
    }

    /// Targets with references still waiting.
    pub fn pending_targets(&self) -> Vec<String> {
        self.pending.keys().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn cross_schema(&self) -> &ReferenceMap {
        &self.cross_schema
    }

    /// Close the batch, handing over the cross-schema references.
    ///
    /// Fails when references are still waiting for a table that was never
    /// created in this batch.
    pub fn finish(self) -> Result<ReferenceMap> {
        if !self.pending.is_empty() {
            let unresolved = self
                .pending
                .iter()
                .flat_map(|(target, refs)| {
                    refs.iter()
                        .map(move |r| format!("{}.{} -> {}", r.model, r.field, target))
                })
                .collect();
            return Err(DdlError::UnresolvedReferences(unresolved));
        }
        Ok(self.cross_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defer_and_take() {
        let mut state = BatchState::new();
        state.defer("app.B", PendingReference::new("app.A", "b"));
        state.defer("app.B", PendingReference::new("app.C", "b"));
        assert_eq!(state.pending_count(), 2);

        let refs = state.take_pending("app.B");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].model, "app.A");
        assert_eq!(state.pending_count(), 0);
        assert!(state.take_pending("app.B").is_empty());
    }

    #[test]
    fn test_finish_reports_unresolved() {
        let mut state = BatchState::new();
        state.defer("app.Missing", PendingReference::new("app.A", "m"));
        match state.finish() {
            Err(DdlError::UnresolvedReferences(refs)) => {
                assert_eq!(refs, vec!["app.A.m -> app.Missing".to_string()]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_finish_returns_cross_schema() {
        let mut state = BatchState::new();
        state.mark_known("app.B");
        state.defer_cross_schema("app.B", PendingReference::new("app.A", "b"));
        assert!(state.is_known("app.B"));
        let cross = state.finish().unwrap();
        assert_eq!(cross["app.B"].len(), 1);
    }
}
