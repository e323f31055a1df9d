//! Field-level drift between what the server holds (after merge) and what
//! the caller wants, with a unified text diff for display.
//!
//! A display aid over flat logical fields, not a patch engine.

use similar::TextDiff;

use dirsync_core::{DesiredState, FieldValue};

/// One changed logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Added { name: String, value: FieldValue },
    Removed { name: String, value: FieldValue },
    Changed {
        name: String,
        from: FieldValue,
        to: FieldValue,
    },
}

impl FieldChange {
    pub fn name(&self) -> &str {
        match self {
            FieldChange::Added { name, .. }
            | FieldChange::Removed { name, .. }
            | FieldChange::Changed { name, .. } => name,
        }
    }
}

/// Drift from `current` to `desired`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldDiff {
    pub changes: Vec<FieldChange>,
    pub unified_diff: String,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compare `current` (server view, merged into logical fields) with
/// `desired`. Changes are ordered by field name.
pub fn diff(current: &DesiredState, desired: &DesiredState) -> FieldDiff {
    let mut changes = Vec::new();

    for (name, value) in current.iter() {
        match desired.get(name) {
            None => changes.push(FieldChange::Removed {
                name: name.clone(),
                value: value.clone(),
            }),
            Some(wanted) if wanted != value => changes.push(FieldChange::Changed {
                name: name.clone(),
                from: value.clone(),
                to: wanted.clone(),
            }),
            Some(_) => {}
        }
    }
    for (name, value) in desired.iter() {
        if !current.is_present(name) {
            changes.push(FieldChange::Added {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
    changes.sort_by(|a, b| a.name().cmp(b.name()));

    let unified_diff = if changes.is_empty() {
        String::new()
    } else {
        let old = pretty(current);
        let new = pretty(desired);
        TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header("a/remote", "b/desired")
            .context_radius(3)
            .to_string()
    };

    FieldDiff {
        changes,
        unified_diff,
    }
}

fn pretty(state: &DesiredState) -> String {
    let mut text = serde_json::to_string_pretty(state).unwrap_or_default();
    text.push('\n');
    text
}
