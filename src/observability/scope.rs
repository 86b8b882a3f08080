//! ObservationScope for begin/complete logging of multi-step operations
//!
//! - Logs `{name}_BEGIN` on creation (INFO)
//! - Logs `{name}_COMPLETE` when `complete()` is called (INFO)
//! - Logs `{name}_FAILED` when `fail()` is called (ERROR)
//! - Logs `{name}_INCOMPLETE` on drop otherwise (WARN)

use std::cell::Cell;

use super::logger::Logger;

/// A scope that logs start and end events around an operation
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope with identifying fields
    ///
    /// The fields are repeated on every event the scope emits.
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let scope = Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        };
        Logger::info(&format!("{}_BEGIN", name), &scope.field_refs());
        scope
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as failed with a reason
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &all_fields);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            let mut all_fields = self.field_refs();
            all_fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &all_fields);
        }
    }
}
