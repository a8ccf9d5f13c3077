//! Task descriptors.

use serde::{Deserialize, Serialize};

/// A processing step that produces artifacts.
///
/// The name must identify the step instance uniquely within a run; it becomes
/// the local part of the `task:` activity id.
pub trait TaskDescriptor {
    /// Returns the task name.
    fn name(&self) -> &str;
}

/// A task known only by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    name: String,
}

impl Task {
    /// Creates a task descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TaskDescriptor for Task {
    fn name(&self) -> &str {
        &self.name
    }
}

impl TaskDescriptor for str {
    fn name(&self) -> &str {
        self
    }
}

impl TaskDescriptor for String {
    fn name(&self) -> &str {
        self
    }
}
