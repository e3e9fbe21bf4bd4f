//! Catalog of activities the operator can start.
//!
//! Each catalog entry pairs the wire name announced in `ChangeState` (for
//! example `"ActivityFastRead"`) with a human-readable label and a factory that
//! builds a fresh [`Activity`] every time the entry is started.  Indices are
//! stable: index 0 is always the first registered activity.

use std::collections::HashMap;
use std::fmt;

use tracing::info;

/// Behaviour of a running activity.
///
/// Only input that passed fencing for this activity's token is delivered.
#[cfg_attr(test, mockall::automock)]
pub trait Activity: Send {
    /// A client answered.  `address` identifies the client uniquely; `name` is
    /// its self-reported display name.
    fn input_received(&mut self, address: &str, name: &str, input: &str);
}

type ActivityFactory = Box<dyn Fn() -> Box<dyn Activity> + Send + Sync>;

/// One selectable activity.
pub struct ActivityEntry {
    name: &'static str,
    label: &'static str,
    factory: ActivityFactory,
}

impl ActivityEntry {
    /// Name announced to clients in `ChangeState`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Label shown to the operator.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Builds a fresh instance of the activity.
    pub fn create(&self) -> Box<dyn Activity> {
        (self.factory)()
    }
}

impl fmt::Debug for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityEntry")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Ordered list of activities.
#[derive(Debug)]
pub struct ActivityCatalog {
    entries: Vec<ActivityEntry>,
}

impl ActivityCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an activity; its index is the number of entries before it.
    pub fn with_activity<F>(mut self, name: &'static str, label: &'static str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Activity> + Send + Sync + 'static,
    {
        self.entries.push(ActivityEntry {
            name,
            label,
            factory: Box::new(factory),
        });
        self
    }

    pub fn get(&self, index: usize) -> Option<&ActivityEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(index, entry)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ActivityEntry)> {
        self.entries.iter().enumerate()
    }
}

impl Default for ActivityCatalog {
    /// The activities shipped with the host.
    fn default() -> Self {
        Self::new().with_activity(FastReadActivity::NAME, "Fast Read", || {
            Box::new(FastReadActivity::default())
        })
    }
}

// ── Fast Read ─────────────────────────────────────────────────────────────────

/// Flash-reading exercise: the operator pushes text fragments to all clients
/// with `Update` and clients respond with what they read.
///
/// The host side records every response and keeps a per-client tally.
#[derive(Debug, Default)]
pub struct FastReadActivity {
    responses: Vec<FastReadResponse>,
    per_client: HashMap<String, usize>,
}

/// One recorded client response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastReadResponse {
    pub address: String,
    pub name: String,
    pub input: String,
}

impl FastReadActivity {
    pub const NAME: &'static str = "ActivityFastRead";

    pub fn responses(&self) -> &[FastReadResponse] {
        &self.responses
    }

    /// Number of responses received from the client at `address`.
    pub fn response_count(&self, address: &str) -> usize {
        self.per_client.get(address).copied().unwrap_or(0)
    }
}

impl Activity for FastReadActivity {
    fn input_received(&mut self, address: &str, name: &str, input: &str) {
        let count = self.per_client.entry(address.to_string()).or_insert(0);
        *count += 1;
        info!(activity = Self::NAME, "{name} ({address}) answered #{count}: {input}");
        self.responses.push(FastReadResponse {
            address: address.to_string(),
            name: name.to_string(),
            input: input.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_fast_read_at_index_zero() {
        let catalog = ActivityCatalog::default();

        assert_eq!(catalog.len(), 1);
        let entry = catalog.get(0).expect("index 0 must exist");
        assert_eq!(entry.name(), "ActivityFastRead");
        assert_eq!(entry.label(), "Fast Read");
        assert!(catalog.get(1).is_none());
    }

    #[test]
    fn test_with_activity_assigns_sequential_indices() {
        // Arrange / Act
        let catalog = ActivityCatalog::new()
            .with_activity("ActivityA", "A", || Box::new(FastReadActivity::default()))
            .with_activity("ActivityB", "B", || Box::new(FastReadActivity::default()));

        // Assert
        let names: Vec<_> = catalog.iter().map(|(i, e)| (i, e.name())).collect();
        assert_eq!(names, vec![(0, "ActivityA"), (1, "ActivityB")]);
    }

    #[test]
    fn test_new_catalog_is_empty() {
        assert!(ActivityCatalog::new().is_empty());
    }

    #[test]
    fn test_fast_read_records_responses_per_client() {
        // Arrange
        let mut activity = FastReadActivity::default();

        // Act
        activity.input_received("10.0.0.2:5000", "alice", "tree");
        activity.input_received("10.0.0.3:5000", "bob", "tee");
        activity.input_received("10.0.0.2:5000", "alice", "house");

        // Assert
        assert_eq!(activity.responses().len(), 3);
        assert_eq!(activity.response_count("10.0.0.2:5000"), 2);
        assert_eq!(activity.response_count("10.0.0.3:5000"), 1);
        assert_eq!(activity.response_count("10.0.0.9:5000"), 0);
        assert_eq!(activity.responses()[1].input, "tee");
    }
}
