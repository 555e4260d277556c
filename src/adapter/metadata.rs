// Per-test metadata descriptors supplied outside the event stream

use std::collections::BTreeMap;

use crate::state::TestMeta;

/// Test metadata keyed by full test name
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: BTreeMap<String, TestMeta>,
}

impl MetadataRegistry {
    pub fn new(entries: BTreeMap<String, TestMeta>) -> Self {
        Self { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, meta: TestMeta) {
        self.entries.insert(name.into(), meta);
    }

    pub fn get(&self, name: &str) -> Option<&TestMeta> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata carried by the stream, completed from the registry
    pub fn resolve(&self, name: &str, from_stream: TestMeta) -> TestMeta {
        match self.get(name) {
            Some(registered) => from_stream.or(registered),
            None => from_stream,
        }
    }
}
