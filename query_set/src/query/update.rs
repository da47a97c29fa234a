use serde_json::{Map, Value};

/// Column changes of a batch UPDATE, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    changes: Vec<(String, Value)>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Set a column to a value, replacing an earlier change of the same column
    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        let column = column.into();
        match self.changes.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.changes.push((column, value)),
        }
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|(column, _)| column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changes.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl From<Map<String, Value>> for UpdateSet {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter()
            .fold(UpdateSet::new(), |set, (column, value)| set.set(column, value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for UpdateSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(UpdateSet::new(), |set, (column, value)| set.set(column, value))
    }
}
