use super::SqlValue;
use crate::error::AppError;

/// SparseFields
///
/// The fields of an update payload in the order the client sent them. Inserting a name
/// that is already present replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseFields {
    entries: Vec<(String, SqlValue)>,
}

impl SparseFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for SparseFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = SparseFields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// PartialUpdate
///
/// The `SET` list of an UPDATE statement and the values it binds, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    pub assignments: String,
    pub values: Vec<SqlValue>,
}

impl PartialUpdate {
    /// Placeholder index for the identifying parameter the caller appends to the WHERE clause.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// bind_partial_update
///
/// Builds `"col1"=$1, "col2"=$2, ...` from the sparse fields. Each field name is looked up
/// in `columns` (external name to storage column) and falls back to itself when unmapped.
/// An empty payload is a client error.
pub fn bind_partial_update(
    fields: &SparseFields,
    columns: &[(&str, &str)],
) -> Result<PartialUpdate, AppError> {
    if fields.is_empty() {
        return Err(AppError::BadRequest("No data".to_string()));
    }

    let mut fragments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (index, (name, value)) in fields.iter().enumerate() {
        let column = columns
            .iter()
            .find(|(external, _)| *external == name)
            .map(|(_, column)| *column)
            .unwrap_or(name);
        fragments.push(format!("\"{}\"=${}", column, index + 1));
        values.push(value.clone());
    }

    Ok(PartialUpdate {
        assignments: fragments.join(", "),
        values,
    })
}
