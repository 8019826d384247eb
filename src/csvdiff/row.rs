use serde::ser::{Serialize, SerializeMap, Serializer};

/// One normalized spreadsheet row: column name to optional value, in column
/// order. Empty cells are stored as `None`, never as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: Vec<(String, Option<String>)>,
}

impl CsvRow {
    /// Synthesized key copied from the detected policy column.
    pub const POLICY_FIELD: &'static str = "Policy";

    /// Inserts or replaces `key`, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        let value = value.filter(|text| !text.is_empty());
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn policy(&self) -> Option<&str> {
        self.get(Self::POLICY_FIELD)
    }

    /// True when every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_none())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for CsvRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut row = CsvRow::default();
        for (key, value) in iter {
            row.insert(key, value.map(Into::into));
        }
        row
    }
}

impl Serialize for CsvRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}
