use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single posted form value: plain text or a repeated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Text content of the value; lists yield their first entry.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(items) => items.first().map(String::as_str),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Posted form fields in the order they were received.
///
/// Serializes as a JSON object so stashed data reads back the same way it was posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FieldValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value under the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append a value to a repeated field, promoting a text value to a list.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => match slot {
                FieldValue::List(items) => items.push(value),
                FieldValue::Text(previous) => {
                    let previous = std::mem::take(previous);
                    *slot = FieldValue::List(vec![previous, value]);
                }
            },
            None => self.entries.push((name, FieldValue::List(vec![value]))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = FormData::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FormData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormDataVisitor;

        impl<'de> Visitor<'de> for FormDataVisitor {
            type Value = FormData;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of form field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FormData, A::Error> {
                let mut data = FormData::new();
                while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
                    data.insert(name, value);
                }
                Ok(data)
            }
        }

        deserializer.deserialize_map(FormDataVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_arrival_order() {
        let mut data = FormData::new();
        data.insert("greeting", "Hello");
        data.insert("alias", "hello");
        data.insert("greeting", "Howdy");

        let names: Vec<&str> = data.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["greeting", "alias"]);
        assert_eq!(data.text("greeting"), Some("Howdy"));
    }

    #[test]
    fn test_push_promotes_to_list() {
        let mut data = FormData::new();
        data.insert("tags", "a");
        data.push("tags", "b");
        assert_eq!(
            data.get("tags"),
            Some(&FieldValue::List(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_json_shape_is_an_object() {
        let data: FormData = [("greeting", "Hi"), ("catid", "3")].into_iter().collect();
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"greeting":"Hi","catid":"3"}"#);

        let back: FormData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
