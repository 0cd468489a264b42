use helloworld_core::models::FieldValue;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Input filters, applied in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Remove anything that looks like a markup tag
    StripTags,
    Trim,
    /// Keep the first integer found, or `0`
    Int,
    /// Leave the value alone
    Raw,
}

/// Compiled patterns used by the filters.
#[derive(Debug, Clone)]
pub struct FilterSet {
    tags: Regex,
    int: Regex,
}

impl FilterSet {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(r"(?s)<!--.*?-->|<[^<>]*>?")?,
            int: Regex::new(r"-?[0-9]+")?,
        })
    }

    pub fn apply_str(&self, kind: FilterKind, value: &str) -> String {
        match kind {
            FilterKind::StripTags => self.tags.replace_all(value, "").into_owned(),
            FilterKind::Trim => value.trim().to_string(),
            FilterKind::Int => self
                .int
                .find(value)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(0)
                .to_string(),
            FilterKind::Raw => value.to_string(),
        }
    }

    /// Run a filter chain over a field value; list values are filtered element-wise.
    pub fn apply(&self, kinds: &[FilterKind], value: &FieldValue) -> FieldValue {
        let run = |input: &str| {
            kinds
                .iter()
                .fold(input.to_string(), |acc, kind| self.apply_str(*kind, &acc))
        };

        match value {
            FieldValue::Text(text) => FieldValue::Text(run(text)),
            FieldValue::List(items) => FieldValue::List(items.iter().map(|i| run(i)).collect()),
        }
    }
}
