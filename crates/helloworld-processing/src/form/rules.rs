use helloworld_core::models::FieldValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

/// Validation rule as declared in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    Required,
    MaxLength { max: usize },
    MinLength { min: usize },
    /// Unanchored; write `^...$` to match the whole value
    Pattern { regex: String },
    Email,
    Integer,
}

impl Rule {
    pub fn compile(&self) -> Result<CompiledRule, regex::Error> {
        Ok(match self {
            Rule::Required => CompiledRule::Required,
            Rule::MaxLength { max } => CompiledRule::MaxLength(*max),
            Rule::MinLength { min } => CompiledRule::MinLength(*min),
            Rule::Pattern { regex } => CompiledRule::Pattern(Regex::new(regex)?),
            Rule::Email => CompiledRule::Email,
            Rule::Integer => CompiledRule::Integer,
        })
    }
}

/// Rule ready to run against filtered values.
#[derive(Debug, Clone)]
pub enum CompiledRule {
    Required,
    MaxLength(usize),
    MinLength(usize),
    Pattern(Regex),
    Email,
    Integer,
}

impl CompiledRule {
    /// Only `Required` looks at missing or blank values; every other rule passes them.
    pub fn check(&self, value: Option<&FieldValue>) -> bool {
        let value = match (self, value) {
            (CompiledRule::Required, v) => return v.is_some_and(|v| !v.is_blank()),
            (_, None) => return true,
            (_, Some(v)) if v.is_blank() => return true,
            (_, Some(v)) => v,
        };

        match value {
            FieldValue::Text(text) => self.check_str(text),
            FieldValue::List(items) => items
                .iter()
                .filter(|i| !i.trim().is_empty())
                .all(|i| self.check_str(i)),
        }
    }

    fn check_str(&self, value: &str) -> bool {
        match self {
            CompiledRule::Required => !value.trim().is_empty(),
            CompiledRule::MaxLength(max) => value.chars().count() <= *max,
            CompiledRule::MinLength(min) => value.chars().count() >= *min,
            CompiledRule::Pattern(regex) => regex.is_match(value),
            CompiledRule::Email => value.validate_email(),
            CompiledRule::Integer => value.trim().parse::<i64>().is_ok(),
        }
    }

    /// Message used when the field declares none of its own.
    pub fn default_message(&self, label: &str) -> String {
        match self {
            CompiledRule::Required => format!("Field required: {}", label),
            CompiledRule::MaxLength(max) => {
                format!("{} must be at most {} characters", label, max)
            }
            CompiledRule::MinLength(min) => {
                format!("{} must be at least {} characters", label, min)
            }
            CompiledRule::Email => format!("{} must be a valid email address", label),
            CompiledRule::Integer => format!("{} must be a whole number", label),
            CompiledRule::Pattern(_) => format!("Invalid field: {}", label),
        }
    }
}
