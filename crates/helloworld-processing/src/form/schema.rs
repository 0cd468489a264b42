use helloworld_core::models::{FormData, SanitizedData};
use helloworld_core::AppError;
use serde::{Deserialize, Serialize};

use super::filters::{FilterKind, FilterSet};
use super::rules::{CompiledRule, Rule};

const ADD_GREETING_FORM: &str = include_str!("../../forms/add-greeting.json");

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Invalid form definition: {0}")]
    InvalidDefinition(#[from] serde_json::Error),

    #[error("Invalid pattern for field '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Form '{0}' declares no fields")]
    NoFields(String),

    #[error("Field '{0}' is declared twice")]
    DuplicateField(String),
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        AppError::Config(err.to_string())
    }
}

fn default_filters() -> Vec<FilterKind> {
    vec![FilterKind::StripTags]
}

/// One field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterKind>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Replaces the per-rule default messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            filters: default_filters(),
            rules: Vec::new(),
            message: None,
        }
    }

    pub fn filters(mut self, filters: Vec<FilterKind>) -> Self {
        self.filters = filters;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct FormDefinition {
    name: String,
    fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone)]
struct CompiledField {
    spec: FieldSpec,
    rules: Vec<CompiledRule>,
}

/// Fields, filters and rules for one submission type.
#[derive(Debug, Clone)]
pub struct FormSchema {
    name: String,
    fields: Vec<CompiledField>,
    filters: FilterSet,
}

impl FormSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, FormError> {
        let name = name.into();
        if fields.is_empty() {
            return Err(FormError::NoFields(name));
        }

        let filters = FilterSet::new().map_err(|source| FormError::InvalidPattern {
            field: String::new(),
            source,
        })?;

        let mut compiled: Vec<CompiledField> = Vec::with_capacity(fields.len());
        for spec in fields {
            if compiled.iter().any(|f| f.spec.name == spec.name) {
                return Err(FormError::DuplicateField(spec.name));
            }
            let rules = spec
                .rules
                .iter()
                .map(|r| r.compile())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| FormError::InvalidPattern {
                    field: spec.name.clone(),
                    source,
                })?;
            compiled.push(CompiledField { spec, rules });
        }

        Ok(Self {
            name,
            fields: compiled,
            filters,
        })
    }

    /// Load a schema from its JSON definition.
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        let definition: FormDefinition = serde_json::from_str(json)?;
        Self::new(definition.name, definition.fields)
    }

    /// The front-end "add greeting" form: `greeting` is required, tag-stripped and at most
    /// 255 characters.
    pub fn add_greeting_form() -> Result<Self, FormError> {
        Self::from_json(ADD_GREETING_FORM)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.spec.name.as_str())
    }

    /// Filter then validate. Unknown fields are dropped from the output.
    ///
    /// Pure: the same input always yields the same result.
    pub fn validate(&self, data: &FormData) -> Result<SanitizedData, Vec<FieldError>> {
        let mut sanitized = FormData::new();
        let mut errors = Vec::new();

        for field in &self.fields {
            let filtered = data
                .get(&field.spec.name)
                .map(|raw| self.filters.apply(&field.spec.filters, raw));

            for rule in &field.rules {
                if !rule.check(filtered.as_ref()) {
                    errors.push(FieldError {
                        field: field.spec.name.clone(),
                        message: field
                            .spec
                            .message
                            .clone()
                            .unwrap_or_else(|| rule.default_message(&field.spec.label)),
                    });
                }
            }

            if let Some(value) = filtered {
                sanitized.insert(field.spec.name.clone(), value);
            }
        }

        if errors.is_empty() {
            Ok(SanitizedData::new(sanitized))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        let mut data = FormData::new();
        for (k, v) in pairs {
            data.insert(*k, *v);
        }
        data
    }

    #[test]
    fn test_add_greeting_form_loads() {
        let schema = FormSchema::add_greeting_form().unwrap();
        assert_eq!(schema.name(), "add-greeting");
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["greeting"]);
    }

    #[test]
    fn test_greeting_is_stripped_and_unknown_fields_dropped() {
        let schema = FormSchema::add_greeting_form().unwrap();
        let data = form(&[("greeting", " <b>Hello</b> there "), ("id", "42")]);

        let sanitized = schema.validate(&data).unwrap();
        assert_eq!(sanitized.text("greeting"), Some("Hello there"));
        assert_eq!(sanitized.text("id"), None);
    }

    #[test]
    fn test_missing_greeting_fails() {
        let schema = FormSchema::add_greeting_form().unwrap();

        let errors = schema.validate(&FormData::new()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "greeting");
        assert_eq!(errors[0].message, "Field required: Message");

        // Tags alone strip down to nothing.
        assert!(schema.validate(&form(&[("greeting", "<p></p>")])).is_err());
    }

    #[test]
    fn test_greeting_too_long() {
        let schema = FormSchema::add_greeting_form().unwrap();
        let long = "x".repeat(256);
        let errors = schema.validate(&form(&[("greeting", &long)])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("255"));
    }

    #[test]
    fn test_all_errors_collected() {
        let schema = FormSchema::new(
            "contact",
            vec![
                FieldSpec::new("name", "Name").rule(Rule::Required),
                FieldSpec::new("email", "Email")
                    .rule(Rule::Required)
                    .rule(Rule::Email),
                FieldSpec::new("age", "Age")
                    .filters(vec![FilterKind::Trim])
                    .rule(Rule::Integer)
                    .message("Age is not a number"),
                FieldSpec::new("code", "Code").rule(Rule::MinLength { min: 4 }),
            ],
        )
        .unwrap();

        let data = form(&[("email", "nope"), ("age", "ten"), ("code", "ab")]);
        let errors = schema.validate(&data).unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "age", "code"]);
        assert_eq!(errors[2].message, "Age is not a number");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let schema = FormSchema::add_greeting_form().unwrap();
        let data = form(&[("greeting", "<i>hi</i>")]);

        let first = schema.validate(&data);
        let second = schema.validate(&data);
        assert_eq!(first, second);

        let bad = FormData::new();
        assert_eq!(schema.validate(&bad), schema.validate(&bad));
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(matches!(
            FormSchema::from_json("{ not json"),
            Err(FormError::InvalidDefinition(_))
        ));
        assert!(matches!(
            FormSchema::new("empty", vec![]),
            Err(FormError::NoFields(_))
        ));
        assert!(matches!(
            FormSchema::new(
                "dupe",
                vec![FieldSpec::new("a", "A"), FieldSpec::new("a", "A")]
            ),
            Err(FormError::DuplicateField(_))
        ));
        let json = r#"{"name":"x","fields":[{"name":"a","label":"A","rules":[{"type":"pattern","regex":"(["}]}]}"#;
        assert!(matches!(
            FormSchema::from_json(json),
            Err(FormError::InvalidPattern { .. })
        ));
    }
}
