//! Advisory prop/state shape checks.
//!
//! Development aid only. A mismatch produces a [`ValidationWarning`] that is
//! logged and otherwise ignored; it never fails a transition.

use std::fmt;

use crate::types::{Map, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    key: String,
    kind: Option<ValueKind>,
    required: bool,
}

/// Expected keys of a props or state map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    fields: Vec<Field>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// A key that must be present with the given kind.
    pub fn required(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(Field {
            key: key.into(),
            kind: Some(kind),
            required: true,
        });
        self
    }

    /// A key that, when present, must have the given kind.
    pub fn optional(mut self, key: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(Field {
            key: key.into(),
            kind: Some(kind),
            required: false,
        });
        self
    }

    /// A key that must be present, of any kind.
    pub fn present(mut self, key: impl Into<String>) -> Self {
        self.fields.push(Field {
            key: key.into(),
            kind: None,
            required: true,
        });
        self
    }

    /// Check `map`. `Null` counts as absent.
    pub fn check(&self, map: &Map) -> Vec<(String, String)> {
        let mut problems = Vec::new();

        for field in &self.fields {
            match map.get(&field.key).filter(|value| !value.is_null()) {
                None if field.required => {
                    problems.push((field.key.clone(), "required key is missing".to_string()));
                }
                None => {}
                Some(value) => {
                    if let Some(kind) = field.kind
                        && value.kind() != kind
                    {
                        problems.push((
                            field.key.clone(),
                            format!("expected {kind}, found {}", value.kind()),
                        ));
                    }
                }
            }
        }

        problems
    }
}

/// What was validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTarget {
    Props,
    State,
}

impl fmt::Display for ShapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeTarget::Props => f.write_str("props"),
            ShapeTarget::State => f.write_str("state"),
        }
    }
}

/// One advisory shape mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub component: String,
    pub path: String,
    pub target: ShapeTarget,
    pub key: String,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at `{}`: {} `{}`: {}",
            self.component, self.path, self.target, self.key, self.message
        )
    }
}

/// Check `map` against `shape` and log every mismatch.
pub fn validate(
    component: &str,
    path: &str,
    target: ShapeTarget,
    shape: &Shape,
    map: &Map,
) -> Vec<ValidationWarning> {
    let warnings: Vec<ValidationWarning> = shape
        .check(map)
        .into_iter()
        .map(|(key, message)| ValidationWarning {
            component: component.to_string(),
            path: path.to_string(),
            target,
            key,
            message,
        })
        .collect();

    for warning in &warnings {
        tracing::warn!(
            component = %warning.component,
            path = %warning.path,
            target = %warning.target,
            key = %warning.key,
            "{}",
            warning.message
        );
    }

    warnings
}
