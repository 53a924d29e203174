// ABOUTME: Variable substitution over strings, maps, and sequences
// ABOUTME: Replaces ${name} markers with instance variables and resolves dotted paths

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

use crate::model::Variables;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

/// Resolves `${name}` markers against a variables map.
///
/// Unknown names are left in place as literal text. Non-string scalars pass
/// through unchanged, and map keys are never rewritten.
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    variables: &'a Variables,
}

impl<'a> VariableResolver<'a> {
    pub fn new(variables: &'a Variables) -> Self {
        Self { variables }
    }

    /// Recursively resolve markers in a JSON value
    pub fn resolve(&self, template: &Value) -> Value {
        match template {
            Value::String(s) => Value::String(self.resolve_str(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.resolve(value)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Resolve markers in a single string
    pub fn resolve_str(&self, template: &str) -> String {
        if !template.contains("${") {
            return template.to_string();
        }

        placeholder()
            .replace_all(template, |caps: &Captures| {
                let name = &caps[1];
                match lookup(self.variables, name) {
                    Some(value) => display_value(value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        lookup(self.variables, path)
    }
}

/// Look a name up in the variables: an exact key wins, otherwise the name is
/// walked as a dotted path through nested objects and arrays.
pub fn lookup<'v>(variables: &'v Variables, path: &str) -> Option<&'v Value> {
    if let Some(value) = variables.get(path) {
        return Some(value);
    }

    let mut parts = path.split('.');
    let mut current = variables.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form of a value as used inside substituted text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
