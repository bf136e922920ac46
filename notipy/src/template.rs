//! Placeholder substitution for message templates
//!
//! Templates use `{{ name }}` placeholders; whitespace inside the braces is
//! optional. Only variable interpolation is supported. A single trailing
//! newline of the template is dropped, as editors add one to most files.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Render `template` against `variables`, which must serialize to a JSON object.
pub fn render<V: Serialize + ?Sized>(template: &str, variables: &V) -> Result<String> {
    let vars = match serde_json::to_value(variables)? {
        Value::Object(map) => map,
        // No variables at all is fine, placeholders render empty
        Value::Null => Map::new(),
        other => {
            return Err(Error::InvalidVariables(format!(
                "variables must be an object, got {}",
                json_type(&other)
            )))
        }
    };

    Ok(substitute(strip_trailing_newline(template), &vars))
}

fn strip_trailing_newline(template: &str) -> &str {
    template
        .strip_suffix("\r\n")
        .or_else(|| template.strip_suffix('\n'))
        .unwrap_or(template)
}

fn substitute(template: &str, variables: &Map<String, Value>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };

        result.push_str(&rest[..start]);

        let name = after_open[..end].trim();
        if let Some(value) = variables.get(name) {
            push_value(&mut result, value);
        }

        rest = &after_open[end + CLOSE.len()..];
    }

    result.push_str(rest);
    result
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => {}
        // Arrays and objects use their JSON representation
        _ => out.push_str(&value.to_string()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
