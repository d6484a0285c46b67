//! ABOUTME: Text interpolation for Agent Runtime prompt templates — `{{dot.path}}`
//! ABOUTME: placeholders resolved against the input bag, independent of the
//! ABOUTME: workflow document's `${...}` parameter reference grammar

use serde_json::Value;

/// Render `{{a.b.c}}` placeholders against a JSON input bag. Scalars are
/// interpolated as their display form; missing paths render as an empty
/// string rather than failing the whole prompt (agents are expected to
/// notice a blank field in their own output validation).
pub fn render(template: &str, inputs: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = template[i..].find("}}") {
                let path = template[i + 2..i + end].trim();
                output.push_str(&lookup(inputs, path));
                i += end + 2;
                continue;
            }
        }
        let ch = template[i..].chars().next().unwrap();
        output.push(ch);
        i += ch.len_utf8();
    }
    output
}

fn lookup(value: &Value, path: &str) -> String {
    let mut current = value;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    match current {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
