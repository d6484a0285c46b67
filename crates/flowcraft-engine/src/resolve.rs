//! ABOUTME: Reference resolution against `{user, steps_outputs, env, computed}` —
//! ABOUTME: the single substitution pass used by both preparation-time validation
//! ABOUTME: and execute-time payload construction.

use chrono::{DateTime, TimeZone, Utc};
use flowcraft_core::error::{FlowError, Result};
use flowcraft_core::types::reference::{as_pure_reference, find_reference_spans, COMPUTED_EXPRESSIONS};
use flowcraft_core::types::ParameterReference;
use std::collections::HashMap;

/// Resolution context assembled once per preparation/execution pass.
pub struct ResolutionContext<'a> {
    pub user_parameters: &'a HashMap<String, serde_json::Value>,
    pub step_outputs: &'a HashMap<String, HashMap<String, serde_json::Value>>,
    pub environment: &'a HashMap<String, String>,
    pub now: DateTime<Utc>,
    pub user_timezone: Option<&'a str>,
}

impl<'a> ResolutionContext<'a> {
    /// Resolve one reference to a concrete JSON value, or an error describing
    /// why it can't be resolved right now (unbound user parameter, unknown
    /// step, undeclared output field, unset environment variable, or an
    /// expression outside the closed `${computed.*}` set).
    pub fn resolve(&self, reference: &ParameterReference) -> std::result::Result<serde_json::Value, String> {
        match reference {
            ParameterReference::User { name } => self
                .user_parameters
                .get(name)
                .cloned()
                .ok_or_else(|| format!("user parameter '{name}' was not supplied")),
            ParameterReference::StepOutput { step_id, field } => {
                let outputs = self
                    .step_outputs
                    .get(step_id)
                    .ok_or_else(|| format!("step '{step_id}' has not produced outputs yet"))?;
                outputs
                    .get(field)
                    .cloned()
                    .ok_or_else(|| format!("step '{step_id}' did not produce output field '{field}'"))
            }
            ParameterReference::Computed { expr } => self.resolve_computed(expr),
            ParameterReference::Env { name } => self
                .environment
                .get(name)
                .map(|v| serde_json::Value::String(v.clone()))
                .ok_or_else(|| format!("environment variable '{name}' is not configured")),
        }
    }

    fn resolve_computed(&self, expr: &str) -> std::result::Result<serde_json::Value, String> {
        if !COMPUTED_EXPRESSIONS.contains(&expr) {
            return Err(format!("'${{computed.{expr}}}' is not a supported computed expression"));
        }
        let local_now = self.localized_now();
        let value = match expr {
            "now" => local_now.to_rfc3339(),
            "today" => local_now.format("%Y-%m-%d").to_string(),
            "timestamp" => self.now.timestamp().to_string(),
            _ => unreachable!("guarded by COMPUTED_EXPRESSIONS check above"),
        };
        Ok(serde_json::Value::String(value))
    }

    fn localized_now(&self) -> DateTime<chrono_tz::Tz> {
        let tz = self
            .user_timezone
            .and_then(|tz| tz.parse::<chrono_tz::Tz>().ok())
            .unwrap_or(chrono_tz::UTC);
        tz.from_utc_datetime(&self.now.naive_utc())
    }

    /// Validate (without materializing) that every reference inside a step's
    /// parameter map resolves, appending one issue per failure.
    pub fn validate_step_parameters(&self, step_id: &str, parameters: &HashMap<String, serde_json::Value>, issues: &mut Vec<String>) {
        for (field, value) in parameters {
            self.validate_value(step_id, field, value, issues);
        }
    }

    fn validate_value(&self, step_id: &str, field: &str, value: &serde_json::Value, issues: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => {
                for (_, _, body) in find_reference_spans(s) {
                    match ParameterReference::parse(body) {
                        Some(reference) => {
                            if let Err(issue) = self.resolve(&reference) {
                                issues.push(format!("step '{step_id}' parameter '{field}': {issue}"));
                            }
                        }
                        None => issues.push(format!(
                            "step '{step_id}' parameter '{field}': '${{{body}}}' is not a valid reference"
                        )),
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    self.validate_value(step_id, field, item, issues);
                }
            }
            serde_json::Value::Object(map) => {
                for item in map.values() {
                    self.validate_value(step_id, field, item, issues);
                }
            }
            _ => {}
        }
    }

    /// Substitute every reference within a parameter value. A whole-string
    /// pure reference preserves the referenced value's JSON type; a string
    /// with one or more embedded references has each span stringified and
    /// spliced back into the surrounding text.
    pub fn substitute(&self, value: &serde_json::Value) -> Result<serde_json::Value> {
        match value {
            serde_json::Value::String(s) => self.substitute_string(s),
            serde_json::Value::Array(items) => {
                let resolved: Result<Vec<_>> = items.iter().map(|item| self.substitute(item)).collect();
                Ok(serde_json::Value::Array(resolved?))
            }
            serde_json::Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), self.substitute(item)?);
                }
                Ok(serde_json::Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn substitute_string(&self, s: &str) -> Result<serde_json::Value> {
        if let Some(reference) = as_pure_reference(s) {
            return self
                .resolve(&reference)
                .map_err(|issue| FlowError::internal(format!("unresolved reference at execute time: {issue}")));
        }

        let spans = find_reference_spans(s);
        if spans.is_empty() {
            return Ok(serde_json::Value::String(s.to_string()));
        }

        let mut out = String::new();
        let mut cursor = 0;
        for (start, end, body) in spans {
            out.push_str(&s[cursor..start]);
            let reference = ParameterReference::parse(body)
                .ok_or_else(|| FlowError::internal(format!("unresolved reference at execute time: '${{{body}}}' is not a valid reference")))?;
            let resolved = self
                .resolve(&reference)
                .map_err(|issue| FlowError::internal(format!("unresolved reference at execute time: {issue}")))?;
            out.push_str(&stringify(&resolved));
            cursor = end;
        }
        out.push_str(&s[cursor..]);
        Ok(serde_json::Value::String(out))
    }
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        user_parameters: &'a HashMap<String, serde_json::Value>,
        step_outputs: &'a HashMap<String, HashMap<String, serde_json::Value>>,
        environment: &'a HashMap<String, String>,
    ) -> ResolutionContext<'a> {
        ResolutionContext {
            user_parameters,
            step_outputs,
            environment,
            now: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            user_timezone: None,
        }
    }

    #[test]
    fn pure_reference_preserves_json_type() {
        let user_parameters = HashMap::new();
        let mut step_outputs = HashMap::new();
        let mut outputs = HashMap::new();
        outputs.insert("count".to_string(), serde_json::json!(42));
        step_outputs.insert("a".to_string(), outputs);
        let environment = HashMap::new();
        let context = ctx(&user_parameters, &step_outputs, &environment);

        let result = context
            .substitute(&serde_json::Value::String("${steps.a.outputs.count}".to_string()))
            .unwrap();
        assert_eq!(result, serde_json::json!(42));
    }

    #[test]
    fn embedded_reference_is_stringified_and_spliced() {
        let mut user_parameters = HashMap::new();
        user_parameters.insert("name".to_string(), serde_json::json!("Ada"));
        let step_outputs = HashMap::new();
        let environment = HashMap::new();
        let context = ctx(&user_parameters, &step_outputs, &environment);

        let result = context
            .substitute(&serde_json::Value::String("Hello ${user.name}!".to_string()))
            .unwrap();
        assert_eq!(result, serde_json::json!("Hello Ada!"));
    }

    #[test]
    fn computed_today_is_iso_formatted() {
        let user_parameters = HashMap::new();
        let step_outputs = HashMap::new();
        let environment = HashMap::new();
        let context = ctx(&user_parameters, &step_outputs, &environment);

        let result = context
            .substitute(&serde_json::Value::String("${computed.today}".to_string()))
            .unwrap();
        assert_eq!(result, serde_json::json!("2026-08-01"));
    }

    #[test]
    fn validate_reports_missing_user_parameter() {
        let user_parameters = HashMap::new();
        let step_outputs = HashMap::new();
        let environment = HashMap::new();
        let context = ctx(&user_parameters, &step_outputs, &environment);
        let mut parameters = HashMap::new();
        parameters.insert("to".to_string(), serde_json::json!("${user.recipient}"));

        let mut issues = Vec::new();
        context.validate_step_parameters("send", &parameters, &mut issues);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("recipient"));
    }

    #[test]
    fn validate_reports_unknown_computed_expression() {
        let user_parameters = HashMap::new();
        let step_outputs = HashMap::new();
        let environment = HashMap::new();
        let context = ctx(&user_parameters, &step_outputs, &environment);
        let mut parameters = HashMap::new();
        parameters.insert("when".to_string(), serde_json::json!("${computed.yesterday}"));

        let mut issues = Vec::new();
        context.validate_step_parameters("send", &parameters, &mut issues);
        assert_eq!(issues.len(), 1);
    }
}
