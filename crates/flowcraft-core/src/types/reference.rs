//! ABOUTME: Parameter reference token parsing — the `${...}` grammar
//! ABOUTME: shared by the IR parser, the execution engine, and validators

use serde::{Deserialize, Serialize};

/// The closed set of nullary `${computed.*}` expressions. Anything outside
/// this set is a validation error, never silently passed through.
pub const COMPUTED_EXPRESSIONS: &[&str] = &["now", "today", "timestamp"];

/// A parsed `${...}` parameter reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterReference {
    /// `${user.<name>}`
    User { name: String },
    /// `${steps.<step_id>.outputs.<field>}`
    StepOutput { step_id: String, field: String },
    /// `${computed.<expr>}`
    Computed { expr: String },
    /// `${<ENV_NAME>}`
    Env { name: String },
}

impl ParameterReference {
    /// Parse a single reference token's inner body (without the `${` `}` delimiters).
    pub fn parse(body: &str) -> Option<Self> {
        if let Some(rest) = body.strip_prefix("user.") {
            return Some(Self::User {
                name: rest.to_string(),
            });
        }
        if let Some(rest) = body.strip_prefix("steps.") {
            let mut parts = rest.splitn(3, '.');
            let step_id = parts.next()?;
            let marker = parts.next()?;
            let field = parts.next()?;
            if marker != "outputs" || step_id.is_empty() || field.is_empty() {
                return None;
            }
            return Some(Self::StepOutput {
                step_id: step_id.to_string(),
                field: field.to_string(),
            });
        }
        if let Some(rest) = body.strip_prefix("computed.") {
            return Some(Self::Computed {
                expr: rest.to_string(),
            });
        }
        if !body.is_empty() && body.chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit()) {
            return Some(Self::Env {
                name: body.to_string(),
            });
        }
        None
    }

    /// Render back to the canonical `${...}` form (used by error messages and tests).
    pub fn render(&self) -> String {
        match self {
            Self::User { name } => format!("${{user.{name}}}"),
            Self::StepOutput { step_id, field } => format!("${{steps.{step_id}.outputs.{field}}}"),
            Self::Computed { expr } => format!("${{computed.{expr}}}"),
            Self::Env { name } => format!("${{{name}}}"),
        }
    }
}

/// Find every `${...}` span in a string value, in left-to-right order.
///
/// Implemented as a single tokenizing pass rather than a regex: the grammar
/// is just "balanced `${` `}` with no nesting", so a hand-rolled scan is
/// both simpler and avoids pulling in a dependency for one closed pattern.
pub fn find_reference_spans(value: &str) -> Vec<(usize, usize, &str)> {
    let mut spans = Vec::new();
    let bytes = value.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            if let Some(close) = value[i + 2..].find('}') {
                let end = i + 2 + close;
                spans.push((i, end + 1, &value[i + 2..end]));
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

/// A string value is a "pure reference" when it is exactly one `${...}` span
/// spanning the whole string (the common case: `parameters.file_id = "${steps.a.outputs.id}"`).
/// Anything else is treated as literal text with embedded references (not used
/// by this engine's closed substitution grammar, but detected so validation
/// can reject it explicitly instead of silently truncating).
pub fn as_pure_reference(value: &str) -> Option<ParameterReference> {
    let spans = find_reference_spans(value);
    let (start, end, body) = spans.first()?;
    if *start == 0 && *end == value.len() && spans.len() == 1 {
        ParameterReference::parse(body)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_reference() {
        assert_eq!(
            ParameterReference::parse("user.recipient_email"),
            Some(ParameterReference::User {
                name: "recipient_email".to_string()
            })
        );
    }

    #[test]
    fn parses_step_output_reference() {
        assert_eq!(
            ParameterReference::parse("steps.create_doc.outputs.document_id"),
            Some(ParameterReference::StepOutput {
                step_id: "create_doc".to_string(),
                field: "document_id".to_string(),
            })
        );
    }

    #[test]
    fn parses_computed_reference() {
        assert_eq!(
            ParameterReference::parse("computed.now"),
            Some(ParameterReference::Computed {
                expr: "now".to_string()
            })
        );
    }

    #[test]
    fn parses_env_reference() {
        assert_eq!(
            ParameterReference::parse("MCP_BASE_URL"),
            Some(ParameterReference::Env {
                name: "MCP_BASE_URL".to_string()
            })
        );
    }

    #[test]
    fn rejects_malformed_step_reference() {
        assert_eq!(ParameterReference::parse("steps.create_doc"), None);
    }

    #[test]
    fn finds_pure_reference() {
        let r = as_pure_reference("${steps.create_doc.outputs.document_id}").unwrap();
        assert_eq!(
            r,
            ParameterReference::StepOutput {
                step_id: "create_doc".to_string(),
                field: "document_id".to_string()
            }
        );
    }

    #[test]
    fn non_pure_reference_returns_none() {
        assert!(as_pure_reference("prefix ${user.x} suffix").is_none());
        assert!(as_pure_reference("no reference here").is_none());
    }
}
