//! ABOUTME: Parser-only transform that strips imports and schema-conjunction
//! ABOUTME: prefixes from a declarative workflow document before compilation

/// Strip `import "..."` / `import (...)` declarations and `#Schema &`
/// conjunction prefixes so the document can be compiled without resolving
/// external schema imports. This is documented as a parser-only transform:
/// it must not change the semantics of the fields that survive it.
pub fn sanitize(text: &str) -> String {
    let without_imports = strip_imports(text);
    strip_schema_conjunctions(&without_imports)
}

fn strip_imports(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("import \"") || trimmed.starts_with("import '") {
            continue; // single-line import
        }
        if trimmed == "import (" {
            // block import: skip through the matching closing paren
            for inner in lines.by_ref() {
                if inner.trim() == ")" {
                    break;
                }
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Rewrite `name: #Schema & {` to `name: {` (and a bare `#Schema & {` to `{`),
/// so the remainder parses as a plain object literal.
fn strip_schema_conjunctions(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' {
            // scan the schema identifier
            let start = i;
            let mut j = i + 1;
            while j < bytes.len() && ((bytes[j] as char).is_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            let mut k = j;
            while k < bytes.len() && (bytes[k] as char).is_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'&') {
                let mut m = k + 1;
                while m < bytes.len() && (bytes[m] as char).is_whitespace() {
                    m += 1;
                }
                if bytes.get(m) == Some(&b'{') {
                    // drop `#Schema & ` entirely, keep the `{`
                    i = m;
                    continue;
                }
            }
            out.push_str(&text[start..j]);
            i = j;
            continue;
        }
        // copy one UTF-8 char verbatim
        let ch_len = text[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        out.push_str(&text[i..i + ch_len]);
        i += ch_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_line_import() {
        let input = "import \"strings\"\nworkflow: {}\n";
        let out = sanitize(input);
        assert!(!out.contains("import"));
        assert!(out.contains("workflow: {}"));
    }

    #[test]
    fn strips_block_import() {
        let input = "import (\n  \"strings\"\n  \"list\"\n)\nworkflow: {}\n";
        let out = sanitize(input);
        assert!(!out.contains("import"));
        assert!(out.contains("workflow: {}"));
    }

    #[test]
    fn strips_schema_conjunction_prefix() {
        let input = "workflow: #WorkflowSchema & {\n  name: \"x\"\n}\n";
        let out = sanitize(input);
        assert!(!out.contains('#'));
        assert!(out.contains("workflow: {"));
    }
}
