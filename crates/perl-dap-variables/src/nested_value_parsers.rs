//! The exact "variable block splitter" / "nested array parser" / "nested
//! hash parser" / "typing rule" algorithms, operating one level at a time on
//! raw debugger text rather than eagerly parsing a full value tree.
//!
//! [`crate::VariableParser`] eagerly reconstructs a complete [`crate::PerlValue`]
//! tree and is useful where a caller genuinely wants that (e.g. rendering a
//! one-shot preview); nested handles in the DAP facade must expand one level
//! at a time rather than eagerly walking the whole structure, so the facade
//! (perl-dap's `variables` handler) is wired to the splitters in this module
//! instead.

/// How a scalar's textual value should be classified for the purpose of
/// minting a new `VariableHandle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTyping {
    /// `X=HASH(0x...)` or bare `HASH(0x...)`.
    Hash,
    /// `ARRAY(0x...)`.
    Array,
    /// `SCALAR(0x...)` (an indirection, not a leaf).
    Scalar,
    /// Anything else: a leaf value with no further expansion.
    Leaf,
}

/// Classify a raw value string per the debugger's typing rule.
pub fn classify_value(raw: &str) -> ValueTyping {
    let raw = raw.trim();
    if matches_hash_ref(raw) {
        ValueTyping::Hash
    } else if raw.starts_with("ARRAY(0x") && raw.ends_with(')') {
        ValueTyping::Array
    } else if raw.starts_with("SCALAR(0x") && raw.ends_with(')') {
        ValueTyping::Scalar
    } else {
        ValueTyping::Leaf
    }
}

/// `^(\w+=)?HASH\((0x[0-9a-f]+)\)` — an optional blessed-class prefix
/// followed by `HASH(0xADDR)`.
fn matches_hash_ref(raw: &str) -> bool {
    let after_prefix = match raw.find("HASH(0x") {
        Some(idx) => &raw[idx..],
        None => return false,
    };
    if !after_prefix.ends_with(')') {
        return false;
    }
    let prefix = &raw[..raw.len() - after_prefix.len()];
    let prefix_ok = prefix.is_empty() || (prefix.ends_with('=') && prefix[..prefix.len() - 1].chars().all(|c| c.is_alphanumeric() || c == '_'));
    let hex_ok = after_prefix["HASH(0x".len()..after_prefix.len() - 1].chars().all(|c| c.is_ascii_hexdigit());
    prefix_ok && hex_ok
}

/// Split the reply of `y` or `V` into `(name, raw_value)` entries. A
/// variable entry begins with a line whose first character is `$`, `@`, or
/// `%`, and extends until the next such line or a trailing `DB<N>` line.
/// Each entry's name/value are split on the first `= `.
pub fn split_variable_entries(output: &str) -> Vec<(String, String)> {
    let mut entries: Vec<String> = Vec::new();
    for line in output.lines() {
        let starts_entry = line.chars().next().is_some_and(|c| matches!(c, '$' | '@' | '%'));
        let is_prompt = is_db_prompt_line(line);
        if starts_entry {
            entries.push(line.to_string());
        } else if is_prompt {
            continue;
        } else if let Some(last) = entries.last_mut() {
            last.push('\n');
            last.push_str(line);
        }
    }
    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.trim_end();
            entry.split_once("= ").map(|(name, value)| (name.trim().to_string(), value.trim_end().to_string()))
        })
        .collect()
}

fn is_db_prompt_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("DB<") && trimmed.contains('>')
}

/// Parse a multi-line array dump (`(` ... `)` with indices `0`, `1`, … at a
/// fixed indentation) into its ordered top-level values. Each returned
/// string is the raw text of that element, including any further-indented
/// continuation lines for nested `HASH(0x...)`/`ARRAY(0x...)` blocks — those
/// are left for a subsequent, separate expansion rather than parsed here.
pub fn parse_nested_array(raw: &str) -> Vec<String> {
    parse_top_level_entries(raw, '(', ')')
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

/// Parse a multi-line hash dump (`key => value` entries at a fixed
/// indentation) into ordered `(key, value)` pairs.
pub fn parse_nested_hash(raw: &str) -> Vec<(String, String)> {
    parse_top_level_entries(raw, '{', '}')
}

/// Shared top-level splitter for the array/hash dump formats: find the
/// first line at the dump's base indentation (the line holding the integer
/// index, or the `key => value` pair), and every following line at the same
/// indentation starts a new entry; deeper-indented lines are continuations
/// of the current entry.
fn parse_top_level_entries(raw: &str, open: char, close: char) -> Vec<(String, String)> {
    let lines: Vec<&str> = raw.lines().collect();
    let body_lines: Vec<&str> = lines
        .iter()
        .skip_while(|l| !l.trim_start().starts_with(open) && !is_entry_start(l))
        .copied()
        .filter(|l| l.trim() != open.to_string() && l.trim() != close.to_string())
        .collect();

    let base_indent = body_lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut entries: Vec<String> = Vec::new();
    for line in &body_lines {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent <= base_indent {
            entries.push(line.trim_start().trim_end_matches(',').to_string());
        } else if let Some(last) = entries.last_mut() {
            last.push('\n');
            last.push_str(line);
        }
    }

    entries
        .into_iter()
        .map(|entry| split_index_or_pair(&entry))
        .collect()
}

fn is_entry_start(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Split `"0  value"` (array index form) or `"'key' => value"` (hash form)
/// into `(key, value)`. An array entry's key is its numeric index as text.
fn split_index_or_pair(entry: &str) -> (String, String) {
    if let Some((key, value)) = entry.split_once("=>") {
        (key.trim().trim_matches(|c| c == '\'' || c == '"').to_string(), value.trim().to_string())
    } else {
        let mut parts = entry.splitn(2, char::is_whitespace);
        let index = parts.next().unwrap_or_default().to_string();
        let value = parts.next().unwrap_or_default().trim().to_string();
        (index, value)
    }
}

/// Strip the `SCALAR(0x...)` indirection prefix and an optional `-> `
/// arrow, leaving the referent's raw value. A `Nested(Scalar, raw)` handle
/// expands to exactly this one child.
pub fn strip_scalar_indirection(raw: &str) -> String {
    let raw = raw.trim();
    let after_paren = raw.find(')').map(|i| &raw[i + 1..]).unwrap_or(raw);
    after_paren.trim_start_matches("->").trim().to_string()
}

/// The `x expr` list-context parser.
///
/// Strips the trailing `\n\s*DB<N>...` noise the debugger appends, then: if
/// `expr` starts with `@`, the remainder is treated as the array value
/// as-is; otherwise the leading `0` scalar-context index marker `x`
/// prepends is removed.
pub fn parse_evaluate_reply(expr: &str, raw_reply: &str) -> String {
    let body = strip_trailing_prompt(raw_reply);
    if expr.trim_start().starts_with('@') {
        return body;
    }
    strip_leading_scalar_index(&body)
}

fn strip_trailing_prompt(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        if is_db_prompt_line(line) {
            break;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

fn strip_leading_scalar_index(body: &str) -> String {
    let trimmed = body.trim_start();
    if let Some(rest) = trimmed.strip_prefix('0') {
        if rest.starts_with("  ") || rest.trim_start() != rest {
            return rest.trim_start().to_string();
        }
    }
    trimmed.to_string()
}

/// `%h` evaluations must be auto-dereferenced: a leading `%` becomes `\%` in
/// the command sent to the debugger.
pub fn dereference_hash_expr(expr: &str) -> String {
    if let Some(rest) = expr.strip_prefix('%') {
        format!("\\%{rest}")
    } else {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_typing_rule_values() {
        assert_eq!(classify_value("HASH(0x1234)"), ValueTyping::Hash);
        assert_eq!(classify_value("My::Class=HASH(0x1234)"), ValueTyping::Hash);
        assert_eq!(classify_value("ARRAY(0xabcd)"), ValueTyping::Array);
        assert_eq!(classify_value("SCALAR(0x1)"), ValueTyping::Scalar);
        assert_eq!(classify_value("42"), ValueTyping::Leaf);
    }

    #[test]
    fn splits_y_reply_into_entries() {
        let output = "$x = 1\n@arr = (\n  0  1\n  1  2\n)\n  DB<2>\n";
        let entries = split_variable_entries(output);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("$x".to_string(), "1".to_string()));
        assert_eq!(entries[1].0, "@arr");
        assert!(entries[1].1.contains("0  1"));
    }

    #[test]
    fn splits_array_dump_into_ordered_values() {
        let raw = "(\n  0  1\n  1  HASH(0x1)\n     'k' => 'v'\n)";
        let values = parse_nested_array(raw);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "1");
        assert!(values[1].starts_with("HASH(0x1)"));
    }

    #[test]
    fn splits_hash_dump_into_ordered_pairs() {
        let raw = "'k' => 'v'";
        let pairs = parse_nested_hash(raw);
        assert_eq!(pairs, vec![("k".to_string(), "'v'".to_string())]);
    }

    #[test]
    fn strips_scalar_indirection_arrow() {
        assert_eq!(strip_scalar_indirection("SCALAR(0x1)->3"), "3");
    }

    #[test]
    fn evaluate_array_expr_keeps_body_as_is() {
        let reply = "(\n  0  1\n  1  2\n)\n  DB<3>\n";
        let parsed = parse_evaluate_reply("@xs", reply);
        assert!(parsed.contains("0  1"));
        assert!(!parsed.contains("DB<3>"));
    }

    #[test]
    fn evaluate_scalar_expr_strips_leading_index() {
        let reply = "0  42\n  DB<4>\n";
        let parsed = parse_evaluate_reply("$x", reply);
        assert_eq!(parsed, "42");
    }

    #[test]
    fn hash_evaluate_is_dereferenced_before_sending() {
        assert_eq!(dereference_hash_expr("%h"), "\\%h");
        assert_eq!(dereference_hash_expr("$x"), "$x");
    }
}
