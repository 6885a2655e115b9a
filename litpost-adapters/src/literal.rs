//! Evaluation of Python literal expressions straight from the syntax tree.
//!
//! Only constant forms are understood: numbers, strings, booleans, `None`,
//! tuples, lists and dicts of those. Anything else evaluates to `None` (the
//! Rust `Option`), which callers treat as "not a literal".

use serde_json::{Map, Number, Value};
use tree_sitter::Node;

/// Evaluate a literal expression node to a JSON value. Tuples and lists both
/// become arrays.
pub fn literal_value(node: Node, source: &[u8]) -> Option<Value> {
    match node.kind() {
        "integer" => parse_int(node_str(node, source)?).map(Value::from),
        "float" => {
            let text = node_str(node, source)?.replace('_', "");
            Number::from_f64(text.parse().ok()?).map(Value::Number)
        }
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "none" => Some(Value::Null),
        "string" | "concatenated_string" => string_value(node, source).map(Value::String),
        "parenthesized_expression" => literal_value(only_named_child(node)?, source),
        "unary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            let value = literal_value(node.child_by_field_name("argument")?, source)?;
            match (node_str(operator, source)?, value) {
                ("-", Value::Number(n)) => negate(&n),
                ("+", v @ Value::Number(_)) => Some(v),
                _ => None,
            }
        }
        "tuple" | "list" => named_children(node)
            .into_iter()
            .map(|child| literal_value(child, source))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        "dictionary" => {
            let mut map = Map::new();
            for pair in named_children(node) {
                if pair.kind() != "pair" {
                    return None;
                }
                let key = match literal_value(pair.child_by_field_name("key")?, source)? {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let value = literal_value(pair.child_by_field_name("value")?, source)?;
                map.insert(key, value);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

/// The text value of a `string` or `concatenated_string` node, or `None` for
/// bytes and f-strings.
pub fn string_value(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => decode_string_literal(node_str(node, source)?),
        "concatenated_string" => {
            let mut out = String::new();
            for part in named_children(node) {
                out.push_str(&string_value(part, source)?);
            }
            Some(out)
        }
        _ => None,
    }
}

/// Decode a Python string literal, prefix and quotes included.
pub fn decode_string_literal(literal: &str) -> Option<String> {
    let quote_at = literal.find(['"', '\''])?;
    let prefix = literal[..quote_at].to_ascii_lowercase();
    // bytes and f-strings are not text constants
    if !prefix.chars().all(|c| c == 'r' || c == 'u') {
        return None;
    }

    let quoted = &literal[quote_at..];
    let q = &quoted[..1];
    let triple = q.repeat(3);
    let body = if quoted.len() >= 6 && quoted.starts_with(&triple) && quoted.ends_with(&triple) {
        &quoted[3..quoted.len() - 3]
    } else if quoted.len() >= 2 && quoted.ends_with(q) {
        &quoted[1..quoted.len() - 1]
    } else {
        return None;
    };

    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut digits = next.to_string();
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(&d) if d.is_digit(8) => {
                            digits.push(d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code_point(&mut out, u32::from_str_radix(&digits, 8).ok(), &digits, "\\");
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(width).collect();
                let code = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten();
                push_code_point(&mut out, code, &digits, &format!("\\{}", next));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn push_code_point(out: &mut String, code: Option<u32>, digits: &str, escape: &str) {
    match code.and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => {
            out.push_str(escape);
            out.push_str(digits);
        }
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let (digits, radix) = match cleaned.get(..2) {
        Some("0x") => (&cleaned[2..], 16),
        Some("0o") => (&cleaned[2..], 8),
        Some("0b") => (&cleaned[2..], 2),
        _ => (cleaned.as_str(), 10),
    };
    i64::from_str_radix(digits, radix).ok()
}

fn negate(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return i.checked_neg().map(Value::from);
    }
    Number::from_f64(-n.as_f64()?).map(Value::Number)
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn only_named_child(node: Node) -> Option<Node> {
    let children = named_children(node);
    match children.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn node_str<'s>(node: Node, source: &'s [u8]) -> Option<&'s str> {
    std::str::from_utf8(&source[node.byte_range()]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tree_sitter::Parser;

    fn eval(expr: &str) -> Option<Value> {
        let source = format!("x = {}\n", expr);
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(&source, None).unwrap();
        let statement = tree.root_node().named_child(0).unwrap();
        let assignment = statement.named_child(0).unwrap();
        let right = assignment.child_by_field_name("right").unwrap();
        literal_value(right, source.as_bytes())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(eval("7"), Some(json!(7)));
        assert_eq!(eval("-3"), Some(json!(-3)));
        assert_eq!(eval("1_000"), Some(json!(1000)));
        assert_eq!(eval("0x1F"), Some(json!(31)));
        assert_eq!(eval("2.5"), Some(json!(2.5)));
        assert_eq!(eval("True"), Some(json!(true)));
        assert_eq!(eval("None"), Some(Value::Null));
    }

    #[test]
    fn test_strings() {
        assert_eq!(eval("'Hello'"), Some(json!("Hello")));
        assert_eq!(eval("\"tab\\there\""), Some(json!("tab\there")));
        assert_eq!(eval("r'raw\\n'"), Some(json!("raw\\n")));
        assert_eq!(eval("'a' 'b'"), Some(json!("ab")));
        assert_eq!(eval("b'bytes'"), None);
        assert_eq!(eval("f'{x}'"), None);
    }

    #[test]
    fn test_containers() {
        assert_eq!(eval("(2020, 1, 1)"), Some(json!([2020, 1, 1])));
        assert_eq!(eval("['a', 'b']"), Some(json!(["a", "b"])));
        assert_eq!(eval("()"), Some(json!([])));
        assert_eq!(eval("('solo',)"), Some(json!(["solo"])));
        assert_eq!(eval("{'k': 1}"), Some(json!({"k": 1})));
    }

    #[test]
    fn test_non_literals() {
        assert_eq!(eval("compute()"), None);
        assert_eq!(eval("(1, other)"), None);
        assert_eq!(eval("a + 1"), None);
    }

    #[test]
    fn test_decode_triple_quoted() {
        assert_eq!(
            decode_string_literal("\"\"\"line one\nline two\"\"\"").as_deref(),
            Some("line one\nline two")
        );
        assert_eq!(decode_string_literal("'''x'''").as_deref(), Some("x"));
        assert_eq!(decode_string_literal("u'x'").as_deref(), Some("x"));
        assert_eq!(decode_string_literal("''").as_deref(), Some(""));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\\nb"), "ab");
        assert_eq!(unescape("\\x41\\u00e9\\101"), "AéA");
        assert_eq!(unescape("\\d"), "\\d");
        assert_eq!(unescape("\\'\\\""), "'\"");
    }
}
