//! The JSONPath selector engine.
//!
//! The dialect is a subset of Goessner's JSONPath with an embedded
//! expression language for filter (`[?(expr)]`) and computed (`[(expr)]`)
//! subscripts:
//!
//! - a leading `$` names the root and is consumed;
//! - `.name` selects a child, `..name` selects recursively in document
//!   order;
//! - `*` (bare or subscripted) selects every child;
//! - `[...]` subscripts hold quoted names, decimal indices, `*`, filters
//!   and expressions, comma-separated; duplicates are removed within one
//!   subscript, preserving first occurrence;
//! - filters evaluate with each sibling's sub-document as context, so
//!   `@.field` resolves relative to the sibling.

pub(crate) mod expr;

use crate::document::{Document, Iter};
use crate::element::Element;
use crate::error::{Error, Result};

use self::expr::vm::Slot;

/// Selects elements from `doc` by a JSONPath expression, in document order.
///
/// Results are views into `doc`'s backing bytes. Missing names and
/// non-matching filters yield empty results; malformed subscripts and
/// expressions are errors.
///
/// ```
/// use bsonpath::{path_select, read_json};
///
/// let doc = read_json(br#"{"items": [{"n": 1}, {"n": 2}, {"n": 3}]}"#)?;
/// let matches = path_select(&doc, "$.items[?(@.n > 1)].n")?;
/// let values: Vec<i32> = matches.iter().map(|e| e.as_i32()).collect::<Result<_, _>>()?;
/// assert_eq!(values, vec![2, 3]);
/// # Ok::<(), bsonpath::Error>(())
/// ```
pub fn path_select<'d>(doc: &'d Document<'_>, path: &str) -> Result<Vec<Element<'d>>> {
    let path = path.trim_start_matches('$');
    let mut out = Vec::new();
    select(doc.as_bytes(), path, &mut out)?;
    Ok(out)
}

/// Recursive selector driver over a validated document region.
pub(crate) fn select<'s>(doc: &'s [u8], path: &str, out: &mut Vec<Element<'s>>) -> Result<()> {
    if path.is_empty() {
        out.extend(Iter::new(doc));
        return Ok(());
    }

    let path = path.strip_prefix('@').unwrap_or(path);

    // recursive descent: match at this level first, then inside every
    // container child, yielding document order
    if let Some(rest) = path.strip_prefix("..") {
        select(doc, rest, out)?;
        for element in Iter::new(doc) {
            if let Some(sub) = element.container_bytes() {
                select(sub, path, out)?;
            }
        }
        return Ok(());
    }

    let path = path.trim_start_matches('.');
    if path.is_empty() {
        out.extend(Iter::new(doc));
        return Ok(());
    }

    if let Some(after_bracket) = path.strip_prefix('[') {
        let (subscript, rest) = split_subscript(after_bracket)?;
        return select_sub(doc, rest, subscript, out);
    }

    let name_len = path
        .find(['.', '['])
        .unwrap_or(path.len());
    let (name, mut rest) = path.split_at(name_len);
    if rest.starts_with('.') && !rest.starts_with("..") {
        rest = &rest[1..];
    }
    select_name(doc, rest, name, out)
}

/// Splits `"...]rest"` at the subscript's closing bracket, respecting
/// quoted sections.
fn split_subscript(path: &str) -> Result<(&str, &str)> {
    let bytes = path.as_bytes();
    let mut in_quote: Option<u8> = None;
    for (index, byte) in bytes.iter().enumerate() {
        match in_quote {
            Some(quote) => {
                if *byte == quote {
                    in_quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => in_quote = Some(*byte),
                b']' => return Ok((&path[..index], &path[index + 1..])),
                _ => {}
            },
        }
    }
    Err(Error::expression(format!("subscript missing ']': [{path}")))
}

/// Selects children matching `name` (or `*`) and continues with the
/// remaining path.
fn select_name<'s>(
    doc: &'s [u8],
    rest: &str,
    name: &str,
    out: &mut Vec<Element<'s>>,
) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }

    if name == "*" {
        if rest.is_empty() {
            out.extend(Iter::new(doc));
        } else {
            for element in Iter::new(doc) {
                if let Some(sub) = element.container_bytes() {
                    select(sub, rest, out)?;
                }
            }
        }
        return Ok(());
    }

    if let Some(element) = Iter::new(doc).find(|e| e.name() == name) {
        if rest.is_empty() {
            out.push(element);
        } else if let Some(sub) = element.container_bytes() {
            select(sub, rest, out)?;
        }
    }
    Ok(())
}

/// Processes one `[...]` subscript: a comma-separated list of quoted names,
/// decimal indices, `*`, and expressions. Results from all selector kinds
/// are collected in textual order and deduplicated preserving first
/// occurrence, within this subscript only.
fn select_sub<'s>(
    doc: &'s [u8],
    rest: &str,
    subscript: &str,
    out: &mut Vec<Element<'s>>,
) -> Result<()> {
    let mut vec: Vec<Element<'s>> = Vec::new();
    let mut s = subscript;

    while !s.is_empty() {
        match s.as_bytes()[0] {
            b'"' | b'\'' => {
                let quote = s.as_bytes()[0] as char;
                let inner = &s[1..];
                let end = inner.find(quote).ok_or_else(|| {
                    Error::expression(format!("unterminated quote in subscript: [{subscript}]"))
                })?;
                select_name(doc, rest, &inner[..end], &mut vec)?;
                s = &inner[end + 1..];
            }
            b'0'..=b'9' => {
                let end = s.find(',').unwrap_or(s.len());
                select_name(doc, rest, &s[..end], &mut vec)?;
                s = &s[end..];
            }
            b'*' => {
                select_name(doc, rest, "*", &mut vec)?;
                s = &s[1..];
            }
            b'(' | b'?' => {
                let end = expression_end(s)?;
                select_expr(doc, rest, &s[..end], &mut vec)?;
                s = &s[end..];
            }
            b',' => s = &s[1..],
            other => {
                return Err(Error::expression(format!(
                    "unexpected character {:?} in subscript: [{subscript}]",
                    other as char
                )))
            }
        }
    }

    // deduplicate within this subscript only, preserving first occurrence
    let mut deduped: Vec<Element<'s>> = Vec::new();
    for element in vec {
        if !deduped.contains(&element) {
            deduped.push(element);
        }
    }
    out.extend(deduped);
    Ok(())
}

/// Finds the index just past the closing `)` of a `(...)` or `?(...)`
/// expression, balancing parentheses and skipping quoted sections.
fn expression_end(s: &str) -> Result<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_quote: Option<u8> = None;

    for (index, byte) in bytes.iter().enumerate() {
        match in_quote {
            Some(quote) => {
                if *byte == quote {
                    in_quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => in_quote = Some(*byte),
                b'(' => depth += 1,
                b')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| Error::expression(format!("unbalanced expression: {s}")))?;
                    if depth == 0 {
                        return Ok(index + 1);
                    }
                }
                _ => {}
            },
        }
    }
    Err(Error::expression(format!("unbalanced expression: {s}")))
}

/// Evaluates a `(expr)` or `?(expr)` subscript.
///
/// A filter keeps the siblings for which the expression is truthy when
/// evaluated with the sibling's sub-document as context. A plain expression
/// evaluates once against the current context and dispatches on its result:
/// a string or integer names the child to select, `true` selects all
/// children, and an element result is included directly.
fn select_expr<'s>(
    doc: &'s [u8],
    rest: &str,
    expr: &str,
    out: &mut Vec<Element<'s>>,
) -> Result<()> {
    let expr = expr
        .strip_suffix(')')
        .ok_or_else(|| Error::expression(format!("expected ')': {expr}")))?;
    let (inner, filter) = match expr.strip_prefix("?(") {
        Some(inner) => (inner, true),
        None => (
            expr.strip_prefix('(')
                .ok_or_else(|| Error::expression(format!("expected '(': {expr}")))?,
            false,
        ),
    };

    let code = expr::compiler::compile(&expr::parser::parse(inner)?);

    if !filter {
        match expr::vm::eval(doc, &code) {
            None | Some(Slot::Bool(false)) => {}
            Some(Slot::Bool(true)) => select_name(doc, rest, "*", out)?,
            Some(Slot::Int(index)) => select_name(doc, rest, &index.to_string(), out)?,
            Some(Slot::Str(name)) => select_name(doc, rest, &name, out)?,
            Some(Slot::Elem(element)) => {
                if rest.is_empty() {
                    out.push(element);
                } else if let Some(sub) = element.container_bytes() {
                    select(sub, rest, out)?;
                }
            }
        }
        return Ok(());
    }

    let mut kept = Vec::new();
    for element in Iter::new(doc) {
        // scalar siblings carry no context to evaluate against
        let Some(sub) = element.container_bytes() else {
            continue;
        };
        match expr::vm::eval(sub, &code) {
            Some(Slot::Bool(true)) => kept.push(element),
            Some(Slot::Int(index)) if element.name() == index.to_string() => kept.push(element),
            Some(Slot::Str(name)) if element.name() == name => kept.push(element),
            Some(Slot::Elem(_)) => kept.push(element),
            _ => {}
        }
    }

    if rest.is_empty() {
        out.extend(kept);
    } else {
        for element in kept {
            if let Some(sub) = element.container_bytes() {
                select(sub, rest, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::json::read_json;

    fn i32s(matches: &[Element<'_>]) -> Vec<i32> {
        matches.iter().map(|e| e.as_i32().unwrap()).collect()
    }

    #[test]
    fn root_selects_all_top_level() {
        let doc = read_json(br#"{"a": 1, "b": 2}"#).unwrap();
        let all = path_select(&doc, "$").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name(), "a");
        assert_eq!(all[1].name(), "b");

        let same = path_select(&doc, "").unwrap();
        assert_eq!(all, same);
    }

    #[test]
    fn dotted_names() {
        let doc = read_json(br#"{"a": {"b": {"c": 42}}}"#).unwrap();
        let matches = path_select(&doc, "$.a.b.c").unwrap();
        assert_eq!(i32s(&matches), vec![42]);
    }

    #[test]
    fn missing_name_is_empty() {
        let doc = read_json(br#"{"a": 1}"#).unwrap();
        assert!(path_select(&doc, "$.nope").unwrap().is_empty());
        assert!(path_select(&doc, "$.a.deeper").unwrap().is_empty());
    }

    #[test]
    fn recursive_descent_in_document_order() {
        let doc =
            read_json(br#"{"a":{"b":1,"c":{"b":2}},"d":[{"b":3},{"b":4}]}"#).unwrap();
        let matches = path_select(&doc, "$..b").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2, 3, 4]);
    }

    #[test]
    fn recursive_descent_with_trailing_path() {
        let doc = read_json(br#"{"x":{"a":{"n":1}},"y":{"a":{"n":2}}}"#).unwrap();
        let matches = path_select(&doc, "$..a.n").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2]);
    }

    #[test]
    fn wildcard() {
        let doc = read_json(br#"{"a": 1, "b": {"c": 2}}"#).unwrap();

        let matches = path_select(&doc, "$.*").unwrap();
        assert_eq!(matches.len(), 2);

        // with remaining path, wildcards descend into containers only
        let matches = path_select(&doc, "$.*.c").unwrap();
        assert_eq!(i32s(&matches), vec![2]);

        let matches = path_select(&doc, "$[*]").unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn subscript_names_and_indices() {
        let doc = read_json(br#"{"a": 1, "b": [10, 20, 30]}"#).unwrap();

        let matches = path_select(&doc, "$['a']").unwrap();
        assert_eq!(i32s(&matches), vec![1]);

        let matches = path_select(&doc, r#"$["a"]"#).unwrap();
        assert_eq!(i32s(&matches), vec![1]);

        let matches = path_select(&doc, "$.b[1]").unwrap();
        assert_eq!(i32s(&matches), vec![20]);

        let matches = path_select(&doc, "$.b[2,0]").unwrap();
        assert_eq!(i32s(&matches), vec![30, 10]);
    }

    #[test]
    fn subscript_list_deduplicates() {
        let doc = read_json(br#"{"a": 1, "b": 2}"#).unwrap();
        let matches = path_select(&doc, "$['a','a','b']").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2]);
    }

    #[test]
    fn filter_expression() {
        let doc = read_json(br#"{"items":[{"n":1},{"n":2},{"n":3}]}"#).unwrap();
        let matches = path_select(&doc, "$.items[?(@.n > 1)].n").unwrap();
        assert_eq!(i32s(&matches), vec![2, 3]);
    }

    #[test]
    fn filter_keeps_matching_siblings() {
        let doc = read_json(
            br#"{"a": {"kind": "x"}, "b": {"kind": "y"}, "c": {"kind": "x"}, "d": 5}"#,
        )
        .unwrap();
        let matches = path_select(&doc, "$[?(@.kind == 'x')]").unwrap();
        let names: Vec<&str> = matches.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn computed_subscript_string_and_int() {
        let doc = read_json(br#"{"k": 7, "0": 1, "1": 2}"#).unwrap();

        let matches = path_select(&doc, "$[('k')]").unwrap();
        assert_eq!(i32s(&matches), vec![7]);

        let matches = path_select(&doc, "$[(0 + 1)]").unwrap();
        assert_eq!(i32s(&matches), vec![2]);

        let matches = path_select(&doc, "$[(true)]").unwrap();
        assert_eq!(matches.len(), 3);

        // false selects nothing
        let matches = path_select(&doc, "$[(1 == 2)]").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn computed_subscript_element_result() {
        let doc = read_json(br#"{"k": 7}"#).unwrap();
        let matches = path_select(&doc, "$[(@.k)]").unwrap();
        assert_eq!(i32s(&matches), vec![7]);
    }

    #[test]
    fn mixed_subscript_keeps_textual_order_and_dedups() {
        let doc = read_json(br#"{"a": 1, "b": 2}"#).unwrap();

        // the name comes first in the subscript text, so it stays first,
        // and the wildcard expression's repeat of "a" is deduplicated
        let matches = path_select(&doc, "$['a',(true)]").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2]);

        let matches = path_select(&doc, "$[(true),'a']").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2]);

        let matches = path_select(&doc, "$['b',('a')]").unwrap();
        assert_eq!(i32s(&matches), vec![2, 1]);
    }

    #[test]
    fn malformed_expressions_are_errors() {
        let doc = read_json(br#"{"a": 1}"#).unwrap();
        assert!(path_select(&doc, "$[?(@.n >)]").is_err());
        assert!(path_select(&doc, "$[?(@.n > 1]").is_err());
        assert!(path_select(&doc, "$['unterminated]").is_err());
        assert!(path_select(&doc, "$[junk]").is_err());
    }

    #[test]
    fn filters_skip_scalar_siblings() {
        let doc = read_json(br#"{"a": 1, "b": {"n": 2}}"#).unwrap();
        let matches = path_select(&doc, "$[?(@.n == 2)]").unwrap();
        let names: Vec<&str> = matches.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn quoted_name_with_bracket() {
        let doc = read_json(br#"{"a]b": 1}"#).unwrap();
        let matches = path_select(&doc, "$['a]b']").unwrap();
        assert_eq!(i32s(&matches), vec![1]);
    }

    #[test]
    fn descent_into_arrays() {
        let doc = read_json(br#"{"rows": [{"v": 1}, {"v": 2}]}"#).unwrap();
        let matches = path_select(&doc, "$.rows[*].v").unwrap();
        assert_eq!(i32s(&matches), vec![1, 2]);
    }
}
