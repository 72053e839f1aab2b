//! A BSON-to-JSON serializer.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::document::{Array, Document};
use crate::element::{Element, Value};
use crate::error::Result;

/// Writes a document as minified UTF-8 JSON to `writer`.
///
/// Types JSON cannot express natively are rendered in the MongoDB Extended
/// JSON v1 convention, except that datetimes unwrap to their integer
/// millisecond value and ObjectIds unwrap to their 24-character lowercase
/// hex string. Non-finite doubles (NaN, ±Infinity) are emitted as `null`.
///
/// ```
/// use bsonpath::{read_json, to_json_string};
///
/// let doc = read_json(br#"{ "a" : [ 1 , true ] }"#)?;
/// assert_eq!(to_json_string(&doc)?, r#"{"a":[1,true]}"#);
/// # Ok::<(), bsonpath::Error>(())
/// ```
pub fn write_json<W: Write>(doc: &Document<'_>, writer: &mut W) -> Result<()> {
    write_document(writer, doc)
}

/// Renders a document as a minified JSON string. See [`write_json`].
pub fn to_json_string(doc: &Document<'_>) -> Result<String> {
    let mut out = Vec::new();
    write_json(doc, &mut out)?;
    // the writer only emits UTF-8
    Ok(String::from_utf8(out).expect("writer emits UTF-8"))
}

fn write_document<W: Write>(writer: &mut W, doc: &Document<'_>) -> Result<()> {
    writer.write_all(b"{")?;
    for (index, element) in doc.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        write_string(writer, element.name())?;
        writer.write_all(b":")?;
        write_element(writer, &element)?;
    }
    writer.write_all(b"}")?;
    Ok(())
}

fn write_array<W: Write>(writer: &mut W, array: &Array<'_>) -> Result<()> {
    writer.write_all(b"[")?;
    for (index, element) in array.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        write_element(writer, &element)?;
    }
    writer.write_all(b"]")?;
    Ok(())
}

fn write_element<W: Write>(writer: &mut W, element: &Element<'_>) -> Result<()> {
    match element.as_value()? {
        Value::Double(f) => write_f64(writer, f)?,
        Value::String(s) => write_string(writer, s)?,
        Value::Document(d) => write_document(writer, &d)?,
        Value::Array(a) => write_array(writer, &a)?,
        Value::Boolean(b) => writer.write_all(if b { b"true" } else { b"false" })?,
        Value::Null => writer.write_all(b"null")?,
        Value::Int32(i) => write!(writer, "{i}")?,
        Value::Int64(i) => write!(writer, "{i}")?,
        // datetimes unwrap to their integer millisecond value
        Value::DateTime(ms) => write!(writer, "{ms}")?,
        // ObjectIds unwrap to their hex rendering
        Value::ObjectId(oid) => write_string(writer, &oid.to_hex())?,
        Value::Binary(binary) => {
            writer.write_all(b"{\"$binary\":")?;
            write_string(writer, &BASE64.encode(binary.bytes))?;
            writer.write_all(b",\"$type\":")?;
            write_string(writer, &hex::encode([u8::from(binary.subtype)]))?;
            writer.write_all(b"}")?;
        }
        Value::RegularExpression(regex) => {
            writer.write_all(b"{\"$regex\":")?;
            write_string(writer, regex.pattern)?;
            writer.write_all(b",\"$options\":")?;
            write_string(writer, regex.options)?;
            writer.write_all(b"}")?;
        }
        Value::Timestamp(ts) => {
            write!(
                writer,
                "{{\"$timestamp\":{{\"t\":{},\"i\":{}}}}}",
                ts.time, ts.increment
            )?;
        }
        Value::JavaScriptCode(code) => {
            writer.write_all(b"{\"$code\":")?;
            write_string(writer, code)?;
            writer.write_all(b"}")?;
        }
        Value::JavaScriptCodeWithScope(scoped) => {
            writer.write_all(b"{\"$code\":")?;
            write_string(writer, scoped.code)?;
            writer.write_all(b",\"$scope\":")?;
            write_document(writer, &scoped.scope)?;
            writer.write_all(b"}")?;
        }
        Value::Symbol(s) => {
            writer.write_all(b"{\"$symbol\":")?;
            write_string(writer, s)?;
            writer.write_all(b"}")?;
        }
        Value::DbPointer(pointer) => {
            writer.write_all(b"{\"$dbPointer\":{\"$ref\":")?;
            write_string(writer, pointer.namespace)?;
            writer.write_all(b",\"$id\":")?;
            write_string(writer, &pointer.id.to_hex())?;
            writer.write_all(b"}}")?;
        }
        Value::Undefined => writer.write_all(b"{\"$undefined\":true}")?,
        Value::MinKey => writer.write_all(b"{\"$minKey\":1}")?,
        Value::MaxKey => writer.write_all(b"{\"$maxKey\":1}")?,
    }
    Ok(())
}

fn write_f64<W: Write>(writer: &mut W, f: f64) -> Result<()> {
    if f.is_finite() {
        // minimal-digit round-trip rendering; integral doubles print
        // without a decimal point, which is still a valid JSON number
        write!(writer, "{f}")?;
    } else {
        writer.write_all(b"null")?;
    }
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer.write_all(b"\"")?;
    let mut unwritten = 0;
    let bytes = s.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        let escape: Option<&[u8]> = match byte {
            b'"' => Some(b"\\\""),
            b'\\' => Some(b"\\\\"),
            0x08 => Some(b"\\b"),
            0x0C => Some(b"\\f"),
            b'\n' => Some(b"\\n"),
            b'\r' => Some(b"\\r"),
            b'\t' => Some(b"\\t"),
            _ => None,
        };
        if escape.is_none() && *byte >= 0x20 {
            continue;
        }
        writer.write_all(&bytes[unwritten..index])?;
        match escape {
            Some(escape) => writer.write_all(escape)?,
            None => write!(writer, "\\u{:04x}", byte)?,
        }
        unwritten = index + 1;
    }
    writer.write_all(&bytes[unwritten..])?;
    writer.write_all(b"\"")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::{ArrayBuilder, BuilderValue, DocumentBuilder};
    use crate::element::Timestamp;
    use crate::json::read_json;
    use crate::oid::ObjectId;

    #[test]
    fn native_types() {
        let doc = DocumentBuilder::new()
            .append("s", "hi")
            .append("i", 1)
            .append("big", 5_000_000_000i64)
            .append("f", 1.5)
            .append("t", true)
            .append("n", BuilderValue::Null)
            .append("a", ArrayBuilder::new().push(1).push("x"))
            .append("d", DocumentBuilder::new().append("k", 2))
            .build()
            .unwrap();
        assert_eq!(
            to_json_string(&doc).unwrap(),
            r#"{"s":"hi","i":1,"big":5000000000,"f":1.5,"t":true,"n":null,"a":[1,"x"],"d":{"k":2}}"#
        );
    }

    #[test]
    fn extended_types() {
        let oid = ObjectId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let doc = DocumentBuilder::new()
            .append("oid", oid)
            .append("date", BuilderValue::DateTime(1420070400000))
            .append("bin", vec![1u8, 2, 3])
            .append("re", ("^a.*$", "i"))
            .append(
                "ts",
                Timestamp {
                    time: 649876543,
                    increment: 9,
                },
            )
            .append("undef", BuilderValue::Undefined)
            .append("min", BuilderValue::MinKey)
            .append("max", BuilderValue::MaxKey)
            .append("sym", BuilderValue::Symbol("sym".to_string()))
            .append("code", BuilderValue::JavaScriptCode("function(){}".to_string()))
            .append("ptr", ("db.coll", oid))
            .build()
            .unwrap();

        let json = to_json_string(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["oid"], "0102030405060708090a0b0c");
        assert_eq!(value["date"], 1420070400000i64);
        assert_eq!(value["bin"]["$binary"], "AQID");
        assert_eq!(value["bin"]["$type"], "00");
        assert_eq!(value["re"]["$regex"], "^a.*$");
        assert_eq!(value["re"]["$options"], "i");
        assert_eq!(value["ts"]["$timestamp"]["t"], 649876543);
        assert_eq!(value["ts"]["$timestamp"]["i"], 9);
        assert_eq!(value["undef"]["$undefined"], true);
        assert_eq!(value["min"]["$minKey"], 1);
        assert_eq!(value["max"]["$maxKey"], 1);
        assert_eq!(value["sym"]["$symbol"], "sym");
        assert_eq!(value["code"]["$code"], "function(){}");
        assert_eq!(value["ptr"]["$dbPointer"]["$ref"], "db.coll");
        assert_eq!(value["ptr"]["$dbPointer"]["$id"], "0102030405060708090a0b0c");
    }

    #[test]
    fn non_finite_doubles_become_null() {
        let doc = DocumentBuilder::new()
            .append("nan", f64::NAN)
            .append("inf", f64::INFINITY)
            .append("ninf", f64::NEG_INFINITY)
            .build()
            .unwrap();
        assert_eq!(
            to_json_string(&doc).unwrap(),
            r#"{"nan":null,"inf":null,"ninf":null}"#
        );
    }

    #[test]
    fn string_escaping() {
        let doc = DocumentBuilder::new()
            .append("s", "a\"b\\c\n\t\u{1}é")
            .build()
            .unwrap();
        let json = to_json_string(&doc).unwrap();
        assert_eq!(json, "{\"s\":\"a\\\"b\\\\c\\n\\t\\u0001é\"}");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["s"], "a\"b\\c\n\t\u{1}é");
    }

    #[test]
    fn json_round_trip() {
        let inputs: &[&str] = &[
            r#"{}"#,
            r#"{"a":1,"b":[1,2,3],"c":{"d":null}}"#,
            r#"{"x":1.5,"y":true,"z":"text"}"#,
            r#"[1,"two",{"three":3}]"#,
        ];
        for input in inputs {
            let doc = read_json(input.as_bytes()).unwrap();
            let json = to_json_string(&doc).unwrap();
            let reparsed = read_json(json.as_bytes()).unwrap();
            assert_eq!(doc, reparsed, "{input}");
        }
    }
}
