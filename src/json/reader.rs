//! A streaming JSON reader that materializes BSON via the builders.

use crate::builder::{ArrayBuilder, BuilderValue, DocumentBuilder};
use crate::document::Document;
use crate::error::{Error, JsonErrorKind, Result};

/// Reads a JSON document or array into a BSON [`Document`].
///
/// The input may be UTF-8, UTF-16 (LE/BE) or UTF-32 (LE/BE); the encoding is
/// detected from a BOM or from the zero-byte pattern of the first bytes and
/// the text is normalized to UTF-8 before tokenizing. The grammar is strict
/// RFC 8259: no comments, no trailing commas, only space, tab, CR and LF
/// between tokens.
///
/// Numbers that fit a signed 32-bit integer become `int32`, larger integers
/// that fit 64 bits become `int64`, everything else becomes `double`.
///
/// A top-level array yields a document with the array's layout (element
/// names `"0"`, `"1"`, …). On error no partially constructed document is
/// returned, and the error carries the byte offset into the normalized text.
///
/// ```
/// use bsonpath::read_json;
///
/// let doc = read_json(br#"{"a": 1, "b": [true, null]}"#)?;
/// assert_eq!(doc.find("a").unwrap().as_i32()?, 1);
/// # Ok::<(), bsonpath::Error>(())
/// ```
pub fn read_json(input: &[u8]) -> Result<Document<'static>> {
    let text = decode_input(input)?;
    let mut reader = Reader {
        data: text.as_bytes(),
        pos: 0,
    };

    reader.skip_whitespace();
    let doc = match reader.peek() {
        Some(b'{') => reader.read_object()?.build()?,
        Some(b'[') => reader.read_array()?.build()?.into_document(),
        Some(found) => {
            return Err(reader.error(JsonErrorKind::UnexpectedToken {
                message: format!(
                    "expected an object or array at the top level, found {:?}",
                    found as char
                ),
            }))
        }
        None => return Err(reader.error(JsonErrorKind::UnexpectedEof)),
    };

    reader.skip_whitespace();
    if reader.pos != reader.data.len() {
        return Err(reader.error(JsonErrorKind::GarbageAfterDocument));
    }
    Ok(doc)
}

/// Detects the input encoding and converts to UTF-8.
///
/// Detection follows the BOM when present, else the RFC 4627 zero-byte
/// pattern of the first four bytes.
fn decode_input(input: &[u8]) -> Result<String> {
    let invalid = || Error::json(JsonErrorKind::InvalidUtf8, 0);

    if let Some(rest) = strip_bom(input, &[0xEF, 0xBB, 0xBF]) {
        return utf8(rest);
    }
    if let Some(rest) = strip_bom(input, &[0x00, 0x00, 0xFE, 0xFF]) {
        return utf32(rest, false);
    }
    if let Some(rest) = strip_bom(input, &[0xFF, 0xFE, 0x00, 0x00]) {
        return utf32(rest, true);
    }
    if let Some(rest) = strip_bom(input, &[0xFE, 0xFF]) {
        return utf16(rest, false);
    }
    if let Some(rest) = strip_bom(input, &[0xFF, 0xFE]) {
        return utf16(rest, true);
    }

    match input {
        [0, 0, 0, _, ..] => utf32(input, false),
        [_, 0, 0, 0, ..] => utf32(input, true),
        [0, _, ..] => utf16(input, false),
        [x, 0, ..] if *x != 0 => utf16(input, true),
        _ => utf8(input),
    }
    .map_err(|_| invalid())
}

fn strip_bom<'i>(input: &'i [u8], bom: &[u8]) -> Option<&'i [u8]> {
    input.strip_prefix(bom)
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(String::from)
        .map_err(|e| Error::json(JsonErrorKind::InvalidUtf8, e.valid_up_to()))
}

fn utf16(bytes: &[u8], little_endian: bool) -> Result<String> {
    let invalid = || Error::json(JsonErrorKind::InvalidUtf8, 0);
    if bytes.len() % 2 != 0 {
        return Err(invalid());
    }
    let units = bytes.chunks_exact(2).map(|pair| {
        let pair: [u8; 2] = pair.try_into().expect("exact chunks");
        if little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    });
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|_| invalid())
}

fn utf32(bytes: &[u8], little_endian: bool) -> Result<String> {
    let invalid = || Error::json(JsonErrorKind::InvalidUtf8, 0);
    if bytes.len() % 4 != 0 {
        return Err(invalid());
    }
    bytes
        .chunks_exact(4)
        .map(|quad| {
            let quad: [u8; 4] = quad.try_into().expect("exact chunks");
            let unit = if little_endian {
                u32::from_le_bytes(quad)
            } else {
                u32::from_be_bytes(quad)
            };
            char::from_u32(unit).ok_or_else(invalid)
        })
        .collect()
}

struct Reader<'i> {
    data: &'i [u8],
    pos: usize,
}

impl<'i> Reader<'i> {
    fn error(&self, kind: JsonErrorKind) -> Error {
        Error::json(kind, self.pos)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let kind = match self.peek() {
            Some(found) => JsonErrorKind::UnexpectedToken {
                message: format!("expected {expected}, found {:?}", found as char),
            },
            None => JsonErrorKind::UnexpectedEof,
        };
        self.error(kind)
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", byte as char)))
        }
    }

    fn read_value(&mut self) -> Result<BuilderValue> {
        match self.peek() {
            Some(b'{') => Ok(BuilderValue::Builder(self.read_object()?)),
            Some(b'[') => Ok(BuilderValue::ArrayBuilder(self.read_array()?)),
            Some(b'"') => Ok(BuilderValue::String(self.read_string()?)),
            Some(b't') => {
                self.read_literal("true")?;
                Ok(BuilderValue::Boolean(true))
            }
            Some(b'f') => {
                self.read_literal("false")?;
                Ok(BuilderValue::Boolean(false))
            }
            Some(b'n') => {
                self.read_literal("null")?;
                Ok(BuilderValue::Null)
            }
            Some(b'-' | b'0'..=b'9') => self.read_number(),
            Some(_) => Err(self.unexpected("a value")),
            None => Err(self.error(JsonErrorKind::UnexpectedEof)),
        }
    }

    fn read_literal(&mut self, literal: &str) -> Result<()> {
        if self.data[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{literal:?}")))
        }
    }

    fn read_object(&mut self) -> Result<DocumentBuilder> {
        self.expect(b'{')?;
        let mut builder = DocumentBuilder::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(builder);
        }

        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return Err(self.unexpected("an object key"));
            }
            let key = self.read_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.read_value()?;
            builder = builder.append(key, value);

            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b'}') => return Ok(builder),
                Some(_) => {
                    self.pos -= 1;
                    return Err(self.unexpected("',' or '}'"));
                }
                None => return Err(self.error(JsonErrorKind::UnexpectedEof)),
            }
        }
    }

    fn read_array(&mut self) -> Result<ArrayBuilder> {
        self.expect(b'[')?;
        let mut builder = ArrayBuilder::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(builder);
        }

        loop {
            self.skip_whitespace();
            let value = self.read_value()?;
            builder = builder.push(value);

            self.skip_whitespace();
            match self.bump() {
                Some(b',') => continue,
                Some(b']') => return Ok(builder),
                Some(_) => {
                    self.pos -= 1;
                    return Err(self.unexpected("',' or ']'"));
                }
                None => return Err(self.error(JsonErrorKind::UnexpectedEof)),
            }
        }
    }

    fn read_string(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut out: Vec<u8> = Vec::new();

        loop {
            match self.bump() {
                None => return Err(self.error(JsonErrorKind::UnterminatedString)),
                Some(b'"') => break,
                Some(b'\\') => self.read_escape(&mut out)?,
                Some(byte) if byte < 0x20 => {
                    self.pos -= 1;
                    return Err(self.error(JsonErrorKind::UnexpectedToken {
                        message: format!("unescaped control character 0x{byte:02x} in string"),
                    }));
                }
                Some(byte) => out.push(byte),
            }
        }

        // the input was normalized to UTF-8 and escapes decode to chars, so
        // this cannot fail
        String::from_utf8(out).map_err(|_| self.error(JsonErrorKind::InvalidUtf8))
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let escape_offset = self.pos - 1;
        let invalid = |message: String| Error::json(JsonErrorKind::InvalidEscape { message }, escape_offset);

        match self.bump() {
            None => Err(self.error(JsonErrorKind::UnterminatedString)),
            Some(b'"') => {
                out.push(b'"');
                Ok(())
            }
            Some(b'\\') => {
                out.push(b'\\');
                Ok(())
            }
            Some(b'/') => {
                out.push(b'/');
                Ok(())
            }
            Some(b'b') => {
                out.push(0x08);
                Ok(())
            }
            Some(b'f') => {
                out.push(0x0C);
                Ok(())
            }
            Some(b'n') => {
                out.push(b'\n');
                Ok(())
            }
            Some(b'r') => {
                out.push(b'\r');
                Ok(())
            }
            Some(b't') => {
                out.push(b'\t');
                Ok(())
            }
            Some(b'u') => {
                let first = self.read_hex4()?;
                let code_point = if is_high_surrogate(first) {
                    if self.peek() == Some(b'\\') {
                        self.pos += 1;
                        if self.bump() != Some(b'u') {
                            return Err(invalid("unpaired high surrogate".to_string()));
                        }
                        let second = self.read_hex4()?;
                        if !is_low_surrogate(second) {
                            return Err(invalid("unpaired high surrogate".to_string()));
                        }
                        0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
                    } else {
                        return Err(invalid("unpaired high surrogate".to_string()));
                    }
                } else if is_low_surrogate(first) {
                    return Err(invalid("unpaired low surrogate".to_string()));
                } else {
                    first
                };

                let ch = char::from_u32(code_point)
                    .ok_or_else(|| invalid(format!("invalid code point U+{code_point:04X}")))?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                Ok(())
            }
            Some(byte) => Err(invalid(format!("\\{}", byte as char))),
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let byte = self
                .bump()
                .ok_or_else(|| self.error(JsonErrorKind::UnterminatedString))?;
            let digit = match byte {
                b'0'..=b'9' => (byte - b'0') as u32,
                b'a'..=b'f' => (byte - b'a' + 10) as u32,
                b'A'..=b'F' => (byte - b'A' + 10) as u32,
                _ => {
                    self.pos -= 1;
                    return Err(self.error(JsonErrorKind::InvalidEscape {
                        message: format!("invalid hex digit {:?}", byte as char),
                    }));
                }
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn read_number(&mut self) -> Result<BuilderValue> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        // integer part; leading zeros are not allowed
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.unexpected("no leading zeros"));
                }
            }
            Some(b'1'..=b'9') => self.consume_digits(),
            _ => return Err(self.unexpected("a digit")),
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.unexpected("a fraction digit"));
            }
            self.consume_digits();
        }
        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.unexpected("an exponent digit"));
            }
            self.consume_digits();
        }

        // the scanned range is ASCII by construction
        let literal = std::str::from_utf8(&self.data[start..self.pos])
            .expect("number literals are ASCII");

        let out_of_range = || {
            Error::json(
                JsonErrorKind::NumberOutOfRange {
                    literal: literal.to_string(),
                },
                start,
            )
        };

        if !is_float {
            if let Ok(int) = literal.parse::<i64>() {
                return Ok(match i32::try_from(int) {
                    Ok(int) => BuilderValue::Int32(int),
                    Err(_) => BuilderValue::Int64(int),
                });
            }
        }

        let float: f64 = literal.parse().map_err(|_| out_of_range())?;
        if float.is_finite() {
            Ok(BuilderValue::Double(float))
        } else {
            Err(out_of_range())
        }
    }

    fn consume_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }
}

fn is_high_surrogate(code_unit: u32) -> bool {
    (0xD800..=0xDBFF).contains(&code_unit)
}

fn is_low_surrogate(code_unit: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&code_unit)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ErrorKind;
    use crate::spec::ElementType;

    fn json_kind(err: &Error) -> &JsonErrorKind {
        match &err.kind {
            ErrorKind::Json { kind } => kind,
            other => panic!("expected a JSON error, got {other}"),
        }
    }

    #[test]
    fn simple_object() {
        let doc = read_json(br#"{"a": 1, "b": "two", "c": true, "d": null}"#).unwrap();
        assert_eq!(doc.find("a").unwrap().as_i32().unwrap(), 1);
        assert_eq!(doc.find("b").unwrap().as_str().unwrap(), "two");
        assert_eq!(doc.find("c").unwrap().as_bool().unwrap(), true);
        assert_eq!(doc.find("d").unwrap().element_type(), ElementType::Null);
    }

    #[test]
    fn whitespace_tolerance() {
        let doc = read_json(b"   \n\r\t[0]").unwrap();
        let mut iter = doc.iter();
        let element = iter.next().unwrap();
        assert_eq!(element.name(), "0");
        assert_eq!(element.as_i32().unwrap(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn number_coercion() {
        let doc = read_json(
            br#"{"i32": 2147483647, "i64": 2147483648, "neg": -2147483648,
                 "big": 92233720368547758070, "f": 1.5, "e": 2e3}"#,
        )
        .unwrap();
        assert_eq!(
            doc.find("i32").unwrap().element_type(),
            ElementType::Int32
        );
        assert_eq!(doc.find("i64").unwrap().as_i64().unwrap(), 2147483648);
        assert_eq!(doc.find("neg").unwrap().as_i32().unwrap(), i32::MIN);
        // too large for i64, becomes a double
        assert_eq!(
            doc.find("big").unwrap().element_type(),
            ElementType::Double
        );
        assert_eq!(doc.find("f").unwrap().as_f64().unwrap(), 1.5);
        assert_eq!(doc.find("e").unwrap().as_f64().unwrap(), 2000.0);
    }

    #[test]
    fn nested_structures() {
        let doc = read_json(br#"{"a": {"b": [1, {"c": 2}]}}"#).unwrap();
        let a = doc.find("a").unwrap().as_document().unwrap().into_owned();
        let b = a.find("b").unwrap().as_array().unwrap().into_document().into_owned();
        assert_eq!(b.find("0").unwrap().as_i32().unwrap(), 1);
        let c = b.find("1").unwrap().as_document().unwrap().into_owned();
        assert_eq!(c.find("c").unwrap().as_i32().unwrap(), 2);
    }

    #[test]
    fn escapes() {
        let doc = read_json(r#"{"s": "a\"b\\c\/d\b\f\n\r\t", "u": "Aé"}"#.as_bytes()).unwrap();
        assert_eq!(
            doc.find("s").unwrap().as_str().unwrap(),
            "a\"b\\c/d\u{8}\u{c}\n\r\t"
        );
        assert_eq!(doc.find("u").unwrap().as_str().unwrap(), "Aé");
    }

    #[test]
    fn surrogate_pairs() {
        let doc = read_json(br#"{"clef": "\uD834\uDD1E"}"#).unwrap();
        assert_eq!(doc.find("clef").unwrap().as_str().unwrap(), "\u{1D11E}");

        let err = read_json(br#"{"bad": "\uD834"}"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::InvalidEscape { .. }
        ));

        let err = read_json(br#"{"bad": "\uDD1E"}"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::InvalidEscape { .. }
        ));
    }

    #[test]
    fn error_kinds() {
        let err = read_json(br#"{"a": 1,}"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::UnexpectedToken { .. }
        ));

        let err = read_json(br#"{"a": "unterminated"#).unwrap_err();
        assert!(matches!(json_kind(&err), JsonErrorKind::UnterminatedString));

        let err = read_json(br#"{"a": "\x"}"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::InvalidEscape { .. }
        ));

        let err = read_json(br#"{"a": 1"#).unwrap_err();
        assert!(matches!(json_kind(&err), JsonErrorKind::UnexpectedEof));

        let err = read_json(br#"{"a": 1} trailing"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::GarbageAfterDocument
        ));

        let err = read_json(br#"{"a": 1e999}"#).unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::NumberOutOfRange { .. }
        ));

        let err = read_json(b"\"scalar\"").unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::UnexpectedToken { .. }
        ));

        let err = read_json(b"{\"a\": \x01}").unwrap_err();
        assert!(matches!(
            json_kind(&err),
            JsonErrorKind::UnexpectedToken { .. }
        ));

        let err = read_json(&[0xFF, 0xFF, 0x20, 0x20]).unwrap_err();
        assert!(matches!(json_kind(&err), JsonErrorKind::InvalidUtf8));
    }

    #[test]
    fn offsets_attached() {
        let err = read_json(br#"{"a": !}"#).unwrap_err();
        assert_eq!(err.offset, Some(6));
    }

    #[test]
    fn utf16_input() {
        let text = r#"{"a": "é"}"#;

        let mut le = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            le.extend(unit.to_le_bytes());
        }
        let doc = read_json(&le).unwrap();
        assert_eq!(doc.find("a").unwrap().as_str().unwrap(), "é");

        // big-endian without a BOM, detected from the zero-byte pattern
        let mut be = Vec::new();
        for unit in text.encode_utf16() {
            be.extend(unit.to_be_bytes());
        }
        let doc = read_json(&be).unwrap();
        assert_eq!(doc.find("a").unwrap().as_str().unwrap(), "é");
    }

    #[test]
    fn utf32_input() {
        let text = r#"{"a": 1}"#;

        let mut le = vec![0xFF, 0xFE, 0x00, 0x00];
        for ch in text.chars() {
            le.extend((ch as u32).to_le_bytes());
        }
        let doc = read_json(&le).unwrap();
        assert_eq!(doc.find("a").unwrap().as_i32().unwrap(), 1);

        let mut be = Vec::new();
        for ch in text.chars() {
            be.extend((ch as u32).to_be_bytes());
        }
        let doc = read_json(&be).unwrap();
        assert_eq!(doc.find("a").unwrap().as_i32().unwrap(), 1);
    }

    #[test]
    fn empty_containers() {
        let doc = read_json(b"{}").unwrap();
        assert!(doc.is_empty());
        let doc = read_json(b"[]").unwrap();
        assert!(doc.is_empty());
    }
}
