//! A single named, typed BSON value and the accessors over it.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::builder::BuilderValue;
use crate::document::{validate_document, Array, Document};
use crate::error::{Error, Result};
use crate::oid::ObjectId;
use crate::spec::{BinarySubtype, ElementType};

/// Given a 4 byte u8 slice, return an i32 calculated from the bytes in
/// little endian order.
pub(crate) fn i32_from_slice(val: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = val
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            Error::invalid_element_size(format!("expected 4 bytes to read i32, got {}", val.len()))
        })?;
    Ok(i32::from_le_bytes(arr))
}

/// Bytes up to (excluding) the next NUL, plus the total consumed including
/// the terminator.
fn cstr_bytes(buf: &[u8]) -> Option<(&[u8], usize)> {
    let len = buf.iter().position(|b| *b == 0)?;
    Some((&buf[..len], len + 1))
}

fn cstr_from(buf: &[u8]) -> Option<(&str, usize)> {
    let (bytes, consumed) = cstr_bytes(buf)?;
    let s = std::str::from_utf8(bytes).ok()?;
    Some((s, consumed))
}

/// The key of the element starting at `bytes[0]`, if its name can be read.
/// Used to attach key context to validation errors.
pub(crate) fn element_key(bytes: &[u8]) -> Option<&str> {
    cstr_from(bytes.get(1..)?).map(|(name, _)| name)
}

/// Decodes a full length-prefixed string payload: `int32 len | bytes | 0x00`,
/// where the payload slice must be exactly `4 + len` bytes.
fn str_from_payload(payload: &[u8]) -> Result<&str> {
    let len = i32_from_slice(payload)?;
    if len < 1 {
        return Err(Error::invalid_element_size(format!(
            "string length {len} too small"
        )));
    }
    let total = 4 + len as usize;
    if payload.len() != total {
        return Err(Error::invalid_element_size(format!(
            "string length {} disagrees with payload length {}",
            total,
            payload.len()
        )));
    }
    if payload[total - 1] != 0 {
        return Err(Error::invalid_element_size("string not null terminated"));
    }
    std::str::from_utf8(&payload[4..total - 1]).map_err(|_| Error::utf8_encoding())
}

/// Fully validates a single element starting at `bytes[0]` and returns its
/// total size, nested documents included.
///
/// Error calibration: a tag byte outside the recognized set, or an element
/// whose claimed extent overruns `bytes` (missing name terminator, size
/// prefix past the end), fails `InvalidElementType`; an in-bounds structural
/// inconsistency fails `InvalidElementSize` (or `InvalidDocumentSize` for
/// nested documents).
pub(crate) fn validate_element(bytes: &[u8]) -> Result<usize> {
    let tag = *bytes
        .first()
        .ok_or_else(|| Error::invalid_element_size("empty input"))?;
    let element_type = ElementType::from(tag).ok_or_else(|| Error::invalid_element_type(tag))?;
    let overrun = || Error::invalid_element_type(tag);

    let name_len = bytes[1..]
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(overrun)?;
    std::str::from_utf8(&bytes[1..1 + name_len]).map_err(|_| Error::utf8_encoding())?;
    let valueoffset = 1 + name_len + 1;
    let rest = &bytes[valueoffset..];

    let payload_size = match element_type {
        ElementType::Double
        | ElementType::DateTime
        | ElementType::Timestamp
        | ElementType::Int64 => {
            rest.get(..8).ok_or_else(overrun)?;
            8
        }
        ElementType::Int32 => {
            rest.get(..4).ok_or_else(overrun)?;
            4
        }
        ElementType::ObjectId => {
            rest.get(..12).ok_or_else(overrun)?;
            12
        }
        ElementType::Boolean => {
            rest.first().ok_or_else(overrun)?;
            1
        }
        ElementType::Null
        | ElementType::Undefined
        | ElementType::MinKey
        | ElementType::MaxKey => 0,
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
            let len = i32_from_slice(rest.get(..4).ok_or_else(overrun)?)?;
            if len < 1 {
                return Err(Error::invalid_element_size(format!(
                    "string length {len} too small"
                )));
            }
            let total = 4 + len as usize;
            let slice = rest.get(..total).ok_or_else(overrun)?;
            str_from_payload(slice)?;
            total
        }
        ElementType::EmbeddedDocument | ElementType::Array => {
            let len = i32_from_slice(rest.get(..4).ok_or_else(overrun)?)?;
            if len < 5 {
                return Err(Error::invalid_document_size(format!(
                    "document too small: {len} bytes"
                )));
            }
            let slice = rest.get(..len as usize).ok_or_else(overrun)?;
            validate_document(slice)?;
            len as usize
        }
        ElementType::Binary => {
            let len = i32_from_slice(rest.get(..4).ok_or_else(overrun)?)?;
            if len < 0 {
                return Err(Error::invalid_element_size(format!(
                    "negative binary length: {len}"
                )));
            }
            let total = 4 + 1 + len as usize;
            let slice = rest.get(..total).ok_or_else(overrun)?;
            if BinarySubtype::from(slice[4]) == BinarySubtype::BinaryOld {
                if len < 4 {
                    return Err(Error::invalid_element_size(
                        "old binary subtype has no inner declared length",
                    ));
                }
                let inner = i32_from_slice(&slice[5..9])?;
                if inner + 4 != len {
                    return Err(Error::invalid_element_size(
                        "old binary subtype has wrong inner declared length",
                    ));
                }
            }
            total
        }
        ElementType::RegularExpression => {
            let (pattern, pattern_len) = cstr_bytes(rest).ok_or_else(overrun)?;
            let (options, options_len) = cstr_bytes(&rest[pattern_len..]).ok_or_else(overrun)?;
            std::str::from_utf8(pattern).map_err(|_| Error::utf8_encoding())?;
            std::str::from_utf8(options).map_err(|_| Error::utf8_encoding())?;
            pattern_len + options_len
        }
        ElementType::DbPointer => {
            let len = i32_from_slice(rest.get(..4).ok_or_else(overrun)?)?;
            if len < 1 {
                return Err(Error::invalid_element_size(format!(
                    "string length {len} too small"
                )));
            }
            let str_total = 4 + len as usize;
            let total = str_total + 12;
            let slice = rest.get(..total).ok_or_else(overrun)?;
            str_from_payload(&slice[..str_total])?;
            total
        }
        ElementType::JavaScriptCodeWithScope => {
            let total = i32_from_slice(rest.get(..4).ok_or_else(overrun)?)?;
            // 4 (total) + 4 (code len) + 1 (code NUL) + 5 (empty scope)
            if total < 14 {
                return Err(Error::invalid_element_size(format!(
                    "code with scope length too small: {total}"
                )));
            }
            let slice = rest.get(..total as usize).ok_or_else(overrun)?;
            let code_len = i32_from_slice(&slice[4..8])?;
            if code_len < 1 {
                return Err(Error::invalid_element_size(format!(
                    "string length {code_len} too small"
                )));
            }
            let code_end = 8 + code_len as usize;
            let code_slice = slice.get(4..code_end).ok_or_else(|| {
                Error::invalid_element_size("code overruns code-with-scope length")
            })?;
            str_from_payload(code_slice)?;
            validate_document(&slice[code_end..])?;
            total as usize
        }
    };

    Ok(valueoffset + payload_size)
}

/// Computes the size of the element starting at `bytes[0]` without
/// revalidating nested structure. Bounds are still checked; used when
/// walking bytes that were validated at document construction.
pub(crate) fn element_size(bytes: &[u8]) -> Result<usize> {
    let tag = *bytes
        .first()
        .ok_or_else(|| Error::invalid_element_size("empty input"))?;
    let element_type = ElementType::from(tag).ok_or_else(|| Error::invalid_element_type(tag))?;
    let overrun = || Error::invalid_element_type(tag);

    let name_len = bytes[1..]
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(overrun)?;
    let valueoffset = 1 + name_len + 1;
    let rest = &bytes[valueoffset..];

    let payload_size = match element_type {
        ElementType::Double
        | ElementType::DateTime
        | ElementType::Timestamp
        | ElementType::Int64 => 8,
        ElementType::Int32 => 4,
        ElementType::ObjectId => 12,
        ElementType::Boolean => 1,
        ElementType::Null
        | ElementType::Undefined
        | ElementType::MinKey
        | ElementType::MaxKey => 0,
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
            4 + i32_from_slice(rest.get(..4).ok_or_else(overrun)?)? as usize
        }
        ElementType::EmbeddedDocument
        | ElementType::Array
        | ElementType::JavaScriptCodeWithScope => {
            i32_from_slice(rest.get(..4).ok_or_else(overrun)?)? as usize
        }
        ElementType::Binary => 4 + 1 + i32_from_slice(rest.get(..4).ok_or_else(overrun)?)? as usize,
        ElementType::RegularExpression => {
            let pattern_len = rest.iter().position(|b| *b == 0).ok_or_else(overrun)? + 1;
            let options_len = rest[pattern_len..]
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(overrun)?
                + 1;
            pattern_len + options_len
        }
        ElementType::DbPointer => {
            4 + i32_from_slice(rest.get(..4).ok_or_else(overrun)?)? as usize + 12
        }
    };

    let total = valueoffset + payload_size;
    bytes.get(..total).ok_or_else(overrun)?;
    Ok(total)
}

/// One named, typed value inside a BSON document.
///
/// An element stores its full wire bytes (tag byte, name cstring and
/// payload) either as a borrowed view into a larger buffer (the result of
/// iterating a [`Document`]) or as a detached heap-owned buffer (the result
/// of [`Element::new`], [`Element::into_owned`], or any mutation).
///
/// ```
/// use bsonpath::Element;
///
/// let bytes = b"\x02hello\x00\x06\x00\x00\x00world\x00";
/// let element = Element::from_slice(bytes)?;
/// assert_eq!(element.name(), "hello");
/// assert_eq!(element.as_str()?, "world");
/// assert_eq!(element.size(), bytes.len());
/// # Ok::<(), bsonpath::Error>(())
/// ```
#[derive(Clone)]
pub struct Element<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> Element<'a> {
    /// Parses a single element starting at offset 0 of `bytes`, borrowing
    /// exactly the element's extent.
    ///
    /// Fails with `InvalidElementType` if the tag byte is unknown or the
    /// element's claimed extent overruns `bytes`; in-bounds structural
    /// inconsistencies fail with `InvalidElementSize`.
    pub fn from_slice(bytes: &'a [u8]) -> Result<Element<'a>> {
        let size = validate_element(bytes)?;
        Ok(Element {
            data: Cow::Borrowed(&bytes[..size]),
        })
    }

    /// Parses a single element from an owned buffer, truncating it to the
    /// element's extent.
    pub fn from_vec(mut bytes: Vec<u8>) -> Result<Element<'static>> {
        let size = validate_element(&bytes)?;
        bytes.truncate(size);
        Ok(Element {
            data: Cow::Owned(bytes),
        })
    }

    /// Constructs a detached element from a name and a native value, with
    /// the type tag chosen by the value (see [`BuilderValue`]).
    ///
    /// ```
    /// use bsonpath::{Element, ElementType};
    ///
    /// let element = Element::new("val", 123)?;
    /// assert_eq!(element.element_type(), ElementType::Int32);
    /// assert_eq!(element.as_i32()?, 123);
    /// # Ok::<(), bsonpath::Error>(())
    /// ```
    pub fn new(name: impl AsRef<str>, value: impl Into<BuilderValue>) -> Result<Element<'static>> {
        let name = name.as_ref();
        if name.as_bytes().contains(&0) {
            return Err(Error::invalid_key(format!(
                "element name contains interior NUL: {name:?}"
            )));
        }
        let value = value.into();
        let mut data = Vec::with_capacity(2 + name.len());
        data.push(value.element_type() as u8);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        value.encode_payload(&mut data)?;
        Ok(Element {
            data: Cow::Owned(data),
        })
    }

    /// Wraps bytes already validated by a document scan. `bytes` must span
    /// exactly one element.
    pub(crate) fn from_validated(bytes: &'a [u8]) -> Element<'a> {
        Element {
            data: Cow::Borrowed(bytes),
        }
    }

    /// The element's key.
    pub fn name(&self) -> &str {
        // data was validated on construction: the name terminator exists and
        // the name bytes are UTF-8.
        let (name, _) = cstr_from(&self.data[1..]).expect("element bytes validated");
        name
    }

    /// The element's type.
    pub fn element_type(&self) -> ElementType {
        // the tag byte is always from the recognized set by construction
        ElementType::from(self.data[0]).expect("element bytes validated")
    }

    /// The total wire size of the element:
    /// `1 + name.len() + 1 + payload.len()`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn payload_offset(&self) -> usize {
        2 + self.name().len()
    }

    /// The element's raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset()..]
    }

    /// The element's full wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copies the element into a detached, heap-owned buffer.
    pub fn to_owned(&self) -> Element<'static> {
        Element {
            data: Cow::Owned(self.data.to_vec()),
        }
    }

    /// Converts into a detached element, copying only if still borrowed.
    pub fn into_owned(self) -> Element<'static> {
        Element {
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// For borrowed container elements, reborrows the nested document bytes
    /// with the backing buffer's lifetime.
    pub(crate) fn container_bytes(&self) -> Option<&'a [u8]> {
        if !self.element_type().is_container() {
            return None;
        }
        match &self.data {
            Cow::Borrowed(data) => Some(&data[self.payload_offset()..]),
            Cow::Owned(_) => None,
        }
    }

    fn check_type(&self, expected: ElementType) -> Result<()> {
        let actual = self.element_type();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::incompatible_element_conversion(expected, actual))
        }
    }

    fn fixed_payload<const N: usize>(&self) -> Result<[u8; N]> {
        self.payload().try_into().map_err(|_| {
            Error::invalid_element_size(format!(
                "expected {N} byte payload, got {}",
                self.payload().len()
            ))
        })
    }

    /// Gets the double value, or an error if the element isn't a double.
    pub fn as_f64(&self) -> Result<f64> {
        self.check_type(ElementType::Double)?;
        Ok(f64::from_le_bytes(self.fixed_payload()?))
    }

    /// Gets the string value, or an error if the element isn't a string.
    pub fn as_str(&self) -> Result<&str> {
        self.check_type(ElementType::String)?;
        str_from_payload(self.payload())
    }

    /// Gets the embedded document, or an error if the element isn't one.
    pub fn as_document(&self) -> Result<Document<'_>> {
        self.check_type(ElementType::EmbeddedDocument)?;
        Document::from_slice(self.payload())
    }

    /// Gets the array, or an error if the element isn't an array.
    pub fn as_array(&self) -> Result<Array<'_>> {
        self.check_type(ElementType::Array)?;
        Array::from_slice(self.payload())
    }

    /// Gets the binary value, or an error if the element isn't binary.
    pub fn as_binary(&self) -> Result<Binary<'_>> {
        self.check_type(ElementType::Binary)?;
        let payload = self.payload();
        let len = i32_from_slice(payload)?;
        if len < 0 || payload.len() != 4 + 1 + len as usize {
            return Err(Error::invalid_element_size(
                "binary has wrong declared length",
            ));
        }
        let subtype = BinarySubtype::from(payload[4]);
        let bytes = match subtype {
            BinarySubtype::BinaryOld => {
                if len < 4 || i32_from_slice(&payload[5..])? + 4 != len {
                    return Err(Error::invalid_element_size(
                        "old binary subtype has wrong inner declared length",
                    ));
                }
                &payload[9..]
            }
            _ => &payload[5..],
        };
        Ok(Binary { subtype, bytes })
    }

    /// Gets the ObjectId, or an error if the element isn't an ObjectId.
    pub fn as_object_id(&self) -> Result<ObjectId> {
        self.check_type(ElementType::ObjectId)?;
        Ok(ObjectId::from_bytes(self.fixed_payload()?))
    }

    /// Gets the boolean value, or an error if the element isn't a boolean.
    ///
    /// Any non-zero stored byte reads as `true`; writes always emit 0 or 1.
    pub fn as_bool(&self) -> Result<bool> {
        self.check_type(ElementType::Boolean)?;
        let [byte] = self.fixed_payload::<1>()?;
        Ok(byte != 0)
    }

    /// Gets the datetime value as milliseconds since the Unix epoch, or an
    /// error if the element isn't a datetime.
    pub fn as_datetime(&self) -> Result<i64> {
        self.check_type(ElementType::DateTime)?;
        Ok(i64::from_le_bytes(self.fixed_payload()?))
    }

    /// Gets the regular expression, or an error if the element isn't one.
    pub fn as_regex(&self) -> Result<Regex<'_>> {
        self.check_type(ElementType::RegularExpression)?;
        let payload = self.payload();
        let (pattern, pattern_len) = cstr_from(payload)
            .ok_or_else(|| Error::invalid_element_size("expected two null-terminated strings"))?;
        let (options, options_len) = cstr_from(&payload[pattern_len..])
            .ok_or_else(|| Error::invalid_element_size("expected two null-terminated strings"))?;
        if pattern_len + options_len != payload.len() {
            return Err(Error::invalid_element_size(
                "expected two null-terminated strings",
            ));
        }
        Ok(Regex { pattern, options })
    }

    /// Gets the DBPointer, or an error if the element isn't one.
    pub fn as_db_pointer(&self) -> Result<DbPointer<'_>> {
        self.check_type(ElementType::DbPointer)?;
        let payload = self.payload();
        if payload.len() < 12 {
            return Err(Error::invalid_element_size("DBPointer too short"));
        }
        let (namespace_bytes, id_bytes) = payload.split_at(payload.len() - 12);
        let namespace = str_from_payload(namespace_bytes)?;
        // split_at guarantees 12 bytes
        let id = ObjectId::from_bytes(id_bytes.try_into().expect("12 byte slice"));
        Ok(DbPointer { namespace, id })
    }

    /// Gets the JavaScript code, or an error if the element isn't code.
    pub fn as_javascript(&self) -> Result<&str> {
        self.check_type(ElementType::JavaScriptCode)?;
        str_from_payload(self.payload())
    }

    /// Gets the symbol value, or an error if the element isn't a symbol.
    pub fn as_symbol(&self) -> Result<&str> {
        self.check_type(ElementType::Symbol)?;
        str_from_payload(self.payload())
    }

    /// Gets the scoped JavaScript code, or an error if the element isn't
    /// scoped code.
    pub fn as_javascript_with_scope(&self) -> Result<JavaScriptCodeWithScope<'_>> {
        self.check_type(ElementType::JavaScriptCodeWithScope)?;
        let payload = self.payload();
        let total = i32_from_slice(payload)?;
        if total as usize != payload.len() {
            return Err(Error::invalid_element_size(
                "code with scope has wrong declared length",
            ));
        }
        let code_len = i32_from_slice(payload.get(4..).unwrap_or_default())?;
        if code_len < 1 {
            return Err(Error::invalid_element_size(format!(
                "string length {code_len} too small"
            )));
        }
        let code_end = 8 + code_len as usize;
        let code = str_from_payload(
            payload
                .get(4..code_end)
                .ok_or_else(|| Error::invalid_element_size("code overruns declared length"))?,
        )?;
        let scope = Document::from_slice(&payload[code_end..])?;
        Ok(JavaScriptCodeWithScope { code, scope })
    }

    /// Gets the timestamp, or an error if the element isn't a timestamp.
    pub fn as_timestamp(&self) -> Result<Timestamp> {
        self.check_type(ElementType::Timestamp)?;
        let raw = u64::from_le_bytes(self.fixed_payload()?);
        Ok(Timestamp {
            time: (raw >> 32) as u32,
            increment: raw as u32,
        })
    }

    /// Gets the i32 value, or an error if the element isn't an int32.
    pub fn as_i32(&self) -> Result<i32> {
        self.check_type(ElementType::Int32)?;
        Ok(i32::from_le_bytes(self.fixed_payload()?))
    }

    /// Gets the i64 value, or an error if the element isn't an int64.
    pub fn as_i64(&self) -> Result<i64> {
        self.check_type(ElementType::Int64)?;
        Ok(i64::from_le_bytes(self.fixed_payload()?))
    }

    /// Decodes the payload according to the current type tag, yielding the
    /// full [`Value`] view. This is the dispatch point for per-type
    /// operations.
    pub fn as_value(&self) -> Result<Value<'_>> {
        Ok(match self.element_type() {
            ElementType::Double => Value::Double(self.as_f64()?),
            ElementType::String => Value::String(self.as_str()?),
            ElementType::EmbeddedDocument => Value::Document(self.as_document()?),
            ElementType::Array => Value::Array(self.as_array()?),
            ElementType::Binary => Value::Binary(self.as_binary()?),
            ElementType::Undefined => Value::Undefined,
            ElementType::ObjectId => Value::ObjectId(self.as_object_id()?),
            ElementType::Boolean => Value::Boolean(self.as_bool()?),
            ElementType::DateTime => Value::DateTime(self.as_datetime()?),
            ElementType::Null => Value::Null,
            ElementType::RegularExpression => Value::RegularExpression(self.as_regex()?),
            ElementType::DbPointer => Value::DbPointer(self.as_db_pointer()?),
            ElementType::JavaScriptCode => Value::JavaScriptCode(self.as_javascript()?),
            ElementType::Symbol => Value::Symbol(self.as_symbol()?),
            ElementType::JavaScriptCodeWithScope => {
                Value::JavaScriptCodeWithScope(self.as_javascript_with_scope()?)
            }
            ElementType::Int32 => Value::Int32(self.as_i32()?),
            ElementType::Timestamp => Value::Timestamp(self.as_timestamp()?),
            ElementType::Int64 => Value::Int64(self.as_i64()?),
            ElementType::MaxKey => Value::MaxKey,
            ElementType::MinKey => Value::MinKey,
        })
    }

    /// Decodes the payload as a native `T`, independent of the exact tag.
    ///
    /// `T` must be representation-compatible with the current type (numeric
    /// types with the arithmetic tags, strings with the string-like tags),
    /// else `IncompatibleTypeConversion`; a compatible tag with the wrong
    /// payload length for `T` fails `InvalidElementSize`.
    ///
    /// ```
    /// use bsonpath::{Element, ElementType};
    ///
    /// let mut element = Element::new("n", 123)?;
    /// element.set_element_type(ElementType::Int64);
    /// // the payload is still the 4 bytes written for the int32
    /// assert_eq!(element.value::<i32>()?, 123);
    /// assert!(element.value::<i64>().unwrap_err().is_invalid_element_size());
    /// # Ok::<(), bsonpath::Error>(())
    /// ```
    pub fn value<'s, T: FromElement<'s>>(&'s self) -> Result<T> {
        T::from_element(self)
    }

    fn commit(&mut self, element_type: ElementType, payload: &[u8]) {
        let name = self.name();
        let mut data = Vec::with_capacity(2 + name.len() + payload.len());
        data.push(element_type as u8);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(payload);
        self.data = Cow::Owned(data);
    }

    /// Renames the element, copying `name`.
    ///
    /// Fails with `InvalidKey` if `name` contains an interior NUL byte; the
    /// element is unchanged on failure.
    pub fn set_name(&mut self, name: impl AsRef<str>) -> Result<()> {
        let name = name.as_ref();
        if name.as_bytes().contains(&0) {
            return Err(Error::invalid_key(format!(
                "element name contains interior NUL: {name:?}"
            )));
        }
        let mut data = Vec::with_capacity(2 + name.len() + self.payload().len());
        data.push(self.data[0]);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(self.payload());
        self.data = Cow::Owned(data);
        Ok(())
    }

    /// Changes the element's type tag, leaving the payload bytes in place.
    ///
    /// This is only safe when followed by [`set_value`](Self::set_value):
    /// accessors on an element whose payload is inconsistent with its new
    /// tag fail with `InvalidElementSize` or `InvalidDocumentSize`.
    pub fn set_element_type(&mut self, element_type: ElementType) {
        self.data.to_mut()[0] = element_type as u8;
    }

    /// Overwrites the type tag and payload from a native value, per the
    /// value's natural tag mapping.
    ///
    /// Assigning [`BuilderValue::Null`] keeps the current tag and requires
    /// an empty payload. The element is unchanged on failure.
    pub fn set_value(&mut self, value: impl Into<BuilderValue>) -> Result<()> {
        let value = value.into();
        if let BuilderValue::Null = value {
            return if self.payload().is_empty() {
                Ok(())
            } else {
                Err(Error::incompatible_type_conversion(format!(
                    "cannot assign nil to a {:?} element",
                    self.element_type()
                )))
            };
        }
        let mut payload = Vec::new();
        value.encode_payload(&mut payload)?;
        self.commit(value.element_type(), &payload);
        Ok(())
    }

    /// Overwrites the type tag and payload from a native value with an
    /// explicit target tag, coercing where possible (non-zero integers to
    /// `true`, integers across widths when they fit).
    ///
    /// Fails with `IncompatibleTypeConversion` when `value` cannot be
    /// encoded as `element_type`; the element is unchanged on failure.
    pub fn set_value_with(
        &mut self,
        element_type: ElementType,
        value: impl Into<BuilderValue>,
    ) -> Result<()> {
        let value = value.into().coerce_to(element_type)?;
        let mut payload = Vec::new();
        value.encode_payload(&mut payload)?;
        self.commit(element_type, &payload);
        Ok(())
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data.as_ref() == other.data.as_ref()
    }
}

impl Eq for Element<'_> {}

impl PartialOrd for Element<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element<'_> {
    /// Three-way ordering by (type tag, name, payload bytes).
    fn cmp(&self, other: &Self) -> Ordering {
        self.data[0]
            .cmp(&other.data[0])
            .then_with(|| self.name().cmp(other.name()))
            .then_with(|| self.payload().cmp(other.payload()))
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("element_type", &self.element_type())
            .field("payload", &hex::encode(self.payload()))
            .finish()
    }
}

/// A BSON binary value referencing bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binary<'a> {
    /// The binary subtype byte.
    pub subtype: BinarySubtype,
    /// The binary payload.
    pub bytes: &'a [u8],
}

/// A BSON regular expression referencing bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Regex<'a> {
    /// The regex pattern.
    pub pattern: &'a str,
    /// The regex options, e.g. `"i"`.
    pub options: &'a str,
}

/// A BSON DBPointer referencing bytes stored elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DbPointer<'a> {
    /// The namespace.
    pub namespace: &'a str,
    /// The pointed-to ObjectId.
    pub id: ObjectId,
}

/// BSON JavaScript code with its scope document.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaScriptCodeWithScope<'a> {
    /// The code.
    pub code: &'a str,
    /// The scope document.
    pub scope: Document<'a>,
}

/// A BSON timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,
    /// An incrementing ordinal for operations within a given second.
    pub increment: u32,
}

/// A typed view of an element's payload, produced by
/// [`Element::as_value`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Value<'a> {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(&'a str),
    /// Embedded document
    Document(Document<'a>),
    /// Array
    Array(Array<'a>),
    /// Binary data
    Binary(Binary<'a>),
    /// Deprecated. Undefined (value)
    Undefined,
    /// ObjectId
    ObjectId(ObjectId),
    /// Boolean value
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch
    DateTime(i64),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex<'a>),
    /// Deprecated. DBPointer
    DbPointer(DbPointer<'a>),
    /// JavaScript code
    JavaScriptCode(&'a str),
    /// Deprecated. Symbol
    Symbol(&'a str),
    /// JavaScript code with scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope<'a>),
    /// 32-bit signed integer
    Int32(i32),
    /// Timestamp
    Timestamp(Timestamp),
    /// 64-bit signed integer
    Int64(i64),
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
}

impl Value<'_> {
    /// The element type corresponding to this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(..) => ElementType::Double,
            Value::String(..) => ElementType::String,
            Value::Document(..) => ElementType::EmbeddedDocument,
            Value::Array(..) => ElementType::Array,
            Value::Binary(..) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(..) => ElementType::ObjectId,
            Value::Boolean(..) => ElementType::Boolean,
            Value::DateTime(..) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::RegularExpression(..) => ElementType::RegularExpression,
            Value::DbPointer(..) => ElementType::DbPointer,
            Value::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Value::Symbol(..) => ElementType::Symbol,
            Value::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Value::Int32(..) => ElementType::Int32,
            Value::Timestamp(..) => ElementType::Timestamp,
            Value::Int64(..) => ElementType::Int64,
            Value::MaxKey => ElementType::MaxKey,
            Value::MinKey => ElementType::MinKey,
        }
    }
}

fn arithmetic_tag(element_type: ElementType) -> bool {
    matches!(
        element_type,
        ElementType::Boolean
            | ElementType::Int32
            | ElementType::Int64
            | ElementType::Double
            | ElementType::DateTime
            | ElementType::Timestamp
    )
}

fn string_tag(element_type: ElementType) -> bool {
    matches!(
        element_type,
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol
    )
}

/// Types that can be decoded from an element's payload via
/// [`Element::value`].
pub trait FromElement<'a>: Sized {
    /// Decodes the element's payload as `Self`.
    fn from_element(element: &'a Element<'_>) -> Result<Self>;
}

fn require_arithmetic(element: &Element<'_>) -> Result<()> {
    if arithmetic_tag(element.element_type()) {
        Ok(())
    } else {
        Err(Error::incompatible_type_conversion(format!(
            "{:?} element does not carry a numeric value",
            element.element_type()
        )))
    }
}

impl<'a> FromElement<'a> for bool {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        require_arithmetic(element)?;
        let [byte] = element.fixed_payload::<1>()?;
        Ok(byte != 0)
    }
}

impl<'a> FromElement<'a> for i32 {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        require_arithmetic(element)?;
        Ok(i32::from_le_bytes(element.fixed_payload()?))
    }
}

impl<'a> FromElement<'a> for i64 {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        require_arithmetic(element)?;
        Ok(i64::from_le_bytes(element.fixed_payload()?))
    }
}

impl<'a> FromElement<'a> for f64 {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        require_arithmetic(element)?;
        Ok(f64::from_le_bytes(element.fixed_payload()?))
    }
}

impl<'a> FromElement<'a> for &'a str {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        if !string_tag(element.element_type()) {
            return Err(Error::incompatible_type_conversion(format!(
                "{:?} element does not carry a string value",
                element.element_type()
            )));
        }
        str_from_payload(element.payload())
    }
}

impl<'a> FromElement<'a> for String {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        <&str>::from_element(element).map(String::from)
    }
}

impl<'a> FromElement<'a> for Document<'a> {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        if !element.element_type().is_container() {
            return Err(Error::incompatible_type_conversion(format!(
                "{:?} element does not carry a document value",
                element.element_type()
            )));
        }
        Document::from_slice(element.payload())
    }
}

impl<'a> FromElement<'a> for ObjectId {
    fn from_element(element: &'a Element<'_>) -> Result<Self> {
        if element.element_type() != ElementType::ObjectId {
            return Err(Error::incompatible_type_conversion(format!(
                "{:?} element does not carry an ObjectId value",
                element.element_type()
            )));
        }
        Ok(ObjectId::from_bytes(element.fixed_payload()?))
    }
}
