//! Incremental construction of documents and arrays.

use crate::document::{Array, Document};
use crate::error::{Error, Result};
use crate::oid::ObjectId;
use crate::spec::{BinarySubtype, ElementType};
use crate::element::{Element, Timestamp, Value};

/// An owned value awaiting placement in a document or array.
///
/// This is the writing counterpart of [`Value`](crate::Value): every
/// recognized element type has a variant, and the `From` conversions encode
/// the native → tag mapping used by [`Element::new`](crate::Element::new),
/// [`Element::set_value`](crate::Element::set_value) and the builders:
/// booleans become `boolean`, integers up to 32 bits become `int32`, 64-bit
/// integers become `int64`, floats become `double`, string-likes become
/// `string`, `(pattern, options)` tuples become regular expressions and
/// `(namespace, ObjectId)` tuples become DBPointers.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum BuilderValue {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// An already-built embedded document (copied in)
    Document(Document<'static>),
    /// An already-built array (copied in)
    Array(Array<'static>),
    /// A nested document builder, emitted when the parent is built
    Builder(DocumentBuilder),
    /// A nested array builder, emitted when the parent is built
    ArrayBuilder(ArrayBuilder),
    /// Binary data
    Binary {
        /// The binary subtype byte.
        subtype: BinarySubtype,
        /// The binary payload.
        bytes: Vec<u8>,
    },
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
    RegularExpression {
        /// The regex pattern.
        pattern: String,
        /// The regex options.
        options: String,
    },
    /// Deprecated. DBPointer
    DbPointer {
        /// The namespace.
        namespace: String,
        /// The pointed-to ObjectId.
        id: ObjectId,
    },
    /// JavaScript code
    JavaScriptCode(String),
    /// Deprecated. Symbol
    Symbol(String),
    /// JavaScript code with scope
    JavaScriptCodeWithScope {
        /// The code.
        code: String,
        /// The scope document builder.
        scope: DocumentBuilder,
    },
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

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend(((s.len() + 1) as i32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn write_cstring(buf: &mut Vec<u8>, s: &str, what: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::incompatible_type_conversion(format!(
            "{what} contains interior NUL: {s:?}"
        )));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

impl BuilderValue {
    /// The element type this value encodes as.
    pub fn element_type(&self) -> ElementType {
        match self {
            BuilderValue::Double(..) => ElementType::Double,
            BuilderValue::String(..) => ElementType::String,
            BuilderValue::Document(..) | BuilderValue::Builder(..) => {
                ElementType::EmbeddedDocument
            }
            BuilderValue::Array(..) | BuilderValue::ArrayBuilder(..) => ElementType::Array,
            BuilderValue::Binary { .. } => ElementType::Binary,
            BuilderValue::Undefined => ElementType::Undefined,
            BuilderValue::ObjectId(..) => ElementType::ObjectId,
            BuilderValue::Boolean(..) => ElementType::Boolean,
            BuilderValue::DateTime(..) => ElementType::DateTime,
            BuilderValue::Null => ElementType::Null,
            BuilderValue::RegularExpression { .. } => ElementType::RegularExpression,
            BuilderValue::DbPointer { .. } => ElementType::DbPointer,
            BuilderValue::JavaScriptCode(..) => ElementType::JavaScriptCode,
            BuilderValue::Symbol(..) => ElementType::Symbol,
            BuilderValue::JavaScriptCodeWithScope { .. } => ElementType::JavaScriptCodeWithScope,
            BuilderValue::Int32(..) => ElementType::Int32,
            BuilderValue::Timestamp(..) => ElementType::Timestamp,
            BuilderValue::Int64(..) => ElementType::Int64,
            BuilderValue::MaxKey => ElementType::MaxKey,
            BuilderValue::MinKey => ElementType::MinKey,
        }
    }

    /// Appends the wire payload for this value to `buf`.
    pub(crate) fn encode_payload(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            BuilderValue::Double(f) => buf.extend(f.to_le_bytes()),
            BuilderValue::String(s)
            | BuilderValue::JavaScriptCode(s)
            | BuilderValue::Symbol(s) => write_string(buf, s),
            BuilderValue::Document(d) => buf.extend_from_slice(d.as_bytes()),
            BuilderValue::Array(a) => buf.extend_from_slice(a.as_bytes()),
            BuilderValue::Builder(b) => b.emit_into(buf)?,
            BuilderValue::ArrayBuilder(b) => b.emit_into(buf)?,
            BuilderValue::Binary { subtype, bytes } => {
                if let BinarySubtype::BinaryOld = subtype {
                    buf.extend(((bytes.len() + 4) as i32).to_le_bytes());
                    buf.push(u8::from(*subtype));
                    buf.extend((bytes.len() as i32).to_le_bytes());
                } else {
                    buf.extend((bytes.len() as i32).to_le_bytes());
                    buf.push(u8::from(*subtype));
                }
                buf.extend_from_slice(bytes);
            }
            BuilderValue::ObjectId(oid) => buf.extend(oid.bytes()),
            BuilderValue::Boolean(b) => buf.push(*b as u8),
            BuilderValue::DateTime(ms) => buf.extend(ms.to_le_bytes()),
            BuilderValue::RegularExpression { pattern, options } => {
                write_cstring(buf, pattern, "regex pattern")?;
                write_cstring(buf, options, "regex options")?;
            }
            BuilderValue::DbPointer { namespace, id } => {
                write_string(buf, namespace);
                buf.extend(id.bytes());
            }
            BuilderValue::JavaScriptCodeWithScope { code, scope } => {
                let start = buf.len();
                buf.extend_from_slice(&[0; 4]);
                write_string(buf, code);
                scope.emit_into(buf)?;
                let total = ((buf.len() - start) as i32).to_le_bytes();
                buf[start..start + 4].copy_from_slice(&total);
            }
            BuilderValue::Int32(i) => buf.extend(i.to_le_bytes()),
            BuilderValue::Timestamp(ts) => {
                let raw = ((ts.time as u64) << 32) | ts.increment as u64;
                buf.extend(raw.to_le_bytes());
            }
            BuilderValue::Int64(i) => buf.extend(i.to_le_bytes()),
            BuilderValue::Null
            | BuilderValue::Undefined
            | BuilderValue::MaxKey
            | BuilderValue::MinKey => {}
        }
        Ok(())
    }

    /// Reinterprets this value under an explicit target tag, coercing where
    /// the encodings allow it.
    pub(crate) fn coerce_to(self, element_type: ElementType) -> Result<BuilderValue> {
        use BuilderValue::*;

        let incompatible = |value: &BuilderValue| {
            Err(Error::incompatible_type_conversion(format!(
                "cannot encode {:?} as {:?}",
                value.element_type(),
                element_type
            )))
        };

        if self.element_type() == element_type {
            return Ok(self);
        }

        Ok(match element_type {
            ElementType::Boolean => match self {
                Int32(i) => Boolean(i != 0),
                Int64(i) => Boolean(i != 0),
                Double(f) => Boolean(f != 0.0),
                other => return incompatible(&other),
            },
            ElementType::Int32 => match self {
                Boolean(b) => Int32(b as i32),
                Int64(i) => match i32::try_from(i) {
                    Ok(i) => Int32(i),
                    Err(_) => {
                        return Err(Error::incompatible_type_conversion(format!(
                            "{i} does not fit in an int32"
                        )))
                    }
                },
                Double(f) if f.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&f) => {
                    Int32(f as i32)
                }
                other => return incompatible(&other),
            },
            ElementType::Int64 => match self {
                Boolean(b) => Int64(b as i64),
                Int32(i) => Int64(i as i64),
                Double(f)
                    if f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&f) =>
                {
                    Int64(f as i64)
                }
                other => return incompatible(&other),
            },
            ElementType::Double => match self {
                Boolean(b) => Double(b as i32 as f64),
                Int32(i) => Double(i as f64),
                Int64(i) => Double(i as f64),
                other => return incompatible(&other),
            },
            ElementType::DateTime => match self {
                Int32(i) => DateTime(i as i64),
                Int64(i) => DateTime(i),
                other => return incompatible(&other),
            },
            ElementType::String => match self {
                JavaScriptCode(s) | Symbol(s) => String(s),
                other => return incompatible(&other),
            },
            ElementType::JavaScriptCode => match self {
                String(s) | Symbol(s) => JavaScriptCode(s),
                other => return incompatible(&other),
            },
            ElementType::Symbol => match self {
                String(s) | JavaScriptCode(s) => Symbol(s),
                other => return incompatible(&other),
            },
            ElementType::EmbeddedDocument => match self {
                BuilderValue::Array(a) => BuilderValue::Document(a.into_document()),
                BuilderValue::ArrayBuilder(b) => BuilderValue::Builder(DocumentBuilder {
                    children: b
                        .children
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), v))
                        .collect(),
                }),
                other => return incompatible(&other),
            },
            ElementType::Null | ElementType::Undefined | ElementType::MinKey
            | ElementType::MaxKey => match self {
                Null | Undefined | MinKey | MaxKey => match element_type {
                    ElementType::Null => Null,
                    ElementType::Undefined => Undefined,
                    ElementType::MinKey => MinKey,
                    _ => MaxKey,
                },
                other => return incompatible(&other),
            },
            _ => return incompatible(&self),
        })
    }
}

impl From<f32> for BuilderValue {
    fn from(v: f32) -> Self {
        BuilderValue::Double(v as f64)
    }
}

impl From<f64> for BuilderValue {
    fn from(v: f64) -> Self {
        BuilderValue::Double(v)
    }
}

impl From<&str> for BuilderValue {
    fn from(v: &str) -> Self {
        BuilderValue::String(v.to_string())
    }
}

impl From<String> for BuilderValue {
    fn from(v: String) -> Self {
        BuilderValue::String(v)
    }
}

impl From<bool> for BuilderValue {
    fn from(v: bool) -> Self {
        BuilderValue::Boolean(v)
    }
}

impl From<i8> for BuilderValue {
    fn from(v: i8) -> Self {
        BuilderValue::Int32(v as i32)
    }
}

impl From<i16> for BuilderValue {
    fn from(v: i16) -> Self {
        BuilderValue::Int32(v as i32)
    }
}

impl From<i32> for BuilderValue {
    fn from(v: i32) -> Self {
        BuilderValue::Int32(v)
    }
}

impl From<u8> for BuilderValue {
    fn from(v: u8) -> Self {
        BuilderValue::Int32(v as i32)
    }
}

impl From<u16> for BuilderValue {
    fn from(v: u16) -> Self {
        BuilderValue::Int32(v as i32)
    }
}

impl From<u32> for BuilderValue {
    fn from(v: u32) -> Self {
        BuilderValue::Int64(v as i64)
    }
}

impl From<i64> for BuilderValue {
    fn from(v: i64) -> Self {
        BuilderValue::Int64(v)
    }
}

impl From<ObjectId> for BuilderValue {
    fn from(v: ObjectId) -> Self {
        BuilderValue::ObjectId(v)
    }
}

impl From<[u8; 12]> for BuilderValue {
    fn from(v: [u8; 12]) -> Self {
        BuilderValue::ObjectId(ObjectId::from_bytes(v))
    }
}

impl From<Timestamp> for BuilderValue {
    fn from(v: Timestamp) -> Self {
        BuilderValue::Timestamp(v)
    }
}

impl From<&[u8]> for BuilderValue {
    fn from(v: &[u8]) -> Self {
        BuilderValue::Binary {
            subtype: BinarySubtype::Generic,
            bytes: v.to_vec(),
        }
    }
}

impl From<Vec<u8>> for BuilderValue {
    fn from(v: Vec<u8>) -> Self {
        BuilderValue::Binary {
            subtype: BinarySubtype::Generic,
            bytes: v,
        }
    }
}

impl From<(&str, &str)> for BuilderValue {
    fn from((pattern, options): (&str, &str)) -> Self {
        BuilderValue::RegularExpression {
            pattern: pattern.to_string(),
            options: options.to_string(),
        }
    }
}

impl From<(String, String)> for BuilderValue {
    fn from((pattern, options): (String, String)) -> Self {
        BuilderValue::RegularExpression { pattern, options }
    }
}

impl From<(&str, ObjectId)> for BuilderValue {
    fn from((namespace, id): (&str, ObjectId)) -> Self {
        BuilderValue::DbPointer {
            namespace: namespace.to_string(),
            id,
        }
    }
}

impl From<(String, ObjectId)> for BuilderValue {
    fn from((namespace, id): (String, ObjectId)) -> Self {
        BuilderValue::DbPointer { namespace, id }
    }
}

impl From<DocumentBuilder> for BuilderValue {
    fn from(v: DocumentBuilder) -> Self {
        BuilderValue::Builder(v)
    }
}

impl From<ArrayBuilder> for BuilderValue {
    fn from(v: ArrayBuilder) -> Self {
        BuilderValue::ArrayBuilder(v)
    }
}

impl From<Document<'_>> for BuilderValue {
    fn from(v: Document<'_>) -> Self {
        BuilderValue::Document(v.into_owned())
    }
}

impl From<Array<'_>> for BuilderValue {
    fn from(v: Array<'_>) -> Self {
        BuilderValue::Array(Array::from_document(v.into_document().into_owned()))
    }
}

impl From<Vec<BuilderValue>> for BuilderValue {
    fn from(v: Vec<BuilderValue>) -> Self {
        BuilderValue::ArrayBuilder(ArrayBuilder { children: v })
    }
}

impl From<()> for BuilderValue {
    fn from(_: ()) -> Self {
        BuilderValue::Null
    }
}

impl TryFrom<&Element<'_>> for BuilderValue {
    type Error = Error;

    /// Decomposes an element's payload into an owned value, copying out of
    /// the element's buffer.
    fn try_from(element: &Element<'_>) -> Result<BuilderValue> {
        Ok(match element.as_value()? {
            Value::Double(f) => BuilderValue::Double(f),
            Value::String(s) => BuilderValue::String(s.to_string()),
            Value::Document(d) => BuilderValue::Document(d.into_owned()),
            Value::Array(a) => {
                BuilderValue::Array(Array::from_document(a.into_document().into_owned()))
            }
            Value::Binary(b) => BuilderValue::Binary {
                subtype: b.subtype,
                bytes: b.bytes.to_vec(),
            },
            Value::Undefined => BuilderValue::Undefined,
            Value::ObjectId(oid) => BuilderValue::ObjectId(oid),
            Value::Boolean(b) => BuilderValue::Boolean(b),
            Value::DateTime(ms) => BuilderValue::DateTime(ms),
            Value::Null => BuilderValue::Null,
            Value::RegularExpression(re) => BuilderValue::RegularExpression {
                pattern: re.pattern.to_string(),
                options: re.options.to_string(),
            },
            Value::DbPointer(ptr) => BuilderValue::DbPointer {
                namespace: ptr.namespace.to_string(),
                id: ptr.id,
            },
            Value::JavaScriptCode(code) => BuilderValue::JavaScriptCode(code.to_string()),
            Value::Symbol(s) => BuilderValue::Symbol(s.to_string()),
            Value::JavaScriptCodeWithScope(scoped) => BuilderValue::JavaScriptCodeWithScope {
                code: scoped.code.to_string(),
                scope: DocumentBuilder::try_from(&scoped.scope)?,
            },
            Value::Int32(i) => BuilderValue::Int32(i),
            Value::Timestamp(ts) => BuilderValue::Timestamp(ts),
            Value::Int64(i) => BuilderValue::Int64(i),
            Value::MaxKey => BuilderValue::MaxKey,
            Value::MinKey => BuilderValue::MinKey,
        })
    }
}

impl TryFrom<&Document<'_>> for DocumentBuilder {
    type Error = Error;

    /// Decomposes a document into a builder whose children copy the
    /// document's elements.
    fn try_from(doc: &Document<'_>) -> Result<DocumentBuilder> {
        let mut builder = DocumentBuilder::new();
        for element in doc.iter() {
            builder = builder.append(element.name(), BuilderValue::try_from(&element)?);
        }
        Ok(builder)
    }
}

/// An incremental document constructor: a transient tree of named children,
/// flattened into wire bytes by [`build`](DocumentBuilder::build).
///
/// ```
/// use bsonpath::{ArrayBuilder, DocumentBuilder};
///
/// let doc = DocumentBuilder::new()
///     .append("hello", "world")
///     .append("nested", DocumentBuilder::new().append("n", 1))
///     .append("values", ArrayBuilder::new().push(1).push(2))
///     .build()?;
/// assert_eq!(doc.len(), 3);
/// # Ok::<(), bsonpath::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct DocumentBuilder {
    children: Vec<(String, BuilderValue)>,
}

impl DocumentBuilder {
    /// Creates an empty builder.
    pub fn new() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Appends a named child, which may be a scalar or a nested builder.
    pub fn append(mut self, key: impl Into<String>, value: impl Into<BuilderValue>) -> Self {
        self.children.push((key.into(), value.into()));
        self
    }

    /// Emits the document's wire bytes.
    ///
    /// Fails with `InvalidKey` if any key in the tree contains an interior
    /// NUL byte.
    pub fn build(&self) -> Result<Document<'static>> {
        let mut buf = Vec::new();
        self.emit_into(&mut buf)?;
        Document::from_vec(buf)
    }

    pub(crate) fn emit_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        buf.extend_from_slice(&[0; 4]);
        for (key, value) in &self.children {
            if key.as_bytes().contains(&0) {
                return Err(Error::invalid_key(format!(
                    "document key contains interior NUL: {key:?}"
                )));
            }
            buf.push(value.element_type() as u8);
            buf.extend_from_slice(key.as_bytes());
            buf.push(0);
            value.encode_payload(buf)?;
        }
        buf.push(0);
        let len = ((buf.len() - start) as i32).to_le_bytes();
        buf[start..start + 4].copy_from_slice(&len);
        Ok(())
    }
}

/// An incremental array constructor. Children are positional; the emitter
/// assigns the names `"0"`, `"1"`, … in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ArrayBuilder {
    children: Vec<BuilderValue>,
}

impl ArrayBuilder {
    /// Creates an empty builder.
    pub fn new() -> ArrayBuilder {
        ArrayBuilder::default()
    }

    /// Builds an array from existing elements, discarding their names and
    /// assigning fresh indices in iteration order.
    pub fn from_elements<'e>(
        elements: impl IntoIterator<Item = Element<'e>>,
    ) -> Result<ArrayBuilder> {
        let mut builder = ArrayBuilder::new();
        for element in elements {
            builder = builder.push(BuilderValue::try_from(&element)?);
        }
        Ok(builder)
    }

    /// Appends a positional child.
    pub fn push(mut self, value: impl Into<BuilderValue>) -> Self {
        self.children.push(value.into());
        self
    }

    /// Emits the array's wire bytes.
    pub fn build(&self) -> Result<Array<'static>> {
        let mut buf = Vec::new();
        self.emit_into(&mut buf)?;
        Array::from_vec(buf)
    }

    pub(crate) fn emit_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        buf.extend_from_slice(&[0; 4]);
        for (index, value) in self.children.iter().enumerate() {
            buf.push(value.element_type() as u8);
            buf.extend_from_slice(index.to_string().as_bytes());
            buf.push(0);
            value.encode_payload(buf)?;
        }
        buf.push(0);
        let len = ((buf.len() - start) as i32).to_le_bytes();
        buf[start..start + 4].copy_from_slice(&len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_builder() {
        let doc = DocumentBuilder::new().build().unwrap();
        assert_eq!(doc.as_bytes(), b"\x05\x00\x00\x00\x00");
    }

    #[test]
    fn string_element_bytes() {
        let doc = DocumentBuilder::new().append("hi", "y'all").build().unwrap();
        assert_eq!(
            doc.as_bytes(),
            b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00"
        );
    }

    #[test]
    fn nested_builders() {
        let i = 7;
        let doc = DocumentBuilder::new()
            .append(
                "foo",
                DocumentBuilder::new().append(
                    "bar",
                    DocumentBuilder::new().append(
                        "baz",
                        ArrayBuilder::new().push(i).push(2).push(3),
                    ),
                ),
            )
            .build()
            .unwrap();

        let foo = doc.find("foo").unwrap();
        assert_eq!(foo.element_type(), ElementType::EmbeddedDocument);
        let foo_doc = foo.as_document().unwrap();
        let bar = foo_doc.find("bar").unwrap();
        let bar_doc = bar.as_document().unwrap();
        let baz = bar_doc.find("baz").unwrap();
        let arr = baz.as_array().unwrap();

        let items: Vec<_> = arr.iter().collect();
        assert_eq!(items.len(), 3);
        for (index, expected) in [(0, 7), (1, 2), (2, 3)] {
            assert_eq!(items[index].name(), index.to_string());
            assert_eq!(items[index].as_i32().unwrap(), expected);
        }
    }

    #[test]
    fn interior_nul_key_fails() {
        let err = DocumentBuilder::new().append("a\0b", 1).build().unwrap_err();
        assert!(err.is_invalid_key());

        let err = DocumentBuilder::new()
            .append("outer", DocumentBuilder::new().append("a\0b", 1))
            .build()
            .unwrap_err();
        assert!(err.is_invalid_key());
    }

    #[test]
    fn scalar_coverage() {
        let oid = crate::ObjectId::from_bytes([9; 12]);
        let doc = DocumentBuilder::new()
            .append("f", 1.5)
            .append("b", true)
            .append("n", BuilderValue::Null)
            .append("i64", 1i64 << 40)
            .append("oid", oid)
            .append("bin", vec![1u8, 2, 3])
            .append("re", (".*", "i"))
            .append("ts", Timestamp { time: 1, increment: 2 })
            .build()
            .unwrap();

        assert_eq!(doc.find("f").unwrap().as_f64().unwrap(), 1.5);
        assert_eq!(doc.find("b").unwrap().as_bool().unwrap(), true);
        assert_eq!(
            doc.find("n").unwrap().element_type(),
            ElementType::Null
        );
        assert_eq!(doc.find("i64").unwrap().as_i64().unwrap(), 1i64 << 40);
        assert_eq!(doc.find("oid").unwrap().as_object_id().unwrap(), oid);
        let bin = doc.find("bin").unwrap();
        assert_eq!(bin.as_binary().unwrap().bytes, &[1, 2, 3]);
        let ts = doc.find("ts").unwrap().as_timestamp().unwrap();
        assert_eq!((ts.time, ts.increment), (1, 2));
    }

    #[test]
    fn array_from_existing_elements() {
        let source = DocumentBuilder::new()
            .append("x", 1)
            .append("y", "two")
            .build()
            .unwrap();
        let array = ArrayBuilder::from_elements(source.iter())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(array.get(0).unwrap().as_i32().unwrap(), 1);
        assert_eq!(array.get(1).unwrap().as_str().unwrap(), "two");
    }

    #[test]
    fn decompose_document_into_builder() {
        let doc = DocumentBuilder::new()
            .append("a", 1)
            .append("nested", DocumentBuilder::new().append("b", true))
            .build()
            .unwrap();
        let rebuilt = DocumentBuilder::try_from(&doc).unwrap().build().unwrap();
        assert_eq!(doc, rebuilt);
    }

    #[test]
    fn round_trip_built_bytes() {
        let doc = DocumentBuilder::new()
            .append("a", 1)
            .append("b", "two")
            .append("c", ArrayBuilder::new().push(true).push(3.5))
            .build()
            .unwrap();
        let reparsed = Document::from_vec(doc.as_bytes().to_vec()).unwrap();
        assert_eq!(doc, reparsed);
    }
}
