//! Ordered element containers backed by raw BSON bytes.

use std::borrow::Cow;

use crate::element::{element_size, validate_element, Element};
use crate::error::{Error, Result};

pub(crate) const MIN_DOCUMENT_SIZE: usize = 5;

/// Fully validates a BSON document: header, every element (nested documents
/// included), and the trailing terminator.
pub(crate) fn validate_document(bytes: &[u8]) -> Result<()> {
    if bytes.len() < MIN_DOCUMENT_SIZE {
        return Err(Error::invalid_document_size(format!(
            "document too short: {} bytes",
            bytes.len()
        )));
    }

    let length = crate::element::i32_from_slice(bytes).map_err(|_| {
        Error::invalid_document_size("document header missing its length prefix")
    })?;

    if bytes.len() as i64 != length as i64 {
        return Err(Error::invalid_document_size(format!(
            "declared length {} disagrees with actual length {}",
            length,
            bytes.len()
        )));
    }

    if bytes[bytes.len() - 1] != 0 {
        return Err(Error::invalid_document_size("document not null terminated"));
    }

    let mut offset = 4;
    while offset < bytes.len() - 1 {
        let window = &bytes[offset..bytes.len() - 1];
        let size = validate_element(window).map_err(|e| {
            match crate::element::element_key(window) {
                Some(key) if e.key.is_none() => e.with_key(key),
                _ => e,
            }
        })?;
        offset += size;
    }
    Ok(())
}

/// An ordered sequence of [`Element`]s sharing one backing buffer.
///
/// A document stores the full wire bytes of the document layout
/// (`int32 size | element* | 0x00`), either borrowed from a larger buffer or
/// heap-owned. All structural invariants are checked at construction, so
/// iteration is lazy and infallible; each yielded [`Element`] is a view into
/// the document's bytes.
///
/// ```
/// use bsonpath::Document;
///
/// let doc = Document::from_slice(b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00")?;
/// let element = doc.iter().next().unwrap();
/// assert_eq!(element.name(), "hi");
/// assert_eq!(element.as_str()?, "y'all");
/// # Ok::<(), bsonpath::Error>(())
/// ```
#[derive(Clone)]
pub struct Document<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> Document<'a> {
    /// Parses a document from borrowed bytes, validating the header, every
    /// element and the terminator.
    pub fn from_slice(bytes: &'a [u8]) -> Result<Document<'a>> {
        validate_document(bytes)?;
        Ok(Document {
            data: Cow::Borrowed(bytes),
        })
    }

    /// Parses a document from an owned buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Document<'static>> {
        validate_document(&bytes)?;
        Ok(Document {
            data: Cow::Owned(bytes),
        })
    }

    /// The empty document, `{}`.
    pub fn empty() -> Document<'static> {
        Document {
            data: Cow::Owned(vec![5, 0, 0, 0, 0]),
        }
    }

    /// The document's full wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the document and returns its bytes, copying only if still
    /// borrowed.
    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_owned()
    }

    /// Converts into a detached document, copying only if still borrowed.
    pub fn into_owned(self) -> Document<'static> {
        Document {
            data: Cow::Owned(self.data.into_owned()),
        }
    }

    /// Gets a lazy iterator over the elements in the document.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.as_bytes())
    }

    /// The number of elements in the document. This is an O(N) scan.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the document contains no elements.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().len() == MIN_DOCUMENT_SIZE
    }

    /// Finds the first element with the given name by linear scan.
    ///
    /// A missing name yields `None`, not an error.
    pub fn find(&self, name: &str) -> Option<Element<'_>> {
        self.iter().find(|e| e.name() == name)
    }
}

impl PartialEq for Document<'_> {
    /// Documents compare element-wise by name and payload, order-sensitive,
    /// which is equivalent to comparing the wire bytes.
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}

impl std::fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = crate::json::to_json_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

impl<'a, 's> IntoIterator for &'s Document<'a> {
    type IntoIter = Iter<'s>;
    type Item = Element<'s>;

    fn into_iter(self) -> Iter<'s> {
        self.iter()
    }
}

/// A document whose element names are the decimal indices `"0"`, `"1"`, ….
///
/// Arrays share the document wire layout. The library does not renumber
/// names on write; [`ArrayBuilder`](crate::ArrayBuilder) assigns them.
#[derive(Clone, PartialEq)]
pub struct Array<'a> {
    doc: Document<'a>,
}

impl<'a> Array<'a> {
    /// Parses an array document from borrowed bytes.
    pub fn from_slice(bytes: &'a [u8]) -> Result<Array<'a>> {
        Ok(Array {
            doc: Document::from_slice(bytes)?,
        })
    }

    /// Parses an array document from an owned buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Array<'static>> {
        Ok(Array {
            doc: Document::from_vec(bytes)?,
        })
    }

    /// The empty array, `[]`.
    pub fn empty() -> Array<'static> {
        Array {
            doc: Document::empty(),
        }
    }

    pub(crate) fn from_document(doc: Document<'a>) -> Array<'a> {
        Array { doc }
    }

    /// Views the array as the document it is laid out as.
    pub fn as_document(&self) -> &Document<'a> {
        &self.doc
    }

    /// Converts into the underlying document.
    pub fn into_document(self) -> Document<'a> {
        self.doc
    }

    /// The array's full wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.doc.as_bytes()
    }

    /// Gets a lazy iterator over the elements in the array.
    pub fn iter(&self) -> Iter<'_> {
        self.doc.iter()
    }

    /// The number of elements in the array. This is an O(N) scan.
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    /// Whether the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Finds the element named by the decimal rendering of `index`.
    pub fn get(&self, index: usize) -> Option<Element<'_>> {
        self.doc.find(&index.to_string())
    }
}

impl std::fmt::Debug for Array<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Array")
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}

impl<'a, 's> IntoIterator for &'s Array<'a> {
    type IntoIter = Iter<'s>;
    type Item = Element<'s>;

    fn into_iter(self) -> Iter<'s> {
        self.iter()
    }
}

/// A lazy iterator over a validated document's elements.
pub struct Iter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iter<'a> {
    /// `data` must be full document bytes that passed [`validate_document`].
    pub(crate) fn new(data: &'a [u8]) -> Iter<'a> {
        Iter { data, offset: 4 }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if self.offset >= self.data.len().saturating_sub(1) {
            return None;
        }
        // the document was validated at construction, so the size
        // computation cannot fail and the window is exact
        let size = element_size(&self.data[self.offset..self.data.len() - 1])
            .expect("document bytes validated at construction");
        let element =
            Element::from_validated(&self.data[self.offset..self.offset + size]);
        self.offset += size;
        Some(element)
    }
}
