//! BSON, short for Binary JSON, is a binary-encoded serialization of
//! JSON-like documents: an ordered sequence of named, typed elements with a
//! length-prefixed wire layout.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! This crate provides a byte-backed, zero-copy document model over that
//! layout, incremental document construction, conversion to and from JSON
//! text, and querying by JSONPath expressions. For the format itself, see
//! [bsonspec.org](http://bsonspec.org).
//!
//! ## Documents and elements
//!
//! [`Document`] validates BSON bytes fully at construction and then hands
//! out lazy, infallible views: iterating yields [`Element`]s that borrow
//! the document's buffer without copying.
//!
//! ```rust
//! use bsonpath::Document;
//!
//! let doc = Document::from_slice(b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00")?;
//! let element = doc.find("hello").unwrap();
//! assert_eq!(element.as_str()?, "world");
//! # Ok::<(), bsonpath::Error>(())
//! ```
//!
//! Detached elements and documents are built with [`Element::new`],
//! [`DocumentBuilder`] and [`ArrayBuilder`]:
//!
//! ```rust
//! use bsonpath::{ArrayBuilder, DocumentBuilder};
//!
//! let doc = DocumentBuilder::new()
//!     .append("name", "Herman Melville")
//!     .append("titles", ArrayBuilder::new().push("Moby-Dick").push("Typee"))
//!     .build()?;
//! assert_eq!(doc.len(), 2);
//! # Ok::<(), bsonpath::Error>(())
//! ```
//!
//! ## JSON
//!
//! [`read_json`] accepts strict RFC 8259 text in UTF-8, UTF-16 or UTF-32
//! and materializes a document; [`write_json`] and [`to_json_string`]
//! render a document back to minified JSON, encoding BSON-only types in the
//! MongoDB Extended JSON v1 convention.
//!
//! ## JSONPath
//!
//! [`path_select`] queries a document with a JSONPath expression, including
//! filter subscripts evaluated by a small expression engine:
//!
//! ```rust
//! use bsonpath::{path_select, read_json};
//!
//! let doc = read_json(br#"{"items": [{"n": 1}, {"n": 2}, {"n": 3}]}"#)?;
//! let matches = path_select(&doc, "$.items[?(@.n > 1)].n")?;
//! assert_eq!(matches.len(), 2);
//! # Ok::<(), bsonpath::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/bsonpath/0.1.0")]

mod builder;
mod document;
mod element;
pub mod error;
mod json;
pub mod oid;
mod path;
pub mod spec;

#[doc(inline)]
pub use self::{
    builder::{ArrayBuilder, BuilderValue, DocumentBuilder},
    document::{Array, Document, Iter},
    element::{
        Binary, DbPointer, Element, FromElement, JavaScriptCodeWithScope, Regex, Timestamp, Value,
    },
    error::{Error, ErrorKind, JsonErrorKind, Result},
    json::{read_json, to_json_string, write_json},
    oid::ObjectId,
    path::path_select,
    spec::{BinarySubtype, ElementType},
};
