//! Conversion between JSON text and BSON documents.
//!
//! The reader accepts strict RFC 8259 JSON in UTF-8, UTF-16 or UTF-32 and
//! materializes a BSON [`Document`](crate::Document); the writer renders a
//! document back to minified UTF-8 JSON, encoding the types JSON cannot
//! express natively in the MongoDB Extended JSON v1 convention.

mod reader;
mod writer;

pub use self::reader::read_json;
pub use self::writer::{to_json_string, write_json};
