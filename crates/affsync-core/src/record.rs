//! Record model shared by the fetch, flatten, and upload stages.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};

/// One product row: field name to JSON value, in insertion order.
pub type Record = Map<String, Value>;

/// Shape of a single field value, resolved once before upload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String, number, or boolean passed through unchanged.
    Scalar(Value),
    /// Missing or explicitly null cell.
    Null,
    /// Non-numeric list.
    List(Vec<Value>),
    /// Nested object, such as an unexpanded API sub-structure.
    Mapping(Map<String, Value>),
    /// Non-empty list whose elements are all numbers or nulls.
    NumericArray(Vec<Value>),
}

impl FieldValue {
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Array(items)
                if !items.is_empty() && items.iter().all(|v| v.is_number() || v.is_null()) =>
            {
                Self::NumericArray(items)
            }
            Value::Array(items) => Self::List(items),
            Value::Object(map) => Self::Mapping(map),
            other => Self::Scalar(other),
        }
    }

    /// Converts into a value the table accepts: scalars, nulls, or JSON text.
    ///
    /// A numeric array with no non-null element collapses to null. JSON text
    /// uses `", "` / `": "` separators and `\uXXXX` escapes for non-ASCII, the
    /// format rows already stored in the table were written with.
    #[must_use]
    pub fn into_upload_value(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::Null => Value::Null,
            Self::List(items) => Value::String(json_text(&Value::Array(items))),
            Self::Mapping(map) => Value::String(json_text(&Value::Object(map))),
            Self::NumericArray(items) => {
                if items.iter().all(Value::is_null) {
                    Value::Null
                } else {
                    Value::String(json_text(&Value::Array(items)))
                }
            }
        }
    }
}

/// Spaced separators, ASCII-only output.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                let mut buf = [0u8; 1];
                writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

fn json_text(value: &Value) -> String {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}
