//! Raw NetCDF contents, copied out of libnetcdf.
//!
//! [`read`] opens an upload and copies the dimensions, attributes and
//! variables of its root group into an owned [`NcFile`]. Nothing is
//! interpreted here; fill values, packing and time axes are left to
//! [`crate::data::cf`].

mod read;

pub use read::{read, Format};

use netcdf::types::{NcTypeDescriptor, NcVariableType};
use netcdf::AttributeValue;

/// One `NC_CHAR` element.
///
/// libnetcdf keeps text apart from the byte types, so char variables are
/// read and written through this wrapper rather than `i8`/`u8`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NcChar(pub u8);

impl NcChar {
    /// Wrap raw text bytes for `put_values`.
    pub fn from_bytes(bytes: &[u8]) -> Vec<NcChar> {
        bytes.iter().copied().map(NcChar).collect()
    }
}

// SAFETY: `NcChar` is a transparent single byte, the in-memory layout of
// `NC_CHAR`.
unsafe impl NcTypeDescriptor for NcChar {
    fn type_descriptor() -> NcVariableType {
        NcVariableType::Char
    }
}

/// A homogeneous array of values of one external type.
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    Byte(Vec<i8>),
    Char(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    UByte(Vec<u8>),
    UShort(Vec<u16>),
    UInt(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    /// `NC_STRING` (NetCDF-4 only).
    Text(Vec<String>),
}

impl NcValues {
    #[cfg(test)]
    pub(crate) fn text(s: &str) -> Self {
        NcValues::Char(s.as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        match self {
            NcValues::Byte(v) => v.len(),
            NcValues::Char(v) | NcValues::UByte(v) => v.len(),
            NcValues::Short(v) => v.len(),
            NcValues::Int(v) => v.len(),
            NcValues::Float(v) => v.len(),
            NcValues::Double(v) => v.len(),
            NcValues::UShort(v) => v.len(),
            NcValues::UInt(v) => v.len(),
            NcValues::Int64(v) => v.len(),
            NcValues::UInt64(v) => v.len(),
            NcValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            NcValues::Char(_) | NcValues::Text(_) | NcValues::Float(_) | NcValues::Double(_)
        )
    }

    /// Element `i` widened to `f64`. Text has no numeric reading.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        Some(match self {
            NcValues::Byte(v) => *v.get(i)? as f64,
            NcValues::Char(_) | NcValues::Text(_) => return None,
            NcValues::UByte(v) => *v.get(i)? as f64,
            NcValues::Short(v) => *v.get(i)? as f64,
            NcValues::UShort(v) => *v.get(i)? as f64,
            NcValues::Int(v) => *v.get(i)? as f64,
            NcValues::UInt(v) => *v.get(i)? as f64,
            NcValues::Float(v) => *v.get(i)? as f64,
            NcValues::Double(v) => *v.get(i)?,
            NcValues::Int64(v) => *v.get(i)? as f64,
            NcValues::UInt64(v) => *v.get(i)? as f64,
        })
    }

    /// Element `i` as an integer, for the integral types only.
    /// `unsigned` reinterprets signed storage the way `_Unsigned = "true"` asks.
    pub fn get_i128(&self, i: usize, unsigned: bool) -> Option<i128> {
        Some(match self {
            NcValues::Byte(v) if unsigned => *v.get(i)? as u8 as i128,
            NcValues::Byte(v) => *v.get(i)? as i128,
            NcValues::UByte(v) => *v.get(i)? as i128,
            NcValues::Short(v) if unsigned => *v.get(i)? as u16 as i128,
            NcValues::Short(v) => *v.get(i)? as i128,
            NcValues::UShort(v) => *v.get(i)? as i128,
            NcValues::Int(v) if unsigned => *v.get(i)? as u32 as i128,
            NcValues::Int(v) => *v.get(i)? as i128,
            NcValues::UInt(v) => *v.get(i)? as i128,
            NcValues::Int64(v) if unsigned => *v.get(i)? as u64 as i128,
            NcValues::Int64(v) => *v.get(i)? as i128,
            NcValues::UInt64(v) => *v.get(i)? as i128,
            _ => return None,
        })
    }

    /// Char data as a string, trailing NULs trimmed; the first element of
    /// string data.
    pub fn as_text(&self) -> Option<String> {
        match self {
            NcValues::Char(bytes) => Some(char_bytes_to_string(bytes)),
            NcValues::Text(strings) => strings.first().cloned(),
            _ => None,
        }
    }
}

impl From<AttributeValue> for NcValues {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Uchar(v) => NcValues::UByte(vec![v]),
            AttributeValue::Uchars(v) => NcValues::UByte(v),
            AttributeValue::Schar(v) => NcValues::Byte(vec![v]),
            AttributeValue::Schars(v) => NcValues::Byte(v),
            AttributeValue::Ushort(v) => NcValues::UShort(vec![v]),
            AttributeValue::Ushorts(v) => NcValues::UShort(v),
            AttributeValue::Short(v) => NcValues::Short(vec![v]),
            AttributeValue::Shorts(v) => NcValues::Short(v),
            AttributeValue::Uint(v) => NcValues::UInt(vec![v]),
            AttributeValue::Uints(v) => NcValues::UInt(v),
            AttributeValue::Int(v) => NcValues::Int(vec![v]),
            AttributeValue::Ints(v) => NcValues::Int(v),
            AttributeValue::Ulonglong(v) => NcValues::UInt64(vec![v]),
            AttributeValue::Ulonglongs(v) => NcValues::UInt64(v),
            AttributeValue::Longlong(v) => NcValues::Int64(vec![v]),
            AttributeValue::Longlongs(v) => NcValues::Int64(v),
            AttributeValue::Float(v) => NcValues::Float(vec![v]),
            AttributeValue::Floats(v) => NcValues::Float(v),
            AttributeValue::Double(v) => NcValues::Double(vec![v]),
            AttributeValue::Doubles(v) => NcValues::Double(v),
            AttributeValue::Str(s) => NcValues::Char(s.into_bytes()),
            AttributeValue::Strs(v) => NcValues::Text(v),
        }
    }
}

/// Convert a fixed-width char field to a string: stop at the first NUL,
/// decode lossily so stray Latin-1 bytes do not fail the whole file.
pub(crate) fn char_bytes_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: NcValues,
}

impl Attribute {
    pub fn new(name: &str, value: NcValues) -> Self {
        Attribute {
            name: name.to_string(),
            value,
        }
    }
}

/// Look up an attribute by name.
pub fn find_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|a| a.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDimension {
    pub name: String,
    /// For an unlimited dimension this is the current record count.
    pub len: usize,
    pub unlimited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub name: String,
    /// Indices into [`NcFile::dimensions`].
    pub dimids: Vec<usize>,
    pub attributes: Vec<Attribute>,
    pub values: NcValues,
}

/// Everything stored in the root group of a file, undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct NcFile {
    pub format: Format,
    pub dimensions: Vec<RawDimension>,
    pub attributes: Vec<Attribute>,
    pub variables: Vec<RawVariable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values_keep_their_type() {
        assert_eq!(NcValues::from(AttributeValue::Short(-5)), NcValues::Short(vec![-5]));
        assert_eq!(
            NcValues::from(AttributeValue::Str("degC".into())).as_text().as_deref(),
            Some("degC")
        );
        let strings = NcValues::from(AttributeValue::Strs(vec!["a".into(), "b".into()]));
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.as_text().as_deref(), Some("a"));
        assert!(!strings.is_integer());
    }

    #[test]
    fn unsigned_reinterpretation() {
        let v = NcValues::Short(vec![1, -2]);
        assert_eq!(v.get_f64(1), Some(-2.0));
        assert_eq!(v.get_i128(1, false), Some(-2));
        assert_eq!(v.get_i128(1, true), Some(65534));
        assert_eq!(NcValues::Float(vec![1.0]).get_i128(0, true), None);
    }

    #[test]
    fn char_fields_stop_at_nul() {
        assert_eq!(NcValues::Char(b"abc\0\0".to_vec()).as_text().as_deref(), Some("abc"));
        assert_eq!(NcValues::Int(vec![1]).as_text(), None);
        assert_eq!(char_bytes_to_string(b"\xe9t\xe9"), "\u{fffd}t\u{fffd}");
    }
}
