use std::io::Write;

use log::{debug, warn};
use netcdf::types::{FloatType, IntType, NcVariableType};

use super::{Attribute, NcChar, NcFile, NcValues, RawDimension, RawVariable};
use crate::error::DecodeError;

const HDF5_SIGNATURE: &[u8] = b"\x89HDF\r\n\x1a\n";

/// On-disk flavour, taken from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// CDF-1: 32-bit offsets.
    Classic,
    /// CDF-2: 64-bit offsets.
    Offset64,
    /// CDF-5: 64-bit sizes and the unsigned/64-bit integer types.
    Data64,
    /// HDF5 based NetCDF-4.
    Netcdf4,
}

impl Format {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'C', b'D', b'F', 1, ..] => Some(Format::Classic),
            [b'C', b'D', b'F', 2, ..] => Some(Format::Offset64),
            [b'C', b'D', b'F', 5, ..] => Some(Format::Data64),
            _ if bytes.starts_with(HDF5_SIGNATURE) => Some(Format::Netcdf4),
            _ => None,
        }
    }
}

/// Open an uploaded file and copy out its root group.
pub fn read(bytes: &[u8]) -> Result<NcFile, DecodeError> {
    let format = Format::sniff(bytes).ok_or(DecodeError::NotNetcdf)?;

    // `netcdf::open_mem` only exists when libnetcdf was built with mmap
    // support, so the buffer goes through a temporary file instead.
    let mut spill = tempfile::Builder::new()
        .prefix("nc2xlsx-")
        .suffix(".nc")
        .tempfile()?;
    spill.write_all(bytes)?;
    spill.flush()?;

    let file = netcdf::open(spill.path())?;
    let contents = read_root(&file, format)?;
    debug!(
        "read {format:?} file: {} dimensions, {} variables",
        contents.dimensions.len(),
        contents.variables.len()
    );
    Ok(contents)
}

fn read_root(file: &netcdf::File, format: Format) -> Result<NcFile, DecodeError> {
    if let Ok(groups) = file.groups() {
        let nested: Vec<String> = groups.map(|g| g.name()).collect();
        if !nested.is_empty() {
            warn!("only the root group is converted, skipping groups {nested:?}");
        }
    }

    let dimensions: Vec<RawDimension> = file
        .dimensions()
        .map(|d| RawDimension {
            name: d.name(),
            len: d.len(),
            unlimited: d.is_unlimited(),
        })
        .collect();
    let attributes = read_attributes(file.attributes(), "global");

    let mut variables = Vec::new();
    for var in file.variables() {
        variables.push(read_variable(&var, &dimensions)?);
    }

    Ok(NcFile {
        format,
        dimensions,
        attributes,
        variables,
    })
}

fn read_variable(
    var: &netcdf::Variable,
    dimensions: &[RawDimension],
) -> Result<RawVariable, DecodeError> {
    let name = var.name();
    let mut dimids = Vec::with_capacity(var.dimensions().len());
    for dim in var.dimensions() {
        let dim_name = dim.name();
        let id = dimensions
            .iter()
            .position(|d| d.name == dim_name)
            .ok_or_else(|| {
                DecodeError::Unsupported(format!(
                    "variable '{name}' uses dimension '{dim_name}' from another group"
                ))
            })?;
        dimids.push(id);
    }

    Ok(RawVariable {
        values: read_values(var, &name)?,
        attributes: read_attributes(var.attributes(), &name),
        dimids,
        name,
    })
}

fn read_values(var: &netcdf::Variable, name: &str) -> Result<NcValues, DecodeError> {
    Ok(match var.vartype() {
        NcVariableType::Int(IntType::I8) => NcValues::Byte(var.get_values(..)?),
        NcVariableType::Int(IntType::U8) => NcValues::UByte(var.get_values(..)?),
        NcVariableType::Int(IntType::I16) => NcValues::Short(var.get_values(..)?),
        NcVariableType::Int(IntType::U16) => NcValues::UShort(var.get_values(..)?),
        NcVariableType::Int(IntType::I32) => NcValues::Int(var.get_values(..)?),
        NcVariableType::Int(IntType::U32) => NcValues::UInt(var.get_values(..)?),
        NcVariableType::Int(IntType::I64) => NcValues::Int64(var.get_values(..)?),
        NcVariableType::Int(IntType::U64) => NcValues::UInt64(var.get_values(..)?),
        NcVariableType::Float(FloatType::F32) => NcValues::Float(var.get_values(..)?),
        NcVariableType::Float(FloatType::F64) => NcValues::Double(var.get_values(..)?),
        NcVariableType::Char => {
            let chars: Vec<NcChar> = var.get_values(..)?;
            NcValues::Char(chars.into_iter().map(|c| c.0).collect())
        }
        NcVariableType::String => NcValues::Text(read_strings(var)?),
        other => {
            return Err(DecodeError::Unsupported(format!(
                "variable '{name}' has user-defined type {other:?}"
            )))
        }
    })
}

/// `NC_STRING` elements are fetched one index at a time, row-major.
fn read_strings(var: &netcdf::Variable) -> Result<Vec<String>, DecodeError> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let count = var.len();
    let mut index = vec![0usize; shape.len()];
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(var.get_string(index.as_slice())?);
        for d in (0..index.len()).rev() {
            index[d] += 1;
            if index[d] < shape[d] {
                break;
            }
            index[d] = 0;
        }
    }
    Ok(out)
}

fn read_attributes<'f>(
    attrs: impl Iterator<Item = netcdf::Attribute<'f>>,
    owner: &str,
) -> Vec<Attribute> {
    attrs
        .filter_map(|attr| match attr.value() {
            Ok(value) => Some(Attribute::new(attr.name(), value.into())),
            Err(e) => {
                warn!("{owner}: skipping attribute '{}': {e}", attr.name());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use netcdf::Options;

    use super::*;

    fn bytes_of(path: &Path) -> Vec<u8> {
        std::fs::read(path).unwrap()
    }

    #[test]
    fn signatures_pick_the_format() {
        assert_eq!(Format::sniff(b"CDF\x01rest"), Some(Format::Classic));
        assert_eq!(Format::sniff(b"CDF\x02"), Some(Format::Offset64));
        assert_eq!(Format::sniff(b"CDF\x05"), Some(Format::Data64));
        assert_eq!(Format::sniff(b"\x89HDF\r\n\x1a\nrest"), Some(Format::Netcdf4));
        assert_eq!(Format::sniff(b"CDF\x03"), None);
        assert_eq!(Format::sniff(b"PK\x03\x04"), None);
        assert_eq!(Format::sniff(b""), None);
    }

    #[test]
    fn garbage_is_not_netcdf() {
        assert!(matches!(read(b"hello world"), Err(DecodeError::NotNetcdf)));
    }

    #[test]
    fn truncated_classic_file_is_a_library_error() {
        assert!(matches!(read(b"CDF\x01\x00\x00"), Err(DecodeError::Netcdf(_))));
    }

    #[test]
    fn classic_root_group_is_copied() {
        let d = tempfile::tempdir().unwrap();
        let path = d.path().join("classic.nc");
        {
            // Classic files take definitions first, then data.
            let mut file = netcdf::create_with(&path, Options::CLASSIC).unwrap();
            file.add_unlimited_dimension("time").unwrap();
            file.add_dimension("x", 3).unwrap();
            file.add_dimension("len", 2).unwrap();
            file.add_attribute("title", "test").unwrap();
            file.add_variable::<f64>("time", &["time"])
                .unwrap()
                .put_attribute("units", "days since 2000-01-01")
                .unwrap();
            file.add_variable::<i16>("v", &["time", "x"])
                .unwrap()
                .put_attribute("_FillValue", -1i16)
                .unwrap();
            file.add_variable::<NcChar>("code", &["x", "len"]).unwrap();
            file.enddef().unwrap();

            let mut t = file.variable_mut("time").unwrap();
            t.put_values(&[0.0, 1.0], ..).unwrap();
            let mut v = file.variable_mut("v").unwrap();
            v.put_values(&[1i16, 2, 3, 4, 5, 6], (0..2, ..)).unwrap();
            let mut c = file.variable_mut("code").unwrap();
            c.put_values(&NcChar::from_bytes(b"aabbc\0"), ..).unwrap();
        }

        let nc = read(&bytes_of(&path)).unwrap();
        assert_eq!(nc.format, Format::Classic);
        let dims: Vec<(&str, usize, bool)> = nc
            .dimensions
            .iter()
            .map(|d| (d.name.as_str(), d.len, d.unlimited))
            .collect();
        assert_eq!(dims, vec![("time", 2, true), ("x", 3, false), ("len", 2, false)]);
        assert_eq!(nc.attributes, vec![Attribute::new("title", NcValues::text("test"))]);

        assert_eq!(nc.variables[0].values, NcValues::Double(vec![0.0, 1.0]));
        assert_eq!(nc.variables[1].dimids, vec![0, 1]);
        assert_eq!(nc.variables[1].values, NcValues::Short(vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(
            nc.variables[1].attributes,
            vec![Attribute::new("_FillValue", NcValues::Short(vec![-1]))]
        );
        assert_eq!(nc.variables[2].values, NcValues::Char(b"aabbc\0".to_vec()));
    }

    #[test]
    fn netcdf4_strings_and_unsigned_types() {
        let d = tempfile::tempdir().unwrap();
        let path = d.path().join("nc4.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("station", 2).unwrap();
            let mut name = file
                .add_variable_with_type("name", &["station"], &NcVariableType::String)
                .unwrap();
            name.put_string("north", [0]).unwrap();
            name.put_string("south", [1]).unwrap();
            let mut count = file.add_variable::<u32>("count", &["station"]).unwrap();
            count.put_values(&[7u32, 4_000_000_000], ..).unwrap();
            file.add_group("extra").unwrap();
        }

        let nc = read(&bytes_of(&path)).unwrap();
        assert_eq!(nc.format, Format::Netcdf4);
        assert_eq!(
            nc.variables[0].values,
            NcValues::Text(vec!["north".into(), "south".into()])
        );
        assert_eq!(nc.variables[1].values, NcValues::UInt(vec![7, 4_000_000_000]));
    }
}
