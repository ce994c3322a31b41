//! CF-convention decoding of raw file contents: character arrays, fill
//! values, packed integers and time axes.
//!
//! libnetcdf hands back values exactly as stored, so all of this happens
//! here over the owned copy.

use chrono::TimeDelta;
use log::{debug, warn};

use super::container::{
    char_bytes_to_string, find_attribute, Attribute, NcFile, NcValues, RawDimension, RawVariable,
};
use super::model::{CellValue, Dataset, Dimension, Variable};
use super::time_units::parse_time_units;

/// Decode every variable and order the dimensions the way they are first
/// referenced. Variables named after their only dimension become coordinates.
pub fn decode(file: NcFile) -> Dataset {
    let mut decoded = Vec::with_capacity(file.variables.len());
    for raw in file.variables {
        decoded.push(decode_variable(raw, &file.dimensions));
    }

    // Dimension ids in order of first use; dimensions nobody uses are dropped.
    let mut order: Vec<usize> = Vec::new();
    for v in &decoded {
        for &d in &v.dims {
            if !order.contains(&d) {
                order.push(d);
            }
        }
    }
    let dimensions: Vec<Dimension> = order
        .iter()
        .map(|&d| {
            let raw = &file.dimensions[d];
            Dimension {
                name: raw.name.clone(),
                len: raw.len,
                unlimited: raw.unlimited,
            }
        })
        .collect();

    let mut coordinates = Vec::new();
    let mut variables = Vec::new();
    for mut v in decoded {
        for d in v.dims.iter_mut() {
            // `order` contains every id used above.
            *d = order.iter().position(|o| o == d).unwrap_or_default();
        }
        let is_coordinate = matches!(v.dims.as_slice(), [d] if dimensions[*d].name == v.name);
        if is_coordinate {
            coordinates.push(v);
        } else {
            variables.push(v);
        }
    }

    Dataset {
        dimensions,
        coordinates,
        variables,
        attributes: file.attributes,
    }
}

fn decode_variable(raw: RawVariable, dims: &[RawDimension]) -> Variable {
    let RawVariable {
        name,
        mut dimids,
        attributes,
        values,
    } = raw;

    let cells = if let NcValues::Char(bytes) = &values {
        // The last dimension is the string length.
        let width = dimids.pop().map(|d| dims[d].len);
        let count = dimids.iter().map(|&d| dims[d].len).product();
        decode_chars(bytes, width, count)
    } else if let NcValues::Text(strings) = &values {
        strings.iter().cloned().map(CellValue::Text).collect()
    } else {
        let mut cells = decode_numbers(&name, &values, &attributes);
        if let Some(times) = decode_times(&name, &cells, &attributes) {
            cells = times;
        }
        cells
    };

    Variable {
        name,
        dims: dimids,
        attributes,
        values: cells,
    }
}

fn decode_chars(bytes: &[u8], width: Option<usize>, count: usize) -> Vec<CellValue> {
    let to_text = |chunk: &[u8]| CellValue::Text(char_bytes_to_string(chunk));
    match width {
        None => vec![to_text(bytes)],
        Some(0) => vec![CellValue::Text(String::new()); count],
        Some(w) => bytes.chunks(w).map(to_text).collect(),
    }
}

/// A fill or missing value, compared in the storage domain.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Sentinel {
    Int(i128),
    Float(f64),
}

impl Sentinel {
    fn matches_int(self, v: i128) -> bool {
        match self {
            Sentinel::Int(s) => s == v,
            Sentinel::Float(s) => s == v as f64,
        }
    }

    fn matches_float(self, v: f64) -> bool {
        match self {
            Sentinel::Int(s) => s as f64 == v,
            Sentinel::Float(s) => s == v,
        }
    }
}

fn attr_f64(attrs: &[Attribute], name: &str) -> Option<f64> {
    find_attribute(attrs, name).and_then(|a| a.value.get_f64(0))
}

fn attr_text(attrs: &[Attribute], name: &str) -> Option<String> {
    find_attribute(attrs, name).and_then(|a| a.value.as_text())
}

fn sentinels(attrs: &[Attribute], unsigned: bool) -> Vec<Sentinel> {
    let mut out = Vec::new();
    for key in ["_FillValue", "missing_value"] {
        let Some(attr) = find_attribute(attrs, key) else {
            continue;
        };
        for i in 0..attr.value.len() {
            if let Some(v) = attr.value.get_i128(i, unsigned) {
                out.push(Sentinel::Int(v));
            } else if let Some(v) = attr.value.get_f64(i) {
                out.push(Sentinel::Float(v));
            }
        }
    }
    out
}

fn decode_numbers(name: &str, values: &NcValues, attrs: &[Attribute]) -> Vec<CellValue> {
    let integral = values.is_integer();
    let unsigned = integral
        && attr_text(attrs, "_Unsigned").is_some_and(|s| s.eq_ignore_ascii_case("true"));
    let fills = sentinels(attrs, unsigned);
    let scale = attr_f64(attrs, "scale_factor");
    let offset = attr_f64(attrs, "add_offset");
    let packed = scale.is_some() || offset.is_some();
    let unpack = |v: f64| CellValue::float(v * scale.unwrap_or(1.0) + offset.unwrap_or(0.0));

    if packed || !fills.is_empty() || unsigned {
        debug!("{name}: {} fill values, packed={packed}, unsigned={unsigned}", fills.len());
    }

    (0..values.len())
        .map(|i| {
            if integral {
                let Some(v) = values.get_i128(i, unsigned) else {
                    return CellValue::Missing;
                };
                if fills.iter().any(|s| s.matches_int(v)) {
                    CellValue::Missing
                } else if packed {
                    unpack(v as f64)
                } else {
                    i64::try_from(v)
                        .map(CellValue::Integer)
                        .unwrap_or(CellValue::Float(v as f64))
                }
            } else {
                let Some(v) = values.get_f64(i) else {
                    return CellValue::Missing;
                };
                if v.is_nan() || fills.iter().any(|s| s.matches_float(v)) {
                    CellValue::Missing
                } else if packed {
                    unpack(v)
                } else {
                    CellValue::Float(v)
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Time axes
// ---------------------------------------------------------------------------

const DECODABLE_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Convert numeric cells to date-times when the variable carries CF time
/// units in a supported calendar. Returns `None` to keep the values numeric.
fn decode_times(name: &str, cells: &[CellValue], attrs: &[Attribute]) -> Option<Vec<CellValue>> {
    let units = attr_text(attrs, "units")?;
    if !units.to_ascii_lowercase().contains(" since ") {
        return None;
    }
    let calendar = attr_text(attrs, "calendar").map(|c| c.trim().to_ascii_lowercase());
    if let Some(cal) = &calendar {
        if !DECODABLE_CALENDARS.contains(&cal.as_str()) {
            debug!("{name}: calendar '{cal}' left numeric");
            return None;
        }
    }
    let Some((micros, reference)) = parse_time_units(&units) else {
        warn!("{name}: could not decode time units '{units}', keeping numbers");
        return None;
    };

    let shift = |v: &CellValue| -> Option<CellValue> {
        let delta = match v {
            CellValue::Integer(i) => i.checked_mul(micros)?,
            CellValue::Float(f) => {
                let us = (f * micros as f64).round();
                if !us.is_finite() || us.abs() >= i64::MAX as f64 {
                    return None;
                }
                us as i64
            }
            CellValue::Missing => return Some(CellValue::Missing),
            _ => return None,
        };
        reference
            .checked_add_signed(TimeDelta::microseconds(delta))
            .map(CellValue::DateTime)
    };

    let decoded: Option<Vec<CellValue>> = cells.iter().map(shift).collect();
    if decoded.is_none() {
        warn!("{name}: time values out of range for '{units}', keeping numbers");
    }
    decoded
}
