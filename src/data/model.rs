use std::fmt;

use chrono::NaiveDateTime;

use super::container::Attribute;

// ---------------------------------------------------------------------------
// CellValue – a single decoded value
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a decoded NetCDF variable
/// can take once fill values, packing and time axes are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    /// The missing-value sentinel ("no data at this coordinate").
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Floats that are NaN carry no data and collapse to `Missing`.
    pub fn float(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Missing
        } else {
            CellValue::Float(v)
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Missing => write!(f, "NaN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the decoded labelled arrays of one file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
    pub unlimited: bool,
}

/// A decoded variable. `dims` index into [`Dataset::dimensions`] and
/// `values` are laid out row-major over them.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dims: Vec<usize>,
    pub attributes: Vec<Attribute>,
    pub values: Vec<CellValue>,
}

/// One file's labelled multi-dimensional data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Axes in declared order (outermost first).
    pub dimensions: Vec<Dimension>,
    /// Coordinate variables: one-dimensional, named after their dimension.
    pub coordinates: Vec<Variable>,
    /// Data variables, in file order. These become the table columns.
    pub variables: Vec<Variable>,
    /// Global attributes.
    pub attributes: Vec<Attribute>,
}

impl Dataset {
    /// Coordinate variable labelling dimension `dim`, if the file has one.
    pub fn coordinate_for(&self, dim: usize) -> Option<&Variable> {
        self.coordinates.iter().find(|c| c.dims == [dim])
    }

    /// Number of rows [`flatten`](super::flatten::flatten) will produce, or
    /// `None` when the product of the dimension lengths overflows.
    pub fn row_count(&self) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        self.dimensions
            .iter()
            .try_fold(1usize, |rows, d| rows.checked_mul(d.len))
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.variables.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Table – the flattened two-dimensional view
// ---------------------------------------------------------------------------

/// One table row: the coordinate tuple labelling it plus one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Vec<CellValue>,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Names of the row-label levels (one per dimension).
    pub index_names: Vec<String>,
    /// Column names (one per data variable).
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total width including the row-label columns.
    pub fn width(&self) -> usize {
        self.index_names.len() + self.columns.len()
    }

    /// Copy of the first `n` rows, used for previews.
    pub fn head(&self, n: usize) -> Table {
        Table {
            index_names: self.index_names.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_floats_are_missing() {
        assert_eq!(CellValue::float(f64::NAN), CellValue::Missing);
        assert_eq!(CellValue::float(1.5), CellValue::Float(1.5));
    }

    #[test]
    fn head_keeps_labels_and_truncates() {
        let table = Table {
            index_names: vec!["x".into()],
            columns: vec!["v".into()],
            rows: (0..5)
                .map(|i| Row {
                    key: vec![CellValue::Integer(i)],
                    cells: vec![CellValue::Float(i as f64)],
                })
                .collect(),
        };
        let head = table.head(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.columns, table.columns);
        assert_eq!(head.rows[1].key, vec![CellValue::Integer(1)]);
        assert_eq!(table.head(10).len(), 5);
    }

    #[test]
    fn row_count_is_product_of_dimensions() {
        let ds = Dataset {
            dimensions: vec![
                Dimension { name: "a".into(), len: 3, unlimited: false },
                Dimension { name: "b".into(), len: 4, unlimited: false },
            ],
            ..Default::default()
        };
        assert_eq!(ds.row_count(), Some(12));
        assert_eq!(Dataset::default().row_count(), Some(0));

        let huge = Dataset {
            dimensions: vec![
                Dimension { name: "a".into(), len: usize::MAX / 2, unlimited: false },
                Dimension { name: "b".into(), len: 3, unlimited: false },
            ],
            ..Default::default()
        };
        assert_eq!(huge.row_count(), None);
    }
}
