use log::debug;

use super::model::{CellValue, Dataset, Row, Table, Variable};

/// Flatten a dataset into one row per coordinate combination.
///
/// Rows run over the Cartesian product of `ds.dimensions` with the first
/// dimension varying slowest. Each row is keyed by the coordinate values (or
/// the integer position when a dimension has no coordinate variable) and has
/// one cell per data variable. Variables spanning fewer dimensions repeat
/// across the ones they lack.
pub fn flatten(ds: &Dataset) -> Table {
    let index_names: Vec<String> = ds.dimensions.iter().map(|d| d.name.clone()).collect();
    let columns: Vec<String> = ds.variables.iter().map(|v| v.name.clone()).collect();

    if ds.is_empty() {
        return Table {
            index_names,
            columns,
            rows: Vec::new(),
        };
    }

    let shape: Vec<usize> = ds.dimensions.iter().map(|d| d.len).collect();
    let total = ds.row_count().unwrap_or(usize::MAX);

    let labels: Vec<Vec<CellValue>> = (0..shape.len())
        .map(|d| {
            let coord = ds.coordinate_for(d);
            (0..shape[d])
                .map(|i| {
                    coord
                        .and_then(|c| c.values.get(i).cloned())
                        .unwrap_or(CellValue::Integer(i as i64))
                })
                .collect()
        })
        .collect();
    let strides: Vec<Vec<usize>> = ds
        .variables
        .iter()
        .map(|v| strides_for(v, &shape))
        .collect();

    let mut rows = Vec::with_capacity(total.min(1 << 20));
    let mut idx = vec![0usize; shape.len()];
    for _ in 0..total {
        let key = idx
            .iter()
            .enumerate()
            .map(|(d, &i)| labels[d][i].clone())
            .collect();
        let cells = ds
            .variables
            .iter()
            .zip(&strides)
            .map(|(v, s)| {
                let offset: usize = idx.iter().zip(s).map(|(i, s)| i * s).sum();
                v.values.get(offset).cloned().unwrap_or(CellValue::Missing)
            })
            .collect();
        rows.push(Row { key, cells });

        // Odometer increment, last dimension fastest.
        for d in (0..idx.len()).rev() {
            idx[d] += 1;
            if idx[d] < shape[d] {
                break;
            }
            idx[d] = 0;
        }
    }

    debug!(
        "flattened {} dimensions into {} rows x {} columns",
        shape.len(),
        rows.len(),
        columns.len()
    );
    Table {
        index_names,
        columns,
        rows,
    }
}

/// Row-major strides of `v` expressed per dataset dimension; dimensions the
/// variable does not span get stride 0.
fn strides_for(v: &Variable, shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0usize; shape.len()];
    let mut step = 1usize;
    for &d in v.dims.iter().rev() {
        strides[d] = step;
        step = step.saturating_mul(shape[d]);
    }
    strides
}
