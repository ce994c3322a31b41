use log::debug;

use super::model::Table;

/// Remove rows whose every cell is missing when `enabled`; otherwise return
/// the table untouched.
///
/// Row labels are not considered, so a table without columns loses every
/// row. Remaining rows keep their order.
pub fn drop_empty_rows(mut table: Table, enabled: bool) -> Table {
    if !enabled {
        return table;
    }
    let before = table.len();
    table
        .rows
        .retain(|row| !row.cells.iter().all(|c| c.is_missing()));
    debug!("dropped {} of {before} all-missing rows", before - table.len());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Row};
    use proptest::prelude::*;

    fn row(i: i64, cells: Vec<CellValue>) -> Row {
        Row {
            key: vec![CellValue::Integer(i)],
            cells,
        }
    }

    fn table(rows: Vec<Row>) -> Table {
        Table {
            index_names: vec!["i".into()],
            columns: vec!["a".into(), "b".into()],
            rows,
        }
    }

    #[test]
    fn keeps_partially_filled_rows_in_order() {
        let t = table(vec![
            row(0, vec![CellValue::Missing, CellValue::Missing]),
            row(1, vec![CellValue::Float(1.0), CellValue::Missing]),
            row(2, vec![CellValue::Missing, CellValue::Missing]),
            row(3, vec![CellValue::Missing, CellValue::Text(String::new())]),
        ]);
        let out = drop_empty_rows(t, true);
        let keys: Vec<_> = out.rows.iter().map(|r| r.key[0].clone()).collect();
        assert_eq!(keys, vec![CellValue::Integer(1), CellValue::Integer(3)]);
    }

    #[test]
    fn disabled_is_identity() {
        let t = table(vec![row(0, vec![CellValue::Missing, CellValue::Missing])]);
        assert_eq!(drop_empty_rows(t.clone(), false), t);
    }

    #[test]
    fn no_columns_drops_everything() {
        let t = Table {
            index_names: vec!["i".into()],
            columns: Vec::new(),
            rows: vec![row(0, Vec::new())],
        };
        assert!(drop_empty_rows(t, true).is_empty());
    }

    fn cell() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Missing),
            any::<i64>().prop_map(CellValue::Integer),
        ]
    }

    proptest! {
        #[test]
        fn filtering_is_idempotent(cells in proptest::collection::vec((cell(), cell()), 0..40)) {
            let rows = cells
                .into_iter()
                .enumerate()
                .map(|(i, (a, b))| row(i as i64, vec![a, b]))
                .collect();
            let once = drop_empty_rows(table(rows), true);
            let twice = drop_empty_rows(once.clone(), true);
            prop_assert_eq!(once, twice);
        }
    }
}
