use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use nc2xlsx::data::model::Table;

use crate::state::{AppState, BatchStatus};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// Central panel – previews and results
// ---------------------------------------------------------------------------

/// Render the outcome banner and the per-file previews.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("NetCDF to Excel Converter");
    ui.separator();

    match &state.status {
        BatchStatus::Idle if state.files.is_empty() => {
            ui.label("Upload NetCDF files to begin  (File → Add NetCDF files…)");
        }
        BatchStatus::Failed(msg) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        _ => {}
    }

    if state.download_link().is_some() {
        ui.label(
            RichText::new("Conversion completed! Save the ZIP file or copy its download link.")
                .color(Color32::DARK_GREEN),
        );
        ui.horizontal(|ui: &mut Ui| {
            if ui.button("Save ZIP…").clicked() {
                panels::save_archive_dialog(state);
            }
            if ui.button("Copy download link").clicked() {
                if let Some(link) = state.download_link() {
                    ui.ctx().copy_text(link.data_uri());
                }
            }
        });
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // Uploads may share a name, so previews are keyed by position.
            for (i, (file_name, table)) in state.previews.iter().enumerate() {
                ui.add_space(8.0);
                ui.strong(file_name);
                preview_table(ui, i, table);
            }
        });
}

/// First rows of one file, row labels first.
fn preview_table(ui: &mut Ui, id: usize, table: &Table) {
    if table.width() == 0 {
        ui.label("(no columns)");
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), table.width())
            .header(20.0, |mut header| {
                for name in table.index_names.iter().chain(&table.columns) {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for row in &table.rows {
                    body.row(18.0, |mut cells| {
                        for value in row.key.iter().chain(&row.cells) {
                            cells.col(|ui: &mut Ui| {
                                ui.label(value.to_string());
                            });
                        }
                    });
                }
            });
    });
    if table.is_empty() {
        ui.label("(no rows)");
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{CentralPanel, Context, RawInput};
    use nc2xlsx::data::model::{CellValue, Row};

    use super::*;

    fn one_row(v: i64) -> Table {
        Table {
            index_names: vec!["x".into()],
            columns: vec!["v".into()],
            rows: vec![Row {
                key: vec![CellValue::Integer(0)],
                cells: vec![CellValue::Integer(v)],
            }],
        }
    }

    #[test]
    fn same_named_previews_render_headless() {
        let mut state = AppState::default();
        state.previews.push(("dup.nc".into(), one_row(1)));
        state.previews.push(("dup.nc".into(), one_row(2)));

        let ctx = Context::default();
        for _ in 0..2 {
            let _ = ctx.run(RawInput::default(), |ctx| {
                CentralPanel::default().show(ctx, |ui| central_panel(ui, &mut state));
            });
        }
        assert_eq!(state.previews.len(), 2);
    }
}
