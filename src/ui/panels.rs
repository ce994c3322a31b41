use eframe::egui::{self, Color32, ProgressBar, RichText, ScrollArea, Ui};

use crate::state::{AppState, BatchStatus};

// ---------------------------------------------------------------------------
// Left side panel – selection and conversion controls
// ---------------------------------------------------------------------------

/// Render the left panel: selected files, options, convert button, progress.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Files");
    ui.separator();

    let running = state.is_running();

    if state.files.is_empty() {
        ui.label("No NetCDF files selected.");
    } else {
        ui.label(format!("Number of files uploaded: {}", state.files.len()));
        let mut remove = None;
        ScrollArea::vertical()
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui: &mut Ui| {
                for (i, file) in state.files.iter().enumerate() {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.add_enabled(!running, egui::Button::new("✕").small()).clicked() {
                            remove = Some(i);
                        }
                        ui.label(&file.name);
                    });
                }
            });
        if let Some(i) = remove {
            state.remove_file(i);
        }
    }

    ui.add_space(4.0);
    if ui.add_enabled(!running, egui::Button::new("Add NetCDF files…")).clicked() {
        open_files_dialog(state);
    }
    ui.separator();

    ui.add_enabled(
        !running,
        egui::Checkbox::new(
            &mut state.options.drop_empty_rows,
            "Drop rows with all NaN values",
        ),
    );

    // Convert is not offered without a selection.
    if !state.files.is_empty()
        && ui
            .add_enabled(state.can_convert(), egui::Button::new("Convert to Excel"))
            .clicked()
    {
        let ctx = ui.ctx().clone();
        state.start_conversion(move || ctx.request_repaint());
    }

    ui.add_space(8.0);
    if !matches!(state.status, BatchStatus::Idle) {
        let (fraction, label) = &state.batch_progress;
        ui.add(ProgressBar::new(*fraction).text(label.as_str()));
        if let Some((fraction, label)) = &state.file_progress {
            ui.add(ProgressBar::new(*fraction).text(label.as_str()));
        }
    }
    if running {
        ui.horizontal(|ui: &mut Ui| {
            ui.spinner();
            ui.label("Converting…");
        });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(!state.is_running(), egui::Button::new("Add NetCDF files…"))
                .clicked()
            {
                open_files_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(!state.is_running(), egui::Button::new("Clear selection"))
                .clicked()
            {
                state.clear_files();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("{} files selected", state.files.len()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Upload NetCDF files")
        .add_filter("NetCDF", &["nc"])
        .pick_files();

    if let Some(paths) = files {
        state.add_paths(&paths);
    }
}

pub fn save_archive_dialog(state: &mut AppState) {
    let Some(link) = state.download_link() else {
        return;
    };
    let target = rfd::FileDialog::new()
        .set_title("Save converted files")
        .set_file_name(link.file_name.as_str())
        .add_filter("Zip archive", &["zip"])
        .save_file();

    if let Some(path) = target {
        if let Err(e) = state.save_archive(&path) {
            log::error!("Failed to save archive: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
