use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::{Context, Result};

use nc2xlsx::data::model::Table;
use nc2xlsx::export::delivery::DownloadLink;
use nc2xlsx::progress::{ProgressObserver, ProgressScope};
use nc2xlsx::{convert_batch, BatchOutput, ConvertError, ConvertOptions, UploadedFile};

// ---------------------------------------------------------------------------
// Batch lifecycle
// ---------------------------------------------------------------------------

/// `Idle → Running → {Succeeded, Failed}`; a new run starts from any
/// terminal state.
#[derive(Debug)]
pub enum BatchStatus {
    Idle,
    Running,
    Succeeded(BatchOutput),
    Failed(String),
}

/// Messages from the conversion thread to the UI.
#[derive(Debug)]
pub enum WorkerEvent {
    Progress {
        scope: ProgressScope,
        fraction: f32,
        label: String,
    },
    Preview {
        file_name: String,
        table: Table,
    },
    Finished(Result<BatchOutput, ConvertError>),
}

/// Forwards pipeline progress over a channel and wakes the UI.
struct ChannelObserver {
    tx: Sender<WorkerEvent>,
    repaint: Box<dyn Fn() + Send>,
}

impl ChannelObserver {
    fn send(&self, event: WorkerEvent) {
        // The receiver is gone only when the window closed mid-batch.
        if self.tx.send(event).is_ok() {
            (self.repaint)();
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn report(&mut self, scope: ProgressScope, fraction: f32, label: &str) {
        self.send(WorkerEvent::Progress {
            scope,
            fraction,
            label: label.to_string(),
        });
    }

    fn preview(&mut self, file_name: &str, preview: &Table) {
        self.send(WorkerEvent::Preview {
            file_name: file_name.to_string(),
            table: preview.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Files selected for the next batch, in selection order.
    pub files: Vec<UploadedFile>,

    pub options: ConvertOptions,

    pub status: BatchStatus,

    /// Fraction of files done and its label.
    pub batch_progress: (f32, String),

    /// Write progress of the file currently being converted.
    pub file_progress: Option<(f32, String)>,

    /// First rows of each converted file, in conversion order.
    pub previews: Vec<(String, Table)>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    events: Option<Receiver<WorkerEvent>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            options: ConvertOptions::default(),
            status: BatchStatus::Idle,
            batch_progress: (0.0, String::new()),
            file_progress: None,
            previews: Vec::new(),
            status_message: None,
            events: None,
        }
    }
}

/// Read a file from disk into an upload.
pub fn load_upload(path: &Path) -> Result<UploadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(UploadedFile { name, bytes })
}

impl AppState {
    pub fn is_running(&self) -> bool {
        matches!(self.status, BatchStatus::Running)
    }

    /// Convert is offered only with a selection and no batch in flight.
    pub fn can_convert(&self) -> bool {
        !self.files.is_empty() && !self.is_running()
    }

    /// Add files picked in the dialog; unreadable ones are reported and skipped.
    pub fn add_paths(&mut self, paths: &[PathBuf]) {
        for path in paths {
            match load_upload(path) {
                Ok(file) => {
                    log::info!("Selected {} ({} bytes)", file.name, file.bytes.len());
                    self.files.push(file);
                    self.status_message = None;
                }
                Err(e) => {
                    log::error!("Failed to read file: {e:#}");
                    self.status_message = Some(format!("Error: {e:#}"));
                }
            }
        }
    }

    pub fn remove_file(&mut self, index: usize) {
        if !self.is_running() && index < self.files.len() {
            self.files.remove(index);
        }
    }

    pub fn clear_files(&mut self) {
        if !self.is_running() {
            self.files.clear();
        }
    }

    /// Start a batch on a worker thread. `repaint` is called after every
    /// event so the UI can redraw. Returns whether a batch was started.
    pub fn start_conversion(&mut self, repaint: impl Fn() + Send + 'static) -> bool {
        if !self.can_convert() {
            return false;
        }
        let files = self.files.clone();
        let options = self.options.clone();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("conversion".into())
            .spawn(move || {
                let mut observer = ChannelObserver {
                    tx,
                    repaint: Box::new(repaint),
                };
                let result = convert_batch(&files, &options, &mut observer);
                observer.send(WorkerEvent::Finished(result));
            });

        self.previews.clear();
        self.file_progress = None;
        self.batch_progress = (0.0, "Starting conversion...".into());
        self.status_message = None;
        match spawned {
            Ok(_) => {
                log::info!("Converting {} files", self.files.len());
                self.events = Some(rx);
                self.status = BatchStatus::Running;
                true
            }
            Err(e) => {
                log::error!("Failed to start conversion thread: {e}");
                self.status = BatchStatus::Failed(format!("Could not start conversion: {e}"));
                false
            }
        }
    }

    /// Drain pending worker events. A worker that hangs up without a
    /// `Finished` event (it panicked) fails the batch.
    pub fn poll(&mut self) {
        while let Some(rx) = &self.events {
            match rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::error!("Conversion thread exited without a result");
                    self.status =
                        BatchStatus::Failed("conversion thread stopped unexpectedly".into());
                    self.file_progress = None;
                    self.events = None;
                }
            }
        }
    }

    pub fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress {
                scope: ProgressScope::Batch,
                fraction,
                label,
            } => self.batch_progress = (fraction, label),
            WorkerEvent::Progress {
                scope: ProgressScope::File,
                fraction,
                label,
            } => self.file_progress = Some((fraction, label)),
            WorkerEvent::Preview { file_name, table } => self.previews.push((file_name, table)),
            WorkerEvent::Finished(Ok(output)) => {
                log::info!("Batch done: {} workbooks", output.outputs.len());
                self.batch_progress = (1.0, "Conversion complete!".into());
                self.status = BatchStatus::Succeeded(output);
                self.events = None;
            }
            WorkerEvent::Finished(Err(e)) => {
                log::error!("Batch failed: {e}");
                self.status = BatchStatus::Failed(e.to_string());
                self.events = None;
            }
        }
    }

    pub fn download_link(&self) -> Option<&DownloadLink> {
        match &self.status {
            BatchStatus::Succeeded(output) => Some(&output.link),
            _ => None,
        }
    }

    /// Write the finished archive to `path`.
    pub fn save_archive(&self, path: &Path) -> Result<()> {
        let BatchStatus::Succeeded(output) = &self.status else {
            anyhow::bail!("no converted archive to save");
        };
        std::fs::write(path, &output.archive)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Saved archive to {}", path.display());
        Ok(())
    }
}
