use crate::data::model::Table;

/// Which counter a progress report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressScope {
    /// Rows written for the file currently being converted.
    File,
    /// Files completed in the batch.
    Batch,
}

/// Receives progress from the pipeline. Passed explicitly into every stage
/// that reports, so concurrent batches never share state.
pub trait ProgressObserver {
    /// `fraction` is in `0.0..=1.0`.
    fn report(&mut self, scope: ProgressScope, fraction: f32, label: &str);

    /// First rows of a file's table, available before it is written.
    fn preview(&mut self, _file_name: &str, _preview: &Table) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&mut self, _scope: ProgressScope, _fraction: f32, _label: &str) {}
}
