use std::path::Path;

use log::{error, info};

use crate::data::{decode_dataset, filter, flatten};
use crate::error::{ConvertError, FileError, WriteError};
use crate::export::archive::build_archive;
use crate::export::delivery::DownloadLink;
use crate::export::xlsx::{write_table, MAX_ROWS};
use crate::progress::{ProgressObserver, ProgressScope};

/// Extension given to every converted file.
pub const SPREADSHEET_EXTENSION: &str = "xlsx";

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// An uploaded NetCDF file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// User-selectable conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Drop rows in which every variable is missing.
    pub drop_empty_rows: bool,
    /// Rows handed to [`ProgressObserver::preview`] per file.
    pub preview_rows: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            drop_empty_rows: false,
            preview_rows: 10,
        }
    }
}

/// One converted workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything a successful batch produces.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Workbooks in input order.
    pub outputs: Vec<ConversionOutput>,
    /// Zip archive containing `outputs`.
    pub archive: Vec<u8>,
    pub link: DownloadLink,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Output name for an input: its extension replaced by `xlsx`.
pub fn output_name(input: &str) -> String {
    Path::new(input)
        .with_extension(SPREADSHEET_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// Decode, flatten, filter and write one file.
pub fn convert_file(
    file: &UploadedFile,
    options: &ConvertOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<ConversionOutput, FileError> {
    let dataset = decode_dataset(&file.bytes)?;
    // Refuse before materialising rows a worksheet could never hold.
    let rows = dataset.row_count().unwrap_or(usize::MAX);
    if rows > MAX_ROWS - 1 {
        return Err(WriteError::TooManyRows { rows }.into());
    }
    let table = flatten::flatten(&dataset);
    drop(dataset);
    let table = filter::drop_empty_rows(table, options.drop_empty_rows);
    info!(
        "{}: {} rows x {} columns after filtering",
        file.name,
        table.len(),
        table.columns.len()
    );

    observer.preview(&file.name, &table.head(options.preview_rows));
    let bytes = write_table(&table, &file.name, observer)?;

    Ok(ConversionOutput {
        file_name: output_name(&file.name),
        bytes,
    })
}

/// Convert every file in order and archive the results.
///
/// The batch is all-or-nothing: the first failing file aborts it and the
/// workbooks already produced are discarded.
pub fn convert_batch(
    files: &[UploadedFile],
    options: &ConvertOptions,
    observer: &mut dyn ProgressObserver,
) -> Result<BatchOutput, ConvertError> {
    if files.is_empty() {
        return Err(ConvertError::EmptyBatch);
    }

    observer.report(ProgressScope::Batch, 0.0, "Starting conversion...");
    let mut outputs = Vec::with_capacity(files.len());
    for (done, file) in files.iter().enumerate() {
        match convert_file(file, options, observer) {
            Ok(output) => outputs.push(output),
            Err(source) => {
                error!("Error processing {}: {source}", file.name);
                return Err(ConvertError::File {
                    name: file.name.clone(),
                    source,
                });
            }
        }
        observer.report(
            ProgressScope::Batch,
            (done + 1) as f32 / files.len() as f32,
            &format!("Processing {}", file.name),
        );
    }

    let archive = build_archive(&outputs)?;
    let link = DownloadLink::encode(&archive);
    observer.report(ProgressScope::Batch, 1.0, "Conversion complete!");

    Ok(BatchOutput {
        outputs,
        archive,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    #[test]
    fn output_names_swap_the_extension() {
        assert_eq!(output_name("sst.nc"), "sst.xlsx");
        assert_eq!(output_name("run.v2.nc"), "run.v2.xlsx");
        assert_eq!(output_name("noext"), "noext.xlsx");
    }

    #[test]
    fn empty_selection_is_rejected_up_front() {
        let err = convert_batch(&[], &ConvertOptions::default(), &mut NoProgress).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyBatch));
    }

    #[test]
    fn garbage_input_names_the_file() {
        let files = vec![UploadedFile {
            name: "bad.nc".into(),
            bytes: b"definitely not netcdf".to_vec(),
        }];
        let err = convert_batch(&files, &ConvertOptions::default(), &mut NoProgress).unwrap_err();
        assert_eq!(err.file_name(), Some("bad.nc"));
        assert_eq!(
            err.to_string(),
            "Error processing bad.nc: not a NetCDF file (no CDF or HDF5 signature)"
        );
    }
}
