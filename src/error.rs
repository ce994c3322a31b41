use thiserror::Error;

/// Input bytes are not a NetCDF file this converter can read.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a NetCDF file (no CDF or HDF5 signature)")]
    NotNetcdf,
    #[error("unsupported schema: {0}")]
    Unsupported(String),
    #[error("netcdf: {0}")]
    Netcdf(#[from] netcdf::Error),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialising a table to a workbook failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("table has {rows} rows, more than a worksheet can hold")]
    TooManyRows { rows: usize },
    #[error("table has {columns} columns, more than a worksheet can hold")]
    TooManyColumns { columns: usize },
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Building the zip container failed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while converting a single uploaded file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Outcome of a failed batch.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("No data could be converted to Excel files")]
    EmptyBatch,
    #[error("Error processing {name}: {source}")]
    File {
        name: String,
        #[source]
        source: FileError,
    },
    #[error("Error building archive: {0}")]
    Archive(#[from] ArchiveError),
}

impl ConvertError {
    /// Name of the file that aborted the batch, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ConvertError::File { name, .. } => Some(name),
            _ => None,
        }
    }
}
