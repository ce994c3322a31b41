//! Convert NetCDF files into Excel workbooks bundled in a zip archive.
//!
//! The pipeline per file is decode → flatten → optional row filter → xlsx
//! write; a batch then archives all workbooks and base64-encodes the archive
//! into a download reference. See [`convert::convert_batch`].

pub mod convert;
pub mod data;
pub mod error;
pub mod export;
pub mod progress;

pub use convert::{
    convert_batch, convert_file, BatchOutput, ConversionOutput, ConvertOptions, UploadedFile,
};
pub use error::{ArchiveError, ConvertError, DecodeError, FileError, WriteError};
