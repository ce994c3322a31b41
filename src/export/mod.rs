//! Output side of the pipeline: workbook serialisation, archiving and the
//! base64 download reference.

pub mod archive;
pub mod delivery;
pub mod xlsx;
