//! Data layer: decoding, the in-memory model, flattening and filtering.
//!
//! Architecture:
//! ```text
//!  .nc bytes
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ container │  libnetcdf root group → NcFile
//!   └───────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │    cf     │  fill values, packing, strings, time → Dataset
//!   └───────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │  flatten  │  Cartesian product of dimensions → Table
//!   └───────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │  filter   │  optionally drop all-missing rows
//!   └───────────┘
//! ```

pub mod cf;
pub mod container;
pub mod filter;
pub mod flatten;
pub mod model;
pub mod time_units;

use log::info;

use crate::error::DecodeError;
use model::Dataset;

/// Decode the bytes of a NetCDF file into a [`Dataset`].
pub fn decode_dataset(bytes: &[u8]) -> Result<Dataset, DecodeError> {
    let file = container::read(bytes)?;
    let format = file.format;
    let ds = cf::decode(file);
    info!(
        "decoded {format:?} dataset: dimensions {:?}, variables {:?}",
        ds.dimensions.iter().map(|d| (&d.name, d.len)).collect::<Vec<_>>(),
        ds.variable_names()
    );
    Ok(ds)
}
