use std::io::{Cursor, Write};

use log::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::convert::ConversionOutput;
use crate::error::ArchiveError;

/// Pack every output into one in-memory zip, one entry per output in order.
pub fn build_archive(outputs: &[ConversionOutput]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    for output in outputs {
        writer.start_file(output.file_name.as_str(), options)?;
        writer.write_all(&output.bytes)?;
    }

    let bytes = writer.finish()?.into_inner();
    info!("archived {} workbooks into {} bytes", outputs.len(), bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn output(name: &str, bytes: &[u8]) -> ConversionOutput {
        ConversionOutput {
            file_name: name.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn entries_keep_names_order_and_bytes() {
        let outputs = vec![output("b.xlsx", b"second"), output("a.xlsx", b"first")];
        let bytes = build_archive(&outputs).unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        for (i, expected) in outputs.iter().enumerate() {
            let mut entry = zip.by_index(i).unwrap();
            assert_eq!(entry.name(), expected.file_name);
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).unwrap();
            assert_eq!(buf, expected.bytes);
        }
    }

    #[test]
    fn duplicate_names_fail() {
        let outputs = vec![output("same.xlsx", b"1"), output("same.xlsx", b"2")];
        assert!(build_archive(&outputs).is_err());
    }
}
