use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Name the downloaded archive is saved under.
pub const ARCHIVE_NAME: &str = "converted_netcdf.zip";
/// Declared content type of the archive.
pub const CONTENT_TYPE: &str = "application/zip";

/// A self-contained download reference for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub file_name: String,
    pub content_type: String,
    /// Standard base64 of the archive bytes.
    pub payload: String,
}

impl DownloadLink {
    pub fn encode(bytes: &[u8]) -> Self {
        DownloadLink {
            file_name: ARCHIVE_NAME.to_string(),
            content_type: CONTENT_TYPE.to_string(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// `data:` URI embedding the archive.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.payload)
    }

    /// Anchor element that downloads the archive when clicked in a browser.
    pub fn html_anchor(&self) -> String {
        format!(
            r#"<a href="{}" download="{}">Download ZIP file</a>"#,
            self.data_uri(),
            self.file_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_standard_base64() {
        let link = DownloadLink::encode(b"PK\x03\x04hello");
        assert_eq!(link.payload, "UEsDBGhlbGxv");
        assert_eq!(link.data_uri(), "data:application/zip;base64,UEsDBGhlbGxv");
        assert_eq!(
            link.html_anchor(),
            concat!(
                r#"<a href="data:application/zip;base64,UEsDBGhlbGxv" "#,
                r#"download="converted_netcdf.zip">Download ZIP file</a>"#
            )
        );
    }

    #[test]
    fn empty_input_is_fine() {
        assert_eq!(DownloadLink::encode(&[]).payload, "");
    }
}
