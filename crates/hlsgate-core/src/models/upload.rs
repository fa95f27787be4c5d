use std::path::PathBuf;

/// A client upload fully written to the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub staging_path: PathBuf,
    /// `<field-name>-<generated-id><original-extension>`
    pub file_name: String,
    pub field_name: String,
    pub original_filename: String,
    /// Extension without the leading dot, as supplied by the client.
    pub original_extension: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: u64,
}
