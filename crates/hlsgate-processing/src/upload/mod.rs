//! Upload receiving

pub mod stager;

pub use stager::{sanitize_extension, sanitize_field_name, UploadStager};
