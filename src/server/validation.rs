//! Upload pre-flight checks

use crate::fs::archive::has_zip_magic;
use crate::util::format_file_size;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MAX_FILE_NAME_LEN: usize = 255;

/// Uploads above this size get a warning, not an error.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

const ZIP_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/x-zip",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub file_info: Option<FileInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_valid: Option<bool>,
}

impl ValidationReport {
    pub fn missing_file() -> Self {
        Self {
            is_valid: false,
            errors: vec!["No file uploaded".to_string()],
            warnings: Vec::new(),
            file_info: None,
            zip_valid: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_size: u64,
}

impl UploadValidator {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Checks name, size, MIME type and the ZIP signature of an upload.
    pub fn validate(&self, name: &str, content_type: Option<&str>, bytes: &[u8]) -> ValidationReport {
        let size = bytes.len() as u64;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !name.to_lowercase().ends_with(".zip") {
            errors.push("Only ZIP files are supported".to_string());
        }

        if size == 0 {
            errors.push("File is empty".to_string());
        } else if size > self.max_size {
            errors.push(format!(
                "File size ({}) exceeds maximum limit ({})",
                format_file_size(size),
                format_file_size(self.max_size)
            ));
        }

        if let Some(mime) = content_type {
            if !ZIP_MIME_TYPES.contains(&mime) {
                warnings.push(format!(
                    "Unexpected file type: {}. Expected ZIP format",
                    mime
                ));
            }
        }

        if name.chars().count() > MAX_FILE_NAME_LEN {
            errors.push(format!(
                "File name is too long (maximum {} characters)",
                MAX_FILE_NAME_LEN
            ));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            errors.push("File name contains invalid characters".to_string());
        }

        let zip_valid = has_zip_magic(bytes);
        if !zip_valid {
            errors.push("File is not a valid ZIP archive".to_string());
        }

        if size > LARGE_FILE_THRESHOLD {
            warnings.push("Large file detected. Upload may take longer".to_string());
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            file_info: Some(FileInfo {
                name: name.to_string(),
                size,
                content_type: content_type.unwrap_or("application/zip").to_string(),
                last_modified: Utc::now(),
            }),
            zip_valid: Some(zip_valid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    const ZIP_HEADER: &[u8] = b"PK\x03\x04rest";

    fn validator() -> UploadValidator {
        UploadValidator::new(1024)
    }

    #[test]
    fn test_valid_upload() {
        let report = validator().validate("app.zip", Some("application/zip"), ZIP_HEADER);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.zip_valid, Some(true));
        assert_eq!(report.file_info.unwrap().size, ZIP_HEADER.len() as u64);
    }

    #[parameterized(
        wrong_extension = { "app.tar", "Only ZIP files are supported" },
        parent_reference = { "..app.zip", "File name contains invalid characters" },
        slash = { "dir/app.zip", "File name contains invalid characters" },
        backslash = { "dir\\app.zip", "File name contains invalid characters" },
    )]
    fn test_name_errors(name: &str, expected: &str) {
        let report = validator().validate(name, None, ZIP_HEADER);
        assert!(!report.is_valid);
        assert!(report.errors.contains(&expected.to_string()), "{:?}", report.errors);
    }

    #[test]
    fn test_long_name() {
        let name = format!("{}.zip", "a".repeat(MAX_FILE_NAME_LEN));
        let report = validator().validate(&name, None, ZIP_HEADER);
        assert_eq!(
            report.errors,
            vec!["File name is too long (maximum 255 characters)"]
        );
    }

    #[test]
    fn test_empty_file() {
        let report = validator().validate("app.zip", None, b"");
        assert_eq!(
            report.errors,
            vec!["File is empty", "File is not a valid ZIP archive"]
        );
        assert_eq!(report.zip_valid, Some(false));
    }

    #[parameterized(
        plain_text = { b"just some notes" },
        truncated_signature = { b"P" },
    )]
    fn test_non_zip_content(bytes: &[u8]) {
        let report = validator().validate("notes.zip", None, bytes);
        assert_eq!(report.errors, vec!["File is not a valid ZIP archive"]);
        assert_eq!(report.zip_valid, Some(false));
    }

    #[test]
    fn test_oversized_file_reports_both_sizes() {
        let mut bytes = b"PK".to_vec();
        bytes.resize(1536, 0);
        let report = validator().validate("app.zip", None, &bytes);
        assert_eq!(
            report.errors,
            vec!["File size (1.5 KB) exceeds maximum limit (1 KB)"]
        );
    }

    #[test]
    fn test_unexpected_mime_is_a_warning() {
        let report = validator().validate("app.zip", Some("text/plain"), ZIP_HEADER);
        assert!(report.is_valid);
        assert_eq!(
            report.warnings,
            vec!["Unexpected file type: text/plain. Expected ZIP format"]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(validator().validate("app.zip", None, ZIP_HEADER)).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["zipValid"], true);
        assert_eq!(json["fileInfo"]["type"], "application/zip");

        let missing = serde_json::to_value(ValidationReport::missing_file()).unwrap();
        assert!(missing["fileInfo"].is_null());
        assert!(missing.get("zipValid").is_none());
    }
}
