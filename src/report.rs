//! Export report written by the buildpacks lifecycle after an image is built.
//!
//! Only the `[image]` table is read; the first tag is the reference that gets
//! signed.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportReport {
    #[serde(default)]
    pub image: ImageReport,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageReport {
    #[serde(default)]
    pub tags: Vec<String>,
    pub digest: Option<String>,
    pub image_id: Option<String>,
    pub manifest_size: Option<u64>,
}

impl ExportReport {
    /// Build a report for a single image reference
    pub fn for_tag(tag: impl Into<String>) -> Self {
        Self {
            image: ImageReport {
                tags: vec![tag.into()],
                ..ImageReport::default()
            },
        }
    }

    /// Load a `report.toml` from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let report: ExportReport = toml::from_str(&content).map_err(|source| ReportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Loaded export report from {} with {} tags",
            path.display(),
            report.image.tags.len()
        );
        Ok(report)
    }

    /// The reference to sign: the first tag of the exported image
    pub fn image_ref(&self) -> Option<&str> {
        self.image.tags.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_lifecycle_report() {
        let content = r#"
[image]
  tags = ["registry.example.com/app:latest", "registry.example.com/app:v1"]
  digest = "sha256:0123456789abcdef"
  image-id = "sha256:fedcba"
  manifest-size = 1024

[build]
  [[build.bom]]
    name = "ignored"
"#;
        let report: ExportReport = toml::from_str(content).unwrap();

        assert_eq!(report.image_ref(), Some("registry.example.com/app:latest"));
        assert_eq!(report.image.digest.as_deref(), Some("sha256:0123456789abcdef"));
        assert_eq!(report.image.image_id.as_deref(), Some("sha256:fedcba"));
        assert_eq!(report.image.manifest_size, Some(1024));
    }

    #[test]
    fn test_report_without_tags() {
        let report: ExportReport = toml::from_str("[image]\n").unwrap();
        assert!(report.image_ref().is_none());

        let empty: ExportReport = toml::from_str("").unwrap();
        assert!(empty.image_ref().is_none());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[image]\ntags = [\"gcr.io/project/app:1\"]").unwrap();

        let report = ExportReport::from_file(file.path()).unwrap();
        assert_eq!(report.image_ref(), Some("gcr.io/project/app:1"));
    }

    #[test]
    fn test_from_file_errors() {
        let missing = ExportReport::from_file("/nonexistent/report.toml").unwrap_err();
        assert!(matches!(missing, ReportError::Read { .. }));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[image\ntags = ").unwrap();
        let invalid = ExportReport::from_file(file.path()).unwrap_err();
        assert!(matches!(invalid, ReportError::Parse { .. }));
    }

    #[test]
    fn test_for_tag() {
        let report = ExportReport::for_tag("registry.example.com/app:latest");
        assert_eq!(report.image_ref(), Some("registry.example.com/app:latest"));
    }
}
