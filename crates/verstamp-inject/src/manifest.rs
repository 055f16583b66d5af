use serde::{Deserialize, Serialize};

pub const MANIFEST_FILENAME: &str = "version.json";

/// Document published next to the build output and served to version checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub version: String,
}

impl VersionManifest {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Serialize as `{"version":"<version>"}`.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Render the manifest for `version`.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn version_manifest(version: &str) -> Result<String, serde_json::Error> {
    VersionManifest::new(version).to_json()
}
