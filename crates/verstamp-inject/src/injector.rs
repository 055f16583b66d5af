use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::InjectError;
use crate::html::inject_version_meta;
use crate::manifest::{MANIFEST_FILENAME, version_manifest};

/// Mode the host build is running in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = InjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            _ => Err(InjectError::UnknownMode(value.to_string())),
        }
    }
}

/// Build modes in which stamping happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    Development,
    #[default]
    Production,
    All,
}

impl BuildTarget {
    #[must_use]
    pub fn includes(self, mode: BuildMode) -> bool {
        match self {
            BuildTarget::All => true,
            BuildTarget::Development => mode == BuildMode::Development,
            BuildTarget::Production => mode == BuildMode::Production,
        }
    }
}

impl FromStr for BuildTarget {
    type Err = InjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(BuildTarget::All),
            other => other
                .parse::<BuildMode>()
                .map(|mode| match mode {
                    BuildMode::Development => BuildTarget::Development,
                    BuildMode::Production => BuildTarget::Production,
                })
                .map_err(|_| InjectError::UnknownTarget(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectorOptions {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_injector_filename")]
    pub injector_filename: String,

    #[serde(default = "default_true")]
    pub inject_version_json: bool,

    #[serde(default)]
    pub environment: BuildTarget,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_injector_filename() -> String {
    "index.html".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for InjectorOptions {
    fn default() -> Self {
        Self {
            version: default_version(),
            injector_filename: default_injector_filename(),
            inject_version_json: true,
            environment: BuildTarget::default(),
        }
    }
}

/// An extra file to add to the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub file_name: String,
    pub source: String,
}

/// Stamps build output with a version marker and publishes the manifest,
/// gated on the build mode.
#[derive(Debug, Clone)]
pub struct VersionInjector {
    options: InjectorOptions,
}

impl VersionInjector {
    #[must_use]
    pub fn new(options: InjectorOptions) -> Self {
        if let Err(error) = semver::Version::parse(&options.version) {
            warn!(
                "Version {:?} is not valid semver ({error}); stamping it as-is",
                options.version
            );
        }
        Self { options }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.options.version
    }

    #[must_use]
    pub fn options(&self) -> &InjectorOptions {
        &self.options
    }

    #[must_use]
    pub fn is_active(&self, mode: BuildMode) -> bool {
        self.options.environment.includes(mode)
    }

    /// Stamp the entry document when active, otherwise pass it through.
    #[must_use]
    pub fn transform_index_html(&self, html: &str, mode: BuildMode) -> String {
        if !self.is_active(mode) {
            debug!("Skipping version stamp for {mode} build");
            return html.to_string();
        }
        inject_version_meta(html, &self.options.version)
    }

    /// The `version.json` asset to add to the output, if any.
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be rendered.
    pub fn generate_bundle(&self, mode: BuildMode) -> Result<Option<EmittedAsset>, InjectError> {
        if !self.is_active(mode) || !self.options.inject_version_json {
            return Ok(None);
        }

        let source = version_manifest(&self.options.version).map_err(InjectError::Manifest)?;
        Ok(Some(EmittedAsset {
            file_name: MANIFEST_FILENAME.to_string(),
            source,
        }))
    }

    /// Rewrite the entry document inside an output asset map.
    ///
    /// Returns `true` when the map was changed. Missing or empty entry
    /// documents are left alone.
    pub fn rewrite_assets(&self, assets: &mut BTreeMap<String, String>, mode: BuildMode) -> bool {
        if !self.is_active(mode) {
            return false;
        }

        let Some(html) = assets.get_mut(&self.options.injector_filename) else {
            debug!(
                "No {} asset in build output, nothing to stamp",
                self.options.injector_filename
            );
            return false;
        };
        if html.is_empty() {
            return false;
        }

        let stamped = inject_version_meta(html, &self.options.version);
        let changed = stamped != *html;
        *html = stamped;
        changed
    }
}
