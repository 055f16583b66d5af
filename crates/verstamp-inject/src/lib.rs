//! Build-side half of verstamp: stamps HTML output with the deployed version
//! and renders the `version.json` manifest the client checks against.

mod error;
mod html;
mod injector;
mod manifest;

pub use error::InjectError;
pub use html::{inject_version_meta, read_version_meta, version_meta_tag};
pub use injector::{BuildMode, BuildTarget, EmittedAsset, InjectorOptions, VersionInjector};
pub use manifest::{MANIFEST_FILENAME, VersionManifest, version_manifest};
