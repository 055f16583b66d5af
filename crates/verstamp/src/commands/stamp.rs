use std::path::{Path, PathBuf};

use log::{info, warn};
use verstamp_inject::{InjectorOptions, VersionInjector, read_version_meta};

use crate::cli::StampArgs;
use crate::error::{CliError, load_json};

/// What a stamp run changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StampOutcome {
    pub html_stamped: bool,
    pub manifest: Option<PathBuf>,
}

pub fn run(args: &StampArgs) -> Result<StampOutcome, CliError> {
    let injector = VersionInjector::new(injector_options(args)?);
    let mode = args.mode;

    if !injector.is_active(mode) {
        info!(
            "Version stamping is disabled for {mode} builds (target: {:?})",
            injector.options().environment
        );
        return Ok(StampOutcome::default());
    }

    let html = std::fs::read_to_string(&args.html)
        .map_err(|source| CliError::io("failed to read", &args.html, source))?;

    let mut outcome = StampOutcome::default();
    if let Some(existing) = read_version_meta(&html) {
        warn!(
            "{} already carries version {existing}, leaving it unchanged",
            args.html.display()
        );
    } else {
        let stamped = injector.transform_index_html(&html, mode);
        if stamped == html {
            warn!("No <head> tag in {}, nothing stamped", args.html.display());
        } else {
            std::fs::write(&args.html, stamped)
                .map_err(|source| CliError::io("failed to write", &args.html, source))?;
            info!(
                "Stamped {} with version {}",
                args.html.display(),
                injector.version()
            );
            outcome.html_stamped = true;
        }
    }

    if let Some(asset) = injector.generate_bundle(mode)? {
        let out_dir = manifest_dir(args);
        std::fs::create_dir_all(&out_dir)
            .map_err(|source| CliError::io("failed to create", &out_dir, source))?;
        let path = out_dir.join(&asset.file_name);
        std::fs::write(&path, asset.source)
            .map_err(|source| CliError::io("failed to write", &path, source))?;
        info!("Wrote {}", path.display());
        outcome.manifest = Some(path);
    }

    Ok(outcome)
}

fn injector_options(args: &StampArgs) -> Result<InjectorOptions, CliError> {
    let mut options = match &args.options {
        Some(path) => load_json(path)?,
        None => InjectorOptions::default(),
    };
    if let Some(version) = &args.app_version {
        options.version.clone_from(version);
    }
    if let Some(target) = args.target {
        options.environment = target;
    }
    if args.no_manifest {
        options.inject_version_json = false;
    }
    Ok(options)
}

fn manifest_dir(args: &StampArgs) -> PathBuf {
    args.out_dir.clone().unwrap_or_else(|| {
        args.html
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    })
}
