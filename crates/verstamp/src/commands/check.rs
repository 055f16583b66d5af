use log::{info, warn};
use verstamp_core::{AppVersionCheck, CheckConfig, VersionCheckResult, check_app_version};
use verstamp_inject::read_version_meta;

use crate::cli::CheckArgs;
use crate::error::{CliError, load_json};

pub async fn run(args: &CheckArgs) -> Result<(), CliError> {
    let config = with_sinks(check_config(args)?);

    match check_app_version(config)? {
        AppVersionCheck::Once(pending) => {
            pending.await?;
        }
        AppVersionCheck::Polling(controller) => {
            controller.stop_on(async {
                if let Err(error) = tokio::signal::ctrl_c().await {
                    warn!("Cannot listen for ctrl-c, polling runs until a new version is found: {error}");
                    std::future::pending::<()>().await;
                }
            });
            info!(
                "Polling {} every {}ms",
                controller.checker().api_url(),
                controller.interval().as_millis()
            );
            controller.start();
            controller.stopped().await;
            info!("Polling stopped");
        }
    }

    Ok(())
}

/// Merge the config file, the command-line flags and the embedded marker.
pub fn check_config(args: &CheckArgs) -> Result<CheckConfig, CliError> {
    let mut config: CheckConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => CheckConfig::default(),
    };

    if let Some(api_url) = &args.api_url {
        config.api_url.clone_from(api_url);
    }
    if let Some(version) = &args.current_version {
        config.current_version = Some(version.clone());
    }
    if args.poll {
        config.polling = true;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.polling_interval_ms = Some(interval_ms);
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(environment) = args.environment {
        config.environment = environment.into();
    }
    if args.debug {
        config.debug = Some(true);
    }
    if args.disable_dev_updates {
        config.disable_dev_updates = true;
    }

    if let Some(path) = &args.html {
        let html = std::fs::read_to_string(path)
            .map_err(|source| CliError::io("failed to read", path, source))?;
        let embedded = read_version_meta(&html);
        if embedded.is_none() {
            warn!("No version marker found in {}", path.display());
        }
        config = config.with_embedded_version(move || embedded.clone());
    }

    Ok(config)
}

/// Print every result; while polling, also log failures the loop swallows.
fn with_sinks(config: CheckConfig) -> CheckConfig {
    let config = config.with_on_result(print_result);
    if config.polling {
        config.with_on_error(|error| warn!("Version check failed: {error}"))
    } else {
        config
    }
}

fn print_result(result: &VersionCheckResult) {
    match serde_json::to_string(result) {
        Ok(line) => println!("{line}"),
        Err(error) => warn!("Cannot render version check result: {error}"),
    }
}
