//! Configuration loading

use std::path::PathBuf;

use cvdfleet_core::FleetConfig;

/// Load configuration from an explicit path, `CVDFLEET_CONFIG`, or the
/// well-known locations; falls back to defaults with a warning.
///
/// # Errors
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load(path: Option<&PathBuf>) -> eyre::Result<FleetConfig> {
    if let Some(path) = path {
        return load_file(path);
    }

    if let Ok(path) = std::env::var("CVDFLEET_CONFIG") {
        return load_file(&PathBuf::from(path));
    }

    let paths = [
        PathBuf::from("cvdfleet.toml"),
        PathBuf::from("/etc/cvdfleet/cvdfleet.toml"),
        dirs::config_dir()
            .map(|p| p.join("cvdfleet/cvdfleet.toml"))
            .unwrap_or_default(),
    ];

    for path in paths {
        if path.exists() {
            return load_file(&path);
        }
    }

    tracing::warn!("no config file found, using defaults");
    Ok(FleetConfig::default())
}

fn load_file(path: &PathBuf) -> eyre::Result<FleetConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FleetConfig = toml::from_str(&content)?;
    Ok(config)
}
