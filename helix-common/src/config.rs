//! Configuration file discovery and loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file resolution, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory (`<config dir>/helix/<file_name>`)
/// 4. System config (`/etc/helix/<file_name>`, unix only)
///
/// Returns `None` when no source names an existing file; callers fall back
/// to built-in defaults. An explicit CLI or environment path is returned even
/// if it does not exist so that loading reports the mistake.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join("helix").join(file_name)) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: system config
    if cfg!(unix) {
        let path = PathBuf::from("/etc/helix").join(file_name);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Parse a TOML config file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading configuration from {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Sample {
        port: u16,
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn test_cli_arg_wins() {
        let path = PathBuf::from("/nonexistent/player.toml");
        let resolved = resolve_config_path(Some(&path), "HELIX_TEST_UNUSED_VAR", "player.toml");
        assert_eq!(resolved, Some(path));
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 6000").unwrap();
        writeln!(file, "name = \"living-room\"").unwrap();

        let sample: Sample = load_toml(file.path()).unwrap();
        assert_eq!(sample.port, 6000);
        assert_eq!(sample.name.as_deref(), Some("living-room"));
    }

    #[test]
    fn test_load_toml_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let result: Result<Sample> = load_toml(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_toml_missing_file() {
        let result: Result<Sample> = load_toml(Path::new("/nonexistent/helix/player.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
