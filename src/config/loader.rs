use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::GrapherConfig;

pub const CONFIG_FILE_NAME: &str = ".codegrapher.toml";
pub const TOKEN_LIMIT_ENV: &str = "TOKEN_LIMIT";
const MAX_TRAVERSAL_DEPTH: usize = 10;

pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

pub fn parse_and_validate_config(contents: &str) -> Result<GrapherConfig, String> {
    let config = toml::from_str::<GrapherConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;
    config
        .validate()
        .map_err(|e| format!("Invalid {}: {}", CONFIG_FILE_NAME, e))?;
    Ok(config)
}

pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<GrapherConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // "not found" is the normal case while walking up
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `.codegrapher.toml` at or above `start`, else defaults.
pub fn load_config_from(start: &Path) -> GrapherConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            GrapherConfig::default()
        })
}

/// File configuration for the working directory with the environment applied.
pub fn load_config() -> GrapherConfig {
    let config = match std::env::current_dir() {
        Ok(dir) => load_config_from(&dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            GrapherConfig::default()
        }
    };
    apply_token_limit_override(config, std::env::var(TOKEN_LIMIT_ENV).ok().as_deref())
}

pub fn apply_token_limit_override(mut config: GrapherConfig, raw: Option<&str>) -> GrapherConfig {
    let Some(raw) = raw else {
        return config;
    };
    match raw.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => config.token_limit = limit,
        _ => log::warn!(
            "Ignoring {}={:?}: expected a positive integer",
            TOKEN_LIMIT_ENV,
            raw
        ),
    }
    config
}
