//! Locating and loading `sift.toml`.
//!
//! Lookup order:
//!
//! 1. the `--config` path
//! 2. the nearest `sift.toml` or `.sift.toml` in the checked directory or
//!    one of its ancestors
//! 3. `config.toml` in the global directory (`$SIFT_CONFIG_DIR`, else `~/.sift`)
//!
//! Without any of them the built-in defaults apply.

use anyhow::{Context, Result};
use sift_core::Config;
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order in each directory.
const PROJECT_CONFIG_NAMES: &[&str] = &["sift.toml", ".sift.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Where the configuration in effect came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Named with `--config`.
    Flag(PathBuf),
    /// Found in or above the checked directory.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Builtin,
}

impl Origin {
    fn path(&self) -> Option<&Path> {
        match self {
            Self::Flag(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Builtin => None,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(p) => write!(f, "explicit config {}", p.display()),
            Self::Project(p) => write!(f, "project config {}", p.display()),
            Self::Global(p) => write!(f, "global config {}", p.display()),
            Self::Builtin => write!(f, "built-in defaults"),
        }
    }
}

/// A loaded configuration and where it came from.
#[derive(Debug)]
pub struct Resolved {
    /// Parsed configuration.
    pub config: Config,
    /// How it was found.
    pub origin: Origin,
}

/// Finds and parses the configuration for a check of `check_path`.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. A missing
/// `--config` file is an error; missing project and global files are not.
pub fn load(check_path: &Path, explicit: Option<&Path>) -> Result<Resolved> {
    load_with(check_path, explicit, global_dir())
}

fn load_with(
    check_path: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> Result<Resolved> {
    let origin = locate(check_path, explicit, global_dir.as_deref());
    let config = match origin.path() {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };
    tracing::debug!("Using {}", origin);
    Ok(Resolved { config, origin })
}

fn locate(check_path: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> Origin {
    if let Some(path) = explicit {
        return Origin::Flag(path.to_path_buf());
    }

    let start = check_path
        .canonicalize()
        .unwrap_or_else(|_| check_path.to_path_buf());
    let project = start.ancestors().find_map(|dir| {
        PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    });
    if let Some(path) = project {
        return Origin::Project(path);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(Origin::Builtin, Origin::Global)
}

fn global_dir() -> Option<PathBuf> {
    match std::env::var_os("SIFT_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|home| home.join(".sift")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::Severity;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn explicit_path_wins_over_project_file() {
        let project = TempDir::new().unwrap();
        write(project.path(), "sift.toml", "preset = \"minimal\"\n");
        let other = TempDir::new().unwrap();
        let flag = write(other.path(), "ci.toml", "preset = \"strict\"\n");

        let resolved = load_with(project.path(), Some(&flag), None).unwrap();
        assert_eq!(resolved.origin, Origin::Flag(flag));
        assert_eq!(resolved.config.preset.as_deref(), Some("strict"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let project = TempDir::new().unwrap();
        let missing = project.path().join("nope.toml");
        let err = load_with(project.path(), Some(&missing), None).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn project_file_is_found_from_a_subdirectory() {
        let project = TempDir::new().unwrap();
        write(project.path(), ".sift.toml", "fail_on = \"warning\"\n");
        let units = project.path().join("build/units");
        fs::create_dir_all(&units).unwrap();

        let resolved = load_with(&units, None, None).unwrap();
        assert!(matches!(resolved.origin, Origin::Project(_)));
        assert_eq!(resolved.config.fail_threshold(), Severity::Warning);
    }

    #[test]
    fn plain_name_is_preferred_in_the_same_directory() {
        let project = TempDir::new().unwrap();
        write(project.path(), ".sift.toml", "preset = \"strict\"\n");
        let plain = write(project.path(), "sift.toml", "preset = \"minimal\"\n");

        let resolved = load_with(project.path(), None, None).unwrap();
        assert_eq!(resolved.origin.path(), Some(plain.as_path()));
        assert_eq!(resolved.config.preset.as_deref(), Some("minimal"));
    }

    #[test]
    fn global_file_is_the_fallback() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        write(global.path(), GLOBAL_CONFIG_NAME, "preset = \"strict\"\n");

        let resolved =
            load_with(project.path(), None, Some(global.path().to_path_buf())).unwrap();
        assert!(matches!(resolved.origin, Origin::Global(_)));
        assert_eq!(resolved.config.preset.as_deref(), Some("strict"));
    }

    #[test]
    fn defaults_apply_when_nothing_is_found() {
        let project = TempDir::new().unwrap();
        let empty_global = TempDir::new().unwrap();

        let resolved =
            load_with(project.path(), None, Some(empty_global.path().to_path_buf())).unwrap();
        assert_eq!(resolved.origin, Origin::Builtin);
        assert!(resolved.config.preset.is_none());
    }

    #[test]
    fn invalid_project_file_names_the_file() {
        let project = TempDir::new().unwrap();
        write(project.path(), "sift.toml", "fail_on = \"fatal\"\n");
        let err = load_with(project.path(), None, None).unwrap_err();
        assert!(format!("{err:#}").contains("sift.toml"));
    }
}
