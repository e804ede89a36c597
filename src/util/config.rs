//! Configuration file support.
//!
//! Two configuration directories are consulted:
//! - Global: `~/.abi-conform/` - User-wide defaults
//! - Project: `.abi-conform/` - Project-specific overrides
//!
//! Project config takes precedence over global config. Each directory may hold:
//! - `toolchain.toml` - compiler and cross-compilation settings
//! - `capabilities.toml` - platform capability overrides

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::builder::capabilities::UnknownPolicy;

/// Name of the configuration directory.
pub const CONFIG_DIR: &str = ".abi-conform";

/// Toolchain configuration for compiler overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Toolchain settings for conformance compiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to the C compiler (e.g., /usr/bin/clang)
    pub cc: Option<PathBuf>,

    /// Target triple for cross checks (e.g., aarch64-unknown-linux-gnu)
    pub target: Option<String>,

    /// Sysroot holding the target headers
    pub sysroot: Option<PathBuf>,

    /// Additional C compiler flags
    pub cflags: Vec<String>,

    /// Additional include directories
    pub include_dirs: Vec<PathBuf>,
}

impl ToolchainConfig {
    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.toolchain.cc.is_some() {
            self.toolchain.cc = other.toolchain.cc;
        }
        if other.toolchain.target.is_some() {
            self.toolchain.target = other.toolchain.target;
        }
        if other.toolchain.sysroot.is_some() {
            self.toolchain.sysroot = other.toolchain.sysroot;
        }
        if !other.toolchain.cflags.is_empty() {
            self.toolchain.cflags = other.toolchain.cflags;
        }
        if !other.toolchain.include_dirs.is_empty() {
            self.toolchain.include_dirs = other.toolchain.include_dirs;
        }
    }
}

/// Platform capability overrides.
///
/// ```toml
/// unknown = "skip"
///
/// [structs]
/// ip_mreqn = false
///
/// [headers]
/// "linux/errqueue.h" = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// What to do with structures that have no override
    pub unknown: Option<UnknownPolicy>,

    /// Structure name -> supported
    pub structs: BTreeMap<String, bool>,

    /// Header path -> includable
    pub headers: BTreeMap<String, bool>,
}

impl CapabilityConfig {
    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: CapabilityConfig) {
        if other.unknown.is_some() {
            self.unknown = other.unknown;
        }
        self.structs.extend(other.structs);
        self.headers.extend(other.headers);
    }
}

/// All configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub toolchain: ToolchainConfig,
    pub capabilities: CapabilityConfig,
}

/// Load a TOML file.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Load a TOML file, or defaults if it does not exist.
///
/// A file that exists but cannot be read or parsed is an error: silently
/// dropping it would lose the overrides it holds.
pub fn load_toml_if_exists<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.exists() {
        load_toml(path)
    } else {
        Ok(T::default())
    }
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.abi-conform/toolchain.toml)
/// 2. Global config (~/.abi-conform/toolchain.toml)
/// 3. Defaults
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> Result<ToolchainConfig> {
    let mut config = ToolchainConfig::default();
    if let Some(path) = global_path {
        config.merge(load_toml_if_exists(path)?);
    }
    config.merge(load_toml_if_exists(project_path)?);
    Ok(config)
}

/// Load merged capability overrides from global and project locations.
pub fn load_capability_config(global_path: Option<&Path>, project_path: &Path) -> Result<CapabilityConfig> {
    let mut config = CapabilityConfig::default();
    if let Some(path) = global_path {
        config.merge(load_toml_if_exists(path)?);
    }
    config.merge(load_toml_if_exists(project_path)?);
    Ok(config)
}

/// Load all configuration for the current directory.
pub fn load_project_config() -> Result<ProjectConfig> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    load_config_from(global_config_dir().as_deref(), &project_config_dir(&cwd))
}

/// Load all configuration from explicit directories.
pub fn load_config_from(global_dir: Option<&Path>, project_dir: &Path) -> Result<ProjectConfig> {
    let global_toolchain = global_dir.map(|d| d.join("toolchain.toml"));
    let global_capabilities = global_dir.map(|d| d.join("capabilities.toml"));

    Ok(ProjectConfig {
        toolchain: load_toolchain_config(
            global_toolchain.as_deref(),
            &project_dir.join("toolchain.toml"),
        )?,
        capabilities: load_capability_config(
            global_capabilities.as_deref(),
            &project_dir.join("capabilities.toml"),
        )?,
    })
}

/// Get the global config directory (~/.abi-conform).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the project config directory (.abi-conform).
pub fn project_config_dir(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toolchain_config_default() {
        let config = ToolchainConfig::default();
        assert!(config.toolchain.cc.is_none());
        assert!(config.toolchain.cflags.is_empty());
    }

    #[test]
    fn test_toolchain_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("toolchain.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain]
cc = "/usr/bin/clang"
target = "aarch64-unknown-linux-gnu"
sysroot = "/sysroots/aarch64"
cflags = ["-Wall", "-Wextra"]
include_dirs = ["/opt/include"]
"#,
        )
        .unwrap();

        let config: ToolchainConfig = load_toml(&config_path).unwrap();
        assert_eq!(config.toolchain.cc, Some(PathBuf::from("/usr/bin/clang")));
        assert_eq!(
            config.toolchain.target,
            Some("aarch64-unknown-linux-gnu".to_string())
        );
        assert_eq!(
            config.toolchain.sysroot,
            Some(PathBuf::from("/sysroots/aarch64"))
        );
        assert_eq!(config.toolchain.cflags, vec!["-Wall", "-Wextra"]);
        assert_eq!(config.toolchain.include_dirs, vec![PathBuf::from("/opt/include")]);
    }

    #[test]
    fn test_toolchain_config_merge() {
        let mut base = ToolchainConfig::default();
        base.toolchain.cc = Some(PathBuf::from("/usr/bin/gcc"));
        base.toolchain.cflags = vec!["-Wall".to_string()];

        let mut override_cfg = ToolchainConfig::default();
        override_cfg.toolchain.cc = Some(PathBuf::from("/usr/bin/clang"));

        base.merge(override_cfg);

        // cc should be overridden
        assert_eq!(base.toolchain.cc, Some(PathBuf::from("/usr/bin/clang")));
        // cflags should remain unchanged
        assert_eq!(base.toolchain.cflags, vec!["-Wall"]);
    }

    #[test]
    fn test_capability_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("capabilities.toml");

        std::fs::write(
            &config_path,
            r#"
unknown = "skip"

[structs]
ip_mreqn = false
linger = true

[headers]
"linux/errqueue.h" = false
"#,
        )
        .unwrap();

        let config: CapabilityConfig = load_toml(&config_path).unwrap();
        assert_eq!(config.unknown, Some(UnknownPolicy::Skip));
        assert_eq!(config.structs.get("ip_mreqn"), Some(&false));
        assert_eq!(config.structs.get("linger"), Some(&true));
        assert_eq!(config.headers.get("linux/errqueue.h"), Some(&false));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global");
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&global).unwrap();
        std::fs::create_dir_all(&project).unwrap();

        std::fs::write(
            global.join("toolchain.toml"),
            "[toolchain]\ncc = \"/usr/bin/gcc\"\ncflags = [\"-O2\"]\n",
        )
        .unwrap();
        std::fs::write(
            project.join("toolchain.toml"),
            "[toolchain]\ncflags = [\"-O0\"]\n",
        )
        .unwrap();
        std::fs::write(global.join("capabilities.toml"), "[structs]\nucred = false\n").unwrap();
        std::fs::write(project.join("capabilities.toml"), "[structs]\nucred = true\n").unwrap();

        let config = load_config_from(Some(&global), &project).unwrap();

        // Global cc should be preserved
        assert_eq!(config.toolchain.toolchain.cc, Some(PathBuf::from("/usr/bin/gcc")));
        // Project cflags should override global
        assert_eq!(config.toolchain.toolchain.cflags, vec!["-O0"]);
        assert_eq!(config.capabilities.structs.get("ucred"), Some(&true));
    }

    #[test]
    fn test_missing_config_is_default() {
        let tmp = TempDir::new().unwrap();

        let config = load_config_from(None, &tmp.path().join(CONFIG_DIR)).unwrap();
        assert!(config.toolchain.toolchain.cc.is_none());
        assert!(config.capabilities.structs.is_empty());
    }

    #[test]
    fn test_broken_capabilities_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("capabilities.toml"),
            "[structs]
ucred = no
",
        )
        .unwrap();

        let err = load_config_from(None, tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("capabilities.toml"));
    }

    #[test]
    fn test_broken_toolchain_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("toolchain.toml");
        std::fs::write(&path, "[toolchain\ncc = ").unwrap();

        assert!(load_toml_if_exists::<ToolchainConfig>(&path).is_err());
    }
}
