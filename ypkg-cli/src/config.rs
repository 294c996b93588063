//! Configuration file loading for ypkg.
//!
//! Discovers and loads `ypkg.toml` from the working directory, or from an
//! explicit `--config` path. Command-line flags take precedence.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;
use ypkg_core::{Codec, FormatVersion, PackageSettings};

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "ypkg.toml";

/// Top-level configuration from ypkg.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct YpkgConfig {
    /// Default format versions.
    pub format: FormatConfig,

    /// Collection codec settings.
    pub codec: CodecConfig,
}

/// `[format]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Version `init` writes.
    pub init: Option<FormatVersion>,

    /// Version `convert` targets without `--to`.
    pub convert_target: Option<FormatVersion>,
}

/// `[codec]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Variant key that stands for the default entry in keyed collections.
    pub reserved_variant: Option<String>,
}

/// Find `ypkg.toml` in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<YpkgConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<YpkgConfig> {
    let config: YpkgConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config when given (it must exist), otherwise whatever
/// `dir` holds, otherwise defaults.
pub fn load_or_default(explicit: Option<&Utf8Path>, dir: &Utf8Path) -> anyhow::Result<YpkgConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(YpkgConfig::default()),
    }
}

/// Builder for merging the config file with command-line flags.
pub struct ConfigMerger {
    config: YpkgConfig,
}

impl ConfigMerger {
    pub fn new(config: YpkgConfig) -> Self {
        Self { config }
    }

    /// Produce core settings. `init` and `convert_target` come from flags
    /// and win over the file when present.
    pub fn merge(
        self,
        init: Option<FormatVersion>,
        convert_target: Option<FormatVersion>,
    ) -> anyhow::Result<PackageSettings> {
        let defaults = PackageSettings::default();

        let codec = match self.config.codec.reserved_variant {
            Some(key) if key.trim().is_empty() => {
                anyhow::bail!("codec.reserved_variant must not be empty")
            }
            Some(key) => Codec::new(key),
            None => defaults.codec,
        };

        Ok(PackageSettings {
            codec,
            init_version: init
                .or(self.config.format.init)
                .unwrap_or(defaults.init_version),
            convert_target: convert_target
                .or(self.config.format.convert_target)
                .unwrap_or(defaults.convert_target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[format]
init = 3
convert_target = 2

[codec]
reserved_variant = "main"
"#;
        let config = parse_config(contents).unwrap();
        assert_eq!(config.format.init, Some(FormatVersion::V3));
        assert_eq!(config.format.convert_target, Some(FormatVersion::V2));
        assert_eq!(config.codec.reserved_variant.as_deref(), Some("main"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        let settings = ConfigMerger::new(config).merge(None, None).unwrap();
        assert_eq!(settings, PackageSettings::default());
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let err = parse_config("[format]\ninit = 4\n").unwrap_err();
        assert!(format!("{err:#}").contains("unsupported format version 4"), "{err:#}");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("[format]\ninitial = 3\n").is_err());
    }

    #[test]
    fn test_cli_wins_over_file() {
        let config = parse_config("[format]\ninit = 3\nconvert_target = 2\n").unwrap();
        let settings = ConfigMerger::new(config)
            .merge(Some(FormatVersion::V2), None)
            .unwrap();
        assert_eq!(settings.init_version, FormatVersion::V2);
        assert_eq!(settings.convert_target, FormatVersion::V2);
        assert_eq!(settings.codec, Codec::default());
    }

    #[test]
    fn test_empty_reserved_variant_is_an_error() {
        let config = parse_config("[codec]\nreserved_variant = \"  \"\n").unwrap();
        assert!(ConfigMerger::new(config).merge(None, None).is_err());
    }

    #[test]
    fn test_discover_config_in_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = utf8(&temp);
        assert!(discover_config(&dir).is_none());

        fs::write(dir.join(CONFIG_FILE_NAME), "[codec]\nreserved_variant = \"*\"\n").unwrap();
        assert_eq!(discover_config(&dir), Some(dir.join(CONFIG_FILE_NAME)));

        let config = load_or_default(None, &dir).unwrap();
        assert_eq!(config.codec.reserved_variant.as_deref(), Some("*"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let dir = utf8(&temp);
        let missing = dir.join("other.toml");
        let err = load_or_default(Some(&missing), &dir).unwrap_err();
        assert!(format!("{err:#}").contains("other.toml"), "{err:#}");
    }
}
