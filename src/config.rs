//! Contains structs for `wfdump.toml`.

use std::{fs::read_to_string, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use toml::from_str;
use wavefront_stream::ParseOptions;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parse: ParseOptions,
    pub libraries: LibraryConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Whether `mtllib` lines are followed when no MTL file is given.
    pub follow: bool,

    /// Directories searched after the one containing the OBJ file.
    pub search_paths: Vec<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> LibraryConfig {
        LibraryConfig {
            follow: true,
            search_paths: vec![],
        }
    }
}

impl Config {
    /// Reads the configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("{} not found, using default configuration", path.display());
            return Ok(Config::default());
        }

        let config = from_str(&read_to_string(path).context("Failed to read configuration file")?)
            .context("Failed to parse configuration file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: Config = from_str(
            r#"
            [parse]
            default_group = "root"
            skip_missing_libraries = true

            [libraries]
            search_paths = ["materials", "../shared"]
            "#,
        )
        .unwrap();

        assert_eq!(config.parse.default_group, "root");
        assert_eq!(config.parse.default_material, "default");
        assert!(config.parse.skip_missing_libraries);
        assert!(config.libraries.follow);
        assert_eq!(
            config.libraries.search_paths,
            [PathBuf::from("materials"), PathBuf::from("../shared")]
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.parse, ParseOptions::default());
        assert!(config.libraries.search_paths.is_empty());
    }
}
