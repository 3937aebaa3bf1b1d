use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Values loadable from a TOML configuration file. Every field is optional;
/// anything missing falls back to the CLI arguments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub uploads_dir: Option<String>,
    pub port: Option<u16>,
    pub skip_seeding: Option<bool>,
}

impl FileConfig {
    pub fn load<T: AsRef<Path>>(path: T) -> Result<FileConfig> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&raw)?)
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub port: u16,
    pub skip_seeding: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub port: u16,
    pub skip_seeding: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let uploads_dir = file
            .uploads_dir
            .map(PathBuf::from)
            .or_else(|| cli.uploads_dir.clone())
            .unwrap_or_else(|| db_dir.join("uploads"));

        let port = file.port.unwrap_or(cli.port);
        let skip_seeding = file.skip_seeding.unwrap_or(cli.skip_seeding);

        Ok(AppConfig {
            db_dir,
            uploads_dir,
            port,
            skip_seeding,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.db_dir.join("content.db")
    }

    pub fn server_db_path(&self) -> PathBuf {
        self.db_dir.join("server.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_values_override_cli_values() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            uploads_dir: None,
            port: 3001,
            skip_seeding: false,
        };
        let file = FileConfig {
            db_dir: None,
            uploads_dir: None,
            port: Some(8080),
            skip_seeding: Some(true),
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.skip_seeding);
        assert_eq!(config.uploads_dir, temp_dir.path().join("uploads"));
        assert_eq!(config.user_db_path(), temp_dir.path().join("user.db"));
    }

    #[test]
    fn missing_db_dir_is_an_error() {
        let cli = CliConfig::default();
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/definitely/not/a/real/dir")),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn loads_toml_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "port = 9000\nskip_seeding = true\n").unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.port, Some(9000));
        assert_eq!(file.skip_seeding, Some(true));
        assert!(file.db_dir.is_none());
    }
}
