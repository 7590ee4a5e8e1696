use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesTui";
const APP_NAME: &str = "recently-deleted";

pub const CONFIG_ENV: &str = "RECENTLY_DELETED_CONFIG";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    /// Lays every path out under `root`; used by hosts with a sandboxed
    /// container directory and by tests.
    pub fn rooted(root: &Path) -> Self {
        let config_dir = root.join("config");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.log_dir, &self.state_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Days a deleted category stays recoverable (0 = until purged by hand)
    pub retention_days: u32,
    /// What "delete/recover selected" does when nothing is selected
    pub empty_selection: EmptySelectionPolicy,
    pub search: SearchOptions,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retention_days: 30,
            empty_selection: EmptySelectionPolicy::ActOnAll,
            search: SearchOptions::default(),
            log_level: "info".into(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if EnvFilter::try_new(&self.log_level).is_err() {
            tracing::warn!(level = %self.log_level, "invalid log level in config, falling back to info");
            self.log_level = "info".into();
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmptySelectionPolicy {
    /// Act on every displayed category.
    #[default]
    ActOnAll,
    /// Leave the store untouched.
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub trim_whitespace: bool,
    pub highlight_matches: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            trim_whitespace: true,
            highlight_matches: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_or_init_writes_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted(temp.path()));
        let cfg = loader.load_or_init()?;
        assert_eq!(cfg.retention_days, 30);
        assert_eq!(cfg.empty_selection, EmptySelectionPolicy::ActOnAll);
        assert!(loader.paths().config_file.exists());
        assert!(loader.paths().log_dir.is_dir());

        let reloaded = loader.load()?;
        assert_eq!(reloaded.log_level, "info");
        assert!(reloaded.search.trim_whitespace);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "empty_selection = \"ignore\"\n\n[search]\nhighlight_matches = false\n",
        )?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.empty_selection, EmptySelectionPolicy::Ignore);
        assert!(!cfg.search.highlight_matches);
        assert!(cfg.search.trim_whitespace);
        assert_eq!(cfg.retention_days, 30);
        Ok(())
    }

    #[test]
    fn invalid_log_level_falls_back_to_info() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "log_level = \"vm=loud\"\n")?;
        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.log_level, "info");
        Ok(())
    }

    #[test]
    fn malformed_toml_reports_context() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "retention_days = \"soon\"\n")?;
        let err = ConfigLoader::with_paths(paths)
            .load()
            .expect_err("type mismatch");
        assert!(err.to_string().contains("parsing config toml"));
        Ok(())
    }
}
