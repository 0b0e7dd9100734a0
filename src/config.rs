use crate::storage::write_atomic;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "blobagotchi")]
#[command(about = "A blob that needs feeding, petting and sleep")]
pub struct Cli {
    /// Directory holding the save, settings and log (default: platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Print the pet's current stats and exit
    #[arg(long, default_value_t = false)]
    pub status: bool,

    /// Log at info level
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Log at debug level
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Force monochrome
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub awake_tick_ms: u64,
    pub sleep_tick_ms: u64,
    pub toast_ms: u64,
    pub fps_cap: u32,
    pub enable_color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            awake_tick_ms: 5000,
            sleep_tick_ms: 3000,
            toast_ms: 2000,
            fps_cap: 30,
            enable_color: true,
        }
    }
}

impl Settings {
    /// Decay cadence for the given sleep state. Sleeping ticks faster.
    pub fn tick_period(&self, sleeping: bool) -> Duration {
        let ms = if sleeping {
            self.sleep_tick_ms
        } else {
            self.awake_tick_ms
        };
        Duration::from_millis(ms.max(1))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths(override_dir: Option<&Path>) -> Result<Paths> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => ProjectDirs::from("com", "blobagotchi", "Blobagotchi")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("blobagotchi.log"),
        data_dir: dir,
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
        tracing::warn!(path = %path.display(), "ignoring unreadable settings file");
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let data = serde_json::to_vec_pretty(s)?;
    write_atomic(path, &data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sleeping_cadence_is_faster() {
        let s = Settings::default();
        assert_eq!(s.tick_period(false), Duration::from_secs(5));
        assert_eq!(s.tick_period(true), Duration::from_secs(3));
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"toast_ms": 500}"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.toast_ms, 500);
        assert_eq!(s.awake_tick_ms, 5000);
    }

    #[test]
    fn settings_survive_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings {
            enable_color: false,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
    }

    #[test]
    fn override_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let paths = project_paths(Some(dir.path().join("nested").as_path())).unwrap();
        assert!(paths.data_dir.is_dir());
        assert_eq!(paths.settings_path, paths.data_dir.join("settings.json"));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["blobagotchi", "--status", "--data-dir", "/tmp/x"]);
        assert!(cli.status);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(!cli.verbose);
    }
}
