use crate::{error::HostError, input::HeldButton};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from a TOML file. Every key is optional; command-line
/// flags take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub bootrom: Option<PathBuf>,
    pub frames: Option<u64>,
    pub cycles: Option<u64>,
    pub realtime: bool,
    pub hold: Vec<HeldButton>,
    pub screenshot: Option<PathBuf>,
    pub serial: bool,
}

pub fn load_from_file(path: &Path) -> Result<HeadlessConfig, HostError> {
    let text = std::fs::read_to_string(path).map_err(|source| HostError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<HeadlessConfig>(&text).map_err(|source| HostError::Config {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_to_file(path: &Path, cfg: &HeadlessConfig) -> Result<(), HostError> {
    let write_err = |source| HostError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let text = toml::to_string_pretty(cfg).unwrap_or_default();
    std::fs::write(path, text).map_err(write_err)
}

/// Effective settings for one run, after merging the config file with the
/// command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rom: PathBuf,
    pub bootrom: Option<PathBuf>,
    pub frames: Option<u64>,
    pub cycles: Option<u64>,
    pub realtime: bool,
    pub hold: Vec<HeldButton>,
    pub screenshot: Option<PathBuf>,
    pub serial: bool,
    pub debug: bool,
}

impl Settings {
    /// Settings for `rom` with nothing overridden.
    pub fn for_rom(rom: PathBuf) -> Self {
        Self::from_config(rom, HeadlessConfig::default())
    }

    pub fn from_config(rom: PathBuf, cfg: HeadlessConfig) -> Self {
        Self {
            rom,
            bootrom: cfg.bootrom,
            frames: cfg.frames,
            cycles: cfg.cycles,
            realtime: cfg.realtime,
            hold: cfg.hold,
            screenshot: cfg.screenshot,
            serial: cfg.serial,
            debug: false,
        }
    }

    /// Snapshot of the settings that can be persisted to a config file.
    pub fn to_config(&self) -> HeadlessConfig {
        HeadlessConfig {
            bootrom: self.bootrom.clone(),
            frames: self.frames,
            cycles: self.cycles,
            realtime: self.realtime,
            hold: self.hold.clone(),
            screenshot: self.screenshot.clone(),
            serial: self.serial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frames = 30\nhold = [\"start\", \"a\"]").unwrap();
        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.frames, Some(30));
        assert_eq!(cfg.hold, vec![HeldButton::Start, HeldButton::A]);
        assert_eq!(cfg.cycles, None);
        assert!(!cfg.realtime);
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frames = \"many\"").unwrap();
        assert!(matches!(
            load_from_file(file.path()),
            Err(HostError::Config { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_from_file(&dir.path().join("absent.toml")),
            Err(HostError::Read { .. })
        ));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("headless.toml");
        let cfg = HeadlessConfig {
            bootrom: Some(PathBuf::from("dmg_boot.bin")),
            frames: Some(120),
            realtime: true,
            hold: vec![HeldButton::Down],
            serial: true,
            ..Default::default()
        };
        save_to_file(&path, &cfg).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), cfg);
    }
}
