use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::accompany::{Part, DEFAULT_BPM};
use crate::core::synth::effects::MasterSettings;
use crate::core::synth::preset::InstrumentPreset;
use crate::error::{Error, Result};

/// Everything the user can configure, persisted as pretty JSON. Fields
/// missing from the file take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bpm: u32,
    /// Spell note and key names with sharps rather than flats
    pub sharps: bool,
    pub midi_port: Option<String>,
    pub master: MasterSettings,
    pub keyboard: InstrumentPreset,
    pub drums: InstrumentPreset,
    pub chords: InstrumentPreset,
    pub bass: InstrumentPreset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            sharps: true,
            midi_port: None,
            master: MasterSettings::default(),
            keyboard: InstrumentPreset::keyboard(),
            drums: InstrumentPreset::drums(),
            chords: InstrumentPreset::chords(),
            bass: InstrumentPreset::bass(),
        }
    }
}

impl Settings {
    /// `<config dir>/piano-helper/settings.json`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| Error::Settings("could not find config directory".to_string()))?;
        path.push("piano-helper");
        path.push("settings.json");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        log::info!("saved settings to {}", path.display());
        Ok(())
    }

    /// Load from `path`. A missing file is created with the defaults; a file
    /// that cannot be read or parsed is reported and left untouched.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            if let Err(err) = settings.save(path) {
                log::warn!("could not write default settings: {err}");
            }
            return settings;
        }
        match Self::load(path) {
            Ok(settings) => {
                log::info!("loaded settings from {}", path.display());
                settings
            },
            Err(err) => {
                log::warn!("ignoring {}: {err}", path.display());
                Self::default()
            },
        }
    }

    pub fn preset(&self, part: Part) -> InstrumentPreset {
        match part {
            Part::Keyboard => self.keyboard,
            Part::Drums => self.drums,
            Part::Chords => self.chords,
            Part::Bass => self.bass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oscillator::Waveform;

    #[test]
    fn defaults_follow_the_instrument_voicings() {
        let settings = Settings::default();
        assert_eq!(settings.bpm, 120);
        assert_eq!(settings.preset(Part::Keyboard).waveform, Waveform::Square);
        assert_eq!(settings.preset(Part::Drums).waveform, Waveform::Noise);
        assert_eq!(settings.preset(Part::Bass).waveform, Waveform::Sine);
        assert!(Part::ALL.iter().all(|p| settings.preset(*p).amplitude == 0.1));
    }

    #[test]
    fn missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings::load_or_default(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "bpm": 90, "sharps": false }"#).unwrap();
        let settings = Settings::load_or_default(&path);
        assert_eq!(settings.bpm, 90);
        assert!(!settings.sharps);
        assert_eq!(settings.chords, InstrumentPreset::chords());
    }

    #[test]
    fn broken_file_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert!(matches!(Settings::load(&path), Err(Error::Settings(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
