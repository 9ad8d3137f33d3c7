use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

use dopewars_game::constants::REFERENCE_DAILY_INTEREST_RATE;
use dopewars_game::{ConfigError, DataError, DataLoader, EconomyConfig, ReferenceData};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reads reference tables and economy settings from JSON files, falling
/// back to the compiled-in defaults for anything not given.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    pub data_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    /// Switch on loan interest at the reference rate unless the config sets one
    pub interest: bool,
}

impl FileLoader {
    /// Load everything once so every session can share it.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or fails validation.
    pub fn preload(&self) -> Result<Preloaded, LoaderError> {
        Ok(Preloaded {
            data: self.load_reference_data()?,
            config: self.load_economy_config()?,
        })
    }
}

fn read(path: &Path) -> Result<String, LoaderError> {
    fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl DataLoader for FileLoader {
    type Error = LoaderError;

    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
        match &self.data_path {
            Some(path) => Ok(ReferenceData::from_json(&read(path)?)?),
            None => Ok(ReferenceData::builtin()),
        }
    }

    fn load_economy_config(&self) -> Result<EconomyConfig, Self::Error> {
        let mut config = match &self.config_path {
            Some(path) => EconomyConfig::from_json(&read(path)?)?,
            None => EconomyConfig::default(),
        };
        if self.interest && config.daily_interest_rate.is_none() {
            config.daily_interest_rate = Some(REFERENCE_DAILY_INTEREST_RATE);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Already-loaded tables handed to the engine for every run.
#[derive(Debug, Clone)]
pub struct Preloaded {
    pub data: ReferenceData,
    pub config: EconomyConfig,
}

impl DataLoader for Preloaded {
    type Error = Infallible;

    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
        Ok(self.data.clone())
    }

    fn load_economy_config(&self) -> Result<EconomyConfig, Self::Error> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "dopewars-loader-{label}-{}.json",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_paths() {
        let preloaded = FileLoader::default().preload().unwrap();
        assert_eq!(preloaded.data, ReferenceData::builtin());
        assert_eq!(preloaded.config, EconomyConfig::default());
    }

    #[test]
    fn interest_flag_fills_the_reference_rate() {
        let loader = FileLoader {
            interest: true,
            ..FileLoader::default()
        };
        let config = loader.load_economy_config().unwrap();
        assert_eq!(config.daily_interest_rate, Some(REFERENCE_DAILY_INTEREST_RATE));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let path = temp_file("config", r#"{ "total_days": 7, "daily_interest_rate": 0.02 }"#);
        let loader = FileLoader {
            config_path: Some(path.clone()),
            interest: true,
            ..FileLoader::default()
        };
        let config = loader.load_economy_config().unwrap();
        assert_eq!(config.total_days, 7);
        assert_eq!(config.daily_interest_rate, Some(0.02));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_files_report_their_path() {
        let loader = FileLoader {
            data_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..FileLoader::default()
        };
        let err = loader.preload().unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
