use crate::encoding::{DEFAULT_ENCODINGS, EncodingProber};
use crate::errors::Result;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "regsweep.yaml";

/// Settings read from a YAML configuration file. Every key is optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Candidate encodings, in the order they are tried.
    #[serde(default)]
    pub encodings: Option<Vec<String>>,
    /// Honour `.gitignore` files when walking directories.
    #[serde(default)]
    pub gitignore: bool,
    /// Default extension filter for directory inputs.
    #[serde(default)]
    pub extension: Option<String>,
}

impl Settings {
    /// Builds the encoding prober, preferring `overrides` (from the command
    /// line) over the configured list, and the built-in list over both.
    pub fn prober(&self, overrides: &[String]) -> Result<EncodingProber> {
        if !overrides.is_empty() {
            return EncodingProber::from_labels(overrides);
        }
        match &self.encodings {
            Some(labels) => EncodingProber::from_labels(labels.as_slice()),
            None => EncodingProber::from_labels(&DEFAULT_ENCODINGS[..]),
        }
    }
}

/// A utility for locating and loading the configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file.
    ///
    /// The search order is:
    /// 1. `explicit`, which must exist when given.
    /// 2. `regsweep.yaml` in `working_dir`.
    /// 3. `regsweep/config.yaml` in the user's configuration directory.
    ///
    /// Returns `Ok(None)` when no implicit file exists.
    pub fn find_config(explicit: Option<&Path>, working_dir: &Path) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(Some(path.to_path_buf()));
            }
            let in_working_dir = working_dir.join(path);
            if in_working_dir.is_file() {
                return Ok(Some(in_working_dir));
            }
            return Err(format!("Config file '{}' not found", path.display()).into());
        }

        let local = working_dir.join(LOCAL_CONFIG);
        if local.is_file() {
            return Ok(Some(local));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("regsweep").join("config.yaml");
            if user.is_file() {
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    /// Loads `Settings` from a YAML file.
    pub fn load(path: &Path) -> Result<Settings> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Finds and loads the configuration, falling back to defaults when there
    /// is no file to load.
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Settings> {
        match Self::find_config(explicit, working_dir)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Settings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;
    use crate::errors::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCAL_CONFIG);
        fs::write(
            &path,
            "encodings: [utf-8, shift_jis]\ngitignore: true\nextension: md\n",
        )
        .unwrap();

        let settings = ConfigLoader::resolve(None, temp_dir.path()).unwrap();
        assert!(settings.gitignore);
        assert_eq!(settings.extension.as_deref(), Some("md"));

        let prober = settings.prober(&[]).unwrap();
        assert_eq!(
            prober.candidates(),
            &[TextEncoding::Utf8, TextEncoding::Other(encoding_rs::SHIFT_JIS)]
        );
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::default();
        assert!(!settings.gitignore);
        assert_eq!(
            settings.prober(&[]).unwrap().candidates(),
            EncodingProber::default().candidates()
        );
    }

    #[test]
    fn test_command_line_encodings_win() {
        let settings = Settings {
            encodings: Some(vec!["utf-8".into()]),
            ..Settings::default()
        };
        let prober = settings.prober(&["latin1".to_string()]).unwrap();
        assert_eq!(prober.candidates(), &[TextEncoding::Latin1]);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::find_config(Some(Path::new("absent.yaml")), temp_dir.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, "encoding: utf-8\n").unwrap();
        assert!(matches!(ConfigLoader::load(&path), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_bad_label_surfaces() {
        let settings = Settings {
            encodings: Some(vec!["ebcdic-martian".into()]),
            ..Settings::default()
        };
        assert!(matches!(settings.prober(&[]), Err(Error::UnknownEncoding(_))));
    }
}
