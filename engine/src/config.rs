use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{PipelineError, open_ai::DEFAULT_API_BASE, output::DEFAULT_OUTPUT_DIR};

pub const APP_NAME: &str = "content_crew";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Settings that are safe to keep in a file. The API key is not one of them,
/// see [`Credentials`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub output_dir: PathBuf,
    /// Tried before the usual system fonts
    pub font_path: Option<PathBuf>,
    /// `false` skips downloading and compositing the image
    pub compose_image: bool,
    pub open_result: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            font_path: None,
            compose_image: true,
            open_result: true,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Reads the key from the environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PipelineError::Configuration(format!("{API_KEY_VAR} is not set"))
            })?;

        Ok(Self { api_key })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(format!("{APP_NAME}.ron")))
}

/// Loads `path`, or the default config file. Only the default file may be
/// missing, in which case the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_ron_file(path),
        None => {
            let path = config_path()?;
            if path.exists() {
                load_ron_file(&path)
            } else {
                debug!("No config at {}, using defaults", path.display());
                Ok(Config::default())
            }
        }
    }
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(PipelineError::io(parent))?;
    }
    save_ron_file(path, cfg)
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path).map_err(PipelineError::io(path))?;
    ron::from_str(&src)
        .map_err(|e| PipelineError::Configuration(format!("{}: {e}", path.display())).into())
}

pub fn save_ron_file<T: Serialize>(path: &Path, x: &T) -> Result<()> {
    let src = ron::ser::to_string_pretty(x, ron::ser::PrettyConfig::default())
        .wrap_err("serializing config")?;
    fs::write(path, src).map_err(PipelineError::io(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let err = Credentials::from_lookup(|_| None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Configuration(msg)) if msg.contains(API_KEY_VAR)
        ));
    }

    #[test]
    fn blank_credential_is_rejected() {
        assert!(Credentials::from_lookup(|_| Some("   ".into())).is_err());
    }

    #[test]
    fn credential_is_read_and_redacted() {
        let creds = Credentials::from_lookup(|name| {
            (name == API_KEY_VAR).then(|| " sk-test ".to_string())
        })
        .unwrap();

        assert_eq!(creds.api_key(), "sk-test");
        assert!(!format!("{creds:?}").contains("sk-test"));
    }

    #[test]
    fn config_round_trips_through_ron() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg").join("content_crew.ron");
        let cfg = Config {
            text_model: "gpt-4o".into(),
            font_path: Some("/fonts/Inter.ttf".into()),
            compose_image: false,
            ..Config::default()
        };

        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("partial.ron");
        fs::write(&path, r#"(output_dir: "renders")"#).unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("renders"));
        assert_eq!(cfg.text_model, DEFAULT_TEXT_MODEL);
        assert!(cfg.compose_image);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&tmp.path().join("nope.ron"))).is_err());
    }
}
