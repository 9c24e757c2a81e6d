use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::url::cdn;
use crate::url::errors::UrlError;

/// How URL building reports structural failures.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Return the typed error to the caller.
    #[default]
    Strict,
    /// Log the error and hand back no URL.
    Permissive,
}

#[derive(Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FileboostConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub patch_image_tag: bool,
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl fmt::Debug for FileboostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("FileboostConfig")
            .field("project_id", &self.project_id)
            .field("token", &token)
            .field("patch_image_tag", &self.patch_image_tag)
            .field("error_mode", &self.error_mode)
            .finish()
    }
}

impl FileboostConfig {
    pub fn new(project_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn with_patch_image_tag(mut self, patch_image_tag: bool) -> Self {
        self.patch_image_tag = patch_image_tag;
        self
    }

    /// `FILEBOOST_PROJECT_ID` and `FILEBOOST_TOKEN`; missing variables leave
    /// the field empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.fill_from(|key| std::env::var(key).ok());
        config
    }

    /// Reads a TOML file, then fills empty secrets from the environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read config file {}", path.display()))?;
        let mut config: FileboostConfig = toml::from_str(&contents)
            .with_context(|| format!("Couldn't parse config file {}", path.display()))?;
        config.fill_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fills empty secrets from `lookup`, keyed by environment variable name.
    pub fn fill_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.project_id.is_empty() {
            self.project_id = lookup(cdn::PROJECT_ID_ENV_KEY).unwrap_or_default();
        }
        if self.token.is_empty() {
            self.token = lookup(cdn::TOKEN_ENV_KEY).unwrap_or_default();
        }
    }

    pub fn base_url(&self) -> &'static str {
        cdn::BASE_URL
    }

    pub fn is_valid(&self) -> bool {
        !self.project_id.is_empty() && !self.token.is_empty()
    }

    pub fn validate(&self) -> Result<(), UrlError> {
        match (self.project_id.is_empty(), self.token.is_empty()) {
            (false, false) => Ok(()),
            (true, _) => Err(UrlError::ConfigurationInvalid(
                "project_id is missing".to_string(),
            )),
            (false, true) => Err(UrlError::ConfigurationInvalid("token is missing".to_string())),
        }
    }
}
