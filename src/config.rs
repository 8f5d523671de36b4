use crate::types::FactoryResetKey;
use anyhow::{Context, Result, anyhow, ensure};
use reqwest::Url;
use std::env;

const DEFAULT_GATEWAY_URL: &str = "http://192.168.4.1";
const DEFAULT_UPLOAD_FIELD_NAME: &str = "fileToUpload";
const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 4096;

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Gateway device to talk to
    pub device: DeviceConfig,

    /// Firmware and filesystem upload settings
    pub upload: UploadConfig,

    /// Device action settings
    pub actions: ActionConfig,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub base_url: Url,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub field_name: String,
    pub chunk_size: usize,
}

#[derive(Clone, Debug)]
pub struct ActionConfig {
    pub factory_reset_key: FactoryResetKey,
}

impl AppConfig {
    /// Load and validate the configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            device: DeviceConfig::load(&lookup)?,
            upload: UploadConfig::load(&lookup)?,
            actions: ActionConfig::load(&lookup)?,
        })
    }

    /// Point the configuration at another device, e.g. from the command line
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        self.device.base_url = parse_base_url(url)?;
        Ok(self)
    }
}

fn parse_base_url(url: &str) -> Result<Url> {
    let url = Url::parse(url).with_context(|| format!("failed to parse gateway url: {url}"))?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        "failed to use gateway url: unsupported scheme {}",
        url.scheme()
    );
    Ok(url)
}

impl DeviceConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        let base_url = parse_base_url(&url).context("failed to parse GATEWAY_URL")?;

        Ok(Self { base_url })
    }
}

impl UploadConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let field_name =
            lookup("UPLOAD_FIELD_NAME").unwrap_or_else(|| DEFAULT_UPLOAD_FIELD_NAME.to_string());
        ensure!(
            !field_name.trim().is_empty(),
            "failed to parse UPLOAD_FIELD_NAME: must not be empty"
        );

        let chunk_size = match lookup("UPLOAD_CHUNK_SIZE") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .context("failed to parse UPLOAD_CHUNK_SIZE: invalid format")?,
            None => DEFAULT_UPLOAD_CHUNK_SIZE,
        };
        ensure!(
            chunk_size > 0,
            "failed to parse UPLOAD_CHUNK_SIZE: must be greater than zero"
        );

        Ok(Self {
            field_name,
            chunk_size,
        })
    }
}

impl ActionConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let factory_reset_key = match lookup("FACTORY_RESET_KEY") {
            Some(value) => value
                .parse::<FactoryResetKey>()
                .map_err(|e| anyhow!("failed to parse FACTORY_RESET_KEY: {e}"))?,
            None => FactoryResetKey::default(),
        };

        Ok(Self { factory_reset_key })
    }
}
