use anyhow::{Error, format_err};
use serde::Deserialize;
use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use stack_string::StackString;

use crate::timezone::TimeZone;

const APP_NAME: &str = "gcal_app_rust";

#[derive(Debug, Deserialize)]
pub struct ConfigInner {
    #[serde(default = "default_gcal_secret")]
    pub gcal_secret_file: PathBuf,
    #[serde(default = "default_gcal_token_path")]
    pub gcal_token_path: PathBuf,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: StackString,
    pub default_time_zone: Option<TimeZone>,
    #[serde(default = "default_participants_width")]
    pub participants_width: usize,
    #[serde(default = "default_summary_width")]
    pub summary_width: usize,
}

#[derive(Debug, Clone)]
pub struct Config(Arc<ConfigInner>);

fn default_gcal_secret() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("credentials.json")
}
fn default_gcal_token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gcal")
}
fn default_calendar_id() -> StackString {
    "primary".into()
}
fn default_participants_width() -> usize {
    25
}
fn default_summary_width() -> usize {
    45
}

impl Config {
    pub fn init_config() -> Result<Self, Error> {
        let fname = Path::new("config.env");
        let config_dir = dirs::config_dir().ok_or_else(|| format_err!("No CONFIG directory"))?;
        let default_fname = config_dir.join(APP_NAME).join("config.env");

        let env_file = if fname.exists() {
            fname
        } else {
            &default_fname
        };

        dotenvy::dotenv().ok();

        if env_file.exists() {
            dotenvy::from_path(env_file).ok();
        }

        let conf: ConfigInner = envy::from_env()?;

        Ok(Self(Arc::new(conf)))
    }

    /// Build a config from explicit key/value pairs instead of the process
    /// environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let conf: ConfigInner =
            envy::from_iter(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))?;
        Ok(Self(Arc::new(conf)))
    }

    /// The configured zone, or the system zone when none is set.
    #[must_use]
    pub fn time_zone(&self) -> TimeZone {
        self.default_time_zone.unwrap_or_else(TimeZone::local)
    }
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Error;
    use std::path::Path;

    use crate::config::Config;

    #[test]
    fn test_config_defaults() -> Result<(), Error> {
        let config = Config::from_pairs(Vec::<(String, String)>::new())?;
        assert_eq!(config.calendar_id.as_str(), "primary");
        assert_eq!(config.participants_width, 25);
        assert_eq!(config.summary_width, 45);
        assert!(config.default_time_zone.is_none());
        assert!(config.gcal_token_path.ends_with(".gcal"));
        Ok(())
    }

    #[test]
    fn test_config_from_pairs() -> Result<(), Error> {
        let config = Config::from_pairs([
            ("CALENDAR_ID", "team@example.com"),
            ("DEFAULT_TIME_ZONE", "America/New_York"),
            ("GCAL_TOKEN_PATH", "/tmp/gcal"),
            ("SUMMARY_WIDTH", "30"),
        ])?;
        assert_eq!(config.calendar_id.as_str(), "team@example.com");
        assert_eq!(config.time_zone().to_string(), "America/New_York");
        assert_eq!(config.gcal_token_path, Path::new("/tmp/gcal"));
        assert_eq!(config.summary_width, 30);

        assert!(Config::from_pairs([("DEFAULT_TIME_ZONE", "Nowhere/Special")]).is_err());
        Ok(())
    }
}
