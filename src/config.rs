use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_GRAPH_VERSION: &str = "v2.9";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";

pub const APP_ID_VAR: &str = "FACEBOOK_APP_ID";
pub const APP_SECRET_VAR: &str = "FACEBOOK_APP_SECRET";
pub const GRAPH_VERSION_VAR: &str = "FACEBOOK_GRAPH_VERSION";
pub const GRAPH_URL_VAR: &str = "FACEBOOK_GRAPH_URL";

/// App credentials and Graph endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub app_id: String,
    pub app_secret: String,
    pub graph_version: String,
    pub base_url: String,
}

impl Config {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            graph_version: DEFAULT_GRAPH_VERSION.to_string(),
            base_url: DEFAULT_GRAPH_URL.to_string(),
        }
    }

    /// Builds a config from already-resolved settings. Missing overrides fall
    /// back to [`DEFAULT_GRAPH_VERSION`] and [`DEFAULT_GRAPH_URL`].
    pub fn from_parts(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        graph_version: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        let mut config = Self::new(app_id, app_secret);
        if let Some(version) = graph_version {
            config.graph_version = version;
        }
        match base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }

    /// Reads `FACEBOOK_APP_ID` and `FACEBOOK_APP_SECRET`, plus the optional
    /// `FACEBOOK_GRAPH_VERSION` and `FACEBOOK_GRAPH_URL` overrides.
    ///
    /// For library callers. The CLI resolves the same variables through clap
    /// and hands them to [`Config::from_parts`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app_id = lookup(APP_ID_VAR).with_context(|| format!("{APP_ID_VAR} is not set"))?;
        let app_secret = lookup(APP_SECRET_VAR).with_context(|| format!("{APP_SECRET_VAR} is not set"))?;

        Ok(Self::from_parts(
            app_id,
            app_secret,
            lookup(GRAPH_VERSION_VAR),
            lookup(GRAPH_URL_VAR),
        ))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// App access token, used when no user or page token has been set.
    pub fn app_access_token(&self) -> String {
        format!("{}|{}", self.app_id, self.app_secret)
    }
}
