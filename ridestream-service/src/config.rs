// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use ridestream_core::SessionIndex;
use serde::Deserialize;
use std::path::PathBuf;

/// Where artifacts go and how their download links are built.
///
/// ```toml
/// export_dir = "/var/lib/ridestream/exports"
/// public_base_url = "https://rides.example.org/download"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Directory for `ride_<n>.csv` files; artifacts stay in memory when unset.
    pub export_dir: Option<PathBuf>,
    pub public_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            export_dir: None,
            public_base_url: "/download".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse from TOML; missing keys keep their defaults.
    pub fn from_toml_str(config: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(config)
    }

    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = base.into();
        self
    }

    /// Download link for a session, using its 1-based number.
    #[must_use]
    pub fn download_url(&self, index: SessionIndex) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            index.external()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_uses_external_number() {
        let config = ServiceConfig::default();
        assert_eq!(config.download_url(SessionIndex(0)), "/download/1");
        assert_eq!(config.download_url(SessionIndex(41)), "/download/42");
    }

    #[test]
    fn trailing_slash_in_base_is_ignored() {
        let config = ServiceConfig::default().with_public_base_url("http://host/files/");
        assert_eq!(config.download_url(SessionIndex(2)), "http://host/files/3");
    }

    #[test]
    fn toml_sets_export_dir() {
        let config = ServiceConfig::from_toml_str(r#"export_dir = "/tmp/rides""#).unwrap();
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/rides")));
        assert_eq!(config.public_base_url, "/download");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ServiceConfig::from_toml_str("port = 3000").is_err());
    }
}
