use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cli::GlobalArgs;

pub const DEFAULT_DOMAIN: &str = "api.otlegalhold.com";
pub const DEFAULT_PORT: u16 = 443;

/// Connection settings for the remote service. Loaded from a JSON config
/// file when `--config` is given, otherwise assembled from flags and their
/// environment fallbacks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub tenant: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub skip_verify: bool,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.domain, self.port)
    }
}

pub fn resolve(args: &GlobalArgs) -> Result<ClientConfig> {
    let config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => ClientConfig {
            domain: args.domain.clone(),
            port: args.port,
            http_proxy: args.proxy.clone().unwrap_or_default(),
            tenant: args.tenant.clone().unwrap_or_default(),
            auth_token: args.auth_token.clone().unwrap_or_default(),
            skip_verify: args.skip_verify,
        },
    };

    if config.tenant.trim().is_empty() {
        bail!("tenant is required (--tenant, LHN_TENANT or config file)");
    }

    info!(
        domain = %config.domain,
        port = config.port,
        tenant = %config.tenant,
        proxy = !config.http_proxy.is_empty(),
        "using client config"
    );

    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    debug!(path = %path.display(), "loading client config");
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn config_file_uses_camel_case_keys_and_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"domain": "lh.example.com", "tenant": "acme", "authToken": "secret", "httpProxy": "http://proxy:3128"}}"#
        )
        .expect("write config");

        let config = load_config_file(file.path()).expect("config should parse");
        assert_eq!(config.domain, "lh.example.com");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.tenant, "acme");
        assert_eq!(config.auth_token, "secret");
        assert_eq!(config.http_proxy, "http://proxy:3128");
        assert!(!config.skip_verify);
        assert_eq!(config.base_url(), "https://lh.example.com:443");
    }
}
