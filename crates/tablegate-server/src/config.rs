//! Command-line flags and their layering over the YAML configuration.

use std::path::PathBuf;

use clap::Parser;
use tablegate_core::{AuthMode, ConfigError, TablegateConfig};

/// Policy-gated HTTP gateway for table operations.
#[derive(Debug, Default, Parser)]
#[command(name = "tablegate-server", version, about)]
pub struct Cli {
    /// YAML configuration file.
    #[arg(short, long, env = "TABLEGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long, env = "TABLEGATE_BIND")]
    pub bind: Option<String>,

    /// Policy document: inline JSON or a file path.
    #[arg(long, env = "POLICY_JSON")]
    pub policy: Option<String>,

    /// Store connection URL.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Identity mode: none, header or id_token.
    #[arg(long, env = "AUTH_MODE")]
    pub auth_mode: Option<AuthMode>,

    /// Audience required in bearer tokens.
    #[arg(long, env = "MCP_AUDIENCE")]
    pub audience: Option<String>,

    /// Upper bound applied to SELECT limits.
    #[arg(long, env = "MAX_SELECT_LIMIT")]
    pub max_select_limit: Option<i64>,

    /// Permit DELETE without filters.
    #[arg(long, env = "ALLOW_FULL_TABLE_DELETE")]
    pub allow_full_table_delete: Option<bool>,
}

impl Cli {
    /// Read the config file (if any), then apply flag and env overrides.
    pub fn load_config(&self) -> Result<TablegateConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => TablegateConfig::from_file(path)?,
            None => TablegateConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut TablegateConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(policy) = &self.policy {
            config.policy.source = Some(policy.clone());
        }
        if let Some(url) = &self.database_url {
            config.store.database_url = Some(url.clone());
            config.store.database_url_env = None;
        }
        if let Some(mode) = self.auth_mode {
            config.auth.mode = mode;
        }
        if let Some(audience) = &self.audience {
            config.auth.audience = Some(audience.clone());
        }
        if let Some(limit) = self.max_select_limit {
            config.guardrails.max_select_limit = limit;
        }
        if let Some(allow) = self.allow_full_table_delete {
            config.guardrails.allow_full_table_delete = allow;
        }
    }
}
