//! Bridge configuration.
//!
//! Loaded from a TOML file with `${VAR}` environment interpolation, or
//! assembled directly from environment variables for fileless startup
//! (`GITHUB_TOKEN`, `GITHUB_ORG`, `PORT`). Validated once at startup; the
//! process exits non-zero when the token or organization is absent.

use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
};

use serde::Deserialize;

/// Top-level configuration for the SCIM bridge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// GitHub API credentials and organization.
    pub github: GitHubConfig,

    /// Audit log pipeline settings.
    pub audit: AuditConfig,

    /// Logging settings.
    pub log: LogConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: BridgeConfig = toml::from_str(&expanded)?;

        config.validate()?;
        Ok(config)
    }

    /// Assemble configuration from environment variables.
    ///
    /// Honors `GITHUB_TOKEN`, `GITHUB_ORG`, `PORT` (default 3000), and
    /// `GITHUB_API_URL` for GitHub Enterprise or test overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = BridgeConfig {
            github: GitHubConfig {
                token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
                org: std::env::var("GITHUB_ORG").unwrap_or_default(),
                ..GitHubConfig::default()
            },
            ..BridgeConfig::default()
        };

        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.github.api_base_url = url;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid PORT value: {}", port)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.github.token.is_empty() {
            return Err(ConfigError::Validation(
                "github.token (or GITHUB_TOKEN) must be set".into(),
            ));
        }
        if self.github.org.is_empty() {
            return Err(ConfigError::Validation(
                "github.org (or GITHUB_ORG) must be set".into(),
            ));
        }
        url::Url::parse(&self.github.api_base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "github.api_base_url is not a valid URL ({}): {}",
                self.github.api_base_url, e
            ))
        })?;

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// Personal access token or GitHub App installation token with
    /// `admin:org` scope.
    pub token: String,
    /// Organization slug to provision against.
    pub org: String,
    /// API base URL; override for GitHub Enterprise.
    pub api_base_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            org: String::new(),
            api_base_url: "https://api.github.com".to_string(),
        }
    }
}

/// Audit log pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    pub enabled: bool,
    /// Directory for the date-partitioned JSON-lines files.
    pub directory: String,
    /// Maximum pending events before new events are dropped.
    pub max_pending_events: usize,
    /// Flush interval in milliseconds.
    pub flush_interval_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "./logs".to_string(),
            max_pending_events: 10_000,
            flush_interval_ms: 1_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level to log.
    pub level: LogLevel,
    /// Console output format.
    pub format: LogFormat,
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Console log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips variables that appear after a `#` comment on the same line.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let matched = cap.get(0).expect("whole match");

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && matched.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..matched.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = matched.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = BridgeConfig::from_toml(
            r#"
            [github]
            token = "ghp_abc"
            org = "acme"
            "#,
        )
        .unwrap();

        assert_eq!(config.github.org, "acme");
        assert_eq!(config.github.api_base_url, "https://api.github.com");
        assert_eq!(config.server.port, 3000);
        assert!(config.audit.enabled);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let err = BridgeConfig::from_toml(
            r#"
            [github]
            org = "acme"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("github.token"));
    }

    #[test]
    fn test_missing_org_fails_validation() {
        let err = BridgeConfig::from_toml(
            r#"
            [github]
            token = "ghp_abc"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("github.org"));
    }

    #[test]
    fn test_invalid_api_base_url_rejected() {
        let err = BridgeConfig::from_toml(
            r#"
            [github]
            token = "ghp_abc"
            org = "acme"
            api_base_url = "not a url"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("api_base_url"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = BridgeConfig::from_toml(
            r#"
            [github]
            token = "ghp_abc"
            org = "acme"
            organisation = "typo"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[serial]
    fn test_env_var_interpolation() {
        temp_env::with_var("TEST_BRIDGE_TOKEN", Some("ghp_from_env"), || {
            let config = BridgeConfig::from_toml(
                r#"
                [github]
                token = "${TEST_BRIDGE_TOKEN}"
                org = "acme"
                "#,
            )
            .unwrap();

            assert_eq!(config.github.token, "ghp_from_env");
        });
    }

    #[test]
    #[serial]
    fn test_missing_env_var_is_an_error() {
        temp_env::with_var_unset("TEST_BRIDGE_NO_SUCH_VAR", || {
            let err = BridgeConfig::from_toml(
                r#"
                [github]
                token = "${TEST_BRIDGE_NO_SUCH_VAR}"
                org = "acme"
                "#,
            )
            .unwrap_err();

            match err {
                ConfigError::EnvVarNotFound(name) => {
                    assert_eq!(name, "TEST_BRIDGE_NO_SUCH_VAR")
                }
                other => panic!("expected EnvVarNotFound, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_commented_env_var_not_expanded() {
        let config = BridgeConfig::from_toml(
            r#"
            [github]
            token = "ghp_abc" # was "${NONEXISTENT_VAR}"
            org = "acme"
            "#,
        )
        .unwrap();

        assert_eq!(config.github.token, "ghp_abc");
    }

    #[test]
    #[serial]
    fn test_from_env_honors_original_contract() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", Some("ghp_env")),
                ("GITHUB_ORG", Some("acme")),
                ("PORT", Some("8099")),
                ("GITHUB_API_URL", Some("https://ghe.example.com/api/v3")),
            ],
            || {
                let config = BridgeConfig::from_env().unwrap();
                assert_eq!(config.github.token, "ghp_env");
                assert_eq!(config.github.org, "acme");
                assert_eq!(config.server.port, 8099);
                assert_eq!(config.github.api_base_url, "https://ghe.example.com/api/v3");
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token_fails() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", None::<&str>),
                ("GITHUB_ORG", Some("acme")),
                ("PORT", None),
                ("GITHUB_API_URL", None),
            ],
            || {
                let err = BridgeConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Validation(_)));
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_default_port() {
        temp_env::with_vars(
            [
                ("GITHUB_TOKEN", Some("ghp_env")),
                ("GITHUB_ORG", Some("acme")),
                ("PORT", None),
                ("GITHUB_API_URL", None),
            ],
            || {
                let config = BridgeConfig::from_env().unwrap();
                assert_eq!(config.server.port, 3000);
            },
        );
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = BridgeConfig::from_file("/nonexistent/bridge.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
