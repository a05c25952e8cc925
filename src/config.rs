//! Process configuration read from the environment

use anyhow::{anyhow, Context};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::gateway::prompts::DEFAULT_SYSTEM_PROMPT;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// How to reach Gemini
#[derive(Debug, Clone, PartialEq)]
pub enum GeminiCredentials {
    /// Generative Language API with `GEMINI_API_KEY`
    ApiKey(String),
    /// Vertex AI with Application Default Credentials
    Vertex { project_id: String, location: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub host: IpAddr,
    pub port: u16,

    pub gemini: GeminiCredentials,
    pub gemini_model: String,
    /// Whether the model takes a dedicated system instruction
    pub gemini_system_instruction: bool,
    pub system_prompt: String,

    pub database_url: String,
    pub database_max_pool_size: usize,

    pub media_root: PathBuf,
    pub max_upload_bytes: u64,
}

impl AppConfig {
    /// Load from the process environment (after `.env`, if any, has been applied)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini = match var("GEMINI_API_KEY") {
            Some(key) => GeminiCredentials::ApiKey(key),
            None => {
                let project_id = var("GCP_PROJECT_ID").ok_or_else(|| {
                    anyhow!("Set GEMINI_API_KEY, or GCP_PROJECT_ID for Vertex AI")
                })?;
                GeminiCredentials::Vertex {
                    project_id,
                    location: var("GCP_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
                }
            }
        };

        let gemini_system_instruction = match var("GEMINI_SYSTEM_INSTRUCTION") {
            Some(v) => parse_bool(&v)
                .with_context(|| format!("Invalid GEMINI_SYSTEM_INSTRUCTION: {}", v))?,
            None => true,
        };

        Ok(Self {
            app_name: var("APP_NAME").unwrap_or_else(|| "HealthStake API".to_string()),
            app_version: var("APP_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            host: var("HOST")
                .unwrap_or_else(|| "127.0.0.1".to_string())
                .parse::<IpAddr>()
                .context("Invalid HOST")?,
            port: var("PORT")
                .unwrap_or_else(|| "3030".to_string())
                .parse::<u16>()
                .context("Invalid PORT")?,
            gemini,
            gemini_model: var("GEMINI_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_system_instruction,
            system_prompt: var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_pool_size: var("DATABASE_MAX_POOL_SIZE")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("Invalid DATABASE_MAX_POOL_SIZE")?
                .unwrap_or(16),
            media_root: var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            max_upload_bytes: var("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("Invalid MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected a boolean, got {:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("GEMINI_API_KEY", "key"),
            ("DATABASE_URL", "postgres://u:p@localhost/db"),
        ])
        .unwrap();

        assert_eq!(config.gemini, GeminiCredentials::ApiKey("key".to_string()));
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert!(config.gemini_system_instruction);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.database_max_pool_size, 16);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3030");
    }

    #[test]
    fn test_vertex_credentials() {
        let config = load(&[
            ("GCP_PROJECT_ID", "my-project"),
            ("GCP_LOCATION", "europe-west4"),
            ("DATABASE_URL", "postgres://localhost/db"),
            ("GEMINI_SYSTEM_INSTRUCTION", "false"),
            ("PORT", "8000"),
        ])
        .unwrap();

        assert_eq!(
            config.gemini,
            GeminiCredentials::Vertex {
                project_id: "my-project".to_string(),
                location: "europe-west4".to_string(),
            }
        );
        assert!(!config.gemini_system_instruction);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("GEMINI_API_KEY", "key")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://localhost/db")]).is_err());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[
            ("GEMINI_API_KEY", "key"),
            ("DATABASE_URL", "postgres://localhost/db"),
            ("GEMINI_MODEL_NAME", "  "),
        ])
        .unwrap();
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_numbers_fail() {
        assert!(load(&[
            ("GEMINI_API_KEY", "key"),
            ("DATABASE_URL", "postgres://localhost/db"),
            ("PORT", "eighty"),
        ])
        .is_err());
    }
}
