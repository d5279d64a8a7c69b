/// `load_config` module: builds the [`AppConfig`] every command runs with.
///
/// Settings come from the environment (optionally seeded from `.env` by
/// `main`), and a YAML file given with `--config` overrides any key it sets.
/// Nothing is validated here; each command asks for the typed settings it
/// needs ([`AppConfig::supabase`], [`AppConfig::microcms`]) before it touches
/// any backend, so a missing credential fails fast with `DrillError::Config`.
///
/// # Errors
/// File problems are `anyhow::Error`s that say whether the file could not be
/// read or could not be parsed.
use std::fs;
use std::path::Path;

use anyhow::Result;
use drillkit_core::DrillError;
use serde::Deserialize;
use tracing::{debug, error, info};

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const SUPABASE_BUCKET_NAME: &str = "SUPABASE_BUCKET_NAME";
pub const MICROCMS_SERVICE_DOMAIN: &str = "MICROCMS_SERVICE_DOMAIN";
pub const MICROCMS_MANAGEMENT_API_KEY: &str = "MICROCMS_MANAGEMENT_API_KEY";
pub const APP_URL: &str = "APP_URL";
pub const REVALIDATE_TOKEN: &str = "REVALIDATE_TOKEN";
pub const THUMBNAIL_COMMAND: &str = "THUMBNAIL_COMMAND";

/// Raw settings. Every key is optional until a command asks for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub supabase_bucket_name: Option<String>,
    pub microcms_service_domain: Option<String>,
    pub microcms_api_key: Option<String>,
    pub app_url: Option<String>,
    pub revalidate_token: Option<String>,
    pub thumbnail_command: Option<String>,
}

/// Storage and PostgREST settings; both live in the same Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_role_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroCmsSettings {
    pub service_domain: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevalidateSettings {
    pub app_url: String,
    pub token: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_value(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            supabase_url: env_value(SUPABASE_URL),
            supabase_service_role_key: env_value(SUPABASE_SERVICE_ROLE_KEY),
            supabase_bucket_name: env_value(SUPABASE_BUCKET_NAME),
            microcms_service_domain: env_value(MICROCMS_SERVICE_DOMAIN),
            microcms_api_key: env_value(MICROCMS_MANAGEMENT_API_KEY),
            app_url: env_value(APP_URL),
            revalidate_token: env_value(REVALIDATE_TOKEN),
            thumbnail_command: env_value(THUMBNAIL_COMMAND),
        }
    }

    /// Keys set in `overrides` win; unset keys keep the current value.
    pub fn merge(self, overrides: AppConfig) -> Self {
        fn pick(base: Option<String>, over: Option<String>) -> Option<String> {
            non_empty(over).or(base)
        }
        AppConfig {
            supabase_url: pick(self.supabase_url, overrides.supabase_url),
            supabase_service_role_key: pick(
                self.supabase_service_role_key,
                overrides.supabase_service_role_key,
            ),
            supabase_bucket_name: pick(self.supabase_bucket_name, overrides.supabase_bucket_name),
            microcms_service_domain: pick(
                self.microcms_service_domain,
                overrides.microcms_service_domain,
            ),
            microcms_api_key: pick(self.microcms_api_key, overrides.microcms_api_key),
            app_url: pick(self.app_url, overrides.app_url),
            revalidate_token: pick(self.revalidate_token, overrides.revalidate_token),
            thumbnail_command: pick(self.thumbnail_command, overrides.thumbnail_command),
        }
    }

    pub fn supabase(&self) -> Result<SupabaseSettings, DrillError> {
        match (
            &self.supabase_url,
            &self.supabase_service_role_key,
            &self.supabase_bucket_name,
        ) {
            (Some(url), Some(key), Some(bucket)) => Ok(SupabaseSettings {
                url: url.trim_end_matches('/').to_string(),
                service_role_key: key.clone(),
                bucket: bucket.clone(),
            }),
            (url, key, bucket) => Err(missing([
                (SUPABASE_URL, url.is_none()),
                (SUPABASE_SERVICE_ROLE_KEY, key.is_none()),
                (SUPABASE_BUCKET_NAME, bucket.is_none()),
            ])),
        }
    }

    pub fn microcms(&self) -> Result<MicroCmsSettings, DrillError> {
        match (&self.microcms_service_domain, &self.microcms_api_key) {
            (Some(domain), Some(key)) => Ok(MicroCmsSettings {
                service_domain: domain.clone(),
                api_key: key.clone(),
            }),
            (domain, key) => Err(missing([
                (MICROCMS_SERVICE_DOMAIN, domain.is_none()),
                (MICROCMS_MANAGEMENT_API_KEY, key.is_none()),
            ])),
        }
    }

    /// Revalidation is optional; `None` unless both the URL and token are set.
    pub fn revalidate(&self) -> Option<RevalidateSettings> {
        match (&self.app_url, &self.revalidate_token) {
            (Some(app_url), Some(token)) => Some(RevalidateSettings {
                app_url: app_url.trim_end_matches('/').to_string(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    /// Log which settings are present without printing any secret.
    pub fn trace_loaded(&self) {
        info!(
            supabase_url = self.supabase_url.as_deref().unwrap_or("<unset>"),
            supabase_bucket = self.supabase_bucket_name.as_deref().unwrap_or("<unset>"),
            supabase_key_set = self.supabase_service_role_key.is_some(),
            microcms_domain = self.microcms_service_domain.as_deref().unwrap_or("<unset>"),
            microcms_key_set = self.microcms_api_key.is_some(),
            revalidate = self.revalidate().is_some(),
            "Loaded configuration"
        );
    }
}

fn missing<const N: usize>(checks: [(&str, bool); N]) -> DrillError {
    let names: Vec<&str> = checks
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();
    DrillError::Config(format!("missing settings: {}", names.join(", ")))
}

/// Environment first, then the YAML file at `path` (if any) on top.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let env_config = AppConfig::from_env();
    let Some(path_ref) = path else {
        debug!("No config file given, using environment only");
        env_config.trace_loaded();
        return Ok(env_config);
    };
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let file_config: AppConfig = if config_content.trim().is_empty() {
        AppConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let config = env_config.merge(file_config);
    config.trace_loaded();
    Ok(config)
}
