//! Runtime configuration read from the environment (and `.env`).

pub const API_KEY_VAR: &str = "NEBIUS_API_KEY";
pub const MODEL_NAME_VAR: &str = "MODEL_NAME";
pub const BASE_URL_VAR: &str = "NEBIUS_BASE_URL";

pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct-fast";
pub const DEFAULT_BASE_URL: &str = "https://api.studio.nebius.com/v1/";

/// Chat models offered for selection.
pub const AVAILABLE_MODELS: [&str; 6] = [
    "meta-llama/Meta-Llama-3.1-70B-Instruct",
    "meta-llama/Meta-Llama-3.1-8B-Instruct",
    "deepseek-ai/DeepSeek-R1",
    "google/gemma-2-9b-it",
    "microsoft/phi-4",
    "Qwen/Qwen2-VL-7B-Instruct",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model_name: String,
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();
        AppConfig {
            api_key: get(API_KEY_VAR),
            model_name: get(MODEL_NAME_VAR).unwrap_or(defaults.model_name),
            base_url: get(BASE_URL_VAR).unwrap_or(defaults.base_url),
        }
    }

    /// Whether remote chat can be attempted at all.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg, AppConfig::default());
        assert!(!cfg.has_api_key());
    }

    #[test]
    fn values_are_read_and_blank_key_ignored() {
        let env: HashMap<&str, &str> = [
            (API_KEY_VAR, "   "),
            (MODEL_NAME_VAR, "microsoft/phi-4"),
            (BASE_URL_VAR, "http://localhost:8080/v1"),
        ]
        .into_iter()
        .collect();
        let cfg = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.model_name, "microsoft/phi-4");
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    }
}
