use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use hangar_core::orchestrator::OrchestratorConfig;
use hangar_core::providers::{CompletionProvider, ModelRouter, OpenAiCompatProvider};

/// Template written by `hangar init`
pub const DEFAULT_CONFIG: &str = r#"# Hangar configuration

[provider]
# "openai_compat" (OpenAI, Ollama /v1, LiteLLM proxies) or "none" for demo mode
kind = "none"
name = "openai"
base_url = "https://api.openai.com/v1"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4o-mini"
max_tokens = 2000
temperature = 0.1

# Tried in order when the primary provider keeps failing
# [[fallback_providers]]
# kind = "openai_compat"
# name = "ollama"
# base_url = "http://localhost:11434/v1"
# model = "llama3.1"

[orchestrator]
max_concurrent_branches = 5
branch_timeout_secs = 120
# Per completion call; capped at three quarters of branch_timeout_secs
completion_timeout_secs = 60

[gateway]
bind = "127.0.0.1:8000"

[tenants]
ids = ["default"]
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HangarConfig {
    pub provider: ProviderConfig,
    pub fallback_providers: Vec<ProviderConfig>,
    pub orchestrator: OrchestratorConfig,
    pub gateway: GatewayConfig,
    pub tenants: TenantsConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompat,
    #[default]
    None,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::None,
            name: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ProviderConfig {
    /// The configured provider, or `None` in demo mode
    pub fn build(&self) -> Option<Arc<dyn CompletionProvider>> {
        match self.kind {
            ProviderKind::None => None,
            ProviderKind::OpenaiCompat => Some(Arc::new(
                OpenAiCompatProvider::new(
                    self.name.clone(),
                    self.api_key.clone(),
                    self.model.clone(),
                    self.base_url.clone(),
                )
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("Invalid gateway bind address '{}'", self.bind))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantsConfig {
    pub ids: Vec<String>,
}

impl Default for TenantsConfig {
    fn default() -> Self {
        Self {
            ids: vec!["default".to_string()],
        }
    }
}

/// Mask a secret for display: first 3 and last 4 chars of longer keys, otherwise "***"
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hangar")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl HangarConfig {
    pub fn load(custom_path: &Option<PathBuf>) -> Result<Self> {
        let path = custom_path.clone().unwrap_or_else(default_config_path);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = std::fs::metadata(&path) {
                let mode = metadata.permissions().mode();
                if mode & 0o077 != 0 {
                    return Err(anyhow!(
                        "Config file {:?} has overly permissive permissions ({:o}). \
                         It may contain secrets. Fix with: chmod 600 {:?}",
                        path,
                        mode & 0o777,
                        path
                    ));
                }
            }
        }

        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read config at {}. Run `hangar init` first.",
                path.display()
            )
        })?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Load the config, or fall back to demo-mode defaults when no
    /// `--config` was given and `~/.hangar/config.toml` does not exist
    pub fn load_or_default(custom_path: &Option<PathBuf>) -> Result<Self> {
        if custom_path.is_none() && !default_config_path().exists() {
            info!("No config found, using defaults (demo mode)");
            return Ok(Self::default());
        }
        Self::load(custom_path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.contains("api_key = \"sk-") {
            warn!(
                "API key is hardcoded in config file. For security, use environment variables: api_key = \"${{OPENAI_API_KEY}}\""
            );
        }
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }

    /// Primary provider plus fallbacks, composed into a failover router
    /// when more than one is configured
    pub fn build_provider(&self) -> Result<Option<Arc<dyn CompletionProvider>>> {
        let mut providers: Vec<Arc<dyn CompletionProvider>> = Vec::new();
        providers.extend(self.provider.build());
        providers.extend(self.fallback_providers.iter().filter_map(|p| p.build()));

        match providers.len() {
            0 => Ok(None),
            1 => Ok(providers.pop()),
            n => {
                info!("Model failover across {} providers", n);
                Ok(Some(Arc::new(ModelRouter::with_failover(providers)?)))
            }
        }
    }

    /// Copy with every API key masked, for display
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        cfg.provider.api_key = mask_secret(&cfg.provider.api_key);
        for p in &mut cfg.fallback_providers {
            p.api_key = mask_secret(&p.api_key);
        }
        cfg
    }
}

/// Write the default config into `dir` unless one already exists.
/// Returns the config path and whether it was created.
pub fn write_default_config(dir: &Path) -> Result<(PathBuf, bool)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok((path, false));
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok((path, true))
}

/// Allowlist of environment variable names that may be expanded in config files
const ALLOWED_ENV_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "HANGAR_API_KEY",
    "LITELLM_API_KEY",
    "OLLAMA_API_KEY",
    "HOME",
    "USER",
];

fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while pos < result.len() {
        let Some(start) = result[pos..].find("${") else {
            break;
        };
        let abs_start = pos + start;
        let Some(end) = result[abs_start..].find('}') else {
            break;
        };
        let var_name = result[abs_start + 2..abs_start + end].to_string();

        if !ALLOWED_ENV_VARS.contains(&var_name.as_str()) {
            warn!(
                "Skipping expansion of unrecognized env var '{}' in config (not in allowlist)",
                var_name
            );
            pos = abs_start + end + 1;
            continue;
        }

        let value = std::env::var(&var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..abs_start],
            value,
            &result[abs_start + end + 1..]
        );
        pos = abs_start + value.len();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses() {
        let cfg = HangarConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(cfg.provider.kind, ProviderKind::None);
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        assert!(cfg.fallback_providers.is_empty());
        assert_eq!(cfg.orchestrator.max_concurrent_branches, 5);
        assert_eq!(cfg.orchestrator.branch_timeout_secs, 120);
        assert_eq!(cfg.orchestrator.completion_timeout_secs, 60);
        assert_eq!(cfg.gateway.socket_addr().unwrap().port(), 8000);
        assert_eq!(cfg.tenants.ids, vec!["default"]);
        assert!(cfg.build_provider().unwrap().is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = HangarConfig::from_toml_str("[gateway]\nbind = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(cfg.gateway.bind, "0.0.0.0:9000");
        assert_eq!(cfg.orchestrator.branch_timeout_secs, 120);
        assert_eq!(cfg.tenants.ids, vec!["default"]);
    }

    #[test]
    fn test_failover_providers() {
        let cfg = HangarConfig::from_toml_str(
            r#"
[provider]
kind = "openai_compat"
model = "gpt-4o"

[[fallback_providers]]
kind = "openai_compat"
name = "ollama"
base_url = "http://localhost:11434/v1"
model = "llama3.1"

[[fallback_providers]]
kind = "none"
"#,
        )
        .unwrap();
        assert_eq!(cfg.fallback_providers.len(), 2);
        let provider = cfg.build_provider().unwrap().unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn test_single_provider_not_wrapped() {
        let toml = "[provider]\nkind = \"openai_compat\"\nname = \"litellm\"\n";
        let cfg = HangarConfig::from_toml_str(toml).unwrap();
        let provider = cfg.build_provider().unwrap().unwrap();
        assert_eq!(provider.provider_name(), "litellm");
    }

    #[test]
    fn test_invalid_bind() {
        let gw = GatewayConfig {
            bind: "not an address".into(),
        };
        assert!(gw.socket_addr().is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(empty)");
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("sk-abcdefghijkl1234"), "sk-...1234");
    }

    #[test]
    fn test_debug_masks_api_key() {
        let cfg = ProviderConfig {
            api_key: "sk-supersecretvalue9876".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("sk-...9876"));
    }

    #[test]
    fn test_redacted() {
        let mut cfg = HangarConfig::default();
        cfg.provider.api_key = "sk-supersecretvalue9876".into();
        let shown = toml::to_string_pretty(&cfg.redacted()).unwrap();
        assert!(!shown.contains("supersecret"));
        assert_eq!(cfg.provider.api_key, "sk-supersecretvalue9876");
    }

    #[test]
    fn test_expand_env_vars_allowlist() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(expand_env_vars("dir = \"${HOME}/x\""), format!("dir = \"{}/x\"", home));
        assert_eq!(expand_env_vars("k = \"${AWS_SECRET}\""), "k = \"${AWS_SECRET}\"");
        assert_eq!(expand_env_vars("unterminated ${HOME"), "unterminated ${HOME");
    }

    #[test]
    fn test_write_default_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let (path, created) = write_default_config(dir.path()).unwrap();
        assert!(created);
        let (_, created_again) = write_default_config(dir.path()).unwrap();
        assert!(!created_again);

        let cfg = HangarConfig::load(&Some(path)).unwrap();
        assert_eq!(cfg.gateway.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = HangarConfig::load(&Some(dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("hangar init"));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_rejects_permissive_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, DEFAULT_CONFIG).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let err = HangarConfig::load(&Some(path)).unwrap_err();
        assert!(err.to_string().contains("overly permissive"));
    }
}
