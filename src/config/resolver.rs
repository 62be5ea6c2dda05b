//! Layered resolution of the effective provider settings.
//!
//! Sources are consulted in order and the first one that supplies a field wins.
//! The standard order is environment, user config file, bundled defaults. Caller
//! overrides sit above all of them.

use super::settings::{ConfigDocument, ProviderKind};
use crate::error::{Result, SummariserError};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Token limit used when no source provides one.
const FALLBACK_MAX_TOKENS: u32 = 3000;

/// One layer of configuration.
pub trait ConfigSource: Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    fn provider(&self) -> Option<String> {
        None
    }

    fn api_key(&self, _provider: ProviderKind) -> Option<String> {
        None
    }

    fn model(&self, _provider: ProviderKind) -> Option<String> {
        None
    }

    fn max_tokens(&self, _provider: ProviderKind) -> Option<u32> {
        None
    }

    fn base_url(&self, _provider: ProviderKind) -> Option<String> {
        None
    }
}

/// API keys and endpoints from environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Snapshot the relevant variables of the current process.
    pub fn from_process() -> Self {
        let names = ProviderKind::ALL
            .iter()
            .flat_map(|p| [p.api_key_env(), p.base_url_env()]);
        Self::from_pairs(
            names.filter_map(|name| std::env::var(name).ok().map(|value| (name, value))),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn get(&self, name: &str) -> Option<String> {
        non_empty(self.vars.get(name))
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.get(provider.api_key_env())
    }

    fn base_url(&self, provider: ProviderKind) -> Option<String> {
        self.get(provider.base_url_env())
    }
}

/// A parsed config document acting as a source.
pub struct DocumentSource {
    name: String,
    document: ConfigDocument,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, document: ConfigDocument) -> Self {
        Self {
            name: name.into(),
            document,
        }
    }
}

impl ConfigSource for DocumentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> Option<String> {
        non_empty(self.document.provider.as_ref())
    }

    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        non_empty(self.document.section(provider).api_key.as_ref())
    }

    fn model(&self, provider: ProviderKind) -> Option<String> {
        non_empty(self.document.section(provider).model.as_ref())
    }

    fn max_tokens(&self, provider: ProviderKind) -> Option<u32> {
        self.document.section(provider).max_tokens.filter(|t| *t > 0)
    }

    fn base_url(&self, provider: ProviderKind) -> Option<String> {
        non_empty(self.document.section(provider).base_url.as_ref())
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Per-invocation choices made by the caller (command-line flags, form fields).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    /// `None` keeps streaming on.
    pub stream: Option<bool>,
}

/// Fully resolved settings for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: String,
    pub stream_enabled: bool,
    pub max_tokens: u32,
    pub base_url: String,
}

impl EffectiveConfig {
    /// "provider / model", as shown in summary headers.
    pub fn model_used(&self) -> String {
        format!("{} / {}", self.provider, self.model)
    }
}

impl std::fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("stream_enabled", &self.stream_enabled)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Ordered list of configuration sources.
pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigResolver {
    /// Build a resolver from sources, highest precedence first.
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// Environment, then the user file (default location unless `config_path` is
    /// given), then the bundled defaults.
    pub fn standard(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => ConfigDocument::default_config_path(),
        };

        let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(EnvSource::from_process())];
        if let Some(document) = ConfigDocument::load_from(&path)? {
            debug!("Loaded user config from {}", path.display());
            sources.push(Box::new(DocumentSource::new(
                format!("config file {}", path.display()),
                document,
            )));
        }
        sources.push(Box::new(DocumentSource::new(
            "bundled defaults",
            ConfigDocument::bundled()?,
        )));

        Ok(Self::new(sources))
    }

    fn first<T>(&self, field: impl Fn(&dyn ConfigSource) -> Option<T>) -> Option<T> {
        self.sources.iter().find_map(|source| field(source.as_ref()))
    }

    /// Merge all sources into the settings for one run.
    pub fn resolve(&self, overrides: &Overrides) -> Result<EffectiveConfig> {
        let provider = self.resolve_provider(overrides)?;

        let api_key = self
            .first(|s| s.api_key(provider))
            .ok_or_else(|| self.missing_key_error(provider))?;

        let model = overrides
            .model
            .as_ref()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .or_else(|| self.first(|s| s.model(provider)))
            .ok_or_else(|| {
                SummariserError::Config(format!("No model configured for {}", provider))
            })?;

        let config = EffectiveConfig {
            provider,
            model,
            api_key,
            stream_enabled: overrides.stream.unwrap_or(true),
            max_tokens: self
                .first(|s| s.max_tokens(provider))
                .unwrap_or(FALLBACK_MAX_TOKENS),
            base_url: self
                .first(|s| s.base_url(provider))
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn resolve_provider(&self, overrides: &Overrides) -> Result<ProviderKind> {
        if let Some(name) = &overrides.provider {
            return name.parse().map_err(SummariserError::Config);
        }

        for source in &self.sources {
            if let Some(name) = source.provider() {
                return name.parse().map_err(|e: String| {
                    SummariserError::Config(format!("{} (from {})", e, source.name()))
                });
            }
        }

        Err(SummariserError::Config(
            "No provider configured".to_string(),
        ))
    }

    fn missing_key_error(&self, provider: ProviderKind) -> SummariserError {
        let alternatives: Vec<ProviderKind> = ProviderKind::ALL
            .into_iter()
            .filter(|p| *p != provider && self.first(|s| s.api_key(*p)).is_some())
            .collect();

        match alternatives.first() {
            None => SummariserError::Config(format!(
                "No API keys found. Set at least one of {}, {} or {}, \
                 or run 'youtube-summariser init'.",
                ProviderKind::OpenAi.api_key_env(),
                ProviderKind::Anthropic.api_key_env(),
                ProviderKind::OpenRouter.api_key_env(),
            )),
            Some(alternative) => SummariserError::Config(format!(
                "{} is not set and no api_key is configured for {}. \
                 Set it, or use --provider {}.",
                provider.api_key_env(),
                provider,
                alternative
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(toml: &str) -> ConfigDocument {
        ConfigDocument::parse(toml).unwrap()
    }

    fn resolver(env: &[(&str, &str)], file: Option<&str>, defaults: &str) -> ConfigResolver {
        let mut sources: Vec<Box<dyn ConfigSource>> =
            vec![Box::new(EnvSource::from_pairs(env.iter().copied()))];
        if let Some(file) = file {
            sources.push(Box::new(DocumentSource::new("file", document(file))));
        }
        sources.push(Box::new(DocumentSource::new("defaults", document(defaults))));
        ConfigResolver::new(sources)
    }

    const DEFAULTS: &str = r#"
provider = "anthropic"
[openai]
model = "gpt-4o"
api_key = "sk-default"
[anthropic]
model = "claude-default"
"#;

    const FILE: &str = r#"
provider = "openai"
[openai]
model = "gpt-file"
api_key = "sk-file"
"#;

    #[test]
    fn test_api_key_precedence_env_then_file_then_defaults() {
        let overrides = Overrides::default();

        let all = resolver(&[("OPENAI_API_KEY", "sk-env")], Some(FILE), DEFAULTS);
        assert_eq!(all.resolve(&overrides).unwrap().api_key, "sk-env");

        let no_env = resolver(&[], Some(FILE), DEFAULTS);
        assert_eq!(no_env.resolve(&overrides).unwrap().api_key, "sk-file");

        let only_defaults = resolver(&[], None, DEFAULTS);
        let config = only_defaults
            .resolve(&Overrides {
                provider: Some("openai".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.api_key, "sk-default");
    }

    #[test]
    fn test_provider_and_model_fall_back_to_defaults() {
        let resolver = resolver(&[("ANTHROPIC_API_KEY", "sk-ant")], Some("[openai]\n"), DEFAULTS);
        let config = resolver.resolve(&Overrides::default()).unwrap();
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert_eq!(config.model, "claude-default");
        assert_eq!(config.max_tokens, FALLBACK_MAX_TOKENS);
        assert_eq!(config.base_url, "https://api.anthropic.com/v1");
        assert!(config.stream_enabled);
    }

    #[test]
    fn test_overrides_win() {
        let resolver = resolver(
            &[("OPENROUTER_API_KEY", "sk-or"), ("OPENROUTER_BASE_URL", "http://proxy/")],
            Some(FILE),
            DEFAULTS,
        );
        let config = resolver
            .resolve(&Overrides {
                provider: Some("openrouter".into()),
                model: Some("meta-llama/llama-3-70b".into()),
                stream: Some(false),
            })
            .unwrap();
        assert_eq!(config.provider, ProviderKind::OpenRouter);
        assert_eq!(config.model, "meta-llama/llama-3-70b");
        assert_eq!(config.base_url, "http://proxy");
        assert!(!config.stream_enabled);
        assert_eq!(config.model_used(), "openrouter / meta-llama/llama-3-70b");
    }

    #[test]
    fn test_no_keys_anywhere_is_config_error() {
        let defaults = "provider = \"anthropic\"\n[anthropic]\nmodel = \"m\"\n";
        let resolver = resolver(&[], Some(""), defaults);
        let err = resolver.resolve(&Overrides::default()).unwrap_err();
        match err {
            SummariserError::Config(msg) => {
                assert!(msg.contains("No API keys found"));
                assert!(msg.contains("OPENAI_API_KEY"));
                assert!(msg.contains("ANTHROPIC_API_KEY"));
                assert!(msg.contains("OPENROUTER_API_KEY"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_suggests_alternative_provider() {
        let resolver = resolver(
            &[("ANTHROPIC_API_KEY", "sk-ant")],
            None,
            "[openai]\nmodel = \"gpt\"\n",
        );
        let err = resolver
            .resolve(&Overrides {
                provider: Some("openai".into()),
                ..Default::default()
            })
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("OPENAI_API_KEY is not set"));
        assert!(msg.contains("--provider anthropic"));
    }

    #[test]
    fn test_unsupported_provider_override() {
        let resolver = resolver(&[("OPENAI_API_KEY", "sk")], None, DEFAULTS);
        let err = resolver
            .resolve(&Overrides {
                provider: Some("gemini".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(
            matches!(err, SummariserError::Config(ref m) if m.contains("Unsupported provider"))
        );
    }

    #[test]
    fn test_unsupported_provider_in_file_names_source() {
        let resolver = resolver(&[("OPENAI_API_KEY", "sk")], Some("provider = \"bard\""), DEFAULTS);
        let err = resolver.resolve(&Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("from file"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let resolver = resolver(&[("OPENAI_API_KEY", "  ")], Some(FILE), DEFAULTS);
        let config = resolver.resolve(&Overrides::default()).unwrap();
        assert_eq!(config.api_key, "sk-file");
    }

    #[test]
    fn test_debug_redacts_key() {
        let resolver = resolver(&[("OPENAI_API_KEY", "sk-secret-value")], None, DEFAULTS);
        let config = resolver
            .resolve(&Overrides {
                provider: Some("openai".into()),
                ..Default::default()
            })
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_standard_with_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[openai\nmodel = ").unwrap();
        let err = ConfigResolver::standard(Some(&path)).err().unwrap();
        assert!(matches!(err, SummariserError::Config(_)));
    }
}
