//! Registry of selectable models and resolution of `<provider>/<model>` keys.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Model key used when none is configured.
pub const DEFAULT_MODEL_KEY: &str = "openai/gpt-4.1-nano";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid model key: {0}")]
    InvalidModelKey(String),
}

/// How a provider expects its models to be addressed by the completion gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierRule {
    /// Send only the model name, e.g. `gpt-4.1`.
    BareName,
    /// Send the full `<provider>/<model>` key.
    FullKey,
}

impl IdentifierRule {
    fn apply(&self, key: &str, model_name: &str) -> ProviderModelId {
        match self {
            IdentifierRule::BareName => ProviderModelId(model_name.to_string()),
            IdentifierRule::FullKey => ProviderModelId(key.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Capabilities {
    /// Context window size in tokens.
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderEntry {
    pub name: String,
    #[serde(rename = "identifier")]
    pub identifier_rule: IdentifierRule,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl ProviderEntry {
    fn model(&self, model_name: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.name == model_name)
    }
}

/// Identifier string handed to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderModelId(String);

impl ProviderModelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A model key that passed resolution against a registry.
///
/// Holding one of these is the proof that the key is selectable; there is no
/// way to build it from an unchecked string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelKey {
    key: String,
    id: ProviderModelId,
}

impl ModelKey {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn provider_model_id(&self) -> &ProviderModelId {
        &self.id
    }

    /// Short name shown to the user: everything after the last `/`.
    pub fn display_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Read-only table of providers and their models, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    providers: Vec<ProviderEntry>,
}

static BUILTIN_REGISTRY: Lazy<ModelRegistry> = Lazy::new(|| {
    let model = |name: &str, max_tokens: u32| ModelEntry {
        name: name.to_string(),
        capabilities: Capabilities { max_tokens },
    };
    ModelRegistry::new(vec![
        ProviderEntry {
            name: "openai".to_string(),
            identifier_rule: IdentifierRule::BareName,
            models: vec![
                model("gpt-4.1", 1_047_576),
                model("gpt-4.1-mini", 1_047_576),
                model("gpt-4.1-nano", 1_047_576),
            ],
        },
        ProviderEntry {
            name: "anthropic".to_string(),
            identifier_rule: IdentifierRule::FullKey,
            models: vec![model("claude-3.7-sonnet", 200_000)],
        },
    ])
});

impl Default for ModelRegistry {
    fn default() -> Self {
        BUILTIN_REGISTRY.clone()
    }
}

impl ModelRegistry {
    pub fn new(providers: Vec<ProviderEntry>) -> Self {
        Self { providers }
    }

    /// Returns a registry with `extra` entries appended.
    ///
    /// Existing provider/model pairs are kept as they are; unknown models are
    /// appended to their provider and unknown providers are appended at the end.
    pub fn with_extra(&self, extra: &[ProviderEntry]) -> Self {
        let mut providers = self.providers.clone();
        for entry in extra {
            match providers.iter_mut().find(|p| p.name == entry.name) {
                Some(existing) => {
                    for model in &entry.models {
                        if existing.model(&model.name).is_none() {
                            existing.models.push(model.clone());
                        }
                    }
                }
                None => providers.push(entry.clone()),
            }
        }
        Self { providers }
    }

    pub fn lookup(&self, provider: &str, model_name: &str) -> Option<&Capabilities> {
        self.provider(provider)
            .and_then(|p| p.model(model_name))
            .map(|m| &m.capabilities)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderEntry> + '_ {
        self.providers.iter()
    }

    /// All `(provider, model_name)` pairs in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = (&str, &str)> + Clone + '_ {
        self.providers.iter().flat_map(|p| {
            p.models
                .iter()
                .map(move |m| (p.name.as_str(), m.name.as_str()))
        })
    }

    /// All selectable keys in `<provider>/<model>` form.
    pub fn keys(&self) -> Vec<String> {
        self.list_all()
            .map(|(provider, model)| format!("{provider}/{model}"))
            .collect()
    }

    /// Resolves `key` into the identifier the completion provider expects.
    pub fn resolve(&self, key: &str) -> Result<ProviderModelId, RegistryError> {
        let invalid = || RegistryError::InvalidModelKey(key.to_string());
        let (provider_name, model_name) = key.split_once('/').ok_or_else(invalid)?;
        let provider = self.provider(provider_name).ok_or_else(invalid)?;
        provider.model(model_name).ok_or_else(invalid)?;
        Ok(provider.identifier_rule.apply(key, model_name))
    }

    /// Validates `key` and returns it together with its provider identifier.
    pub fn model_key(&self, key: &str) -> Result<ModelKey, RegistryError> {
        let id = self.resolve(key)?;
        Ok(ModelKey {
            key: key.to_string(),
            id,
        })
    }

    fn provider(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_openai_uses_bare_model_name() {
        let registry = ModelRegistry::default();
        let id = registry.resolve("openai/gpt-4.1-mini").unwrap();
        assert_eq!(id.as_str(), "gpt-4.1-mini");
    }

    #[test]
    fn test_resolve_other_providers_use_full_key() {
        let registry = ModelRegistry::default();
        let id = registry.resolve("anthropic/claude-3.7-sonnet").unwrap();
        assert_eq!(id.as_str(), "anthropic/claude-3.7-sonnet");
    }

    #[test]
    fn test_every_registered_pair_resolves() {
        let registry = ModelRegistry::default();
        for (provider, model) in registry.list_all() {
            let key = format!("{provider}/{model}");
            let id = registry.resolve(&key).unwrap();
            if provider == "openai" {
                assert_eq!(id.as_str(), model);
            } else {
                assert_eq!(id.as_str(), key);
            }
        }
    }

    #[test]
    fn test_resolve_rejects_malformed_and_unknown_keys() {
        let registry = ModelRegistry::default();
        for key in [
            "",
            "gpt-4.1",
            "openai",
            "openai/",
            "/gpt-4.1",
            "OpenAI/gpt-4.1",
            "openai/gpt-5",
            "invalidprov/x",
            "anthropic/claude-3.7-sonnet/extra",
        ] {
            assert_eq!(
                registry.resolve(key),
                Err(RegistryError::InvalidModelKey(key.to_string())),
                "key: {key:?}"
            );
        }
    }

    #[test]
    fn test_lookup_returns_capabilities() {
        let registry = ModelRegistry::default();
        assert_eq!(
            registry.lookup("anthropic", "claude-3.7-sonnet"),
            Some(&Capabilities {
                max_tokens: 200_000
            })
        );
        assert_eq!(registry.lookup("anthropic", "gpt-4.1"), None);
        assert_eq!(registry.lookup("mistral", "large"), None);
    }

    #[test]
    fn test_list_all_preserves_order_and_restarts() {
        let registry = ModelRegistry::default();
        let listing = registry.list_all();
        let first: Vec<_> = listing.clone().collect();
        let second: Vec<_> = listing.collect();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                ("openai", "gpt-4.1"),
                ("openai", "gpt-4.1-mini"),
                ("openai", "gpt-4.1-nano"),
                ("anthropic", "claude-3.7-sonnet"),
            ]
        );
    }

    #[test]
    fn test_model_key_display_name() {
        let registry = ModelRegistry::default();
        let key = registry.model_key("anthropic/claude-3.7-sonnet").unwrap();
        assert_eq!(key.display_name(), "claude-3.7-sonnet");
        assert_eq!(key.as_str(), "anthropic/claude-3.7-sonnet");
        assert_eq!(
            key.provider_model_id().as_str(),
            "anthropic/claude-3.7-sonnet"
        );
        assert!(registry.model_key("nope/nope").is_err());
    }

    #[test]
    fn test_with_extra_appends_without_overriding() {
        let extra = vec![
            ProviderEntry {
                name: "openai".to_string(),
                identifier_rule: IdentifierRule::FullKey,
                models: vec![
                    ModelEntry {
                        name: "gpt-4.1".to_string(),
                        capabilities: Capabilities { max_tokens: 1 },
                    },
                    ModelEntry {
                        name: "o3".to_string(),
                        capabilities: Capabilities {
                            max_tokens: 200_000,
                        },
                    },
                ],
            },
            ProviderEntry {
                name: "ollama".to_string(),
                identifier_rule: IdentifierRule::FullKey,
                models: vec![ModelEntry {
                    name: "llama3".to_string(),
                    capabilities: Capabilities { max_tokens: 8_192 },
                }],
            },
        ];
        let registry = ModelRegistry::default().with_extra(&extra);

        assert_eq!(
            registry.lookup("openai", "gpt-4.1").unwrap().max_tokens,
            1_047_576
        );
        // The provider keeps its own identifier rule.
        assert_eq!(registry.resolve("openai/o3").unwrap().as_str(), "o3");
        assert_eq!(
            registry.resolve("ollama/llama3").unwrap().as_str(),
            "ollama/llama3"
        );
        assert_eq!(
            registry.keys().last().map(String::as_str),
            Some("ollama/llama3")
        );
    }

    #[test]
    fn test_provider_entry_yaml_parsing() {
        let yaml = r#"
name: ollama
identifier: full_key
models:
  - name: llama3
    max_tokens: 8192
"#;
        let entry: ProviderEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.identifier_rule, IdentifierRule::FullKey);
        assert_eq!(entry.models[0].capabilities.max_tokens, 8192);
    }
}
