//! Runtime configuration: a handful of environment-overridable tunables,
//! not the file-merging `.yarnrc.yml` machinery of a full config system.

use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Default,
    Environment,
}

#[derive(Debug, Clone)]
pub struct Setting<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Setting<T> {
    fn from_env(env: &HashMap<String, String>, key: &str, default: T) -> Self
    where
        T: FromStr,
    {
        match env.get(key).and_then(|raw| raw.parse().ok()) {
            Some(value) => Setting { value, source: Source::Environment },
            None => Setting { value: default, source: Source::Default },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub fulcio_url: Setting<String>,
    pub rekor_url: Setting<String>,
    /// The registry's HTTP base URL — distinct from `default_audience`,
    /// which is the OIDC audience string the registry asks for, not its
    /// own address.
    pub registry_url: Setting<String>,
    pub jwks_ttl_seconds: Setting<u64>,
    pub jwks_fetch_retries: Setting<u32>,
    pub clock_skew_seconds: Setting<i64>,
    pub refresh_threshold_seconds: Setting<i64>,
    pub default_audience: Setting<String>,
}

impl Configuration {
    pub fn from_env() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&env)
    }

    pub fn from_map(env: &HashMap<String, String>) -> Self {
        Configuration {
            fulcio_url: Setting::from_env(env, "FULCIO_URL", "https://fulcio.sigstore.dev".to_string()),
            rekor_url: Setting::from_env(env, "REKOR_URL", "https://rekor.sigstore.dev".to_string()),
            registry_url: Setting::from_env(env, "NPM_REGISTRY_URL", "https://registry.npmjs.org".to_string()),
            jwks_ttl_seconds: Setting::from_env(env, "OIDC_JWKS_TTL_SECONDS", 3600),
            jwks_fetch_retries: Setting { value: 3, source: Source::Default },
            clock_skew_seconds: Setting { value: 60, source: Source::Default },
            refresh_threshold_seconds: Setting { value: 300, source: Source::Default },
            default_audience: Setting { value: "npm:registry.npmjs.org".to_string(), source: Source::Default },
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_env_is_empty() {
        let config = Configuration::from_map(&HashMap::new());
        assert_eq!(config.fulcio_url.value, "https://fulcio.sigstore.dev");
        assert_eq!(config.fulcio_url.source, Source::Default);
        assert_eq!(config.registry_url.value, "https://registry.npmjs.org");
        assert_eq!(config.jwks_ttl_seconds.value, 3600);
    }

    #[test]
    fn environment_overrides_are_recorded_with_their_source() {
        let mut env = HashMap::new();
        env.insert("FULCIO_URL".to_string(), "https://fulcio.example.com".to_string());
        env.insert("OIDC_JWKS_TTL_SECONDS".to_string(), "60".to_string());

        let config = Configuration::from_map(&env);
        assert_eq!(config.fulcio_url.value, "https://fulcio.example.com");
        assert_eq!(config.fulcio_url.source, Source::Environment);
        assert_eq!(config.jwks_ttl_seconds.value, 60);
        assert_eq!(config.jwks_ttl_seconds.source, Source::Environment);
    }
}
