use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::AuthConfig;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;
const DEFAULT_REALTIME_BUFFER: usize = 256;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub realtime_buffer: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = lookup("AUTH_SECRET_BASE64").context("AUTH_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(secret.trim())
            .context("invalid AUTH_SECRET_BASE64")?;
        if secret_bytes.len() < 32 {
            return Err(anyhow!("AUTH_SECRET_BASE64 must decode to at least 32 bytes"));
        }

        let session_ttl_minutes = match lookup("SESSION_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("invalid SESSION_TTL_MINUTES {raw:?}"))?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };

        let realtime_buffer = lookup("REALTIME_BUFFER")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_REALTIME_BUFFER);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            auth: AuthConfig::new(secret_bytes, session_ttl_minutes),
            cors_allowed_origins,
            realtime_buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("AUTH_SECRET_BASE64", SECRET)]).unwrap();
        assert_eq!(config.auth.session_ttl_minutes, 60);
        assert_eq!(config.realtime_buffer, 256);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn secret_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("AUTH_SECRET_BASE64"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load(&[("AUTH_SECRET_BASE64", "c2hvcnQ=")]).unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = load(&[
            ("AUTH_SECRET_BASE64", SECRET),
            ("CORS_ALLOWED_ORIGINS", "https://crm.nexo.test, ,http://localhost:3000"),
            ("SESSION_TTL_MINUTES", "15"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://crm.nexo.test", "http://localhost:3000"]
        );
        assert_eq!(config.auth.session_ttl_minutes, 15);
    }

    #[test]
    fn bad_ttl_is_an_error() {
        assert!(load(&[("AUTH_SECRET_BASE64", SECRET), ("SESSION_TTL_MINUTES", "0")]).is_err());
    }
}
