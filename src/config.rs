use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub request_timeout_secs: u64,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let db = DbConfig {
            url: required("DATABASE_URL")?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        };
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60 * 24)?,
        };
        if jwt.secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if jwt.ttl_minutes <= 0 {
            anyhow::bail!("JWT_TTL_MINUTES must be positive, got {}", jwt.ttl_minutes);
        }

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8082)?,
            db,
            jwt,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.bind_addr(), "0.0.0.0:8082");
        assert_eq!(cfg.jwt.ttl_minutes, 1440);
        assert_eq!(cfg.db.max_connections, 10);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert!(!cfg.cookie_secure);
    }

    #[test]
    fn missing_signing_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn empty_signing_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", ""),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "k"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn non_positive_token_ttl_is_an_error() {
        for ttl in ["0", "-5"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "k"),
                ("JWT_TTL_MINUTES", ttl),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "ttl {ttl}");
        }
    }

    #[test]
    fn overrides_are_honoured() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "k"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "9000"),
            ("JWT_TTL_MINUTES", "5"),
            ("COOKIE_SECURE", "true"),
        ]))
        .expect("config should load");
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.jwt.ttl_minutes, 5);
        assert!(cfg.cookie_secure);
    }
}
