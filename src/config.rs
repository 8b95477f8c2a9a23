use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::i18n::Locale;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Origin the `/api/*` proxy route forwards to.
    pub backend_url: String,
    /// Base URL the operator commands call, `/api` included.
    pub api_base_url: String,
    pub database_url: String,
    pub locale: Locale,
    /// Seconds between live status checks of an opened verification.
    pub status_poll_secs: u32,
}

impl Config {
    pub fn load() -> Self {
        Self {
            bind_addr: try_load("BIND_ADDR", "0.0.0.0".to_string()),
            port: try_load("PORT", 3000),
            backend_url: trim_slash(try_load("BACKEND_URL", "http://localhost:5001".to_string())),
            api_base_url: trim_slash(try_load(
                "API_BASE_URL",
                "http://localhost:5001/api".to_string(),
            )),
            database_url: try_load("DATABASE_URL", "sqlite://dashboard.db".to_string()),
            locale: Locale::from_tag(&try_load("DASHBOARD_LANG", "id".to_string())),
            status_poll_secs: try_load("STATUS_POLL_SECS", 30u32).max(1),
        }
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_or_default(key, env::var(key).ok(), default)
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_fall_back_to_default() {
        let port: u16 = parse_or_default("PORT", Some("not-a-port".into()), 3000);
        assert_eq!(port, 3000);

        let port: u16 = parse_or_default("PORT", Some("8081".into()), 3000);
        assert_eq!(port, 8081);

        let port: u16 = parse_or_default("PORT", None, 3000);
        assert_eq!(port, 3000);
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(trim_slash("http://backend:5001/".into()), "http://backend:5001");
        assert_eq!(trim_slash("http://backend:5001/api".into()), "http://backend:5001/api");
    }
}
