use std::{collections::HashMap, env, path::Path, time::Duration};

use crate::{domain::UserId, errors::Error, Result};

pub const DEFAULT_JSONBIN_BASE_URL: &str = "https://api.jsonbin.io/v3";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Typed configuration, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub telegram_api_url: Option<String>,
    pub admin_id: Option<String>,

    // JSONBin
    pub jsonbin_api_key: Option<String>,
    pub jsonbin_bin_id: Option<String>,
    pub jsonbin_base_url: String,

    // Outbound HTTP
    pub http_timeout: Duration,
    pub throttle_enabled: bool,

    // Webhook server
    pub bind_addr: String,
    pub port: u16,
}

impl Config {
    /// Load from the process environment, falling back to `./.env` for keys
    /// the environment does not set. The process environment is never modified.
    pub fn load() -> Result<Self> {
        let dotenv = read_dotenv(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_token = get("TELEGRAM_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_TOKEN environment variable is required".to_string())
        })?;
        let telegram_api_url = get("TELEGRAM_API_URL");
        let admin_id = get("ADMIN_ID");

        let jsonbin_api_key = get("JSONBIN_API_KEY");
        let jsonbin_bin_id = get("JSONBIN_BIN_ID");
        let jsonbin_base_url = get("JSONBIN_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_JSONBIN_BASE_URL.to_string());

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_u64("HTTP_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_HTTP_TIMEOUT,
        };
        let throttle_enabled = get("BROADCAST_THROTTLE")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT must be a port number: {e}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            telegram_token,
            telegram_api_url,
            admin_id,
            jsonbin_api_key,
            jsonbin_bin_id,
            jsonbin_base_url,
            http_timeout,
            throttle_enabled,
            bind_addr,
            port,
        })
    }

    /// The admin check compares decimal string forms, so an `ADMIN_ID` that
    /// is not a number simply never matches.
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_id
            .as_deref()
            .is_some_and(|admin| admin == user.0.to_string())
    }

    /// `(api_key, bin_id)` when both store credentials are configured.
    pub fn jsonbin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.jsonbin_api_key, &self.jsonbin_bin_id) {
            (Some(key), Some(bin)) => Some((key.as_str(), bin.as_str())),
            _ => None,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Entries of a dotenv file; a missing file is an empty map.
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(Error::Config(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    iter.map(|item| {
        item.map_err(|e| Error::Config(format!("invalid line in {}: {e}", path.display())))
    })
    .collect()
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}")))
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = cfg_from(&[("ADMIN_ID", "1")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = cfg_from(&[("TELEGRAM_TOKEN", "   ")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let cfg = cfg_from(&[("TELEGRAM_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.telegram_token, "123:abc");
        assert_eq!(cfg.admin_id, None);
        assert_eq!(cfg.jsonbin_base_url, DEFAULT_JSONBIN_BASE_URL);
        assert_eq!(cfg.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(cfg.throttle_enabled);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8080");
        assert!(cfg.jsonbin_credentials().is_none());
    }

    #[test]
    fn store_credentials_need_both_values() {
        let cfg = cfg_from(&[("TELEGRAM_TOKEN", "t"), ("JSONBIN_API_KEY", "key")]).unwrap();
        assert!(cfg.jsonbin_credentials().is_none());

        let cfg = cfg_from(&[
            ("TELEGRAM_TOKEN", "t"),
            ("JSONBIN_API_KEY", "key"),
            ("JSONBIN_BIN_ID", "bin"),
            ("JSONBIN_BASE_URL", "http://localhost:9000/v3/"),
        ])
        .unwrap();
        assert_eq!(cfg.jsonbin_credentials(), Some(("key", "bin")));
        assert_eq!(cfg.jsonbin_base_url, "http://localhost:9000/v3");
    }

    #[test]
    fn admin_match_is_string_comparison() {
        let cfg = cfg_from(&[("TELEGRAM_TOKEN", "t"), ("ADMIN_ID", " 42 ")]).unwrap();
        assert!(cfg.is_admin(UserId(42)));
        assert!(!cfg.is_admin(UserId(4)));

        let cfg = cfg_from(&[("TELEGRAM_TOKEN", "t"), ("ADMIN_ID", "042")]).unwrap();
        assert!(!cfg.is_admin(UserId(42)));

        let cfg = cfg_from(&[("TELEGRAM_TOKEN", "t")]).unwrap();
        assert!(!cfg.is_admin(UserId(42)));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(cfg_from(&[("TELEGRAM_TOKEN", "t"), ("PORT", "http")]).is_err());
        assert!(cfg_from(&[("TELEGRAM_TOKEN", "t"), ("HTTP_TIMEOUT_SECS", "-1")]).is_err());

        let cfg = cfg_from(&[
            ("TELEGRAM_TOKEN", "t"),
            ("PORT", "3000"),
            ("HTTP_TIMEOUT_SECS", "3"),
            ("BROADCAST_THROTTLE", "off"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
        assert!(!cfg.throttle_enabled);
    }

    fn write_tmp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::path::PathBuf::from(format!(
            "/tmp/tally-config-{}-{name}.env",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn dotenv_handles_comments_quotes_and_export() {
        let path = write_tmp(
            "syntax",
            "# comment\nADMIN_ID=42 # owner\nexport TELEGRAM_TOKEN=t\nJSONBIN_BIN_ID=\"bin 1\"\nJSONBIN_API_KEY='k$ey'\n",
        );
        let parsed = read_dotenv(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(parsed.get("ADMIN_ID").map(String::as_str), Some("42"));
        assert_eq!(parsed.get("TELEGRAM_TOKEN").map(String::as_str), Some("t"));
        assert_eq!(parsed.get("JSONBIN_BIN_ID").map(String::as_str), Some("bin 1"));
        assert_eq!(parsed.get("JSONBIN_API_KEY").map(String::as_str), Some("k$ey"));
        assert_eq!(parsed.len(), 4);
    }

    #[test]
    fn missing_dotenv_is_empty() {
        let path = std::path::Path::new("/tmp/tally-config-does-not-exist.env");
        assert!(read_dotenv(path).unwrap().is_empty());
    }

    #[test]
    fn dotenv_values_feed_config() {
        let path = write_tmp("config", "TELEGRAM_TOKEN=from-file\nADMIN_ID=42 # owner\n");
        let dotenv = read_dotenv(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let env_token = Some("from-env".to_string());
        let cfg = Config::from_lookup(|key| match key {
            "TELEGRAM_TOKEN" => env_token.clone(),
            _ => None,
        }
        .or_else(|| dotenv.get(key).cloned()))
        .unwrap();
        assert_eq!(cfg.telegram_token, "from-env");
        assert!(cfg.is_admin(UserId(42)));
    }
}
