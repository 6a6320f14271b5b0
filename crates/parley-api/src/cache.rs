use std::time::Duration;

use tokio::sync::OnceCell;
use url::Url;

use crate::error::{ApiError, ApiResult};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6379;
const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis connection parameters, read from the environment at start
///
/// `REDIS_HOST` and `REDIS_PORT` fall back to `localhost:6379`; the
/// credentials are optional and only sent when set.
#[derive(Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match non_empty("REDIS_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("REDIS_PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: non_empty("REDIS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: non_empty("REDIS_USERNAME"),
            password: non_empty("REDIS_PASSWORD"),
        })
    }

    /// `redis://[user[:password]@]host:port`, credentials percent-encoded
    pub fn connection_url(&self) -> ApiResult<Url> {
        // IPv6 literals need brackets inside a URL authority
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let mut url = Url::parse(&format!("redis://{}:{}", host, self.port))
            .map_err(|e| ApiError::Config(format!("invalid cache address: {}", e)))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| ApiError::Config("cache username rejected".to_string()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| ApiError::Config("cache password rejected".to_string()))?;
        }

        Ok(url)
    }
}

/// Process-wide Redis client, built on first use
///
/// `redis::Client` only holds connection info; connections are opened per
/// operation through the multiplexed async connection.
pub struct CacheClient {
    config: CacheConfig,
    client: OnceCell<redis::Client>,
}

impl CacheClient {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn client(&self) -> ApiResult<&redis::Client> {
        self.client
            .get_or_try_init(|| async {
                let url = self.config.connection_url()?;
                let client = redis::Client::open(url.as_str())?;
                tracing::info!(host = %self.config.host, port = self.config.port, "Cache client initialized");
                Ok::<_, ApiError>(client)
            })
            .await
    }

    pub async fn ping(&self) -> ApiResult<()> {
        let client = self.client().await?;

        let ping = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(())
        };

        match tokio::time::timeout(PING_TIMEOUT, ping).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::Config(format!(
                "cache did not answer within {}s",
                PING_TIMEOUT.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = CacheConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.connection_url().unwrap().as_str(), "redis://localhost:6379");
    }

    #[test]
    fn test_credentials_are_optional() {
        let config = CacheConfig::from_lookup(lookup(&[
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_USERNAME", ""),
        ]))
        .unwrap();

        assert_eq!(config.host, "cache.internal");
        assert_eq!(config.port, 6380);
        assert_eq!(config.username, None);
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_credentials_are_encoded() {
        let config = CacheConfig::from_lookup(lookup(&[
            ("REDIS_HOST", "cache"),
            ("REDIS_USERNAME", "app"),
            ("REDIS_PASSWORD", "p@ss:word"),
        ]))
        .unwrap();

        let url = config.connection_url().unwrap();
        assert_eq!(url.username(), "app");
        assert_eq!(url.password(), Some("p%40ss%3Aword"));
        assert_eq!(url.host_str(), Some("cache"));
        assert!(!format!("{:?}", config).contains("p@ss"));
    }

    #[test]
    fn test_ipv6_host() {
        let config = CacheConfig::from_lookup(lookup(&[("REDIS_HOST", "::1"), ("REDIS_PORT", "6380")])).unwrap();
        let url = config.connection_url().unwrap();

        assert_eq!(url.host_str(), Some("[::1]"));
        assert_eq!(url.port(), Some(6380));

        let bracketed = CacheConfig {
            host: "[fe80::2]".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(bracketed.connection_url().unwrap().host_str(), Some("[fe80::2]"));
    }

    #[test]
    fn test_bad_port() {
        let err = CacheConfig::from_lookup(lookup(&[("REDIS_PORT", "sixty")])).unwrap_err();
        assert!(err.contains("REDIS_PORT"));
    }

    #[tokio::test]
    async fn test_client_is_memoized() {
        let cache = CacheClient::new(CacheConfig::default());

        let first = cache.client().await.unwrap() as *const redis::Client;
        let second = cache.client().await.unwrap() as *const redis::Client;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        let cache = CacheClient::new(CacheConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..CacheConfig::default()
        });

        assert!(cache.ping().await.is_err());
    }
}
