use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Longest accepted token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn check(&self) -> anyhow::Result<()> {
        if self.secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if !(1..=MAX_TTL_MINUTES).contains(&self.ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
                self.ttl_minutes
            );
        }
        Ok(())
    }
}

/// Argon2 cost parameters used for new password hashes.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            m_cost_kib: argon2::Params::DEFAULT_M_COST,
            t_cost: argon2::Params::DEFAULT_T_COST,
            p_cost: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown log format `{other}`"),
        }
    }
}

impl LogFormat {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(env_parse("LOG_FORMAT")?.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// When unset the service runs against the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES")?.unwrap_or(120),
        };
        jwt.check()?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            m_cost_kib: env_parse("PASSWORD_M_COST_KIB")?.unwrap_or(defaults.m_cost_kib),
            t_cost: env_parse("PASSWORD_T_COST")?.unwrap_or(defaults.t_cost),
            p_cost: env_parse("PASSWORD_P_COST")?.unwrap_or(defaults.p_cost),
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port: env_parse("APP_PORT")?.unwrap_or(defaults.port),
        };

        Ok(Self {
            database_url,
            jwt,
            password,
            server,
        })
    }
}

/// `Ok(None)` when the variable is unset; a set but unparseable value is an error.
fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {key} `{raw}`: {e}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(ttl_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: "dev-secret".into(),
            ttl_minutes,
        }
    }

    #[test]
    fn ttl_must_fit_in_range() {
        assert!(jwt(120).check().is_ok());
        assert!(jwt(MAX_TTL_MINUTES).check().is_ok());
        for bad in [0, -5, MAX_TTL_MINUTES + 1, 10_000_000_000, i64::MAX] {
            let err = jwt(bad).check().unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{bad}: {err}");
        }
    }

    #[test]
    fn blank_secret_is_rejected() {
        let cfg = JwtConfig {
            secret: "  ".into(),
            ttl_minutes: 120,
        };
        assert!(cfg.check().is_err());
    }

    #[test]
    fn log_format_parses_known_names() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn server_addr_from_parts() {
        let addr = ServerConfig::default().addr().unwrap();
        assert_eq!(addr.port(), 8080);
        let bad = ServerConfig {
            host: "not a host".into(),
            port: 1,
        };
        assert!(bad.addr().is_err());
    }
}
