use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

/// Upper bound for either token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        for (key, value) in [
            ("JWT_TTL_MINUTES", self.ttl_minutes),
            ("JWT_RESET_TTL_MINUTES", self.reset_ttl_minutes),
        ] {
            if !(1..=MAX_TTL_MINUTES).contains(&value) {
                anyhow::bail!("{key} must be between 1 and {MAX_TTL_MINUTES}, got {value}");
            }
        }
        Ok(())
    }
}

/// Argon2 work factor. Changing it only affects new hashes; stored hashes
/// carry their own parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Where a freshly issued reset token goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDeliveryMode {
    /// Returned in the forgot-password response body. Development only.
    Inline,
    /// Dropped; no out-of-band channel is wired up.
    Suppressed,
}

impl FromStr for ResetDeliveryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "none" => Ok(Self::Suppressed),
            other => anyhow::bail!("unknown reset token delivery mode: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub reset_delivery: ResetDeliveryMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "taskvault".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "taskvault-users".into()),
            ttl_minutes: parse_env("JWT_TTL_MINUTES", 60 * 24 * 30)?,
            reset_ttl_minutes: parse_env("JWT_RESET_TTL_MINUTES", 60)?,
        };
        jwt.validate()?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_env("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_env("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_env("ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        let reset_delivery = parse_env("RESET_TOKEN_DELIVERY", ResetDeliveryMode::Inline)?;

        Ok(Self {
            database_url,
            jwt,
            password,
            reset_delivery,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_mode_parses_case_insensitively() {
        assert_eq!("inline".parse::<ResetDeliveryMode>().unwrap(), ResetDeliveryMode::Inline);
        assert_eq!(" NONE ".parse::<ResetDeliveryMode>().unwrap(), ResetDeliveryMode::Suppressed);
        assert!("email".parse::<ResetDeliveryMode>().is_err());
    }

    #[test]
    fn jwt_ttls_are_bounded() {
        let mut cfg = crate::auth::jwt::test_config("s");
        assert!(cfg.validate().is_ok());

        cfg.ttl_minutes = i64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));

        cfg.ttl_minutes = MAX_TTL_MINUTES;
        cfg.reset_ttl_minutes = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_RESET_TTL_MINUTES"));

        cfg.reset_ttl_minutes = 60;
        cfg.secret.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_env_falls_back_and_rejects_garbage() {
        std::env::remove_var("TASKVAULT_TEST_UNSET");
        assert_eq!(parse_env("TASKVAULT_TEST_UNSET", 42u32).unwrap(), 42);

        std::env::set_var("TASKVAULT_TEST_BAD", "lots");
        let err = parse_env::<u32>("TASKVAULT_TEST_BAD", 1).unwrap_err();
        assert!(err.to_string().contains("TASKVAULT_TEST_BAD"));
        std::env::remove_var("TASKVAULT_TEST_BAD");
    }
}
