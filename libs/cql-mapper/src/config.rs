//! Layered configuration for the mapper and the demo programs.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults (a local single-node cluster)
//! 2. a YAML file: `$CQL_MAPPER_CONFIG`, else `cql-mapper.yaml` in the working directory
//! 3. environment variables `CQL_MAPPER__<SECTION>__<KEY>`
//!
//! ```yaml
//! session:
//!   contact_points: ["10.0.0.1:9042", "10.0.0.2:9042"]
//!   local_datacenter: dc1
//!   credentials:
//!     username: cassandra
//!     password: cassandra
//!   connection_timeout: 5s
//!   default_profile:
//!     request_timeout: 2s
//!     consistency: local_quorum
//!   profiles:
//!     slow:
//!       request_timeout: 10s
//! logging:
//!   level: debug
//!   format: json
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use scylla::statement::Consistency;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{MapperError, Result};

/// Environment variable naming an explicit YAML config file.
pub const CONFIG_PATH_ENV: &str = "CQL_MAPPER_CONFIG";
/// YAML file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "cql-mapper.yaml";
/// Prefix of environment overrides; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "CQL_MAPPER__";
/// Execution profile used for schema changes.
pub const SLOW_PROFILE: &str = "slow";

/// Text settings taken verbatim from the environment, so `0123` or `1.50`
/// keep their spelling instead of going through `Env`'s number parsing.
const VERBATIM_ENV_KEYS: [&str; 3] = [
    "session.local_datacenter",
    "session.credentials.username",
    "session.credentials.password",
];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Cluster connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// `host:port` pairs used to discover the cluster.
    pub contact_points: Vec<String>,
    /// Datacenter preferred by load balancing; any datacenter when unset.
    #[serde(deserialize_with = "lenient::option_string")]
    pub local_datacenter: Option<String>,
    pub credentials: Option<Credentials>,
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,
    /// Settings applied to every statement without an explicit profile.
    pub default_profile: ProfileConfig,
    /// Named execution profiles, selectable per statement.
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contact_points: vec!["127.0.0.1:9042".to_owned()],
            local_datacenter: None,
            credentials: None,
            connection_timeout: Duration::from_secs(5),
            default_profile: ProfileConfig {
                request_timeout: Some(Duration::from_secs(2)),
                consistency: Some(ConsistencyLevel::LocalOne),
            },
            profiles: BTreeMap::from([(
                SLOW_PROFILE.to_owned(),
                ProfileConfig {
                    request_timeout: Some(Duration::from_secs(10)),
                    consistency: None,
                },
            )]),
        }
    }
}

/// Plain-text authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(deserialize_with = "lenient::string")]
    pub username: String,
    #[serde(skip_serializing, deserialize_with = "lenient::secret")]
    pub password: SecretString,
}

/// Text fields that may arrive as numbers or booleans, e.g. an unquoted
/// `password: 123456` in YAML.
mod lenient {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Bool(bool),
    }

    impl From<Scalar> for String {
        fn from(scalar: Scalar) -> Self {
            match scalar {
                Scalar::Text(text) => text,
                Scalar::Unsigned(n) => n.to_string(),
                Scalar::Signed(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Scalar::deserialize(deserializer).map(String::from)
    }

    pub fn option_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
    }

    pub fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
        string(deserializer).map(SecretString::from)
    }
}

/// Request settings of one execution profile. Unset fields inherit the
/// default profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub consistency: Option<ConsistencyLevel>,
}

impl ProfileConfig {
    /// Fills unset fields from `base`.
    #[must_use]
    pub fn inherit(&self, base: &ProfileConfig) -> ProfileConfig {
        ProfileConfig {
            request_timeout: self.request_timeout.or(base.request_timeout),
            consistency: self.consistency.or(base.consistency),
        }
    }
}

/// Consistency levels accepted in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl From<ConsistencyLevel> for Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl MapperConfig {
    /// Loads configuration from defaults, the YAML file and the environment.
    ///
    /// # Errors
    /// Returns an error if `CQL_MAPPER_CONFIG` names a missing file, a source
    /// fails to parse, or the merged configuration is invalid.
    pub fn load() -> Result<Self> {
        Self::from_figment(&Self::figment()?)
    }

    /// The provider stack used by [`MapperConfig::load`].
    ///
    /// # Errors
    /// Returns `MapperError::InvalidConfig` if `CQL_MAPPER_CONFIG` names a
    /// file that does not exist.
    pub fn figment() -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(MapperConfig::default()));

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !Path::new(&path).is_file() {
                return Err(MapperError::InvalidConfig(format!(
                    "{CONFIG_PATH_ENV} points to '{path}', which is not a file"
                )));
            }
            figment = figment.merge(Yaml::file_exact(path));
        } else if Path::new(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Yaml::file_exact(DEFAULT_CONFIG_FILE));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        for key in VERBATIM_ENV_KEYS {
            let var = format!("{ENV_PREFIX}{}", key.replace('.', "__").to_uppercase());
            if let Ok(raw) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(key, raw));
            }
        }
        Ok(figment)
    }

    /// Extracts and validates configuration from any figment.
    ///
    /// # Errors
    /// Returns an error if extraction fails or the configuration is invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: MapperConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `MapperError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let session = &self.session;
        if session.contact_points.is_empty() {
            return Err(MapperError::InvalidConfig(
                "session.contact_points must not be empty".to_owned(),
            ));
        }
        if let Some(point) = session.contact_points.iter().find(|p| p.trim().is_empty()) {
            return Err(MapperError::InvalidConfig(format!(
                "session.contact_points contains an empty entry '{point}'"
            )));
        }
        if session.connection_timeout.is_zero() {
            return Err(MapperError::InvalidConfig(
                "session.connection_timeout must be greater than zero".to_owned(),
            ));
        }
        if let Some(name) = session.profiles.keys().find(|name| name.trim().is_empty()) {
            return Err(MapperError::InvalidConfig(format!(
                "session.profiles contains an invalid profile name '{name}'"
            )));
        }
        if let Some(credentials) = &session.credentials
            && credentials.username.is_empty()
        {
            return Err(MapperError::InvalidConfig(
                "session.credentials.username must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
