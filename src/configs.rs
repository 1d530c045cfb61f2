// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Provisioner Configuration
//!
//! The configuration is a JSON document with a single `rabbitmq` section holding
//! the broker coordinates, the connection retry policy and the list of queues to
//! declare. Broker coordinates can be overridden by environment variables, which
//! always win over the document.
//!
//! The configuration is loaded once by the binary and handed down by reference;
//! nothing in the crate keeps it in global state.

use crate::{
    connector::RetryPolicy,
    endpoint::BrokerEndpoint,
    errors::ConfigError,
    queue::QueueDefinition,
};
use serde::{Deserialize, Deserializer};
use std::{ffi::OsString, path::Path, time::Duration};
use tracing::{debug, info};

/// Environment variable overriding the broker host
pub const ENV_RABBITMQ_URL: &str = "RABBITMQ_URL";
/// Environment variable overriding the broker user
pub const ENV_RABBITMQ_DEFAULT_USER: &str = "RABBITMQ_DEFAULT_USER";
/// Environment variable overriding the broker password
pub const ENV_RABBITMQ_DEFAULT_PASS: &str = "RABBITMQ_DEFAULT_PASS";
/// Environment variable overriding the AMQP port
pub const ENV_RABBITMQ_PORT: &str = "RABBITMQ_PORT";
/// Environment variable overriding the management port
pub const ENV_RABBITMQ_ADMIN_PORT: &str = "RABBITMQ_ADMIN_PORT";
/// Environment variable overriding the virtual host
pub const ENV_RABBITMQ_VHOST: &str = "RABBITMQ_VHOST";

/// Default number of connection attempts
pub const DEFAULT_CONNECT_MAX_ATTEMPTS: u32 = 10;
/// Default delay between connection attempts, in milliseconds
pub const DEFAULT_CONNECT_RETRY_DELAY_MS: u64 = 5_000;

/// Root of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Configs {
    #[serde(default)]
    pub rabbitmq: RabbitMQConfigs,
}

/// The `rabbitmq` section of the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RabbitMQConfigs {
    #[serde(rename = "url", default)]
    pub host: String,

    #[serde(rename = "rabbitmq_default_user", default)]
    pub user: String,

    #[serde(rename = "rabbitmq_default_pass", default)]
    pub password: String,

    /// Read from `rabbitmq_port` or `port`. The two keys are mutually
    /// exclusive: a document carrying both fails to parse.
    #[serde(
        rename = "rabbitmq_port",
        alias = "port",
        default,
        deserialize_with = "string_or_number"
    )]
    pub port: String,

    /// Management port, read from `rabbitmq_admin_port` or `admin_port` (not
    /// both). Carried for completeness, the provisioner only speaks AMQP.
    #[serde(
        rename = "rabbitmq_admin_port",
        alias = "admin_port",
        default,
        deserialize_with = "string_or_number"
    )]
    pub admin_port: String,

    #[serde(default)]
    pub vhost: String,

    #[serde(default = "default_connect_max_attempts")]
    pub connect_max_attempts: u32,

    #[serde(default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,

    #[serde(default)]
    pub queues: Vec<QueueConfigs>,
}

impl Default for RabbitMQConfigs {
    fn default() -> Self {
        RabbitMQConfigs {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            port: String::new(),
            admin_port: String::new(),
            vhost: String::new(),
            connect_max_attempts: DEFAULT_CONNECT_MAX_ATTEMPTS,
            connect_retry_delay_ms: DEFAULT_CONNECT_RETRY_DELAY_MS,
            queues: vec![],
        }
    }
}

/// One entry of `rabbitmq.queues`. The name must not be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueueConfigs {
    pub name: String,

    #[serde(default)]
    pub durable: bool,

    #[serde(default)]
    pub auto_delete: bool,
}

fn default_connect_max_attempts() -> u32 {
    DEFAULT_CONNECT_MAX_ATTEMPTS
}

fn default_connect_retry_delay_ms() -> u64 {
    DEFAULT_CONNECT_RETRY_DELAY_MS
}

/// Ports show up both as `"5672"` and `5672` in the wild.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl Configs {
    /// Loads the configuration from a JSON file and applies the process
    /// environment overrides.
    ///
    /// The path is resolved to an absolute path before reading so that error
    /// messages point at the exact file.
    ///
    /// # Parameters
    /// * `path` - Path to the JSON document
    ///
    /// # Returns
    /// The loaded configuration, or a `ConfigError` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Configs, ConfigError> {
        let abs = std::path::absolute(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            cause: err.to_string(),
        })?;
        let label = abs.display().to_string();

        debug!(path = label, "reading config file...");
        let content = std::fs::read_to_string(&abs).map_err(|err| ConfigError::Read {
            path: label.clone(),
            cause: err.to_string(),
        })?;

        let mut cfg = Configs::from_json(&label, &content)?;
        cfg.override_with_env(|key| std::env::var_os(key))?;

        info!(
            path = label,
            queues = cfg.rabbitmq.queues.len(),
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Parses and validates a JSON document without touching the environment.
    ///
    /// # Parameters
    /// * `path` - Label used in error messages
    /// * `content` - The JSON document
    pub fn from_json(path: &str, content: &str) -> Result<Configs, ConfigError> {
        let cfg: Configs = serde_json::from_str(content).map_err(|err| ConfigError::Parse {
            path: path.to_owned(),
            cause: err.to_string(),
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects queue entries the broker would misread.
    ///
    /// An empty name asks the broker for a server-named queue, which is never
    /// what a provisioning document means.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .rabbitmq
            .queues
            .iter()
            .position(|queue| queue.name.is_empty())
        {
            Some(index) => Err(ConfigError::EmptyQueueName { index }),
            None => Ok(()),
        }
    }

    /// Overrides broker coordinates with values from the environment.
    ///
    /// A variable that is set, even to an empty string, replaces the document
    /// value. A set variable that is not valid unicode is an error rather than
    /// being skipped.
    ///
    /// # Parameters
    /// * `lookup` - Returns the value of an environment variable, if set
    pub fn override_with_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let rabbitmq = &mut self.rabbitmq;
        let fields: [(&str, &mut String); 6] = [
            (ENV_RABBITMQ_URL, &mut rabbitmq.host),
            (ENV_RABBITMQ_DEFAULT_USER, &mut rabbitmq.user),
            (ENV_RABBITMQ_DEFAULT_PASS, &mut rabbitmq.password),
            (ENV_RABBITMQ_PORT, &mut rabbitmq.port),
            (ENV_RABBITMQ_ADMIN_PORT, &mut rabbitmq.admin_port),
            (ENV_RABBITMQ_VHOST, &mut rabbitmq.vhost),
        ];

        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = value.into_string().map_err(|_| ConfigError::InvalidEnv {
                    key: key.to_owned(),
                })?;
                debug!(key, "config overridden by environment");
            }
        }

        Ok(())
    }

    /// Builds the broker endpoint from the configured coordinates.
    pub fn endpoint(&self) -> Result<BrokerEndpoint, ConfigError> {
        let port = self
            .rabbitmq
            .port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort {
                value: self.rabbitmq.port.clone(),
            })?;

        Ok(BrokerEndpoint::new(
            &self.rabbitmq.host,
            port,
            &self.rabbitmq.user,
            &self.rabbitmq.password,
        )
        .vhost(&self.rabbitmq.vhost))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.rabbitmq.connect_max_attempts,
            Duration::from_millis(self.rabbitmq.connect_retry_delay_ms),
        )
    }

    /// Queue definitions in document order.
    pub fn queue_definitions(&self) -> Vec<QueueDefinition> {
        self.rabbitmq
            .queues
            .iter()
            .map(QueueDefinition::from)
            .collect()
    }
}
