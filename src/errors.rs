// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Error Types for the Queue Provisioner
//!
//! Two layers of errors live here. `AmqpError` is what a broker capability
//! reports for a single operation (connect, open channel, declare, close).
//! `ProvisionError` is the taxonomy that bubbles up to the process entrypoint,
//! enriched with the context of where the provisioning run stopped.

use thiserror::Error;

/// Represents errors that can occur during a single AMQP/RabbitMQ operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmqpError {
    /// Error establishing a connection to the RabbitMQ server
    #[error("failure to connect: {0}")]
    ConnectionError(String),

    /// Error creating a channel from an established connection
    #[error("failure to create a channel: {0}")]
    ChannelError(String),

    /// Error declaring a queue with the given name
    #[error("failure to declare a queue `{name}`: {cause}")]
    DeclareQueueError { name: String, cause: String },

    /// Error closing the channel or the connection
    #[error("failure to close the session: {0}")]
    CloseError(String),
}

/// Errors raised while loading the provisioning configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failure to read config file `{path}`: {cause}")]
    Read { path: String, cause: String },

    #[error("failure to parse config file `{path}`: {cause}")]
    Parse { path: String, cause: String },

    #[error("invalid broker port `{value}`")]
    InvalidPort { value: String },

    #[error("queue #{index} has an empty name")]
    EmptyQueueName { index: usize },

    #[error("environment variable `{key}` is not valid unicode")]
    InvalidEnv { key: String },
}

/// Top-level failure of a provisioning run.
///
/// Every variant is fatal for the process; none of them is retried above the
/// connector.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to connect to rabbitmq after {attempts} attempts: {cause}")]
    Connection { attempts: u32, cause: AmqpError },

    #[error("failed to declare queue `{queue}`: {cause}")]
    Declaration { queue: String, cause: AmqpError },

    #[error("connection attempts cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl ProvisionError {
    /// Short, stable label of the failure kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Config(_) => "config",
            ProvisionError::Connection { .. } => "connection",
            ProvisionError::Declaration { .. } => "declaration",
            ProvisionError::Cancelled { .. } => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_names_attempts_and_cause() {
        let err = ProvisionError::Connection {
            attempts: 10,
            cause: AmqpError::ConnectionError("connection refused".to_owned()),
        };

        assert_eq!(
            err.to_string(),
            "failed to connect to rabbitmq after 10 attempts: failure to connect: connection refused"
        );
        assert_eq!(err.kind(), "connection");
    }

    #[test]
    fn config_error_converts_into_provision_error() {
        let err: ProvisionError = ConfigError::InvalidPort {
            value: "abc".to_owned(),
        }
        .into();

        assert_eq!(err.kind(), "config");
        assert!(err.to_string().contains("`abc`"));
    }
}
