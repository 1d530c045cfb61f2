// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # AMQP Channel Management
//!
//! This module handles the creation and management of AMQP connections and channels.
//! It implements the broker capabilities on top of lapin: one connection, one
//! channel, and queue declarations issued over that channel.

use crate::{
    broker::{Broker, Session},
    endpoint::BrokerEndpoint,
    errors::AmqpError,
    queue::QueueDefinition,
};
use async_trait::async_trait;
use lapin::{
    options::QueueDeclareOptions,
    types::{FieldTable, LongString},
    Channel, Connection, ConnectionProperties,
};
use tracing::{debug, error, warn};

/// Reply code sent when closing the channel and the connection
const AMQP_REPLY_SUCCESS: u16 = 200;

/// Opens lapin sessions against a RabbitMQ server.
pub struct AmqpBroker {
    connection_name: String,
}

impl AmqpBroker {
    /// Creates a new broker client.
    ///
    /// # Parameters
    /// * `connection_name` - Name reported to RabbitMQ for every connection opened
    pub fn new(connection_name: &str) -> AmqpBroker {
        AmqpBroker {
            connection_name: connection_name.to_owned(),
        }
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    type Session = AmqpSession;

    /// Establishes a connection to RabbitMQ and creates a channel on it.
    ///
    /// If the channel cannot be created the connection is closed before the
    /// error is returned, so no half-open session ever escapes.
    ///
    /// # Parameters
    /// * `endpoint` - Broker coordinates and credentials
    ///
    /// # Returns
    /// A usable session, or an error on failure
    async fn open(&self, endpoint: &BrokerEndpoint) -> Result<AmqpSession, AmqpError> {
        debug!(endpoint = endpoint.to_string(), "creating amqp connection...");
        let options = ConnectionProperties::default()
            .with_connection_name(LongString::from(self.connection_name.clone()));

        let conn = match Connection::connect_uri(endpoint.amqp_uri(), options).await {
            Ok(c) => Ok(c),
            Err(err) => {
                debug!(error = err.to_string(), "failure to connect");
                Err(AmqpError::ConnectionError(err.to_string()))
            }
        }?;
        debug!("amqp connected");

        debug!("creating amqp channel...");
        match conn.create_channel().await {
            Ok(channel) => {
                debug!("channel created");
                Ok(AmqpSession { conn, channel })
            }
            Err(err) => {
                error!(error = err.to_string(), "error to create the channel");
                if let Err(close_err) = conn.close(AMQP_REPLY_SUCCESS, "channel failure").await {
                    warn!(
                        error = close_err.to_string(),
                        "error to close the connection"
                    );
                }
                Err(AmqpError::ChannelError(err.to_string()))
            }
        }
    }
}

/// A lapin connection together with the channel opened on it.
pub struct AmqpSession {
    conn: Connection,
    channel: Channel,
}

#[async_trait]
impl Session for AmqpSession {
    async fn declare_queue(&self, def: &QueueDefinition) -> Result<(), AmqpError> {
        match self
            .channel
            .queue_declare(
                &def.name,
                QueueDeclareOptions {
                    passive: false,
                    durable: def.durable,
                    exclusive: false,
                    auto_delete: def.delete,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await
        {
            Err(err) => Err(AmqpError::DeclareQueueError {
                name: def.name.clone(),
                cause: err.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<(), AmqpError> {
        debug!("closing amqp channel...");
        let channel_closed = self.channel.close(AMQP_REPLY_SUCCESS, "OK").await;

        // the connection goes down even if the channel was already gone
        debug!("closing amqp connection...");
        let conn_closed = self.conn.close(AMQP_REPLY_SUCCESS, "OK").await;

        channel_closed
            .and(conn_closed)
            .map_err(|err| AmqpError::CloseError(err.to_string()))
    }
}
