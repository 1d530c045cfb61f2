// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Capabilities
//!
//! The connector and the topology only need two small capabilities from a
//! broker client: opening a session and, on that session, declaring a queue.
//! `channel::AmqpBroker` implements them on top of lapin; tests script them
//! with mocks.

use crate::{endpoint::BrokerEndpoint, errors::AmqpError, queue::QueueDefinition};
use async_trait::async_trait;

/// An open connection plus a channel over it.
///
/// A value of this type is always fully usable. Implementations must never
/// hand out a session whose channel failed to open.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send + Sync {
    /// Ensures the queue exists with the given properties.
    ///
    /// Declaring an existing queue with identical properties is a no-op at the
    /// broker; conflicting properties are reported as an error.
    async fn declare_queue(&self, def: &QueueDefinition) -> Result<(), AmqpError>;

    /// Closes the channel and then the connection.
    async fn close(&self) -> Result<(), AmqpError>;
}

/// Something able to open sessions against a broker endpoint.
#[cfg_attr(test, mockall::automock(type Session = MockSession;))]
#[async_trait]
pub trait Broker: Send + Sync {
    type Session: Session;

    /// Opens a connection and a channel in one go.
    async fn open(&self, endpoint: &BrokerEndpoint) -> Result<Self::Session, AmqpError>;
}
