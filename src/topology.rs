// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # RabbitMQ Topology Management
//!
//! This module declares the queues of a topology over an already open session.
//! Declarations are issued one at a time, in registration order, on the
//! session's single channel. The first rejected declaration stops the install;
//! the queues registered before it stay declared and nothing after it is tried.
//!
//! The main components are:
//! - `Topology` trait: Interface for topology management
//! - `QueueTopology`: Implementation of the Topology trait over a [`Session`]

use crate::{broker::Session, errors::ProvisionError, queue::QueueDefinition};
use async_trait::async_trait;
use tracing::{debug, error, info};

/// Trait defining the interface for topology management.
#[async_trait]
pub trait Topology<'tp> {
    /// Adds a queue definition to the topology.
    fn queue(self, def: &'tp QueueDefinition) -> Self;

    /// Adds every definition of `defs`, keeping their order.
    fn queues(self, defs: &'tp [QueueDefinition]) -> Self;

    /// Installs the topology to the RabbitMQ server.
    async fn install(&self) -> Result<(), ProvisionError>;
}

/// Queue-only topology installed through a borrowed session.
///
/// The session stays owned by whoever opened it and must be closed by them.
pub struct QueueTopology<'tp, S> {
    session: &'tp S,
    pub(crate) queues: Vec<&'tp QueueDefinition>,
}

impl<'tp, S> QueueTopology<'tp, S>
where
    S: Session,
{
    /// Creates a new, empty topology.
    ///
    /// # Parameters
    /// * `session` - An open session to the RabbitMQ server
    pub fn new(session: &'tp S) -> QueueTopology<'tp, S> {
        QueueTopology {
            session,
            queues: vec![],
        }
    }
}

#[async_trait]
impl<'tp, S> Topology<'tp> for QueueTopology<'tp, S>
where
    S: Session,
{
    fn queue(mut self, def: &'tp QueueDefinition) -> Self {
        self.queues.push(def);
        self
    }

    fn queues(mut self, defs: &'tp [QueueDefinition]) -> Self {
        self.queues.extend(defs.iter());
        self
    }

    /// Declares every registered queue, in order.
    ///
    /// # Returns
    /// Ok(()) when all queues were declared, or `ProvisionError::Declaration`
    /// naming the first queue the broker rejected
    async fn install(&self) -> Result<(), ProvisionError> {
        debug!(count = self.queues.len(), "installing queues...");

        for def in &self.queues {
            info!(queue = def.name(), "creating queue");

            match self.session.declare_queue(def).await {
                Err(err) => {
                    error!(
                        error = err.to_string(),
                        queue = def.name(),
                        "error to declare the queue"
                    );
                    Err(ProvisionError::Declaration {
                        queue: def.name.clone(),
                        cause: err,
                    })
                }
                _ => {
                    info!(queue = def.name(), "queue created successfully");
                    Ok(())
                }
            }?;
        }

        Ok(())
    }
}
