// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Queue Definitions
//!
//! This module provides the definition of a queue as the provisioner declares
//! it: a name plus the durable and auto-delete flags. Declarations are never
//! exclusive, never passive and never carry extra arguments.

use crate::configs::QueueConfigs;

/// Definition of a RabbitMQ queue with its configuration parameters.
///
/// This struct implements the builder pattern to create queue definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueDefinition {
    pub(crate) name: String,
    pub(crate) durable: bool,
    pub(crate) delete: bool,
}

impl QueueDefinition {
    /// Creates a new queue definition with the given name.
    ///
    /// By default, the queue is neither durable nor auto-deleted.
    ///
    /// # Parameters
    /// * `name` - The name of the queue
    ///
    /// # Returns
    /// A new queue definition with default settings
    pub fn new(name: &str) -> QueueDefinition {
        QueueDefinition {
            name: name.to_owned(),
            durable: false,
            delete: false,
        }
    }

    /// Makes the queue durable, persisting across broker restarts.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn durable(mut self) -> Self {
        self.durable = true;
        self
    }

    /// Sets the queue to auto-delete when its last consumer goes away.
    ///
    /// # Returns
    /// Self for method chaining
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn is_auto_delete(&self) -> bool {
        self.delete
    }
}

impl From<&QueueConfigs> for QueueDefinition {
    fn from(cfg: &QueueConfigs) -> Self {
        let mut def = QueueDefinition::new(&cfg.name);
        if cfg.durable {
            def = def.durable();
        }
        if cfg.auto_delete {
            def = def.delete();
        }
        def
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_flags() {
        let def = QueueDefinition::new("orders").durable();

        assert_eq!(def.name(), "orders");
        assert!(def.is_durable());
        assert!(!def.is_auto_delete());
    }

    #[test]
    fn from_queue_configs_keeps_flags() {
        let cfg = QueueConfigs {
            name: "tmp".to_owned(),
            durable: false,
            auto_delete: true,
        };

        let def = QueueDefinition::from(&cfg);

        assert_eq!(def, QueueDefinition::new("tmp").delete());
    }
}
