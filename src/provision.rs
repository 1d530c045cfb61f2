// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Provisioning Run
//!
//! Glues the pieces together: configuration, connection with retry, queue
//! declarations and session teardown.

use crate::{
    broker::{Broker, Session},
    configs::Configs,
    connector::Connector,
    errors::ProvisionError,
    topology::{QueueTopology, Topology},
};
use std::future::Future;
use tracing::{debug, info, warn};

/// Declares every configured queue on the broker reachable through `broker`.
///
/// The session opened by the connector is closed on every path once it
/// exists. A failure to close is logged and never replaces the outcome of the
/// declarations.
///
/// # Parameters
/// * `broker` - Broker client used to open the session
/// * `cfg` - Loaded configuration
/// * `shutdown` - Completes when the run should stop waiting for the broker
pub async fn provision<B, F>(broker: B, cfg: &Configs, shutdown: F) -> Result<(), ProvisionError>
where
    B: Broker,
    F: Future<Output = ()>,
{
    cfg.validate()?;
    let endpoint = cfg.endpoint()?;
    let definitions = cfg.queue_definitions();
    let connector = Connector::new(broker, cfg.retry_policy());

    debug!(
        endpoint = endpoint.to_string(),
        max_attempts = connector.policy().max_attempts(),
        "connecting to rabbitmq..."
    );
    let connected = connector.connect_until(&endpoint, shutdown).await?;

    let result = QueueTopology::new(&connected.session)
        .queues(&definitions)
        .install()
        .await;

    match connected.session.close().await {
        Ok(()) => debug!("session closed"),
        Err(err) => warn!(error = err.to_string(), "error to close the session"),
    }

    if result.is_ok() {
        info!(queues = definitions.len(), "topology installed");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        broker::{MockBroker, MockSession},
        configs::QueueConfigs,
        errors::{AmqpError, ConfigError},
    };
    use mockall::Sequence;

    fn configs(queues: &str) -> Configs {
        Configs::from_json(
            "inline",
            &format!(
                r#"{{"rabbitmq": {{
                    "url": "localhost",
                    "rabbitmq_default_user": "guest",
                    "rabbitmq_default_pass": "guest",
                    "rabbitmq_port": "5672",
                    "connect_max_attempts": 2,
                    "connect_retry_delay_ms": 1,
                    "queues": {queues}
                }}}}"#
            ),
        )
        .unwrap()
    }

    fn broker_with(session: MockSession) -> MockBroker {
        let mut broker = MockBroker::new();
        let mut session = Some(session);
        broker
            .expect_open()
            .times(1)
            .returning(move |_| session.take().ok_or(AmqpError::ConnectionError("gone".into())));
        broker
    }

    #[tokio::test]
    async fn declares_configured_queues_then_closes() {
        let mut seq = Sequence::new();
        let mut session = MockSession::new();
        for name in ["a", "b"] {
            session
                .expect_declare_queue()
                .withf(move |def| def.name() == name)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        session
            .expect_close()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let cfg = configs(r#"[{"name": "a", "durable": true}, {"name": "b"}]"#);

        let result = provision(broker_with(session), &cfg, std::future::pending()).await;

        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn closes_the_session_when_a_declaration_fails() {
        let mut session = MockSession::new();
        session.expect_declare_queue().times(1).returning(|def| {
            Err(AmqpError::DeclareQueueError {
                name: def.name().to_owned(),
                cause: "ACCESS_REFUSED".to_owned(),
            })
        });
        session.expect_close().times(1).returning(|| Ok(()));

        let cfg = configs(r#"[{"name": "a"}, {"name": "b"}]"#);

        let result = provision(broker_with(session), &cfg, std::future::pending()).await;

        assert!(matches!(
            result,
            Err(ProvisionError::Declaration { ref queue, .. }) if queue == "a"
        ));
    }

    #[tokio::test]
    async fn close_failure_does_not_mask_success() {
        let mut session = MockSession::new();
        session.expect_declare_queue().never();
        session
            .expect_close()
            .times(1)
            .returning(|| Err(AmqpError::CloseError("connection reset".to_owned())));

        let result = provision(broker_with(session), &configs("[]"), std::future::pending()).await;

        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn unreachable_broker_is_a_connection_error() {
        let mut broker = MockBroker::new();
        broker
            .expect_open()
            .times(2)
            .returning(|_| Err(AmqpError::ConnectionError("refused".to_owned())));

        let result = provision(broker, &configs("[]"), std::future::pending()).await;

        assert!(matches!(
            result,
            Err(ProvisionError::Connection { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn invalid_port_fails_before_connecting() {
        let mut broker = MockBroker::new();
        broker.expect_open().never();
        let mut cfg = configs("[]");
        cfg.rabbitmq.port = "not-a-port".to_owned();

        let result = provision(broker, &cfg, std::future::pending()).await;

        assert_eq!(
            result,
            Err(ProvisionError::Config(ConfigError::InvalidPort {
                value: "not-a-port".to_owned()
            }))
        );
    }

    #[tokio::test]
    async fn empty_queue_name_fails_before_connecting() {
        let mut broker = MockBroker::new();
        broker.expect_open().never();
        let mut cfg = configs(r#"[{"name": "orders"}]"#);
        cfg.rabbitmq.queues.push(QueueConfigs {
            name: String::new(),
            durable: true,
            auto_delete: false,
        });

        let result = provision(broker, &cfg, std::future::pending()).await;

        assert_eq!(
            result,
            Err(ProvisionError::Config(ConfigError::EmptyQueueName { index: 1 }))
        );
    }
}
