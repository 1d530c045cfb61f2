// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Connection With Retry
//!
//! The broker is usually started alongside the provisioner and may not accept
//! connections right away. The connector masks that window by retrying a
//! bounded number of times with a constant delay between attempts.

use crate::{broker::Broker, endpoint::BrokerEndpoint, errors::ProvisionError};
use std::{future::Future, time::Duration};
use tracing::{error, info, warn};

/// Fixed-delay, fixed-count retry policy for establishing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a new policy. At least one attempt is always made.
    ///
    /// # Parameters
    /// * `max_attempts` - Total number of connection attempts
    /// * `delay` - Constant wait between two consecutive attempts
    pub fn new(max_attempts: u32, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(10, Duration::from_secs(5))
    }
}

/// A session together with the attempt that produced it.
pub struct Connected<S> {
    pub session: S,
    /// 1-based number of the successful attempt
    pub attempts: u32,
}

/// Establishes sessions through a [`Broker`], retrying per [`RetryPolicy`].
pub struct Connector<B> {
    broker: B,
    policy: RetryPolicy,
}

impl<B> Connector<B>
where
    B: Broker,
{
    pub fn new(broker: B, policy: RetryPolicy) -> Connector<B> {
        Connector { broker, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Connects to the broker, waiting out transient unavailability.
    ///
    /// # Parameters
    /// * `endpoint` - Broker coordinates
    ///
    /// # Returns
    /// The open session, or `ProvisionError::Connection` carrying the last
    /// observed cause once every attempt failed
    pub async fn connect(
        &self,
        endpoint: &BrokerEndpoint,
    ) -> Result<Connected<B::Session>, ProvisionError> {
        self.connect_until(endpoint, std::future::pending()).await
    }

    /// Same as [`Connector::connect`], but gives up as soon as `shutdown`
    /// completes while waiting between two attempts.
    ///
    /// An attempt already in flight is never interrupted.
    pub async fn connect_until<F>(
        &self,
        endpoint: &BrokerEndpoint,
        shutdown: F,
    ) -> Result<Connected<B::Session>, ProvisionError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            match self.broker.open(endpoint).await {
                Ok(session) => {
                    info!(
                        endpoint = endpoint.to_string(),
                        attempt, "connected to rabbitmq"
                    );
                    return Ok(Connected {
                        session,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    warn!(
                        error = err.to_string(),
                        attempt, max_attempts, "failed to connect to rabbitmq"
                    );

                    if attempt >= max_attempts {
                        error!(attempts = attempt, "connection attempts exhausted");
                        return Err(ProvisionError::Connection {
                            attempts: attempt,
                            cause: err,
                        });
                    }
                }
            }

            info!(delay = ?self.policy.delay, "retrying...");
            tokio::select! {
                _ = tokio::time::sleep(self.policy.delay) => {}
                _ = &mut shutdown => {
                    warn!(attempts = attempt, "connection attempts cancelled");
                    return Err(ProvisionError::Cancelled { attempts: attempt });
                }
            }

            attempt += 1;
        }
    }
}
