// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Broker Endpoint
//!
//! Coordinates of the broker the provisioner talks to.

use lapin::uri::{AMQPAuthority, AMQPScheme, AMQPUri, AMQPUserInfo};
use std::fmt;

/// Virtual host selected when none is configured
pub const DEFAULT_VHOST: &str = "/";

/// Host, port and basic credentials of a RabbitMQ broker.
///
/// The `Display` form omits the password and is what ends up in logs; use
/// [`BrokerEndpoint::amqp_uri`] to obtain the full connection target.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    host: String,
    port: u16,
    user: String,
    password: String,
    vhost: String,
}

impl BrokerEndpoint {
    pub fn new(host: &str, port: u16, user: &str, password: &str) -> BrokerEndpoint {
        BrokerEndpoint {
            host: host.to_owned(),
            port,
            user: user.to_owned(),
            password: password.to_owned(),
            vhost: String::new(),
        }
    }

    /// Sets the virtual host. An empty vhost selects the broker default.
    pub fn vhost(mut self, vhost: &str) -> Self {
        self.vhost = vhost.to_owned();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// AMQP connection target, credentials included.
    ///
    /// Built field by field rather than parsed from a string, so credentials
    /// containing `/`, `#`, `?` or `@` reach the broker untouched.
    pub fn amqp_uri(&self) -> AMQPUri {
        let vhost = if self.vhost.is_empty() {
            DEFAULT_VHOST
        } else {
            &self.vhost
        };

        AMQPUri {
            scheme: AMQPScheme::AMQP,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.user.clone(),
                    password: self.password.clone(),
                },
                host: self.host.clone(),
                port: self.port,
            },
            vhost: vhost.to_owned(),
            ..Default::default()
        }
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "amqp://{}@{}:{}/{}",
            self.user, self.host, self.port, self.vhost
        )
    }
}

impl fmt::Debug for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("vhost", &self.vhost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_targets_default_vhost() {
        let endpoint = BrokerEndpoint::new("localhost", 5672, "guest", "pw");

        let uri = endpoint.amqp_uri();

        assert!(matches!(uri.scheme, AMQPScheme::AMQP));
        assert_eq!(uri.authority.host, endpoint.host());
        assert_eq!(uri.authority.port, endpoint.port());
        assert_eq!(uri.vhost, DEFAULT_VHOST);
    }

    #[test]
    fn credentials_with_uri_delimiters_are_kept_verbatim() {
        for password in ["pa/ss", "pa#ss", "pa?ss", "p@ss", "p:ss"] {
            let endpoint = BrokerEndpoint::new("localhost", 5672, "us/er", password);

            let uri = endpoint.amqp_uri();

            assert_eq!(uri.authority.userinfo.username, "us/er");
            assert_eq!(uri.authority.userinfo.password, password);
            assert_eq!(uri.authority.host, "localhost");
            assert_eq!(uri.authority.port, 5672);
        }
    }

    #[test]
    fn configured_vhost_is_used() {
        let endpoint = BrokerEndpoint::new("localhost", 5672, "guest", "pw").vhost("staging");

        assert_eq!(endpoint.amqp_uri().vhost, "staging");
    }

    #[test]
    fn password_never_displayed() {
        let endpoint = BrokerEndpoint::new("localhost", 5672, "guest", "pw").vhost("prod");

        assert_eq!(endpoint.to_string(), "amqp://guest@localhost:5672/prod");
        assert!(!format!("{endpoint:?}").contains("pw"));
    }
}
