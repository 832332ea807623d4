//! Configuration types for invitation issuing and mail delivery.
//!
//! # Example
//!
//! ```rust
//! use tenancy::config::{InvitationConfig, TenancyConfig};
//! use chrono::Duration;
//!
//! let config = TenancyConfig {
//!     invitations: InvitationConfig {
//!         expiry: Duration::days(3),
//!         accept_url_base: "https://app.example.com/invitations".to_owned(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! assert_eq!(
//!     config.invitations.accept_url("abc"),
//!     "https://app.example.com/invitations/abc"
//! );
//! ```

use chrono::Duration;

use crate::crypto::{DEFAULT_TOKEN_LENGTH, MIN_TOKEN_LENGTH};

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct TenancyConfig {
    pub invitations: InvitationConfig,
    pub mail: MailConfig,
}

impl TenancyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longer-lived invitations and a local acceptance URL.
    pub fn development() -> Self {
        Self {
            invitations: InvitationConfig {
                expiry: Duration::days(30),
                ..InvitationConfig::default()
            },
            mail: MailConfig {
                from_address: "dev@localhost".to_owned(),
                ..MailConfig::default()
            },
        }
    }

    /// Short-lived, longer tokens.
    pub fn strict() -> Self {
        Self {
            invitations: InvitationConfig {
                expiry: Duration::days(2),
                token_length: 64,
                ..InvitationConfig::default()
            },
            mail: MailConfig::default(),
        }
    }
}

/// Settings used by the invitation issuer.
#[derive(Debug, Clone)]
pub struct InvitationConfig {
    /// How long a new invitation stays acceptable.
    ///
    /// Default: 7 days
    pub expiry: Duration,

    /// Length of generated plain tokens. Values below 32 are raised to 32.
    ///
    /// Default: 40
    pub token_length: usize,

    /// How many fresh tokens to try when the store reports a collision.
    ///
    /// Default: 3
    pub max_token_attempts: u32,

    /// Base of the acceptance link; the plain token is appended as the last
    /// path segment.
    pub accept_url_base: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry: Duration::days(7),
            token_length: DEFAULT_TOKEN_LENGTH,
            max_token_attempts: 3,
            accept_url_base: "http://localhost:3000/invitations".to_owned(),
        }
    }
}

impl InvitationConfig {
    /// Builds the acceptance URL for a plain token.
    pub fn accept_url(&self, token: &str) -> String {
        format!("{}/{token}", self.accept_url_base.trim_end_matches('/'))
    }

    /// Token length actually used by the issuer.
    #[inline]
    pub fn effective_token_length(&self) -> usize {
        self.token_length.max(MIN_TOKEN_LENGTH)
    }
}

/// Sender identity and queue sizing for outbound mail.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,

    /// Capacity of the in-process delivery queue.
    ///
    /// Default: 256
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: "no-reply@example.com".to_owned(),
            from_name: "Workspace".to_owned(),
            queue_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TenancyConfig::default();

        assert_eq!(config.invitations.expiry, Duration::days(7));
        assert_eq!(config.invitations.token_length, 40);
        assert_eq!(config.invitations.max_token_attempts, 3);
        assert_eq!(config.mail.queue_capacity, 256);
    }

    #[test]
    fn test_strict_config() {
        let config = TenancyConfig::strict();
        assert_eq!(config.invitations.expiry, Duration::days(2));
        assert_eq!(config.invitations.token_length, 64);
    }

    #[test]
    fn test_development_config() {
        let config = TenancyConfig::development();
        assert_eq!(config.invitations.expiry, Duration::days(30));
        assert_eq!(config.mail.from_address, "dev@localhost");
    }

    #[test]
    fn test_accept_url_trailing_slash() {
        let config = InvitationConfig {
            accept_url_base: "https://app.example.com/invitations/".to_owned(),
            ..Default::default()
        };
        assert_eq!(
            config.accept_url("tok"),
            "https://app.example.com/invitations/tok"
        );
    }

    #[test]
    fn test_effective_token_length_clamped() {
        let config = InvitationConfig {
            token_length: 10,
            ..Default::default()
        };
        assert_eq!(config.effective_token_length(), 32);
    }
}
