//! Invitee addresses.
//!
//! An address is stored in one canonical form so that the pending-invitation
//! check treats `Bob@Example.com` and `bob@example.com` as the same person.

use std::sync::LazyLock;

use regex::Regex;

use super::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;

#[allow(clippy::expect_used)]
static LOCAL_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+-]+$").expect("local part regex compiles"));

// at least one dot, no empty labels, alphabetic top-level label
#[allow(clippy::expect_used)]
static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9-]+\.)+[a-z]{2,}$").expect("domain regex compiles")
});

/// A normalized, checked invitee address.
///
/// ```rust
/// use tenancy::validators::InviteeEmail;
///
/// let email = InviteeEmail::parse("  Bob@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "bob@example.com");
/// assert!(InviteeEmail::parse("bob@localhost").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteeEmail(String);

impl InviteeEmail {
    /// Normalizes `raw` and checks the result.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let email = normalize_email(raw);
        validate_email(&email)?;
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for InviteeEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical form used for storage and duplicate-invitation checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks an already normalized address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };

    if local.len() > MAX_LOCAL_PART_LENGTH
        || !LOCAL_PART.is_match(local)
        || !DOMAIN.is_match(domain)
    {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}
