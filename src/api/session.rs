use async_trait::async_trait;

use crate::WorkspaceError;
use crate::workspaces::User;

/// Resolves a bearer credential to the signed-in user.
///
/// Authentication lives outside this crate; implement this over whatever
/// issues your session or API tokens.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns `Ok(None)` for unknown or expired credentials.
    async fn resolve(&self, token: &str) -> Result<Option<User>, WorkspaceError>;
}

#[cfg(any(test, feature = "mocks"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    use super::*;

    /// Fixed token-to-user table.
    #[derive(Clone, Default)]
    pub struct MockSessionResolver {
        sessions: Arc<RwLock<HashMap<String, User>>>,
    }

    impl MockSessionResolver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers `token` as a session of `user`.
        pub fn sign_in(&self, token: &str, user: User) {
            if let Ok(mut sessions) = self.sessions.write() {
                sessions.insert(token.to_owned(), user);
            }
        }
    }

    #[async_trait]
    impl SessionResolver for MockSessionResolver {
        async fn resolve(&self, token: &str) -> Result<Option<User>, WorkspaceError> {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| WorkspaceError::Internal("lock poisoned".into()))?;
            Ok(sessions.get(token).cloned())
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockSessionResolver;
