//! HTTP-facing types and the authentication seam.

mod session;
mod types;

pub use session::SessionResolver;
#[cfg(any(test, feature = "mocks"))]
pub use session::MockSessionResolver;
pub use types::*;

#[cfg(feature = "axum_api")]
pub mod axum;
