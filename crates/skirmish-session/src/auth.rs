//! Authentication hook for validating player identity.
//!
//! Skirmish does not issue or verify credentials itself. The REST layer
//! (or any auth provider) does that; the server only asks an
//! [`Authenticator`] to turn the handshake token into a [`PlayerId`].

use skirmish_protocol::PlayerId;

use crate::SessionError;

/// Validates a client's auth token and returns their identity.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use skirmish_session::{Authenticator, SessionError};
/// use skirmish_protocol::PlayerId;
///
/// /// Treats the token as the numeric player id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
///         let id: u64 = token.parse().map_err(|_| {
///             SessionError::AuthFailed("token must be a number".into())
///         })?;
///         Ok(PlayerId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns the player's identity.
    ///
    /// Called once per connection, during the handshake.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when the token is missing, invalid or
    /// expired.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, SessionError>> + Send;
}
