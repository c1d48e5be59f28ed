//! Staged sign-in routing.
//!
//! A client walks through up to three sign-in stages before the vault can
//! be opened: user credentials, backend (credential storage) credentials,
//! and the vault master key. The server reports which stages are already
//! satisfied in an [`AuthSnapshot`]; [`next_route`] turns that snapshot
//! into the next screen, honoring the deployment's backend template
//! (masked credential form, or a redirect to an external sign-in URL).

use serde::{Deserialize, Serialize};

/// Which sign-in stages the server considers satisfied.
///
/// Mirrors the authentication snapshot the backend returns; stages the
/// server omits deserialize as not satisfied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct AuthSnapshot {
    /// User credentials accepted.
    pub user: bool,
    /// Backend authenticated.
    pub backend: bool,
    /// Vault master key accepted.
    pub vault: bool,
}

impl AuthSnapshot {
    /// Snapshot with every stage satisfied.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            user: true,
            backend: true,
            vault: true,
        }
    }
}

/// How the backend sign-in stage is presented, per deployment config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackendTemplate {
    /// Masked credential form rendered by the client.
    Mask,
    /// Redirect to an external sign-in URL.
    Redirect {
        /// Absolute URL the client is sent to.
        url: String,
    },
}

impl Default for BackendTemplate {
    fn default() -> Self {
        Self::Mask
    }
}

/// Next screen in the staged sign-in cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigninRoute {
    /// Ask for user credentials; the caller must clear client-side state
    /// before presenting this screen.
    UserSignin,
    /// Ask for backend credentials with a masked form.
    BackendSignin,
    /// Send the user to an external backend sign-in URL.
    BackendRedirect {
        /// Target URL from the deployment config.
        url: String,
    },
    /// Ask for the vault master key.
    VaultUnlock,
    /// All stages satisfied; the vault may be opened.
    Ready,
}

/// Decide the next sign-in step for an auth snapshot.
///
/// The cascade order is fixed: user credentials first, then the backend,
/// then the vault master key. The backend stage honors the configured
/// template.
#[must_use]
pub fn next_route(auth: &AuthSnapshot, template: &BackendTemplate) -> SigninRoute {
    if !auth.user {
        return SigninRoute::UserSignin;
    }
    if !auth.backend {
        return match template {
            BackendTemplate::Mask => SigninRoute::BackendSignin,
            BackendTemplate::Redirect { url } => SigninRoute::BackendRedirect { url: url.clone() },
        };
    }
    if !auth.vault {
        return SigninRoute::VaultUnlock;
    }
    SigninRoute::Ready
}
