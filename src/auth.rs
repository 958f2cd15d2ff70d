//! Login, signup, and logout flows.
//!
//! Form rendering and field validation live with the embedder; these
//! functions cover the part the core owns: exchanging credentials for a
//! session grant and keeping the session store consistent. Failures leave
//! the store untouched and are returned for inline rendering.

use tracing::info;

use crate::error::Result;
use crate::gateway::RemoteGateway;
use crate::session::SessionStore;
use crate::shell::{Notice, Shell};
use crate::types::{Credentials, SignupProfile};

/// Exchange credentials for a session and install it.
pub async fn login(
    gateway: &dyn RemoteGateway,
    session: &SessionStore,
    shell: &dyn Shell,
    credentials: &Credentials,
) -> Result<()> {
    let grant = gateway.login(credentials).await?;
    info!(user = %grant.user.username, "logged in");
    session.set_session(grant.token, grant.user);
    shell.show_notice(Notice::success("Login successful! Welcome back!"));
    Ok(())
}

/// Create an account and install the granted session.
pub async fn signup(
    gateway: &dyn RemoteGateway,
    session: &SessionStore,
    shell: &dyn Shell,
    profile: &SignupProfile,
) -> Result<()> {
    let grant = gateway.signup(profile).await?;
    info!(user = %grant.user.username, "account created");
    session.set_session(grant.token, grant.user);
    shell.show_notice(Notice::success("Account created successfully!"));
    Ok(())
}

/// Drop the session. Total; safe to call when already signed out.
pub fn logout(session: &SessionStore) {
    session.clear_session();
    info!("logged out");
}
