use anyhow::Result;
use orbit_types::Role;

use crate::api::{ApiError, MediaApi};
use crate::session::SessionContext;

/// Which area of the client a screen belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Feed and browsing screens
    Consumer,
    /// Creator dashboard
    Creator,
    /// Screens open to either role (profile)
    Shared,
}

impl Surface {
    /// The surface a role lands on after login.
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Consumer => Surface::Consumer,
            Role::Creator => Surface::Creator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session is valid for the requested surface.
    Authorized { role: Role, username: String },
    /// No usable session; show the login screen.
    Unauthenticated,
    /// Session is valid but belongs on another surface.
    Redirect {
        role: Role,
        username: String,
        to: Surface,
    },
}

/// Validates the stored session against the server and routes by role.
///
/// Runs once at startup; there is no periodic re-validation.
pub struct AuthGuard<'a> {
    api: &'a dyn MediaApi,
    session: &'a SessionContext,
}

impl<'a> AuthGuard<'a> {
    pub fn new(api: &'a dyn MediaApi, session: &'a SessionContext) -> Self {
        Self { api, session }
    }

    pub async fn check(&self, surface: Surface) -> Result<GuardOutcome> {
        if !self.session.is_authenticated() {
            log::debug!("No stored token, routing to login");
            return Ok(GuardOutcome::Unauthenticated);
        }

        let verified = match self.api.verify_token().await {
            Ok(response) if response.valid => response,
            Ok(_) => {
                log::warn!("Server reported stored token as invalid");
                self.session.clear()?;
                return Ok(GuardOutcome::Unauthenticated);
            }
            // A 401 has already wiped the session inside the client
            Err(ApiError::Unauthorized) => return Ok(GuardOutcome::Unauthenticated),
            Err(ApiError::Network(e)) => {
                log::warn!("Token verification unreachable: {}", e);
                return Ok(GuardOutcome::Unauthenticated);
            }
            Err(e) => {
                log::warn!("Token verification failed: {}", e);
                self.session.clear()?;
                return Ok(GuardOutcome::Unauthenticated);
            }
        };

        let role = verified
            .role
            .or_else(|| self.session.role())
            .unwrap_or_default();
        let username = verified
            .username
            .filter(|u| !u.is_empty())
            .or_else(|| self.session.username())
            .unwrap_or_default();

        self.session.sync_identity(role, &username)?;
        log::info!("Session verified for {} ({})", username, role.as_str());

        let outcome = match (surface, role) {
            (Surface::Consumer, Role::Creator) => GuardOutcome::Redirect {
                role,
                username,
                to: Surface::Creator,
            },
            (Surface::Creator, Role::Consumer) => GuardOutcome::Redirect {
                role,
                username,
                to: Surface::Consumer,
            },
            _ => GuardOutcome::Authorized { role, username },
        };
        Ok(outcome)
    }
}
