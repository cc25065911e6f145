//! Route guard
//!
//! Decides whether a view may render for the current session. The decision
//! is a pure function of the session snapshot; [`GuardedRoute`] re-runs it
//! whenever the principal changes.

use super::session::{SessionPrincipal, SessionState};
use tokio::sync::watch;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Any signed-in principal
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectTo(&'static str),
}

/// Session present and role sufficient: allow. Otherwise redirect to the
/// sign-in view matching the requirement.
pub fn decide(session: &SessionState, requirement: RouteRequirement) -> RouteDecision {
    match (requirement, session.principal.as_ref()) {
        (RouteRequirement::Authenticated, Some(_)) => RouteDecision::Allow,
        (RouteRequirement::Authenticated, None) => RouteDecision::RedirectTo(LOGIN_PATH),
        (RouteRequirement::Admin, Some(p)) if p.is_admin() => RouteDecision::Allow,
        (RouteRequirement::Admin, _) => RouteDecision::RedirectTo(ADMIN_LOGIN_PATH),
    }
}

/// A view bound to a requirement, tracking the live session
pub struct GuardedRoute {
    requirement: RouteRequirement,
    session: watch::Receiver<SessionState>,
    seen: Option<SessionPrincipal>,
}

impl GuardedRoute {
    pub fn new(requirement: RouteRequirement, mut session: watch::Receiver<SessionState>) -> Self {
        let seen = session.borrow_and_update().principal.clone();
        Self {
            requirement,
            session,
            seen,
        }
    }

    pub fn requirement(&self) -> RouteRequirement {
        self.requirement
    }

    pub fn decision(&self) -> RouteDecision {
        decide(&self.session.borrow(), self.requirement)
    }

    /// Wait for the next principal change and return the fresh decision.
    /// Changes to pending/error flags alone do not wake the caller.
    /// Returns `None` once the session store is dropped.
    pub async fn changed(&mut self) -> Option<RouteDecision> {
        loop {
            self.session.changed().await.ok()?;
            let state = self.session.borrow_and_update().clone();
            if state.principal != self.seen {
                self.seen = state.principal.clone();
                return Some(decide(&state, self.requirement));
            }
        }
    }
}
