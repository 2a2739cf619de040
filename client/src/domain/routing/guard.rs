//! Session-based route guards.
//!
//! Guards are synchronous: they read storage directly on every check, so
//! there is no "checking" state to render.

use tracing::debug;

use super::{DASHBOARD_PATH, LOGIN_PATH, Location, NavigationState};
use crate::domain::session::SessionStore;

/// Instruction to go elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Location,
    /// Replace the current history entry instead of pushing one.
    pub replace: bool,
}

/// What a guard decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Redirect),
}

/// Decides whether a location may render for the current session.
pub trait RouteGuard {
    fn check(&self, session: &SessionStore, location: &Location) -> GuardDecision;
}

/// Admits only signed-in users.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectedRoute;

impl RouteGuard for ProtectedRoute {
    fn check(&self, session: &SessionStore, location: &Location) -> GuardDecision {
        if session.is_authenticated() {
            return GuardDecision::Allow;
        }
        debug!(path = location.path(), "no session; redirecting to login");
        GuardDecision::Redirect(Redirect {
            to: Location::new(LOGIN_PATH)
                .with_state(NavigationState::ReturnTo(location.path().to_owned())),
            replace: true,
        })
    }
}

/// Admits only visitors without a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicOnlyRoute;

impl RouteGuard for PublicOnlyRoute {
    fn check(&self, session: &SessionStore, location: &Location) -> GuardDecision {
        if !session.is_authenticated() {
            return GuardDecision::Allow;
        }
        debug!(path = location.path(), "already signed in; redirecting to dashboard");
        GuardDecision::Redirect(Redirect {
            to: Location::new(DASHBOARD_PATH),
            replace: true,
        })
    }
}
