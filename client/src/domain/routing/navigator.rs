//! History stack that applies guards on every navigation.

use tracing::{debug, info};

use super::{
    Access, DASHBOARD_PATH, Location, Page, Resolution, find_route, resolve,
};
use crate::domain::session::{SessionStore, SessionStoreError};

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("redirect loop while navigating to {path}")]
    RedirectLoop { path: String },
    #[error("could not end the session: {0}")]
    Session(#[from] SessionStoreError),
}

/// Browser-style history for one client.
#[derive(Debug)]
pub struct Navigator {
    session: SessionStore,
    history: Vec<Location>,
    current: Option<Page>,
}

impl Navigator {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            history: Vec::new(),
            current: None,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Current location, if any navigation has happened.
    pub fn location(&self) -> Option<&Location> {
        self.history.last()
    }

    /// Page on screen.
    pub fn page(&self) -> Option<Page> {
        self.current
    }

    pub fn history(&self) -> &[Location] {
        &self.history
    }

    /// Push `location` and render whatever its guards allow.
    pub fn navigate(&mut self, location: Location) -> Result<Page, NavigationError> {
        self.go(location, false)
    }

    /// Replace the current entry with `location`.
    pub fn replace(&mut self, location: Location) -> Result<Page, NavigationError> {
        self.go(location, true)
    }

    fn go(&mut self, location: Location, replace: bool) -> Result<Page, NavigationError> {
        let requested = location.path().to_owned();
        let mut location = location;
        let mut replace = replace;
        for _ in 0..=MAX_REDIRECTS {
            if replace {
                self.history.pop();
            }
            self.history.push(location.clone());
            match resolve(&location, &self.session) {
                Resolution::Render(page) => {
                    debug!(path = location.path(), ?page, "rendering");
                    self.current = Some(page);
                    return Ok(page);
                }
                Resolution::Redirect(redirect) => {
                    debug!(from = location.path(), to = redirect.to.path(), "guard redirect");
                    replace = redirect.replace;
                    location = redirect.to;
                }
            }
        }
        Err(NavigationError::RedirectLoop { path: requested })
    }

    /// Step back one entry, re-checking guards for the entry uncovered.
    pub fn back(&mut self) -> Result<Option<Page>, NavigationError> {
        if self.history.len() < 2 {
            return Ok(None);
        }
        self.history.pop();
        let Some(previous) = self.history.pop() else {
            return Ok(None);
        };
        self.navigate(previous).map(Some)
    }

    /// Where to go after a successful login.
    ///
    /// The return path carried by the guard redirect is used once, and only
    /// when it still names a protected route; otherwise the dashboard.
    pub fn post_login_target(&self) -> Location {
        self.location()
            .and_then(Location::return_to)
            .filter(|path| find_route(path).is_some_and(|route| route.access == Access::Protected))
            .map_or_else(|| Location::new(DASHBOARD_PATH), Location::new)
    }

    /// Leave the login page for the post-login destination.
    pub fn after_login(&mut self) -> Result<Page, NavigationError> {
        let target = self.post_login_target();
        info!(to = target.path(), "signed in");
        self.replace(target)
    }

    /// End the session and return home.
    pub fn logout(&mut self) -> Result<Page, NavigationError> {
        self.session.clear()?;
        info!("signed out");
        self.navigate(Location::new("/"))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::MemoryKeyValueStore;
    use crate::domain::routing::{LOGIN_PATH, NavigationState};
    use crate::domain::session::SessionRecord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn navigator() -> Navigator {
        Navigator::new(SessionStore::new(Arc::new(MemoryKeyValueStore::new())))
    }

    fn sign_in(navigator: &Navigator) {
        navigator
            .session()
            .set(&SessionRecord::new(Some("5".into()), Some("Asha".into()), None))
            .expect("session");
    }

    #[rstest]
    fn bounced_visit_replaces_history_and_carries_return_path(mut navigator: Navigator) {
        navigator.navigate(Location::new("/")).expect("home");

        let page = navigator
            .navigate(Location::new("/add_new_cattle"))
            .expect("navigate");

        assert_eq!(page, Page::Login);
        let paths: Vec<_> = navigator.history().iter().map(Location::path).collect();
        assert_eq!(paths, vec!["/", LOGIN_PATH]);
        assert_eq!(
            navigator.location().and_then(Location::state),
            Some(&NavigationState::ReturnTo("/add_new_cattle".into()))
        );
    }

    #[rstest]
    fn login_returns_to_the_attempted_page_once(mut navigator: Navigator) {
        navigator
            .navigate(Location::new("/view-cattle-list"))
            .expect("navigate");
        sign_in(&navigator);

        assert_eq!(navigator.after_login().expect("after login"), Page::ViewCattleList);
        assert_eq!(navigator.post_login_target(), Location::new(DASHBOARD_PATH));
    }

    #[rstest]
    fn login_without_return_path_lands_on_dashboard(mut navigator: Navigator) {
        navigator.navigate(Location::new("/login")).expect("login page");
        sign_in(&navigator);

        assert_eq!(navigator.after_login().expect("after login"), Page::Dashboard);
    }

    #[rstest]
    fn return_path_to_a_public_page_is_ignored(navigator: Navigator) {
        let mut navigator = navigator;
        navigator
            .navigate(
                Location::new("/login").with_state(NavigationState::ReturnTo("/signup".into())),
            )
            .expect("login");
        assert_eq!(navigator.post_login_target(), Location::new(DASHBOARD_PATH));
    }

    #[rstest]
    fn logout_clears_session_and_guards_apply_again(mut navigator: Navigator) {
        sign_in(&navigator);
        assert_eq!(
            navigator.navigate(Location::new("/dashboard")).expect("dash"),
            Page::Dashboard
        );

        assert_eq!(navigator.logout().expect("logout"), Page::Home);
        assert!(!navigator.session().is_authenticated());
        assert_eq!(
            navigator.navigate(Location::new("/dashboard")).expect("dash"),
            Page::Login
        );
    }

    #[rstest]
    fn signed_in_users_skip_public_pages(mut navigator: Navigator) {
        sign_in(&navigator);
        assert_eq!(
            navigator.navigate(Location::new("/signup")).expect("signup"),
            Page::Dashboard
        );
        assert_eq!(navigator.history().len(), 1);
    }

    #[rstest]
    fn back_rechecks_guards(mut navigator: Navigator) {
        navigator.navigate(Location::new("/login")).expect("login");
        navigator.navigate(Location::new("/Contact")).expect("contact");
        sign_in(&navigator);

        assert_eq!(navigator.back().expect("back"), Some(Page::Dashboard));
        assert_eq!(navigator.back().expect("back"), None);
    }
}
