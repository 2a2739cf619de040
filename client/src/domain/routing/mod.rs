//! Static route table, guards and history-backed navigation.

mod guard;
mod navigator;

use std::fmt;

pub use guard::{GuardDecision, ProtectedRoute, PublicOnlyRoute, Redirect, RouteGuard};
pub use navigator::{MAX_REDIRECTS, NavigationError, Navigator};

use super::session::SessionStore;

/// Screens the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Contact,
    Signup,
    Login,
    Forget,
    Dialog,
    InaphCreatePassword,
    InaphLogin,
    Dashboard,
    AccountInfo,
    AddNewCattle,
    ViewCattleList,
    NotFound,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Everyone.
    Open,
    /// Only visitors without a session.
    PublicOnly,
    /// Only signed-in users.
    Protected,
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub page: Page,
    pub access: Access,
}

const fn route(path: &'static str, page: Page, access: Access) -> Route {
    Route { path, page, access }
}

/// Every routable path.
pub const ROUTES: [Route; 12] = [
    route("/", Page::Home, Access::Open),
    route("/Contact", Page::Contact, Access::Open),
    route("/signup", Page::Signup, Access::PublicOnly),
    route("/login", Page::Login, Access::PublicOnly),
    route("/forget", Page::Forget, Access::PublicOnly),
    route("/dialog", Page::Dialog, Access::PublicOnly),
    route("/InaphPage", Page::InaphCreatePassword, Access::PublicOnly),
    route("/InaphLogin", Page::InaphLogin, Access::PublicOnly),
    route("/dashboard", Page::Dashboard, Access::Protected),
    route("/account-info", Page::AccountInfo, Access::Protected),
    route("/add_new_cattle", Page::AddNewCattle, Access::Protected),
    route("/view-cattle-list", Page::ViewCattleList, Access::Protected),
];

/// Where signed-in users land by default.
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Where protected routes send visitors without a session.
pub const LOGIN_PATH: &str = "/login";

/// Data carried along with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    /// The protected path a visitor was bounced from.
    ReturnTo(String),
    /// INAPH id to pre-fill on password creation.
    InaphId(String),
}

/// A path plus optional navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    state: Option<NavigationState>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: NavigationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> Option<&NavigationState> {
        self.state.as_ref()
    }

    /// Return path carried by a guard redirect.
    pub fn return_to(&self) -> Option<&str> {
        match &self.state {
            Some(NavigationState::ReturnTo(path)) => Some(path),
            _ => None,
        }
    }

    /// INAPH id carried to the password creation page.
    pub fn inaph_id(&self) -> Option<&str> {
        match &self.state {
            Some(NavigationState::InaphId(id)) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Strip a trailing slash (except from the root) and any query or fragment.
pub fn normalize_path(path: &str) -> &str {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ if path.is_empty() => "/",
        _ => path,
    }
}

/// Look up the route for `path`, ignoring ASCII case.
pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = normalize_path(path);
    ROUTES
        .iter()
        .find(|route| route.path.eq_ignore_ascii_case(path))
}

/// Outcome of resolving a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Page),
    Redirect(Redirect),
}

/// Resolve `location` against the route table and its guard.
///
/// Storage is re-read on every call, so a login or logout anywhere is
/// honoured on the next navigation.
pub fn resolve(location: &Location, session: &SessionStore) -> Resolution {
    let Some(route) = find_route(location.path()) else {
        return Resolution::Render(Page::NotFound);
    };
    let decision = match route.access {
        Access::Open => GuardDecision::Allow,
        Access::PublicOnly => PublicOnlyRoute.check(session, location),
        Access::Protected => ProtectedRoute.check(session, location),
    };
    match decision {
        GuardDecision::Allow => Resolution::Render(route.page),
        GuardDecision::Redirect(redirect) => Resolution::Redirect(redirect),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::MemoryKeyValueStore;
    use crate::domain::session::SessionRecord;
    use rstest::rstest;

    fn signed_out() -> SessionStore {
        SessionStore::new(Arc::new(MemoryKeyValueStore::new()))
    }

    fn signed_in() -> SessionStore {
        let session = signed_out();
        session
            .set(&SessionRecord::new(Some("1".into()), None, None))
            .expect("session");
        session
    }

    #[rstest]
    #[case("/dashboard/", "/dashboard")]
    #[case("/", "/")]
    #[case("", "/")]
    #[case("/login?next=1", "/login")]
    #[case("/Contact#form", "/Contact")]
    fn normalises_paths(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(raw), expected);
    }

    #[rstest]
    #[case("/", Page::Home)]
    #[case("/Contact", Page::Contact)]
    #[case("/contact", Page::Contact)]
    #[case("/CONTACT/", Page::Contact)]
    #[case("/nope", Page::NotFound)]
    #[case("/dashboards", Page::NotFound)]
    fn open_and_unknown_paths_render_for_everyone(#[case] path: &str, #[case] page: Page) {
        for session in [signed_out(), signed_in()] {
            assert_eq!(
                resolve(&Location::new(path), &session),
                Resolution::Render(page)
            );
        }
    }

    #[rstest]
    #[case("/dashboard")]
    #[case("/account-info")]
    #[case("/add_new_cattle")]
    #[case("/view-cattle-list/")]
    #[case("/Dashboard")]
    #[case("/DASHBOARD")]
    fn protected_paths_bounce_to_login(#[case] path: &str) {
        let Resolution::Redirect(redirect) = resolve(&Location::new(path), &signed_out()) else {
            panic!("expected a redirect for {path}");
        };
        assert_eq!(redirect.to.path(), LOGIN_PATH);
        assert!(redirect.replace);
        assert_eq!(redirect.to.return_to(), Some(path));
    }

    #[rstest]
    #[case("/signup")]
    #[case("/login")]
    #[case("/forget")]
    #[case("/dialog")]
    #[case("/InaphPage")]
    #[case("/InaphLogin")]
    #[case("/inaphlogin")]
    #[case("/LOGIN")]
    fn public_only_paths_bounce_to_dashboard(#[case] path: &str) {
        let Resolution::Redirect(redirect) = resolve(&Location::new(path), &signed_in()) else {
            panic!("expected a redirect for {path}");
        };
        assert_eq!(redirect.to, Location::new(DASHBOARD_PATH));
        assert!(redirect.replace);
        assert_eq!(
            resolve(&Location::new(path), &signed_out()),
            Resolution::Render(find_route(path).expect("route").page)
        );
    }

    #[test]
    fn every_route_path_is_unique() {
        for (index, route) in ROUTES.iter().enumerate() {
            assert!(
                ROUTES[index + 1..]
                    .iter()
                    .all(|other| !other.path.eq_ignore_ascii_case(route.path)),
                "duplicate path {}",
                route.path
            );
        }
    }
}
