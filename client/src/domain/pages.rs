//! Text rendering of every routable page, plus the error boundary that
//! stands in for a page that cannot be drawn.
//!
//! Screens are plain data so the CLI and tests can inspect them without a
//! terminal.

use std::fmt;

use tracing::error;

use super::forms::{
    AddCattleForm, ComplaintForm, FormDefinition, FormDraft, FormSchema, InaphCreatePasswordForm,
    InaphLoginForm, LoginForm, SignupForm,
};
use super::routing::{Location, Page};
use super::session::SessionStore;

/// Heading shown by the error boundary.
pub const FALLBACK_TITLE: &str = "Something went wrong";
/// Body shown by the error boundary.
pub const FALLBACK_BODY: &str =
    "Please refresh the page or navigate back. The error has been logged.";

/// Care cards on the dashboard: title, summary, tip.
pub const CARE_CARDS: [(&str, &str, &str); 3] = [
    (
        "Livestock Nutrition",
        "Provide a balanced diet rich in protein and minerals to boost milk and meat quality.",
        "Always provide clean water and mineral blocks daily.",
    ),
    (
        "Disease Prevention",
        "Regular vaccinations and clean shelters help prevent major infections in animals.",
        "Schedule a vet visit every 6 months.",
    ),
    (
        "Breeding & Care",
        "Healthy breeding practices improve livestock productivity and reduce health risks.",
        "Always record breed data and calving history.",
    ),
];

/// One animal in the sample catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub name: &'static str,
    pub breed: &'static str,
    pub born: &'static str,
    pub health: &'static str,
    pub features: &'static str,
}

/// Sample herd shown on the cattle list.
pub const CATTLE_CATALOGUE: [CatalogueEntry; 6] = [
    CatalogueEntry {
        name: "Gauri",
        breed: "Gir Cow",
        born: "12 Mar 2021",
        health: "Excellent",
        features: "High milk yield, disease-resistant, calm temperament.",
    },
    CatalogueEntry {
        name: "Suri",
        breed: "Sahiwal",
        born: "25 Jul 2022",
        health: "Good",
        features: "Adaptable to hot climates, rich milk fat content.",
    },
    CatalogueEntry {
        name: "Pushpa",
        breed: "Ongole",
        born: "09 Jan 2020",
        health: "Excellent",
        features: "Strong build, good reproductive efficiency.",
    },
    CatalogueEntry {
        name: "Meera",
        breed: "Holstein Friesian",
        born: "30 May 2023",
        health: "Fair",
        features: "High milk production, requires proper nutrition and shade.",
    },
    CatalogueEntry {
        name: "Ganga",
        breed: "Tharparkar",
        born: "14 Oct 2021",
        health: "Excellent",
        features: "Resistant to heat and disease, high butterfat content.",
    },
    CatalogueEntry {
        name: "Rani",
        breed: "Red Sindhi",
        born: "05 Jun 2020",
        health: "Good",
        features: "Long lifespan, regular calving, good milk yield.",
    },
];

/// A rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    title: String,
    lines: Vec<String>,
}

impl Screen {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn lines_from<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.lines.iter().any(|line| line.contains(needle))
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Why a page could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("{page:?} needs a signed-in user but no session could be read")]
    MissingSession { page: Page },
}

/// Draw `page` for the current session.
///
/// # Errors
///
/// Returns [`RenderError::MissingSession`] when a page that shows session
/// data finds none.
pub fn render_page(
    page: Page,
    location: &Location,
    session: &SessionStore,
) -> Result<Screen, RenderError> {
    let screen = match page {
        Page::Home => home(),
        Page::Contact => contact(),
        Page::Dialog => dialog(),
        Page::Forget => Screen::new("Forgot password")
            .line("Password reset is handled by support.")
            .line("Write to support@lifetag.in from your registered email."),
        Page::Login => login(location),
        Page::Signup => form_screen(
            Screen::new("Create Your Account").line("Fields depend on the role you pick."),
            &schema_of(&SignupForm),
        ),
        Page::InaphLogin => form_screen(
            Screen::new("INAPH Login").line("Sign in with your INAPH ID."),
            &schema_of(&InaphLoginForm),
        ),
        Page::InaphCreatePassword => inaph_setup(location),
        Page::Dashboard => dashboard(session),
        Page::AccountInfo => account_info(session)?,
        Page::AddNewCattle => form_screen(
            Screen::new("Add New Cattle").line("Fields marked with * are required."),
            &schema_of(&AddCattleForm),
        ),
        Page::ViewCattleList => cattle_list(),
        Page::NotFound => Screen::new("Page not found")
            .line(format!("Nothing lives at {location}."))
            .line("Go back home: /"),
    };
    Ok(screen)
}

/// Replaces a page that fails to render with a static notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorBoundary;

impl ErrorBoundary {
    /// Render `page`, logging and hiding any failure.
    pub fn render(self, page: Page, location: &Location, session: &SessionStore) -> Screen {
        render_page(page, location, session).unwrap_or_else(|err| {
            error!(error = %err, path = location.path(), "page failed to render");
            Self::fallback()
        })
    }

    pub fn fallback() -> Screen {
        Screen::new(FALLBACK_TITLE).line(FALLBACK_BODY)
    }
}

fn schema_of<D: FormDefinition>(definition: &D) -> FormSchema {
    definition.schema(&FormDraft::new())
}

fn form_screen(screen: Screen, schema: &FormSchema) -> Screen {
    screen.lines_from(schema.fields().iter().map(|field| {
        let marker = if field.is_required() { " *" } else { "" };
        match field.default_value() {
            Some(default) => format!("- {}{marker} [{default}]", field.label()),
            None => format!("- {}{marker}", field.label()),
        }
    }))
}

fn home() -> Screen {
    Screen::new("Digitally managing cattle identity and welfare")
        .line(
            "A smart platform for digital cattle identification and tracking, \
             integrated with INAPH and farmer data.",
        )
        .line("Get started: /dialog")
        .line("Report abandoned cattle: /Contact")
}

fn dialog() -> Screen {
    Screen::new("Welcome to Livestock")
        .line("Do you already have an account on INAPH?")
        .line("Yes: /InaphPage")
        .line("No: /signup")
}

fn contact() -> Screen {
    form_screen(
        Screen::new("Report Abandoned Cattle")
            .line("Emergency Helpline: +91 12345 67890 (available 24/7)")
            .line("Support: support@lifetag.in"),
        &schema_of(&ComplaintForm),
    )
}

fn login(location: &Location) -> Screen {
    let screen = Screen::new("Welcome Back");
    let screen = match location.return_to() {
        Some(path) => screen.line(format!("Sign in to continue to {path}.")),
        None => screen,
    };
    form_screen(screen, &schema_of(&LoginForm))
}

fn inaph_setup(location: &Location) -> Screen {
    let screen = Screen::new("INAPH Account Setup")
        .line("Create a password for your INAPH account.");
    let screen = match location.inaph_id() {
        Some(id) => screen.line(format!("INAPH ID: {id}")),
        None => screen,
    };
    form_screen(screen, &schema_of(&InaphCreatePasswordForm))
}

fn dashboard(session: &SessionStore) -> Screen {
    let Some(record) = session.get() else {
        return Screen::new("Loading...");
    };
    let mut screen = Screen::new(format!("Welcome, {}!", record.display_name()));
    for (title, summary, tip) in CARE_CARDS {
        screen = screen
            .line(format!("## {title}"))
            .line(summary)
            .line(format!("Tip: {tip}"));
    }
    screen
}

fn account_info(session: &SessionStore) -> Result<Screen, RenderError> {
    let record = session.get().ok_or(RenderError::MissingSession {
        page: Page::AccountInfo,
    })?;
    let role = record.role().map_or_else(
        || record.role_name().unwrap_or("unknown").to_owned(),
        |role| role.label().to_owned(),
    );
    Ok(Screen::new("Account Information")
        .line(format!("Role: {role}"))
        .line(format!("Name: {}", record.display_name()))
        .line(format!("Email: {}", record.display_email()))
        .line(format!(
            "User ID: {}",
            record.any_user_id().unwrap_or_else(|| "-".to_owned())
        )))
}

fn cattle_list() -> Screen {
    Screen::new("Cattle View List").lines_from(CATTLE_CATALOGUE.iter().map(|entry| {
        format!(
            "{} ({}), born {}, health {}: {}",
            entry.name, entry.breed, entry.born, entry.health, entry.features
        )
    }))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::MemoryKeyValueStore;
    use crate::domain::routing::{NavigationState, ROUTES};
    use crate::domain::session::{SESSION_KEY, SessionRecord};
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn signed_out() -> SessionStore {
        SessionStore::new(Arc::new(MemoryKeyValueStore::new()))
    }

    #[fixture]
    fn signed_in() -> SessionStore {
        let session = signed_out();
        session
            .set(
                &SessionRecord::new(Some("42".into()), Some("Asha".into()), Some(Role::Vet))
                    .with_extra("email", json!("asha@example.com")),
            )
            .expect("session");
        session
    }

    #[rstest]
    fn dashboard_greets_and_lists_care_cards(signed_in: SessionStore) {
        let screen = render_page(Page::Dashboard, &Location::new("/dashboard"), &signed_in)
            .expect("dashboard");
        assert_eq!(screen.title(), "Welcome, Asha!");
        for (title, _, _) in CARE_CARDS {
            assert!(screen.mentions(title), "missing {title}");
        }
    }

    #[rstest]
    fn dashboard_without_session_shows_loading(signed_out: SessionStore) {
        let screen = render_page(Page::Dashboard, &Location::new("/dashboard"), &signed_out)
            .expect("dashboard");
        assert_eq!(screen.title(), "Loading...");
    }

    #[rstest]
    fn account_info_uses_display_fallbacks() {
        let session = SessionStore::new(Arc::new(MemoryKeyValueStore::with_entries([(
            SESSION_KEY,
            r#"{"userId": 9, "role": "shelter"}"#,
        )])));
        let screen = render_page(Page::AccountInfo, &Location::new("/account-info"), &session)
            .expect("account");
        assert_eq!(
            screen.lines(),
            [
                "Role: Shelter".to_owned(),
                "Name: User".to_owned(),
                "Email: user@gmail.com".to_owned(),
                "User ID: 9".to_owned(),
            ]
        );
    }

    #[rstest]
    fn boundary_replaces_failed_render(signed_out: SessionStore) {
        let location = Location::new("/account-info");
        assert_eq!(
            render_page(Page::AccountInfo, &location, &signed_out),
            Err(RenderError::MissingSession {
                page: Page::AccountInfo
            })
        );
        let screen = ErrorBoundary.render(Page::AccountInfo, &location, &signed_out);
        assert_eq!(screen.title(), FALLBACK_TITLE);
    }

    #[rstest]
    fn every_routed_page_renders_for_a_signed_in_user(signed_in: SessionStore) {
        for route in ROUTES {
            let screen = ErrorBoundary.render(route.page, &Location::new(route.path), &signed_in);
            assert_ne!(screen.title(), FALLBACK_TITLE, "{} failed", route.path);
        }
    }

    #[rstest]
    fn cattle_list_shows_the_sample_herd(signed_in: SessionStore) {
        let screen = render_page(Page::ViewCattleList, &Location::new("/view-cattle-list"), &signed_in)
            .expect("list");
        assert_eq!(screen.lines().len(), CATTLE_CATALOGUE.len());
        assert!(screen.mentions("Meera (Holstein Friesian)"));
    }

    #[rstest]
    fn login_mentions_the_return_path(signed_out: SessionStore) {
        let location = Location::new("/login")
            .with_state(NavigationState::ReturnTo("/add_new_cattle".into()));
        let screen = render_page(Page::Login, &location, &signed_out).expect("login");
        assert!(screen.mentions("continue to /add_new_cattle"));
        assert!(screen.mentions("- Password *"));
    }

    #[rstest]
    fn inaph_setup_prefills_the_id(signed_out: SessionStore) {
        let location =
            Location::new("/InaphPage").with_state(NavigationState::InaphId("IN-77".into()));
        let screen =
            render_page(Page::InaphCreatePassword, &location, &signed_out).expect("setup");
        assert!(screen.mentions("INAPH ID: IN-77"));
    }

    #[rstest]
    fn add_cattle_marks_required_fields(signed_in: SessionStore) {
        let screen = render_page(Page::AddNewCattle, &Location::new("/add_new_cattle"), &signed_in)
            .expect("form");
        assert!(screen.mentions("Fields marked with * are required."));
        assert!(screen.mentions("- Breed *"));
        assert!(!screen.mentions("- Weight *"));
    }

    #[test]
    fn display_underlines_the_title() {
        let rendered = Screen::new("Hi").line("there").to_string();
        assert_eq!(rendered, "Hi\n==\nthere\n");
    }
}
