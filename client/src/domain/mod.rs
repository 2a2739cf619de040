//! Domain model of the registry client.
//!
//! Purpose: hold every rule the client enforces (session persistence, route
//! guards, form validation and submission, page content) independent of
//! transport and storage. Outbound collaborators are reached only through the
//! traits in [`ports`].
//!
//! Public surface:
//! - [`SessionStore`] and [`SessionRecord`]: the signed-in user, persisted
//!   through a key-value port.
//! - [`routing::Navigator`]: guarded, history-backed navigation.
//! - [`forms::FormController`]: draft, validation and single-flight submit
//!   for every registry form.
//! - [`pages::ErrorBoundary`]: text rendering of each page.

pub mod api;
pub mod forms;
pub mod identifiers;
pub mod pages;
pub mod ports;
pub mod role;
pub mod routing;
pub mod session;
pub mod submission;

pub use self::identifiers::{
    IdentifierError, format_aadhaar_input, format_phone_input, validate_aadhaar, validate_email,
    validate_phone,
};
pub use self::role::{Role, UnknownRole};
pub use self::session::{SessionRecord, SessionStore, SessionStoreError};
pub use self::submission::{ErrorView, SubmissionError};
