//! Executes parsed commands against the domain.

use std::io::{BufRead, Write};
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};
use tracing::info;
use zeroize::Zeroizing;

use super::args::{CattleCommand, Command, ComplaintCommand, InaphCommand, PasswordSource};
use super::error::CliError;
use crate::domain::Role;
use crate::domain::api::Upload;
use crate::domain::forms::{
    AddCattleForm, ComplaintForm, FormController, FormDefinition, InaphCreatePasswordForm,
    InaphLoginForm, LocationCapture, LoginForm, MAX_PHOTO_BYTES, NextStep, SignupForm,
    SubmissionOutcome, capture_location,
};
use crate::domain::pages::ErrorBoundary;
use crate::domain::ports::{RegistryApi, ReverseGeocoder};
use crate::domain::routing::{Location, Navigator, Page};
use crate::domain::session::SessionStore;

/// How a command ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The page showed an error or a guard turned the user away.
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Done => 0,
            Self::Failed => 1,
        }
    }
}

/// One client session driven from the command line.
pub struct App<'a> {
    api: &'a dyn RegistryApi,
    geocoder: &'a dyn ReverseGeocoder,
    navigator: Navigator,
}

impl<'a> App<'a> {
    pub fn new(
        api: &'a dyn RegistryApi,
        geocoder: &'a dyn ReverseGeocoder,
        session: SessionStore,
    ) -> Self {
        Self {
            api,
            geocoder,
            navigator: Navigator::new(session),
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Run `command`, writing what the user would see to `out`.
    ///
    /// `input` is only read for `--password-stdin`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] for failures outside the page itself: bad field
    /// input, missing passwords, unreadable photos, navigation loops and
    /// output errors.
    pub async fn run(
        &mut self,
        command: Command,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> Result<Outcome, CliError> {
        match command {
            Command::Open { path } => {
                self.navigator.navigate(Location::new(path))?;
                self.show(out)?;
                Ok(Outcome::Done)
            }
            Command::Login {
                role,
                identifier,
                password,
            } => {
                let password = password
                    .resolve(input)
                    .map_err(CliError::ReadPassword)?
                    .ok_or(CliError::MissingPassword)?;
                self.login(role, &identifier, &password, out).await
            }
            Command::Signup { fields } => {
                if !self.visit("/signup", Page::Signup, out)? {
                    return Ok(Outcome::Failed);
                }
                let form = FormController::new(SignupForm);
                fill(&form, &fields)?;
                self.submit(&form, out).await
            }
            Command::Inaph { action } => self.inaph(action, input, out).await,
            Command::Logout => {
                self.navigator.logout()?;
                writeln!(out, "Signed out.")?;
                self.show(out)?;
                Ok(Outcome::Done)
            }
            Command::Whoami => self.whoami(out),
            Command::Cattle {
                action: CattleCommand::Add { fields, photo },
            } => {
                if !self.visit("/add_new_cattle", Page::AddNewCattle, out)? {
                    return Ok(Outcome::Failed);
                }
                let form = FormController::new(AddCattleForm);
                fill(&form, &fields)?;
                if let Some(path) = photo {
                    form.set_file("photo", read_upload(&path)?)?;
                }
                self.submit(&form, out).await
            }
            Command::Complaint {
                action:
                    ComplaintCommand::Submit {
                        fields,
                        photo,
                        gps,
                    },
            } => {
                if !self.visit("/Contact", Page::Contact, out)? {
                    return Ok(Outcome::Failed);
                }
                let form = FormController::new(ComplaintForm);
                if let Some(coordinates) = gps {
                    match capture_location(&form, coordinates, self.geocoder).await? {
                        LocationCapture::Resolved { address } => {
                            writeln!(out, "Location: {address}")?;
                        }
                        LocationCapture::CoordinatesOnly { notice } => writeln!(out, "{notice}")?,
                    }
                }
                fill(&form, &fields)?;
                if let Some(path) = photo {
                    form.set_file("photo", read_upload(&path)?)?;
                }
                self.submit(&form, out).await
            }
        }
    }

    async fn login(
        &mut self,
        role: Role,
        identifier: &str,
        password: &str,
        out: &mut dyn Write,
    ) -> Result<Outcome, CliError> {
        if !self.visit("/login", Page::Login, out)? {
            return Ok(Outcome::Failed);
        }
        let form = FormController::new(LoginForm);
        form.set("role", role.as_str())?;
        let identifier_field = match role {
            Role::Farmer => "faadhar",
            Role::Vet => "vemail",
            Role::Shelter => "semail",
        };
        form.set(identifier_field, identifier)?;
        form.set("password", password)?;
        self.submit(&form, out).await
    }

    async fn inaph(
        &mut self,
        action: InaphCommand,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> Result<Outcome, CliError> {
        match action {
            InaphCommand::Login { inaph_id, password } => {
                if !self.visit("/InaphLogin", Page::InaphLogin, out)? {
                    return Ok(Outcome::Failed);
                }
                let form = FormController::new(InaphLoginForm);
                form.set("inaph_id", &inaph_id)?;
                if let Some(password) = password.resolve(input).map_err(CliError::ReadPassword)? {
                    form.set("password", &password)?;
                }
                self.submit(&form, out).await
            }
            InaphCommand::CreatePassword {
                inaph_id,
                new_password,
                new_password_stdin,
            } => {
                if !self.visit("/InaphPage", Page::InaphCreatePassword, out)? {
                    return Ok(Outcome::Failed);
                }
                let source = PasswordSource {
                    value: new_password,
                    from_stdin: new_password_stdin,
                };
                let new_password = source
                    .resolve(input)
                    .map_err(CliError::ReadPassword)?
                    .unwrap_or_else(|| Zeroizing::new(String::new()));
                let form = FormController::new(InaphCreatePasswordForm);
                form.set("inaph_id", &inaph_id)?;
                form.set("new_password", &new_password)?;
                self.submit(&form, out).await
            }
        }
    }

    fn whoami(&self, out: &mut dyn Write) -> Result<Outcome, CliError> {
        let Some(record) = self.navigator.session().get() else {
            writeln!(out, "Not signed in.")?;
            return Ok(Outcome::Failed);
        };
        let role = record.role().map_or("unknown", Role::label);
        writeln!(out, "{} ({role})", record.display_name())?;
        if let Some(id) = record.any_user_id() {
            writeln!(out, "User ID: {id}")?;
        }
        Ok(Outcome::Done)
    }

    /// Navigate to `path`; when a guard sends the user elsewhere, show that
    /// page instead and report `false`.
    fn visit(&mut self, path: &str, expected: Page, out: &mut dyn Write) -> Result<bool, CliError> {
        let page = self.navigator.navigate(Location::new(path))?;
        if page == expected {
            return Ok(true);
        }
        info!(requested = path, ?page, "guard redirected command");
        self.show(out)?;
        Ok(false)
    }

    async fn submit<D: FormDefinition>(
        &mut self,
        form: &FormController<D>,
        out: &mut dyn Write,
    ) -> Result<Outcome, CliError> {
        let result = form.submit(self.api, self.navigator.session()).await;
        let success = match result {
            Ok(success) => success,
            Err(err) => {
                for line in err.view().lines() {
                    writeln!(out, "error: {line}")?;
                }
                return Ok(Outcome::Failed);
            }
        };
        if let Some(confirmation) = success.confirmation() {
            writeln!(out, "{confirmation}")?;
        }
        match success.next_step() {
            NextStep::Stay => {}
            NextStep::Navigate(location) => {
                self.navigator.navigate(location)?;
                self.show(out)?;
            }
            NextStep::SignedIn => {
                self.navigator.after_login()?;
                self.show(out)?;
            }
        }
        Ok(Outcome::Done)
    }

    fn show(&self, out: &mut dyn Write) -> Result<(), CliError> {
        let (Some(location), Some(page)) = (self.navigator.location(), self.navigator.page())
        else {
            return Ok(());
        };
        let screen = ErrorBoundary.render(page, location, self.navigator.session());
        write!(out, "{screen}")?;
        Ok(())
    }
}

/// Apply `field=value` assignments, the role first so role-dependent fields
/// exist when they are set.
fn fill<D: FormDefinition>(
    form: &FormController<D>,
    fields: &[(String, String)],
) -> Result<(), CliError> {
    let (roles, rest): (Vec<_>, Vec<_>) = fields.iter().partition(|(field, _)| field == "role");
    for (field, value) in roles.into_iter().chain(rest) {
        form.set(field, value)?;
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<Upload, CliError> {
    let photo_error = |message: String| CliError::Photo {
        path: path.to_path_buf(),
        message,
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| photo_error("not a file".to_owned()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| photo_error(err.to_string()))?;
    let size = dir
        .metadata(file_name)
        .map_err(|err| photo_error(err.to_string()))?
        .len();
    if size > u64::try_from(MAX_PHOTO_BYTES).unwrap_or(u64::MAX) {
        return Err(photo_error("must be 16 MB or smaller".to_owned()));
    }
    let bytes = dir.read(file_name).map_err(|err| photo_error(err.to_string()))?;
    Ok(Upload::new(file_name, bytes))
}
