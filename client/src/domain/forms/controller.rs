//! Shared submission mechanics for every form.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::schema::{FieldValue, FormDraft, FormSchema, InputError};
use super::validation::validate;
use super::{FormDefinition, SubmitContext};
use crate::domain::api::Upload;
use crate::domain::ports::RegistryApi;
use crate::domain::session::SessionStore;
use crate::domain::submission::{ErrorView, SubmissionError};

/// Visible state of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed(ErrorView),
}

/// Resets the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Draft state plus submission for one [`FormDefinition`].
///
/// At most one submission runs at a time; a second call while one is in
/// flight returns [`SubmissionError::in_flight`] without sending anything.
pub struct FormController<D> {
    definition: D,
    draft: Mutex<FormDraft>,
    status: Mutex<FormStatus>,
    in_flight: AtomicBool,
}

impl<D: FormDefinition> FormController<D> {
    pub fn new(definition: D) -> Self {
        let draft = FormDraft::from_schema(&definition.schema(&FormDraft::new()));
        Self {
            definition,
            draft: Mutex::new(draft),
            status: Mutex::new(FormStatus::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    /// Fields active for the current draft.
    pub fn schema(&self) -> FormSchema {
        self.definition.schema(&lock(&self.draft))
    }

    /// Snapshot of the current draft.
    pub fn draft(&self) -> FormDraft {
        lock(&self.draft).clone()
    }

    pub fn value(&self, field: &str) -> Option<FieldValue> {
        lock(&self.draft).get(field).cloned()
    }

    pub fn text(&self, field: &str) -> String {
        lock(&self.draft).text(field)
    }

    /// Apply raw input to `field`.
    ///
    /// Rejected input leaves the previous value untouched.
    pub fn set(&self, field: &str, raw: &str) -> Result<(), InputError> {
        let mut draft = lock(&self.draft);
        let schema = self.definition.schema(&draft);
        let spec = schema.field(field).ok_or_else(|| InputError::UnknownField {
            field: field.to_owned(),
        })?;
        let value = spec.normalize(raw)?;
        draft.insert(field, value);
        // A role switch can activate fields with defaults of their own.
        let schema = self.definition.schema(&draft);
        draft.apply_defaults(&schema);
        Ok(())
    }

    /// Attach a file to a photo field.
    pub fn set_file(&self, field: &str, upload: Upload) -> Result<(), InputError> {
        let mut draft = lock(&self.draft);
        let schema = self.definition.schema(&draft);
        let spec = schema.field(field).ok_or_else(|| InputError::UnknownField {
            field: field.to_owned(),
        })?;
        if spec.kind() != super::FieldKind::Photo {
            return Err(InputError::NotAFileField {
                field: field.to_owned(),
            });
        }
        draft.insert(field, FieldValue::File(upload));
        Ok(())
    }

    /// Clear `field`.
    pub fn unset(&self, field: &str) {
        lock(&self.draft).remove(field);
    }

    /// Discard the draft and return to defaults.
    pub fn reset(&self) {
        let fresh = FormDraft::from_schema(&self.definition.schema(&FormDraft::new()));
        *lock(&self.draft) = fresh;
        *lock(&self.status) = FormStatus::Idle;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> FormStatus {
        lock(&self.status).clone()
    }

    fn set_status(&self, status: FormStatus) {
        *lock(&self.status) = status;
    }

    /// Validate and submit the current draft.
    pub async fn submit(
        &self,
        api: &dyn RegistryApi,
        session: &SessionStore,
    ) -> Result<D::Success, SubmissionError> {
        let name = self.definition.name();
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!(form = name, "submission ignored; another is in flight");
            return Err(SubmissionError::in_flight());
        };
        self.set_status(FormStatus::Submitting);

        let draft = self.draft();
        let result = self.run(&draft, SubmitContext { api, session }).await;
        match &result {
            Ok(_) => {
                info!(form = name, "form submitted");
                if self.definition.clears_on_success() {
                    self.reset();
                }
                self.set_status(FormStatus::Succeeded);
            }
            Err(error) => {
                if error.is_local() {
                    debug!(form = name, %error, "form rejected before sending");
                } else {
                    warn!(form = name, %error, "form submission failed");
                }
                self.set_status(FormStatus::Failed(error.view()));
            }
        }
        result
    }

    async fn run(
        &self,
        draft: &FormDraft,
        ctx: SubmitContext<'_>,
    ) -> Result<D::Success, SubmissionError> {
        validate(&self.definition.schema(draft), draft)?;
        self.definition.precheck(draft, ctx.session)?;
        self.definition.execute(draft, ctx).await
    }
}
