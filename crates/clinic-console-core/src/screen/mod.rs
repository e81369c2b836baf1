//! Generic list/form/delete screen, instantiated once per entity.
//!
//! An [`EntityScreen`] owns the in-memory collection for one record type.
//! It loads the collection on activation, projects it through search and
//! sort, and drives the create/edit form and the delete confirmation
//! against an [`ApiClient`].

mod delete;
mod form;

pub use delete::DeleteConfirmation;
pub use form::{FieldErrors, FormError, FormModal, CORRECT_ERRORS_MESSAGE, REQUIRED_FIELDS_MESSAGE};

use serde::Deserialize;
use serde_json::Value;

use crate::api::{ApiClient, ApiError, Transport};
use crate::entity::{AfterSave, Draft, Entity, PatientDirectory, RecordId};
use crate::models::{wire, Patient};
use crate::projection::Projection;
use crate::render::capitalize;
use crate::{ConsoleError, ConsoleResult};

/// Loading lifecycle of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Not yet loaded (or remounted).
    #[default]
    Idle,
    Ready,
    /// Load failed; stays failed until the screen is remounted.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

/// Dismissible status line shown above the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == BannerKind::Error
    }
}

/// Result of a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Created; carries the server-assigned id when the response had one.
    Created(Option<RecordId>),
    Updated(RecordId),
    /// Client- or server-side validation failed; see the form's errors.
    Rejected,
}

#[derive(Deserialize)]
struct SavedId {
    #[serde(deserialize_with = "wire::id")]
    id: RecordId,
}

/// List, search, sort, create, edit and delete for one entity type.
#[derive(Debug)]
pub struct EntityScreen<E: Entity> {
    records: Vec<E>,
    patients: PatientDirectory,
    load_patients: bool,
    state: LoadState,
    projection: Projection<E::Field>,
    form: FormModal<E::Draft>,
    delete: DeleteConfirmation,
    banner: Option<Banner>,
}

impl<E: Entity> Default for EntityScreen<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityScreen<E> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            patients: PatientDirectory::default(),
            load_patients: E::NEEDS_PATIENTS,
            state: LoadState::Idle,
            projection: Projection::new(E::default_sort()),
            form: FormModal::new(),
            delete: DeleteConfirmation::default(),
            banner: None,
        }
    }

    /// A screen that relies on patient data embedded in its own records.
    pub fn without_patient_directory() -> Self {
        Self {
            load_patients: false,
            ..Self::new()
        }
    }

    /// Load the collection on first activation.
    ///
    /// A failed screen stays failed: activating it again reports the
    /// original error without issuing any request.
    pub fn activate<T: Transport>(&mut self, api: &ApiClient<T>) -> ConsoleResult<()> {
        match &self.state {
            LoadState::Ready => Ok(()),
            LoadState::Failed(message) => Err(ConsoleError::LoadFailed(message.clone())),
            LoadState::Idle => self.fetch(api),
        }
    }

    /// Discard all state and load again.
    pub fn remount<T: Transport>(&mut self, api: &ApiClient<T>) -> ConsoleResult<()> {
        let load_patients = self.load_patients;
        *self = Self::new();
        self.load_patients = load_patients;
        self.activate(api)
    }

    fn fetch<T: Transport>(&mut self, api: &ApiClient<T>) -> ConsoleResult<()> {
        match load::<E, T>(api, self.load_patients) {
            Ok((records, patients)) => {
                tracing::debug!(
                    collection = E::COLLECTION,
                    records = records.len(),
                    patients = patients.len(),
                    "Loaded collection"
                );
                self.records = records;
                if self.load_patients {
                    self.patients = PatientDirectory::new(&patients);
                }
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(collection = E::COLLECTION, error = %e, "Failed to load collection");
                self.state = LoadState::Failed(e.user_message());
                Err(e.into())
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn records(&self) -> &[E] {
        &self.records
    }

    pub fn patients(&self) -> &PatientDirectory {
        &self.patients
    }

    pub fn projection(&self) -> &Projection<E::Field> {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: Projection<E::Field>) {
        self.projection = projection;
    }

    /// Header click on a sortable column.
    pub fn toggle_sort(&mut self, field: E::Field) {
        self.projection.sort_mut().toggle(field);
    }

    /// Rows to display, recomputed from the current projection.
    pub fn visible(&self) -> Vec<&E> {
        self.projection.apply(&self.records, &self.patients)
    }

    pub fn find(&self, id: RecordId) -> Option<&E> {
        self.records.iter().find(|r| r.id() == id)
    }

    fn require(&self, id: RecordId) -> ConsoleResult<&E> {
        self.find(id)
            .ok_or_else(|| ConsoleError::NotFound(format!("{} {}", E::LABEL, id)))
    }

    // ---------------------------------------------------------------------
    // Form
    // ---------------------------------------------------------------------

    pub fn form(&self) -> &FormModal<E::Draft> {
        &self.form
    }

    pub fn open_create(&mut self) {
        self.form.open_create();
    }

    pub fn open_edit(&mut self, id: RecordId) -> ConsoleResult<()> {
        let draft = self.require(id)?.to_draft();
        self.form.open_edit(draft);
        Ok(())
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> ConsoleResult<()> {
        self.form.set(field, value)?;
        Ok(())
    }

    pub fn close_form(&mut self) {
        self.form.close();
    }

    /// Validate and submit the open form.
    ///
    /// Validation and server errors stay on the form and yield
    /// [`SubmitOutcome::Rejected`]. Authentication failures are returned as
    /// errors since the session is gone. Once the server accepts the save
    /// the outcome is a success even if reloading the list fails; the
    /// screen then reports [`LoadState::Failed`] until remounted.
    pub fn submit<T: Transport>(&mut self, api: &ApiClient<T>) -> ConsoleResult<SubmitOutcome> {
        if !self.form.is_open() {
            return Err(ConsoleError::InvalidInput("no form is open".into()));
        }
        if !self.form.validate() {
            return Ok(SubmitOutcome::Rejected);
        }

        let draft = self.form.draft().clone();
        let result = match draft.id() {
            Some(id) => api.update::<E>(id, &draft),
            None => api.create::<E>(&draft),
        };
        let saved = match result {
            Ok(saved) => saved,
            Err(e) if e.is_auth() => {
                self.form.reject(&e);
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(collection = E::COLLECTION, error = %e, "Save rejected");
                self.form.reject(&e);
                return Ok(SubmitOutcome::Rejected);
            }
        };

        let saved_id = serde_json::from_value::<SavedId>(saved.clone())
            .ok()
            .map(|s| s.id);
        let created = draft.is_new();

        // The server has the record now. A failed reload leaves the screen
        // in the failed state but must not turn the save into an error.
        if !self.merge_saved(saved, created) && self.fetch(api).is_err() {
            tracing::warn!(
                collection = E::COLLECTION,
                "Saved, but the list could not be reloaded"
            );
        }

        let verb = if created { "created" } else { "updated" };
        self.banner = Some(Banner::success(format!(
            "{} {} successfully",
            capitalize(E::LABEL),
            verb
        )));
        self.form.close();

        Ok(match draft.id() {
            Some(id) => SubmitOutcome::Updated(id),
            None => SubmitOutcome::Created(saved_id),
        })
    }

    /// Apply a saved record in place. Returns false when a refetch is needed.
    fn merge_saved(&mut self, saved: Value, created: bool) -> bool {
        if E::AFTER_SAVE != AfterSave::MergeInPlace {
            return false;
        }
        let record: E = match serde_json::from_value(saved) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    collection = E::COLLECTION,
                    error = %e,
                    "Unreadable save response, refetching"
                );
                return false;
            }
        };
        let id = record.id();
        match self.records.iter().position(|r| r.id() == id) {
            Some(index) if !created => self.records[index] = record,
            _ => self.records.insert(0, record),
        }
        true
    }

    // ---------------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------------

    pub fn request_delete(&mut self, id: RecordId) -> ConsoleResult<()> {
        self.require(id)?;
        self.delete.stage(id);
        Ok(())
    }

    pub fn pending_delete(&self) -> Option<RecordId> {
        self.delete.staged()
    }

    pub fn cancel_delete(&mut self) {
        self.delete.cancel();
    }

    /// Issue the staged delete. Returns the removed id, or `None` when
    /// nothing was staged or the server refused (see the banner).
    pub fn confirm_delete<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
    ) -> ConsoleResult<Option<RecordId>> {
        let Some(id) = self.delete.take() else {
            return Ok(None);
        };
        match api.delete::<E>(id) {
            Ok(()) => {
                self.records.retain(|r| r.id() != id);
                self.banner = Some(Banner::success(format!(
                    "{} deleted successfully",
                    capitalize(E::LABEL)
                )));
                Ok(Some(id))
            }
            Err(e) if e.is_auth() => Err(e.into()),
            Err(e) => {
                tracing::warn!(collection = E::COLLECTION, id, error = %e, "Delete failed");
                self.banner = Some(Banner::error(e.user_message()));
                Ok(None)
            }
        }
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }
}

fn load<E: Entity, T: Transport>(
    api: &ApiClient<T>,
    with_patients: bool,
) -> Result<(Vec<E>, Vec<Patient>), ApiError> {
    let records = api.list::<E>()?;
    let patients = if with_patients {
        api.list::<Patient>()?
    } else {
        Vec::new()
    };
    Ok((records, patients))
}
