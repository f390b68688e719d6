//! Draft form lifecycle for creating or editing one entity.

use chrono::NaiveDate;
use serde_json::Value;
use shared_types::{AppError, DocumentRef, Entity, EntityKind, Fields};
use std::collections::HashMap;
use std::rc::Rc;

use crate::api::Submission;
use crate::notify::Notifier;
use crate::platform::BlobHost;
use crate::staging::{ClipboardItem, StagingArea};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DraftState {
    #[default]
    Closed,
    Creating,
    Editing { id: String },
    /// Waiting for the backend; the form cannot be edited, closed or resubmitted.
    Submitting { mode: FormMode },
}

pub struct DraftForm {
    kind: EntityKind,
    state: DraftState,
    fields: Fields,
    field_errors: HashMap<String, String>,
    /// Documents already stored on the edited entity, shown read-only.
    persisted: Vec<DocumentRef>,
    staging: StagingArea,
}

impl DraftForm {
    pub fn new(kind: EntityKind, host: Rc<dyn BlobHost>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            kind,
            state: DraftState::Closed,
            fields: Fields::new(),
            field_errors: HashMap::new(),
            persisted: Vec::new(),
            staging: StagingArea::new(host, notifier),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// Open for editing (not closed, not submitting).
    pub fn is_open(&self) -> bool {
        matches!(self.state, DraftState::Creating | DraftState::Editing { .. })
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, DraftState::Submitting { .. })
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.is_open()
    }

    pub fn mode(&self) -> Option<FormMode> {
        match &self.state {
            DraftState::Closed => None,
            DraftState::Creating => Some(FormMode::Create),
            DraftState::Editing { id } => Some(FormMode::Edit { id: id.clone() }),
            DraftState::Submitting { mode } => Some(mode.clone()),
        }
    }

    /// Id of the entity being edited, if any.
    pub fn editing_id(&self) -> Option<&str> {
        match &self.state {
            DraftState::Editing { id } => Some(id),
            DraftState::Submitting {
                mode: FormMode::Edit { id },
            } => Some(id),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_errors(&self) -> &HashMap<String, String> {
        &self.field_errors
    }

    pub fn persisted_documents(&self) -> &[DocumentRef] {
        &self.persisted
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Staged files can only change while the form is open.
    pub fn staging_mut(&mut self) -> Option<&mut StagingArea> {
        if self.is_open() {
            Some(&mut self.staging)
        } else {
            None
        }
    }

    fn busy() -> AppError {
        AppError::conflict("A save is in progress")
    }

    fn reset(&mut self) {
        self.fields.clear();
        self.field_errors.clear();
        self.persisted.clear();
        self.staging.remove_all();
    }

    /// Start a new entity with the kind's default values.
    pub fn open_create(&mut self, today: NaiveDate) -> Result<(), AppError> {
        if self.is_submitting() {
            return Err(Self::busy());
        }
        self.reset();
        self.fields = self.kind.schema().defaults(today);
        self.state = DraftState::Creating;
        Ok(())
    }

    /// Start editing `entity`. Its documents are listed read-only; staging starts empty.
    pub fn open_edit(&mut self, entity: &Entity) -> Result<(), AppError> {
        if self.is_submitting() {
            return Err(Self::busy());
        }
        self.reset();
        self.fields = entity.fields.clone();
        self.persisted = entity.documents.clone();
        self.state = DraftState::Editing {
            id: entity.id.clone(),
        };
        Ok(())
    }

    /// Discard edits and staged files without touching the backend.
    pub fn cancel(&mut self) -> Result<(), AppError> {
        if self.is_submitting() {
            return Err(Self::busy());
        }
        self.reset();
        self.state = DraftState::Closed;
        Ok(())
    }

    /// Ignored unless the form is open. Clears that field's error.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> bool {
        if !self.is_open() {
            return false;
        }
        self.fields.insert(name.to_string(), value.into());
        self.field_errors.remove(name);
        true
    }

    pub fn clear_field(&mut self, name: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        self.fields.remove(name);
        self.field_errors.remove(name);
        true
    }

    /// Refresh the read-only document list after the edited entity changed.
    pub fn refresh_persisted(&mut self, entity: Option<&Entity>) {
        if let (Some(entity), Some(id)) = (entity, self.editing_id()) {
            if entity.id == id {
                self.persisted = entity.documents.clone();
            }
        }
    }

    /// Stage pasted files. Pastes outside an open form are ignored.
    pub fn paste(&mut self, items: Vec<ClipboardItem>) -> usize {
        match self.staging_mut() {
            Some(staging) => staging.paste(items),
            None => 0,
        }
    }

    /// Validate and move to `Submitting`.
    ///
    /// On a validation failure the form stays open with `field_errors` set
    /// and nothing is sent. The kind's status rule is applied to the fields.
    pub fn begin_submit(&mut self, parent_id: &str) -> Result<Submission, AppError> {
        let mode = match &self.state {
            DraftState::Creating => FormMode::Create,
            DraftState::Editing { id } => FormMode::Edit { id: id.clone() },
            DraftState::Closed => return Err(AppError::bad_request("No form is open")),
            DraftState::Submitting { .. } => return Err(Self::busy()),
        };
        let schema = self.kind.schema();

        let mut errors = match schema.validate(&self.fields) {
            Ok(()) => HashMap::new(),
            Err(e) => e.field_errors,
        };
        if schema.single_document && self.staging.len() > 1 {
            errors.insert(
                "files".to_string(),
                "Only one document can be attached".to_string(),
            );
        }
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(AppError::validation(
                format!("Invalid {} form", self.kind.label()),
                errors,
            ));
        }

        self.field_errors.clear();
        schema.apply_status_rule(&mut self.fields);

        let submission = Submission {
            parent_id: parent_id.to_string(),
            fields: self.fields.clone(),
            files: self.staging.upload_files(),
            description: self.staging.description().map(str::to_string),
        };
        self.state = DraftState::Submitting { mode };
        Ok(submission)
    }

    /// Settle a submit: close and clear on success, reopen unchanged on failure.
    pub fn finish_submit(&mut self, success: bool) {
        let DraftState::Submitting { mode } = &self.state else {
            return;
        };
        let mode = mode.clone();
        if success {
            self.reset();
            self.state = DraftState::Closed;
        } else {
            self.state = match mode {
                FormMode::Create => DraftState::Creating,
                FormMode::Edit { id } => DraftState::Editing { id },
            };
        }
    }
}
