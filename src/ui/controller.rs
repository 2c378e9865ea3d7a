use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tracing::{debug, info, instrument, warn};

use crate::actor::dependents::DependentComponents;
use crate::model::error::{CommitError, Result};
use crate::model::store::SharedStore;
use crate::ui::form::{Form, FormMetrics, RowId, build_form};
use crate::ui::rows::{ControlKind, FormItem, PREFERENCE_ROWS};
use crate::ui::toolkit::{ErrorAlert, ErrorChoice, Toolkit};

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9]+").expect("leading integer pattern is valid"));

/// Replaces the number at the start of `text` with `value`, keeping whatever
/// unit follows it. Text without a leading number is returned as is.
pub fn replace_leading_integer(text: &str, value: &str) -> String {
    LEADING_INTEGER.replace(text, NoExpand(value)).into_owned()
}

/// What a change event led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The row does not exist.
    Ignored,
    /// An error sheet is still waiting for an answer.
    Blocked,
    /// Invalid text; the user is still typing.
    Deferred,
    Unchanged,
    Committed,
    /// The recovery sheet is up.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingError {
    pub row: RowId,
    pub previous: String,
    pub attempted: String,
}

pub struct PreferencesController<T: Toolkit, D> {
    toolkit: T,
    form: Form<T::View>,
    store: SharedStore,
    dependents: D,
    close_requested: bool,
    pending: Option<PendingError>,
    closed: bool,
}

impl<T: Toolkit, D: DependentComponents> PreferencesController<T, D> {
    pub fn new(
        toolkit: T,
        store: SharedStore,
        dependents: D,
        metrics: &FormMetrics,
    ) -> Result<Self> {
        Self::with_items(toolkit, store, dependents, PREFERENCE_ROWS, metrics)
    }

    pub fn with_items(
        mut toolkit: T,
        store: SharedStore,
        dependents: D,
        items: &'static [FormItem],
        metrics: &FormMetrics,
    ) -> Result<Self> {
        let form = build_form(&mut toolkit, &store.borrow(), items, metrics)?;
        Ok(Self {
            toolkit,
            form,
            store,
            dependents,
            close_requested: false,
            pending: None,
            closed: false,
        })
    }

    pub fn toolkit(&self) -> &T { &self.toolkit }

    pub fn toolkit_mut(&mut self) -> &mut T { &mut self.toolkit }

    pub fn form(&self) -> &Form<T::View> { &self.form }

    pub fn store(&self) -> &SharedStore { &self.store }

    pub fn dependents(&self) -> &D { &self.dependents }

    pub fn pending_error(&self) -> Option<&PendingError> { self.pending.as_ref() }

    pub fn is_close_requested(&self) -> bool { self.close_requested }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Handles a change event from the control of row `id`.
    #[instrument(skip(self))]
    pub fn control_changed(&mut self, id: RowId) -> EditOutcome {
        if self.pending.is_some() {
            debug!("error sheet pending, ignoring change");
            return EditOutcome::Blocked;
        }
        let Some(row) = self.form.row(id) else {
            return EditOutcome::Ignored;
        };
        let (descriptor, definition) = (row.descriptor, row.definition);
        let control = row.control.clone();

        let value = self.toolkit.control_value(&control).serialize();
        let valid = definition.is_valid(&value);
        if descriptor.is_text_input() {
            self.toolkit.set_validation_state(&control, valid);
            if !valid && !self.close_requested {
                debug!(key = definition.key, %value, "deferring invalid input");
                return EditOutcome::Deferred;
            }
        }
        if valid && self.committed(definition.key) == value {
            debug!(key = definition.key, "value unchanged");
            return EditOutcome::Unchanged;
        }

        self.refresh_suffix(id, &value);
        self.commit(id, value)
    }

    /// Answers the recovery sheet. `None` when no sheet is pending.
    #[instrument(skip(self))]
    pub fn resolve_error(&mut self, choice: ErrorChoice) -> Option<EditOutcome> {
        let pending = self.pending.take()?;
        self.toolkit.end_error_sheet();
        let control = self.form.row(pending.row)?.control.clone();

        match choice {
            ErrorChoice::Edit => {
                self.close_requested = false;
                if !self.toolkit.has_focus(&control) {
                    self.toolkit.focus(&control);
                }
                Some(EditOutcome::Failed)
            }
            ErrorChoice::Cancel => {
                self.revert(pending.row, &pending.previous);
                if self.close_requested && self.request_close() {
                    self.close();
                }
                Some(EditOutcome::Unchanged)
            }
            ErrorChoice::CheckAgain => Some(self.commit(pending.row, pending.attempted)),
        }
    }

    /// The window wants to close. Refuses while a text input holds an invalid
    /// value, challenging that input instead.
    #[instrument(skip(self))]
    pub fn request_close(&mut self) -> bool {
        self.close_requested = true;
        if self.pending.is_some() || self.challenge_next_invalid_text_field() {
            return false;
        }
        self.closed = true;
        true
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.toolkit.close_window();
    }

    fn commit(&mut self, id: RowId, attempted: String) -> EditOutcome {
        let Some(row) = self.form.row(id) else {
            return EditOutcome::Ignored;
        };
        let key = row.definition.key;
        let previous = self.committed(key);

        match self.persist(id, &attempted) {
            Ok(()) => {
                info!(key, value = %attempted, "preference committed");
                self.dependents.reinitialize();
                EditOutcome::Committed
            }
            Err(err) => {
                warn!(key, value = %attempted, %err, "could not commit preference");
                self.toolkit.begin_error_sheet(&ErrorAlert::new(err.to_string()));
                self.pending = Some(PendingError { row: id, previous, attempted });
                EditOutcome::Failed
            }
        }
    }

    fn persist(&self, id: RowId, value: &str) -> Result<(), CommitError> {
        let row = &self.form.rows[id.0];
        let key = row.definition.key;
        let still_invalid = row.descriptor.is_text_input() && !row.definition.is_valid(value);
        if self.close_requested && still_invalid {
            return Err(CommitError::StillInvalid { key });
        }

        let mut store = self.store.borrow_mut();
        let previous = store.get(key).map(str::to_owned);
        store.update(key, value).map_err(|source| CommitError::Rejected { key, source })?;
        if let Err(source) = store.save() {
            if let Some(previous) = previous
                && let Err(err) = store.update(key, &previous)
            {
                warn!(key, %err, "could not restore previous value");
            }
            return Err(CommitError::Rejected { key, source });
        }
        Ok(())
    }

    fn revert(&mut self, id: RowId, previous: &str) {
        let Some(row) = self.form.row(id) else { return };
        let (descriptor, definition) = (row.descriptor, row.definition);
        let control = row.control.clone();

        if let Err(err) = self.store.borrow_mut().update(definition.key, previous) {
            warn!(key = definition.key, %err, "could not restore previous value");
        }
        self.toolkit.set_control_value(&control, &descriptor.control.control_value(previous));
        if descriptor.is_text_input() {
            self.toolkit.set_validation_state(&control, definition.is_valid(previous));
        }
        self.refresh_suffix(id, previous);
        debug!(key = definition.key, %previous, "reverted");
    }

    /// Force-notifies the invalid text input the user is most likely looking
    /// at: the focused one, else the first. Returns whether one was found.
    fn challenge_next_invalid_text_field(&mut self) -> bool {
        let invalid: Vec<_> = self
            .form
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.descriptor.is_text_input())
            .filter(|(_, row)| {
                let value = self.toolkit.control_value(&row.control).serialize();
                !row.definition.is_valid(&value)
            })
            .map(|(idx, row)| (RowId(idx), row.control.clone()))
            .collect();
        let Some((id, control)) = invalid
            .iter()
            .find(|(_, control)| self.toolkit.has_focus(control))
            .or(invalid.first())
            .cloned()
        else {
            return false;
        };

        self.control_changed(id);
        if !self.toolkit.has_focus(&control) {
            self.toolkit.focus(&control);
        }
        true
    }

    fn refresh_suffix(&mut self, id: RowId, value: &str) {
        let Some(row) = self.form.row(id) else { return };
        let ControlKind::Slider(_) = row.descriptor.control else { return };
        let Some(suffix) = row.suffix.clone() else { return };
        let text = replace_leading_integer(&self.toolkit.suffix_text(&suffix), value);
        self.toolkit.set_suffix_text(&suffix, &text);
    }

    fn committed(&self, key: &str) -> String {
        self.store.borrow().get(key).unwrap_or_default().to_owned()
    }
}
