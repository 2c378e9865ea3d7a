use crate::ui::form::RowId;
use crate::ui::rows::{Hyperlink, SliderSpec};
use crate::ui::stack_view::StackLayout;

/// State of an interactive control, tagged by the kind of control holding it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Text(String),
    /// Title of the selected dropdown entry.
    Selection(String),
    Slider(f64),
    Checkbox(bool),
}

impl ControlValue {
    /// The string a preference would store for this control state.
    pub fn serialize(&self) -> String {
        match self {
            ControlValue::Text(text) | ControlValue::Selection(text) => text.clone(),
            // only whole numbers are meaningful for the slider-backed preferences
            ControlValue::Slider(value) => format!("{}", value.round() as i64),
            ControlValue::Checkbox(checked) => checked.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorChoice {
    Edit,
    Cancel,
    CheckAgain,
}

impl ErrorChoice {
    /// Button order of the recovery sheet.
    pub const BUTTONS: [ErrorChoice; 3] =
        [ErrorChoice::Edit, ErrorChoice::Cancel, ErrorChoice::CheckAgain];

    pub fn title(self) -> &'static str {
        match self {
            ErrorChoice::Edit => "Edit",
            ErrorChoice::Cancel => "Cancel",
            ErrorChoice::CheckAgain => "Check again",
        }
    }

    pub fn from_button_index(index: usize) -> Option<Self> { Self::BUTTONS.get(index).copied() }
}

/// Content of the blocking sheet shown when a commit fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAlert {
    pub message: String,
    pub informative: String,
}

impl ErrorAlert {
    pub const MESSAGE: &'static str = "Could not save Preference";

    pub fn new(informative: impl Into<String>) -> Self {
        Self {
            message: Self::MESSAGE.to_owned(),
            informative: informative.into(),
        }
    }
}

/// The control primitives the preferences form is built from.
///
/// Views are cheap handles; the toolkit owns the actual widgets. Every
/// interactive control is created with the row it edits so the toolkit can
/// route change events back to [`control_changed`].
///
/// [`control_changed`]: crate::ui::controller::PreferencesController::control_changed
pub trait Toolkit {
    type View: Clone;

    fn label(&mut self, text: &str, width: f64) -> Self::View;
    fn suffix(&mut self, text: &str, width: Option<f64>, link: Option<&Hyperlink>) -> Self::View;
    fn text_input(&mut self, row: RowId, text: &str, width: Option<f64>) -> Self::View;
    fn dropdown(&mut self, row: RowId, titles: &[&str], selected: &str) -> Self::View;
    fn slider(&mut self, row: RowId, spec: &SliderSpec, value: f64) -> Self::View;
    fn checkbox(&mut self, row: RowId, checked: bool) -> Self::View;
    fn separator(&mut self) -> Self::View;
    fn stack(&mut self, views: &[Self::View], layout: &StackLayout) -> Self::View;

    fn control_value(&self, control: &Self::View) -> ControlValue;
    fn set_control_value(&mut self, control: &Self::View, value: &ControlValue);
    fn suffix_text(&self, suffix: &Self::View) -> String;
    fn set_suffix_text(&mut self, suffix: &Self::View, text: &str);

    /// Shows whether a text input currently holds an acceptable value.
    fn set_validation_state(&mut self, control: &Self::View, valid: bool);

    fn has_focus(&self, control: &Self::View) -> bool;
    fn focus(&mut self, control: &Self::View);

    /// Presents the recovery sheet. The answer comes back later through
    /// [`resolve_error`].
    ///
    /// [`resolve_error`]: crate::ui::controller::PreferencesController::resolve_error
    fn begin_error_sheet(&mut self, alert: &ErrorAlert);

    /// Called once the sheet has been answered.
    fn end_error_sheet(&mut self) {}

    fn close_window(&mut self);
}
