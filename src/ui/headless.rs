//! An in-memory toolkit: every control is a node in an arena and the "window"
//! is whatever [`HeadlessToolkit::render`] prints.

use std::fmt::Write as _;

use tracing::debug;

use crate::actor::dependents::DependentComponents;
use crate::ui::controller::{EditOutcome, PreferencesController};
use crate::ui::form::RowId;
use crate::ui::rows::{ControlKind, Hyperlink, SliderSpec};
use crate::ui::stack_view::{Orientation, StackLayout};
use crate::ui::toolkit::{ControlValue, ErrorAlert, Toolkit};

const LABEL_COLUMNS: usize = 28;
const SEPARATOR_COLUMNS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Label {
        text: String,
        width: f64,
    },
    Suffix {
        text: String,
        width: Option<f64>,
        url: Option<String>,
    },
    TextInput {
        row: RowId,
        text: String,
        width: Option<f64>,
        valid: bool,
    },
    Dropdown {
        row: RowId,
        titles: Vec<String>,
        selected: Option<usize>,
    },
    Slider {
        row: RowId,
        spec: SliderSpec,
        value: f64,
    },
    Checkbox {
        row: RowId,
        checked: bool,
    },
    Separator,
    Stack {
        children: Vec<ViewId>,
        layout: StackLayout,
    },
}

/// A user action on a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Text(String),
    Select(String),
    Slide(f64),
    Check(bool),
}

impl Edit {
    /// Interprets a command line value the way the row's control would
    /// receive it.
    pub fn parse(kind: &ControlKind, raw: &str) -> Option<Self> {
        match kind {
            ControlKind::TextInput { .. } => Some(Edit::Text(raw.to_owned())),
            ControlKind::Dropdown => Some(Edit::Select(raw.to_owned())),
            ControlKind::Slider(_) => {
                raw.parse().ok().filter(|v: &f64| v.is_finite()).map(Edit::Slide)
            }
            ControlKind::Checkbox => raw.parse().ok().map(Edit::Check),
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessToolkit {
    nodes: Vec<Node>,
    focused: Option<ViewId>,
    sheets: Vec<ErrorAlert>,
    sheet_open: bool,
    closed: bool,
}

impl HeadlessToolkit {
    pub fn new() -> Self { Self::default() }

    pub fn node(&self, id: ViewId) -> &Node { &self.nodes[id.0] }

    pub fn focused(&self) -> Option<ViewId> { self.focused }

    pub fn set_focus(&mut self, id: Option<ViewId>) { self.focused = id; }

    /// The sheet currently blocking the window, if any.
    pub fn current_sheet(&self) -> Option<&ErrorAlert> {
        self.sheet_open.then(|| self.sheets.last()).flatten()
    }

    pub fn sheets_shown(&self) -> usize { self.sheets.len() }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Applies a user edit the way the real control would: sliders clamp and
    /// snap, dropdowns only accept listed titles, typing focuses the field.
    /// Returns whether the control changed state.
    pub fn apply(&mut self, id: ViewId, edit: Edit) -> bool {
        let focus = matches!(edit, Edit::Text(_));
        let applied = match (&mut self.nodes[id.0], edit) {
            (Node::TextInput { text, .. }, Edit::Text(new)) => {
                *text = new;
                true
            }
            (Node::Dropdown { titles, selected, .. }, Edit::Select(title)) => {
                match titles.iter().position(|t| *t == title) {
                    Some(idx) => {
                        *selected = Some(idx);
                        true
                    }
                    None => false,
                }
            }
            (Node::Slider { spec, value, .. }, Edit::Slide(new)) => {
                *value = spec.constrain(new);
                true
            }
            (Node::Checkbox { checked, .. }, Edit::Check(new)) => {
                *checked = new;
                true
            }
            (node, edit) => {
                debug!(?node, ?edit, "edit does not fit control");
                false
            }
        };
        if applied && focus {
            self.focused = Some(id);
        }
        applied
    }

    pub fn render(&self, root: ViewId) -> String {
        let mut out = String::new();
        self.render_into(root, &mut out);
        out
    }

    fn render_into(&self, id: ViewId, out: &mut String) {
        match self.node(id) {
            Node::Stack { children, layout } if layout.orientation == Orientation::Vertical => {
                for child in children {
                    self.render_into(*child, out);
                }
            }
            Node::Stack { children, .. } => {
                let parts: Vec<_> = children.iter().map(|child| self.inline(*child)).collect();
                let _ = writeln!(out, "{}", parts.join(" ").trim_end());
            }
            _ => {
                let _ = writeln!(out, "{}", self.inline(id));
            }
        }
    }

    fn inline(&self, id: ViewId) -> String {
        match self.node(id) {
            Node::Label { text, .. } => format!("{:>LABEL_COLUMNS$}", text.trim_end()),
            Node::Suffix { text, url: Some(url), .. } => format!("{text} <{url}>"),
            Node::Suffix { text, .. } => text.clone(),
            Node::TextInput { text, valid: true, .. } => format!("[{text}]"),
            Node::TextInput { text, .. } => format!("[{text}] (invalid)"),
            Node::Dropdown { titles, selected, .. } => {
                let title = selected.and_then(|idx| titles.get(idx)).map_or("", String::as_str);
                format!("[{title} ▾]")
            }
            Node::Slider { spec, value, .. } => {
                format!("[{} ◀ {} ▶ {}]", spec.min, value.round(), spec.max)
            }
            Node::Checkbox { checked: true, .. } => "[x]".into(),
            Node::Checkbox { .. } => "[ ]".into(),
            Node::Separator => "─".repeat(SEPARATOR_COLUMNS),
            Node::Stack { children, .. } => {
                children.iter().map(|child| self.inline(*child)).collect::<Vec<_>>().join(" ")
            }
        }
    }

    fn push(&mut self, node: Node) -> ViewId {
        self.nodes.push(node);
        ViewId(self.nodes.len() - 1)
    }
}

impl Toolkit for HeadlessToolkit {
    type View = ViewId;

    fn label(&mut self, text: &str, width: f64) -> ViewId {
        self.push(Node::Label { text: text.to_owned(), width })
    }

    fn suffix(&mut self, text: &str, width: Option<f64>, link: Option<&Hyperlink>) -> ViewId {
        self.push(Node::Suffix {
            text: text.to_owned(),
            width,
            url: link.map(|link| link.url.to_owned()),
        })
    }

    fn text_input(&mut self, row: RowId, text: &str, width: Option<f64>) -> ViewId {
        self.push(Node::TextInput { row, text: text.to_owned(), width, valid: true })
    }

    fn dropdown(&mut self, row: RowId, titles: &[&str], selected: &str) -> ViewId {
        self.push(Node::Dropdown {
            row,
            titles: titles.iter().map(|t| t.to_string()).collect(),
            selected: titles.iter().position(|t| *t == selected),
        })
    }

    fn slider(&mut self, row: RowId, spec: &SliderSpec, value: f64) -> ViewId {
        self.push(Node::Slider { row, spec: *spec, value: spec.constrain(value) })
    }

    fn checkbox(&mut self, row: RowId, checked: bool) -> ViewId {
        self.push(Node::Checkbox { row, checked })
    }

    fn separator(&mut self) -> ViewId { self.push(Node::Separator) }

    fn stack(&mut self, views: &[ViewId], layout: &StackLayout) -> ViewId {
        self.push(Node::Stack { children: views.to_vec(), layout: *layout })
    }

    fn control_value(&self, control: &ViewId) -> ControlValue {
        match self.node(*control) {
            Node::TextInput { text, .. } => ControlValue::Text(text.clone()),
            Node::Dropdown { titles, selected, .. } => ControlValue::Selection(
                selected.and_then(|idx| titles.get(idx)).cloned().unwrap_or_default(),
            ),
            Node::Slider { value, .. } => ControlValue::Slider(*value),
            Node::Checkbox { checked, .. } => ControlValue::Checkbox(*checked),
            Node::Label { text, .. } | Node::Suffix { text, .. } => {
                ControlValue::Text(text.clone())
            }
            Node::Separator | Node::Stack { .. } => ControlValue::Text(String::new()),
        }
    }

    fn set_control_value(&mut self, control: &ViewId, value: &ControlValue) {
        let edit = match value {
            ControlValue::Text(text) => Edit::Text(text.clone()),
            ControlValue::Selection(title) => Edit::Select(title.clone()),
            ControlValue::Slider(v) => Edit::Slide(*v),
            ControlValue::Checkbox(checked) => Edit::Check(*checked),
        };
        // programmatic updates do not move focus
        let focused = self.focused;
        self.apply(*control, edit);
        self.focused = focused;
    }

    fn suffix_text(&self, suffix: &ViewId) -> String {
        match self.node(*suffix) {
            Node::Suffix { text, .. } | Node::Label { text, .. } => text.clone(),
            _ => String::new(),
        }
    }

    fn set_suffix_text(&mut self, suffix: &ViewId, new: &str) {
        if let Node::Suffix { text, .. } = &mut self.nodes[suffix.0] {
            *text = new.to_owned();
        }
    }

    fn set_validation_state(&mut self, control: &ViewId, is_valid: bool) {
        if let Node::TextInput { valid, .. } = &mut self.nodes[control.0] {
            *valid = is_valid;
        }
    }

    fn has_focus(&self, control: &ViewId) -> bool { self.focused == Some(*control) }

    fn focus(&mut self, control: &ViewId) { self.focused = Some(*control); }

    fn begin_error_sheet(&mut self, alert: &ErrorAlert) {
        self.sheets.push(alert.clone());
        self.sheet_open = true;
    }

    fn end_error_sheet(&mut self) { self.sheet_open = false; }

    fn close_window(&mut self) { self.closed = true; }
}

impl<D: DependentComponents> PreferencesController<HeadlessToolkit, D> {
    /// Performs `edit` on the control bound to `key` and delivers the change
    /// event. `None` when no row edits `key` or the control refused the edit.
    pub fn apply_edit(&mut self, key: &str, edit: Edit) -> Option<EditOutcome> {
        let row = self.form().find(key)?;
        let control = self.form().row(row)?.control;
        self.toolkit_mut().apply(control, edit).then(|| self.control_changed(row))
    }

    /// The control view bound to `key`.
    pub fn control_of(&self, key: &str) -> Option<ViewId> {
        let row = self.form().find(key)?;
        Some(self.form().row(row)?.control)
    }

    pub fn render(&self) -> String { self.toolkit().render(self.form().content) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn edits_must_fit_the_control() {
        let mut toolkit = HeadlessToolkit::new();
        let dropdown = toolkit.dropdown(RowId(0), &["a", "b"], "a");
        let checkbox = toolkit.checkbox(RowId(1), false);

        assert!(!toolkit.apply(dropdown, Edit::Select("c".into())));
        assert!(!toolkit.apply(checkbox, Edit::Text("x".into())));
        assert!(toolkit.apply(dropdown, Edit::Select("b".into())));
        assert_eq!(toolkit.control_value(&dropdown), ControlValue::Selection("b".into()));
    }

    #[test]
    fn typing_focuses_but_programmatic_updates_do_not() {
        let mut toolkit = HeadlessToolkit::new();
        let first = toolkit.text_input(RowId(0), "1", None);
        let second = toolkit.text_input(RowId(1), "2", None);

        toolkit.apply(first, Edit::Text("10".into()));
        assert_eq!(toolkit.focused(), Some(first));

        toolkit.set_control_value(&second, &ControlValue::Text("20".into()));
        assert_eq!(toolkit.focused(), Some(first));
        assert_eq!(toolkit.control_value(&second), ControlValue::Text("20".into()));
    }

    #[test]
    fn parse_edit_per_control_kind() {
        assert_eq!(Edit::parse(&ControlKind::Checkbox, "true"), Some(Edit::Check(true)));
        assert_eq!(Edit::parse(&ControlKind::Checkbox, "yes"), None);
        assert_eq!(Edit::parse(&ControlKind::Dropdown, "fn"), Some(Edit::Select("fn".into())));
        let spec =
            SliderSpec { min: 0.0, max: 10.0, tick_marks: 11, tick_values_only: false, unit: "" };
        assert_eq!(Edit::parse(&ControlKind::Slider(spec), "4"), Some(Edit::Slide(4.0)));
    }

    #[test]
    fn sliders_reject_non_finite_numbers() {
        let spec =
            SliderSpec { min: 0.0, max: 64.0, tick_marks: 11, tick_values_only: false, unit: "px" };
        for raw in ["NaN", "nan", "inf", "-infinity"] {
            assert_eq!(Edit::parse(&ControlKind::Slider(spec), raw), None, "{raw}");
        }
    }

    #[test]
    fn render_lays_out_rows() {
        let mut toolkit = HeadlessToolkit::new();
        let label = toolkit.label("Theme: ", 100.0);
        let dropdown = toolkit.dropdown(RowId(0), &["macOS", "Windows 10"], "Windows 10");
        let row = toolkit.stack(&[label, dropdown], &StackLayout::horizontal());
        let separator = toolkit.separator();
        let root = toolkit.stack(&[row, separator], &StackLayout::vertical());

        let rendered = toolkit.render(root);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].trim_start(), "Theme: [Windows 10 ▾]");
        assert!(lines[1].chars().all(|c| c == '─'));
    }
}
