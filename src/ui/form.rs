use tracing::debug;

use crate::model::error::{PreferenceError, Result};
use crate::model::preference::{PreferenceDefinition, PreferenceKind};
use crate::model::store::PreferenceStore;
use crate::ui::rows::{ControlKind, FormItem, RowDescriptor};
use crate::ui::stack_view::StackLayout;
use crate::ui::toolkit::Toolkit;

/// Index of a row among the form's rows (separators are not rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormMetrics {
    pub width: f64,
    pub padding: f64,
    pub slider_suffix_width: f64,
}

impl Default for FormMetrics {
    fn default() -> Self {
        Self {
            width: 496.0,
            padding: 40.0,
            slider_suffix_width: 60.0,
        }
    }
}

impl FormMetrics {
    pub fn label_width(&self) -> f64 { (self.width - self.padding) * 0.45 }

    pub fn row_spacing(&self) -> f64 { self.padding * 0.3 }

    pub fn content_margin(&self) -> f64 { self.padding * 0.5 }
}

/// Everything built for one row. Holding the views here means a control's
/// label and suffix never have to be looked up again.
#[derive(Debug, Clone)]
pub struct FormRow<V> {
    pub descriptor: &'static RowDescriptor,
    pub definition: &'static PreferenceDefinition,
    pub container: V,
    pub label: V,
    pub control: V,
    pub suffix: Option<V>,
}

#[derive(Debug, Clone)]
pub struct Form<V> {
    pub content: V,
    pub rows: Vec<FormRow<V>>,
}

impl<V> Form<V> {
    pub fn row(&self, id: RowId) -> Option<&FormRow<V>> { self.rows.get(id.0) }

    pub fn find(&self, key: &str) -> Option<RowId> {
        self.rows.iter().position(|row| row.descriptor.key == key).map(RowId)
    }
}

pub fn build_form<T: Toolkit>(
    toolkit: &mut T,
    store: &PreferenceStore,
    items: &'static [FormItem],
    metrics: &FormMetrics,
) -> Result<Form<T::View>> {
    let mut views = Vec::with_capacity(items.len());
    let mut rows = Vec::new();
    for item in items {
        match item {
            FormItem::Separator => views.push(toolkit.separator()),
            FormItem::Row(descriptor) => {
                let row = build_row(toolkit, store, RowId(rows.len()), descriptor, metrics)?;
                views.push(row.container.clone());
                rows.push(row);
            }
        }
    }
    let layout = StackLayout::vertical().with_spacing(metrics.row_spacing());
    let content = toolkit.stack(&views, &layout);
    debug!(rows = rows.len(), "built preferences form");
    Ok(Form { content, rows })
}

fn build_row<T: Toolkit>(
    toolkit: &mut T,
    store: &PreferenceStore,
    id: RowId,
    descriptor: &'static RowDescriptor,
    metrics: &FormMetrics,
) -> Result<FormRow<T::View>> {
    let definition = descriptor
        .definition()
        .ok_or_else(|| PreferenceError::UnknownKey(descriptor.key.to_owned()))?;
    let value = store
        .get(descriptor.key)
        .ok_or_else(|| PreferenceError::UnknownKey(descriptor.key.to_owned()))?;
    let mismatch = || PreferenceError::RowMismatch {
        key: definition.key,
        control: descriptor.control.name(),
    };

    let label = toolkit.label(&format!("{}: ", descriptor.label), metrics.label_width());
    let (control, suffix) = match &descriptor.control {
        ControlKind::TextInput { width, hint } => {
            let input = toolkit.text_input(id, value, *width);
            toolkit.set_validation_state(&input, definition.is_valid(value));
            let suffix = hint.as_ref().map(|link| toolkit.suffix(link.text, None, Some(link)));
            (input, suffix)
        }
        ControlKind::Dropdown => {
            let PreferenceKind::Choice(titles) = definition.kind else {
                return Err(mismatch());
            };
            (toolkit.dropdown(id, titles, value), None)
        }
        ControlKind::Slider(spec) => {
            let PreferenceKind::Integer { .. } = definition.kind else {
                return Err(mismatch());
            };
            let number = value.parse::<f64>().map_err(|_| mismatch())?;
            let slider = toolkit.slider(id, spec, number);
            let text = format!("{value}{}", spec.unit);
            let suffix = toolkit.suffix(&text, Some(metrics.slider_suffix_width), None);
            (slider, Some(suffix))
        }
        ControlKind::Checkbox => {
            let PreferenceKind::Flag = definition.kind else {
                return Err(mismatch());
            };
            (toolkit.checkbox(id, value == "true"), None)
        }
    };

    let mut views = vec![label.clone(), control.clone()];
    views.extend(suffix.clone());
    let container = toolkit.stack(&views, &StackLayout::horizontal());

    Ok(FormRow {
        descriptor,
        definition,
        container,
        label,
        control,
        suffix,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ui::headless::{HeadlessToolkit, Node};
    use crate::ui::rows::PREFERENCE_ROWS;
    use crate::ui::toolkit::ControlValue;

    fn build(store: &PreferenceStore) -> (HeadlessToolkit, Form<crate::ui::headless::ViewId>) {
        let mut toolkit = HeadlessToolkit::new();
        let form = build_form(&mut toolkit, store, PREFERENCE_ROWS, &FormMetrics::default())
            .expect("form builds");
        (toolkit, form)
    }

    #[test]
    fn every_control_shows_the_stored_value() {
        let mut store = PreferenceStore::in_memory();
        store.update("theme", "Windows 10").unwrap();
        store.update("iconSize", "40").unwrap();
        store.update("hideSpaceNumberLabels", "true").unwrap();
        let (toolkit, form) = build(&store);

        assert_eq!(form.rows.len(), 12);
        for row in &form.rows {
            let shown = toolkit.control_value(&row.control).serialize();
            let key = row.descriptor.key;
            assert_eq!(Some(shown.as_str()), store.get(key), "{key}");
        }
    }

    #[test]
    fn dropdowns_list_their_choices() {
        let store = PreferenceStore::in_memory();
        let (toolkit, form) = build(&store);
        let row = form.row(form.find("metaKey").unwrap()).unwrap();

        let Node::Dropdown { titles, .. } = toolkit.node(row.control) else {
            panic!("metaKey is not a dropdown");
        };
        assert_eq!(titles, &["⌥ option", "⌃ control", "⌘ command", "⇪ caps lock", "fn"]);
        assert_eq!(toolkit.control_value(&row.control), ControlValue::Selection("⌥ option".into()));
    }

    #[test]
    fn rows_carry_label_and_suffix() {
        let store = PreferenceStore::in_memory();
        let (toolkit, form) = build(&store);

        let delay = form.row(form.find("windowDisplayDelay").unwrap()).unwrap();
        assert_eq!(toolkit.suffix_text(delay.suffix.as_ref().unwrap()), "0ms");
        assert_eq!(
            toolkit.node(delay.label),
            &Node::Label { text: "Apparition delay: ".into(), width: (496.0 - 40.0) * 0.45 }
        );

        let tab = form.row(form.find("tabKeyCode").unwrap()).unwrap();
        let Node::Suffix { url, .. } = toolkit.node(*tab.suffix.as_ref().unwrap()) else {
            panic!("tab key hint is not a suffix");
        };
        assert!(url.as_deref().unwrap().starts_with("https://"));

        let theme = form.row(form.find("theme").unwrap()).unwrap();
        assert!(theme.suffix.is_none());
    }

    #[test]
    fn content_stacks_rows_and_separators() {
        let store = PreferenceStore::in_memory();
        let (toolkit, form) = build(&store);

        let Node::Stack { children, layout } = toolkit.node(form.content) else {
            panic!("content is not a stack");
        };
        assert_eq!(children.len(), PREFERENCE_ROWS.len());
        assert_eq!(layout.spacing, Some(FormMetrics::default().row_spacing()));
        assert_eq!(toolkit.node(children[2]), &Node::Separator);
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        static ROWS: &[FormItem] = &[FormItem::Row(RowDescriptor {
            label: "Theme",
            key: "theme",
            control: ControlKind::Checkbox,
        })];
        let store = PreferenceStore::in_memory();
        let mut toolkit = HeadlessToolkit::new();

        let err = build_form(&mut toolkit, &store, ROWS, &FormMetrics::default()).unwrap_err();
        assert!(matches!(err, PreferenceError::RowMismatch { key: "theme", control: "checkbox" }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        static ROWS: &[FormItem] = &[FormItem::Row(RowDescriptor {
            label: "Nope",
            key: "nope",
            control: ControlKind::Checkbox,
        })];
        let store = PreferenceStore::in_memory();
        let mut toolkit = HeadlessToolkit::new();

        let err = build_form(&mut toolkit, &store, ROWS, &FormMetrics::default()).unwrap_err();
        assert!(matches!(err, PreferenceError::UnknownKey(key) if key == "nope"));
    }
}
