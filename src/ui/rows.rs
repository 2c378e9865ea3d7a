use crate::model::preference::{PreferenceDefinition, definition};
use crate::ui::toolkit::ControlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperlink {
    pub text: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub tick_marks: usize,
    pub tick_values_only: bool,
    /// Appended to the value in the suffix, e.g. `"px"`.
    pub unit: &'static str,
}

impl SliderSpec {
    /// Where a slider thumb dragged to `value` ends up.
    pub fn constrain(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        let value = value.clamp(self.min, self.max);
        if !self.tick_values_only || self.tick_marks < 2 {
            return value;
        }
        let step = (self.max - self.min) / (self.tick_marks - 1) as f64;
        self.min + ((value - self.min) / step).round() * step
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    TextInput {
        width: Option<f64>,
        hint: Option<Hyperlink>,
    },
    /// Titles come from the bound preference's choices.
    Dropdown,
    Slider(SliderSpec),
    Checkbox,
}

impl ControlKind {
    /// The control state that displays a committed `raw` value.
    pub fn control_value(&self, raw: &str) -> ControlValue {
        match self {
            ControlKind::TextInput { .. } => ControlValue::Text(raw.to_owned()),
            ControlKind::Dropdown => ControlValue::Selection(raw.to_owned()),
            ControlKind::Slider(_) => ControlValue::Slider(raw.parse().unwrap_or_default()),
            ControlKind::Checkbox => ControlValue::Checkbox(raw == "true"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::TextInput { .. } => "text input",
            ControlKind::Dropdown => "dropdown",
            ControlKind::Slider(_) => "slider",
            ControlKind::Checkbox => "checkbox",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowDescriptor {
    pub label: &'static str,
    pub key: &'static str,
    pub control: ControlKind,
}

impl RowDescriptor {
    pub fn definition(&self) -> Option<&'static PreferenceDefinition> { definition(self.key) }

    pub fn is_text_input(&self) -> bool { matches!(self.control, ControlKind::TextInput { .. }) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormItem {
    Row(RowDescriptor),
    Separator,
}

const fn slider(
    label: &'static str,
    key: &'static str,
    range: (f64, f64),
    tick_marks: usize,
    tick_values_only: bool,
    unit: &'static str,
) -> FormItem {
    FormItem::Row(RowDescriptor {
        label,
        key,
        control: ControlKind::Slider(SliderSpec {
            min: range.0,
            max: range.1,
            tick_marks,
            tick_values_only,
            unit,
        }),
    })
}

const fn dropdown(label: &'static str, key: &'static str) -> FormItem {
    FormItem::Row(RowDescriptor { label, key, control: ControlKind::Dropdown })
}

pub static PREFERENCE_ROWS: &[FormItem] = &[
    dropdown("Alt key", "metaKey"),
    FormItem::Row(RowDescriptor {
        label: "Tab key",
        key: "tabKeyCode",
        control: ControlKind::TextInput {
            width: Some(33.0),
            hint: Some(Hyperlink {
                text: "KeyCodes Reference",
                url: "https://eastmanreference.com/complete-list-of-applescript-key-codes",
            }),
        },
    }),
    FormItem::Separator,
    dropdown("Theme", "theme"),
    slider("Max size on screen", "maxScreenUsage", (10.0, 100.0), 10, false, "%"),
    slider("Min windows per row", "minCellsPerRow", (1.0, 20.0), 20, true, ""),
    slider("Max windows per row", "maxCellsPerRow", (1.0, 40.0), 40, true, ""),
    slider("Min rows of windows", "minRows", (1.0, 20.0), 20, true, ""),
    slider("Window app icon size", "iconSize", (0.0, 64.0), 11, false, "px"),
    slider("Window title font size", "fontHeight", (0.0, 64.0), 11, false, "px"),
    FormItem::Row(RowDescriptor {
        label: "Hide space number labels",
        key: "hideSpaceNumberLabels",
        control: ControlKind::Checkbox,
    }),
    FormItem::Separator,
    slider("Apparition delay", "windowDisplayDelay", (0.0, 2000.0), 11, false, "ms"),
    dropdown("Show on", "showOnScreen"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::preference::PreferenceKind;

    fn rows() -> impl Iterator<Item = &'static RowDescriptor> {
        PREFERENCE_ROWS.iter().filter_map(|item| match item {
            FormItem::Row(row) => Some(row),
            FormItem::Separator => None,
        })
    }

    #[test]
    fn every_row_is_bound_to_a_matching_preference() {
        for row in rows() {
            let def = row.definition().unwrap_or_else(|| panic!("{} is not defined", row.key));
            match (&row.control, def.kind) {
                (ControlKind::Dropdown, PreferenceKind::Choice(_))
                | (ControlKind::Checkbox, PreferenceKind::Flag)
                | (ControlKind::TextInput { .. }, PreferenceKind::KeyCode) => {}
                (ControlKind::Slider(spec), PreferenceKind::Integer { min, max }) => {
                    assert_eq!(spec.min, min as f64, "{}", row.key);
                    assert_eq!(spec.max, max as f64, "{}", row.key);
                }
                (control, kind) => panic!("{}: {control:?} cannot edit {kind:?}", row.key),
            }
        }
    }

    #[test]
    fn snapping_keeps_every_allowed_value() {
        for row in rows() {
            let (ControlKind::Slider(spec), Some(def)) = (row.control, row.definition()) else {
                continue;
            };
            let PreferenceKind::Integer { min, max } = def.kind else { continue };
            for value in [min, max, def.default.parse().unwrap()] {
                assert_eq!(spec.constrain(value as f64).round() as i64, value, "{}", row.key);
            }
        }
    }

    #[test]
    fn slider_constrain_clamps_and_snaps() {
        let free = SliderSpec {
            min: 10.0,
            max: 100.0,
            tick_marks: 10,
            tick_values_only: false,
            unit: "%",
        };
        assert_eq!(free.constrain(55.0), 55.0);
        assert_eq!(free.constrain(3.0), 10.0);
        assert_eq!(free.constrain(250.0), 100.0);

        let ticks = SliderSpec { tick_values_only: true, ..free };
        assert_eq!(ticks.constrain(55.0), 60.0);
        assert_eq!(ticks.constrain(54.0), 50.0);
    }

    #[test]
    fn slider_constrain_maps_nan_to_the_minimum() {
        let free =
            SliderSpec { min: 0.0, max: 64.0, tick_marks: 11, tick_values_only: false, unit: "px" };
        assert_eq!(free.constrain(f64::NAN), 0.0);
        assert_eq!(SliderSpec { tick_values_only: true, ..free }.constrain(f64::NAN), 0.0);
        assert_eq!(free.constrain(f64::INFINITY), 64.0);
    }

    #[test]
    fn control_values_for_committed_strings() {
        assert_eq!(ControlKind::Checkbox.control_value("true"), ControlValue::Checkbox(true));
        assert_eq!(
            ControlKind::Dropdown.control_value("macOS"),
            ControlValue::Selection("macOS".into())
        );
        let spec =
            SliderSpec { min: 0.0, max: 64.0, tick_marks: 11, tick_values_only: false, unit: "px" };
        assert_eq!(ControlKind::Slider(spec).control_value("32"), ControlValue::Slider(32.0));
    }
}
