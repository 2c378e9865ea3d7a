//! Stacking containers with custom alignment insets.
//!
//! A stack reports its alignment rectangle shrunk by its insets, which moves
//! the baseline siblings align against without touching what gets drawn.

/// Shortcut recorder controls report roughly this much extra intrinsic
/// height when placed in a horizontal stack.
const RECORDER_HEIGHT_CORRECTION: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAlignment {
    FirstBaseline,
    Leading,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Rectangle with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self { Self { x, y, width, height } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackLayout {
    pub orientation: Orientation,
    pub alignment: StackAlignment,
    pub spacing: Option<f64>,
    pub insets: EdgeInsets,
    pub contains_recorder: bool,
}

impl StackLayout {
    pub fn new(orientation: Orientation) -> Self {
        let alignment = match orientation {
            Orientation::Horizontal => StackAlignment::FirstBaseline,
            Orientation::Vertical => StackAlignment::Leading,
        };
        Self {
            orientation,
            alignment,
            spacing: None,
            insets: EdgeInsets::default(),
            contains_recorder: false,
        }
    }

    pub fn horizontal() -> Self { Self::new(Orientation::Horizontal) }

    pub fn vertical() -> Self { Self::new(Orientation::Vertical) }

    pub fn with_insets(mut self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.insets = EdgeInsets { top, left, bottom, right };
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Marks the stack as holding an unclearable shortcut recorder.
    pub fn with_recorder(mut self) -> Self {
        self.contains_recorder = true;
        self
    }

    pub fn alignment_rect(&self, frame: Rect) -> Rect {
        let EdgeInsets { top, left, bottom, right } = self.insets;
        Rect {
            x: frame.x + left,
            y: frame.y + bottom,
            width: frame.width - left - right,
            height: frame.height - top - bottom,
        }
    }

    /// The size the stack pins itself to, given what the toolkit measured.
    pub fn fitting_size(&self, measured: Size) -> Size {
        if self.orientation == Orientation::Horizontal && self.contains_recorder {
            Size::new(measured.width, measured.height - RECORDER_HEIGHT_CORRECTION)
        } else {
            measured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alignment_follows_orientation() {
        assert_eq!(StackLayout::horizontal().alignment, StackAlignment::FirstBaseline);
        assert_eq!(StackLayout::vertical().alignment, StackAlignment::Leading);
    }

    #[test]
    fn insets_only_move_the_alignment_rect() {
        let layout = StackLayout::horizontal().with_insets(1.0, 2.0, 3.0, 4.0);
        let frame = Rect::new(10.0, 20.0, 100.0, 30.0);

        assert_eq!(layout.alignment_rect(frame), Rect::new(14.0, 23.0, 94.0, 26.0));
        assert_eq!(layout.fitting_size(Size::new(100.0, 30.0)), Size::new(100.0, 30.0));
    }

    #[test]
    fn zero_insets_keep_the_frame() {
        let frame = Rect::new(0.0, 0.0, 50.0, 20.0);
        assert_eq!(StackLayout::vertical().alignment_rect(frame), frame);
    }

    #[test]
    fn recorder_rows_shrink_their_fitting_height() {
        let measured = Size::new(200.0, 31.0);
        assert_eq!(
            StackLayout::horizontal().with_recorder().fitting_size(measured),
            Size::new(200.0, 24.0)
        );
        assert_eq!(StackLayout::vertical().with_recorder().fitting_size(measured), measured);
    }
}
