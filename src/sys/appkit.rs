//! Native preferences window.
//!
//! Controls carry their row index in their tag; every action, text change and
//! delegate callback goes through one [`ControlTarget`] which forwards it to
//! the controller as a [`WindowEvent`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2::{DefinedClass, MainThreadOnly, define_class, msg_send, sel};
use objc2_app_kit::{
    NSAlert, NSAlertFirstButtonReturn, NSAlertStyle, NSApplication, NSApplicationActivationPolicy,
    NSBackingStoreType, NSBox, NSBoxType, NSButton, NSColor, NSControl, NSControlStateValueOff,
    NSControlStateValueOn, NSControlTextEditingDelegate, NSLayoutAttribute, NSModalResponse,
    NSPopUpButton, NSResponder, NSSlider, NSStackView, NSTextAlignment, NSTextField,
    NSTextFieldDelegate, NSUserInterfaceLayoutOrientation, NSView, NSWindow, NSWindowDelegate,
    NSWindowStyleMask, NSWorkspace,
};
use objc2_foundation::{
    MainThreadMarker, NSEdgeInsets, NSNotification, NSObject, NSObjectProtocol, NSPoint, NSRect,
    NSSize, NSString, NSURL,
};
use tracing::{debug, error, info, warn};

use crate::actor::dependents::DependentComponents;
use crate::model::error::Result;
use crate::model::store::SharedStore;
use crate::ui::controller::PreferencesController;
use crate::ui::form::{FormMetrics, RowId};
use crate::ui::rows::{Hyperlink, SliderSpec};
use crate::ui::stack_view::{Orientation, Size, StackAlignment, StackLayout};
use crate::ui::toolkit::{ControlValue, ErrorAlert, ErrorChoice, Toolkit};

const WINDOW_TITLE: &str = "Preferences";
const WINDOW_ORIGIN: (f64, f64) = (200.0, 200.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    ControlChanged(RowId),
    SheetAnswered(ErrorChoice),
    ShouldClose,
    WillClose,
}

type Handler = Box<dyn Fn(WindowEvent) -> bool>;

define_class!(
    #[unsafe(super(NSStackView))]
    #[thread_kind = MainThreadOnly]
    #[name = "SwitcherPrefsInsetStackView"]
    #[ivars = Cell<StackLayout>]
    pub struct InsetStackView;

    unsafe impl NSObjectProtocol for InsetStackView {}

    impl InsetStackView {
        #[unsafe(method(alignmentRectInsets))]
        fn alignment_rect_insets(&self) -> NSEdgeInsets {
            let insets = self.ivars().get().insets;
            NSEdgeInsets {
                top: insets.top,
                left: insets.left,
                bottom: insets.bottom,
                right: insets.right,
            }
        }

        #[unsafe(method(fittingSize))]
        fn fitting_size(&self) -> NSSize {
            let measured: NSSize = unsafe { msg_send![super(self), fittingSize] };
            let size = self.ivars().get().fitting_size(Size::new(measured.width, measured.height));
            NSSize::new(size.width, size.height)
        }
    }
);

impl InsetStackView {
    fn new(mtm: MainThreadMarker, views: &[AppKitView], layout: &StackLayout) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(Cell::new(*layout));
        let this: Retained<Self> = unsafe { msg_send![super(this), init] };
        let (orientation, alignment) = match (layout.orientation, layout.alignment) {
            (Orientation::Horizontal, StackAlignment::FirstBaseline) => {
                (NSUserInterfaceLayoutOrientation::Horizontal, NSLayoutAttribute::FirstBaseline)
            }
            (Orientation::Horizontal, StackAlignment::Leading) => {
                (NSUserInterfaceLayoutOrientation::Horizontal, NSLayoutAttribute::Leading)
            }
            (Orientation::Vertical, StackAlignment::FirstBaseline) => {
                (NSUserInterfaceLayoutOrientation::Vertical, NSLayoutAttribute::FirstBaseline)
            }
            (Orientation::Vertical, StackAlignment::Leading) => {
                (NSUserInterfaceLayoutOrientation::Vertical, NSLayoutAttribute::Leading)
            }
        };
        unsafe {
            this.setOrientation(orientation);
            this.setAlignment(alignment);
            if let Some(spacing) = layout.spacing {
                this.setSpacing(spacing);
            }
            for view in views {
                this.addArrangedSubview(view.view());
            }
        }
        this
    }
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "SwitcherPrefsControlTarget"]
    #[ivars = RefCell<Option<Handler>>]
    pub struct ControlTarget;

    unsafe impl NSObjectProtocol for ControlTarget {}

    unsafe impl NSControlTextEditingDelegate for ControlTarget {
        #[unsafe(method(controlTextDidChange:))]
        fn control_text_did_change(&self, notification: &NSNotification) {
            let control = notification.object().and_then(|obj| obj.downcast::<NSControl>().ok());
            let Some(control) = control else { return };
            self.forward_control(&control);
        }
    }

    unsafe impl NSTextFieldDelegate for ControlTarget {}

    unsafe impl NSWindowDelegate for ControlTarget {
        #[unsafe(method(windowShouldClose:))]
        fn window_should_close(&self, _sender: &NSWindow) -> bool {
            self.dispatch(WindowEvent::ShouldClose)
        }

        #[unsafe(method(windowWillClose:))]
        fn window_will_close(&self, _notification: &NSNotification) {
            self.dispatch(WindowEvent::WillClose);
        }
    }

    impl ControlTarget {
        #[unsafe(method(controlWasChanged:))]
        fn control_was_changed(&self, sender: &NSControl) { self.forward_control(sender); }

        #[unsafe(method(openLink:))]
        fn open_link(&self, sender: &NSButton) {
            let Some(url) = sender.toolTip() else { return };
            let Some(url) = NSURL::URLWithString(&url) else {
                warn!(url = %url, "malformed link");
                return;
            };
            if !NSWorkspace::sharedWorkspace().openURL(&url) {
                warn!("could not open link");
            }
        }
    }
);

impl ControlTarget {
    fn new(mtm: MainThreadMarker) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(RefCell::new(None));
        unsafe { msg_send![super(this), init] }
    }

    fn set_handler(&self, handler: Handler) { *self.ivars().borrow_mut() = Some(handler); }

    fn dispatch(&self, event: WindowEvent) -> bool {
        match &*self.ivars().borrow() {
            Some(handler) => handler(event),
            None => true,
        }
    }

    fn forward_control(&self, control: &NSControl) {
        match usize::try_from(control.tag()) {
            Ok(row) => _ = self.dispatch(WindowEvent::ControlChanged(RowId(row))),
            Err(_) => debug!(tag = control.tag(), "event from untagged control"),
        }
    }
}

/// A handle on a native view, tagged by what the form uses it for.
#[derive(Debug, Clone)]
pub enum AppKitView {
    Plain(Retained<NSView>),
    Label(Retained<NSTextField>),
    Link(Retained<NSButton>),
    Text(Retained<NSTextField>),
    PopUp(Retained<NSPopUpButton>),
    Slider(Retained<NSSlider>),
    Checkbox(Retained<NSButton>),
    Stack(Retained<InsetStackView>),
}

impl AppKitView {
    fn view(&self) -> &NSView {
        match self {
            AppKitView::Plain(view) => view,
            AppKitView::Label(field) | AppKitView::Text(field) => field,
            AppKitView::Link(button) | AppKitView::Checkbox(button) => button,
            AppKitView::PopUp(popup) => popup,
            AppKitView::Slider(slider) => slider,
            AppKitView::Stack(stack) => stack,
        }
    }
}

pub struct AppKitToolkit {
    mtm: MainThreadMarker,
    window: Retained<NSWindow>,
    target: Retained<ControlTarget>,
}

impl AppKitToolkit {
    fn target(&self) -> &AnyObject { &self.target }

    fn route(&self, control: &NSControl, row: RowId) {
        control.setTag(row.0 as isize);
        unsafe {
            control.setTarget(Some(self.target()));
            control.setAction(Some(sel!(controlWasChanged:)));
        }
    }

    fn pin_width(view: &NSView, width: f64) {
        view.widthAnchor().constraintEqualToConstant(width).setActive(true);
    }
}

impl Toolkit for AppKitToolkit {
    type View = AppKitView;

    fn label(&mut self, text: &str, width: f64) -> AppKitView {
        let label = NSTextField::labelWithString(&NSString::from_str(text), self.mtm);
        label.setAlignment(NSTextAlignment::Right);
        Self::pin_width(&label, width);
        AppKitView::Label(label)
    }

    fn suffix(&mut self, text: &str, width: Option<f64>, link: Option<&Hyperlink>) -> AppKitView {
        let title = NSString::from_str(text);
        if let Some(link) = link {
            let button = unsafe {
                NSButton::buttonWithTitle_target_action(
                    &title,
                    Some(self.target()),
                    Some(sel!(openLink:)),
                    self.mtm,
                )
            };
            button.setBordered(false);
            button.setToolTip(Some(&NSString::from_str(link.url)));
            button.setContentTintColor(Some(&NSColor::linkColor()));
            return AppKitView::Link(button);
        }
        let label = NSTextField::labelWithString(&title, self.mtm);
        label.setTextColor(Some(&NSColor::grayColor()));
        if let Some(width) = width {
            Self::pin_width(&label, width);
        }
        AppKitView::Label(label)
    }

    fn text_input(&mut self, row: RowId, text: &str, width: Option<f64>) -> AppKitView {
        let field = NSTextField::textFieldWithString(&NSString::from_str(text), self.mtm);
        self.route(&field, row);
        unsafe { field.setDelegate(Some(ProtocolObject::from_ref(&*self.target))) };
        if let Some(width) = width {
            Self::pin_width(&field, width);
        }
        AppKitView::Text(field)
    }

    fn dropdown(&mut self, row: RowId, titles: &[&str], selected: &str) -> AppKitView {
        let popup = NSPopUpButton::new(self.mtm);
        for title in titles {
            popup.addItemWithTitle(&NSString::from_str(title));
        }
        popup.selectItemWithTitle(&NSString::from_str(selected));
        self.route(&popup, row);
        AppKitView::PopUp(popup)
    }

    fn slider(&mut self, row: RowId, spec: &SliderSpec, value: f64) -> AppKitView {
        let slider = unsafe {
            NSSlider::sliderWithValue_minValue_maxValue_target_action(
                value,
                spec.min,
                spec.max,
                Some(self.target()),
                Some(sel!(controlWasChanged:)),
                self.mtm,
            )
        };
        slider.setTag(row.0 as isize);
        slider.setNumberOfTickMarks(spec.tick_marks as isize);
        slider.setAllowsTickMarkValuesOnly(spec.tick_values_only);
        slider.setContinuous(true);
        AppKitView::Slider(slider)
    }

    fn checkbox(&mut self, row: RowId, checked: bool) -> AppKitView {
        let checkbox = unsafe {
            NSButton::checkboxWithTitle_target_action(
                &NSString::from_str(""),
                Some(self.target()),
                Some(sel!(controlWasChanged:)),
                self.mtm,
            )
        };
        checkbox.setTag(row.0 as isize);
        checkbox.setState(if checked { NSControlStateValueOn } else { NSControlStateValueOff });
        AppKitView::Checkbox(checkbox)
    }

    fn separator(&mut self) -> AppKitView {
        let separator = NSBox::new(self.mtm);
        separator.setBoxType(NSBoxType::Separator);
        AppKitView::Plain(Retained::into_super(separator))
    }

    fn stack(&mut self, views: &[AppKitView], layout: &StackLayout) -> AppKitView {
        AppKitView::Stack(InsetStackView::new(self.mtm, views, layout))
    }

    fn control_value(&self, control: &AppKitView) -> ControlValue {
        match control {
            AppKitView::Text(field) | AppKitView::Label(field) => {
                ControlValue::Text(field.stringValue().to_string())
            }
            AppKitView::PopUp(popup) => ControlValue::Selection(
                popup.titleOfSelectedItem().map(|t| t.to_string()).unwrap_or_default(),
            ),
            AppKitView::Slider(slider) => ControlValue::Slider(slider.doubleValue()),
            AppKitView::Checkbox(checkbox) => {
                ControlValue::Checkbox(checkbox.state() == NSControlStateValueOn)
            }
            AppKitView::Plain(_) | AppKitView::Link(_) | AppKitView::Stack(_) => {
                ControlValue::Text(String::new())
            }
        }
    }

    fn set_control_value(&mut self, control: &AppKitView, value: &ControlValue) {
        match (control, value) {
            (AppKitView::Text(field), ControlValue::Text(text)) => {
                field.setStringValue(&NSString::from_str(text));
            }
            (AppKitView::PopUp(popup), ControlValue::Selection(title)) => {
                popup.selectItemWithTitle(&NSString::from_str(title));
            }
            (AppKitView::Slider(slider), ControlValue::Slider(value)) => {
                slider.setDoubleValue(*value);
            }
            (AppKitView::Checkbox(checkbox), ControlValue::Checkbox(checked)) => {
                let state = if *checked { NSControlStateValueOn } else { NSControlStateValueOff };
                checkbox.setState(state);
            }
            (control, value) => warn!(?control, ?value, "value does not fit control"),
        }
    }

    fn suffix_text(&self, suffix: &AppKitView) -> String {
        match suffix {
            AppKitView::Label(label) => label.stringValue().to_string(),
            AppKitView::Link(button) => button.title().to_string(),
            _ => String::new(),
        }
    }

    fn set_suffix_text(&mut self, suffix: &AppKitView, text: &str) {
        if let AppKitView::Label(label) = suffix {
            label.setStringValue(&NSString::from_str(text));
        }
    }

    fn set_validation_state(&mut self, control: &AppKitView, valid: bool) {
        if let AppKitView::Text(field) = control {
            let color = if valid { NSColor::controlTextColor() } else { NSColor::systemRedColor() };
            field.setTextColor(Some(&color));
        }
    }

    fn has_focus(&self, control: &AppKitView) -> bool {
        match control {
            // an editing text field hands first responder to its field editor
            AppKitView::Text(field) => field.currentEditor().is_some(),
            other => self.window.firstResponder().is_some_and(|responder| {
                std::ptr::eq(Retained::as_ptr(&responder).cast::<NSView>(), other.view())
            }),
        }
    }

    fn focus(&mut self, control: &AppKitView) {
        let view: &NSResponder = control.view();
        self.window.makeFirstResponder(Some(view));
    }

    fn begin_error_sheet(&mut self, alert: &ErrorAlert) {
        let sheet = NSAlert::new(self.mtm);
        sheet.setAlertStyle(NSAlertStyle::Warning);
        sheet.setMessageText(&NSString::from_str(&alert.message));
        sheet.setInformativeText(&NSString::from_str(&alert.informative));
        for choice in ErrorChoice::BUTTONS {
            sheet.addButtonWithTitle(&NSString::from_str(choice.title()));
        }

        let target = self.target.clone();
        let completion = RcBlock::new(move |response: NSModalResponse| {
            let choice = usize::try_from(response - NSAlertFirstButtonReturn)
                .ok()
                .and_then(ErrorChoice::from_button_index);
            match choice {
                Some(choice) => _ = target.dispatch(WindowEvent::SheetAnswered(choice)),
                None => warn!(response, "unexpected sheet response"),
            }
        });
        unsafe {
            sheet.beginSheetModalForWindow_completionHandler(&self.window, Some(&completion));
        }
    }

    fn close_window(&mut self) { self.window.close(); }
}

pub type NativeController<D> = PreferencesController<AppKitToolkit, D>;

/// The open window. Dropping it drops the controller, after which window
/// events are ignored.
pub struct PreferencesWindow<D: DependentComponents> {
    window: Retained<NSWindow>,
    controller: Rc<RefCell<NativeController<D>>>,
}

impl<D: DependentComponents + 'static> PreferencesWindow<D> {
    pub fn show(
        mtm: MainThreadMarker,
        store: SharedStore,
        dependents: D,
        metrics: &FormMetrics,
    ) -> Result<Self> {
        let frame = NSRect::new(
            NSPoint::new(WINDOW_ORIGIN.0, WINDOW_ORIGIN.1),
            NSSize::new(metrics.width, 0.0),
        );
        let window = unsafe {
            NSWindow::initWithContentRect_styleMask_backing_defer(
                mtm.alloc(),
                frame,
                NSWindowStyleMask::Titled
                    | NSWindowStyleMask::Closable
                    | NSWindowStyleMask::Miniaturizable,
                NSBackingStoreType::Buffered,
                false,
            )
        };
        unsafe { window.setReleasedWhenClosed(false) };
        window.setTitle(&NSString::from_str(WINDOW_TITLE));

        let target = ControlTarget::new(mtm);
        window.setDelegate(Some(ProtocolObject::from_ref(&*target)));

        let toolkit = AppKitToolkit { mtm, window: window.clone(), target: target.clone() };
        let controller = PreferencesController::new(toolkit, store.clone(), dependents, metrics)?;
        let content = controller.form().content.clone();
        let controller = Rc::new(RefCell::new(controller));
        target.set_handler(Self::handler(mtm, Rc::downgrade(&controller), store));

        if let AppKitView::Stack(stack) = &content {
            let margin = metrics.content_margin();
            stack.setEdgeInsets(NSEdgeInsets {
                top: margin,
                left: margin,
                bottom: margin,
                right: margin,
            });
            AppKitToolkit::pin_width(stack, metrics.width);
        }
        window.setContentView(Some(content.view()));
        window.center();
        window.makeKeyAndOrderFront(None);
        info!("preferences window shown");

        Ok(Self { window, controller })
    }

    pub fn controller(&self) -> &Rc<RefCell<NativeController<D>>> { &self.controller }

    pub fn window(&self) -> &NSWindow { &self.window }

    fn handler(
        mtm: MainThreadMarker,
        controller: Weak<RefCell<NativeController<D>>>,
        store: SharedStore,
    ) -> Handler {
        Box::new(move |event| {
            if event == WindowEvent::WillClose {
                // closing may start inside a controller callback, so the
                // flush cannot go through the controller
                match store.try_borrow() {
                    Ok(store) => {
                        if let Err(err) = store.save() {
                            error!(%err, "could not flush preferences");
                        }
                    }
                    Err(_) => warn!("preference store busy, skipping final flush"),
                }
                NSApplication::sharedApplication(mtm).terminate(None);
                return true;
            }

            let Some(controller) = controller.upgrade() else { return true };
            let Ok(mut controller) = controller.try_borrow_mut() else {
                debug!(?event, "controller busy, dropping event");
                return false;
            };
            match event {
                WindowEvent::ControlChanged(row) => _ = controller.control_changed(row),
                WindowEvent::SheetAnswered(choice) => _ = controller.resolve_error(choice),
                WindowEvent::ShouldClose => return controller.request_close(),
                WindowEvent::WillClose => {}
            }
            true
        })
    }
}

/// Runs the application until the preferences window closes.
pub fn run_app(mtm: MainThreadMarker) {
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
    #[allow(deprecated)]
    app.activateIgnoringOtherApps(true);
    app.run();
}
