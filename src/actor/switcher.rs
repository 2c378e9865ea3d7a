use tracing::{debug, info, instrument};

use crate::actor;
use crate::model::settings::SwitcherSettings;
use crate::ui::stack_view::Size;

#[derive(Debug)]
pub enum Event {
    PreferencesUpdated(SwitcherSettings),
    /// The switcher is about to show `windows` thumbnails.
    Show { windows: usize },
    Dismiss,
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Where the thumbnails of one invocation go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub columns: u32,
    pub rows: u32,
    pub cell: Size,
}

impl Grid {
    pub fn compute(settings: &SwitcherSettings, screen: Size, windows: usize) -> Self {
        let bounds = settings.cells_per_row();
        let windows = u32::try_from(windows).unwrap_or(u32::MAX);
        let columns = windows.clamp(*bounds.start(), *bounds.end());
        let rows = windows.div_ceil(columns).max(settings.min_rows).max(1);
        let usable = Size::new(
            screen.width * settings.max_screen_usage,
            screen.height * settings.max_screen_usage,
        );
        let cell = Size::new(usable.width / f64::from(columns), usable.height / f64::from(rows));
        Self { columns, rows, cell }
    }
}

/// Owns the switcher's view of the preferences and rebuilds its layout
/// whenever they change.
pub struct SwitcherActor {
    settings: SwitcherSettings,
    screen: Size,
    rx: Receiver,
    grid: Option<Grid>,
    reloads: usize,
}

impl SwitcherActor {
    pub fn new(settings: SwitcherSettings, screen: Size, rx: Receiver) -> Self {
        Self {
            settings,
            screen,
            rx,
            grid: None,
            reloads: 0,
        }
    }

    pub fn settings(&self) -> &SwitcherSettings { &self.settings }

    pub fn grid(&self) -> Option<Grid> { self.grid }

    pub fn reloads(&self) -> usize { self.reloads }

    /// Runs until every sender is gone, then hands the actor back.
    pub async fn run(mut self) -> Self {
        while let Some((span, event)) = self.rx.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
        self
    }

    #[instrument(skip(self))]
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::PreferencesUpdated(settings) => self.apply_settings(settings),
            Event::Show { windows } => {
                let grid = Grid::compute(&self.settings, self.screen, windows);
                debug!(?grid, "showing switcher");
                self.grid = Some(grid);
            }
            Event::Dismiss => self.grid = None,
        }
    }

    fn apply_settings(&mut self, settings: SwitcherSettings) {
        self.reloads += 1;
        if settings == self.settings {
            return;
        }
        info!(theme = %settings.theme, "reloading switcher settings");
        self.settings = settings;
        // a visible switcher is laid out again with the new limits
        if let Some(grid) = self.grid {
            let windows = (grid.columns * grid.rows) as usize;
            self.grid = Some(Grid::compute(&self.settings, self.screen, windows));
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::settings::Theme;

    const SCREEN: Size = Size { width: 1000.0, height: 500.0 };

    #[test]
    fn grid_respects_cell_limits() {
        let settings = SwitcherSettings::default();

        let grid = Grid::compute(&settings, SCREEN, 25);
        assert_eq!((grid.columns, grid.rows), (10, 3));
        assert_eq!(grid.cell, Size::new(80.0, 400.0 / 3.0));

        let grid = Grid::compute(&settings, SCREEN, 2);
        assert_eq!((grid.columns, grid.rows), (4, 1));
    }

    #[test]
    fn min_rows_pad_the_grid() {
        let settings = SwitcherSettings { min_rows: 3, ..SwitcherSettings::default() };
        let grid = Grid::compute(&settings, SCREEN, 5);
        assert_eq!((grid.columns, grid.rows), (5, 3));
    }

    #[test]
    fn new_settings_relayout_a_visible_switcher() {
        let (_tx, rx) = actor::channel();
        let mut actor = SwitcherActor::new(SwitcherSettings::default(), SCREEN, rx);
        actor.handle_event(Event::Show { windows: 8 });
        assert_eq!(actor.grid().map(|g| g.columns), Some(8));

        let narrow = SwitcherSettings { max_cells_per_row: 4, ..SwitcherSettings::default() };
        actor.handle_event(Event::PreferencesUpdated(narrow));
        assert_eq!(actor.grid().map(|g| (g.columns, g.rows)), Some((4, 2)));

        actor.handle_event(Event::Dismiss);
        assert_eq!(actor.grid(), None);
    }

    #[tokio::test]
    async fn run_applies_every_update() {
        let (tx, rx) = actor::channel();
        let actor = SwitcherActor::new(SwitcherSettings::default(), SCREEN, rx);
        let windows = SwitcherSettings { theme: Theme::Windows10, ..SwitcherSettings::default() };

        tx.send(Event::PreferencesUpdated(SwitcherSettings::default()));
        tx.send(Event::PreferencesUpdated(windows.clone()));
        drop(tx);
        let actor = actor.run().await;

        assert_eq!(actor.reloads(), 2);
        assert_eq!(actor.settings(), &windows);
    }
}
