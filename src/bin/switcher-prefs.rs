use std::rc::Rc;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use switcher_prefs::actor;
use switcher_prefs::actor::dependents::{DependentComponents, SettingsBroadcaster};
use switcher_prefs::actor::switcher::SwitcherActor;
use switcher_prefs::common::config::{Cli, Config};
use switcher_prefs::common::log;
use switcher_prefs::model::{PreferenceStore, SharedStore, TomlFileStorage};
use switcher_prefs::ui::controller::{EditOutcome, PreferencesController};
use switcher_prefs::ui::headless::{Edit, HeadlessToolkit};
use switcher_prefs::ui::stack_view::Size;
use switcher_prefs::ui::toolkit::ErrorChoice;
use tracing::{info, warn};

/// Screen the switcher lays itself out for until it is shown on a real one.
const FALLBACK_SCREEN: Size = Size { width: 1440.0, height: 900.0 };

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init(cli.verbose);
    let config = Config::from_cli(cli)?;

    let storage = TomlFileStorage::new(&config.preferences_path);
    let store = PreferenceStore::load(storage)
        .with_context(|| format!("loading {}", config.preferences_path.display()))?
        .into_shared();
    info!(path = %config.preferences_path.display(), "preferences loaded");

    if config.headless {
        run_headless(&config, store)
    } else {
        run_native(&config, store)
    }
}

fn run_headless(config: &Config, store: SharedStore) -> anyhow::Result<()> {
    let (tx, rx) = actor::channel();
    let switcher = SwitcherActor::new(store.borrow().settings(), FALLBACK_SCREEN, rx);
    let dependents = SettingsBroadcaster::new(store.clone(), tx);
    let toolkit = HeadlessToolkit::new();
    let mut controller =
        PreferencesController::new(toolkit, store.clone(), dependents, &config.metrics)?;

    for (key, value) in &config.edits {
        let row = controller.form().find(key).with_context(|| format!("no row edits '{key}'"))?;
        let kind = controller.form().rows[row.0].descriptor.control;
        let edit = Edit::parse(&kind, value).with_context(|| {
            format!("'{value}' cannot be entered in the {} for '{key}'", kind.name())
        })?;
        match controller.apply_edit(key, edit) {
            None => bail!("'{value}' is not an option for '{key}'"),
            Some(EditOutcome::Failed) => {
                report_sheet(&controller);
                controller.resolve_error(ErrorChoice::Cancel);
            }
            Some(outcome) => info!(key = %key, ?outcome, "edit applied"),
        }
    }

    while !controller.is_closed() {
        if !controller.request_close() {
            report_sheet(&controller);
            controller.resolve_error(ErrorChoice::Cancel);
        }
    }
    print!("{}", controller.render());
    drop(controller);

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let switcher = runtime.block_on(switcher.run());
    info!(
        reloads = switcher.reloads(),
        cells_per_row = ?switcher.settings().cells_per_row(),
        "switcher reloaded"
    );

    let store = Rc::try_unwrap(store)
        .map_err(|_| anyhow!("preference store is still shared"))?
        .into_inner();
    store.close()?;
    Ok(())
}

fn report_sheet<D: DependentComponents>(controller: &PreferencesController<HeadlessToolkit, D>) {
    match controller.toolkit().current_sheet() {
        Some(sheet) => eprintln!("{}: {}", sheet.message, sheet.informative),
        None => warn!("expected an error sheet"),
    }
}

#[cfg(target_os = "macos")]
fn run_native(config: &Config, store: SharedStore) -> anyhow::Result<()> {
    use objc2_foundation::MainThreadMarker;
    use switcher_prefs::sys::appkit::{PreferencesWindow, run_app};

    let mtm = MainThreadMarker::new().context("the preferences window needs the main thread")?;
    let (tx, rx) = actor::channel();
    let switcher = SwitcherActor::new(store.borrow().settings(), FALLBACK_SCREEN, rx);
    std::thread::Builder::new().name("switcher".into()).spawn(move || {
        match tokio::runtime::Builder::new_current_thread().build() {
            Ok(runtime) => _ = runtime.block_on(switcher.run()),
            Err(err) => warn!(%err, "could not start the switcher runtime"),
        }
    })?;

    let dependents = SettingsBroadcaster::new(store.clone(), tx);
    let _window = PreferencesWindow::show(mtm, store, dependents, &config.metrics)?;
    run_app(mtm);
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run_native(_config: &Config, _store: SharedStore) -> anyhow::Result<()> {
    bail!("the preferences window is only available on macOS; pass --headless")
}
