mod action;
mod app_state;
mod controller;
mod driver;
mod handoff;
mod layout;
mod logging;
mod minimal;
mod status;
mod theme;
mod ui;
mod widgets;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use wavedial_proto::config::Config;
use wavedial_proto::platform;
use wavedial_proto::station::StationList;

use crate::controller::Controller;
use crate::driver::{Driver, MPlayerDriver};
use crate::status::StatusParser;
use crate::ui::TerminalPresenter;

#[derive(Parser, Debug)]
#[command(name = "wavedial", about = "Terminal internet radio player")]
struct Cli {
    /// Stations file (CSV or .m3u)
    #[arg(short, long)]
    stations: Option<PathBuf>,

    /// Player executable
    #[arg(short, long)]
    mplayer: Option<String>,

    /// Show the player's raw output in a log pane
    #[arg(short, long)]
    debug: bool,

    /// Plain line-mode interface instead of the full-screen one
    #[arg(long)]
    minimal: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging ──────────────────────────────────────────────────────────────
    let (log_tx, log_rx) = mpsc::unbounded_channel::<String>();
    let log_path = platform::data_dir().join("wavedial.log");
    logging::init(&log_path, log_tx)?;
    eprintln!("wavedial log: {}", log_path.display());
    info!("wavedial starting");

    // ── Config + CLI overrides ───────────────────────────────────────────────
    let mut config = Config::load().context("cannot load config")?;
    info!("config loaded from {:?}", Config::config_path());
    if let Some(path) = cli.stations {
        config.stations.path = platform::expand_home(&path);
    }
    if let Some(exe) = cli.mplayer {
        config.player.executable = exe;
    }
    let debug = cli.debug || config.ui.debug;

    // ── Player ───────────────────────────────────────────────────────────────
    let mut driver = MPlayerDriver::new(&config.player);
    driver
        .check_prerequisites()
        .context("a player is required to play streams")?;

    // ── Catalog ──────────────────────────────────────────────────────────────
    let catalog = StationList::load(&config.stations.path, &config.stations.remote_url)
        .await
        .context("cannot load stations")?;

    // ── Status reader ────────────────────────────────────────────────────────
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let pipes = driver
        .pipe_channel()
        .context("player output channel already taken")?;
    tokio::spawn(status::drain_output(pipes, StatusParser::new()?, status_tx));

    if cli.minimal {
        // Nothing shows the diagnostic log in line mode.
        drop(log_rx);
        return minimal::run(driver, catalog, status_rx, debug).await;
    }

    // ── Full-screen interface ────────────────────────────────────────────────
    let size = TerminalPresenter::size()?;
    let controller = Controller::new(
        driver,
        catalog,
        config.player.default_volume,
        debug,
        size,
    );

    let mut presenter = TerminalPresenter::enter()?;
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    ui::spawn_input_reader(input_tx);

    let result = controller
        .run(&mut presenter, input_rx, status_rx, log_rx)
        .await;
    presenter.restore()?;

    if let Err(e) = &result {
        error!("wavedial exited with error: {:#}", e);
    }
    info!("wavedial stopped");
    result
}
