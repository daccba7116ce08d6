//! Controller: single-owner event loop for selection and playback.
//!
//! All inputs funnel into one task: normalized UI events from the presenter,
//! status events from the output reader, and forwarded log lines.  The
//! controller is the only place that drives the player or touches
//! `ViewState`, so nothing here needs locking.
//!
//! ```text
//!   input task ──UiEvent──────┐
//!   status reader ─StatusEvent─┼──► Controller ──► Driver
//!   log layer ──String─────────┘        │
//!                                        └──► Presenter::draw(&ViewState)
//! ```

use tokio::sync::mpsc;
use tracing::{debug, info};

use wavedial_proto::station::Catalog;

use crate::action::{Key, UiEvent};
use crate::app_state::ViewState;
use crate::driver::{Driver, DriverError};
use crate::status::StatusEvent;

/// Which station is marked as playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Something that can show a `ViewState`.
pub trait Presenter {
    fn draw(&mut self, view: &ViewState) -> anyhow::Result<()>;
}

pub struct Controller<D, C> {
    driver: D,
    catalog: C,
    selection: Selection,
    view: ViewState,
    default_volume: u16,
}

impl<D: Driver, C: Catalog> Controller<D, C> {
    pub fn new(driver: D, catalog: C, default_volume: u16, debug: bool, size: (u16, u16)) -> Self {
        let view = ViewState::new(catalog.rows(), debug, size);
        Self {
            driver,
            catalog,
            selection: Selection::None,
            view,
            default_volume,
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run until quit or until the input channel closes.  A driver failure
    /// ends the loop with that error.
    pub async fn run<P: Presenter>(
        mut self,
        presenter: &mut P,
        mut input_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut status_rx: mpsc::UnboundedReceiver<StatusEvent>,
        mut log_rx: mpsc::UnboundedReceiver<String>,
    ) -> anyhow::Result<()> {
        info!("controller: starting event loop");
        presenter.draw(&self.view)?;

        loop {
            let flow = tokio::select! {
                evt = input_rx.recv() => match evt {
                    Some(evt) => self.handle_input(evt).await?,
                    None => {
                        info!("controller: input channel closed");
                        self.driver.close().await;
                        Flow::Quit
                    }
                },
                Some(evt) = status_rx.recv() => {
                    self.handle_status(evt);
                    Flow::Continue
                }
                Some(line) = log_rx.recv() => {
                    self.view.log.push(line);
                    Flow::Continue
                }
            };

            if flow == Flow::Quit {
                break;
            }
            presenter.draw(&self.view)?;
        }

        info!("controller: event loop finished");
        Ok(())
    }

    pub async fn handle_input(&mut self, evt: UiEvent) -> Result<Flow, DriverError> {
        match evt {
            UiEvent::Resize(w, h) => {
                debug!("controller: resize {}x{}", w, h);
                self.view.resize(w, h);
                Ok(Flow::Continue)
            }
            UiEvent::Key(key) => self.handle_key(key).await,
        }
    }

    async fn handle_key(&mut self, key: Key) -> Result<Flow, DriverError> {
        match key {
            // ── Playback ──────────────────────────────────────────────────────
            Key::Confirm => {
                let cursor = self.view.stations.selected;
                self.confirm(cursor).await?;
            }
            Key::Stop => self.stop().await,
            Key::Refresh => self.refresh().await,
            Key::Pause => self.driver.pause().await,
            Key::Mute => self.driver.mute().await,
            Key::VolumeUp => self.driver.inc_volume().await,
            Key::VolumeDown => self.driver.dec_volume().await,

            // ── Navigation ────────────────────────────────────────────────────
            Key::Up => self.view.stations.select_up(1),
            Key::Down => self.view.stations.select_down(1),
            Key::PageUp => {
                let page = self.view.geometry.station_rows().max(1);
                self.view.stations.select_up(page);
            }
            Key::PageDown => {
                let page = self.view.geometry.station_rows().max(1);
                self.view.stations.select_down(page);
            }
            Key::Top => self.view.stations.select_first(),
            Key::Bottom => self.view.stations.select_last(),
            Key::LogUp => {
                let page = self.view.geometry.log_rows();
                self.view.log.page_up(page);
            }
            Key::LogDown => {
                let page = self.view.geometry.log_rows();
                self.view.log.page_down(page);
            }

            // ── System ────────────────────────────────────────────────────────
            Key::Quit => {
                info!("controller: quit");
                self.driver.close().await;
                return Ok(Flow::Quit);
            }
        }

        let rows = self.view.geometry.station_rows();
        self.view.stations.ensure_visible(rows);
        Ok(Flow::Continue)
    }

    /// Enter on a row: pause when it is already playing, otherwise switch.
    pub async fn confirm(&mut self, index: usize) -> Result<(), DriverError> {
        if self.selection == Selection::Selected(index) {
            self.driver.pause().await;
            return Ok(());
        }

        let Some(station) = self.catalog.get_selected(index) else {
            debug!("controller: no station at index {}", index);
            return Ok(());
        };
        let url = station.url.clone();
        info!("controller: selecting {} ({})", station.name, url);

        if let Selection::Selected(_) = self.selection {
            self.view.playing = None;
        }

        self.driver.play(&url).await?;
        self.selection = Selection::Selected(index);
        self.view.playing = Some(index);
        self.view.volume.set(self.default_volume);
        Ok(())
    }

    async fn stop(&mut self) {
        if self.selection == Selection::None {
            return;
        }
        info!("controller: stop");
        self.driver.close().await;
        self.view.playing = None;
        self.view.volume.hide();
        self.selection = Selection::None;
    }

    async fn refresh(&mut self) {
        info!("controller: refreshing station list");
        self.driver.close().await;
        self.selection = Selection::None;
        self.view.playing = None;
        self.view.volume.hide();

        match self.catalog.reload() {
            Ok(()) => self.view.stations.set_items(self.catalog.rows()),
            Err(e) => {
                info!("controller: reload failed: {}", e);
                self.view.log.push(format!("Reload failed: {}", e));
            }
        }
    }

    pub fn handle_status(&mut self, evt: StatusEvent) {
        match evt {
            StatusEvent::TitleChanged(title) => {
                debug!("controller: now playing {:?}", title);
                self.view.now_playing = title;
            }
            StatusEvent::VolumeChanged(percent) => {
                self.view.volume.set(percent);
            }
            StatusEvent::RawLine(line) => {
                self.view.log.push(line);
            }
            StatusEvent::StreamEnded(reason) => {
                self.view.now_playing.clear();
                self.view.log.push(format!("Pipe closed: {}", reason));
            }
        }
    }
}
