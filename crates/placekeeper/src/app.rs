use std::{sync::Arc, time::Duration};

use eframe::{App, Frame, NativeOptions};
use egui::{Context, ViewportBuilder, ViewportCommand};
use logging::diag::DiagLog;
use placekeeper_engine::{
    Coordinator,
    service::{ServiceHandle, spawn_service},
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{error, info};
use tray_icon::TrayIcon;

use crate::{log_view::LogView, tray};

/// How often the hidden root viewport wakes up to check on the service.
const HEARTBEAT: Duration = Duration::from_secs(1);

/// Events delivered to the UI thread.
pub enum AppEvent {
    /// Show the diagnostics window.
    ShowLog,
    /// Hide the diagnostics window.
    HideLog,
    /// Stop the service and exit.
    Quit,
}

/// Root eframe application. The root viewport is never shown.
pub struct KeeperApp {
    /// UI event inbox.
    rx: tokio_mpsc::UnboundedReceiver<AppEvent>,
    /// Kept alive for as long as the icon should stay in the tray.
    _tray: Option<TrayIcon>,
    /// Diagnostics window.
    log_view: LogView,
    /// Background service; `None` once stopped.
    service: Option<ServiceHandle>,
}

impl KeeperApp {
    /// Stop the service, remove the tray icon and close the root viewport.
    fn quit(&mut self, ctx: &Context) {
        if let Some(service) = self.service.take()
            && let Err(e) = service.shutdown()
        {
            error!("service stopped with error: {}", e);
        }
        self.log_view.hide();
        self._tray = None;
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }
}

impl App for KeeperApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && self.service.is_some() {
            ctx.send_viewport_cmd(ViewportCommand::Visible(false));
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
        }

        while let Ok(ev) = self.rx.try_recv() {
            match ev {
                AppEvent::ShowLog => self.log_view.show(),
                AppEvent::HideLog => self.log_view.hide(),
                AppEvent::Quit => {
                    info!("quit requested");
                    self.quit(ctx);
                    return;
                }
            }
        }

        if self.service.as_ref().is_some_and(ServiceHandle::is_finished) {
            error!("service exited; shutting down");
            self.quit(ctx);
            return;
        }

        self.log_view.render(ctx);
        ctx.request_repaint_after(HEARTBEAT);
    }
}

/// Start the service and run the tray UI on this thread until quit.
pub fn run(coord: Coordinator) -> eframe::Result<()> {
    let diag: Arc<DiagLog> = coord.diag().clone();
    let service = match spawn_service(coord) {
        Ok(s) => s,
        Err(e) => return Err(eframe::Error::AppCreation(Box::new(e))),
    };

    let options = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_visible(false)
            .with_taskbar(false),
        ..Default::default()
    };

    let (tx, rx) = tokio_mpsc::unbounded_channel::<AppEvent>();
    let tx_ctrl = service.sender();

    eframe::run_native(
        "placekeeper",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.send_viewport_cmd(ViewportCommand::Visible(false));

            let repaint = cc.egui_ctx.clone();
            diag.set_on_append(move || repaint.request_repaint());

            let tray_icon = tray::build_tray_and_listeners(&tx, &tx_ctrl, &cc.egui_ctx);
            let mut log_view = LogView::new(diag);
            log_view.set_control_sender(tx_ctrl.clone());
            log_view.set_event_sender(tx.clone());

            Ok(Box::new(KeeperApp {
                rx,
                _tray: tray_icon,
                log_view,
                service: Some(service),
            }))
        }),
    )
}
