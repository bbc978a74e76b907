use std::sync::Arc;

use egui::{
    CentralPanel, Context, FontId, Layout, ScrollArea, ViewportBuilder, ViewportCommand,
    ViewportId, vec2,
};
use logging::diag::{DiagLog, DiagSink};
use placekeeper_engine::ControlMsg;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppEvent;

const PAD: f32 = 8.0;

/// Diagnostics window: the log buffer in a bottom-sticking scroll area.
pub struct LogView {
    visible: bool,
    id: ViewportId,
    want_initial_size: bool,
    want_focus: bool,
    diag: Arc<DiagLog>,
    tx_ctrl: Option<UnboundedSender<ControlMsg>>,
    tx_app: Option<UnboundedSender<AppEvent>>,
}

impl LogView {
    pub fn new(diag: Arc<DiagLog>) -> Self {
        Self {
            visible: false,
            id: ViewportId::from_hash_of("placekeeper_log"),
            want_initial_size: true,
            want_focus: false,
            diag,
            tx_ctrl: None,
            tx_app: None,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.want_focus = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn set_control_sender(&mut self, tx: UnboundedSender<ControlMsg>) {
        self.tx_ctrl = Some(tx);
    }

    pub fn set_event_sender(&mut self, tx: UnboundedSender<AppEvent>) {
        self.tx_app = Some(tx);
    }

    pub fn render(&mut self, ctx: &Context) {
        if !self.visible {
            ctx.send_viewport_cmd_to(self.id, ViewportCommand::Visible(false));
            return;
        }

        let mut builder = ViewportBuilder::default()
            .with_title("placekeeper")
            .with_visible(true)
            .with_decorations(true)
            .with_resizable(true);
        if self.want_initial_size {
            builder = builder.with_inner_size(vec2(640.0, 400.0));
            self.want_initial_size = false;
        }

        let text = self.diag.snapshot();
        let enabled = self.diag.enabled();
        ctx.show_viewport_immediate(self.id, builder, |wctx, _| {
            if wctx.input(|i| i.viewport().close_requested()) {
                // Closing only hides; the app keeps running in the tray.
                self.visible = false;
                wctx.send_viewport_cmd(ViewportCommand::Visible(false));
                return;
            }
            if self.want_focus {
                wctx.send_viewport_cmd_to(self.id, ViewportCommand::Focus);
                self.want_focus = false;
            }
            CentralPanel::default().show(wctx, |ui| {
                ui.with_layout(Layout::top_down(egui::Align::Min), |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("Clear").clicked() {
                            self.diag.clear();
                        }
                        let label = if enabled {
                            "Disable Diagnostics"
                        } else {
                            "Enable Diagnostics"
                        };
                        if ui.button(label).clicked()
                            && let Some(tx) = &self.tx_ctrl
                        {
                            let _ = tx.send(ControlMsg::ToggleDiagnostics);
                        }
                        if ui.button("Force Restore").clicked()
                            && let Some(tx) = &self.tx_ctrl
                        {
                            let _ = tx.send(ControlMsg::ForceRestore);
                        }
                        if ui.button("Hide").clicked()
                            && let Some(tx) = &self.tx_app
                        {
                            let _ = tx.send(AppEvent::HideLog);
                        }
                    });
                    ui.add_space(PAD);
                    ui.separator();
                    ui.add_space(PAD);
                    ScrollArea::vertical()
                        .auto_shrink([false; 2])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            ui.style_mut().override_font_id = Some(FontId::monospace(12.0));
                            if text.is_empty() {
                                ui.weak("Nothing logged yet.");
                            } else {
                                ui.label(text.as_str());
                            }
                        });
                });
            });
        });
    }
}
