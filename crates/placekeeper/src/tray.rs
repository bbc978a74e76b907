use std::thread;

use egui::Context;
use placekeeper_engine::ControlMsg;
use tokio::sync::mpsc as tokio_mpsc;
use tray_icon::{
    Icon, MouseButton, TrayIcon, TrayIconBuilder, TrayIconEvent,
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem},
};

use crate::app::AppEvent;

/// Tray icon edge length in pixels.
const ICON_SIZE: u32 = 32;

/// Two side-by-side screens, drawn into an RGBA buffer.
fn tray_icon_image() -> Option<Icon> {
    // Orange for dev builds, white for release.
    let fg: [u8; 4] = if cfg!(debug_assertions) {
        [0xF0, 0x8A, 0x24, 0xFF]
    } else {
        [0xFF, 0xFF, 0xFF, 0xFF]
    };
    let screens = [(2, 8, 14, 20), (18, 8, 30, 20)];
    let mut rgba = vec![0u8; (ICON_SIZE * ICON_SIZE * 4) as usize];
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let on_frame = screens.iter().any(|&(l, t, r, b)| {
                (l..=r).contains(&x)
                    && (t..=b).contains(&y)
                    && (x == l || x == r || y == t || y == b)
            });
            let on_stand = (22..=24).contains(&y) && ((6..=10).contains(&x) || (22..=26).contains(&x));
            if on_frame || on_stand {
                let i = ((y * ICON_SIZE + x) * 4) as usize;
                rgba[i..i + 4].copy_from_slice(&fg);
            }
        }
    }
    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).ok()
}

pub fn build_tray_and_listeners(
    tx: &tokio_mpsc::UnboundedSender<AppEvent>,
    tx_ctrl: &tokio_mpsc::UnboundedSender<ControlMsg>,
    egui_ctx: &Context,
) -> Option<TrayIcon> {
    let (menu, show_id, restore_id, diag_id, quit_id) = {
        let menu = Menu::new();
        let show = MenuItem::new("Show Log", true, None);
        let restore = MenuItem::new("Force Restore", true, None);
        let diag = MenuItem::new("Toggle Diagnostics", true, None);
        let quit = MenuItem::new("Quit", true, None);
        let _ = menu.append(&show);
        let _ = menu.append(&restore);
        let _ = menu.append(&diag);
        let _ = menu.append(&PredefinedMenuItem::separator());
        let _ = menu.append(&quit);
        (
            menu,
            show.id().clone(),
            restore.id().clone(),
            diag.id().clone(),
            quit.id().clone(),
        )
    };

    let tray_icon_opt: Option<TrayIcon> = {
        let mut builder = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false);
        if let Some(icon) = tray_icon_image() {
            builder = builder.with_icon(icon);
        }
        match builder.with_tooltip("placekeeper").build() {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::error!("Failed to create tray icon: {}", e);
                None
            }
        }
    };

    if tray_icon_opt.is_some() {
        let tx = tx.clone();
        let egui_ctx = egui_ctx.clone();
        thread::spawn(move || {
            let rx_tray = TrayIconEvent::receiver();
            while let Ok(ev) = rx_tray.recv() {
                if matches!(
                    ev,
                    TrayIconEvent::Click {
                        button: MouseButton::Left,
                        ..
                    } | TrayIconEvent::DoubleClick { .. }
                ) {
                    let _ = tx.send(AppEvent::ShowLog);
                    egui_ctx.request_repaint();
                }
            }
        });
    }

    if tray_icon_opt.is_some() {
        let tx = tx.clone();
        let tx_ctrl = tx_ctrl.clone();
        let egui_ctx = egui_ctx.clone();
        thread::spawn(move || {
            let menu_rx = MenuEvent::receiver();
            while let Ok(ev) = menu_rx.recv() {
                if ev.id == show_id {
                    let _ = tx.send(AppEvent::ShowLog);
                } else if ev.id == restore_id {
                    let _ = tx_ctrl.send(ControlMsg::ForceRestore);
                } else if ev.id == diag_id {
                    let _ = tx_ctrl.send(ControlMsg::ToggleDiagnostics);
                } else if ev.id == quit_id {
                    let _ = tx.send(AppEvent::Quit);
                }
                egui_ctx.request_repaint();
            }
        });
    }

    tray_icon_opt
}
