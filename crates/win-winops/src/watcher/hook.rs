//! Watcher thread: WinEvent hook plus hidden window and message pump.

use std::{mem, ptr, sync::mpsc, thread};

use tracing::{debug, warn};
use windows_sys::Win32::{
    Foundation::{GetLastError, HWND, LPARAM, LRESULT, WPARAM},
    System::{LibraryLoader::GetModuleHandleW, Threading::GetCurrentThreadId},
    UI::{
        Accessibility::{HWINEVENTHOOK, SetWinEventHook, UnhookWinEvent},
        WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, MSG,
            PostThreadMessageW, RegisterClassW, TranslateMessage, WM_DISPLAYCHANGE, WM_QUIT,
            WNDCLASSW,
        },
    },
};

use super::{WatchEvent, emit, is_window_move};
use crate::{Error, Result};

const EVENT_OBJECT_LOCATIONCHANGE: u32 = 0x800B;
const WINEVENT_OUTOFCONTEXT: u32 = 0x0000;
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

/// Class name of the hidden display-change window.
const WATCHER_CLASS: &str = "placekeeper.watcher";

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

unsafe extern "system" fn on_win_event(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if event != EVENT_OBJECT_LOCATIONCHANGE || !is_window_move(hwnd, id_object, id_child) {
        return;
    }
    emit(WatchEvent::LocationChanged {
        id: hwnd,
        object_id: id_object,
        child_id: id_child,
    });
}

unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == WM_DISPLAYCHANGE {
        emit(WatchEvent::DisplayChanged);
        return 0;
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Register the class and create the hidden window on the calling thread.
fn create_hidden_window() -> Result<HWND> {
    let class = wide(WATCHER_CLASS);
    unsafe {
        let instance = GetModuleHandleW(ptr::null());
        // SAFETY: WNDCLASSW is plain old data; zero means "unset" for every field.
        let mut wc: WNDCLASSW = mem::zeroed();
        wc.lpfnWndProc = Some(wnd_proc);
        wc.hInstance = instance;
        wc.lpszClassName = class.as_ptr();
        if RegisterClassW(&wc) == 0 {
            let code = GetLastError();
            if code != ERROR_CLASS_ALREADY_EXISTS {
                return Err(Error::ClassRegistration(code));
            }
        }
        // Deliberately a hidden top-level window: message-only windows do not
        // receive broadcasts such as WM_DISPLAYCHANGE.
        let hwnd = CreateWindowExW(
            0,
            class.as_ptr(),
            class.as_ptr(),
            0,
            0,
            0,
            0,
            0,
            0,
            0,
            instance,
            ptr::null(),
        );
        if hwnd == 0 {
            return Err(Error::WindowCreation(GetLastError()));
        }
        Ok(hwnd)
    }
}

/// Body of the watcher thread. Reports setup success through `ready`.
fn run(ready: &mpsc::Sender<Result<u32>>) {
    let hwnd = match create_hidden_window() {
        Ok(h) => h,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let hook = unsafe {
        SetWinEventHook(
            EVENT_OBJECT_LOCATIONCHANGE,
            EVENT_OBJECT_LOCATIONCHANGE,
            0,
            Some(on_win_event),
            0,
            0,
            WINEVENT_OUTOFCONTEXT,
        )
    };
    if hook == 0 {
        unsafe { DestroyWindow(hwnd) };
        let _ = ready.send(Err(Error::HookInstall));
        return;
    }
    let thread_id = unsafe { GetCurrentThreadId() };
    if ready.send(Ok(thread_id)).is_err() {
        unsafe {
            UnhookWinEvent(hook);
            DestroyWindow(hwnd);
        }
        return;
    }
    debug!(thread_id, "watcher installed");

    unsafe {
        // SAFETY: MSG is plain old data and only written by GetMessageW.
        let mut msg: MSG = mem::zeroed();
        loop {
            let r = GetMessageW(&mut msg, 0, 0, 0);
            if r == 0 {
                break;
            }
            if r == -1 {
                warn!("watcher GetMessageW failed: code {}", GetLastError());
                break;
            }
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        UnhookWinEvent(hook);
        DestroyWindow(hwnd);
    }
}

/// Spawn the watcher thread and wait until it is installed.
pub(super) fn spawn() -> Result<(u32, thread::JoinHandle<()>)> {
    let (ready_tx, ready_rx) = mpsc::channel();
    let join = thread::Builder::new()
        .name("placekeeper-watcher".to_string())
        .spawn(move || run(&ready_tx))
        .map_err(|e| Error::WatcherThread(e.to_string()))?;
    match ready_rx.recv() {
        Ok(Ok(thread_id)) => Ok((thread_id, join)),
        Ok(Err(e)) => {
            let _ = join.join();
            Err(e)
        }
        Err(_) => {
            let _ = join.join();
            Err(Error::WatcherThread("exited during setup".to_string()))
        }
    }
}

/// Ask the watcher thread's message loop to exit.
pub(super) fn request_quit(thread_id: u32) {
    if unsafe { PostThreadMessageW(thread_id, WM_QUIT, 0, 0) } == 0 {
        warn!("failed to post quit to watcher thread: code {}", unsafe {
            GetLastError()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{WATCHER_CLASS, wide};

    #[test]
    fn class_name_is_nul_terminated_utf16() {
        let w = wide(WATCHER_CLASS);
        assert_eq!(w.last(), Some(&0));
        assert_eq!(String::from_utf16_lossy(&w[..w.len() - 1]), WATCHER_CLASS);
    }
}
