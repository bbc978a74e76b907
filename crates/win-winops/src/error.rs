use thiserror::Error;

/// Errors that can occur during window operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The window closed between the liveness check and the operation.
    #[error("window gone")]
    WindowGone,

    /// A Win32 call failed with the given `GetLastError` code.
    #[error("Win32 call failed: code {0}")]
    Os(u32),

    /// Registering the watcher's window class failed.
    #[error("failed to register watcher window class: code {0}")]
    ClassRegistration(u32),

    /// Creating the watcher's hidden window failed.
    #[error("failed to create watcher window: code {0}")]
    WindowCreation(u32),

    /// `SetWinEventHook` returned a null hook.
    #[error("failed to install WinEvent hook")]
    HookInstall,

    /// The watcher thread could not be started or died during setup.
    #[error("watcher thread failed: {0}")]
    WatcherThread(String),

    /// The operation is not available on this platform.
    #[error("unsupported on this platform")]
    Unsupported,
}

/// Result alias for window operations.
pub type Result<T> = std::result::Result<T, Error>;
