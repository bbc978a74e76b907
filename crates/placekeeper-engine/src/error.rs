use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised while starting or talking to the keeper service.
#[derive(Debug, Error)]
pub enum Error {
    /// The window event watcher could not be started.
    #[error("Watcher error: {0}")]
    Watcher(#[from] win_winops::Error),

    /// The tokio runtime could not be built.
    #[error("Runtime error: {0}")]
    Runtime(io::Error),

    /// The service loop has exited and no longer accepts messages.
    #[error("Service channel closed")]
    ChannelClosed,
}
