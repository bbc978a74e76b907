use std::{io, result::Result as StdResult};

use placekeeper_engine::{ControlMsg, Coordinator, Error, Result, service};
use tokio::{runtime::Builder, signal, sync::mpsc, task::JoinError};
use tracing::info;

/// Flatten a joined service task into the service result.
fn joined(res: StdResult<Result<()>, JoinError>) -> Result<()> {
    res.unwrap_or_else(|e| Err(Error::Runtime(io::Error::other(e))))
}

/// Run the service on this thread until Ctrl-C.
pub fn run(coord: Coordinator) -> Result<()> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;
    rt.block_on(async move {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut serve = tokio::spawn(service::serve(coord, rx));
        tokio::select! {
            res = &mut serve => return joined(res),
            _ = signal::ctrl_c() => info!("interrupted"),
        }
        let _ = tx.send(ControlMsg::Shutdown);
        joined(serve.await)
    })
}
