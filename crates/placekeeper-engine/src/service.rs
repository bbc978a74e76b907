//! Runs a [`Coordinator`] against the live window watcher.
//!
//! [`serve`] is the async body; [`spawn_service`] runs it on a dedicated
//! thread with its own tokio runtime so the UI thread stays free.

use std::{
    io,
    thread::{self, JoinHandle},
};

use tokio::{
    runtime::Builder,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, error};
use win_winops::watcher::start_watcher;

use crate::{ControlMsg, Coordinator, Error, Result};

/// Take the first snapshot, start the watcher, and process events until a
/// [`ControlMsg::Shutdown`] arrives or `control` closes.
pub async fn serve(coord: Coordinator, control: UnboundedReceiver<ControlMsg>) -> Result<()> {
    coord.startup();
    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = match start_watcher(tx) {
        Ok(w) => w,
        Err(e) => {
            coord.shutdown().await;
            return Err(e.into());
        }
    };
    coord.run(rx, control).await;
    watcher.stop();
    debug!("watcher stopped");
    Ok(())
}

/// Handle to a service started with [`spawn_service`].
pub struct ServiceHandle {
    /// Control channel into the service loop.
    tx: UnboundedSender<ControlMsg>,
    /// Service thread; `None` once joined.
    join: Option<JoinHandle<Result<()>>>,
}

impl ServiceHandle {
    /// Send a control message.
    pub fn send(&self, msg: ControlMsg) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::ChannelClosed)
    }

    /// A sender that can be handed to other threads.
    pub fn sender(&self) -> UnboundedSender<ControlMsg> {
        self.tx.clone()
    }

    /// True once the service thread has exited.
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the service to stop and wait for it.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.tx.send(ControlMsg::Shutdown);
        self.join_thread()
    }

    /// Join the service thread and surface its result.
    fn join_thread(&mut self) -> Result<()> {
        match self.join.take() {
            Some(j) => j
                .join()
                .unwrap_or_else(|_| Err(Error::Runtime(io::Error::other("service thread panicked")))),
            None => Ok(()),
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.tx.send(ControlMsg::Shutdown);
            if let Err(e) = self.join_thread() {
                error!("service exited with error: {}", e);
            }
        }
    }
}

/// Run [`serve`] on a new thread with its own multi-threaded runtime.
pub fn spawn_service(coord: Coordinator) -> Result<ServiceHandle> {
    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("placekeeper-rt")
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let join = thread::Builder::new()
        .name("placekeeper-service".into())
        .spawn(move || {
            let res = rt.block_on(serve(coord, rx));
            if let Err(e) = &res {
                error!("service failed: {}", e);
            }
            res
        })
        .map_err(Error::Runtime)?;
    Ok(ServiceHandle {
        tx,
        join: Some(join),
    })
}
