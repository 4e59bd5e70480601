//! TCP accept loop and bounded I/O pools.
//!
//! A single acceptor owns the listener. The loop multiplexes between new
//! connections and a short shutdown tick (at most 100 ms), so a console
//! `exit` is observed promptly without the acceptor ever blocking on
//! anything but readiness.
//!
//! # I/O pools
//!
//! [`IoPools`] bounds concurrent read-side and write-side work with two
//! semaphores, each sized to CPU parallelism plus a fixed queue allowance.
//! The split is deliberate: a slow client stuck in a write cannot exhaust
//! the permits reads run under. Saturation on the read side sheds the
//! affected connection (logged at warn) instead of growing memory without
//! bound.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::connection::handle_connection;
use crate::dispatch::Router;
use crate::state::SharedState;

/// How often the accept loop checks the shutdown flag.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long draining connections may take before they are aborted.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Pending tasks allowed beyond the worker parallelism, per pool.
const TASK_QUEUE_CAPACITY: usize = 1000;

/// Bounded admission for read-side and write-side work.
pub struct IoPools {
    read: Semaphore,
    write: Semaphore,
}

impl IoPools {
    /// Sizes both pools to CPU parallelism plus the queue allowance.
    #[must_use]
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        Self::with_capacity(workers + TASK_QUEUE_CAPACITY)
    }

    /// Explicit capacity, for tests that want to force saturation.
    #[must_use]
    pub fn with_capacity(permits: usize) -> Self {
        Self {
            read: Semaphore::new(permits),
            write: Semaphore::new(permits),
        }
    }

    /// Non-blocking read admission; `None` means the pool is saturated and
    /// the caller should shed load.
    #[must_use]
    pub fn try_acquire_read(&self) -> Option<SemaphorePermit<'_>> {
        self.read.try_acquire().ok()
    }

    /// Write admission. Waits: the bounded outbound queues upstream are the
    /// back-pressure, the pool only caps concurrency.
    pub async fn acquire_write(&self) -> SemaphorePermit<'_> {
        self.write
            .acquire()
            .await
            .expect("write pool semaphore closed")
    }
}

impl Default for IoPools {
    fn default() -> Self {
        Self::new()
    }
}

/// The connection acceptor.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    state: SharedState,
    pools: Arc<IoPools>,
}

impl Server {
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Propagates the bind failure.
    pub async fn bind(addr: &str, router: Arc<Router>, state: SharedState) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "server listening");
        Ok(Self {
            listener,
            router,
            state,
            pools: Arc::new(IoPools::new()),
        })
    }

    /// The bound address; useful when binding port 0.
    ///
    /// # Errors
    ///
    /// Propagates the socket query failure.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until shutdown is requested, then drains.
    pub async fn run(self) {
        let mut connections: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "client connected");
                        if let Err(err) = stream.set_nodelay(true) {
                            warn!(%peer, error = %err, "failed to set nodelay");
                        }
                        connections.spawn(handle_connection(
                            stream,
                            peer,
                            self.router.clone(),
                            self.pools.clone(),
                        ));
                    }
                    Err(err) => error!(error = %err, "accept failed"),
                },
                () = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {
                    if self.state.is_shutdown_requested() {
                        break;
                    }
                }
            }
        }

        // Stop accepting, give in-flight connections a moment, then cut
        // the stragglers. Their I/O errors are swallowed by the handlers.
        drop(self.listener);
        info!(live = connections.len(), "draining connections");
        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(live = connections.len(), "drain grace expired, aborting remainder");
            connections.shutdown().await;
        }
        info!("server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturated_read_pool_rejects() {
        let pools = IoPools::with_capacity(2);
        let a = pools.try_acquire_read().unwrap();
        let b = pools.try_acquire_read().unwrap();
        assert!(pools.try_acquire_read().is_none());
        drop(a);
        assert!(pools.try_acquire_read().is_some());
        drop(b);
    }

    #[tokio::test]
    async fn write_pool_waits_instead_of_rejecting() {
        let pools = IoPools::with_capacity(1);
        let held = pools.acquire_write().await;
        assert!(pools.write.try_acquire().is_err());
        drop(held);
        let _again = pools.acquire_write().await;
    }
}
