//! Per-connection frame pipeline.
//!
//! Each accepted socket gets exactly one read loop and one writer task.
//! The read loop pulls frames, decodes, routes, and enqueues the encoded
//! response on the connection's bounded outbound queue; the writer task
//! drains that queue into the socket. Because a single task owns the read
//! loop and the queue preserves order, responses leave in request order no
//! matter how requests were pipelined.
//!
//! Failure policy:
//! - framing errors (oversized prefix, I/O) are fatal: the connection is
//!   torn down and logged at warn;
//! - payload decode failures answer `"malformed request"` and continue;
//! - read-pool saturation sheds this connection to protect the rest.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use roster_core::protocol::{decode_request, encode_response, FrameCodec, Response};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::config::BUFFER_SIZE_HINT;
use crate::dispatch::Router;
use crate::server::IoPools;

/// Responses a connection may have in flight before its read loop blocks.
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Drives one client connection to completion.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    pools: Arc<IoPools>,
) {
    let framed = Framed::with_capacity(stream, FrameCodec::new(), BUFFER_SIZE_HINT);
    let (sink, mut frames) = framed.split();

    let (outbound_tx, outbound_rx) = mpsc::channel::<Bytes>(OUTBOUND_QUEUE_CAPACITY);
    let writer = tokio::spawn(write_loop(sink, outbound_rx, pools.clone(), peer));

    while let Some(next) = frames.next().await {
        let payload = match next {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%peer, error = %err, "framing error, closing connection");
                break;
            }
        };

        // Admission to the read pool; the permit is held from decode
        // through response enqueue so per-connection processing stays
        // serialised with the pool bound.
        let Some(_permit) = pools.try_acquire_read() else {
            warn!(%peer, "read pool saturated, shedding connection");
            break;
        };

        let response = match decode_request(&payload) {
            Ok(request) => router.route(&request).await,
            Err(err) => {
                debug!(%peer, error = %err, "undecodable payload");
                Response::with_message("malformed request")
            }
        };

        if outbound_tx.send(encode_response(&response)).await.is_err() {
            // Writer is gone; nothing left to answer to.
            break;
        }
    }

    // Dropping the sender lets the writer drain what is queued, then stop.
    drop(outbound_tx);
    let _ = writer.await;
    debug!(%peer, "connection closed");
}

async fn write_loop(
    mut sink: SplitSink<Framed<TcpStream, FrameCodec>, Bytes>,
    mut outbound: mpsc::Receiver<Bytes>,
    pools: Arc<IoPools>,
    peer: SocketAddr,
) {
    while let Some(frame) = outbound.recv().await {
        let _permit = pools.acquire_write().await;
        if let Err(err) = sink.send(frame).await {
            warn!(%peer, error = %err, "write failed, dropping connection");
            return;
        }
    }
    // Peer went quiet; push out whatever the sink still buffers.
    let _ = sink.flush().await;
}
