//! Outbound writer that drains a connection's queue into its socket.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::message::frame::Frame;

use super::handle::ConnectionHandle;

/// Forward queued frames to `sink` until the connection closes.
///
/// Every write is bounded by `send_timeout`. A write that fails or misses
/// the deadline aborts the connection, which also ends its receive loop.
/// Once the handle is closed the rest of the queue is flushed, then the
/// close frame from the handle's slot is written last.
pub async fn run_writer<S>(
    handle: Arc<ConnectionHandle>,
    mut outbound: mpsc::Receiver<Frame>,
    mut sink: S,
    send_timeout: Duration,
) where
    S: Sink<Frame> + Unpin,
    S::Error: Display,
{
    let mut healthy = true;

    loop {
        // Queued frames win over cancellation so the queue drains first.
        let frame = tokio::select! {
            biased;
            frame = outbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            _ = handle.cancelled() => break,
        };

        if !write_frame(&handle, &mut sink, frame, send_timeout).await {
            healthy = false;
            break;
        }
    }

    let close_frame = if healthy {
        handle.take_close_frame()
    } else {
        None
    };
    if let Some(frame) = close_frame {
        write_frame(&handle, &mut sink, frame, send_timeout).await;
    }

    if let Ok(Err(e)) = time::timeout(send_timeout, sink.close()).await {
        debug!(conn_id = %handle.id, error = %e, "Socket close failed");
    }

    debug!(conn_id = %handle.id, "Writer loop ended");
}

/// Write one frame under the deadline. Aborts the connection on failure.
async fn write_frame<S>(
    handle: &ConnectionHandle,
    sink: &mut S,
    frame: Frame,
    send_timeout: Duration,
) -> bool
where
    S: Sink<Frame> + Unpin,
    S::Error: Display,
{
    match time::timeout(send_timeout, sink.send(frame)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(conn_id = %handle.id, error = %e, "Socket write failed");
            handle.abort();
            false
        }
        Err(_) => {
            warn!(
                conn_id = %handle.id,
                timeout_ms = send_timeout.as_millis() as u64,
                "Socket write timed out, dropping slow peer"
            );
            handle.abort();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::channel::mpsc as fmpsc;

    use crate::message::frame::CloseNotice;

    #[tokio::test]
    async fn test_forwards_frames_in_order() {
        let (handle, rx) = ConnectionHandle::with_capacity(8);
        let handle = Arc::new(handle);
        let (sink, mut socket) = fmpsc::unbounded::<Frame>();

        let writer = tokio::spawn(run_writer(
            handle.clone(),
            rx,
            sink,
            Duration::from_secs(1),
        ));

        handle.send(Frame::Text("one".into())).unwrap();
        handle.send(Frame::Text("two".into())).unwrap();

        assert_eq!(socket.next().await, Some(Frame::Text("one".into())));
        assert_eq!(socket.next().await, Some(Frame::Text("two".into())));

        handle.close(Some(CloseNotice::game_closed()));
        assert_eq!(
            socket.next().await,
            Some(Frame::Close(Some(CloseNotice::game_closed())))
        );

        writer.await.unwrap();
        assert_eq!(socket.next().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_aborts_connection() {
        let (handle, rx) = ConnectionHandle::with_capacity(8);
        let handle = Arc::new(handle);
        let (sink, socket) = fmpsc::unbounded::<Frame>();
        drop(socket);

        let writer = tokio::spawn(run_writer(
            handle.clone(),
            rx,
            sink,
            Duration::from_secs(1),
        ));

        handle.send(Frame::Text("lost".into())).unwrap();
        writer.await.unwrap();

        assert!(!handle.is_alive());
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_peer_hits_deadline() {
        let (handle, rx) = ConnectionHandle::with_capacity(8);
        let handle = Arc::new(handle);
        // Bounded channel with nobody reading: the second write never completes.
        let (sink, _socket) = fmpsc::channel::<Frame>(0);

        let writer = tokio::spawn(run_writer(
            handle.clone(),
            rx,
            sink,
            Duration::from_millis(100),
        ));

        handle.send(Frame::Text("a".into())).unwrap();
        handle.send(Frame::Text("b".into())).unwrap();
        handle.send(Frame::Text("c".into())).unwrap();

        writer.await.unwrap();
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_close_frame_follows_full_queue() {
        let (handle, rx) = ConnectionHandle::with_capacity(1);
        let handle = Arc::new(handle);
        let (sink, socket) = fmpsc::unbounded::<Frame>();

        handle.send(Frame::Text("state".into())).unwrap();
        assert_eq!(
            handle.send(Frame::Text("more".into())),
            Err(crate::connection::handle::SendError::QueueFull)
        );
        handle.close(Some(CloseNotice::game_closed()));

        run_writer(handle.clone(), rx, sink, Duration::from_secs(1)).await;

        let written: Vec<Frame> = socket.collect().await;
        assert_eq!(
            written,
            vec![
                Frame::Text("state".into()),
                Frame::Close(Some(CloseNotice::game_closed())),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_write_skips_close_frame() {
        let (handle, rx) = ConnectionHandle::with_capacity(4);
        let handle = Arc::new(handle);
        let (sink, socket) = fmpsc::unbounded::<Frame>();
        drop(socket);

        handle.send(Frame::Text("lost".into())).unwrap();
        handle.close(Some(CloseNotice::game_closed()));

        tokio::time::timeout(
            Duration::from_secs(1),
            run_writer(handle.clone(), rx, sink, Duration::from_secs(1)),
        )
        .await
        .expect("writer should stop after the failed write");
        assert!(handle.is_cancelled());
    }
}
