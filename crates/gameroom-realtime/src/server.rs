//! Top-level relay engine that ties the registry, drivers, writers and
//! background tasks together.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, Stream};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use gameroom_core::config::RealtimeConfig;
use gameroom_core::error::AppError;
use gameroom_core::types::SessionId;

use crate::connection::handle::ConnectionHandle;
use crate::connection::heartbeat::Heartbeat;
use crate::connection::writer::run_writer;
use crate::message::frame::{CloseNotice, Frame};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::session::driver::{JoinRole, SessionDriver, Termination};
use crate::session::registry::SessionRegistry;
use crate::session::sweeper::EmptySessionSweeper;

/// Point-in-time view of the engine for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    /// Session entries, including empty ones.
    pub sessions: usize,
    /// Connections currently joined to a session.
    pub connections: usize,
    /// Counter values.
    pub metrics: MetricsSnapshot,
}

/// Central relay engine shared by every connection task.
#[derive(Debug, Clone)]
pub struct RelayEngine {
    /// Session registry.
    pub registry: Arc<SessionRegistry>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    config: RealtimeConfig,
    shutdown: CancellationToken,
}

impl RelayEngine {
    /// Creates a new relay engine with an empty registry.
    pub fn new(config: RealtimeConfig) -> Self {
        info!(
            outbound_buffer = config.outbound_buffer_size,
            send_timeout_ms = config.send_timeout_ms,
            ping_interval_secs = config.ping_interval_seconds,
            "Relay engine initialized"
        );

        Self {
            registry: Arc::new(SessionRegistry::new()),
            metrics: Arc::new(EngineMetrics::new()),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Relay configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Joins a new connection to a session.
    ///
    /// Returns the driver that owns the connection and the receiver its
    /// writer must drain. Fails once shutdown has started.
    pub fn connect(
        &self,
        session_id: SessionId,
        role: JoinRole,
    ) -> Result<(SessionDriver, tokio::sync::mpsc::Receiver<Frame>), AppError> {
        if self.is_shutting_down() {
            return Err(AppError::service_unavailable("Server is shutting down"));
        }
        Ok(self.admit(session_id, role))
    }

    /// Registers the connection, then closes its session again if shutdown
    /// began in the meantime.
    ///
    /// Shutdown cancels the token before it sweeps the registry, so a join
    /// that misses the sweep always sees the token here.
    fn admit(
        &self,
        session_id: SessionId,
        role: JoinRole,
    ) -> (SessionDriver, tokio::sync::mpsc::Receiver<Frame>) {
        let (handle, outbound) = ConnectionHandle::with_capacity(self.config.outbound_buffer_size);
        let driver = SessionDriver::join(
            self.registry.clone(),
            self.metrics.clone(),
            session_id,
            role,
            Arc::new(handle),
            Heartbeat::from_config(&self.config),
        );

        if self.is_shutting_down() {
            let session_id = driver.session_id().clone();
            debug!(session_id = %session_id, "Joined during shutdown, closing");
            self.registry
                .close_session(&session_id, &CloseNotice::server_shutdown());
        }

        (driver, outbound)
    }

    /// Runs a whole connection: join, relay until the transport ends, leave.
    ///
    /// `inbound` yields frames read from the transport; `sink` writes frames
    /// back to it.
    pub async fn run_connection<St, Si, E>(
        &self,
        session_id: SessionId,
        role: JoinRole,
        inbound: St,
        sink: Si,
    ) -> Result<Termination, AppError>
    where
        St: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
        Si: Sink<Frame> + Unpin + Send + 'static,
        Si::Error: Display + Send,
    {
        let (driver, outbound) = self.connect(session_id, role)?;
        let handle = driver.handle().clone();

        let writer = tokio::spawn(run_writer(
            handle.clone(),
            outbound,
            sink,
            self.config.send_timeout(),
        ));

        let termination = driver.run(inbound).await;

        // The driver closed the handle, so the writer finishes after flushing.
        if tokio::time::timeout(self.config.send_timeout() * 2, writer)
            .await
            .is_err()
        {
            debug!(conn_id = %handle.id, "Writer did not finish in time");
        }

        Ok(termination)
    }

    /// Closes a session on request, telling every member the game is over.
    ///
    /// Returns `false` when the session does not exist.
    pub fn close_session(&self, session_id: &SessionId) -> bool {
        let found = self
            .registry
            .close_session(session_id, &CloseNotice::game_closed());
        if found {
            self.metrics.session_closed();
        }
        found
    }

    /// Starts the empty-session sweeper if configured.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        let interval = self.config.sweep_interval()?;
        let sweeper = EmptySessionSweeper::new(self.registry.clone(), self.metrics.clone(), interval);
        Some(tokio::spawn(sweeper.run(self.shutdown.clone())))
    }

    /// Current engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            sessions: self.registry.session_count(),
            connections: self.registry.connection_count(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Whether shutdown has started.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops background tasks and closes every session.
    ///
    /// Returns the number of sessions that were closed.
    pub fn shutdown(&self) -> usize {
        info!("Shutting down relay engine");
        self.shutdown.cancel();
        let closed = self.registry.close_all(&CloseNotice::server_shutdown());
        info!(sessions = closed, "Relay engine shut down");
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::StreamExt;
    use futures::channel::mpsc as fmpsc;

    fn sid(raw: &str) -> SessionId {
        SessionId::parse(raw).unwrap()
    }

    fn quiet_config() -> RealtimeConfig {
        RealtimeConfig {
            ping_interval_seconds: 0,
            ..RealtimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_connection_relays_and_cleans_up() {
        let engine = RelayEngine::new(quiet_config());

        let (host_in, host_stream) = fmpsc::unbounded::<Result<Frame, String>>();
        let (host_sink, mut host_socket) = fmpsc::unbounded::<Frame>();
        let (player_in, player_stream) = fmpsc::unbounded::<Result<Frame, String>>();
        let (player_sink, mut player_socket) = fmpsc::unbounded::<Frame>();

        let host = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .run_connection(sid("abc"), JoinRole::Host, host_stream, host_sink)
                    .await
            })
        };
        let player = {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .run_connection(sid("abc"), JoinRole::Player, player_stream, player_sink)
                    .await
            })
        };

        while engine.registry.member_count(&sid("abc")) < 2 {
            tokio::task::yield_now().await;
        }

        host_in.unbounded_send(Ok(Frame::Text("ping".into()))).unwrap();
        assert_eq!(host_socket.next().await, Some(Frame::Text("ping".into())));
        assert_eq!(player_socket.next().await, Some(Frame::Text("ping".into())));

        drop(player_in);
        assert_eq!(player.await.unwrap().unwrap(), Termination::RemoteClosed);
        assert_eq!(engine.registry.member_count(&sid("abc")), 1);

        assert!(engine.close_session(&sid("abc")));
        assert_eq!(host.await.unwrap().unwrap(), Termination::Closed);
        assert_eq!(
            host_socket.next().await,
            Some(Frame::Close(Some(CloseNotice::game_closed())))
        );
        drop(host_in);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.sessions, 0);
        assert_eq!(snapshot.metrics.sessions_closed, 1);
        assert_eq!(snapshot.metrics.connections_active, 0);
    }

    #[tokio::test]
    async fn test_close_unknown_session() {
        let engine = RelayEngine::new(quiet_config());
        assert!(!engine.close_session(&sid("never")));
        assert_eq!(engine.metrics.snapshot().sessions_closed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_connections() {
        let engine = RelayEngine::new(quiet_config());
        let (driver, _outbound) = engine.connect(sid("a"), JoinRole::Host).unwrap();

        assert_eq!(engine.shutdown(), 1);
        assert!(!driver.handle().is_alive());
        assert!(engine.connect(sid("a"), JoinRole::Player).is_err());
    }

    #[tokio::test]
    async fn test_join_racing_shutdown_is_closed() {
        let engine = RelayEngine::new(quiet_config());
        engine.shutdown();

        // A connection that passed the shutdown check just before the sweep.
        let (driver, _outbound) = engine.admit(sid("late"), JoinRole::Player);
        let handle = driver.handle().clone();

        assert!(!handle.is_alive());
        assert_eq!(
            handle.take_close_frame(),
            Some(Frame::Close(Some(CloseNotice::server_shutdown())))
        );
        assert!(!engine.registry.contains_session(&sid("late")));

        let (_tx, inbound) = fmpsc::unbounded::<Result<Frame, String>>();
        assert_eq!(driver.run(inbound).await, Termination::Closed);
        assert_eq!(engine.snapshot().connections, 0);
        assert_eq!(engine.metrics.snapshot().connections_active, 0);
    }

    #[tokio::test]
    async fn test_sweeper_disabled_by_default() {
        let engine = RelayEngine::new(quiet_config());
        assert!(engine.spawn_sweeper().is_none());

        let engine = RelayEngine::new(RealtimeConfig {
            empty_session_sweep_seconds: 1,
            ..quiet_config()
        });
        let task = engine.spawn_sweeper().expect("sweeper should start");
        engine.shutdown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
