//! Session channel: one reconnecting connection driving one [`Session`].
//!
//! [`spawn`] starts a driver task that exclusively owns the session. The
//! session lives inside a `watch` sender and is mutated in place, so every
//! inbound event is fully applied before the next one is read. Observers
//! only ever see complete states.
//!
//! Connection attempts are strictly sequential. After a failed attempt or a
//! lost connection the driver waits exactly `reconnect_delay` and tries
//! again, forever, until shut down.

use std::{ops::ControlFlow, time::Duration};

use futures::{SinkExt, StreamExt};
use goku_core::{
    Connection, Connector, FrameSink, InboundEvent, OutboundEvent, Session, TransportError,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Delay between a connection loss and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Channel settings.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Fixed wait before every reconnection attempt.
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Channel error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Session channel closed")]
    Closed,
}

#[derive(Debug)]
enum Command {
    Send(String),
    Stop,
}

/// Handle to a running session channel.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<Session>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Send a user message.
    ///
    /// The message is appended to the transcript immediately. Its frame is
    /// silently dropped if the channel is not connected at that moment.
    ///
    /// # Errors
    /// Returns error if the driver task has exited.
    pub fn send_message(&self, content: impl Into<String>) -> Result<(), ChannelError> {
        self.commands
            .send(Command::Send(content.into()))
            .map_err(|_| ChannelError::Closed)
    }

    /// Ask the backend to terminate the current action.
    ///
    /// # Errors
    /// Returns error if the driver task has exited.
    pub fn stop(&self) -> Result<(), ChannelError> {
        self.commands
            .send(Command::Stop)
            .map_err(|_| ChannelError::Closed)
    }

    /// Get a receiver notified after every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.clone()
    }

    /// Get a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Close the connection, cancel any pending reconnection and wait for
    /// the driver to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Session channel task failed: {e}");
        }
    }
}

/// Start a session channel.
pub fn spawn<C>(connector: C, config: ChannelConfig) -> SessionHandle
where
    C: Connector + 'static,
{
    let session = Session::new();
    let span = tracing::info_span!(
        "session",
        id = %session.id(),
        endpoint = connector.endpoint(),
    );

    let (state_tx, state_rx) = watch::channel(session);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let driver = Driver {
        connector,
        config,
        state: state_tx,
        commands: command_rx,
        cancel: cancel.clone(),
    };
    let task = tokio::spawn(driver.run().instrument(span));

    SessionHandle {
        commands: command_tx,
        state: state_rx,
        cancel,
        task,
    }
}

enum Attempt {
    Connected(Connection),
    Failed(TransportError),
    Shutdown,
}

struct Driver<C> {
    connector: C,
    config: ChannelConfig,
    state: watch::Sender<Session>,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        loop {
            match self.connect().await {
                Attempt::Connected(connection) => {
                    tracing::info!("Connected");
                    self.state.send_modify(Session::mark_connected);
                    if self.pump(connection).await.is_break() {
                        break;
                    }
                    tracing::info!("Connection lost");
                }
                Attempt::Failed(e) => tracing::warn!("Connect failed: {e}"),
                Attempt::Shutdown => break,
            }

            self.state.send_modify(Session::mark_disconnected);
            let delay = self.config.reconnect_delay;
            if self.wait(delay).await.is_break() {
                break;
            }
        }

        self.state.send_modify(Session::mark_disconnected);
        tracing::debug!("Session channel stopped");
    }

    /// One connection attempt. User commands are still served meanwhile.
    async fn connect(&mut self) -> Attempt {
        self.state.send_modify(Session::mark_connecting);

        let mut attempt = self.connector.connect();

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Attempt::Shutdown,
                result = &mut attempt => {
                    return match result {
                        Ok(connection) => Attempt::Connected(connection),
                        Err(e) => Attempt::Failed(e),
                    };
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return Attempt::Shutdown;
                    };
                    serve_offline(&self.state, command);
                }
            }
        }
    }

    /// Pump an open connection. `Continue` means the connection was lost.
    async fn pump(&mut self, connection: Connection) -> ControlFlow<()> {
        let Connection {
            mut sink,
            mut stream,
        } = connection;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    close(&mut sink).await;
                    return ControlFlow::Break(());
                }
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        tracing::warn!("Connection error: {e}");
                        return ControlFlow::Continue(());
                    }
                    None => return ControlFlow::Continue(()),
                },
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        close(&mut sink).await;
                        return ControlFlow::Break(());
                    };
                    let outbound = match command {
                        Command::Send(content) => {
                            let mut outbound = None;
                            self.state
                                .send_modify(|session| outbound = Some(session.begin_send(content)));
                            outbound
                        }
                        Command::Stop => Some(OutboundEvent::Stop),
                    };
                    if let Some(event) = outbound {
                        if let Err(e) = send_event(&mut sink, &event).await {
                            tracing::warn!("Send failed: {e}");
                            return ControlFlow::Continue(());
                        }
                    }
                }
            }
        }
    }

    /// Wait out the reconnect delay. `Break` means shut down.
    async fn wait(&mut self, delay: Duration) -> ControlFlow<()> {
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return ControlFlow::Break(()),
                () = &mut timer => return ControlFlow::Continue(()),
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        return ControlFlow::Break(());
                    };
                    serve_offline(&self.state, command);
                }
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let event = match InboundEvent::decode(text) {
            Ok(InboundEvent::Unknown { kind }) => {
                tracing::debug!(kind, "Ignoring unknown event");
                return;
            }
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Ignoring undecodable frame: {e}");
                return;
            }
        };

        self.state.send_modify(|session| {
            let effect = session.apply(event);
            tracing::trace!(?effect, "Applied event");
        });
    }
}

/// Handle a user command while no connection is open.
fn serve_offline(state: &watch::Sender<Session>, command: Command) {
    match command {
        Command::Send(content) => {
            state.send_modify(|session| {
                session.begin_send(content);
            });
            tracing::debug!("Not connected, dropping outbound message");
        }
        Command::Stop => tracing::debug!("Not connected, dropping stop request"),
    }
}

async fn send_event(sink: &mut FrameSink, event: &OutboundEvent) -> Result<(), TransportError> {
    let text = event
        .encode()
        .map_err(|e| TransportError::Protocol(e.to_string()))?;
    sink.send(text).await
}

async fn close(sink: &mut FrameSink) {
    if let Err(e) = sink.close().await {
        tracing::debug!("Close failed: {e}");
    }
}
