use std::future::Future;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use super::bridge::HostCommandReceiver;
use super::bridge_types::HostCommand;
use super::error::TransportError;

/// Delivers host commands to whatever owns the avatar window.
///
/// Implementations are called sequentially, one command at a time, in bridge call order.
pub trait HostTransport: Send + 'static {
    fn send(
        &mut self,
        command: HostCommand,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Pumps commands from a [`super::bridge::WindowInteractionBridge`] into a transport.
///
/// Fire-and-forget: a failed delivery is logged and dropped. There is no retry, backoff
/// or timeout at this layer. The loop ends once every bridge handle is dropped.
pub struct HostDispatcher<T> {
    rx: HostCommandReceiver,
    transport: T,
}

impl<T: HostTransport> HostDispatcher<T> {
    pub fn new(rx: HostCommandReceiver, transport: T) -> Self {
        Self { rx, transport }
    }

    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        log::info!("Host dispatcher started");

        while let Some(command) = self.rx.recv().await {
            let name = command.name();
            match self.transport.send(command).await {
                Ok(()) => {
                    stats.delivered += 1;
                    log::trace!("Host command delivered: {}", name);
                }
                Err(err) => {
                    stats.failed += 1;
                    log::warn!("Host command {} not delivered: {}", name, err);
                }
            }
        }

        log::info!(
            "Host dispatcher stopped (delivered={}, failed={})",
            stats.delivered,
            stats.failed
        );
        stats
    }

    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }
}

/// Newline-delimited JSON over any async byte sink (pipe, socket, stdout of a sidecar).
pub struct JsonLinesTransport<W> {
    writer: W,
}

impl<W> JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> HostTransport for JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, command: HostCommand) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(&command)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
