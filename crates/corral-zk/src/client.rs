//! The stats-port client.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::error::{StatsError, StatsResult};
use crate::parse::{parse_mntr, parse_sessions, parse_stat, ClientSession, StatValue};

const MONITOR_COMMAND: &str = "mntr";
const STATUS_COMMAND: &str = "stat";

/// Client for a coordination-service status port.
///
/// Each command opens a fresh connection; connect, send, and receive are
/// individually bounded by the configured timeout. The server closes the
/// connection after answering, so a reply is read to end-of-stream.
#[derive(Debug, Clone)]
pub struct ZkStatsClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ZkStatsClient {
    /// Create a client with a one-second default timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(1),
        }
    }

    /// Set the per-operation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server metrics as a name-to-value map.
    ///
    /// Prefers the tab-separated `mntr` reply; servers that do not answer it
    /// fall back to the free-text `stat` block.
    #[instrument(skip(self), fields(host = %self.host, port = self.port))]
    pub async fn get_stats(&self) -> StatsResult<BTreeMap<String, StatValue>> {
        let data = self.send_command(MONITOR_COMMAND).await?;
        let stats = parse_mntr(&data);
        if !stats.is_empty() {
            return Ok(stats);
        }
        debug!("Empty mntr reply; falling back to stat");
        let data = self.send_command(STATUS_COMMAND).await?;
        Ok(parse_stat(&data))
    }

    /// The sessions currently connected to the server.
    #[instrument(skip(self), fields(host = %self.host, port = self.port))]
    pub async fn get_clients(&self) -> StatsResult<Vec<ClientSession>> {
        let data = self.send_command(STATUS_COMMAND).await?;
        Ok(parse_sessions(&data))
    }

    /// Send one four-letter command and read the whole reply.
    async fn send_command(&self, command: &str) -> StatsResult<String> {
        debug!(command, "Sending stats command");
        let mut stream = self
            .bounded(TcpStream::connect((self.host.as_str(), self.port)))
            .await??;
        self.bounded(stream.write_all(command.as_bytes())).await??;

        let mut reply = Vec::new();
        self.bounded(stream.read_to_end(&mut reply)).await??;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    async fn bounded<F>(&self, operation: F) -> StatsResult<F::Output>
    where
        F: std::future::Future,
    {
        timeout(self.timeout, operation)
            .await
            .map_err(|_| StatsError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })
    }
}
