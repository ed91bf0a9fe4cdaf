use anyhow::{bail, Context, Result};
use powledger_core::{LedgerService, Operation, Request};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Longest request line accepted, newline included.
pub const MAX_RECORD_BYTES: usize = 1 << 20;

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Listening socket plus the ledger it serves.
///
/// Connections are handled strictly in sequence: the next client is accepted
/// only after the current one hangs up, and the ledger carries over between
/// them.
pub struct Server {
    listener: TcpListener,
    service: LedgerService,
}

impl Server {
    pub async fn bind(addr: SocketAddr, service: LedgerService) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve clients until the task is dropped.
    ///
    /// Chain operations run through `block_in_place`, so this must be driven
    /// by the multi-threaded runtime.
    pub async fn run(mut self) -> Result<()> {
        info!(addr = %self.local_addr()?, "ledger node listening");
        let mut backoff = None;
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => {
                    backoff = None;
                    conn
                }
                Err(e) => {
                    let delay = next_backoff(backoff);
                    backoff = Some(delay);
                    error!(error = %e, ?delay, "failed to accept connection");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };
            info!(%peer, "client connected");
            match serve_connection(&mut self.service, stream).await {
                Ok(()) => info!(%peer, "client disconnected"),
                Err(e) => warn!(%peer, error = %e, "connection dropped"),
            }
        }
    }
}

/// Delay before retrying a failed accept: doubles per consecutive failure.
fn next_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => ACCEPT_BACKOFF_MIN,
        Some(delay) => (delay * 2).min(ACCEPT_BACKOFF_MAX),
    }
}

/// Read newline-delimited requests until the peer hangs up, sends an
/// undecodable or oversized line, or asks to disconnect.
async fn serve_connection(service: &mut LedgerService, mut stream: TcpStream) -> Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_RECORD_BYTES as u64 + 1)
            .read_line(&mut line)
            .await?;
        if read == 0 {
            break;
        }
        if read > MAX_RECORD_BYTES {
            bail!("request exceeds {MAX_RECORD_BYTES} bytes");
        }
        let record = line.trim_end();
        if record.trim().is_empty() {
            continue;
        }
        debug!(line = %record, "request");
        let request = Request::decode(record)?;
        let response = tokio::task::block_in_place(|| service.handle(&request));

        let mut reply = response.encode()?;
        debug!(line = %reply, "response");
        reply.push('\n');
        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;

        if matches!(request.operation(), Ok(Operation::Disconnect)) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_backoff_doubles_up_to_the_cap() {
        let mut delay = None;
        let mut seen = Vec::new();
        for _ in 0..10 {
            let next = next_backoff(delay);
            seen.push(next);
            delay = Some(next);
        }
        assert_eq!(seen[0], ACCEPT_BACKOFF_MIN);
        assert_eq!(seen[1], ACCEPT_BACKOFF_MIN * 2);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), ACCEPT_BACKOFF_MAX);
    }
}
