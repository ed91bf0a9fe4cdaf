use anyhow::{bail, Context, Result};
use powledger_core::{LedgerService, Request, Response};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

/// Sends one request and waits for exactly one response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn exchange(&mut self, request: &Request) -> Result<Response>;
}

/// Newline-delimited records over a single TCP connection.
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {addr}"))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }
}

impl Transport for TcpTransport {
    async fn exchange(&mut self, request: &Request) -> Result<Response> {
        let mut line = request.encode()?;
        debug!(%line, "sending request");
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply).await? == 0 {
            bail!("node closed the connection");
        }
        debug!(line = reply.trim_end(), "received response");
        Ok(Response::decode(reply.trim_end())?)
    }
}

/// Runs requests against a ledger owned by this process.
pub struct LocalTransport {
    service: LedgerService,
}

impl LocalTransport {
    pub fn new(service: LedgerService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &LedgerService {
        &self.service
    }
}

impl Transport for LocalTransport {
    async fn exchange(&mut self, request: &Request) -> Result<Response> {
        // same encode/decode round trip the network path takes
        let request = Request::decode(&request.encode()?)?;
        let response = self.service.handle(&request);
        Ok(Response::decode(&response.encode()?)?)
    }
}
