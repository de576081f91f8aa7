//! Connection lifecycle: lazy connect, handshake, retry-once sends.

use crate::buffer::ReplyBuffer;
use crate::config::{Config, Endpoint};
use crate::counter::PendingReplies;
use crate::error::{Error, Result};
use crate::metrics::{Metrics, Timer};
use crate::protocol::{decode_reply, encode, ArgFilter, Command, Reply};
use crate::transport::{transport_label, Connector, SocketConnector, Transport};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Owns one server connection and the state tied to it.
///
/// The transport is opened on first use and dropped on any failure; the next
/// operation reopens it and replays the handshake. The receive buffer and the
/// pending count belong to the current transport and are cleared with it.
pub struct Session {
    endpoint: Endpoint,
    db: u32,
    password: Option<String>,
    filter: ArgFilter,
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    buffer: ReplyBuffer,
    pending: PendingReplies,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self::with_connector(config, SocketConnector)
    }

    /// Create a session that opens its transports through `connector`.
    pub fn with_connector(config: &Config, connector: impl Connector + 'static) -> Self {
        Self {
            endpoint: config.connection.endpoint(),
            db: config.connection.db,
            password: config
                .connection
                .password
                .clone()
                .filter(|p| !p.is_empty()),
            filter: config.client.arg_filter(),
            connector: Box::new(connector),
            transport: None,
            buffer: ReplyBuffer::new(config.client.read_chunk_size),
            pending: PendingReplies::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Replies owed for commands already sent.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    pub fn arg_filter(&self) -> ArgFilter {
        self.filter
    }

    /// Open the transport if there is none, then run AUTH and SELECT.
    pub fn ensure_connected(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }

        let transport = self
            .connector
            .connect(&self.endpoint)
            .map_err(Error::Connection)?;
        debug!("Connected to {}", self.endpoint);
        Metrics::get().record_connect(transport_label(&self.endpoint));

        self.transport = Some(transport);
        self.buffer.clear();
        self.pending.reset();

        if let Err(e) = self.handshake() {
            self.close();
            return Err(e);
        }
        Ok(())
    }

    fn handshake(&mut self) -> Result<()> {
        if let Some(password) = self.password.clone() {
            self.round_trip("AUTH", Command::new("AUTH").arg(password))?;
            debug!("Authenticated with {}", self.endpoint);
        }
        if self.db != 0 {
            self.round_trip("SELECT", Command::new("SELECT").arg(self.db))?;
            debug!("Selected database {}", self.db);
        }
        Ok(())
    }

    /// Write one command on the current transport and wait for its reply.
    /// No retry: this runs inside connection setup.
    fn round_trip(&mut self, name: &'static str, command: Command) -> Result<Reply> {
        let failed = |reason: String| Error::Handshake {
            command: name,
            reason,
        };

        self.write_payload(&command.to_bytes(self.filter))
            .map_err(|e| failed(e.to_string()))?;
        self.pending.add(1);
        self.read_reply().map_err(|e| failed(e.to_string()))
    }

    fn write_payload(&mut self, payload: &[u8]) -> io::Result<()> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))?;
        transport.write_all(payload)?;
        transport.flush()
    }

    fn try_send(&mut self, payload: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.write_payload(payload).map_err(Error::Connection)
    }

    /// Write a payload, reconnecting and replaying it once on failure.
    ///
    /// A reconnect discards replies still owed on the old connection.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if let Err(first) = self.try_send(payload) {
            warn!("Send to {} failed, reconnecting: {}", self.endpoint, first);
            Metrics::get().record_retry();
            self.close();

            if let Err(second) = self.try_send(payload) {
                self.close();
                Metrics::get().record_error(&second);
                return Err(second);
            }
        }
        Ok(())
    }

    /// Encode and send a batch. Returns the number of replies now owed for it.
    ///
    /// A batch that encodes to nothing is not sent and does not connect.
    pub fn send_batch<'a, I>(&mut self, batch: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Command>,
    {
        let encoded = encode(batch, self.filter);
        if encoded.commands == 0 {
            return Ok(0);
        }

        let timer = Timer::new();
        self.send(&encoded.payload)?;
        self.pending.add(encoded.commands);

        Metrics::get().record_send(encoded.commands, encoded.payload.len(), timer.elapsed_seconds());
        Ok(encoded.commands)
    }

    /// Decode the next reply. Blocks until it has fully arrived.
    ///
    /// A `-` reply becomes [`Error::Server`] and leaves the connection usable.
    /// Read and protocol failures drop the connection: the stream position is
    /// unknown afterwards. They are never retried.
    pub fn read_reply(&mut self) -> Result<Reply> {
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return Err(Error::ConnectionClosed),
        };

        match decode_reply(&mut self.buffer, transport, &mut self.pending) {
            Ok(Reply::Error(message)) => {
                let err = Error::Server(message);
                Metrics::get().record_error(&err);
                Err(err)
            }
            Ok(reply) => {
                Metrics::get().record_reply();
                Ok(reply)
            }
            Err(e) => {
                warn!("Dropping connection to {}: {}", self.endpoint, e);
                Metrics::get().record_error(&e);
                self.close();
                Err(e)
            }
        }
    }

    /// Close the transport. Safe to call when already closed.
    ///
    /// Replies still owed on the connection are discarded.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.shutdown() {
                debug!("Shutdown of {} failed: {}", self.endpoint, e);
            }
            debug!("Closed connection to {}", self.endpoint);
        }
        Metrics::get().record_dropped_replies(self.pending.get());
        self.pending.reset();
        self.buffer.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
