//! Fluent pipelining surface over a [`Session`].
//!
//! ```no_run
//! use redisio::{cmd, Client};
//!
//! # fn main() -> redisio::Result<()> {
//! let mut client = Client::tcp("127.0.0.1", 6379);
//! client.send(cmd!("SET", "x", 4))?.send(cmd!("GET", "x"))?;
//! for reply in client.replies() {
//!     println!("{}", reply?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::{Config, Endpoint};
use crate::error::{Error, Result};
use crate::protocol::{Arg, Command, Reply};
use crate::session::Session;
use crate::transport::Connector;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::path::PathBuf;
use tracing::{debug, warn};

/// A pipelining Redis client.
///
/// Commands are queued with [`send`](Client::send) and their replies pulled
/// later, in order, with [`next_reply`](Client::next_reply) or
/// [`replies`](Client::replies). [`call`](Client::call) and the named
/// convenience methods send one command and return its reply directly.
pub struct Client {
    session: Session,
    max_pending: usize,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(&config),
            max_pending: config.client.max_pending,
        }
    }

    /// Create a client whose transports are opened by `connector`.
    pub fn with_connector(config: Config, connector: impl Connector + 'static) -> Self {
        Self {
            session: Session::with_connector(&config, connector),
            max_pending: config.client.max_pending,
        }
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(Config::tcp(host, port))
    }

    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::new(Config::unix(path))
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.session.endpoint()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Replies owed for commands already sent.
    pub fn pending(&self) -> usize {
        self.session.pending()
    }

    /// Queue one command. Returns the client so sends can be chained.
    pub fn send(&mut self, command: impl Into<Command>) -> Result<&mut Self> {
        self.send_batch([command.into()])
    }

    /// Queue several commands in one write. An empty batch is a no-op.
    pub fn send_batch<I>(&mut self, batch: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        let commands: Vec<Command> = batch.into_iter().map(Into::into).collect();
        if !commands.is_empty() {
            let sent = self.session.send_batch(&commands)?;
            debug!("Queued {} commands, {} pending", sent, self.pending());
        }
        Ok(self)
    }

    /// Decode the next reply in FIFO order. Blocks until it arrives.
    pub fn next_reply(&mut self) -> Result<Reply> {
        self.session.read_reply()
    }

    /// Iterate over every reply currently owed.
    ///
    /// The count is fixed when the iterator is created. A server error is
    /// yielded in place of its reply and iteration continues; any other
    /// error ends the iteration.
    pub fn replies(&mut self) -> Replies<'_> {
        let remaining = self.pending();
        Replies {
            client: self,
            remaining,
        }
    }

    /// Collect every reply currently owed. Stops at the first error, leaving
    /// later replies pending.
    pub fn drain(&mut self) -> Result<Vec<Reply>> {
        self.replies().collect()
    }

    /// Drain every owed reply and return the one at `index`. Negative
    /// indexes count from the end.
    pub fn reply_at(&mut self, index: isize) -> Result<Option<Reply>> {
        let mut replies = self.drain()?;
        let len = replies.len() as isize;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return Ok(None);
        }
        Ok(Some(replies.swap_remove(index as usize)))
    }

    /// Drain every owed reply and return the slice selected by `range`.
    /// Negative bounds count from the end; out of range bounds are clamped.
    pub fn replies_in<R: RangeBounds<isize>>(&mut self, range: R) -> Result<Vec<Reply>> {
        let replies = self.drain()?;
        let len = replies.len() as isize;
        let absolute = |i: isize| if i < 0 { len + i } else { i };

        let start = match range.start_bound() {
            Bound::Included(&i) => absolute(i),
            Bound::Excluded(&i) => absolute(i).saturating_add(1),
            Bound::Unbounded => 0,
        }
        .clamp(0, len);
        let end = match range.end_bound() {
            Bound::Included(&i) => absolute(i).saturating_add(1),
            Bound::Excluded(&i) => absolute(i),
            Bound::Unbounded => len,
        }
        .clamp(0, len);

        if start >= end {
            return Ok(Vec::new());
        }
        Ok(replies
            .into_iter()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect())
    }

    /// Send `name args...` and return its reply.
    ///
    /// Replies still owed for earlier commands arrive first and are
    /// discarded, including earlier server errors. If more than `max_pending`
    /// replies are owed the connection is dropped before sending instead,
    /// losing those replies; drain explicitly when pipelining heavily.
    pub fn call<I, T>(&mut self, name: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        if self.pending() > self.max_pending {
            warn!(
                "{} replies pending on {}, dropping connection before {}",
                self.pending(),
                self.endpoint(),
                name
            );
            self.session.close();
        }

        let command = Command::new(name.to_ascii_uppercase()).args(args);
        if self.session.send_batch([&command])? == 0 {
            return Err(Error::InvalidCommand(format!(
                "nothing to send: every argument of {:?} was empty",
                name
            )));
        }
        self.last_reply()
    }

    fn last_reply(&mut self) -> Result<Reply> {
        loop {
            let owed = self.pending();
            let reply = self.session.read_reply();
            if owed <= 1 {
                return reply;
            }
            match reply {
                Ok(_) | Err(Error::Server(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the connection, discarding owed replies. The next command
    /// reconnects.
    pub fn close(&mut self) -> &mut Self {
        self.session.close();
        self
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redisio::Client({})", self.endpoint())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", self.endpoint())
            .field("connected", &self.is_connected())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Iterator over owed replies, see [`Client::replies`].
pub struct Replies<'a> {
    client: &'a mut Client,
    remaining: usize,
}

impl Iterator for Replies<'_> {
    type Item = Result<Reply>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let reply = self.client.next_reply();
        if matches!(&reply, Err(e) if !e.is_server()) {
            self.remaining = 0;
        }
        Some(reply)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
