//! Byte-stream transports and the connector that opens them.

use crate::config::Endpoint;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A connected, blocking byte stream to the server.
pub trait Transport: Read + Write + Send {
    /// Close both directions. Dropping the transport closes it as well.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn shutdown(&mut self) -> io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both)
    }
}

/// Opens transports for a session. Called on first use and after every
/// connection failure.
pub trait Connector: Send {
    fn connect(&self, endpoint: &Endpoint) -> io::Result<Box<dyn Transport>>;
}

/// Opens real TCP or unix-domain sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketConnector;

impl Connector for SocketConnector {
    fn connect(&self, endpoint: &Endpoint) -> io::Result<Box<dyn Transport>> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => {
                let stream = std::os::unix::net::UnixStream::connect(path)?;
                Ok(Box::new(stream))
            }
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            )),
        }
    }
}

/// Endpoint kind as a metrics label.
pub(crate) fn transport_label(endpoint: &Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Tcp { .. } => "tcp",
        Endpoint::Unix { .. } => "unix",
    }
}
