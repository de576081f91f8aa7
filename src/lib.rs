pub mod buffer;
pub mod bulk;
pub mod cli;
pub mod client;
mod commands;
pub mod config;
pub mod counter;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use bulk::{mass_insert, InsertSummary};
pub use client::{Client, Replies};
pub use config::{Config, Endpoint};
pub use error::{Error, Result};
pub use protocol::{Arg, ArgFilter, Command, Reply};
pub use session::Session;
pub use transport::{Connector, SocketConnector, Transport};
