//! Pipelined mass insertion from text command lines.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::protocol::{parse_line, Command};
use std::fmt;
use std::io::BufRead;
use tracing::{debug, warn};

/// Outcome of a [`mass_insert`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    /// Commands written to the server.
    pub commands: usize,
    /// Replies read back, errors included.
    pub replies: usize,
    /// Replies that were server errors.
    pub errors: usize,
    /// Lines that could not be parsed and were not sent.
    pub invalid_lines: usize,
}

impl fmt::Display for InsertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "commands: {}, replies: {}, errors: {}, invalid lines: {}",
            self.commands, self.replies, self.errors, self.invalid_lines
        )
    }
}

/// Read command lines from `input` and pipeline them in batches of
/// `batch_size`, draining each batch's replies before sending the next.
///
/// Server errors are counted and logged, not fatal. Replies owed before the
/// call are read and discarded first so the counts only cover `input`.
pub fn mass_insert<R: BufRead>(
    client: &mut Client,
    input: R,
    batch_size: usize,
) -> Result<InsertSummary> {
    let batch_size = batch_size.max(1);
    let mut summary = InsertSummary::default();
    let mut batch = Vec::with_capacity(batch_size);

    for reply in client.replies() {
        if let Err(e) = reply {
            if !e.is_server() {
                return Err(e);
            }
        }
    }

    for (number, line) in input.lines().enumerate() {
        let line = line.map_err(Error::Io)?;
        match parse_line(&line) {
            Ok(Some(command)) => batch.push(command),
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping line {}: {}", number + 1, e);
                summary.invalid_lines += 1;
            }
        }

        if batch.len() >= batch_size {
            flush(client, &mut batch, &mut summary)?;
        }
    }
    flush(client, &mut batch, &mut summary)?;

    debug!("Mass insertion finished: {}", summary);
    Ok(summary)
}

fn flush(
    client: &mut Client,
    batch: &mut Vec<Command>,
    summary: &mut InsertSummary,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }

    client.send_batch(batch.drain(..))?;
    let sent = client.pending();
    let first = summary.commands;
    summary.commands += sent;

    for (i, reply) in client.replies().enumerate() {
        summary.replies += 1;
        match reply {
            Ok(_) => {}
            Err(Error::Server(message)) => {
                summary.errors += 1;
                warn!("Command {} failed: {}", first + i + 1, message);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::mock::{Script, ScriptedConnector};
    use std::io::Cursor;

    #[test]
    fn test_batches_and_counts() {
        let connector = ScriptedConnector::new(vec![Script::replies(
            b"+OK\r\n+OK\r\n-ERR wrong type\r\n:1\r\n",
        )]);
        let mut client = Client::with_connector(Config::default(), connector.clone());
        let input = "SET a 1\n\n# comment\nSET b \"two words\"\nBAD \"unclosed\nLPUSH a x\nINCR n\n";

        let summary = mass_insert(&mut client, Cursor::new(input), 2).unwrap();
        assert_eq!(
            summary,
            InsertSummary {
                commands: 4,
                replies: 4,
                errors: 1,
                invalid_lines: 1,
            }
        );
        assert_eq!(client.pending(), 0);

        let written = connector.written(0);
        let expected = b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n\
*3\r\n$3\r\nSET\r\n$1\r\nb\r\n$9\r\ntwo words\r\n\
*3\r\n$5\r\nLPUSH\r\n$1\r\na\r\n$1\r\nx\r\n\
*2\r\n$4\r\nINCR\r\n$1\r\nn\r\n";
        assert_eq!(written, expected.to_vec());
    }

    #[test]
    fn test_empty_input_sends_nothing() {
        let connector = ScriptedConnector::new(vec![]);
        let mut client = Client::with_connector(Config::default(), connector.clone());

        let summary = mass_insert(&mut client, Cursor::new(""), 100).unwrap();
        assert_eq!(summary, InsertSummary::default());
        assert_eq!(connector.connections(), 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = InsertSummary {
            commands: 3,
            replies: 3,
            errors: 1,
            invalid_lines: 0,
        };
        assert_eq!(
            summary.to_string(),
            "commands: 3, replies: 3, errors: 1, invalid lines: 0"
        );
    }
}
