//! Streaming reply decoder.
//!
//! Recursive descent on the lead byte of each line. Every read goes through
//! the [`ReplyBuffer`], which blocks on the source until the bytes are there,
//! so a decode never yields a partial bulk string or a partially filled array.

use super::Reply;
use crate::buffer::ReplyBuffer;
use crate::counter::PendingReplies;
use crate::error::{Error, Result};
use std::io::Read;

/// Arrays nested deeper than this are rejected as malformed.
pub const MAX_DEPTH: usize = 128;

/// Decode exactly one reply, updating the pending count as it goes.
///
/// A top-level `-` reply comes back as `Reply::Error`; the session turns it
/// into [`Error::Server`].
pub fn decode_reply<R: Read + ?Sized>(
    buffer: &mut ReplyBuffer,
    source: &mut R,
    pending: &mut PendingReplies,
) -> Result<Reply> {
    decode_at(buffer, source, pending, 0)
}

fn decode_at<R: Read + ?Sized>(
    buffer: &mut ReplyBuffer,
    source: &mut R,
    pending: &mut PendingReplies,
    depth: usize,
) -> Result<Reply> {
    let line = buffer.read_line(source)?;
    pending.complete();

    let (&type_byte, body) = line
        .split_first()
        .ok_or_else(|| Error::Protocol("empty reply line".to_string()))?;

    tracing::trace!("Decoding reply header {:?}", type_byte as char);

    match type_byte {
        b'+' => Ok(Reply::SimpleString(utf8(body, "simple string")?)),
        b'-' => Ok(Reply::Error(String::from_utf8_lossy(body).into_owned())),
        b':' => Ok(Reply::Integer(parse_int(body, "integer")?)),
        b'$' => match parse_length(body, "bulk string length")? {
            None => Ok(Reply::BulkString(None)),
            Some(len) => Ok(Reply::BulkString(Some(buffer.read_payload(source, len)?))),
        },
        b'*' => match parse_length(body, "array length")? {
            None => Ok(Reply::Array(None)),
            Some(_) if depth >= MAX_DEPTH => Err(Error::Protocol(format!(
                "arrays nested deeper than {}",
                MAX_DEPTH
            ))),
            Some(len) => {
                pending.expand(len)?;
                // A bogus header must not drive a huge allocation up front.
                let mut elements = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    elements.push(decode_at(buffer, source, pending, depth + 1)?);
                }
                Ok(Reply::Array(Some(elements)))
            }
        },
        other => Err(Error::Protocol(format!(
            "unrecognized reply header: {:?}",
            other as char
        ))),
    }
}

fn utf8(body: &[u8], what: &str) -> Result<String> {
    String::from_utf8(body.to_vec())
        .map_err(|_| Error::Protocol(format!("invalid UTF-8 in {}", what)))
}

fn parse_int(body: &[u8], what: &str) -> Result<i64> {
    std::str::from_utf8(body)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Error::Protocol(format!(
                "invalid {}: {:?}",
                what,
                String::from_utf8_lossy(body)
            ))
        })
}

/// `-1` is the null marker; any other negative length is malformed.
fn parse_length(body: &[u8], what: &str) -> Result<Option<usize>> {
    match parse_int(body, what)? {
        -1 => Ok(None),
        n if n < 0 => Err(Error::Protocol(format!("invalid {}: {}", what, n))),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| Error::Protocol(format!("invalid {}: {}", what, n))),
    }
}
