use bytes::Bytes;
use std::fmt;

/// A decoded RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    SimpleString(String),         // +
    Error(String),                // -
    Integer(i64),                 // :
    BulkString(Option<Bytes>),    // $ (None = null bulk)
    Array(Option<Vec<Reply>>),    // * (None = null array)
}

impl Reply {
    /// Build a non-null bulk string reply.
    pub fn bulk(data: impl AsRef<[u8]>) -> Self {
        Reply::BulkString(Some(Bytes::copy_from_slice(data.as_ref())))
    }

    pub fn simple(s: impl Into<String>) -> Self {
        Reply::SimpleString(s.into())
    }

    /// Build an array of bulk strings, the shape most multi-value replies take.
    pub fn bulk_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Reply::Array(Some(items.into_iter().map(Reply::bulk).collect()))
    }

    /// Serialize this value to RESP wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Reply::SimpleString(s) => out.extend_from_slice(format!("+{}\r\n", s).as_bytes()),
            Reply::Error(e) => out.extend_from_slice(format!("-{}\r\n", e).as_bytes()),
            Reply::Integer(i) => out.extend_from_slice(format!(":{}\r\n", i).as_bytes()),
            Reply::BulkString(Some(data)) => {
                out.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
                out.extend_from_slice(data);
                out.extend_from_slice(b"\r\n");
            }
            Reply::BulkString(None) => out.extend_from_slice(b"$-1\r\n"),
            Reply::Array(Some(items)) => {
                out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.write_to(out);
                }
            }
            Reply::Array(None) => out.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Text view of a simple or bulk string. `None` for other kinds, null
    /// bulks, and bulks that are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::SimpleString(s) => Some(s),
            Reply::BulkString(Some(data)) => std::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::SimpleString(s) => Some(s.as_bytes()),
            Reply::BulkString(Some(data)) => Some(data),
            _ => None,
        }
    }

    /// Integer value. Bulk strings holding a decimal number also convert,
    /// since many commands return numbers that way.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Integer(i) => Some(*i),
            Reply::BulkString(Some(_)) => self.as_str().and_then(|s| s.parse().ok()),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(Some(items)) => Some(items),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::BulkString(None) | Reply::Array(None))
    }

    /// True for the `+OK` status reply.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::SimpleString(s) if s == "OK")
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::SimpleString(s) => write!(f, "{}", s),
            Reply::Error(e) => write!(f, "(error) {}", e),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::BulkString(Some(data)) => write!(f, "\"{}\"", data.escape_ascii()),
            Reply::BulkString(None) | Reply::Array(None) => write!(f, "(nil)"),
            Reply::Array(Some(items)) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(Some(items)) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write!(f, "{:indent$}", "", indent = indent)?;
                    }
                    write!(f, "{:>width$}) ", i + 1, width = width)?;
                    item.fmt_indented(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

/// Renders the way `redis-cli` prints replies.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
