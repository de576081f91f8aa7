//! Client-side request encoding.
//!
//! Commands are encoded as RESP arrays of bulk strings and concatenated into a
//! single payload so a whole batch goes out in one write.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// One command argument, already rendered to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg(Bytes);

impl Arg {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg(Bytes::from(s))
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::from(s.as_str())
    }
}

impl From<&[u8]> for Arg {
    fn from(b: &[u8]) -> Self {
        Arg(Bytes::copy_from_slice(b))
    }
}

impl<const N: usize> From<&[u8; N]> for Arg {
    fn from(b: &[u8; N]) -> Self {
        Arg(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Self {
        Arg(Bytes::from(b))
    }
}

impl From<Bytes> for Arg {
    fn from(b: Bytes) -> Self {
        Arg(b)
    }
}

/// `None` renders as the empty argument, which the lenient filter drops.
impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Arg(Bytes::new()))
    }
}

macro_rules! impl_display_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg(Bytes::from(v.to_string()))
                }
            }
        )*
    };
}

impl_display_arg!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// How empty arguments are treated at encode time.
///
/// `Lenient` drops them before the argument count is computed, so
/// `HSET k "" v` goes out as `HSET k v`. This silently changes the meaning of
/// commands where an empty string is a legitimate argument; use `Strict` to
/// send every argument as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgFilter {
    #[default]
    Lenient,
    Strict,
}

impl ArgFilter {
    fn keeps(self, arg: &Arg) -> bool {
        match self {
            ArgFilter::Lenient => !arg.is_empty(),
            ArgFilter::Strict => true,
        }
    }
}

/// An ordered list of arguments, the first being the command name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    args: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<Arg>) -> Self {
        Self {
            args: vec![name.into()],
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append every argument from an iterator.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, arg: impl Into<Arg>) {
        self.args.push(arg.into());
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.args.first().map(Arg::as_bytes)
    }

    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Append the wire form of this command to `buf`.
    ///
    /// Returns false, writing nothing, when no argument survives the filter.
    pub fn encode_into(&self, buf: &mut BytesMut, filter: ArgFilter) -> bool {
        let count = self.args.iter().filter(|a| filter.keeps(a)).count();
        if count == 0 {
            return false;
        }

        put_header(buf, b'*', count);
        for arg in self.args.iter().filter(|a| filter.keeps(a)) {
            put_header(buf, b'$', arg.0.len());
            buf.put_slice(&arg.0);
            buf.put_slice(b"\r\n");
        }
        true
    }

    /// Wire form of this command alone.
    pub fn to_bytes(&self, filter: ArgFilter) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf, filter);
        buf.freeze()
    }
}

fn put_header(buf: &mut BytesMut, prefix: u8, n: usize) {
    buf.put_u8(prefix);
    buf.put_slice(n.to_string().as_bytes());
    buf.put_slice(b"\r\n");
}

impl<T: Into<Arg>> FromIterator<T> for Command {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Command {
    fn from(args: [T; N]) -> Self {
        args.into_iter().collect()
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Command {
    fn from(args: Vec<T>) -> Self {
        args.into_iter().collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", arg.0.escape_ascii())?;
        }
        Ok(())
    }
}

/// An encoded batch ready to be written.
#[derive(Debug)]
pub struct Encoded {
    pub payload: Bytes,
    /// Commands that produced bytes; each one owes exactly one reply.
    pub commands: usize,
}

/// Encode a batch into one contiguous payload, in submission order.
///
/// Commands whose arguments are all filtered out are skipped and not counted.
pub fn encode<'a, I>(batch: I, filter: ArgFilter) -> Encoded
where
    I: IntoIterator<Item = &'a Command>,
{
    let mut buf = BytesMut::new();
    let mut commands = 0;
    for command in batch {
        if command.encode_into(&mut buf, filter) {
            commands += 1;
        }
    }
    Encoded {
        payload: buf.freeze(),
        commands,
    }
}

/// Build a [`Command`] from heterogeneous arguments.
///
/// ```
/// use redisio::cmd;
///
/// let command = cmd!("ZRANGE", "z", 0, -1, "WITHSCORES");
/// assert_eq!(command.len(), 5);
/// ```
#[macro_export]
macro_rules! cmd {
    ($name:expr $(, $arg:expr)* $(,)?) => {
        $crate::protocol::Command::new($name)$(.arg($arg))*
    };
}
