//! Redis Serialization Protocol (RESP2) client codec.

pub mod command;
pub mod decoder;
pub mod inline;
pub mod reply;

pub use command::{encode, Arg, ArgFilter, Command, Encoded};
pub use decoder::decode_reply;
pub use inline::parse_line;
pub use reply::Reply;
