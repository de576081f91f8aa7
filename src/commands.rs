//! Named wrappers around [`Client::call`] for common commands.
//!
//! Each one sends a single command and returns its reply, discarding any
//! replies still owed for earlier pipelined commands. Anything not listed
//! here is reachable through [`Client::call`] directly.

use crate::client::Client;
use crate::error::Result;
use crate::protocol::{Arg, Reply};

const NO_ARGS: [Arg; 0] = [];

impl Client {
    pub fn ping(&mut self) -> Result<Reply> {
        self.call("PING", NO_ARGS)
    }

    pub fn echo(&mut self, message: impl Into<Arg>) -> Result<Reply> {
        self.call("ECHO", [message.into()])
    }

    pub fn get(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("GET", [key.into()])
    }

    pub fn set(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<Reply> {
        self.call("SET", [key.into(), value.into()])
    }

    /// `SET key value EX seconds`
    pub fn set_ex(
        &mut self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
        seconds: u64,
    ) -> Result<Reply> {
        self.call("SET", [key.into(), value.into(), "EX".into(), seconds.into()])
    }

    pub fn del<I, K>(&mut self, keys: I) -> Result<Reply>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.call("DEL", keys)
    }

    pub fn exists<I, K>(&mut self, keys: I) -> Result<Reply>
    where
        I: IntoIterator<Item = K>,
        K: Into<Arg>,
    {
        self.call("EXISTS", keys)
    }

    pub fn strlen(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("STRLEN", [key.into()])
    }

    pub fn incr(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("INCR", [key.into()])
    }

    pub fn incrby(&mut self, key: impl Into<Arg>, by: i64) -> Result<Reply> {
        self.call("INCRBY", [key.into(), by.into()])
    }

    pub fn decr(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("DECR", [key.into()])
    }

    pub fn expire(&mut self, key: impl Into<Arg>, seconds: u64) -> Result<Reply> {
        self.call("EXPIRE", [key.into(), seconds.into()])
    }

    pub fn ttl(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("TTL", [key.into()])
    }

    pub fn hset(
        &mut self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        value: impl Into<Arg>,
    ) -> Result<Reply> {
        self.call("HSET", [key.into(), field.into(), value.into()])
    }

    pub fn hget(&mut self, key: impl Into<Arg>, field: impl Into<Arg>) -> Result<Reply> {
        self.call("HGET", [key.into(), field.into()])
    }

    /// `HMSET key field value [field value ...]`
    pub fn hmset<I, F, V>(&mut self, key: impl Into<Arg>, pairs: I) -> Result<Reply>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Arg>,
        V: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into())
            .chain(pairs.into_iter().flat_map(|(f, v)| -> [Arg; 2] { [f.into(), v.into()] }));
        self.call("HMSET", args)
    }

    pub fn hgetall(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("HGETALL", [key.into()])
    }

    pub fn hdel<I, F>(&mut self, key: impl Into<Arg>, fields: I) -> Result<Reply>
    where
        I: IntoIterator<Item = F>,
        F: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into()).chain(fields.into_iter().map(Into::<Arg>::into));
        self.call("HDEL", args)
    }

    pub fn lpush<I, V>(&mut self, key: impl Into<Arg>, values: I) -> Result<Reply>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into()).chain(values.into_iter().map(Into::<Arg>::into));
        self.call("LPUSH", args)
    }

    pub fn rpush<I, V>(&mut self, key: impl Into<Arg>, values: I) -> Result<Reply>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into()).chain(values.into_iter().map(Into::<Arg>::into));
        self.call("RPUSH", args)
    }

    pub fn lrange(&mut self, key: impl Into<Arg>, start: i64, stop: i64) -> Result<Reply> {
        self.call("LRANGE", [key.into(), start.into(), stop.into()])
    }

    pub fn sadd<I, M>(&mut self, key: impl Into<Arg>, members: I) -> Result<Reply>
    where
        I: IntoIterator<Item = M>,
        M: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into()).chain(members.into_iter().map(Into::<Arg>::into));
        self.call("SADD", args)
    }

    pub fn smembers(&mut self, key: impl Into<Arg>) -> Result<Reply> {
        self.call("SMEMBERS", [key.into()])
    }

    /// `ZADD key score member [score member ...]`
    pub fn zadd<I, S, M>(&mut self, key: impl Into<Arg>, members: I) -> Result<Reply>
    where
        I: IntoIterator<Item = (S, M)>,
        S: Into<Arg>,
        M: Into<Arg>,
    {
        let args = std::iter::once::<Arg>(key.into())
            .chain(members.into_iter().flat_map(|(s, m)| -> [Arg; 2] { [s.into(), m.into()] }));
        self.call("ZADD", args)
    }

    /// `ZRANGE key start stop [WITHSCORES]`. With scores the reply is one
    /// flat array alternating members and scores.
    pub fn zrange(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
        with_scores: bool,
    ) -> Result<Reply> {
        let mut args: Vec<Arg> = vec![key.into(), start.into(), stop.into()];
        if with_scores {
            args.push("WITHSCORES".into());
        }
        self.call("ZRANGE", args)
    }

    pub fn dbsize(&mut self) -> Result<Reply> {
        self.call("DBSIZE", NO_ARGS)
    }

    pub fn flushdb(&mut self) -> Result<Reply> {
        self.call("FLUSHDB", NO_ARGS)
    }

    pub fn flushall(&mut self) -> Result<Reply> {
        self.call("FLUSHALL", NO_ARGS)
    }

    /// Switch database on the current connection only. A reconnect selects the
    /// configured database again.
    pub fn select(&mut self, db: u32) -> Result<Reply> {
        self.call("SELECT", [db])
    }

    /// Put the connection in monitor mode. Each event that follows is read
    /// with [`Client::next_reply`]; close the client to leave the mode.
    pub fn monitor(&mut self) -> Result<Reply> {
        self.call("MONITOR", NO_ARGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::mock::{Script, ScriptedConnector};

    #[test]
    fn test_zrange_only_adds_withscores_when_asked() {
        let connector = ScriptedConnector::new(vec![Script::replies(b"*0\r\n*0\r\n")]);
        let config = Config::default().with_strict_args(true);
        let mut client = Client::with_connector(config, connector.clone());

        client.zrange("z", 0, -1, false).unwrap();
        client.zrange("z", 0, -1, true).unwrap();

        let written = connector.written(0);
        let expected = b"*4\r\n$6\r\nZRANGE\r\n$1\r\nz\r\n$1\r\n0\r\n$2\r\n-1\r\n\
*5\r\n$6\r\nZRANGE\r\n$1\r\nz\r\n$1\r\n0\r\n$2\r\n-1\r\n$10\r\nWITHSCORES\r\n";
        assert_eq!(written, expected.to_vec());
    }

    #[test]
    fn test_monitor_events_follow_with_next_reply() {
        let connector = ScriptedConnector::new(vec![Script::replies(
            b"+OK\r\n+1700000000.000000 [0 127.0.0.1:50000] \"PING\"\r\n",
        )]);
        let mut client = Client::with_connector(Config::default(), connector);

        assert!(client.monitor().unwrap().is_ok());
        let event = client.next_reply().unwrap();
        assert!(event.as_str().unwrap().ends_with("\"PING\""));
        assert_eq!(client.pending(), 0);
    }
}
