//! In-process RESP server for integration tests.
//!
//! Runs on its own tokio runtime thread and speaks just enough of the
//! Redis command set to exercise the client end to end.

#![allow(dead_code)]

use bytes::{Buf, BytesMut};
use dashmap::DashMap;
use redisio::Reply;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(Vec<(String, String)>),
    ZSet(Vec<(f64, String)>),
}

#[derive(Default)]
pub struct State {
    data: DashMap<String, Value>,
    password: Option<String>,
    connections: AtomicUsize,
    auths: AtomicUsize,
    selects: AtomicUsize,
    requests: Mutex<Vec<Vec<String>>>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<State>,
}

impl MockServer {
    pub fn start() -> Self {
        Self::start_with(None)
    }

    /// Start a server that rejects everything but AUTH until `password` is given.
    pub fn with_password(password: &str) -> Self {
        Self::start_with(Some(password.to_string()))
    }

    fn start_with(password: Option<String>) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State {
            password,
            ..Default::default()
        });

        let shared = Arc::clone(&state);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = TcpListener::from_std(listener).unwrap();
                loop {
                    let (socket, _) = match listener.accept().await {
                        Ok(accepted) => accepted,
                        Err(_) => break,
                    };
                    shared.connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(handle_connection(socket, Arc::clone(&shared)));
                }
            });
        });

        Self { addr, state }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn auth_count(&self) -> usize {
        self.state.auths.load(Ordering::SeqCst)
    }

    pub fn select_count(&self) -> usize {
        self.state.selects.load(Ordering::SeqCst)
    }

    /// Every request received so far, as strings, in arrival order.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle_connection(mut socket: TcpStream, state: Arc<State>) {
    let mut buffer = BytesMut::with_capacity(4096);
    let mut authed = state.password.is_none();

    loop {
        while let Some(request) = parse_request(&mut buffer) {
            state.requests.lock().unwrap().push(request.clone());
            let quit = request
                .first()
                .map(|name| name.eq_ignore_ascii_case("QUIT"))
                .unwrap_or(false);

            let reply = dispatch(&state, &mut authed, &request);
            if socket.write_all(&reply.to_bytes()).await.is_err() || quit {
                return;
            }
        }

        match socket.read_buf(&mut buffer).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// Pull one complete `*N $len arg ...` request off the front of `buffer`.
fn parse_request(buffer: &mut BytesMut) -> Option<Vec<String>> {
    let mut pos = 0;
    let header = read_line(buffer, &mut pos)?;
    let count: usize = header.strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(buffer, &mut pos)?.strip_prefix('$')?.parse().ok()?;
        if buffer.len() < pos + len + 2 {
            return None;
        }
        args.push(String::from_utf8_lossy(&buffer[pos..pos + len]).into_owned());
        pos += len + 2;
    }

    buffer.advance(pos);
    Some(args)
}

fn read_line(buffer: &[u8], pos: &mut usize) -> Option<String> {
    let rest = &buffer[*pos..];
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    let line = String::from_utf8_lossy(&rest[..end]).into_owned();
    *pos += end + 2;
    Some(line)
}

fn error(message: &str) -> Reply {
    Reply::Error(message.to_string())
}

fn wrong_args(name: &str) -> Reply {
    Reply::Error(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_ascii_lowercase()
    ))
}

fn wrong_type() -> Reply {
    error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{}", score)
    }
}

fn dispatch(state: &State, authed: &mut bool, args: &[String]) -> Reply {
    let Some((name, args)) = args.split_first() else {
        return error("ERR empty command");
    };
    let command = name.to_ascii_uppercase();

    if !*authed && command != "AUTH" {
        return error("NOAUTH Authentication required.");
    }

    match (command.as_str(), args) {
        ("PING", []) => Reply::simple("PONG"),
        ("PING", [message]) => Reply::bulk(message),
        ("ECHO", [message]) => Reply::bulk(message),

        ("AUTH", [password]) => {
            state.auths.fetch_add(1, Ordering::SeqCst);
            match &state.password {
                None => error("ERR Client sent AUTH, but no password is set"),
                Some(expected) if expected == password => {
                    *authed = true;
                    Reply::simple("OK")
                }
                Some(_) => error("WRONGPASS invalid username-password pair"),
            }
        }
        ("SELECT", [db]) => {
            state.selects.fetch_add(1, Ordering::SeqCst);
            match db.parse::<u32>() {
                Ok(_) => Reply::simple("OK"),
                Err(_) => error("ERR value is not an integer or out of range"),
            }
        }
        ("QUIT", []) => Reply::simple("OK"),
        ("FLUSHALL", []) | ("FLUSHDB", []) => {
            state.data.clear();
            Reply::simple("OK")
        }

        ("SET", [key, value]) => {
            state.data.insert(key.clone(), Value::Str(value.clone()));
            Reply::simple("OK")
        }
        ("GET", [key]) => match state.data.get(key).map(|v| v.value().clone()) {
            None => Reply::BulkString(None),
            Some(Value::Str(s)) => Reply::bulk(s),
            Some(_) => wrong_type(),
        },
        ("STRLEN", [key]) => match state.data.get(key).map(|v| v.value().clone()) {
            None => Reply::Integer(0),
            Some(Value::Str(s)) => Reply::Integer(s.len() as i64),
            Some(_) => wrong_type(),
        },
        ("DEL", keys) if !keys.is_empty() => {
            let removed = keys.iter().filter(|k| state.data.remove(*k).is_some()).count();
            Reply::Integer(removed as i64)
        }

        ("HSET", [key, field, value]) => {
            match hash_set(state, key, &[(field.clone(), value.clone())]) {
                Some(added) => Reply::Integer(added as i64),
                None => wrong_type(),
            }
        }
        ("HMSET", [key, rest @ ..]) if !rest.is_empty() && rest.len() % 2 == 0 => {
            let pairs: Vec<(String, String)> = rest
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            match hash_set(state, key, &pairs) {
                Some(_) => Reply::simple("OK"),
                None => wrong_type(),
            }
        }
        ("HGET", [key, field]) => match state.data.get(key).map(|v| v.value().clone()) {
            None => Reply::BulkString(None),
            Some(Value::Hash(fields)) => fields
                .iter()
                .find(|(f, _)| f == field)
                .map(|(_, v)| Reply::bulk(v))
                .unwrap_or(Reply::BulkString(None)),
            Some(_) => wrong_type(),
        },
        ("HGETALL", [key]) => match state.data.get(key).map(|v| v.value().clone()) {
            None => Reply::Array(Some(Vec::new())),
            Some(Value::Hash(fields)) => {
                Reply::bulk_array(fields.iter().flat_map(|(f, v)| [f.clone(), v.clone()]))
            }
            Some(_) => wrong_type(),
        },

        ("ZADD", [key, rest @ ..]) if !rest.is_empty() && rest.len() % 2 == 0 => {
            let mut members = Vec::with_capacity(rest.len() / 2);
            for pair in rest.chunks(2) {
                match pair[0].parse::<f64>() {
                    Ok(score) => members.push((score, pair[1].clone())),
                    Err(_) => return error("ERR value is not a valid float"),
                }
            }
            match zset_add(state, key, members) {
                Some(added) => Reply::Integer(added as i64),
                None => wrong_type(),
            }
        }
        ("ZRANGE", [key, start, stop, options @ ..]) if options.len() <= 1 => {
            let with_scores = match options {
                [] => false,
                [opt] if opt.eq_ignore_ascii_case("WITHSCORES") => true,
                _ => return error("ERR syntax error"),
            };
            let (Ok(start), Ok(stop)) = (start.parse::<i64>(), stop.parse::<i64>()) else {
                return error("ERR value is not an integer or out of range");
            };
            match state.data.get(key).map(|v| v.value().clone()) {
                None => Reply::Array(Some(Vec::new())),
                Some(Value::ZSet(members)) => {
                    let selected = slice_range(&members, start, stop);
                    let items = selected.iter().flat_map(|(score, member)| {
                        let mut item = vec![member.clone()];
                        if with_scores {
                            item.push(format_score(*score));
                        }
                        item
                    });
                    Reply::bulk_array(items)
                }
                Some(_) => wrong_type(),
            }
        }

        (
            "PING" | "ECHO" | "AUTH" | "SELECT" | "SET" | "GET" | "STRLEN" | "DEL" | "HSET"
            | "HMSET" | "HGET" | "HGETALL" | "ZADD" | "ZRANGE",
            _,
        ) => wrong_args(name),
        _ => Reply::Error(format!("ERR unknown command '{}'", name)),
    }
}

/// Returns the number of new fields, or None if the key holds another type.
fn hash_set(state: &State, key: &str, pairs: &[(String, String)]) -> Option<usize> {
    let mut entry = state
        .data
        .entry(key.to_string())
        .or_insert_with(|| Value::Hash(Vec::new()));
    let Value::Hash(fields) = entry.value_mut() else {
        return None;
    };

    let mut added = 0;
    for (field, value) in pairs {
        match fields.iter_mut().find(|(f, _)| f == field) {
            Some(existing) => existing.1 = value.clone(),
            None => {
                fields.push((field.clone(), value.clone()));
                added += 1;
            }
        }
    }
    Some(added)
}

fn zset_add(state: &State, key: &str, members: Vec<(f64, String)>) -> Option<usize> {
    let mut entry = state
        .data
        .entry(key.to_string())
        .or_insert_with(|| Value::ZSet(Vec::new()));
    let Value::ZSet(set) = entry.value_mut() else {
        return None;
    };

    let mut added = 0;
    for (score, member) in members {
        match set.iter_mut().find(|(_, m)| *m == member) {
            Some(existing) => existing.0 = score,
            None => {
                set.push((score, member));
                added += 1;
            }
        }
    }
    set.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Some(added)
}

fn slice_range<T>(items: &[T], start: i64, stop: i64) -> &[T] {
    let len = items.len() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return &[];
    }
    &items[start as usize..=stop as usize]
}
