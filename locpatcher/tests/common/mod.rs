//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use locpatcher::checksum::Crc32;
use locpatcher::net::{BodyStream, NetError, NetResult, Transport};
use locpatcher::sync::{
    CancelToken, EventSink, RecordingSink, RetryPolicy, SyncConfig, SyncEvent, SyncSession,
};

pub const MANIFEST_URL: &str = "https://patch.test/client/patchlist.txt";
pub const REMOTE_HOST: &str = "https://patch.test/client/";

/// One scripted response.
#[derive(Clone)]
pub enum Reply {
    Body(Vec<u8>),
    Status(u16),
    Refused,
    /// Yields `bytes`, then fails the next read.
    BrokenAfter(Vec<u8>),
}

/// In-memory transport with a queue of replies per URL.
///
/// The last reply in a queue repeats forever. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, replies: Vec<Reply>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    pub fn manifest(&self, content: &str) -> &Self {
        self.script(MANIFEST_URL, vec![Reply::Body(content.as_bytes().to_vec())])
    }

    pub fn file(&self, path: &str, replies: Vec<Reply>) -> &Self {
        self.script(&format!("{}{}", REMOTE_HOST, path), replies)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, path: &str) -> usize {
        let url = format!("{}{}", REMOTE_HOST, path);
        self.requests().iter().filter(|r| **r == url).count()
    }

    fn next(&self, url: &str) -> Option<Reply> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

struct BrokenReader {
    inner: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
            n => Ok(n),
        }
    }
}

fn failure(url: &str, reply: &Reply) -> Option<NetError> {
    match reply {
        Reply::Status(code) => Some(NetError::Status {
            url: url.to_string(),
            code: *code,
            reason: "Scripted".to_string(),
        }),
        Reply::Refused => Some(NetError::Transport {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        }),
        _ => None,
    }
}

impl Transport for MockTransport {
    fn fetch_text(&self, url: &str) -> NetResult<String> {
        let reply = self.next(url).unwrap_or(Reply::Status(404));
        if let Some(err) = failure(url, &reply) {
            return Err(err);
        }
        match reply {
            Reply::Body(bytes) | Reply::BrokenAfter(bytes) => {
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => unreachable!(),
        }
    }

    fn open_stream(&self, url: &str) -> NetResult<BodyStream> {
        let reply = self.next(url).unwrap_or(Reply::Status(404));
        if let Some(err) = failure(url, &reply) {
            return Err(err);
        }
        match reply {
            Reply::Body(bytes) => Ok(Box::new(Cursor::new(bytes))),
            Reply::BrokenAfter(bytes) => Ok(Box::new(BrokenReader {
                inner: Cursor::new(bytes),
            })),
            _ => unreachable!(),
        }
    }
}

/// Patch list line for `content` stored at `path`.
pub fn line(path: &str, content: &[u8]) -> String {
    format!(
        "{} {} {}\n",
        path,
        Crc32(crc32fast::hash(content)),
        content.len()
    )
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1))
        .with_poll_interval(Duration::from_millis(1))
}

pub fn config(root: &Path) -> SyncConfig {
    SyncConfig::new(root)
        .with_manifest_url(MANIFEST_URL)
        .with_remote_host(REMOTE_HOST)
        .with_retry(fast_retry(3))
        .with_chunk_size(4)
        .with_progress_interval(Duration::ZERO)
}

pub fn session(
    root: &Path,
    transport: &MockTransport,
) -> (SyncSession<MockTransport>, RecordingSink) {
    let sink = RecordingSink::new();
    let session = SyncSession::new(config(root), transport.clone(), sink.clone());
    (session, sink)
}

/// Records events and cancels a token once `trigger` returns true.
pub struct CancellingSink {
    pub recorder: RecordingSink,
    pub token: CancelToken,
    pub trigger: Box<dyn Fn(&SyncEvent) -> bool + Send>,
}

impl EventSink for CancellingSink {
    fn emit(&self, event: SyncEvent) {
        let fire = (self.trigger)(&event);
        self.recorder.emit(event);
        if fire {
            self.token.cancel();
        }
    }
}

pub fn status_messages(events: &[SyncEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SyncEvent::Status { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
