//! mrelic-feeds: line-oriented log sources for mrelic.
//!
//! Each feed reads raw lines, turns them into ingest payloads with
//! [`line_to_payload`], and pushes [`IncomingLog`]s onto a `tokio` channel.
//! The consumer hands each payload to the
//! [`QueryCoordinator`](mrelic_core::QueryCoordinator).

use std::borrow::Cow;
use std::fmt;

use mrelic_core::TransportMeta;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod file;
pub mod stdin;

pub use file::FileFeed;
pub use stdin::StdinFeed;

/// Channel capacity used by [`channel`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// Which source produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Stdin,
    File,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Stdin => write!(f, "stdin"),
            FeedKind::File => write!(f, "file"),
        }
    }
}

/// One payload ready for ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingLog {
    pub payload: Value,
    pub meta: Option<TransportMeta>,
    pub source: FeedKind,
}

/// Settings shared by every feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedOptions {
    /// Service name for lines that do not carry their own.
    pub service: String,
    /// Also send `service` as the transport header, which overrides any
    /// service inside the payload.
    pub header: bool,
}

impl FeedOptions {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            header: false,
        }
    }

    pub fn with_header(mut self) -> Self {
        self.header = true;
        self
    }

    fn meta(&self) -> Option<TransportMeta> {
        self.header.then(|| TransportMeta::with_service(self.service.clone()))
    }
}

/// A source that can be started in the background.
pub trait Feed: Send + 'static {
    fn kind(&self) -> FeedKind;

    /// Start reading. The task resolves to the number of payloads sent once
    /// the source is exhausted or the receiver is dropped.
    fn spawn(self, tx: mpsc::Sender<IncomingLog>) -> JoinHandle<anyhow::Result<usize>>;
}

/// A bounded channel sized for feeds.
pub fn channel() -> (mpsc::Sender<IncomingLog>, mpsc::Receiver<IncomingLog>) {
    mpsc::channel(DEFAULT_CAPACITY)
}

/// Turn one raw line into a payload.
///
/// JSON lines are used as-is; anything else is wrapped as an `info` record
/// stamped with the current time. A JSON object without a truthy `service`
/// gets `service` filled in. Blank lines yield `None`.
pub fn line_to_payload(line: &str, service: &str) -> Option<Value> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.trim().is_empty() {
        return None;
    }

    let mut payload = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(_) => json!({
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "level": "info",
            "message": line,
            "service": service,
        }),
    };

    if let Value::Object(fields) = &mut payload {
        let missing = match fields.get("service") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing && !service.is_empty() {
            fields.insert("service".into(), Value::String(service.to_string()));
        }
    }
    Some(payload)
}

/// Read `reader` line by line and send each payload to `tx`.
///
/// Returns the number of payloads sent. Bytes that are not valid UTF-8 are
/// replaced rather than ending the feed. Stops early, without error, if the
/// receiver goes away.
pub async fn pump<R>(
    mut reader: R,
    source: FeedKind,
    options: &FeedOptions,
    tx: &mpsc::Sender<IncomingLog>,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut sent = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            tracing::warn!(%source, "line is not valid UTF-8; decoding lossily");
        }
        let Some(payload) = line_to_payload(&line, &options.service) else {
            continue;
        };
        let incoming = IncomingLog {
            payload,
            meta: options.meta(),
            source,
        };
        if tx.send(incoming).await.is_err() {
            tracing::debug!(%source, sent, "receiver closed; stopping feed");
            break;
        }
        sent += 1;
    }

    tracing::debug!(%source, sent, "feed exhausted");
    Ok(sent)
}
