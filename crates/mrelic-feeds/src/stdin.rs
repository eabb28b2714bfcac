//! Standard input feed.

use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{pump, Feed, FeedKind, FeedOptions, IncomingLog};

/// Reads the process's stdin until EOF.
#[derive(Debug, Clone)]
pub struct StdinFeed {
    options: FeedOptions,
}

impl StdinFeed {
    pub fn new(options: FeedOptions) -> Self {
        Self { options }
    }
}

impl Feed for StdinFeed {
    fn kind(&self) -> FeedKind {
        FeedKind::Stdin
    }

    fn spawn(self, tx: mpsc::Sender<IncomingLog>) -> JoinHandle<anyhow::Result<usize>> {
        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            pump(reader, self.kind(), &self.options, &tx).await
        })
    }
}
