//! File feed: reads a log file once, start to end.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs::File;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{pump, Feed, FeedKind, FeedOptions, IncomingLog};

#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
    options: FeedOptions,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>, options: FeedOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Feed for FileFeed {
    fn kind(&self) -> FeedKind {
        FeedKind::File
    }

    fn spawn(self, tx: mpsc::Sender<IncomingLog>) -> JoinHandle<anyhow::Result<usize>> {
        tokio::spawn(async move {
            let file = File::open(&self.path)
                .await
                .with_context(|| format!("opening {}", self.path.display()))?;
            tracing::debug!(path = %self.path.display(), "reading file feed");
            pump(BufReader::new(file), self.kind(), &self.options, &tx).await
        })
    }
}
