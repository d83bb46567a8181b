//! Delivery of aggregated results to an external sink
//!
//! The engine never retries sink writes; a sink failure aborts delivery
//! and surfaces to the caller. Delivery happens strictly after the
//! batch reached a terminal state, one [`ResultSink::write`] call per
//! stored entry, in unspecified order.

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::store::ResultStore;
use crate::types::{PageData, ResourceId};

/// Consumes the final contents of a result store, one record at a time
#[async_trait]
pub trait ResultSink: Send {
    /// Write one record
    async fn write(&mut self, id: &ResourceId, data: &PageData) -> Result<()>;

    /// Flush any buffered records; called once after the last write
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Write every stored entry to the sink, returning the number written
///
/// Order is unspecified. The first sink failure aborts delivery.
pub async fn deliver(store: &ResultStore, sink: &mut dyn ResultSink) -> Result<usize> {
    let mut written = 0;
    for (id, data) in store.snapshot() {
        sink.write(&id, &data).await?;
        written += 1;
    }
    sink.flush().await?;
    tracing::info!(written, "delivered results to sink");
    Ok(written)
}

#[derive(Serialize)]
struct Record<'a> {
    url: &'a str,
    title: &'a str,
    links: &'a [String],
}

/// Sink that appends one JSON record per line to a file
pub struct JsonlSink {
    writer: BufWriter<tokio::fs::File>,
}

impl JsonlSink {
    /// Open `path` for appending, creating it if missing
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl ResultSink for JsonlSink {
    async fn write(&mut self, id: &ResourceId, data: &PageData) -> Result<()> {
        let line = serde_json::to_string(&Record {
            url: id.as_str(),
            title: &data.title,
            links: &data.links,
        })?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Sink that collects records in memory; useful for embedding and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Every record written so far, in write order
    pub records: Vec<(ResourceId, PageData)>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn write(&mut self, id: &ResourceId, data: &PageData) -> Result<()> {
        self.records.push((id.clone(), data.clone()));
        Ok(())
    }
}
