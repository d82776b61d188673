//! The export pipeline.
//!
//! One producer task paginates each requested year into a bounded channel;
//! the consumer side drives a small number of records through the
//! enrichment stages, the asset materializer and the document emitter
//! concurrently. The channel bound is the backpressure: pagination cannot
//! run ahead of the records still being processed. A failure on one record
//! never touches its siblings.

pub mod paginate;
pub mod records;
pub mod stages;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::error;

use crate::emitter;
use crate::gateway::Gateway;
use crate::materializer::{MaterializeOutcome, Materializer};
use crate::summary::RunSummary;

use records::{EnrichedRecord, RawRecord, StagedRecord};

/// Records buffered between the pagination producer and the processors.
const RECORD_CHANNEL_CAPACITY: usize = 8;

/// How one record left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub cache_dir: PathBuf,
    pub out_dir: PathBuf,
    pub page_limit: u32,
    pub max_pages: Option<u32>,
    /// Records processed concurrently downstream of pagination.
    pub in_flight: usize,
}

pub struct ExportPipeline {
    gateway: Arc<dyn Gateway>,
    materializer: Materializer,
    settings: PipelineSettings,
}

impl ExportPipeline {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        materializer: Materializer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            gateway,
            materializer,
            settings,
        }
    }

    /// Run the export for the given years and return the per-year counts.
    pub async fn run(&self, years: &[u16]) -> Result<RunSummary> {
        let (tx, rx) = mpsc::channel::<RawRecord>(RECORD_CHANNEL_CAPACITY);

        let gateway = self.gateway.clone();
        let years: Vec<u16> = years.to_vec();
        let page_limit = self.settings.page_limit;
        let max_pages = self.settings.max_pages;
        let producer = tokio::spawn(async move {
            let mut failures: Vec<(u16, String)> = Vec::new();
            for year in years {
                if let Err(err) =
                    paginate::fetch_partition(gateway.as_ref(), year, page_limit, max_pages, &tx)
                        .await
                {
                    error!(year, error = format!("{:#}", err), "Partition fetch failed");
                    failures.push((year, format!("{:#}", err)));
                }
            }
            failures
        });

        let mut summary = RunSummary::new();

        let incoming = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|record| (record, rx))
        });
        let outcomes = incoming
            .map(|record| {
                let year = record.year;
                async move { (year, self.process_record(record).await) }
            })
            .buffered(self.settings.in_flight.max(1));
        futures::pin_mut!(outcomes);

        while let Some((year, outcome)) = outcomes.next().await {
            match outcome {
                RecordOutcome::Completed => summary.record_completed(year),
                RecordOutcome::Skipped => summary.record_skipped(year),
                RecordOutcome::Failed => summary.record_failed(year),
            }
        }

        for (year, err) in producer.await.context("Pagination task panicked")? {
            summary.record_fetch_failure(year, err);
        }

        summary.log();
        Ok(summary)
    }

    /// Drive one record through every stage. Failures are logged here and
    /// reduced to an outcome so the caller can keep the stream going.
    async fn process_record(&self, record: RawRecord) -> RecordOutcome {
        let track_name = record.track.document.name.clone();
        let year = record.year;

        match self.try_process(record).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    track = %track_name,
                    year,
                    error = format!("{:#}", err),
                    "Record failed"
                );
                RecordOutcome::Failed
            }
        }
    }

    async fn try_process(&self, record: RawRecord) -> Result<RecordOutcome> {
        let gateway = self.gateway.as_ref();

        let artist = stages::resolve_artist(gateway, &record).await?;
        let uploader = stages::resolve_uploader(gateway, &record).await?;
        let publication = stages::resolve_publication(gateway, &record).await;

        let enriched = EnrichedRecord {
            year: record.year,
            track: record.track,
            artist,
            uploader,
            publication,
        };
        let staging = stages::derive_staging(
            &enriched,
            &self.settings.cache_dir,
            &self.settings.out_dir,
        )?;
        let staged = StagedRecord {
            record: enriched,
            staging,
        };

        match self.materializer.materialize(&staged.staging).await? {
            MaterializeOutcome::AssetForbidden => Ok(RecordOutcome::Skipped),
            MaterializeOutcome::Completed => {
                emitter::write_metadata_document(&staged).await?;
                Ok(RecordOutcome::Completed)
            }
        }
    }
}
