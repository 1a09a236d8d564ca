//! The event loop: run filtering, event cap, selection, histogram routing.

use std::path::Path;

use serde::Serialize;

use crate::config::{self, AnalysisConfig, SampleConfig, TagAndProbeConfig};
use crate::error::Result;
use crate::event::{EventSource, JsonEventSource};
use crate::selection::Selector;
use crate::sink::HistogramSink;

/// Progress log cadence, in events.
const PROGRESS_EVERY: u64 = 10_000;

/// Counters reported after a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Events read from the source (cap applied).
    pub events_read: u64,
    /// Events passing the run filter.
    pub events_selected: u64,
    /// Accepted tag-probe pairs.
    pub pairs: u64,
}

/// A configured tag-and-probe analysis.
pub struct Analysis {
    cfg: AnalysisConfig,
}

impl Analysis {
    /// Load the configuration file and build the analysis.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self { cfg: config::load(path)? })
    }

    /// Build directly from configuration values.
    pub fn new(tnp: TagAndProbeConfig, sample: SampleConfig) -> Self {
        Self { cfg: AnalysisConfig { tnp, sample } }
    }

    /// Sample settings in effect.
    pub fn sample(&self) -> &SampleConfig {
        &self.cfg.sample
    }

    /// Open the configured input, run the loop, and finalize the sink to
    /// the configured output.
    ///
    /// The output is written exactly once, also when zero events pass the
    /// run filter.
    pub fn execute(&self) -> Result<RunSummary> {
        let mut source = JsonEventSource::open(&self.cfg.sample.file_name)?;
        let mut sink = HistogramSink::book();
        let summary = self.run(&mut source, &mut sink);
        sink.finalize(&self.cfg.sample.output_file_name)?;
        Ok(summary)
    }

    /// Drive the event loop over an arbitrary source, filling `sink`.
    ///
    /// Stops at the configured event cap, or when the source ends (source
    /// corruption ends the stream without error, inside the source).
    pub fn run(&self, source: &mut dyn EventSource, sink: &mut HistogramSink) -> RunSummary {
        let selector = Selector::new(&self.cfg.tnp, source.filter_names());
        let cap = self.cfg.sample.n_events;

        let mut summary = RunSummary { events_read: 0, events_selected: 0, pairs: 0 };

        while cap <= 0 || summary.events_read < cap as u64 {
            let event = match source.next_event() {
                Some(ev) => ev,
                None => break,
            };
            summary.events_read += 1;

            if summary.events_read % PROGRESS_EVERY == 0 {
                tracing::info!(processed = summary.events_read, "processed events");
            }

            if !self.cfg.sample.accepts_run(event.run) {
                continue;
            }
            summary.events_selected += 1;

            let selection = selector.tnp_selection(&event);
            for diagnostic in &selection.diagnostics {
                sink.record(diagnostic);
            }
            summary.pairs += selection.pairs.len() as u64;
        }

        tracing::info!(
            events = summary.events_read,
            selected = summary.events_selected,
            pairs = summary.pairs,
            "event loop done"
        );
        summary
    }
}
