//! # tnp-core
//!
//! Muon tag-and-probe selection over columnar collision-event records.
//!
//! For each event the selector pairs strictly-identified, trigger-matched
//! "tag" muons with looser "probe" candidates and reports the accepted
//! pairs plus per-candidate diagnostic measurements. The driver routes
//! those into a fixed set of booked histograms and persists them as JSON.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use tnp_core::Analysis;
//!
//! let analysis = Analysis::from_config_file(Path::new("tnp.toml")).unwrap();
//! let summary = analysis.execute().unwrap();
//! println!("{} pairs from {} events", summary.pairs, summary.events_read);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod event;
pub mod histogram;
pub mod kinematics;
pub mod selection;
pub mod sink;

pub use analysis::{Analysis, RunSummary};
pub use config::{AnalysisConfig, SampleConfig, TagAndProbeConfig};
pub use error::{Result, TnpError};
pub use event::{
    EventSource, JsonEventSource, MemoryEventSource, Muon, MuonCandidate, MuonEvent, NtupleHeader,
};
pub use histogram::{Hist1D, Hist2D};
pub use kinematics::{FourMomentum, MUON_MASS_GEV};
pub use selection::{Diagnostic, Selection, Selector};
pub use sink::HistogramSink;
