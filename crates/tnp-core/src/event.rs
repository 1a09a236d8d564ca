//! Columnar muon event model and event sources.
//!
//! An event carries one run number and parallel per-muon arrays; index `i`
//! refers to the same physical muon across every array. The concrete file
//! source is line-oriented JSON behind the [`EventSource`] trait, which is
//! also the seam for plugging in other columnar backends.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kinematics::{FourMomentum, MUON_MASS_GEV};

/// One event's muon collection, stored column-wise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MuonEvent {
    /// Run number this event was recorded in.
    pub run: u32,
    /// x momentum components (GeV).
    pub px: Vec<f64>,
    /// y momentum components (GeV).
    pub py: Vec<f64>,
    /// z momentum components (GeV).
    pub pz: Vec<f64>,
    /// Electric charges (+1/-1).
    pub charge: Vec<i32>,
    /// Global-muon reconstruction flags.
    pub is_global: Vec<bool>,
    /// Tracker-arbitrated muon flags.
    pub is_tracker_arb: Vec<bool>,
    /// RPC muon flags.
    pub is_rpc: Vec<bool>,
    /// Normalized chi-square of the global fit.
    pub norm_chi2_glb: Vec<f64>,
    /// Numbers of matched muon stations.
    pub n_matched_stations: Vec<i32>,
    /// Numbers of standalone-muon hits.
    pub n_sta_hits: Vec<i32>,
    /// Pixel hit counts of the tracker fit.
    pub n_pixel_hits_trk: Vec<i32>,
    /// Tracker layer counts of the tracker fit.
    pub n_trk_layers_trk: Vec<i32>,
    /// Pixel hit counts of the global fit.
    pub n_pixel_hits_glb: Vec<i32>,
    /// Tracker hit counts of the global fit.
    pub n_trk_hits_glb: Vec<i32>,
    /// RPC layer counts (meaningful when `is_rpc` is set).
    pub n_rpc_layers: Vec<i32>,
    /// Track isolation sums of the global fit (GeV).
    pub tk_iso_glb: Vec<f64>,
    /// Track isolation sums of the tracker fit (GeV).
    pub tk_iso_trk: Vec<f64>,
    /// Muon station bit-masks.
    pub station_mask: Vec<u32>,
    /// Origin-algorithm codes of the tracker fit.
    pub orig_algo: Vec<i32>,
    /// Longitudinal impact parameters (cm).
    pub dz: Vec<f64>,
    /// Trigger-match distances, indexed `[muon][filter]`.
    pub hlt_dr: Vec<Vec<f64>>,
}

/// One muon's attributes in row form, used to build events
/// programmatically (generators, tests).
#[derive(Debug, Clone, Default)]
pub struct Muon {
    /// x momentum component (GeV).
    pub px: f64,
    /// y momentum component (GeV).
    pub py: f64,
    /// z momentum component (GeV).
    pub pz: f64,
    /// Electric charge.
    pub charge: i32,
    /// Global-muon flag.
    pub is_global: bool,
    /// Tracker-arbitrated flag.
    pub is_tracker_arb: bool,
    /// RPC flag.
    pub is_rpc: bool,
    /// Normalized global-fit chi-square.
    pub norm_chi2_glb: f64,
    /// Matched stations.
    pub n_matched_stations: i32,
    /// Standalone hits.
    pub n_sta_hits: i32,
    /// Tracker-fit pixel hits.
    pub n_pixel_hits_trk: i32,
    /// Tracker-fit tracker layers.
    pub n_trk_layers_trk: i32,
    /// Global-fit pixel hits.
    pub n_pixel_hits_glb: i32,
    /// Global-fit tracker hits.
    pub n_trk_hits_glb: i32,
    /// RPC layers.
    pub n_rpc_layers: i32,
    /// Global-fit track isolation (GeV).
    pub tk_iso_glb: f64,
    /// Tracker-fit track isolation (GeV).
    pub tk_iso_trk: f64,
    /// Station bit-mask.
    pub station_mask: u32,
    /// Origin-algorithm code.
    pub orig_algo: i32,
    /// Longitudinal impact parameter (cm).
    pub dz: f64,
    /// Per-filter trigger-match distances.
    pub hlt_dr: Vec<f64>,
}

impl MuonEvent {
    /// Empty event for the given run.
    pub fn new(run: u32) -> Self {
        Self { run, ..Default::default() }
    }

    /// Number of muons in the event.
    pub fn n_muons(&self) -> usize {
        self.px.len()
    }

    /// Append one muon row to the columns.
    pub fn push(&mut self, mu: Muon) {
        self.px.push(mu.px);
        self.py.push(mu.py);
        self.pz.push(mu.pz);
        self.charge.push(mu.charge);
        self.is_global.push(mu.is_global);
        self.is_tracker_arb.push(mu.is_tracker_arb);
        self.is_rpc.push(mu.is_rpc);
        self.norm_chi2_glb.push(mu.norm_chi2_glb);
        self.n_matched_stations.push(mu.n_matched_stations);
        self.n_sta_hits.push(mu.n_sta_hits);
        self.n_pixel_hits_trk.push(mu.n_pixel_hits_trk);
        self.n_trk_layers_trk.push(mu.n_trk_layers_trk);
        self.n_pixel_hits_glb.push(mu.n_pixel_hits_glb);
        self.n_trk_hits_glb.push(mu.n_trk_hits_glb);
        self.n_rpc_layers.push(mu.n_rpc_layers);
        self.tk_iso_glb.push(mu.tk_iso_glb);
        self.tk_iso_trk.push(mu.tk_iso_trk);
        self.station_mask.push(mu.station_mask);
        self.orig_algo.push(mu.orig_algo);
        self.dz.push(mu.dz);
        self.hlt_dr.push(mu.hlt_dr);
    }

    /// Check the equal-length invariant across all per-muon arrays.
    pub fn validate(&self) -> bool {
        let n = self.px.len();
        self.py.len() == n
            && self.pz.len() == n
            && self.charge.len() == n
            && self.is_global.len() == n
            && self.is_tracker_arb.len() == n
            && self.is_rpc.len() == n
            && self.norm_chi2_glb.len() == n
            && self.n_matched_stations.len() == n
            && self.n_sta_hits.len() == n
            && self.n_pixel_hits_trk.len() == n
            && self.n_trk_layers_trk.len() == n
            && self.n_pixel_hits_glb.len() == n
            && self.n_trk_hits_glb.len() == n
            && self.n_rpc_layers.len() == n
            && self.tk_iso_glb.len() == n
            && self.tk_iso_trk.len() == n
            && self.station_mask.len() == n
            && self.orig_algo.len() == n
            && self.dz.len() == n
            && self.hlt_dr.len() == n
    }

    /// Read-only view of muon `i`. Panics if `i` is out of range.
    pub fn candidate(&self, i: usize) -> MuonCandidate<'_> {
        assert!(i < self.n_muons(), "muon index {i} out of range");
        MuonCandidate { event: self, idx: i }
    }
}

/// Read-only view into one muon of a [`MuonEvent`].
#[derive(Debug, Clone, Copy)]
pub struct MuonCandidate<'a> {
    event: &'a MuonEvent,
    idx: usize,
}

impl<'a> MuonCandidate<'a> {
    /// Index of this muon within its event.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Four-momentum built with the fixed muon mass.
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_xyzm(
            self.event.px[self.idx],
            self.event.py[self.idx],
            self.event.pz[self.idx],
            MUON_MASS_GEV,
        )
    }

    /// Electric charge.
    pub fn charge(&self) -> i32 {
        self.event.charge[self.idx]
    }

    /// Global-muon flag.
    pub fn is_global(&self) -> bool {
        self.event.is_global[self.idx]
    }

    /// Tracker-arbitrated flag.
    pub fn is_tracker_arb(&self) -> bool {
        self.event.is_tracker_arb[self.idx]
    }

    /// RPC flag.
    pub fn is_rpc(&self) -> bool {
        self.event.is_rpc[self.idx]
    }

    /// Normalized global-fit chi-square.
    pub fn norm_chi2_glb(&self) -> f64 {
        self.event.norm_chi2_glb[self.idx]
    }

    /// Matched stations.
    pub fn n_matched_stations(&self) -> i32 {
        self.event.n_matched_stations[self.idx]
    }

    /// Standalone hits.
    pub fn n_sta_hits(&self) -> i32 {
        self.event.n_sta_hits[self.idx]
    }

    /// Tracker-fit pixel hits.
    pub fn n_pixel_hits_trk(&self) -> i32 {
        self.event.n_pixel_hits_trk[self.idx]
    }

    /// Tracker-fit tracker layers.
    pub fn n_trk_layers_trk(&self) -> i32 {
        self.event.n_trk_layers_trk[self.idx]
    }

    /// Global-fit pixel hits.
    pub fn n_pixel_hits_glb(&self) -> i32 {
        self.event.n_pixel_hits_glb[self.idx]
    }

    /// Global-fit tracker hits.
    pub fn n_trk_hits_glb(&self) -> i32 {
        self.event.n_trk_hits_glb[self.idx]
    }

    /// RPC layers (0 if the muon has no RPC segment).
    pub fn n_rpc_layers(&self) -> i32 {
        self.event.n_rpc_layers[self.idx]
    }

    /// Relative track isolation from the global fit.
    pub fn rel_iso_glb(&self) -> f64 {
        self.event.tk_iso_glb[self.idx] / self.p4().pt()
    }

    /// Relative track isolation from the tracker fit.
    pub fn rel_iso_trk(&self) -> f64 {
        self.event.tk_iso_trk[self.idx] / self.p4().pt()
    }

    /// Origin-algorithm code of the tracker fit.
    pub fn orig_algo(&self) -> i32 {
        self.event.orig_algo[self.idx]
    }

    /// Longitudinal impact parameter.
    pub fn dz(&self) -> f64 {
        self.event.dz[self.idx]
    }

    /// Trigger-match distance for `filter`, or `None` if the ntuple has
    /// fewer filter slots for this muon.
    pub fn hlt_dr(&self, filter: usize) -> Option<f64> {
        self.event.hlt_dr[self.idx].get(filter).copied()
    }

    /// Number of chambers set in the station mask, skipping chamber `ch`
    /// (1-based, as in the detector numbering).
    pub fn n_matched_chambers_excluding(&self, ch: i32) -> u32 {
        let mask = self.event.station_mask[self.idx];
        (0i32..8)
            .filter(|&bit| mask & (1u32 << bit) != 0 && bit != ch - 1)
            .count() as u32
    }
}

/// A sequence of muon events plus the process-wide trigger filter names.
///
/// `next_event` returns `None` both on exhaustion and when the next record
/// cannot be read; an unreadable record ends the stream without error and
/// everything accumulated so far is kept.
pub trait EventSource {
    /// Configured trigger filter names, read once at startup.
    fn filter_names(&self) -> &[String];

    /// Next event in source order, if any.
    fn next_event(&mut self) -> Option<MuonEvent>;
}

/// First line of a JSON-lines ntuple file.
#[derive(Debug, Serialize, Deserialize)]
pub struct NtupleHeader {
    /// Trigger filter names, shared by every event in the file.
    pub filter_names: Vec<String>,
}

/// JSON-lines file source: a header line followed by one event per line.
pub struct JsonEventSource {
    reader: BufReader<File>,
    filter_names: Vec<String>,
    line_no: usize,
}

impl JsonEventSource {
    /// Open a file and read its header line.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut first = String::new();
        reader.read_line(&mut first)?;
        let header: NtupleHeader = serde_json::from_str(first.trim_end())?;
        Ok(Self { reader, filter_names: header.filter_names, line_no: 1 })
    }
}

impl EventSource for JsonEventSource {
    fn filter_names(&self) -> &[String] {
        &self.filter_names
    }

    fn next_event(&mut self) -> Option<MuonEvent> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(line = self.line_no + 1, "read failed, stopping: {e}");
                return None;
            }
        }
        self.line_no += 1;
        if line.trim().is_empty() {
            return self.next_event();
        }
        let event: MuonEvent = match serde_json::from_str(line.trim_end()) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::warn!(line = self.line_no, "malformed event record, stopping: {e}");
                return None;
            }
        };
        if !event.validate() {
            tracing::warn!(line = self.line_no, "ragged muon arrays, stopping");
            return None;
        }
        Some(event)
    }
}

/// In-memory source, for generators and tests.
pub struct MemoryEventSource {
    filter_names: Vec<String>,
    events: VecDeque<MuonEvent>,
}

impl MemoryEventSource {
    /// Build from owned filter names and events.
    pub fn new(filter_names: Vec<String>, events: Vec<MuonEvent>) -> Self {
        Self { filter_names, events: events.into() }
    }
}

impl EventSource for MemoryEventSource {
    fn filter_names(&self) -> &[String] {
        &self.filter_names
    }

    fn next_event(&mut self) -> Option<MuonEvent> {
        self.events.pop_front()
    }
}
