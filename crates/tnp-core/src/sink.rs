//! Booked output distributions and diagnostic routing.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::histogram::{Hist1D, Hist2D};
use crate::selection::Diagnostic;

/// The fixed set of output distributions, booked once at startup.
///
/// One field per channel: the key set is the struct itself, so nothing can
/// be added or looked up by name at runtime. Serialized field names keep
/// the histogram names used downstream.
#[derive(Debug, Serialize)]
pub struct HistogramSink {
    /// Tag-probe pair invariant mass.
    #[serde(rename = "pairMass")]
    pub pair_mass: Hist1D,
    /// Tag-probe dz difference.
    #[serde(rename = "pairDz")]
    pub pair_dz: Hist1D,
    /// Probe pt versus pair delta-R.
    #[serde(rename = "probePtVsPairDr")]
    pub probe_pt_vs_pair_dr: Hist2D,
    /// Probe pixel hit count.
    #[serde(rename = "probeNPixelHits")]
    pub probe_n_pixel_hits: Hist1D,
    /// Probe tracker hit count.
    #[serde(rename = "probeNTrkLayers")]
    pub probe_n_trk_layers: Hist1D,
    /// Probe RPC layer count.
    #[serde(rename = "probeNRPCLayers")]
    pub probe_n_rpc_layers: Hist1D,
    /// Probe relative track isolation.
    #[serde(rename = "probeReliso")]
    pub probe_rel_iso: Hist1D,
    /// Probe origin-algorithm code.
    #[serde(rename = "probeOrigAlgo")]
    pub probe_orig_algo: Hist1D,
}

impl HistogramSink {
    /// Book all distributions with their standard binnings.
    pub fn book() -> Self {
        Self {
            pair_mass: Hist1D::new(
                "tag and probe pair mass;mass [GeV];#entries/GeV",
                100,
                50.0,
                150.0,
            ),
            pair_dz: Hist1D::new(
                "tag and probe pair dZ;dZ(tag,probe);#entries/0.2",
                100,
                -5.0,
                5.0,
            ),
            probe_pt_vs_pair_dr: Hist2D::new(
                "probe p_{T} vs tag and probe dR;probe p_{T} [GeV];tag and probe dR",
                100,
                0.0,
                1000.0,
                100,
                0.0,
                2.0 * std::f64::consts::PI,
            ),
            probe_n_pixel_hits: Hist1D::new(
                "probe # pixel hits;# pixel hits;#entries",
                10,
                -0.5,
                9.5,
            ),
            probe_n_trk_layers: Hist1D::new(
                "probe # tracker layers;# tracker layers;#entries",
                30,
                -0.5,
                29.5,
            ),
            probe_n_rpc_layers: Hist1D::new(
                "probe # RPC layers;# RPC layers;#entries",
                30,
                -0.5,
                29.5,
            ),
            probe_rel_iso: Hist1D::new("probe relative trk iso;isolation;#entries", 100, 0.0, 5.0),
            probe_orig_algo: Hist1D::new(
                "probe original algo;original algo;#entries",
                20,
                -0.5,
                19.5,
            ),
        }
    }

    /// Route one diagnostic measurement to its distribution.
    pub fn record(&mut self, d: &Diagnostic) {
        match *d {
            Diagnostic::ProbePixelHits(v) => self.probe_n_pixel_hits.fill(v),
            Diagnostic::ProbeTrackerHits(v) => self.probe_n_trk_layers.fill(v),
            Diagnostic::ProbeRpcLayers(v) => self.probe_n_rpc_layers.fill(v),
            Diagnostic::ProbeRelIso(v) => self.probe_rel_iso.fill(v),
            Diagnostic::ProbeOrigAlgo(v) => self.probe_orig_algo.fill(v),
            Diagnostic::PairMass(v) => self.pair_mass.fill(v),
            Diagnostic::ProbePtVsPairDr { pt, dr } => self.probe_pt_vs_pair_dr.fill(pt, dr),
            Diagnostic::PairDz(v) => self.pair_dz.fill(v),
        }
    }

    /// Persist all distributions as pretty JSON.
    ///
    /// Consumes the sink: finalization happens exactly once.
    pub fn finalize(self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_routes_each_channel_once() {
        let mut sink = HistogramSink::book();
        sink.record(&Diagnostic::ProbePixelHits(3.0));
        sink.record(&Diagnostic::ProbeTrackerHits(14.0));
        sink.record(&Diagnostic::ProbeRpcLayers(0.0));
        sink.record(&Diagnostic::ProbeRelIso(0.05));
        sink.record(&Diagnostic::ProbeOrigAlgo(4.0));
        sink.record(&Diagnostic::PairMass(91.0));
        sink.record(&Diagnostic::ProbePtVsPairDr { pt: 40.0, dr: 3.1 });
        sink.record(&Diagnostic::PairDz(-0.2));

        assert_eq!(sink.probe_n_pixel_hits.entries, 1);
        assert_eq!(sink.probe_n_trk_layers.entries, 1);
        assert_eq!(sink.probe_n_rpc_layers.entries, 1);
        assert_eq!(sink.probe_rel_iso.entries, 1);
        assert_eq!(sink.probe_orig_algo.entries, 1);
        assert_eq!(sink.pair_mass.entries, 1);
        assert_eq!(sink.probe_pt_vs_pair_dr.entries, 1);
        assert_eq!(sink.pair_dz.entries, 1);

        // pairMass: 100 bins over [50, 150) puts 91.0 in bin 41.
        assert_eq!(sink.pair_mass.content[41], 1.0);
    }

    #[test]
    fn finalize_writes_named_histograms() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("tnp_sink_{}_{}.json", std::process::id(), nanos));

        let mut sink = HistogramSink::book();
        sink.record(&Diagnostic::PairMass(91.0));
        sink.finalize(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        std::fs::remove_file(&path).ok();

        for name in [
            "pairMass",
            "pairDz",
            "probePtVsPairDr",
            "probeNPixelHits",
            "probeNTrkLayers",
            "probeNRPCLayers",
            "probeReliso",
            "probeOrigAlgo",
        ] {
            assert!(v.get(name).is_some(), "missing histogram '{name}'");
        }
        assert_eq!(v["pairMass"]["entries"], 1);
    }
}
