//! Tag-and-probe pairing over one event's muon collection.
//!
//! The selector is a pure function of the event and the thresholds: it
//! returns the accepted (tag, probe) index pairs together with the ordered
//! sequence of diagnostic measurements, and fills nothing itself.

use crate::config::TagAndProbeConfig;
use crate::event::{MuonCandidate, MuonEvent};

/// Sentinel origin-algorithm code: the track was seeded purely from a
/// standalone-muon track, not independently tracker-reconstructed.
const ORIG_ALGO_STA_SEEDED: i32 = 14;

/// One diagnostic measurement, tagged by its destination channel.
///
/// The first five variants are emitted for every probe candidate scanned
/// under an accepted tag, before any probe cut; the last three once the
/// probe passes its quality cuts, before the pair cuts. Pre-cut
/// distributions stay available for threshold tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagnostic {
    /// Probe pixel hit count (global fit).
    ProbePixelHits(f64),
    /// Probe tracker hit count (global fit).
    ProbeTrackerHits(f64),
    /// Probe RPC layer count (0 when the RPC flag is unset).
    ProbeRpcLayers(f64),
    /// Probe relative track isolation (global fit).
    ProbeRelIso(f64),
    /// Probe origin-algorithm code.
    ProbeOrigAlgo(f64),
    /// Tag-probe invariant mass (GeV).
    PairMass(f64),
    /// Joint (probe pt, pair delta-R) measurement.
    ProbePtVsPairDr {
        /// Probe transverse momentum (GeV).
        pt: f64,
        /// Tag-probe angular separation.
        dr: f64,
    },
    /// Tag-probe longitudinal impact parameter difference (cm).
    PairDz(f64),
}

/// Output of one selector invocation.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Accepted (tag index, probe index) pairs, valid only within the
    /// event that produced them.
    pub pairs: Vec<(usize, usize)>,
    /// Diagnostic measurements, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Tag-and-probe selector with its one-time resolved HLT filter index.
pub struct Selector<'a> {
    config: &'a TagAndProbeConfig,
    hlt_filter_index: Option<usize>,
}

impl<'a> Selector<'a> {
    /// Resolve the configured HLT filter substring against the ntuple's
    /// filter names and build the selector.
    ///
    /// No match is not fatal: trigger matching stays disabled for the whole
    /// run and every event yields zero tags.
    pub fn new(config: &'a TagAndProbeConfig, filter_names: &[String]) -> Self {
        let hlt_filter_index =
            filter_names.iter().position(|name| name.contains(&config.tag_hlt_filter));
        match hlt_filter_index {
            Some(idx) => {
                tracing::info!(filter = %filter_names[idx], index = idx, "matched HLT filter");
            }
            None => {
                tracing::warn!(
                    substring = %config.tag_hlt_filter,
                    "no HLT filter matches, tag selection will find nothing"
                );
            }
        }
        Self { config, hlt_filter_index }
    }

    /// Resolved filter index, if any.
    pub fn hlt_filter_index(&self) -> Option<usize> {
        self.hlt_filter_index
    }

    /// Run the pairing algorithm over one event.
    pub fn tnp_selection(&self, event: &MuonEvent) -> Selection {
        let mut out = Selection::default();

        for i_tag in 0..event.n_muons() {
            let tag = event.candidate(i_tag);
            if !(self.tag_quality(&tag) && self.has_trigger(&tag)) {
                continue;
            }
            let tag_p4 = tag.p4();

            for i_probe in 0..event.n_muons() {
                if i_probe == i_tag {
                    continue;
                }
                let probe = event.candidate(i_probe);
                let probe_p4 = probe.p4();

                // Pre-cut diagnostics, unconditional for every scanned
                // probe. Hit counts and isolation come from the global
                // fit here, unlike the tracker-fit quantities cut on.
                out.diagnostics.push(Diagnostic::ProbePixelHits(probe.n_pixel_hits_glb() as f64));
                out.diagnostics.push(Diagnostic::ProbeTrackerHits(probe.n_trk_hits_glb() as f64));
                out.diagnostics.push(Diagnostic::ProbeRpcLayers(if probe.is_rpc() {
                    probe.n_rpc_layers() as f64
                } else {
                    0.0
                }));
                out.diagnostics.push(Diagnostic::ProbeRelIso(probe.rel_iso_glb()));
                out.diagnostics.push(Diagnostic::ProbeOrigAlgo(probe.orig_algo() as f64));

                if !self.probe_quality(&probe) {
                    continue;
                }

                let mass = (tag_p4 + probe_p4).mass();
                let pair_dr = tag_p4.delta_r(&probe_p4);
                let pair_dz = tag.dz() - probe.dz();

                out.diagnostics.push(Diagnostic::PairMass(mass));
                out.diagnostics
                    .push(Diagnostic::ProbePtVsPairDr { pt: probe_p4.pt(), dr: pair_dr });
                out.diagnostics.push(Diagnostic::PairDz(pair_dz));

                if pair_dz.abs() < self.config.pair_max_abs_dz
                    && tag.charge() * probe.charge() == -1
                    && mass > self.config.pair_min_inv_mass
                    && mass < self.config.pair_max_inv_mass
                    && pair_dr > self.config.pair_min_dr
                {
                    out.pairs.push((i_tag, i_probe));
                    // Just one probe per tag.
                    break;
                }
            }
        }

        out
    }

    fn tag_quality(&self, mu: &MuonCandidate<'_>) -> bool {
        let p4 = mu.p4();
        mu.is_global()
            && mu.is_tracker_arb()
            && mu.norm_chi2_glb() < 10.0
            && mu.n_matched_stations() >= 2
            && mu.n_sta_hits() > 0
            && mu.n_pixel_hits_trk() >= 1
            && mu.n_trk_layers_trk() >= 6
            && mu.rel_iso_glb() < self.config.tag_iso_cut
            && p4.pt() > self.config.tag_min_pt
    }

    fn probe_quality(&self, mu: &MuonCandidate<'_>) -> bool {
        (mu.is_tracker_arb() || mu.is_rpc())
            && mu.orig_algo() != ORIG_ALGO_STA_SEEDED
            && mu.n_pixel_hits_trk() >= self.config.probe_min_pixel_hits
            && mu.n_trk_layers_trk() >= self.config.probe_min_trk_layers
            && mu.rel_iso_trk() < self.config.probe_iso_cut
            && mu.p4().pt() > self.config.probe_min_pt
    }

    fn has_trigger(&self, mu: &MuonCandidate<'_>) -> bool {
        match self.hlt_filter_index {
            Some(idx) => match mu.hlt_dr(idx) {
                Some(dr) => dr < self.config.tag_hlt_dr_cut,
                None => false,
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Muon;

    fn config() -> TagAndProbeConfig {
        TagAndProbeConfig {
            tag_min_pt: 24.0,
            tag_iso_cut: 0.1,
            tag_hlt_filter: "L3fL1sMu22".into(),
            tag_hlt_dr_cut: 0.1,
            probe_min_pixel_hits: 1,
            probe_min_trk_layers: 6,
            probe_iso_cut: 0.2,
            probe_min_pt: 10.0,
            pair_max_abs_dz: 1.0,
            pair_min_inv_mass: 80.0,
            pair_max_inv_mass: 100.0,
            pair_min_dr: 0.4,
        }
    }

    fn filters() -> Vec<String> {
        vec!["hltDiMuon178Filtered".into(), "hltL3fL1sMu22Filtered".into()]
    }

    /// A muon passing both tag quality and trigger matching for `config()`.
    fn good_tag() -> Muon {
        Muon {
            px: 45.5,
            py: 0.0,
            pz: 3.0,
            charge: 1,
            is_global: true,
            is_tracker_arb: true,
            norm_chi2_glb: 1.5,
            n_matched_stations: 3,
            n_sta_hits: 12,
            n_pixel_hits_trk: 3,
            n_trk_layers_trk: 10,
            tk_iso_glb: 1.0,
            tk_iso_trk: 1.0,
            hlt_dr: vec![9.0, 0.02],
            ..Default::default()
        }
    }

    /// An opposite-charge muon passing probe quality, back to back with
    /// the tag (pair mass ~ 91 GeV).
    fn good_probe() -> Muon {
        Muon {
            px: -45.5,
            py: 0.0,
            pz: -3.0,
            charge: -1,
            is_tracker_arb: true,
            n_pixel_hits_trk: 2,
            n_trk_layers_trk: 9,
            n_pixel_hits_glb: 2,
            n_trk_hits_glb: 14,
            tk_iso_trk: 1.0,
            tk_iso_glb: 1.5,
            hlt_dr: vec![9.0, 9.0],
            ..Default::default()
        }
    }

    fn two_muon_event(tag: Muon, probe: Muon) -> MuonEvent {
        let mut ev = MuonEvent::new(1);
        ev.push(tag);
        ev.push(probe);
        ev
    }

    #[test]
    fn empty_event_yields_nothing() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let out = sel.tnp_selection(&MuonEvent::new(1));
        assert!(out.pairs.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn resolves_first_matching_filter() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        assert_eq!(sel.hlt_filter_index(), Some(1));
    }

    #[test]
    fn accepts_z_like_pair() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let out = sel.tnp_selection(&two_muon_event(good_tag(), good_probe()));

        assert_eq!(out.pairs, vec![(0, 1)]);
        // 5 pre-cut probe diagnostics + 3 pair diagnostics.
        assert_eq!(out.diagnostics.len(), 8);
        assert!(matches!(out.diagnostics[0], Diagnostic::ProbePixelHits(v) if v == 2.0));
        assert!(matches!(out.diagnostics[1], Diagnostic::ProbeTrackerHits(v) if v == 14.0));
        assert!(matches!(out.diagnostics[2], Diagnostic::ProbeRpcLayers(v) if v == 0.0));
        assert!(
            matches!(out.diagnostics[5], Diagnostic::PairMass(m) if (m - 91.0).abs() < 0.5)
        );
    }

    #[test]
    fn same_sign_pair_rejected_but_diagnostics_kept() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut probe = good_probe();
        probe.charge = 1;
        let out = sel.tnp_selection(&two_muon_event(good_tag(), probe));

        assert!(out.pairs.is_empty());
        // Charge cut gates only the pair, not the measurements.
        assert_eq!(out.diagnostics.len(), 8);
    }

    #[test]
    fn failed_tag_emits_no_diagnostics() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut tag = good_tag();
        tag.is_global = false;
        let out = sel.tnp_selection(&two_muon_event(tag, good_probe()));

        assert!(out.pairs.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn unmatched_trigger_filter_disables_tags() {
        let cfg = config();
        let sel = Selector::new(&cfg, &["hltSomethingElse".to_string()]);
        assert_eq!(sel.hlt_filter_index(), None);
        let out = sel.tnp_selection(&two_muon_event(good_tag(), good_probe()));
        assert!(out.pairs.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn trigger_distance_above_cut_rejects_tag() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut tag = good_tag();
        tag.hlt_dr = vec![9.0, 0.5];
        let out = sel.tnp_selection(&two_muon_event(tag, good_probe()));
        assert!(out.pairs.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn failed_probe_quality_keeps_precut_diagnostics_only() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut probe = good_probe();
        probe.orig_algo = 14; // STA-seeded track
        let out = sel.tnp_selection(&two_muon_event(good_tag(), probe));

        assert!(out.pairs.is_empty());
        assert_eq!(out.diagnostics.len(), 5);
        assert!(matches!(out.diagnostics[4], Diagnostic::ProbeOrigAlgo(v) if v == 14.0));
    }

    #[test]
    fn first_probe_by_index_wins() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut ev = MuonEvent::new(1);
        ev.push(good_tag());
        ev.push(good_probe());
        ev.push(good_probe());
        let out = sel.tnp_selection(&ev);
        assert_eq!(out.pairs, vec![(0, 1)]);
    }

    #[test]
    fn probe_may_serve_two_tags() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut ev = MuonEvent::new(1);
        // Two tags (both also probe-quality failures for each other is
        // irrelevant here), one shared good probe at index 2.
        let mut tag2 = good_tag();
        tag2.py = 1.0;
        ev.push(good_tag());
        ev.push(tag2);
        ev.push(good_probe());
        let out = sel.tnp_selection(&ev);
        // Not deduplicated: index 2 pairs with both tags.
        assert!(out.pairs.contains(&(0, 2)));
        assert!(out.pairs.contains(&(1, 2)));
    }

    #[test]
    fn selector_is_idempotent() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let ev = two_muon_event(good_tag(), good_probe());
        let a = sel.tnp_selection(&ev);
        let b = sel.tnp_selection(&ev);
        assert_eq!(a.pairs, b.pairs);
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn mass_window_rejects_low_mass_pair() {
        let cfg = config();
        let sel = Selector::new(&cfg, &filters());
        let mut probe = good_probe();
        probe.px = -20.0; // softer leg, mass well below 80
        probe.pz = -1.0;
        let out = sel.tnp_selection(&two_muon_event(good_tag(), probe));
        assert!(out.pairs.is_empty());
        assert_eq!(out.diagnostics.len(), 8);
    }
}
