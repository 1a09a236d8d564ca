//! Configuration loading: sectioned key-value file, routed by section name.
//!
//! The file is TOML; every top-level table is a section. A section whose
//! name contains `"TagAndProbe"` carries the selection thresholds, every
//! other section carries sample/run settings (the last one wins). Parse
//! failures are fatal and abort before any event is processed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TnpError};

/// Tag, probe and pair-level selection thresholds.
///
/// Field renames keep the key spellings used by the ntuple production
/// configs, so existing files keep working.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagAndProbeConfig {
    /// Minimum tag transverse momentum (GeV).
    #[serde(rename = "tag_minPt")]
    pub tag_min_pt: f64,
    /// Maximum tag relative track isolation.
    #[serde(rename = "tag_isoCut")]
    pub tag_iso_cut: f64,
    /// Substring matched against the configured HLT filter names.
    #[serde(rename = "tag_hltFilter")]
    pub tag_hlt_filter: String,
    /// Maximum trigger-match distance for the resolved filter.
    #[serde(rename = "tag_hltDrCut")]
    pub tag_hlt_dr_cut: f64,

    /// Minimum probe pixel hits.
    #[serde(rename = "probe_minPixelHits")]
    pub probe_min_pixel_hits: i32,
    /// Minimum probe tracker layers.
    #[serde(rename = "probe_minTrkLayers")]
    pub probe_min_trk_layers: i32,
    /// Maximum probe relative track isolation.
    #[serde(rename = "probe_isoCut")]
    pub probe_iso_cut: f64,
    /// Minimum probe transverse momentum (GeV).
    #[serde(rename = "probe_minPt")]
    pub probe_min_pt: f64,

    /// Maximum |dz(tag) - dz(probe)| (cm).
    #[serde(rename = "pair_maxAbsDz")]
    pub pair_max_abs_dz: f64,
    /// Lower edge of the accepted pair invariant mass window (GeV).
    #[serde(rename = "pair_minInvMass")]
    pub pair_min_inv_mass: f64,
    /// Upper edge of the accepted pair invariant mass window (GeV).
    #[serde(rename = "pair_maxInvMass")]
    pub pair_max_inv_mass: f64,
    /// Minimum tag-probe angular separation.
    #[serde(rename = "pair_minDr")]
    pub pair_min_dr: f64,
}

/// Input/output locations, event cap and run filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleConfig {
    /// Input ntuple path (JSON lines).
    #[serde(rename = "fileName")]
    pub file_name: PathBuf,
    /// Output path for the finalized histogram set.
    #[serde(rename = "outputFileName")]
    pub output_file_name: PathBuf,
    /// Event cap; zero or negative means unlimited.
    #[serde(rename = "nEvents", default)]
    pub n_events: i64,
    /// Accepted run numbers. Empty, or containing the `0` sentinel,
    /// accepts every run.
    #[serde(default)]
    pub runs: Vec<u32>,
}

impl SampleConfig {
    /// Run-filter predicate of the event loop.
    pub fn accepts_run(&self, run: u32) -> bool {
        self.runs.is_empty() || self.runs.iter().any(|&r| r == 0 || r == run)
    }
}

/// Both configuration groups, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Selection thresholds.
    pub tnp: TagAndProbeConfig,
    /// Sample and run settings.
    pub sample: SampleConfig,
}

/// Load and route the configuration file.
pub fn load(path: &Path) -> Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| config_err(path, &e))?;
    let table: toml::Table = text.parse().map_err(|e| config_err(path, &e))?;

    let mut tnp: Option<TagAndProbeConfig> = None;
    let mut sample: Option<SampleConfig> = None;

    for (name, value) in table {
        if !value.is_table() {
            return Err(config_err(path, &format!("top-level key '{name}' is not a section")));
        }
        if name.contains("TagAndProbe") {
            tnp = Some(value.try_into().map_err(|e| config_err(path, &e))?);
        } else {
            // Several sample sections are legal; the last one wins.
            sample = Some(value.try_into().map_err(|e| config_err(path, &e))?);
        }
    }

    let tnp = tnp.ok_or_else(|| config_err(path, &"no [*TagAndProbe*] section found"))?;
    let sample = sample.ok_or_else(|| config_err(path, &"no sample section found"))?;
    Ok(AnalysisConfig { tnp, sample })
}

fn config_err(path: &Path, message: &dyn fmt::Display) -> TnpError {
    TnpError::Config { path: path.display().to_string(), message: message.to_string() }
}
