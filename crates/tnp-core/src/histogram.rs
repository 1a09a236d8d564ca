//! Uniform-binning accumulators for the output distributions.

use serde::Serialize;

/// A 1D histogram with uniform bins and explicit flow counters.
#[derive(Debug, Clone, Serialize)]
pub struct Hist1D {
    /// Axis title, `variable;x label;y label` style.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub bins: usize,
    /// Lower edge of the first bin.
    pub lo: f64,
    /// Upper edge of the last bin.
    pub hi: f64,
    /// Bin contents (length = `bins`).
    pub content: Vec<f64>,
    /// Sum of entries below `lo`.
    pub underflow: f64,
    /// Sum of entries at or above `hi`.
    pub overflow: f64,
    /// Total fill calls, flows included.
    pub entries: u64,
}

impl Hist1D {
    /// Book an empty histogram.
    pub fn new(title: &str, bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            title: title.to_string(),
            bins,
            lo,
            hi,
            content: vec![0.0; bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Add one entry. Out-of-range values land in the flow counters.
    pub fn fill(&mut self, x: f64) {
        self.entries += 1;
        match bin_index(x, self.bins, self.lo, self.hi) {
            BinLocation::Under => self.underflow += 1.0,
            BinLocation::Over => self.overflow += 1.0,
            BinLocation::Bin(b) => self.content[b] += 1.0,
        }
    }
}

/// A 2D histogram with uniform bins on both axes.
#[derive(Debug, Clone, Serialize)]
pub struct Hist2D {
    /// Axis title.
    pub title: String,
    /// Number of x bins.
    pub x_bins: usize,
    /// Lower x edge.
    pub x_lo: f64,
    /// Upper x edge.
    pub x_hi: f64,
    /// Number of y bins.
    pub y_bins: usize,
    /// Lower y edge.
    pub y_lo: f64,
    /// Upper y edge.
    pub y_hi: f64,
    /// Row-major contents (length = `x_bins * y_bins`), x fastest.
    pub content: Vec<f64>,
    /// Entries falling outside either axis range.
    pub flow: f64,
    /// Total fill calls, flows included.
    pub entries: u64,
}

impl Hist2D {
    /// Book an empty histogram.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: &str,
        x_bins: usize,
        x_lo: f64,
        x_hi: f64,
        y_bins: usize,
        y_lo: f64,
        y_hi: f64,
    ) -> Self {
        Self {
            title: title.to_string(),
            x_bins,
            x_lo,
            x_hi,
            y_bins,
            y_lo,
            y_hi,
            content: vec![0.0; x_bins * y_bins],
            flow: 0.0,
            entries: 0,
        }
    }

    /// Add one entry.
    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        let bx = bin_index(x, self.x_bins, self.x_lo, self.x_hi);
        let by = bin_index(y, self.y_bins, self.y_lo, self.y_hi);
        match (bx, by) {
            (BinLocation::Bin(i), BinLocation::Bin(j)) => {
                self.content[j * self.x_bins + i] += 1.0;
            }
            _ => self.flow += 1.0,
        }
    }

    /// Content of bin (ix, iy).
    pub fn bin(&self, ix: usize, iy: usize) -> f64 {
        self.content[iy * self.x_bins + ix]
    }
}

enum BinLocation {
    Under,
    Over,
    Bin(usize),
}

fn bin_index(x: f64, bins: usize, lo: f64, hi: f64) -> BinLocation {
    if x < lo {
        return BinLocation::Under;
    }
    if x >= hi {
        return BinLocation::Over;
    }
    let width = (hi - lo) / bins as f64;
    let b = ((x - lo) / width) as usize;
    // Guard against the last-edge rounding case.
    BinLocation::Bin(b.min(bins - 1))
}
