//! Minimal four-momentum arithmetic for pair observables.

use std::ops::Add;

/// PDG muon mass in GeV, rounded as in the ntuple production code.
pub const MUON_MASS_GEV: f64 = 0.106;

/// A massive-particle four-momentum (px, py, pz, E), all in GeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourMomentum {
    /// x momentum component.
    pub px: f64,
    /// y momentum component.
    pub py: f64,
    /// z momentum component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Build from cartesian momentum components and a rest mass.
    pub fn from_xyzm(px: f64, py: f64, pz: f64, mass: f64) -> Self {
        let e = (px * px + py * py + pz * pz + mass * mass).sqrt();
        Self { px, py, pz, e }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// Pseudorapidity, `asinh(pz / pt)`.
    pub fn eta(&self) -> f64 {
        (self.pz / self.pt()).asinh()
    }

    /// Azimuthal angle in (-pi, pi].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// Invariant mass, `sqrt(E^2 - |p|^2)` (clamped at zero against
    /// floating-point cancellation).
    pub fn mass(&self) -> f64 {
        let m2 = self.e * self.e - self.px * self.px - self.py * self.py - self.pz * self.pz;
        m2.max(0.0).sqrt()
    }

    /// Angular separation `sqrt(d_eta^2 + d_phi^2)` with d_phi wrapped
    /// into (-pi, pi].
    pub fn delta_r(&self, other: &FourMomentum) -> f64 {
        let d_eta = self.eta() - other.eta();
        let d_phi = wrap_phi(self.phi() - other.phi());
        (d_eta * d_eta + d_phi * d_phi).sqrt()
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

/// Wrap an angle difference into (-pi, pi].
fn wrap_phi(mut d_phi: f64) -> f64 {
    while d_phi > std::f64::consts::PI {
        d_phi -= 2.0 * std::f64::consts::PI;
    }
    while d_phi <= -std::f64::consts::PI {
        d_phi += 2.0 * std::f64::consts::PI;
    }
    d_phi
}
