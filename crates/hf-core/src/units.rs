//! Dimensioned inputs.
//!
//! Material and injection parameters enter the crates as `uom` quantities so
//! a case file cannot mix up gigapascals and pascals. The numerical kernels
//! strip the dimension once, through [`si`], and work on plain `f64` after
//! that.

use uom::si::f64::{DynamicViscosity, Pressure as UomPressure, VolumeRate as UomVolumeRate};

pub type Pressure = UomPressure;
pub type DynVisc = DynamicViscosity;
pub type VolumeRate = UomVolumeRate;

/// Moduli are quoted in GPa.
#[inline]
pub fn gpa(v: f64) -> Pressure {
    Pressure::new::<uom::si::pressure::gigapascal>(v)
}

#[inline]
pub fn pa_s(v: f64) -> DynVisc {
    DynVisc::new::<uom::si::dynamic_viscosity::pascal_second>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    VolumeRate::new::<uom::si::volume_rate::cubic_meter_per_second>(v)
}

/// Base-unit magnitudes.
pub mod si {
    use super::{DynVisc, Pressure, VolumeRate};

    #[inline]
    pub fn pascals(p: Pressure) -> f64 {
        p.get::<uom::si::pressure::pascal>()
    }

    #[inline]
    pub fn pascal_seconds(mu: DynVisc) -> f64 {
        mu.get::<uom::si::dynamic_viscosity::pascal_second>()
    }

    #[inline]
    pub fn cubic_meters_per_second(q: VolumeRate) -> f64 {
        q.get::<uom::si::volume_rate::cubic_meter_per_second>()
    }
}
