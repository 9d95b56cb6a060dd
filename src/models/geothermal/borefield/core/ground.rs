//! Ground thermal and hydraulic parameters.

use std::f64::consts::PI;

use uom::si::{
    angle::degree,
    f64::{Angle, ThermalConductivity, Velocity, VolumetricHeatCapacity},
    thermal_conductivity::watt_per_meter_kelvin,
    velocity::meter_per_second,
    volumetric_heat_capacity::joule_per_cubic_meter_kelvin,
};

use crate::support::constraint::{Constrained, ConstraintResult, NonNegative, StrictlyPositive};

/// Volumetric heat capacity of groundwater, J/m³·K.
pub const WATER_VOLUMETRIC_HEAT_CAPACITY: f64 = 4.2e6;

/// Ground properties as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProperties {
    pub conductivity: ThermalConductivity,
    pub heat_capacity: VolumetricHeatCapacity,

    /// Darcy seepage velocity of the groundwater.
    pub seepage_velocity: Velocity,

    /// Compass direction of the groundwater flow.
    pub flow_direction: Angle,
}

impl Default for GroundProperties {
    fn default() -> Self {
        Self {
            conductivity: ThermalConductivity::new::<watt_per_meter_kelvin>(2.5),
            heat_capacity: VolumetricHeatCapacity::new::<joule_per_cubic_meter_kelvin>(2.5e6),
            seepage_velocity: Velocity::new::<meter_per_second>(1e-7),
            flow_direction: Angle::new::<degree>(30.0),
        }
    }
}

/// Derived ground parameters shared by every kernel evaluation.
///
/// Constructed once from [`GroundProperties`] and passed by reference into
/// kernel, field and optimizer calls. All values are SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    conductivity: f64,
    diffusivity: f64,
    advective_velocity: f64,
    flow_angle: f64,
}

impl Ground {
    /// Validates the properties and derives the kernel parameters.
    ///
    /// - diffusivity `A = λ / ρc`
    /// - advective velocity `V_T = u · ρc_w / ρc`
    /// - flow angle `(θ / 180 + 1) · π`, the compass angle turned by 180°
    ///
    /// # Errors
    ///
    /// Returns an error if the conductivity or heat capacity is not strictly
    /// positive, or if the seepage velocity is negative.
    pub fn new(props: &GroundProperties) -> ConstraintResult<Self> {
        let conductivity = Constrained::<_, StrictlyPositive>::new(props.conductivity)?
            .into_inner()
            .get::<watt_per_meter_kelvin>();
        let heat_capacity = Constrained::<_, StrictlyPositive>::new(props.heat_capacity)?
            .into_inner()
            .get::<joule_per_cubic_meter_kelvin>();
        let velocity = Constrained::<_, NonNegative>::new(props.seepage_velocity)?
            .into_inner()
            .get::<meter_per_second>();
        let theta = props.flow_direction.get::<degree>();

        Ok(Self {
            conductivity,
            diffusivity: conductivity / heat_capacity,
            advective_velocity: velocity * WATER_VOLUMETRIC_HEAT_CAPACITY / heat_capacity,
            flow_angle: (theta / 180.0 + 1.0) * PI,
        })
    }

    /// Thermal conductivity λ, W/m·K.
    #[must_use]
    pub fn conductivity(&self) -> f64 {
        self.conductivity
    }

    /// Thermal diffusivity A, m²/s.
    #[must_use]
    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// Advective heat transport velocity `V_T`, m/s.
    #[must_use]
    pub fn advective_velocity(&self) -> f64 {
        self.advective_velocity
    }

    /// Flow angle in radians.
    #[must_use]
    pub fn flow_angle(&self) -> f64 {
        self.flow_angle
    }

    /// Advective velocity components `(vx, vy)`.
    pub(crate) fn flow_vector(&self) -> (f64, f64) {
        let (sin, cos) = self.flow_angle.sin_cos();
        (
            self.advective_velocity * cos,
            self.advective_velocity * sin,
        )
    }

    /// Line-source prefactor `1 / (4πλ)`.
    pub(crate) fn line_source_scale(&self) -> f64 {
        1.0 / (4.0 * PI * self.conductivity)
    }
}
