use uom::si::{angle::degree, f64::Angle, f64::Velocity, velocity::meter_per_second};

use super::{Borehole, Ground, GroundProperties};

/// An 80 m borehole.
pub(super) fn borehole(x: f64, y: f64, rate: f64) -> Borehole {
    Borehole::new(x, y, 80.0, rate).unwrap()
}

/// Three 80 m boreholes 10 m apart along x, each at 10 W/m.
pub(super) fn row_of_three() -> Vec<Borehole> {
    vec![
        borehole(0.0, 0.0, 10.0),
        borehole(10.0, 0.0, 10.0),
        borehole(20.0, 0.0, 10.0),
    ]
}

/// Default ground with groundwater flow.
pub(super) fn default_ground() -> Ground {
    Ground::new(&GroundProperties::default()).unwrap()
}

/// Default thermal properties without groundwater flow.
pub(super) fn still_ground() -> Ground {
    Ground::new(&GroundProperties {
        seepage_velocity: Velocity::new::<meter_per_second>(0.0),
        flow_direction: Angle::new::<degree>(0.0),
        ..GroundProperties::default()
    })
    .unwrap()
}
