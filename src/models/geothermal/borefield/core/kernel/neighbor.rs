use crate::models::geothermal::borefield::core::{Borehole, Ground};

/// Bound on the advection exponent `−(v·Δ)/(2A)`.
///
/// Points far upstream or downstream of a source would otherwise overflow
/// the exponential. The bound is an approximation: beyond it the advective
/// weighting saturates.
pub const EXPONENT_CLIP: f64 = 1000.0;

/// Temperature change (K) at `(x, y)` for each depth in `depths`, summed over `sources`.
///
/// Each source is integrated over `z₀` on a shared 1 m grid running from the
/// surface to the longest source, with nodes at or beyond a source's own
/// `length + 1` masked out, using the trapezoidal rule. The integrand is the
/// moving line-source kernel `exp(−V_T·r/(2A))/r` minus its mirror image,
/// weighted by the advection factor `exp(clip(−(v·Δ)/(2A)))`. The factor is
/// folded into the kernel exponent, where the sum never exceeds zero.
///
/// An empty source list yields all zeros. The point must not coincide with
/// a source axis; use the self-term there instead.
#[must_use]
pub fn neighbor_temperature_change(
    x: f64,
    y: f64,
    depths: &[f64],
    sources: &[Borehole],
    ground: &Ground,
) -> Vec<f64> {
    let mut change = vec![0.0; depths.len()];

    let Some(max_length) = sources.iter().map(Borehole::length).reduce(f64::max) else {
        return change;
    };
    let nodes = (max_length + 1.0).ceil() as usize;

    let (vx, vy) = ground.flow_vector();
    let decay = ground.advective_velocity() / (2.0 * ground.diffusivity());
    let scale = ground.line_source_scale();

    for source in sources {
        let dx = x - source.x();
        let dy = y - source.y();
        let r_sq = dx * dx + dy * dy;
        let advection = (-(vx * dx + vy * dy) / (2.0 * ground.diffusivity()))
            .clamp(-EXPONENT_CLIP, EXPONENT_CLIP);

        let active = (0..nodes)
            .take_while(|&k| (k as f64) < source.length() + 1.0)
            .count();

        for (out, &z) in change.iter_mut().zip(depths) {
            let integral: f64 = (0..active)
                .map(|k| {
                    let z0 = k as f64;
                    let r = (r_sq + (z - z0) * (z - z0)).sqrt();
                    let r_mirror = (r_sq + (z + z0) * (z + z0)).sqrt();
                    let kernel = (advection - decay * r).exp() / r
                        - (advection - decay * r_mirror).exp() / r_mirror;

                    let weight = if k == 0 || k == nodes - 1 { 0.5 } else { 1.0 };
                    weight * kernel
                })
                .sum();

            *out += source.rate() * scale * integral;
        }
    }

    change
}
