use crate::models::geothermal::borefield::core::Ground;

/// Depth integrals of the regularized line-source kernel for one borehole.
///
/// For a borehole of length `H` observed at depth `z` and radius `R_w`:
///
/// ```text
/// direct = ∫₀ᴴ  (R_w² + (z − z₀)²)^(−½) dz₀ = asinh(z/R_w) − asinh((z − H)/R_w)
/// mirror = ∫₋ᴴ⁰ (R_w² + (z − z₀)²)^(−½) dz₀ = asinh((z + H)/R_w) − asinh(z/R_w)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfIntegrals {
    pub direct: f64,
    pub mirror: f64,
}

impl SelfIntegrals {
    /// Evaluates both integrals in closed form.
    #[must_use]
    pub fn new(length: f64, depth: f64, radius: f64) -> Self {
        let at_depth = (depth / radius).asinh();
        Self {
            direct: at_depth - ((depth - length) / radius).asinh(),
            mirror: ((depth + length) / radius).asinh() - at_depth,
        }
    }

    /// Real source minus its mirror image.
    #[must_use]
    pub fn net(&self) -> f64 {
        self.direct - self.mirror
    }
}

/// Temperature change (K) at a borehole's own axis caused by its own extraction.
#[must_use]
pub fn self_temperature_change(rate: f64, integrals: &SelfIntegrals, ground: &Ground) -> f64 {
    rate * ground.line_source_scale() * integrals.net()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::geothermal::borefield::core::test_support::default_ground;

    /// Composite Simpson rule with `n` (even) intervals.
    fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        let inner: f64 = (1..n)
            .map(|k| {
                let weight = if k % 2 == 1 { 4.0 } else { 2.0 };
                weight * f(a + k as f64 * h)
            })
            .sum();
        (f(a) + f(b) + inner) * h / 3.0
    }

    #[test]
    fn closed_form_matches_quadrature() {
        // Inside, at the ends of, above and below the borehole.
        let cases = [
            (80.0, 40.0, 0.1),
            (80.0, 0.0, 0.1),
            (80.0, 80.0, 0.1),
            (80.0, 120.0, 0.1),
            (50.0, -5.0, 0.1),
            (100.0, 30.0, 0.5),
            (60.0, 75.0, 1.0),
        ];

        for (length, depth, radius) in cases {
            let kernel = |z0: f64| 1.0 / (radius * radius + (depth - z0) * (depth - z0)).sqrt();
            let direct = simpson(kernel, 0.0, length, 200_000);
            let mirror = simpson(kernel, -length, 0.0, 200_000);

            let closed = SelfIntegrals::new(length, depth, radius);
            assert_relative_eq!(closed.direct, direct, epsilon = 1e-6);
            assert_relative_eq!(closed.mirror, mirror, epsilon = 1e-6);
        }
    }

    #[test]
    fn vanishes_at_the_surface() {
        let integrals = SelfIntegrals::new(80.0, 0.0, 0.1);
        assert_relative_eq!(integrals.net(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_in_rate() {
        let ground = default_ground();
        let integrals = SelfIntegrals::new(80.0, 40.0, 0.1);

        let base = self_temperature_change(10.0, &integrals, &ground);
        assert!(base > 0.0);
        assert_relative_eq!(
            self_temperature_change(35.0, &integrals, &ground),
            3.5 * base,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            self_temperature_change(-10.0, &integrals, &ground),
            -base,
            max_relative = 1e-12
        );
    }
}
