//! Number formatting for status readouts.

/// Largest denominator tried before falling back to decimal notation.
const MAX_DENOMINATOR: u64 = 1 << 20;

/// Format `x` as an integer or a fraction `n/d` when one exists within
/// `epsilon`; otherwise as a decimal with four places.
///
/// Samples-per-pixel values are powers of two, so `0.25` reads `1/4`.
pub fn rationalize(x: f64, epsilon: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    if (x - x.round()).abs() <= epsilon {
        return format!("{:.0}", x);
    }

    for denominator in 1..=MAX_DENOMINATOR {
        let numerator = (x * denominator as f64).round();
        if (x - numerator / denominator as f64).abs() <= epsilon {
            return format!("{numerator:.0}/{denominator}");
        }
    }
    format!("{x:.4}")
}
