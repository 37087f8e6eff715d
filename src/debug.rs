use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

/// Formats `f` with at most nine significant digits.
pub fn format_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

fn format_polar(z: &Complex64) -> String {
    format!(
        "{}\u{2220}{}\u{00B0}",
        format_f64(z.norm()),
        format_f64(z.arg().to_degrees())
    )
}

pub fn format_polar_vec(v: &[Complex64]) -> String {
    let a: Vec<String> = v.iter().map(format_polar).collect();
    format!("[{}]", a.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_f64() {
        assert_eq!(format_f64(1.0), "1");
        assert_eq!(format_f64(0.25), "0.25");
    }

    #[test]
    fn test_format_polar_vec() {
        let v = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 2.0)];
        assert_eq!(format_polar_vec(&v), "[1\u{2220}0\u{00B0}, 2\u{2220}90\u{00B0}]");
    }
}
