//! Number formatting matching what OpenVSLAM configs have always contained.
//!
//! Values are written with a fixed number of significant digits, switching
//! to scientific notation for very large or small magnitudes (`%g` rules).

/// Format `value` with `precision` significant digits, `%g` style.
pub fn general(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // Round once in scientific form to learn the decimal exponent after rounding.
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Six fixed decimals.
pub fn fixed6(value: f64) -> String {
    format!("{value:.6}")
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_trims_and_rounds() {
        assert_eq!(general(15.0, 10), "15");
        assert_eq!(general(1.2, 2), "1.2");
        assert_eq!(general(1210.123456789, 10), "1210.123457");
        assert_eq!(general(-0.1234567891234, 10), "-0.1234567891");
        assert_eq!(general(640.0, 10), "640");
        assert_eq!(general(0.0, 10), "0");
    }

    #[test]
    fn general_switches_to_scientific() {
        assert_eq!(general(0.00001234, 10), "1.234e-05");
        assert_eq!(general(12345.0, 2), "1.2e+04");
        assert_eq!(general(99.96, 3), "100");
        assert_eq!(general(999.6, 3), "1e+03");
    }

    #[test]
    fn fixed_uses_six_decimals() {
        assert_eq!(fixed6(1.0), "1.000000");
        assert_eq!(fixed6(-0.0123456789), "-0.012346");
    }
}
