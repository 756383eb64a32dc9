/// Free-text latitude/longitude normalization for `lat_lon` qualifiers
use once_cell::sync::Lazy;
use regex::Regex;

/// `"12.3, -45.6"`, `"12.3;-45.6"`, `"12.3/-45.6"`
static DECIMAL_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?[0-9]+(?:\.[0-9]+)?)\s*[,;/]\s*([+-]?[0-9]+(?:\.[0-9]+)?)\s*$")
        .expect("decimal pair pattern")
});

/// `"36.5 N 121.9 W"`, `"36.5N, 121.9W"`
static HEMISPHERE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*([NSns])[^0-9\-+]+([0-9]+(?:\.[0-9]+)?)\s*([EWew])")
        .expect("hemisphere pair pattern")
});

/// Parse a raw coordinate string into `(latitude, longitude)`.
///
/// Returns two empty strings when the input is empty or matches neither
/// recognized form. Decimal pairs are returned verbatim; hemisphere forms are
/// re-rendered as signed decimals (`S` and `W` negate).
pub fn parse_lat_lon(raw: &str) -> (String, String) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(caps) = DECIMAL_PAIR.captures(raw) {
        return (caps[1].to_string(), caps[2].to_string());
    }

    if let Some(caps) = HEMISPHERE_PAIR.captures(raw) {
        let (Ok(mut lat), Ok(mut lon)) = (caps[1].parse::<f64>(), caps[3].parse::<f64>()) else {
            return (String::new(), String::new());
        };
        if caps[2].eq_ignore_ascii_case("s") {
            lat = -lat;
        }
        if caps[4].eq_ignore_ascii_case("w") {
            lon = -lon;
        }
        return (format_degrees(lat), format_degrees(lon));
    }

    (String::new(), String::new())
}

/// Parse a raw coordinate string straight to numbers, if both parts are present.
pub fn parse_lat_lon_f64(raw: &str) -> Option<(f64, f64)> {
    let (lat, lon) = parse_lat_lon(raw);
    if lat.is_empty() || lon.is_empty() {
        return None;
    }
    Some((lat.parse().ok()?, lon.parse().ok()?))
}

/// Whole degrees keep one decimal place so `12 N` renders as `12.0`.
fn format_degrees(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("12.3,-45.6", "12.3", "-45.6" ; "comma separated")]
    #[test_case(" 12.3 ; -45.6 ", "12.3", "-45.6" ; "semicolon with padding")]
    #[test_case("+36.5/-121.9", "+36.5", "-121.9" ; "slash keeps sign verbatim")]
    #[test_case("12.3 N 45.6 W", "12.3", "-45.6" ; "north west")]
    #[test_case("33.1 s 151.2 e", "-33.1", "151.2" ; "lowercase south east")]
    #[test_case("36.5N, 121.9W", "36.5", "-121.9" ; "compact hemisphere")]
    #[test_case("48 N 123 W", "48.0", "-123.0" ; "whole degrees")]
    fn test_parse_lat_lon(input: &str, lat: &str, lon: &str) {
        assert_eq!(parse_lat_lon(input), (lat.to_string(), lon.to_string()));
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("garbage" ; "garbage")]
    #[test_case("missing" ; "missing placeholder")]
    #[test_case("12.3" ; "single value")]
    fn test_unparseable_input_is_empty(input: &str) {
        assert_eq!(parse_lat_lon(input), (String::new(), String::new()));
    }

    #[test]
    fn test_parse_lat_lon_f64() {
        assert_eq!(parse_lat_lon_f64("36.5 N 121.9 W"), Some((36.5, -121.9)));
        assert_eq!(parse_lat_lon_f64("not a place"), None);
    }
}
