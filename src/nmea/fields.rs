// src/nmea/fields.rs
//! Field conversions applied by sentence schemas.
//!
//! Every conversion takes the raw ASCII field and either produces a typed
//! value or fails with [`NmeaError::Decode`]. Optional numeric fields map the
//! empty string to `None`, so a missing value is never confused with zero.

use crate::error::{NmeaError, Result};
use chrono::{NaiveDate, NaiveTime};

/// Pass-through text field.
pub fn text(source: &str) -> String {
    source.to_string()
}

/// Text field where empty means absent.
pub fn ntext(source: &str) -> Option<String> {
    if source.is_empty() {
        None
    } else {
        Some(source.to_string())
    }
}

/// Optional float.
pub fn nfloat(source: &str) -> Result<Option<f64>> {
    if source.is_empty() {
        return Ok(None);
    }
    match source.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(NmeaError::Decode(format!("not a number: {:?}", source))),
    }
}

/// Optional unsigned integer.
pub fn nint(source: &str) -> Result<Option<u32>> {
    if source.is_empty() {
        return Ok(None);
    }
    source
        .parse::<u32>()
        .map(Some)
        .map_err(|_| NmeaError::Decode(format!("not an integer: {:?}", source)))
}

/// Optional signed integer, used for time zone offsets.
pub fn nsigned(source: &str) -> Result<Option<i32>> {
    if source.is_empty() {
        return Ok(None);
    }
    source
        .parse::<i32>()
        .map(Some)
        .map_err(|_| NmeaError::Decode(format!("not an integer: {:?}", source)))
}

/// `HHMMSS[.sss]` time of day.
pub fn utc_time(source: &str) -> Result<Option<NaiveTime>> {
    if source.is_empty() {
        return Ok(None);
    }
    let bad = || NmeaError::Decode(format!("bad UTC time: {:?}", source));

    let (whole, fraction) = match source.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (source, None),
    };
    if whole.len() != 6 || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hour: u32 = whole[0..2].parse().map_err(|_| bad())?;
    let minute: u32 = whole[2..4].parse().map_err(|_| bad())?;
    let second: u32 = whole[4..6].parse().map_err(|_| bad())?;

    let nanos = match fraction {
        None | Some("") => 0,
        Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => {
            let fraction: f64 = format!("0.{}", digits).parse().map_err(|_| bad())?;
            ((fraction * 1e9).round() as u32).min(999_999_999)
        }
        Some(_) => return Err(bad()),
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .filter(|_| second < 60)
        .map(Some)
        .ok_or_else(bad)
}

/// `DDMMYY` calendar date. Two-digit years 80..99 are 19xx, the rest 20xx.
pub fn utc_date(source: &str) -> Result<Option<NaiveDate>> {
    if source.is_empty() {
        return Ok(None);
    }
    let bad = || NmeaError::Decode(format!("bad UTC date: {:?}", source));

    if source.len() != 6 || !source.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let day: u32 = source[0..2].parse().map_err(|_| bad())?;
    let month: u32 = source[2..4].parse().map_err(|_| bad())?;
    let yy: i32 = source[4..6].parse().map_err(|_| bad())?;
    let year = if yy >= 80 { 1900 + yy } else { 2000 + yy };

    NaiveDate::from_ymd_opt(year, month, day).map(Some).ok_or_else(bad)
}

/// Latitude `DDMM.mmmm` with `N`/`S` hemisphere, as signed decimal degrees.
pub fn lat(value: &str, hemisphere: &str) -> Result<Option<f64>> {
    angle(value, hemisphere, 2, 90.0, ('N', 'S'), "latitude")
}

/// Longitude `DDDMM.mmmm` with `E`/`W` hemisphere, as signed decimal degrees.
pub fn lon(value: &str, hemisphere: &str) -> Result<Option<f64>> {
    angle(value, hemisphere, 3, 180.0, ('E', 'W'), "longitude")
}

fn angle(
    value: &str,
    hemisphere: &str,
    degree_digits: usize,
    max_degrees: f64,
    (positive, negative): (char, char),
    what: &str,
) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }
    let bad = || NmeaError::Decode(format!("bad {}: {:?} {:?}", what, value, hemisphere));

    if value.len() <= degree_digits
        || !value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        || !value.as_bytes()[..degree_digits].iter().all(u8::is_ascii_digit)
    {
        return Err(bad());
    }
    let degrees: f64 = value[..degree_digits].parse().map_err(|_| bad())?;
    let minutes: f64 = value[degree_digits..].parse().map_err(|_| bad())?;
    if minutes >= 60.0 {
        return Err(bad());
    }
    let magnitude = degrees + minutes / 60.0;
    if magnitude > max_degrees {
        return Err(bad());
    }

    let mut chars = hemisphere.chars();
    let sign = match (chars.next().map(|c| c.to_ascii_uppercase()), chars.next()) {
        (Some(c), None) if c == positive => 1.0,
        (Some(c), None) if c == negative => -1.0,
        _ => return Err(bad()),
    };
    Ok(Some(sign * magnitude))
}

/// Render signed decimal degrees as `DDMM.mmmm` and hemisphere.
pub fn encode_lat(degrees: f64) -> (String, &'static str) {
    let hemisphere = if degrees < 0.0 { "S" } else { "N" };
    (encode_angle(degrees.abs(), 2), hemisphere)
}

/// Render signed decimal degrees as `DDDMM.mmmm` and hemisphere.
pub fn encode_lon(degrees: f64) -> (String, &'static str) {
    let hemisphere = if degrees < 0.0 { "W" } else { "E" };
    (encode_angle(degrees.abs(), 3), hemisphere)
}

fn encode_angle(magnitude: f64, degree_digits: usize) -> String {
    // Round once in ten-thousandths of a minute so 59.99999' carries into the degree.
    let total = (magnitude * 60.0 * 10_000.0).round() as u64;
    let degrees = total / 600_000;
    let minutes = (total % 600_000) as f64 / 10_000.0;
    format!("{:0width$}{:07.4}", degrees, minutes, width = degree_digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_latitude_conversion() {
        let north = lat("2542.9243", "N").unwrap().unwrap();
        assert!((north - 25.715405).abs() < 1e-6);
        let south = lat("2542.9243", "S").unwrap().unwrap();
        assert!((south + 25.715405).abs() < 1e-6);
    }

    #[test]
    fn test_longitude_conversion() {
        let west = lon("08013.6310", "W").unwrap().unwrap();
        assert!((west + 80.227183).abs() < 1e-6);
        let east = lon("00027.58", "e").unwrap().unwrap();
        assert!((east - 0.459667).abs() < 1e-6);
    }

    #[test]
    fn test_angle_rejects_garbage() {
        assert!(lat("25X2.9243", "N").is_err());
        assert!(lat("2542.9243", "E").is_err());
        assert!(lat("2542.9243", "").is_err());
        assert!(lat("2575.0000", "N").is_err());
        assert!(lon("nan", "W").is_err());
        assert!(lat("9130.0000", "N").is_err());
    }

    #[test]
    fn test_empty_angle_is_absent() {
        assert_eq!(lat("", "").unwrap(), None);
        assert_eq!(lon("", "W").unwrap(), None);
    }

    #[test]
    fn test_optional_numbers() {
        assert_eq!(nfloat("").unwrap(), None);
        assert_eq!(nfloat("0").unwrap(), Some(0.0));
        assert_eq!(nfloat("123.45").unwrap(), Some(123.45));
        assert!(nfloat("inf").is_err());
        assert_eq!(nint("").unwrap(), None);
        assert_eq!(nint("06").unwrap(), Some(6));
        assert!(nint("1.5").is_err());
        assert_eq!(nsigned("-05").unwrap(), Some(-5));
    }

    #[test]
    fn test_utc_time() {
        let time = utc_time("162823.000").unwrap().unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (16, 28, 23));
        let time = utc_time("123456.25").unwrap().unwrap();
        assert_eq!(time.nanosecond(), 250_000_000);
        assert_eq!(utc_time("").unwrap(), None);
        assert!(utc_time("256000").is_err());
        assert!(utc_time("1234").is_err());
    }

    #[test]
    fn test_utc_date() {
        assert_eq!(utc_date("180214").unwrap(), NaiveDate::from_ymd_opt(2014, 2, 18));
        assert_eq!(utc_date("230394").unwrap(), NaiveDate::from_ymd_opt(1994, 3, 23));
        assert!(utc_date("310214").is_err());
        assert_eq!(utc_date("").unwrap(), None);
    }

    #[test]
    fn test_encode_angles() {
        assert_eq!(encode_lat(25.715405), ("2542.9243".to_string(), "N"));
        assert_eq!(encode_lon(-0.459667), ("00027.5800".to_string(), "W"));
        assert_eq!(encode_lat(-37.999999999), ("3800.0000".to_string(), "S"));
    }
}
