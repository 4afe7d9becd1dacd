// src/nmea/sentence.rs
//! NMEA sentence model and decoder
//!
//! A [`Sentence`] keeps the talker, the sentence type and the raw fields it
//! was built from, plus [`SentenceData`] holding the typed attributes of the
//! supported kinds. The [`SentenceDecoder`] resolves the sentence type to a
//! schema once at construction and applies the schema's field conversions.

use super::fields::{lat, lon, nfloat, nint, nsigned, ntext, text, utc_date, utc_time};
use crate::error::{NmeaError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Supported sentence kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentenceKind {
    Unknown,
    Rmc,
    Gga,
    Gll,
    Gsa,
    Gsv,
    Vtg,
    Zda,
    Xte,
    Wpl,
    Rte,
}

/// Field count a schema accepts, not counting the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Later protocol revisions append optional trailing fields.
    Between(usize, usize),
    /// Fixed head followed by up to `max_groups` repeating groups.
    Groups { head: usize, group: usize, max_groups: usize },
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::Groups { head, group, max_groups } => {
                count >= head && (count - head) % group == 0 && (count - head) / group <= max_groups
            }
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::Groups { head, group, max_groups } => {
                write!(f, "{} plus up to {} groups of {}", head, max_groups, group)
            }
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

impl SentenceKind {
    pub const KNOWN: [SentenceKind; 10] = [
        SentenceKind::Rmc,
        SentenceKind::Gga,
        SentenceKind::Gll,
        SentenceKind::Gsa,
        SentenceKind::Gsv,
        SentenceKind::Vtg,
        SentenceKind::Zda,
        SentenceKind::Xte,
        SentenceKind::Wpl,
        SentenceKind::Rte,
    ];

    /// Sentence type identifier, without talker.
    pub fn tag(&self) -> &'static str {
        match self {
            SentenceKind::Unknown => "",
            SentenceKind::Rmc => "RMC",
            SentenceKind::Gga => "GGA",
            SentenceKind::Gll => "GLL",
            SentenceKind::Gsa => "GSA",
            SentenceKind::Gsv => "GSV",
            SentenceKind::Vtg => "VTG",
            SentenceKind::Zda => "ZDA",
            SentenceKind::Xte => "XTE",
            SentenceKind::Wpl => "WPL",
            SentenceKind::Rte => "RTE",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            SentenceKind::Unknown => Arity::AtLeast(0),
            SentenceKind::Rmc => Arity::Between(11, 13),
            SentenceKind::Gga => Arity::Exact(14),
            SentenceKind::Gll => Arity::Between(6, 7),
            SentenceKind::Gsa => Arity::Between(17, 18),
            SentenceKind::Gsv => Arity::Groups { head: 3, group: 4, max_groups: 4 },
            SentenceKind::Vtg => Arity::Between(8, 9),
            SentenceKind::Zda => Arity::Exact(6),
            SentenceKind::Xte => Arity::Between(5, 6),
            SentenceKind::Wpl => Arity::Exact(5),
            SentenceKind::Rte => Arity::AtLeast(4),
        }
    }
}

/// Recommended minimum navigation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rmc {
    pub time: Option<NaiveTime>,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
    pub date: Option<NaiveDate>,
    pub magnetic_variation: Option<f64>,
    pub variation_direction: Option<String>,
    pub mode: Option<String>,
}

impl Rmc {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            time: utc_time(f.at(0))?,
            status: text(f.at(1)),
            latitude: lat(f.at(2), f.at(3))?,
            longitude: lon(f.at(4), f.at(5))?,
            speed_knots: nfloat(f.at(6))?,
            course: nfloat(f.at(7))?,
            date: utc_date(f.at(8))?,
            magnetic_variation: nfloat(f.at(9))?,
            variation_direction: ntext(f.at(10)),
            mode: ntext(f.at(11)),
        })
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        Some(self.date?.and_time(self.time?))
    }

    pub fn is_valid(&self) -> bool {
        self.status == "A"
    }
}

/// Fix data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gga {
    pub time: Option<NaiveTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fix_quality: Option<u32>,
    pub satellites: Option<u32>,
    pub hdop: Option<f64>,
    pub altitude: Option<f64>,
    pub altitude_units: Option<String>,
    pub geoid_separation: Option<f64>,
    pub separation_units: Option<String>,
    pub dgps_age: Option<f64>,
    pub dgps_station: Option<String>,
}

impl Gga {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            time: utc_time(f.at(0))?,
            latitude: lat(f.at(1), f.at(2))?,
            longitude: lon(f.at(3), f.at(4))?,
            fix_quality: nint(f.at(5))?,
            satellites: nint(f.at(6))?,
            hdop: nfloat(f.at(7))?,
            altitude: nfloat(f.at(8))?,
            altitude_units: ntext(f.at(9)),
            geoid_separation: nfloat(f.at(10))?,
            separation_units: ntext(f.at(11)),
            dgps_age: nfloat(f.at(12))?,
            dgps_station: ntext(f.at(13)),
        })
    }
}

/// Geographic position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gll {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub time: Option<NaiveTime>,
    pub status: String,
    pub mode: Option<String>,
}

impl Gll {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            latitude: lat(f.at(0), f.at(1))?,
            longitude: lon(f.at(2), f.at(3))?,
            time: utc_time(f.at(4))?,
            status: text(f.at(5)),
            mode: ntext(f.at(6)),
        })
    }
}

/// DOP and active satellites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gsa {
    pub selection_mode: String,
    pub fix_type: Option<u32>,
    pub prns: Vec<u32>,
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub system_id: Option<u32>,
}

impl Gsa {
    fn from_fields(f: &Fields) -> Result<Self> {
        let mut prns = Vec::new();
        for i in 2..14 {
            if let Some(prn) = nint(f.at(i))? {
                prns.push(prn);
            }
        }
        Ok(Self {
            selection_mode: text(f.at(0)),
            fix_type: nint(f.at(1))?,
            prns,
            pdop: nfloat(f.at(14))?,
            hdop: nfloat(f.at(15))?,
            vdop: nfloat(f.at(16))?,
            system_id: nint(f.at(17))?,
        })
    }
}

/// One satellite block of a GSV sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteView {
    pub prn: u32,
    pub elevation: Option<u32>,
    pub azimuth: Option<u32>,
    pub snr: Option<u32>,
}

/// Satellites in view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gsv {
    pub total_messages: Option<u32>,
    pub message_number: Option<u32>,
    pub satellites_in_view: Option<u32>,
    pub satellites: Vec<SatelliteView>,
}

impl Gsv {
    fn from_fields(f: &Fields) -> Result<Self> {
        let mut satellites = Vec::new();
        let mut index = 3;
        while index + 3 < f.len() {
            if let Some(prn) = nint(f.at(index))? {
                satellites.push(SatelliteView {
                    prn,
                    elevation: nint(f.at(index + 1))?,
                    azimuth: nint(f.at(index + 2))?,
                    snr: nint(f.at(index + 3))?,
                });
            }
            index += 4;
        }
        Ok(Self {
            total_messages: nint(f.at(0))?,
            message_number: nint(f.at(1))?,
            satellites_in_view: nint(f.at(2))?,
            satellites,
        })
    }
}

/// Track made good and ground speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vtg {
    pub course_true: Option<f64>,
    pub course_magnetic: Option<f64>,
    pub speed_knots: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub mode: Option<String>,
}

impl Vtg {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            course_true: nfloat(f.at(0))?,
            course_magnetic: nfloat(f.at(2))?,
            speed_knots: nfloat(f.at(4))?,
            speed_kmh: nfloat(f.at(6))?,
            mode: ntext(f.at(8)),
        })
    }
}

/// UTC date and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zda {
    pub time: Option<NaiveTime>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub zone_hours: Option<i32>,
    pub zone_minutes: Option<i32>,
}

impl Zda {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            time: utc_time(f.at(0))?,
            day: nint(f.at(1))?,
            month: nint(f.at(2))?,
            year: nint(f.at(3))?,
            zone_hours: nsigned(f.at(4))?,
            zone_minutes: nsigned(f.at(5))?,
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year? as i32, self.month?, self.day?)
    }
}

/// Cross-track error, measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Xte {
    pub warning: String,
    pub cycle_lock: String,
    pub distance: Option<f64>,
    pub steer: Option<String>,
    pub units: Option<String>,
    pub mode: Option<String>,
}

impl Xte {
    fn from_fields(f: &Fields) -> Result<Self> {
        Ok(Self {
            warning: text(f.at(0)),
            cycle_lock: text(f.at(1)),
            distance: nfloat(f.at(2))?,
            steer: ntext(f.at(3)),
            units: ntext(f.at(4)),
            mode: ntext(f.at(5)),
        })
    }
}

/// Waypoint location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wpl {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl Wpl {
    fn from_fields(f: &Fields) -> Result<Self> {
        let latitude = lat(f.at(0), f.at(1))?;
        let longitude = lon(f.at(2), f.at(3))?;
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(Self {
                latitude,
                longitude,
                name: text(f.at(4)),
            }),
            _ => Err(NmeaError::Decode("waypoint without position".to_string())),
        }
    }
}

/// One segment of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rte {
    pub total: u32,
    pub sequence: u32,
    /// `c` for the active route, `w` when the list starts at the destination.
    pub mode: String,
    pub route: String,
    pub waypoints: Vec<String>,
}

impl Rte {
    fn from_fields(f: &Fields) -> Result<Self> {
        let total = nint(f.at(0))?
            .ok_or_else(|| NmeaError::Decode("route without segment count".to_string()))?;
        let sequence = nint(f.at(1))?
            .ok_or_else(|| NmeaError::Decode("route without sequence number".to_string()))?;
        if sequence == 0 || sequence > total {
            return Err(NmeaError::Decode(format!(
                "route segment {} outside 1..={}",
                sequence, total
            )));
        }
        Ok(Self {
            total,
            sequence,
            mode: text(f.at(2)),
            route: text(f.at(3)),
            waypoints: f.0[4..]
                .iter()
                .filter(|name| !name.is_empty())
                .cloned()
                .collect(),
        })
    }
}

/// Typed attributes of a decoded sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum SentenceData {
    Unknown,
    Rmc(Rmc),
    Gga(Gga),
    Gll(Gll),
    Gsa(Gsa),
    Gsv(Gsv),
    Vtg(Vtg),
    Zda(Zda),
    Xte(Xte),
    Wpl(Wpl),
    Rte(Rte),
}

impl SentenceData {
    pub fn kind(&self) -> SentenceKind {
        match self {
            SentenceData::Unknown => SentenceKind::Unknown,
            SentenceData::Rmc(_) => SentenceKind::Rmc,
            SentenceData::Gga(_) => SentenceKind::Gga,
            SentenceData::Gll(_) => SentenceKind::Gll,
            SentenceData::Gsa(_) => SentenceKind::Gsa,
            SentenceData::Gsv(_) => SentenceKind::Gsv,
            SentenceData::Vtg(_) => SentenceKind::Vtg,
            SentenceData::Zda(_) => SentenceKind::Zda,
            SentenceData::Xte(_) => SentenceKind::Xte,
            SentenceData::Wpl(_) => SentenceKind::Wpl,
            SentenceData::Rte(_) => SentenceKind::Rte,
        }
    }
}

/// One decoded NMEA sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub talker: String,
    pub sentence_type: String,
    /// Raw fields after the header, as received.
    pub fields: Vec<String>,
    pub data: SentenceData,
}

impl Sentence {
    pub fn kind(&self) -> SentenceKind {
        self.data.kind()
    }

    /// Talker and type, e.g. `GPWPL`.
    pub fn header(&self) -> String {
        format!("{}{}", self.talker, self.sentence_type)
    }

    /// Header and fields as one comma separated payload, without framing.
    pub fn payload(&self) -> String {
        let mut payload = self.header();
        for field in &self.fields {
            payload.push(',');
            payload.push_str(field);
        }
        payload
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            SentenceData::Wpl(wpl) => write!(
                f,
                "{} {:.6} {:.6} {}",
                self.header(),
                wpl.latitude,
                wpl.longitude,
                wpl.name
            ),
            SentenceData::Rte(rte) => write!(
                f,
                "{} {:?} {}/{} {} {:?}",
                self.header(),
                rte.route,
                rte.sequence,
                rte.total,
                rte.mode,
                rte.waypoints
            ),
            _ => write!(f, "{} {:?}", self.header(), self.fields),
        }
    }
}

/// Bounds-checked view over raw fields; missing optional trailers read as empty.
struct Fields<'a>(&'a [String]);

impl Fields<'_> {
    fn at(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Maps sentence type identifiers to schemas.
#[derive(Debug, Clone)]
pub struct SentenceDecoder {
    schemas: HashMap<&'static str, SentenceKind>,
}

impl SentenceDecoder {
    pub fn new() -> Self {
        let schemas = SentenceKind::KNOWN
            .iter()
            .map(|kind| (kind.tag(), *kind))
            .collect();
        Self { schemas }
    }

    /// Schema registered for a sentence type, `Unknown` if none.
    pub fn lookup(&self, sentence_type: &str) -> SentenceKind {
        self.schemas
            .get(sentence_type)
            .copied()
            .unwrap_or(SentenceKind::Unknown)
    }

    /// Decode a checksum-clean field list whose first element is the header.
    pub fn decode<S: AsRef<str>>(&self, fields: &[S]) -> Result<Sentence> {
        let (header, rest) = fields
            .split_first()
            .ok_or_else(|| NmeaError::Decode("empty sentence".to_string()))?;
        let header = header.as_ref();
        if header.len() < 3 || !header.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(NmeaError::Decode(format!("bad sentence header {:?}", header)));
        }
        let (talker, sentence_type) = header.split_at(2);
        let raw: Vec<String> = rest.iter().map(|s| s.as_ref().to_string()).collect();

        let kind = self.lookup(sentence_type);
        if !kind.arity().accepts(raw.len()) {
            return Err(NmeaError::Decode(format!(
                "{} expects {} fields, got {}",
                header,
                kind.arity(),
                raw.len()
            )));
        }

        let f = Fields(&raw);
        let data = match kind {
            SentenceKind::Unknown => {
                log::debug!("No schema for {}", header);
                SentenceData::Unknown
            }
            SentenceKind::Rmc => SentenceData::Rmc(Rmc::from_fields(&f)?),
            SentenceKind::Gga => SentenceData::Gga(Gga::from_fields(&f)?),
            SentenceKind::Gll => SentenceData::Gll(Gll::from_fields(&f)?),
            SentenceKind::Gsa => SentenceData::Gsa(Gsa::from_fields(&f)?),
            SentenceKind::Gsv => SentenceData::Gsv(Gsv::from_fields(&f)?),
            SentenceKind::Vtg => SentenceData::Vtg(Vtg::from_fields(&f)?),
            SentenceKind::Zda => SentenceData::Zda(Zda::from_fields(&f)?),
            SentenceKind::Xte => SentenceData::Xte(Xte::from_fields(&f)?),
            SentenceKind::Wpl => SentenceData::Wpl(Wpl::from_fields(&f)?),
            SentenceKind::Rte => SentenceData::Rte(Rte::from_fields(&f)?),
        };

        Ok(Sentence {
            talker: talker.to_string(),
            sentence_type: sentence_type.to_string(),
            fields: raw,
            data,
        })
    }

    /// Decode an unframed payload such as `GPWPL,5128.62,N,00027.58,W,EGLL`.
    pub fn decode_payload(&self, payload: &str) -> Result<Sentence> {
        let fields: Vec<&str> = payload.split(',').collect();
        self.decode(&fields)
    }
}

impl Default for SentenceDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn decode(payload: &str) -> Result<Sentence> {
        SentenceDecoder::new().decode_payload(payload)
    }

    #[test]
    fn test_rmc_parsing() {
        let s = decode("GPRMC,162823.000,A,2542.9243,N,08013.6310,W,0.14,59.53,180214,,").unwrap();
        assert_eq!(s.talker, "GP");
        assert_eq!(s.sentence_type, "RMC");
        let SentenceData::Rmc(rmc) = &s.data else { panic!("expected RMC") };
        assert!(rmc.is_valid());
        assert!((rmc.latitude.unwrap() - 25.715405).abs() < 1e-6);
        assert!((rmc.longitude.unwrap() + 80.227183).abs() < 1e-6);
        assert_eq!(rmc.speed_knots, Some(0.14));
        assert_eq!(rmc.magnetic_variation, None);
        assert_eq!(rmc.datetime().unwrap().to_string(), "2014-02-18 16:28:23");
    }

    #[test]
    fn test_gga_parsing() {
        let s = decode("GPGGA,162824.000,2542.9243,N,08013.6311,W,1,06,1.5,3.3,M,-27.3,M,,0000")
            .unwrap();
        let SentenceData::Gga(gga) = &s.data else { panic!("expected GGA") };
        assert_eq!(gga.fix_quality, Some(1));
        assert_eq!(gga.satellites, Some(6));
        assert_eq!(gga.hdop, Some(1.5));
        assert_eq!(gga.geoid_separation, Some(-27.3));
        assert_eq!(gga.dgps_age, None);
        assert_eq!(gga.dgps_station.as_deref(), Some("0000"));
        assert_eq!(gga.time.unwrap().second(), 24);
    }

    #[test]
    fn test_other_kinds() {
        let s = decode("GPGLL,2542.9243,N,08013.6310,W,162823.000,A").unwrap();
        assert_eq!(s.kind(), SentenceKind::Gll);

        let s = decode("GPGSA,A,3,29,24,18,14,22,27,,,,,,,2.9,1.5,2.5").unwrap();
        let SentenceData::Gsa(gsa) = &s.data else { panic!("expected GSA") };
        assert_eq!(gsa.prns, vec![29, 24, 18, 14, 22, 27]);
        assert_eq!(gsa.vdop, Some(2.5));

        let s = decode("GPVTG,59.53,T,,M,0.14,N,0.3,K").unwrap();
        let SentenceData::Vtg(vtg) = &s.data else { panic!("expected VTG") };
        assert_eq!(vtg.course_true, Some(59.53));
        assert_eq!(vtg.course_magnetic, None);
        assert_eq!(vtg.speed_kmh, Some(0.3));

        let s = decode("GPZDA,201530.00,04,07,2002,00,00").unwrap();
        let SentenceData::Zda(zda) = &s.data else { panic!("expected ZDA") };
        assert_eq!(zda.date(), NaiveDate::from_ymd_opt(2002, 7, 4));

        let s = decode("GPXTE,A,A,0.67,L,N").unwrap();
        let SentenceData::Xte(xte) = &s.data else { panic!("expected XTE") };
        assert_eq!(xte.distance, Some(0.67));
    }

    #[test]
    fn test_gsv_partial_page() {
        let s = decode("GPGSV,3,3,10,27,08,303,27,12,00,139,25").unwrap();
        let SentenceData::Gsv(gsv) = &s.data else { panic!("expected GSV") };
        assert_eq!(gsv.message_number, Some(3));
        assert_eq!(gsv.satellites.len(), 2);
        assert_eq!(gsv.satellites[1].prn, 12);
        assert_eq!(gsv.satellites[1].elevation, Some(0));
    }

    #[test]
    fn test_wpl_parsing() {
        let s = decode("GPWPL,5128.62,N,00027.58,W,EGLL").unwrap();
        let SentenceData::Wpl(wpl) = &s.data else { panic!("expected WPL") };
        assert_eq!(wpl.name, "EGLL");
        assert!((wpl.latitude - 51.477).abs() < 1e-6);
        assert!((wpl.longitude + 0.459667).abs() < 1e-6);
        assert_eq!(s.to_string(), "GPWPL 51.477000 -0.459667 EGLL");
    }

    #[test]
    fn test_rte_parsing() {
        let s = decode("GPRTE,2,1,c,0,PBRCPK,PBRTO,PTELGR").unwrap();
        let SentenceData::Rte(rte) = &s.data else { panic!("expected RTE") };
        assert_eq!((rte.total, rte.sequence), (2, 1));
        assert_eq!(rte.route, "0");
        assert_eq!(rte.waypoints, vec!["PBRCPK", "PBRTO", "PTELGR"]);
    }

    #[test]
    fn test_rte_rejects_bad_sequence() {
        assert!(decode("GPRTE,2,3,c,0,A").is_err());
        assert!(decode("GPRTE,,1,c,0,A").is_err());
    }

    #[test]
    fn test_wrong_field_count_is_decode_error() {
        let err = decode("GPWPL,5128.62,N,00027.58,W").unwrap_err();
        assert!(matches!(err, NmeaError::Decode(_)));
        assert!(decode("GPGGA,162824.000,2542.9243,N").is_err());
        assert!(decode("GPGSV,3,3,10,27,08,303").is_err());
    }

    #[test]
    fn test_malformed_field_is_decode_error() {
        let err = decode("GPWPL,51X8.62,N,00027.58,W,EGLL").unwrap_err();
        assert!(matches!(err, NmeaError::Decode(_)));
        assert!(decode("GPWPL,,,,,EMPTY").is_err());
    }

    #[test]
    fn test_unknown_sentence_keeps_fields() {
        let s = decode("SDDBT,0012.3,f,0003.7,M,0002.0,F").unwrap();
        assert_eq!(s.kind(), SentenceKind::Unknown);
        assert_eq!(s.header(), "SDDBT");
        assert_eq!(s.fields.len(), 6);
        assert_eq!(s.payload(), "SDDBT,0012.3,f,0003.7,M,0002.0,F");
    }

    #[test]
    fn test_other_talkers_share_schemas() {
        let s = decode("GNGLL,2542.9243,N,08013.6310,W,162823.000,A,A").unwrap();
        assert_eq!(s.talker, "GN");
        assert_eq!(s.kind(), SentenceKind::Gll);
    }

    #[test]
    fn test_bad_header() {
        assert!(decode("").is_err());
        assert!(decode("G").is_err());
        assert!(SentenceDecoder::new().decode::<&str>(&[]).is_err());
    }

    #[test]
    fn test_arity() {
        let groups = Arity::Groups { head: 3, group: 4, max_groups: 4 };
        assert!(groups.accepts(3));
        assert!(groups.accepts(19));
        assert!(!groups.accepts(20));
        assert!(!groups.accepts(23));
        assert!(Arity::Between(11, 13).accepts(12));
        assert!(!Arity::Exact(5).accepts(6));
    }

    #[test]
    fn test_sentence_json_keeps_tag_and_attributes() {
        let s = decode("GPWPL,5128.62,N,00027.58,W,EGLL").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["data"]["kind"], "WPL");
        assert_eq!(json["data"]["name"], "EGLL");
        assert_eq!(json["talker"], "GP");
        let back: Sentence = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), SentenceKind::Wpl);
        assert_eq!(back.fields, s.fields);
    }
}
