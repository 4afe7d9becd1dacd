// src/waypoint.rs
//! Waypoint and route model plus document export

use crate::error::{NmeaError, Result};
use crate::geo::haversine_nm;
use crate::nmea::fields::{encode_lat, encode_lon};
use crate::nmea::sentence::Wpl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// A named point. Names come from the chartplotter and are not unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            elevation: None,
            time: None,
            description: None,
            symbol: None,
        }
    }

    pub fn from_wpl(wpl: &Wpl) -> Self {
        Self::new(wpl.name.clone(), wpl.latitude, wpl.longitude)
    }

    /// Great-circle distance to `other` in nautical miles.
    pub fn distance_nm(&self, other: &Waypoint) -> f64 {
        haversine_nm(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Render as the fields of a `GPWPL` sentence, header first.
    pub fn to_wpl_fields(&self) -> Vec<String> {
        let (lat, ns) = encode_lat(self.latitude);
        let (lon, ew) = encode_lon(self.longitude);
        vec![
            "GPWPL".to_string(),
            lat,
            ns.to_string(),
            lon,
            ew.to_string(),
            self.name.clone(),
        ]
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {:.6} {}", self.latitude, self.longitude, self.name)
    }
}

/// A named sequence of waypoint references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    /// 1-based position among the routes of one document.
    pub number: u32,
    /// Member waypoint names in travel order.
    pub members: Vec<String>,
    /// Segment count declared by the sender, 0 when not sent as segments.
    #[serde(default)]
    pub expected_segments: u32,
    /// Sequence numbers of the segments received, in arrival order.
    #[serde(default)]
    pub segments: Vec<u32>,
}

impl Route {
    pub fn new(name: impl Into<String>, number: u32, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            number,
            members,
            expected_segments: 0,
            segments: Vec::new(),
        }
    }

    /// Every declared segment has arrived, each exactly once.
    pub fn is_complete(&self) -> bool {
        self.segments.len() == self.expected_segments as usize
            && (1..=self.expected_segments).all(|seq| self.segments.contains(&seq))
    }

    /// Segments arrived as 1, 2, 3...
    pub fn is_in_sequence(&self) -> bool {
        self.segments
            .iter()
            .enumerate()
            .all(|(i, &seq)| seq as usize == i + 1)
    }
}

/// Ordered waypoint collection. Duplicates are allowed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointSet {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

impl WaypointSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            waypoints: Vec::new(),
        }
    }

    pub fn from_waypoints(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            name: name.into(),
            waypoints,
        }
    }

    pub fn push(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    /// First waypoint carrying `name`.
    pub fn find(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.name == name)
    }
}

impl<'a> IntoIterator for &'a WaypointSet {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaypointFormat {
    GPX,
    GeoJSON,
    KML,
    CSV,
}

impl WaypointFormat {
    pub fn extension(&self) -> &str {
        match self {
            WaypointFormat::GPX => "gpx",
            WaypointFormat::GeoJSON => "geojson",
            WaypointFormat::KML => "kml",
            WaypointFormat::CSV => "csv",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            WaypointFormat::GPX => "GPX (GPS Exchange)",
            WaypointFormat::GeoJSON => "GeoJSON",
            WaypointFormat::KML => "KML (Keyhole)",
            WaypointFormat::CSV => "CSV",
        }
    }
}

impl FromStr for WaypointFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "gpx" => Ok(WaypointFormat::GPX),
            "geojson" | "json" => Ok(WaypointFormat::GeoJSON),
            "kml" => Ok(WaypointFormat::KML),
            "csv" => Ok(WaypointFormat::CSV),
            other => Err(format!("unknown format {:?}, expected gpx, geojson, kml or csv", other)),
        }
    }
}

/// Builds a waypoint/route document in one of the supported formats.
pub struct WaypointExporter {
    name: String,
    description: String,
    waypoints: Vec<Waypoint>,
    routes: Vec<Route>,
}

impl WaypointExporter {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            waypoints: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    pub fn add_waypoints(&mut self, set: &WaypointSet) {
        self.waypoints.extend(set.iter().cloned());
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn export_to_file(&self, path: &Path, format: WaypointFormat) -> Result<()> {
        let file = File::create(path).map_err(|e| NmeaError::Io(e))?;
        self.write_to(BufWriter::new(file), format)
    }

    pub fn write_to<W: Write>(&self, mut out: W, format: WaypointFormat) -> Result<()> {
        let content = self.render(format)?;
        out.write_all(content.as_bytes()).map_err(|e| NmeaError::Io(e))?;
        out.flush().map_err(|e| NmeaError::Io(e))?;
        Ok(())
    }

    pub fn render(&self, format: WaypointFormat) -> Result<String> {
        if self.waypoints.is_empty() && self.routes.is_empty() {
            return Err(NmeaError::Other("No waypoints or routes to export".to_string()));
        }

        match format {
            WaypointFormat::GPX => Ok(self.to_gpx()),
            WaypointFormat::GeoJSON => self.to_geojson(),
            WaypointFormat::KML => Ok(self.to_kml()),
            WaypointFormat::CSV => Ok(self.to_csv()),
        }
    }

    /// Route members paired with their waypoint; unknown names are logged and skipped.
    fn resolve<'a>(&'a self, route: &'a Route) -> Vec<&'a Waypoint> {
        let mut by_name: HashMap<&str, &Waypoint> = HashMap::new();
        for waypoint in &self.waypoints {
            by_name.entry(waypoint.name.as_str()).or_insert(waypoint);
        }

        route
            .members
            .iter()
            .filter_map(|member| {
                let found = by_name.get(member.as_str()).copied();
                if found.is_none() {
                    log::warn!("Route {:?} references unknown waypoint {:?}", route.name, member);
                }
                found
            })
            .collect()
    }

    fn to_gpx(&self) -> String {
        let mut gpx = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="NMEA-Tools" xmlns="http://www.topografix.com/GPX/1/1">
"#,
        );

        gpx.push_str("  <metadata>\n");
        gpx.push_str(&format!("    <name>{}</name>\n", Self::escape_xml(&self.name)));
        gpx.push_str(&format!("    <desc>{}</desc>\n", Self::escape_xml(&self.description)));
        gpx.push_str("  </metadata>\n");

        for waypoint in &self.waypoints {
            Self::push_point(&mut gpx, "wpt", waypoint, "  ");
        }

        for route in &self.routes {
            gpx.push_str("  <rte>\n");
            gpx.push_str(&format!("    <name>{}</name>\n", Self::escape_xml(&route.name)));
            gpx.push_str(&format!("    <number>{}</number>\n", route.number));
            for waypoint in self.resolve(route) {
                Self::push_point(&mut gpx, "rtept", waypoint, "    ");
            }
            gpx.push_str("  </rte>\n");
        }

        gpx.push_str("</gpx>\n");
        gpx
    }

    fn push_point(gpx: &mut String, tag: &str, waypoint: &Waypoint, indent: &str) {
        gpx.push_str(&format!(
            "{}<{} lat=\"{}\" lon=\"{}\">\n",
            indent, tag, waypoint.latitude, waypoint.longitude
        ));

        if let Some(ele) = waypoint.elevation {
            gpx.push_str(&format!("{}  <ele>{}</ele>\n", indent, ele));
        }

        if let Some(time) = waypoint.time {
            gpx.push_str(&format!("{}  <time>{}</time>\n", indent, time.to_rfc3339()));
        }

        gpx.push_str(&format!("{}  <name>{}</name>\n", indent, Self::escape_xml(&waypoint.name)));

        if let Some(ref desc) = waypoint.description {
            gpx.push_str(&format!("{}  <desc>{}</desc>\n", indent, Self::escape_xml(desc)));
        }

        if let Some(ref sym) = waypoint.symbol {
            gpx.push_str(&format!("{}  <sym>{}</sym>\n", indent, Self::escape_xml(sym)));
        }

        gpx.push_str(&format!("{}</{}>\n", indent, tag));
    }

    fn to_geojson(&self) -> Result<String> {
        let mut features: Vec<serde_json::Value> = self
            .waypoints
            .iter()
            .map(|wp| {
                let mut properties = serde_json::json!({ "name": wp.name });

                if let Some(ele) = wp.elevation {
                    properties["elevation"] = serde_json::json!(ele);
                }

                if let Some(time) = wp.time {
                    properties["timestamp"] = serde_json::json!(time.to_rfc3339());
                }

                if let Some(ref desc) = wp.description {
                    properties["description"] = serde_json::json!(desc);
                }

                serde_json::json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [wp.longitude, wp.latitude]
                    },
                    "properties": properties
                })
            })
            .collect();

        for route in &self.routes {
            let coordinates: Vec<[f64; 2]> = self
                .resolve(route)
                .iter()
                .map(|wp| [wp.longitude, wp.latitude])
                .collect();
            features.push(serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates
                },
                "properties": {
                    "name": route.name,
                    "number": route.number,
                    "members": route.members,
                    "complete": route.is_complete()
                }
            }));
        }

        let feature_collection = serde_json::json!({
            "type": "FeatureCollection",
            "name": self.name,
            "description": self.description,
            "features": features
        });

        serde_json::to_string_pretty(&feature_collection).map_err(|e| NmeaError::Json(e))
    }

    fn to_kml(&self) -> String {
        let mut kml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
"#,
        );
        kml.push_str(&format!("    <name>{}</name>\n", Self::escape_xml(&self.name)));
        kml.push_str(&format!(
            "    <description>{}</description>\n",
            Self::escape_xml(&self.description)
        ));

        for waypoint in &self.waypoints {
            kml.push_str("    <Placemark>\n");
            kml.push_str(&format!("      <name>{}</name>\n", Self::escape_xml(&waypoint.name)));

            if let Some(ref desc) = waypoint.description {
                kml.push_str(&format!(
                    "      <description>{}</description>\n",
                    Self::escape_xml(desc)
                ));
            }

            if let Some(time) = waypoint.time {
                kml.push_str(&format!(
                    "      <TimeStamp><when>{}</when></TimeStamp>\n",
                    time.to_rfc3339()
                ));
            }

            kml.push_str("      <Point>\n");
            kml.push_str(&format!(
                "        <coordinates>{},{},{}</coordinates>\n",
                waypoint.longitude,
                waypoint.latitude,
                waypoint.elevation.unwrap_or(0.0)
            ));
            kml.push_str("      </Point>\n");
            kml.push_str("    </Placemark>\n");
        }

        for route in &self.routes {
            let coordinates: Vec<String> = self
                .resolve(route)
                .iter()
                .map(|wp| format!("{},{},0", wp.longitude, wp.latitude))
                .collect();
            kml.push_str("    <Placemark>\n");
            kml.push_str(&format!("      <name>{}</name>\n", Self::escape_xml(&route.name)));
            kml.push_str("      <LineString>\n");
            kml.push_str(&format!(
                "        <coordinates>{}</coordinates>\n",
                coordinates.join(" ")
            ));
            kml.push_str("      </LineString>\n");
            kml.push_str("    </Placemark>\n");
        }

        kml.push_str("  </Document>\n</kml>\n");
        kml
    }

    fn to_csv(&self) -> String {
        let mut csv = String::from("name,latitude,longitude,elevation,timestamp,description\n");

        for waypoint in &self.waypoints {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                Self::escape_csv(&waypoint.name),
                waypoint.latitude,
                waypoint.longitude,
                waypoint.elevation.map_or(String::new(), |e| e.to_string()),
                waypoint.time.map_or(String::new(), |t| t.to_rfc3339()),
                waypoint
                    .description
                    .as_ref()
                    .map_or(String::new(), |d| Self::escape_csv(d))
            ));
        }

        csv
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }

    fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
