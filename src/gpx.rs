// src/gpx.rs
//! GPX waypoint/route document reader

use crate::error::{NmeaError, Result};
use crate::waypoint::{Route, Waypoint, WaypointSet};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;

/// Contents of a GPX document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxDocument {
    pub name: Option<String>,
    pub description: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<Route>,
}

impl GpxDocument {
    pub fn into_set(self, name: impl Into<String>) -> WaypointSet {
        WaypointSet::from_waypoints(name, self.waypoints)
    }
}

pub fn read_gpx(path: &Path) -> Result<GpxDocument> {
    log::info!("Read GPX from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let document = parse_gpx(&text)?;
    log::info!(
        "{} waypoints, {} routes read",
        document.waypoints.len(),
        document.routes.len()
    );
    Ok(document)
}

/// Parse `<wpt>` and `<rte>` elements by local name, so both namespaced and
/// bare GPX 1.0/1.1 documents are accepted.
pub fn parse_gpx(text: &str) -> Result<GpxDocument> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut document = GpxDocument::default();
    let mut path: Vec<String> = Vec::new();
    let mut point: Option<Waypoint> = None;
    let mut route: Option<Route> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                open(&name, &e, &mut point, &mut route, &document)?;
                path.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                open(&name, &e, &mut point, &mut route, &document)?;
                close(&name, &mut point, &mut route, &mut document);
            }
            Event::End(_) => {
                if let Some(name) = path.pop() {
                    close(&name, &mut point, &mut route, &mut document);
                }
            }
            Event::Text(e) => {
                let value = e.unescape()?.into_owned();
                text_value(&path, value, &mut point, &mut route, &mut document)?;
            }
            Event::CData(e) => {
                let value = String::from_utf8_lossy(&e).into_owned();
                text_value(&path, value, &mut point, &mut route, &mut document)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(document)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn open(
    name: &str,
    e: &BytesStart,
    point: &mut Option<Waypoint>,
    route: &mut Option<Route>,
    document: &GpxDocument,
) -> Result<()> {
    match name {
        "wpt" | "rtept" => {
            let mut lat = None;
            let mut lon = None;
            for attr in e.attributes() {
                let attr = attr?;
                let value = attr.unescape_value()?;
                match attr.key.local_name().as_ref() {
                    b"lat" => lat = Some(coordinate("lat", &value)?),
                    b"lon" => lon = Some(coordinate("lon", &value)?),
                    _ => {}
                }
            }
            match (lat, lon) {
                (Some(lat), Some(lon)) => *point = Some(Waypoint::new("", lat, lon)),
                _ => {
                    return Err(NmeaError::Decode(format!("<{}> without lat and lon", name)));
                }
            }
        }
        "rte" => {
            let number = document.routes.len() as u32 + 1;
            *route = Some(Route::new("", number, Vec::new()));
        }
        _ => {}
    }
    Ok(())
}

fn close(name: &str, point: &mut Option<Waypoint>, route: &mut Option<Route>, document: &mut GpxDocument) {
    match name {
        "wpt" => {
            if let Some(waypoint) = point.take() {
                document.waypoints.push(waypoint);
            }
        }
        "rtept" => {
            if let (Some(waypoint), Some(route)) = (point.take(), route.as_mut()) {
                if waypoint.name.is_empty() {
                    log::warn!("Unnamed route point {} in route {:?} skipped", waypoint, route.name);
                } else {
                    route.members.push(waypoint.name);
                }
            }
        }
        "rte" => {
            if let Some(route) = route.take() {
                document.routes.push(route);
            }
        }
        _ => {}
    }
}

fn text_value(
    path: &[String],
    value: String,
    point: &mut Option<Waypoint>,
    route: &mut Option<Route>,
    document: &mut GpxDocument,
) -> Result<()> {
    let (element, parent) = match path {
        [.., parent, element] => (element.as_str(), parent.as_str()),
        _ => return Ok(()),
    };

    match (parent, element) {
        ("wpt" | "rtept", field) => {
            if let Some(waypoint) = point.as_mut() {
                match field {
                    "name" => waypoint.name = value,
                    "ele" => waypoint.elevation = value.trim().parse().ok(),
                    "time" => waypoint.time = timestamp(&value),
                    "desc" => waypoint.description = Some(value),
                    "sym" => waypoint.symbol = Some(value),
                    _ => {}
                }
            }
        }
        ("rte", "name") => {
            if let Some(route) = route.as_mut() {
                route.name = value;
            }
        }
        ("rte", "number") => {
            if let Some(route) = route.as_mut() {
                route.number = value
                    .trim()
                    .parse()
                    .map_err(|_| NmeaError::Decode(format!("bad route number {:?}", value)))?;
            }
        }
        ("metadata", "name") => document.name = Some(value),
        ("metadata", "desc") => document.description = Some(value),
        _ => {}
    }
    Ok(())
}

fn coordinate(attribute: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| NmeaError::Decode(format!("bad {} {:?}", attribute, value)))
}

fn timestamp(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Ignoring waypoint time {:?}: {}", value, e);
            None
        }
    }
}
