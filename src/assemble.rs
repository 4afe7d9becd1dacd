// src/assemble.rs
//! Waypoint and route assembly from captured sentences
//!
//! WPL sentences become waypoints directly. RTE sentences arrive as
//! numbered segments of a named route; segments are concatenated in the
//! order they arrive, which the sender is trusted to match with the
//! declared sequence. Out-of-order arrival is detected and logged but not
//! reordered.

use crate::nmea::{Sentence, SentenceData};
use crate::waypoint::{Route, Waypoint, WaypointSet};

/// Result of assembling one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub waypoints: WaypointSet,
    pub routes: Vec<Route>,
}

impl Assembly {
    pub fn incomplete_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|r| !r.is_complete())
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.routes.is_empty()
    }
}

pub struct Assembler {
    waypoints: WaypointSet,
    routes: Vec<Route>,
}

impl Assembler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            waypoints: WaypointSet::new(name),
            routes: Vec::new(),
        }
    }

    /// Assemble a whole capture.
    pub fn assemble<'a, I>(name: impl Into<String>, sentences: I) -> Assembly
    where
        I: IntoIterator<Item = &'a Sentence>,
    {
        let mut assembler = Self::new(name);
        for sentence in sentences {
            assembler.push(sentence);
        }
        assembler.finish()
    }

    pub fn push(&mut self, sentence: &Sentence) {
        match &sentence.data {
            SentenceData::Wpl(wpl) => {
                log::debug!("{}", sentence);
                self.waypoints.push(Waypoint::from_wpl(wpl));
            }
            SentenceData::Rte(rte) => {
                log::debug!("{}", sentence);
                let route = self.route_for(&rte.route, rte.sequence, rte.total);
                if !route.segments.is_empty() && rte.total != route.expected_segments {
                    log::warn!(
                        "Route {:?} segment {} declares {} segments, earlier ones declared {}",
                        rte.route,
                        rte.sequence,
                        rte.total,
                        route.expected_segments
                    );
                }
                let expected = route.segments.len() as u32 + 1;
                if rte.sequence != expected {
                    log::warn!(
                        "Route {:?} segment {} arrived where {} was expected",
                        rte.route,
                        rte.sequence,
                        expected
                    );
                }
                route.expected_segments = route.expected_segments.max(rte.total);
                route.segments.push(rte.sequence);
                route.members.extend(rte.waypoints.iter().cloned());
            }
            _ => log::debug!("Not a waypoint or route: {}", sentence.header()),
        }
    }

    /// The open route named `name`. A first segment for a route that
    /// already holds one means the sender started over: open a new copy.
    fn route_for(&mut self, name: &str, sequence: u32, total: u32) -> &mut Route {
        let position = self.routes.iter().rposition(|r| r.name == name);
        let index = match position {
            Some(index) if !(sequence == 1 && self.routes[index].segments.contains(&1)) => index,
            _ => {
                if position.is_some() {
                    log::warn!("Route {:?} sent again from segment 1, keeping both copies", name);
                }
                let number = self.routes.len() as u32 + 1;
                let mut route = Route::new(name, number, Vec::new());
                route.expected_segments = total;
                self.routes.push(route);
                self.routes.len() - 1
            }
        };
        &mut self.routes[index]
    }

    pub fn finish(self) -> Assembly {
        for route in self.routes.iter().filter(|r| !r.is_complete()) {
            log::warn!(
                "Incomplete route {:?}: {} of {} segments received",
                route.name,
                route.segments.len(),
                route.expected_segments
            );
        }
        log::info!(
            "Assembled {} waypoints, {} routes",
            self.waypoints.len(),
            self.routes.len()
        );
        Assembly {
            waypoints: self.waypoints,
            routes: self.routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmea::SentenceDecoder;

    fn decode(payloads: &[&str]) -> Vec<Sentence> {
        let decoder = SentenceDecoder::new();
        payloads
            .iter()
            .map(|p| decoder.decode_payload(p).unwrap())
            .collect()
    }

    #[test]
    fn test_segments_concatenate_in_arrival_order() {
        let sentences = decode(&[
            "GPWPL,3845.363,N,07629.551,W,HOME",
            "GPRTE,3,1,c,BAY,HOME,R2",
            "GPRTE,3,2,c,BAY,G3,R4",
            "GPRTE,3,3,c,BAY,THOMAS",
        ]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert_eq!(assembly.waypoints.len(), 1);
        assert_eq!(assembly.routes.len(), 1);
        let route = &assembly.routes[0];
        assert_eq!(route.name, "BAY");
        assert_eq!(route.number, 1);
        assert_eq!(route.members, vec!["HOME", "R2", "G3", "R4", "THOMAS"]);
        assert!(route.is_complete());
        assert!(route.is_in_sequence());
        assert_eq!(assembly.incomplete_routes().count(), 0);
    }

    #[test]
    fn test_missing_segment_keeps_partial_route() {
        let sentences = decode(&["GPRTE,3,1,c,BAY,HOME,R2", "GPRTE,3,2,c,BAY,G3,R4"]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert_eq!(assembly.routes.len(), 1);
        assert_eq!(assembly.routes[0].members, vec!["HOME", "R2", "G3", "R4"]);
        assert!(!assembly.routes[0].is_complete());
        assert_eq!(assembly.incomplete_routes().count(), 1);
    }

    #[test]
    fn test_out_of_order_segments_are_flagged_not_sorted() {
        let sentences = decode(&[
            "GPRTE,2,2,c,BAY,G3",
            "GPRTE,2,1,c,BAY,HOME",
        ]);
        let assembly = Assembler::assemble("capture", &sentences);
        let route = &assembly.routes[0];
        assert_eq!(route.members, vec!["G3", "HOME"]);
        assert_eq!(route.segments, vec![2, 1]);
        assert!(route.is_complete());
        assert!(!route.is_in_sequence());
    }

    #[test]
    fn test_interleaved_routes() {
        let sentences = decode(&[
            "GPRTE,2,1,c,A,A1",
            "GPRTE,1,1,c,B,B1",
            "GPRTE,2,2,c,A,A2",
        ]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert_eq!(assembly.routes.len(), 2);
        assert_eq!(assembly.routes[0].members, vec!["A1", "A2"]);
        assert_eq!(assembly.routes[1].number, 2);
    }

    #[test]
    fn test_resent_route_starts_new_copy() {
        let sentences = decode(&["GPRTE,1,1,c,BAY,HOME", "GPRTE,1,1,c,BAY,HOME"]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert_eq!(assembly.routes.len(), 2);
        assert_eq!(assembly.routes[1].members, vec!["HOME"]);
    }

    #[test]
    fn test_partial_route_resent_from_start() {
        let sentences = decode(&[
            "GPRTE,2,1,c,BAY,A,B",
            "GPRTE,2,1,c,BAY,A,B",
            "GPRTE,2,2,c,BAY,C",
        ]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert_eq!(assembly.routes.len(), 2);

        let abandoned = &assembly.routes[0];
        assert_eq!(abandoned.members, vec!["A", "B"]);
        assert!(!abandoned.is_complete());

        let resent = &assembly.routes[1];
        assert_eq!(resent.members, vec!["A", "B", "C"]);
        assert_eq!(resent.segments, vec![1, 2]);
        assert!(resent.is_complete());
        assert_eq!(assembly.incomplete_routes().count(), 1);
    }

    #[test]
    fn test_other_sentences_ignored() {
        let sentences = decode(&["GPGLL,2542.9243,N,08013.6310,W,162823.000,A"]);
        let assembly = Assembler::assemble("capture", &sentences);
        assert!(assembly.is_empty());
    }
}
