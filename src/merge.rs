// src/merge.rs
//! Geographic reconciliation of waypoint sets
//!
//! An UPDATE set is merged into a curated MASTER set. Two waypoints are the
//! same physical mark when they lie within the threshold distance of each
//! other, whatever their names. MASTER is never altered: matched UPDATE
//! waypoints are dropped and reported, the rest are appended.

use crate::config::{validate_threshold, DEFAULT_THRESHOLD_NM};
use crate::error::Result;
use crate::waypoint::{Waypoint, WaypointSet};
use serde::Serialize;

/// One suppressed UPDATE waypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearDuplicate {
    pub update_name: String,
    pub master_name: String,
    pub distance_nm: f64,
}

/// Two MASTER waypoints close enough to be the same mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossibleDuplicate {
    pub first: String,
    pub second: String,
    pub distance_nm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: WaypointSet,
    pub audit: Vec<NearDuplicate>,
    /// MASTER pairs already within the threshold of each other.
    pub master_duplicates: Vec<PossibleDuplicate>,
}

impl MergeOutcome {
    /// The form written by `merge --audit`.
    pub fn report(&self) -> MergeReport<'_> {
        MergeReport {
            near_duplicates: &self.audit,
            master_duplicates: &self.master_duplicates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MergeReport<'a> {
    pub near_duplicates: &'a [NearDuplicate],
    pub master_duplicates: &'a [PossibleDuplicate],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciler {
    threshold_nm: f64,
}

impl Reconciler {
    pub fn new(threshold_nm: f64) -> Result<Self> {
        validate_threshold(threshold_nm)?;
        Ok(Self { threshold_nm })
    }

    pub fn threshold_nm(&self) -> f64 {
        self.threshold_nm
    }

    /// Nearest MASTER waypoint within the threshold; the earliest wins a tie.
    pub fn closest<'a>(&self, master: &'a WaypointSet, waypoint: &Waypoint) -> Option<(&'a Waypoint, f64)> {
        let mut best: Option<(&Waypoint, f64)> = None;
        for candidate in master {
            let distance = waypoint.distance_nm(candidate);
            if distance > self.threshold_nm {
                continue;
            }
            match best {
                Some((_, nearest)) if distance >= nearest => {}
                _ => best = Some((candidate, distance)),
            }
        }
        best
    }

    pub fn merge(&self, master: &WaypointSet, update: &WaypointSet) -> MergeOutcome {
        log::info!(
            "Merging {} {} waypoints into {} {} waypoints, threshold {} NM",
            update.len(),
            update.name,
            master.len(),
            master.name,
            self.threshold_nm
        );

        let master_duplicates = self.master_duplicates(master);
        if !master_duplicates.is_empty() {
            log::warn!(
                "{} has {} possible duplicate pairs, left as they are",
                master.name,
                master_duplicates.len()
            );
        }

        let mut merged = WaypointSet::from_waypoints(master.name.clone(), master.waypoints.clone());
        let mut audit = Vec::new();

        for waypoint in update {
            match self.closest(master, waypoint) {
                Some((matched, distance)) => {
                    log::info!("{} near {:.4} {}", waypoint.name, distance, matched.name);
                    audit.push(NearDuplicate {
                        update_name: waypoint.name.clone(),
                        master_name: matched.name.clone(),
                        distance_nm: distance,
                    });
                }
                None => {
                    log::debug!("New waypoint {}", waypoint);
                    merged.push(waypoint.clone());
                }
            }
        }

        log::info!(
            "{} waypoints merged, {} added, {} suppressed",
            merged.len(),
            merged.len() - master.len(),
            audit.len()
        );
        MergeOutcome {
            merged,
            audit,
            master_duplicates,
        }
    }

    /// Pairs inside MASTER already within the threshold. Reported, never removed.
    pub fn master_duplicates(&self, master: &WaypointSet) -> Vec<PossibleDuplicate> {
        let mut found = Vec::new();
        for (i, later) in master.waypoints.iter().enumerate() {
            for earlier in &master.waypoints[..i] {
                let distance = later.distance_nm(earlier);
                if distance <= self.threshold_nm {
                    log::info!("{} possible duplicate {:.4} {}", later.name, distance, earlier.name);
                    found.push(PossibleDuplicate {
                        first: earlier.name.clone(),
                        second: later.name.clone(),
                        distance_nm: distance,
                    });
                }
            }
        }
        found
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            threshold_nm: DEFAULT_THRESHOLD_NM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NmeaError;

    fn set(name: &str, points: &[(&str, f64, f64)]) -> WaypointSet {
        WaypointSet::from_waypoints(
            name,
            points
                .iter()
                .map(|&(n, lat, lon)| Waypoint::new(n, lat, lon))
                .collect(),
        )
    }

    #[test]
    fn test_near_duplicate_keeps_master_name() {
        let master = set("MASTER", &[("Chesapeake 59A", 37.6787, -76.1936)]);
        let update = set("UPDATE", &[("CHES 59A", 37.67871, -76.19362)]);
        let outcome = Reconciler::default().merge(&master, &update);

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged.waypoints[0].name, "Chesapeake 59A");
        assert_eq!(outcome.merged.waypoints[0].latitude, 37.6787);
        assert_eq!(outcome.audit.len(), 1);
        assert_eq!(outcome.audit[0].update_name, "CHES 59A");
        assert_eq!(outcome.audit[0].master_name, "Chesapeake 59A");
        assert!(outcome.audit[0].distance_nm < DEFAULT_THRESHOLD_NM);
    }

    #[test]
    fn test_same_name_far_apart_both_kept() {
        let master = set("MASTER", &[("R2", 37.6787, -76.1936)]);
        let update = set("UPDATE", &[("R2", 37.6800, -76.1936)]);
        let outcome = Reconciler::default().merge(&master, &update);
        assert_eq!(outcome.merged.len(), 2);
        assert!(outcome.audit.is_empty());
    }

    #[test]
    fn test_unmatched_appended_in_update_order() {
        let master = set("MASTER", &[("A", 10.0, 10.0), ("B", 20.0, 20.0)]);
        let update = set("UPDATE", &[("Z", 30.0, 30.0), ("A2", 10.0, 10.0), ("Y", 40.0, 40.0)]);
        let outcome = Reconciler::default().merge(&master, &update);
        let names: Vec<&str> = outcome.merged.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Z", "Y"]);
        assert_eq!(outcome.merged.name, "MASTER");
    }

    #[test]
    fn test_nearest_master_wins() {
        let master = set("MASTER", &[("FAR", 37.67875, -76.1936), ("NEAR", 37.67871, -76.1936)]);
        let update = set("UPDATE", &[("U", 37.6787, -76.1936)]);
        let outcome = Reconciler::default().merge(&master, &update);
        assert_eq!(outcome.audit[0].master_name, "NEAR");
    }

    #[test]
    fn test_tie_resolves_to_first_master() {
        let master = set("MASTER", &[("FIRST", 37.6787, -76.1936), ("SECOND", 37.6787, -76.1936)]);
        let update = set("UPDATE", &[("U", 37.67871, -76.1936)]);
        let outcome = Reconciler::default().merge(&master, &update);
        assert_eq!(outcome.audit[0].master_name, "FIRST");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let master = set("MASTER", &[("A", 10.0, 10.0)]);
        let update = set("UPDATE", &[("B", 11.0, 11.0), ("A'", 10.00001, 10.0)]);
        let reconciler = Reconciler::default();
        let once = reconciler.merge(&master, &update);
        let twice = reconciler.merge(&once.merged, &update);
        assert_eq!(once.merged, twice.merged);
        assert_eq!(twice.audit.len(), 2);

        let empty = WaypointSet::new("UPDATE");
        let noop = reconciler.merge(&once.merged, &empty);
        assert_eq!(noop.merged, once.merged);
        assert!(noop.audit.is_empty());
    }

    #[test]
    fn test_empty_master_takes_everything() {
        let master = WaypointSet::new("MASTER");
        let update = set("UPDATE", &[("A", 1.0, 1.0), ("A", 1.0, 1.0)]);
        let outcome = Reconciler::default().merge(&master, &update);
        assert_eq!(outcome.merged.len(), 2);
    }

    #[test]
    fn test_master_duplicates_reported() {
        let master = set(
            "MASTER",
            &[("G1", 37.6787, -76.1936), ("X", 38.0, -76.0), ("G1 copy", 37.67871, -76.19362)],
        );
        let duplicates = Reconciler::default().master_duplicates(&master);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].first, "G1");
        assert_eq!(duplicates[0].second, "G1 copy");
    }

    #[test]
    fn test_merge_report_carries_master_duplicates() {
        let master = set("MASTER", &[("G1", 37.6787, -76.1936), ("G1 copy", 37.67871, -76.19362)]);
        let update = set("UPDATE", &[("CHES", 37.67870, -76.19361), ("NEW", 38.5, -76.5)]);
        let outcome = Reconciler::default().merge(&master, &update);
        assert_eq!(outcome.master_duplicates.len(), 1);
        assert_eq!(outcome.merged.len(), 3);

        let report = serde_json::to_value(outcome.report()).unwrap();
        assert_eq!(report["near_duplicates"].as_array().unwrap().len(), 1);
        assert_eq!(report["near_duplicates"][0]["update_name"], "CHES");
        assert_eq!(report["master_duplicates"][0]["first"], "G1");
        assert_eq!(report["master_duplicates"][0]["second"], "G1 copy");
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(Reconciler::new(0.0), Err(NmeaError::Configuration(_))));
        assert!(matches!(Reconciler::new(-0.01), Err(NmeaError::Configuration(_))));
        assert!(Reconciler::new(0.01).is_ok());
    }
}
