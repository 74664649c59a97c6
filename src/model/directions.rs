//! Directions documents as returned by the backend's directions endpoint
//! (an openrouteservice-shaped response).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    #[serde(default)]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// One route; all of its steps index into the shared encoded `geometry`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub geometry: String,
    #[serde(default)]
    pub way_points: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub name: String,
    /// `[start, end]` indices into the route's decoded geometry, inclusive.
    #[serde(default)]
    pub way_points: Vec<i64>,
    #[serde(default)]
    pub maneuver: Maneuver,
}

impl Step {
    /// The inclusive polyline index range this step covers, if well-formed.
    pub fn way_point_range(&self) -> Option<(usize, usize)> {
        match self.way_points.as_slice() {
            [start, end] if *start >= 0 && end >= start => Some((*start as usize, *end as usize)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    /// `[lng, lat]` of the maneuver.
    #[serde(default)]
    pub location: Vec<f64>,
    #[serde(default)]
    pub bearing_before: f64,
    #[serde(default)]
    pub bearing_after: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_way_point_range_requires_two_ordered_indices() {
        let step = |way_points: Vec<i64>| Step {
            way_points,
            ..Default::default()
        };
        assert_eq!(step(vec![0, 4]).way_point_range(), Some((0, 4)));
        assert_eq!(step(vec![3, 3]).way_point_range(), Some((3, 3)));
        assert_eq!(step(vec![4, 0]).way_point_range(), None);
        assert_eq!(step(vec![1]).way_point_range(), None);
        assert_eq!(step(vec![0, 1, 2]).way_point_range(), None);
        assert_eq!(step(vec![-1, 2]).way_point_range(), None);
    }

    #[test]
    fn test_decodes_openrouteservice_document() {
        let json = r#"{
            "bbox": [10.7, 59.9, 10.8, 60.0],
            "routes": [{
                "summary": {"distance": 1234.5, "duration": 180.2},
                "segments": [{
                    "distance": 1234.5, "duration": 180.2,
                    "steps": [{
                        "distance": 1234.5, "duration": 180.2, "type": 11,
                        "instruction": "Head north", "name": "-",
                        "way_points": [0, 1],
                        "maneuver": {"location": [10.7, 59.9], "bearing_before": 0, "bearing_after": 12}
                    }]
                }],
                "geometry": "_p~iF~ps|U_ulLnnqC",
                "way_points": [0, 1],
                "legs": []
            }],
            "metadata": {"service": "routing"}
        }"#;
        let directions: Directions = serde_json::from_str(json).unwrap();
        let step = &directions.routes[0].segments[0].steps[0];
        assert_eq!(step.maneuver.bearing_after, 12.0);
        assert_eq!(step.way_point_range(), Some((0, 1)));
    }
}
