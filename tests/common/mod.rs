//! Fixtures shared by the scenario tests.
#![allow(dead_code)]

use ride_sim::clients::mock::ApiCall;
use ride_sim::geo::LatLng;
use ride_sim::model::{
    BackendUser, Directions, Maneuver, Route, RideRequest, RideRequestState, Segment, Step,
    Summary, Vehicle, VehiclePosition,
};

/// `(0, 0) → (0, 1)` as an encoded polyline.
pub const EQUATOR_ONE_DEGREE: &str = "???_ibE";

pub fn user(id: i64) -> BackendUser {
    BackendUser {
        id,
        name: format!("sim-{id}"),
        simulated: true,
        user_id: format!("uid-{id}"),
    }
}

pub fn vehicle(id: i64, last_position: Option<LatLng>) -> Vehicle {
    Vehicle {
        id,
        registration_country: "DE".into(),
        registration_number: format!("B-SIM-{id}"),
        owner_id: 1,
        last_recorded_position: last_position.map(|p| VehiclePosition {
            id: 1,
            vehicle_id: id,
            lat: p.lat,
            lng: p.lng,
            recorded_at: None,
            bearing: 0.0,
            speed: 0.0,
        }),
    }
}

pub fn ride(id: i64, from: LatLng, to: LatLng) -> RideRequest {
    RideRequest {
        id,
        rider_id: 100,
        driver_id: None,
        from_lat: from.lat,
        from_lng: from.lng,
        from_name: "Origin".into(),
        to_lat: to.lat,
        to_lng: to.lng,
        to_name: "Destination".into(),
        state: RideRequestState::Available,
        price: 12.5,
        currency: "EUR".into(),
        created_at: None,
        updated_at: None,
    }
}

/// One route, one segment, one step covering the whole `geometry`.
pub fn single_step_directions(geometry: &str, last_index: i64, distance: f64, duration: f64) -> Directions {
    Directions {
        bbox: vec![],
        routes: vec![Route {
            summary: Summary { distance, duration },
            segments: vec![Segment {
                distance,
                duration,
                steps: vec![Step {
                    distance,
                    duration,
                    kind: 11,
                    instruction: "Head east".into(),
                    name: "Equator".into(),
                    way_points: vec![0, last_index],
                    maneuver: Maneuver {
                        location: vec![0.0, 0.0],
                        bearing_before: 0.0,
                        bearing_after: 90.0,
                    },
                }],
            }],
            bbox: vec![],
            geometry: geometry.into(),
            way_points: vec![0, last_index],
        }],
    }
}

pub fn is_log_containing(call: &ApiCall, needle: &str) -> bool {
    matches!(call, ApiCall::PostLog { message, .. } if message.contains(needle))
}
