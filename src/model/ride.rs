use crate::geo::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-owned lifecycle of a ride request.
///
/// Transitions are monotonic (`Available → Accepted/InProgress → Finished`)
/// and are driven by the backend; the simulator only requests them. On the
/// wire the state is its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RideRequestState {
    Available,
    Accepted,
    InProgress,
    Finished,
}

impl RideRequestState {
    /// Accepted or in progress: a driver owns it and has not finished it.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl TryFrom<u8> for RideRequestState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Available),
            1 => Ok(Self::Accepted),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Finished),
            other => Err(format!("unknown ride request state {other}")),
        }
    }
}

impl From<RideRequestState> for u8 {
    fn from(state: RideRequestState) -> Self {
        state as u8
    }
}

impl fmt::Display for RideRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "available",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// A snapshot of a ride request as last seen from the backend.
///
/// Snapshots go stale: the only way to observe a state change is to fetch
/// the ride again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    pub id: i64,
    pub rider_id: i64,
    #[serde(default)]
    pub driver_id: Option<i64>,
    pub from_lat: f64,
    pub from_lng: f64,
    #[serde(default)]
    pub from_name: String,
    pub to_lat: f64,
    pub to_lng: f64,
    #[serde(default)]
    pub to_name: String,
    pub state: RideRequestState,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RideRequest {
    pub fn from(&self) -> LatLng {
        LatLng::new(self.from_lat, self.from_lng)
    }

    pub fn to(&self) -> LatLng {
        LatLng::new(self.to_lat, self.to_lng)
    }
}

/// Body of a create-ride-request call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestCreate {
    pub from_lat: f64,
    pub from_lng: f64,
    pub from_name: String,
    pub to_lat: f64,
    pub to_lng: f64,
    pub to_name: String,
}

/// Last position the backend recorded for a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub vehicle_id: i64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub speed: f64,
}

/// The vehicle assigned to a driver account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "RegistrationCountry", default)]
    pub registration_country: String,
    #[serde(rename = "RegistrationNumber", default)]
    pub registration_number: String,
    #[serde(rename = "OwnerID", default)]
    pub owner_id: i64,
    #[serde(rename = "lastRecordedPosition", default)]
    pub last_recorded_position: Option<VehiclePosition>,
}

/// The backend's profile for the signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub simulated: bool,
    #[serde(default)]
    pub user_id: String,
}

/// Body of a vehicle position update. `speed` is in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub lat: f64,
    pub lng: f64,
    pub bearing: f64,
    pub speed: f64,
}

impl PositionUpdate {
    pub fn at(location: LatLng, bearing: f64, speed: f64) -> Self {
        Self {
            lat: location.lat,
            lng: location.lng,
            bearing,
            speed,
        }
    }

    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Body of a post-log call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub tag: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_request_decodes_backend_json() {
        let json = r#"{
            "id": 7,
            "riderId": 3,
            "driverId": null,
            "fromLat": 59.91, "fromLng": 10.75, "fromName": "Karl Johans gate 1",
            "toLat": 59.93, "toLng": 10.71, "toName": "Bogstadveien 2",
            "state": 2,
            "directionsVersion": null,
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:05:00.123456Z"
        }"#;
        let ride: RideRequest = serde_json::from_str(json).unwrap();
        assert_eq!(ride.id, 7);
        assert_eq!(ride.driver_id, None);
        assert_eq!(ride.state, RideRequestState::InProgress);
        assert!(ride.state.is_active());
        assert_eq!(ride.to(), LatLng::new(59.93, 10.71));
        assert!(ride.created_at.is_some());
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let json = r#"{"id":1,"riderId":1,"fromLat":0,"fromLng":0,"toLat":0,"toLng":0,"state":9}"#;
        assert!(serde_json::from_str::<RideRequest>(json).is_err());
    }

    #[test]
    fn test_vehicle_uses_backend_field_names() {
        let json = r#"{
            "ID": 12, "RegistrationCountry": "NO", "RegistrationNumber": "EL12345",
            "OwnerID": 4, "Icon": "",
            "lastRecordedPosition": {"id": 1, "vehicleId": 12, "lat": 59.9, "lng": 10.7,
                "recordedAt": "2024-03-01T10:00:00Z", "bearing": 90, "speed": 30}
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.id, 12);
        let position = vehicle.last_recorded_position.unwrap();
        assert_eq!((position.lat, position.lng), (59.9, 10.7));
    }

    #[test]
    fn test_state_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&RideRequestState::Finished).unwrap(), "3");
    }
}
