mod common;

use common::*;
use ride_sim::clients::{ApiError, AuthSettings, BackendApi, HttpBackend};
use ride_sim::geo::LatLng;
use ride_sim::model::{NamedPoint, PositionUpdate};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SIGN_IN_PATH: &str = "/v1/accounts:signInWithPassword";

/// A client whose backend and identity provider are both `server`.
fn client(server: &MockServer) -> Result<HttpBackend, Box<dyn std::error::Error>> {
    let url = server.uri().parse::<Url>()?;
    let auth = AuthSettings {
        url: url.clone(),
        api_key: "test-key".to_string(),
    };
    Ok(HttpBackend::new(url, auth)?)
}

async fn mount_sign_in(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idToken": token,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        })))
        .mount(server)
        .await;
}

async fn signed_in(server: &MockServer) -> Result<HttpBackend, Box<dyn std::error::Error>> {
    mount_sign_in(server, "tok-1").await;
    let backend = client(server)?;
    backend.sign_in("driver@example.com", "secret").await?;
    Ok(backend)
}

#[tokio::test]
async fn test_sign_in_posts_credentials_and_caches_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "email": "driver@example.com",
            "password": "secret",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/user"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "Sim Driver",
            "simulated": true,
            "userId": "uid-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = client(&server)?;
    backend.sign_in("driver@example.com", "secret").await?;
    backend.sign_in("driver@example.com", "secret").await?;
    assert!(backend.is_signed_in());

    let me = backend.get_my_user().await;
    assert_eq!(me.map(|u| u.id), Some(42));
    Ok(())
}

#[tokio::test]
async fn test_rejected_sign_in_is_an_error() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("INVALID_PASSWORD"))
        .mount(&server)
        .await;

    let backend = client(&server)?;
    let result = backend.sign_in("driver@example.com", "wrong").await;

    assert!(matches!(
        result,
        Err(ApiError::SignInRejected { status: 400, ref body }) if body.contains("INVALID_PASSWORD")
    ));
    assert!(!backend.is_signed_in());
    Ok(())
}

#[tokio::test]
async fn test_calls_without_session_fail_soft() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = client(&server)?;
    assert!(backend.get_vehicle().await.is_none());
    assert!(backend.get_my_rides().await.is_empty());
    assert!(!backend.claim_ride_request(5).await);
    assert!(backend.get_directions(5, None).await.is_none());
    backend.post_log("D", "hello").await;
    Ok(())
}

#[tokio::test]
async fn test_claim_reports_lost_race() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/rides/5/claim"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/rides/6/claim"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    assert!(backend.claim_ride_request(5).await);
    assert!(!backend.claim_ride_request(6).await);
    Ok(())
}

#[tokio::test]
async fn test_server_errors_become_sentinels() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/rides/mine"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/rides/available"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/rides/5/finish"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    assert!(backend.get_my_rides().await.is_empty());
    assert!(backend.get_available_ride_requests().await.is_empty());
    assert!(!backend.finish_ride_request(5).await);
    Ok(())
}

#[tokio::test]
async fn test_rides_are_decoded() -> TestResult {
    let server = MockServer::start().await;
    let mut mine = ride(12, LatLng::new(52.5, 13.4), LatLng::new(52.52, 13.405));
    mine.driver_id = Some(42);
    Mock::given(method("GET"))
        .and(path("/v1/rides/mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([mine.clone()])))
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    assert_eq!(backend.get_my_rides().await, vec![mine.clone()]);
    assert_eq!(backend.get_ride_request(12).await, Some(mine));
    assert_eq!(backend.get_ride_request(13).await, None);
    Ok(())
}

#[tokio::test]
async fn test_get_vehicle_takes_first() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/vehicles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "ID": 7,
                "RegistrationCountry": "DE",
                "RegistrationNumber": "B-SIM-7",
                "OwnerID": 42,
                "lastRecordedPosition": { "lat": 52.5, "lng": 13.4 }
            },
            { "ID": 8 }
        ])))
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    let vehicle = backend.get_vehicle().await;

    assert_eq!(vehicle.as_ref().map(|v| v.id), Some(7));
    let parked = vehicle.and_then(|v| v.last_recorded_position);
    assert_eq!(parked.map(|p| (p.lat, p.lng)), Some((52.5, 13.4)));
    Ok(())
}

#[tokio::test]
async fn test_directions_send_start_override() -> TestResult {
    let server = MockServer::start().await;
    let directions = single_step_directions(EQUATOR_ONE_DEGREE, 1, 111_195.0, 600.0);
    Mock::given(method("POST"))
        .and(path("/v1/rides/9/directions"))
        .and(query_param("startLat", "52.5"))
        .and(query_param("startLng", "13.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&directions))
        .expect(1)
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    let fetched = backend
        .get_directions(9, Some(LatLng::new(52.5, 13.4)))
        .await;
    assert_eq!(fetched, Some(directions));
    Ok(())
}

#[tokio::test]
async fn test_create_and_update_position_bodies() -> TestResult {
    let server = MockServer::start().await;
    let created = ride(1001, LatLng::new(52.5, 13.4), LatLng::new(52.52, 13.405));
    Mock::given(method("POST"))
        .and(path("/v1/rides/"))
        .and(body_partial_json(json!({
            "fromLat": 52.5,
            "fromLng": 13.4,
            "fromName": "Origin",
            "toName": "Destination"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&created))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/vehicles/7/position"))
        .and(body_json(json!({
            "lat": 52.5,
            "lng": 13.4,
            "bearing": 90.0,
            "speed": 30.0
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = signed_in(&server).await?;
    let from = NamedPoint::new("Origin", LatLng::new(52.5, 13.4));
    let to = NamedPoint::new("Destination", LatLng::new(52.52, 13.405));

    assert_eq!(backend.create_ride_request(&from, &to).await, Some(created));
    backend
        .update_position(7, PositionUpdate::at(LatLng::new(52.5, 13.4), 90.0, 30.0))
        .await;
    Ok(())
}

#[tokio::test]
async fn test_reset_session_forces_new_sign_in() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok-1" })))
        .expect(2)
        .mount(&server)
        .await;

    let backend = client(&server)?;
    backend.sign_in("driver@example.com", "secret").await?;
    backend.reset_session();
    assert!(!backend.is_signed_in());

    backend.sign_in("driver@example.com", "secret").await?;
    assert!(backend.is_signed_in());
    Ok(())
}

async fn sign_in_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().ends_with(SIGN_IN_PATH))
        .count()
}

/// Pattern: Session Renewal
/// An expired token is answered with 401; the client signs in again and retries once.
#[tokio::test]
async fn test_expired_session_is_renewed_and_call_retried() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok-1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SIGN_IN_PATH))
        .and(body_partial_json(json!({
            "email": "driver@example.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok-2" })))
        .mount(&server)
        .await;

    let open = ride(3, LatLng::new(52.5, 13.4), LatLng::new(52.52, 13.405));
    Mock::given(method("GET"))
        .and(path("/v1/rides/available"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/rides/available"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([open.clone()])))
        .expect(2)
        .mount(&server)
        .await;

    let backend = client(&server)?;
    backend.sign_in("driver@example.com", "secret").await?;

    assert_eq!(backend.get_available_ride_requests().await, vec![open.clone()]);
    // The renewed token is kept for later calls.
    assert_eq!(backend.get_available_ride_requests().await, vec![open]);
    assert_eq!(sign_in_count(&server).await, 2);
    Ok(())
}

#[tokio::test]
async fn test_persistent_unauthorized_retries_only_once() -> TestResult {
    let server = MockServer::start().await;
    mount_sign_in(&server, "tok-1").await;
    Mock::given(method("PUT"))
        .and(path("/v1/rides/5/claim"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let backend = client(&server)?;
    backend.sign_in("driver@example.com", "secret").await?;

    assert!(!backend.claim_ride_request(5).await);
    assert_eq!(sign_in_count(&server).await, 2);
    Ok(())
}

#[tokio::test]
async fn test_sign_in_keeps_auth_url_path_prefix() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idToken": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = server.uri().parse::<Url>()?;
    let auth = AuthSettings {
        url: format!("{}/identitytoolkit.googleapis.com", server.uri()).parse()?,
        api_key: "test-key".to_string(),
    };
    let backend = HttpBackend::new(base_url, auth)?;

    backend.sign_in("driver@example.com", "secret").await?;
    assert!(backend.is_signed_in());
    Ok(())
}
