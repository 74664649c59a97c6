//! # HTTP Backend Client
//!
//! reqwest-backed [`BackendApi`]. Every backend call goes through a private
//! `try_*` method returning `Result<_, ApiError>`; the trait methods wrap
//! those with [`fail_soft`], which logs the error and substitutes a sentinel.
//!
//! ID tokens expire (an hour for the identity toolkit). The client keeps the
//! credentials of its last sign-in, and a `401` on any call triggers one
//! fresh sign-in followed by a single retry of that call.
use super::{ApiError, BackendApi};
use crate::geo::LatLng;
use crate::model::{
    BackendUser, Directions, LogEntry, NamedPoint, PositionUpdate, RideRequest,
    RideRequestCreate, Vehicle,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to obtain session tokens.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Base URL of the identity toolkit (password sign-in) service.
    pub url: Url,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
}

/// Client for one actor's session against the backend API.
#[derive(Debug)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthSettings,
    token: RwLock<Option<String>>,
    credentials: RwLock<Option<Credentials>>,
}

#[derive(Clone)]
struct Credentials {
    email: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(base_url: Url, auth: AuthSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth,
            token: RwLock::new(None),
            credentials: RwLock::new(None),
        })
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn store_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.token().ok_or(ApiError::NotSignedIn)?;
        Ok(self
            .http
            .request(method, self.endpoint(path))
            .bearer_auth(token))
    }

    /// Sends an authorized request built by `build`. On `401` the session is
    /// renewed with the stored credentials and the request is sent once more.
    async fn send_authorized<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let resp = build(self.authorized(method.clone(), path)?).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        let credentials = self
            .credentials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let Some(credentials) = credentials else {
            return Ok(resp);
        };

        info!(path, "Session rejected, signing in again");
        self.store_token(None);
        let token = self
            .try_sign_in(&credentials.email, &credentials.password)
            .await?;
        self.store_token(Some(token));

        Ok(build(self.authorized(method, path)?).send().await?)
    }

    async fn try_get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ApiError> {
        let resp = self.send_authorized(Method::GET, path, |req| req).await?;
        let resp = expect_ok(operation, resp)?;
        Ok(resp.json().await?)
    }

    async fn try_put(&self, operation: &'static str, path: &str) -> Result<(), ApiError> {
        let resp = self.send_authorized(Method::PUT, path, |req| req).await?;
        expect_ok(operation, resp).map(|_| ())
    }

    /// `{auth_url}/v1/accounts:signInWithPassword?key=...`, keeping any path
    /// prefix of the auth URL (the emulator serves under one).
    fn sign_in_url(&self) -> Result<Url, ApiError> {
        let base = self.auth.url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/v1/accounts:signInWithPassword"))?;
        url.query_pairs_mut().append_pair("key", &self.auth.api_key);
        Ok(url)
    }

    async fn try_sign_in(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = self.sign_in_url()?;

        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::SignInRejected {
                status: status.as_u16(),
                body,
            });
        }
        let body: SignInResponse = resp.json().await?;
        Ok(body.id_token)
    }

    async fn try_get_vehicle(&self) -> Result<Option<Vehicle>, ApiError> {
        let vehicles: Vec<Vehicle> = self.try_get_json("get_vehicle", "/v1/vehicles").await?;
        Ok(vehicles.into_iter().next())
    }

    async fn try_create_ride_request(
        &self,
        from: &NamedPoint,
        to: &NamedPoint,
    ) -> Result<RideRequest, ApiError> {
        let body = RideRequestCreate {
            from_lat: from.location.lat,
            from_lng: from.location.lng,
            from_name: from.name.clone(),
            to_lat: to.location.lat,
            to_lng: to.location.lng,
            to_name: to.name.clone(),
        };
        let resp = self
            .send_authorized(Method::POST, "/v1/rides/", |req| req.json(&body))
            .await?;
        Ok(expect_ok("create_ride_request", resp)?.json().await?)
    }

    async fn try_get_directions(
        &self,
        ride_id: i64,
        start: Option<LatLng>,
    ) -> Result<Directions, ApiError> {
        let (start_lat, start_lng) = start
            .map(|p| (p.lat.to_string(), p.lng.to_string()))
            .unwrap_or_default();
        let query = [("startLat", start_lat), ("startLng", start_lng)];
        let resp = self
            .send_authorized(Method::POST, &format!("/v1/rides/{ride_id}/directions"), |req| {
                req.query(&query)
            })
            .await?;
        Ok(expect_ok("get_directions", resp)?.json().await?)
    }

    async fn try_update_position(
        &self,
        vehicle_id: i64,
        update: &PositionUpdate,
    ) -> Result<(), ApiError> {
        let resp = self
            .send_authorized(Method::PUT, &format!("/v1/vehicles/{vehicle_id}/position"), |req| {
                req.json(update)
            })
            .await?;
        if !resp.status().is_success() {
            debug!(vehicle_id, status = resp.status().as_u16(), "Position update not accepted");
        }
        Ok(())
    }

    async fn try_post_log(&self, entry: &LogEntry) -> Result<(), ApiError> {
        let resp = self
            .send_authorized(Method::POST, "/v1/me/log", |req| req.json(entry))
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                operation: "post_log",
                status: resp.status().as_u16(),
            })
        }
    }
}

fn expect_ok(operation: &'static str, resp: Response) -> Result<Response, ApiError> {
    if resp.status() == StatusCode::OK {
        Ok(resp)
    } else {
        Err(ApiError::Status {
            operation,
            status: resp.status().as_u16(),
        })
    }
}

/// Logs a failed call and substitutes `fallback`.
fn fail_soft<T>(operation: &'static str, result: Result<T, ApiError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(operation, error = %e, "Backend call failed");
            fallback
        }
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), ApiError> {
        if self.is_signed_in() {
            debug!("Session already cached");
            return Ok(());
        }
        let token = self.try_sign_in(email, password).await?;
        self.store_token(Some(token));
        *self.credentials.write().unwrap_or_else(|e| e.into_inner()) = Some(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        });
        debug!("Signed in");
        Ok(())
    }

    fn reset_session(&self) {
        self.store_token(None);
        *self.credentials.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    #[instrument(skip(self))]
    async fn get_vehicle(&self) -> Option<Vehicle> {
        fail_soft("get_vehicle", self.try_get_vehicle().await, None)
    }

    #[instrument(skip(self))]
    async fn get_my_user(&self) -> Option<BackendUser> {
        let result = self.try_get_json("get_my_user", "/v1/me/user").await;
        fail_soft("get_my_user", result.map(Some), None)
    }

    #[instrument(skip(self))]
    async fn get_my_rides(&self) -> Vec<RideRequest> {
        let result = self.try_get_json("get_my_rides", "/v1/rides/mine").await;
        fail_soft("get_my_rides", result, Vec::new())
    }

    #[instrument(skip(self))]
    async fn get_available_ride_requests(&self) -> Vec<RideRequest> {
        let result = self
            .try_get_json("get_available_ride_requests", "/v1/rides/available")
            .await;
        fail_soft("get_available_ride_requests", result, Vec::new())
    }

    #[instrument(skip(self))]
    async fn claim_ride_request(&self, id: i64) -> bool {
        let result = self
            .try_put("claim_ride_request", &format!("/v1/rides/{id}/claim"))
            .await;
        fail_soft("claim_ride_request", result.map(|_| true), false)
    }

    #[instrument(skip(self, from, to), fields(from = %from.name, to = %to.name))]
    async fn create_ride_request(&self, from: &NamedPoint, to: &NamedPoint) -> Option<RideRequest> {
        let result = self.try_create_ride_request(from, to).await;
        fail_soft("create_ride_request", result.map(Some), None)
    }

    #[instrument(skip(self))]
    async fn finish_ride_request(&self, id: i64) -> bool {
        let result = self
            .try_put("finish_ride_request", &format!("/v1/rides/{id}/finish"))
            .await;
        fail_soft("finish_ride_request", result.map(|_| true), false)
    }

    #[instrument(skip(self))]
    async fn get_directions(&self, ride_id: i64, start: Option<LatLng>) -> Option<Directions> {
        let result = self.try_get_directions(ride_id, start).await;
        fail_soft("get_directions", result.map(Some), None)
    }

    #[instrument(skip(self, update), level = "trace")]
    async fn update_position(&self, vehicle_id: i64, update: PositionUpdate) {
        let result = self.try_update_position(vehicle_id, &update).await;
        fail_soft("update_position", result, ());
    }

    #[instrument(skip(self, message), level = "trace")]
    async fn post_log(&self, tag: &str, message: &str) {
        let entry = LogEntry {
            tag: tag.to_string(),
            message: message.to_string(),
        };
        let result = self.try_post_log(&entry).await;
        fail_soft("post_log", result, ());
    }
}
