//! City point datasets used by riders to pick trip endpoints.
//!
//! Each city is a GeoJSON `FeatureCollection` of address points stored as
//! `{dir}/{city}_clean.geojson`. Datasets are read lazily on first use and
//! cached for the lifetime of the [`CityCatalog`].

use crate::geo::LatLng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading a city dataset.
#[derive(Debug, Error)]
pub enum CityDataError {
    #[error("failed to read city data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse city data {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A display name plus the coordinate it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub location: LatLng,
}

impl NamedPoint {
    pub fn new(name: impl Into<String>, location: LatLng) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityData {
    #[serde(default)]
    pub features: Vec<CityFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityFeature {
    #[serde(default)]
    pub properties: CityProperties,
    pub geometry: CityGeometry,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityProperties {
    #[serde(rename = "addr:street", default)]
    pub street: String,
    #[serde(rename = "addr:housenumber", default)]
    pub housenumber: String,
    #[serde(rename = "addr:postcode", default)]
    pub postcode: String,
    #[serde(rename = "addr:city", default)]
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityGeometry {
    /// GeoJSON order: `[lng, lat]`.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl CityFeature {
    /// Converts the feature to a named point; `None` when it has no usable coordinate.
    pub fn to_named_point(&self) -> Option<NamedPoint> {
        let [lng, lat, ..] = self.geometry.coordinates.as_slice() else {
            return None;
        };
        let p = &self.properties;
        let name = format!("{} {}, {} {}", p.street, p.housenumber, p.postcode, p.city);
        Some(NamedPoint::new(name, LatLng::new(*lat, *lng)))
    }
}

impl CityData {
    pub fn named_points(&self) -> Vec<NamedPoint> {
        self.features
            .iter()
            .filter_map(CityFeature::to_named_point)
            .collect()
    }
}

/// Lazily loaded, cached city datasets keyed by city identifier.
#[derive(Debug)]
pub struct CityCatalog {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<Vec<NamedPoint>>>>,
}

impl CityCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A catalog pre-populated with in-memory datasets; nothing is read from disk
    /// for these cities.
    pub fn with_points<I, S>(datasets: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<NamedPoint>)>,
        S: Into<String>,
    {
        let cache = datasets
            .into_iter()
            .map(|(city, points)| (city.into(), Arc::new(points)))
            .collect();
        Self {
            dir: PathBuf::new(),
            cache: Mutex::new(cache),
        }
    }

    pub fn dataset_path(&self, city: &str) -> PathBuf {
        self.dir.join(format!("{city}_clean.geojson"))
    }

    /// Returns every named point of `city`, reading the dataset on first use.
    pub async fn points(&self, city: &str) -> Result<Arc<Vec<NamedPoint>>, CityDataError> {
        if let Some(points) = self.cached(city) {
            debug!(city, count = points.len(), "City data cache hit");
            return Ok(points);
        }

        let path = self.dataset_path(city);
        let points = Arc::new(load_city_data(&path).await?.named_points());
        info!(city, count = points.len(), "Loaded city data");

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cache.entry(city.to_string()).or_insert(points).clone())
    }

    fn cached(&self, city: &str) -> Option<Arc<Vec<NamedPoint>>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(city).cloned()
    }
}

async fn load_city_data(path: &Path) -> Result<CityData, CityDataError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CityDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| CityDataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
