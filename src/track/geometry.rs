//! Circuit geometry lookup.
//!
//! Geometry is a read-only dataset keyed by circuit and year. It is fetched
//! once per session and never changes afterwards, so sources only need to
//! answer point lookups.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::transform::{Point, transform_xy};

// ============================================================================
// TrackGeometry
// ============================================================================

/// Polyline and orientation of one circuit layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackGeometry {
    /// Circuit name.
    pub name: String,
    /// Circuit location.
    pub location: String,
    /// Rotation in degrees applied to every projected point.
    pub rotation: f64,
    /// Polyline X coordinates.
    pub x: Vec<f64>,
    /// Polyline Y coordinates.
    pub y: Vec<f64>,
}

impl TrackGeometry {
    /// Returns the polyline projected into screen space.
    #[must_use]
    pub fn outline(&self) -> Vec<Point> {
        transform_xy(&self.x, &self.y, self.rotation)
    }

    /// Returns the number of polyline points.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    /// Returns `true` if the polyline is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// GeometrySource
// ============================================================================

/// Keyed lookup of circuit geometry.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Fetches the layout of `circuit_key` as used in `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is unknown or cannot be fetched.
    async fn geometry(&self, circuit_key: u32, year: u16) -> Result<TrackGeometry>;
}

// ============================================================================
// HttpGeometrySource
// ============================================================================

/// Geometry served over HTTP at `{base}/{circuit_key}/{year}`.
#[derive(Debug, Clone)]
pub struct HttpGeometrySource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGeometrySource {
    /// Creates a source rooted at `base_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Returns the lookup URL of a circuit layout.
    #[must_use]
    pub fn url(&self, circuit_key: u32, year: u16) -> String {
        format!("{}/{circuit_key}/{year}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GeometrySource for HttpGeometrySource {
    async fn geometry(&self, circuit_key: u32, year: u16) -> Result<TrackGeometry> {
        let url = self.url(circuit_key, year);
        debug!(%url, "Fetching track geometry");

        let geometry = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<TrackGeometry>()
            .await?;
        Ok(geometry)
    }
}

// ============================================================================
// StaticGeometrySource
// ============================================================================

/// In-memory geometry dataset.
#[derive(Debug, Clone, Default)]
pub struct StaticGeometrySource {
    layouts: FxHashMap<(u32, u16), TrackGeometry>,
}

impl StaticGeometrySource {
    /// Creates an empty dataset.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layout.
    #[must_use]
    pub fn with(mut self, circuit_key: u32, year: u16, geometry: TrackGeometry) -> Self {
        self.layouts.insert((circuit_key, year), geometry);
        self
    }
}

#[async_trait]
impl GeometrySource for StaticGeometrySource {
    async fn geometry(&self, circuit_key: u32, year: u16) -> Result<TrackGeometry> {
        self.layouts
            .get(&(circuit_key, year))
            .cloned()
            .ok_or_else(|| Error::config(format!("No geometry for circuit {circuit_key} in {year}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
