//! Hexagonal grid indexing backed by H3.
//!
//! Cell ids are rendered as the canonical lowercase hex string, e.g.
//! `8110bffffffffff` for (50, 50) at resolution 1.

use h3o::{CellIndex, LatLng, Resolution};

use crate::traits::OpError;

/// Maps coordinates to cells at one fixed resolution.
#[derive(Debug, Clone, Copy)]
pub struct Grid {
    resolution: Resolution,
}

impl Grid {
    pub fn new(resolution: u8) -> Result<Self, OpError> {
        let resolution = Resolution::try_from(resolution)
            .map_err(|e| OpError::Config(format!("invalid grid resolution {resolution}: {e}")))?;
        Ok(Self { resolution })
    }

    pub fn resolution(&self) -> u8 {
        u8::from(self.resolution)
    }

    /// Cell containing (`lat`, `lng`), in degrees.
    ///
    /// Non-finite or out-of-range coordinates are rejected rather than wrapped.
    pub fn cell(&self, lat: f64, lng: f64) -> Result<CellIndex, OpError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(OpError::Data(format!(
                "coordinate ({lat}, {lng}) is outside the valid latitude/longitude range"
            )));
        }
        let ll = LatLng::new(lat, lng)
            .map_err(|e| OpError::Data(format!("coordinate ({lat}, {lng}): {e}")))?;
        Ok(ll.to_cell(self.resolution))
    }

    pub fn cell_id(&self, lat: f64, lng: f64) -> Result<String, OpError> {
        self.cell(lat, lng).map(|c| c.to_string())
    }
}

/// Approximate centre of `cell` as (latitude, longitude) in degrees.
pub fn centroid(cell: CellIndex) -> (f64, f64) {
    let ll = LatLng::from(cell);
    (ll.lat(), ll.lng())
}
