//! Geocoding adapters

use async_trait::async_trait;

use crate::application::ports::Geocoder;

/// Geocoder for deployments without a lookup service; never resolves.
#[derive(Debug, Default, Clone)]
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn geocode(&self, _address: &str) -> Option<(f64, f64)> {
        None
    }
}
