use compass_core::latlng::LatLng;
use serde::Serialize;

use crate::define_id_newtype;

define_id_newtype!(PointId);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementPoint {
    pub id: PointId,
    pub lat: f64,
    pub lng: f64,
}

impl MeasurementPoint {
    pub fn new(id: PointId, latlng: LatLng) -> Self {
        Self {
            id,
            lat: latlng.lat,
            lng: latlng.lng,
        }
    }

    pub fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn move_to(&mut self, latlng: LatLng) {
        self.lat = latlng.lat;
        self.lng = latlng.lng;
    }
}
