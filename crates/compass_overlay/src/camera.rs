use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{canvas::MapCanvas, location::position::Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Accuracy radius above which a fix is considered poor
    pub poor_accuracy_meters: f64,

    /// Zoom level the camera relaxes to on a poor fix
    pub zoom_floor: f64,

    pub auto_follow: bool,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            poor_accuracy_meters: 100.0,
            zoom_floor: 15.0,
            auto_follow: true,
        }
    }
}

/// Re-centres the viewport on accepted positions while auto-follow is on.
///
/// Following and tracking are independent: turning auto-follow off never
/// stops the location stream, it only stops moving the camera.
pub struct CameraController<C: MapCanvas> {
    canvas: Arc<C>,
    params: CameraParams,
    auto_follow: bool,
}

impl<C: MapCanvas> CameraController<C> {
    pub fn new(canvas: Arc<C>, params: CameraParams) -> Self {
        let auto_follow = params.auto_follow;
        Self {
            canvas,
            params,
            auto_follow,
        }
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    /// Enabling re-centres right away when a position is already retained.
    pub fn set_auto_follow(&mut self, enabled: bool, latest: Option<&Position>, tracking: bool) {
        if self.auto_follow == enabled {
            return;
        }

        self.auto_follow = enabled;
        debug!("CameraController: auto-follow {}", if enabled { "on" } else { "off" });

        if let Some(position) = latest {
            self.follow(position, tracking);
        }
    }

    pub fn toggle_auto_follow(&mut self, latest: Option<&Position>, tracking: bool) -> bool {
        self.set_auto_follow(!self.auto_follow, latest, tracking);
        self.auto_follow
    }

    /// Returns whether the camera moved.
    pub fn follow(&self, position: &Position, tracking: bool) -> bool {
        if !self.auto_follow || !tracking {
            return false;
        }

        self.canvas.pan_to(position.latlng());

        if position.accuracy > self.params.poor_accuracy_meters {
            let zoom = self.canvas.viewport().map(|viewport| viewport.zoom);
            if zoom.is_some_and(|zoom| zoom > self.params.zoom_floor) {
                debug!(
                    "CameraController: accuracy {:.0} m, relaxing zoom to {}",
                    position.accuracy, self.params.zoom_floor
                );
                self.canvas.set_zoom(self.params.zoom_floor);
            }
        }

        true
    }
}
