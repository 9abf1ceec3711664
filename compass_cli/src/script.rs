use std::{fs::File, io::BufReader, path::Path};

use compass_core::latlng::LatLng;
use compass_overlay::location::position::LocationError;
use compass_travel_providers::time_of_day::TimeOfDaySelection;
use serde::Deserialize;

fn default_accuracy() -> f64 {
    10.0
}

/// One scripted host interaction. Points are addressed by their index in
/// the session, in placement order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    StartTracking,
    StopTracking,
    Follow {
        enabled: bool,
    },
    Position {
        lat: f64,
        lng: f64,
        #[serde(default = "default_accuracy")]
        accuracy: f64,
    },
    LocationError {
        error: LocationError,
    },
    Activate,
    Deactivate,
    Click {
        at: LatLng,
    },
    /// Pointer leaves the map when `at` is missing
    Pointer {
        #[serde(default)]
        at: Option<LatLng>,
    },
    MarkerClick {
        point: usize,
    },
    /// Drag along `path`, dropped at its last coordinate
    Drag {
        point: usize,
        path: Vec<LatLng>,
    },
    TimeOfDay {
        value: TimeOfDaySelection,
    },
    Viewport {
        center: LatLng,
        zoom: f64,
    },
    Settle,
}

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Step>> {
    let file = File::open(path)?;
    let steps = serde_json::from_reader(BufReader::new(file))?;
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_steps() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                { "step": "start_tracking" },
                { "step": "position", "lat": 50.85, "lng": 4.35 },
                { "step": "location_error", "error": { "kind": "timeout" } },
                { "step": "click", "at": { "lat": 10.0, "lng": 10.0 } },
                { "step": "pointer" },
                { "step": "drag", "point": 1, "path": [{ "lat": 10.0, "lng": 10.02 }] },
                { "step": "time_of_day", "value": "morning" },
                { "step": "settle" }
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 8);
        assert!(matches!(steps[1], Step::Position { accuracy, .. } if accuracy == 10.0));
        assert!(matches!(
            steps[2],
            Step::LocationError {
                error: LocationError::Timeout
            }
        ));
        assert!(matches!(steps[4], Step::Pointer { at: None }));
        assert!(matches!(
            steps[6],
            Step::TimeOfDay {
                value: TimeOfDaySelection::Morning
            }
        ));
    }
}
