use comfy_table::Table;
use compass_overlay::{map_overlay::OverlayState, measurement::segment::TravelState};

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| String::from("-"), |value| value.to_string())
}

pub fn state_table(state: &OverlayState) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "State"]);

    table.add_row(vec![String::from("Tracking"), state.tracking.to_string()]);
    table.add_row(vec![String::from("Auto-follow"), state.auto_follow.to_string()]);
    table.add_row(vec![
        String::from("Position"),
        or_dash(state.position.map(|position| {
            format!("{} (±{:.0} m)", position.latlng(), position.accuracy)
        })),
    ]);
    table.add_row(vec![
        String::from("Location error"),
        or_dash(state.location_error.as_ref()),
    ]);
    table.add_row(vec![String::from("Measuring"), state.measuring.to_string()]);
    table.add_row(vec![String::from("Time of day"), state.time_of_day.to_string()]);
    table.add_row(vec![String::from("Points"), state.points.len().to_string()]);
    table.add_row(vec![
        String::from("Preview"),
        or_dash(state.preview.map(|preview| preview.straight_distance)),
    ]);
    table.add_row(vec![
        String::from("Map center"),
        or_dash(state.viewport.map(|viewport| viewport.center)),
    ]);

    table
}

pub fn segments_table(state: &OverlayState) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Segment", "Straight line", "Travel", "Label"]);

    for segment in &state.segments {
        let travel = match &segment.travel {
            TravelState::NoData => String::from("pending"),
            TravelState::Stale(result) => format!("{} (stale)", result.distance_text),
            TravelState::Ready(result) => {
                format!("{}, {}", result.distance_text, result.duration_text())
            }
            TravelState::Unavailable => String::from("unavailable"),
        };

        table.add_row(vec![
            segment.id.to_string(),
            segment.straight_distance.to_string(),
            travel,
            segment.label.clone(),
        ]);
    }

    table
}
