use std::{path::PathBuf, sync::Arc};

use clap::Args;
use compass_core::latlng::LatLng;
use compass_overlay::{
    canvas::{CanvasEvent, DragPhase, MapCanvas, Viewport},
    config::OverlayConfig,
    headless_canvas::HeadlessCanvas,
    location::{position::Position, position_source::ManualPositionSource},
    map_overlay::MapOverlay,
    measurement::point::PointId,
};
use compass_travel_providers::travel_client::TravelDistanceClient;
use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::{
    parsers::{self, ProviderArg},
    script::{self, Step},
    table,
};

type ReplayOverlay = MapOverlay<HeadlessCanvas, ManualPositionSource, TravelDistanceClient>;

const DEFAULT_VIEWPORT: Viewport = Viewport {
    center: LatLng::new(0.0, 0.0),
    zoom: 15.0,
    width: 1024.0,
    height: 768.0,
};

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON list of steps
    script: PathBuf,

    /// Overlay configuration, defaults apply to anything missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured provider
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Overrides the configured lookup debounce (e.g., "150ms", "PT1S")
    #[arg(long, value_parser = parsers::parse_duration)]
    debounce: Option<jiff::SignedDuration>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => OverlayConfig::from_json_file(path)?,
        None => OverlayConfig::default(),
    };
    if let Some(provider) = args.provider {
        config.provider = provider.into_provider();
    }
    if let Some(debounce) = args.debounce {
        config.measurement.lookup_debounce = debounce;
    }

    let client = Arc::new(TravelDistanceClient::from_provider(&config.provider)?);
    let steps = script::load(&args.script)?;

    let canvas = Arc::new(HeadlessCanvas::new(Some(DEFAULT_VIEWPORT)));
    let source = Arc::new(ManualPositionSource::new());
    let mut overlay = MapOverlay::new(Arc::clone(&canvas), Arc::clone(&source), client, config);

    info!("Replaying {} steps from {}", steps.len(), args.script.display());
    for (index, step) in steps.into_iter().enumerate() {
        debug!("Step {}: {:?}", index, step);
        apply_step(&mut overlay, &canvas, &source, step).await;
        overlay.process_travel_updates();
    }
    overlay.settle_travel().await;

    let state = overlay.state();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", table::state_table(&state));
        if !state.segments.is_empty() {
            println!("{}", table::segments_table(&state));
        }
    }

    overlay.teardown();
    Ok(())
}

fn point_id(overlay: &ReplayOverlay, index: usize) -> Option<PointId> {
    let id = overlay
        .measurement()
        .points()
        .get(index)
        .map(|point| point.id);
    if id.is_none() {
        warn!("No measurement point at index {}", index);
    }
    id
}

async fn apply_step(
    overlay: &mut ReplayOverlay,
    canvas: &HeadlessCanvas,
    source: &ManualPositionSource,
    step: Step,
) {
    match step {
        Step::StartTracking => {
            if let Err(error) = overlay.start_tracking() {
                warn!("Tracking refused: {}", error);
            }
        }
        Step::StopTracking => overlay.stop_tracking(),
        Step::Follow { enabled } => overlay.set_auto_follow(enabled),
        Step::Position { lat, lng, accuracy } => {
            source.push(Position::new(LatLng::new(lat, lng), accuracy, Timestamp::now()));
            overlay.process_location_updates();
        }
        Step::LocationError { error } => {
            source.push_error(error);
            overlay.process_location_updates();
        }
        Step::Activate => overlay.activate_measurement(),
        Step::Deactivate => overlay.deactivate_measurement(),
        Step::Click { at } => overlay.handle_canvas_event(&CanvasEvent::Click { at }),
        Step::Pointer { at: Some(at) } => {
            overlay.handle_canvas_event(&CanvasEvent::PointerMove { at })
        }
        Step::Pointer { at: None } => overlay.handle_canvas_event(&CanvasEvent::PointerLeave),
        Step::MarkerClick { point } => {
            if let Some(point) = point_id(overlay, point) {
                overlay.handle_canvas_event(&CanvasEvent::MarkerClick { point });
            }
        }
        Step::Drag { point, path } => {
            let Some(id) = point_id(overlay, point) else {
                return;
            };
            let Some(start) = overlay.measurement().point(id).map(|point| point.latlng()) else {
                return;
            };

            overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
                point: id,
                phase: DragPhase::Start,
                at: start,
            });
            for &at in &path {
                overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
                    point: id,
                    phase: DragPhase::Move,
                    at,
                });
            }
            overlay.handle_canvas_event(&CanvasEvent::MarkerDrag {
                point: id,
                phase: DragPhase::End,
                at: path.last().copied().unwrap_or(start),
            });
        }
        Step::TimeOfDay { value } => overlay.select_time_of_day(value),
        Step::Viewport { center, zoom } => {
            let current = canvas.viewport().unwrap_or(DEFAULT_VIEWPORT);
            canvas.set_viewport(Some(Viewport {
                center,
                zoom,
                ..current
            }));
            overlay.handle_canvas_event(&CanvasEvent::ViewportChanged);
        }
        Step::Settle => overlay.settle_travel().await,
    }
}
