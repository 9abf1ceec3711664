use clap::Args;
use comfy_table::Table;
use compass_core::latlng::LatLng;
use compass_travel_providers::{
    time_of_day::TimeOfDaySelection, travel_client::TravelDistanceClient,
    travel_provider::TravelDistanceProvider, travel_query::TravelQuery,
    travel_result::TravelResult,
};
use jiff::Zoned;
use tracing::info;

use crate::parsers::{self, ProviderArg};

#[derive(Args)]
pub struct DistanceArgs {
    /// Origin as "<lat>,<lng>"
    #[arg(value_parser = parsers::parse_latlng, allow_hyphen_values = true)]
    from: LatLng,

    /// Destination as "<lat>,<lng>"
    #[arg(value_parser = parsers::parse_latlng, allow_hyphen_values = true)]
    to: LatLng,

    #[arg(short, long, value_parser = parsers::parse_time_of_day, default_value = "now")]
    time_of_day: TimeOfDaySelection,

    #[arg(short, long, value_enum, default_value = "crow")]
    provider: ProviderArg,
}

pub async fn run(args: DistanceArgs) -> anyhow::Result<()> {
    let client = TravelDistanceClient::from_provider(&args.provider.into_provider())?;
    let departure_time = args.time_of_day.departure_time(&Zoned::now())?;

    let query = TravelQuery {
        origin: args.from,
        destination: args.to,
        time_of_day: args.time_of_day,
        departure_time,
    };

    info!("Looking up {} -> {} ({})", args.from, args.to, args.time_of_day);
    let estimate = client.query(&query).await?;
    let result = TravelResult::new(estimate, departure_time);

    let mut table = Table::new();
    table
        .set_header(vec!["Straight line", "Travel distance", "Duration", "Departure"])
        .add_row(vec![
            args.from.haversine_distance(&args.to).to_string(),
            result.distance_text.clone(),
            result.duration_text(),
            result.departure_time.to_string(),
        ]);
    println!("{table}");

    Ok(())
}
