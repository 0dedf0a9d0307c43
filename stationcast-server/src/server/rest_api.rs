use crate::catalog::StationCatalog;
use crate::catalog::station::StationId;
use crate::context::ApplicationContext;
use crate::schedule::position::calculate_position;
use crate::server::rest_api::error::ApiErrorResponse;
use crate::server::rest_api::models::{PositionResponse, ServerTimeResponse, StationResponse, StationSummaryResponse};
use crate::utils::time_source::TimeSource;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::debug;

pub mod error;
pub mod models;

pub fn rest_api() -> Router<ApplicationContext> {
	Router::new()
		.route("/time", get(server_time))
		.route("/stations", get(stations))
		.route("/stations/{id}", get(station))
		.route("/stations/{id}/position", get(station_position))
}

async fn server_time(State(time_source): State<TimeSource>) -> Json<ServerTimeResponse> {
	Json(time_source.now().into())
}

async fn stations(State(catalog): State<Arc<dyn StationCatalog>>) -> Json<Vec<StationSummaryResponse>> {
	Json(catalog.stations().into_iter().map(Into::into).collect())
}

async fn station(
	State(catalog): State<Arc<dyn StationCatalog>>,
	Path(id): Path<StationId>,
) -> Result<Json<StationResponse>, ApiErrorResponse> {
	catalog
		.station(id)
		.map(|station| Json(station.into()))
		.ok_or_else(|| station_not_found(id))
}

/// Position the station is at right now according to the server clock.
async fn station_position(
	State(catalog): State<Arc<dyn StationCatalog>>,
	State(time_source): State<TimeSource>,
	Path(id): Path<StationId>,
) -> Result<Json<PositionResponse>, ApiErrorResponse> {
	let station = catalog.station(id).ok_or_else(|| station_not_found(id))?;

	let now = time_source.now();
	let position = calculate_position(&station.window, now);
	let video = position
		.is_within_window
		.then(|| station.window.videos().get(position.video_index).cloned())
		.flatten();
	debug!(station = %id, ?position, "Calculated station position.");

	Ok(Json(PositionResponse {
		station_id: id,
		at: now,
		position,
		video,
	}))
}

fn station_not_found(id: StationId) -> ApiErrorResponse {
	ApiErrorResponse::not_found(format!("Station {id} doesn't exist."))
}
