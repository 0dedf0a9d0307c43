use crate::api_client::ApiClient;
use crate::catalog::station::StationId;
use crate::schedule::broadcast_window::BroadcastWindow;
use crate::schedule::position::PlaybackPosition;
use crate::schedule::video::VideoId;
use crate::server::rest_api::error::ApiErrorResponse;
use crate::server::rest_api::models::{PositionResponse, ServerTimeResponse, StationResponse, StationSummaryResponse};
use crate::server_tests::test_client::TestClient;
use crate::server_tests::{server_now, start_test_server, start_test_server_at};
use crate::time_sync::{ServerTimeSource, TimeSyncError, TimeSynchronizer};
use crate::utils::time_source::TimeSource;
use axum::Router;
use js_int::Int;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn should_return_server_time() {
	let http_client = start_test_server().await;
	let response = http_client.get("/api/time").send().await.expect("Request failed.");
	assert_eq!(StatusCode::OK, response.status());

	let server_time = response
		.json::<ServerTimeResponse>()
		.await
		.expect("Failed to parse server time JSON");

	assert_eq!(server_now(), server_time.iso);
	assert_eq!(Int::new(server_now().timestamp_millis()), Some(server_time.epoch_milliseconds));
}

#[tokio::test]
async fn should_allow_cross_origin_requests_for_the_server_time() {
	let http_client = start_test_server().await;
	let response = http_client
		.get("/api/time")
		.header("Origin", "https://player.example.com")
		.send()
		.await
		.expect("Request failed.");

	let allowed_origin = response
		.headers()
		.get("access-control-allow-origin")
		.expect("No access-control-allow-origin header.")
		.to_str()
		.expect("Access-Control-Allow-Origin header is no valid UTF-8");
	assert_eq!("*", allowed_origin);
}

#[tokio::test]
async fn should_list_all_stations() {
	let http_client = start_test_server().await;
	let response = http_client.get("/api/stations").send().await.expect("Request failed.");
	assert_eq!(StatusCode::OK, response.status());

	let stations = response
		.json::<Vec<StationSummaryResponse>>()
		.await
		.expect("Failed to parse station list JSON");

	let names = stations.iter().map(|station| station.name.as_str()).collect::<Vec<_>>();
	assert_eq!(vec!["Downtown Live", "Night Owl"], names);
}

#[tokio::test]
async fn should_return_the_broadcast_window_of_a_station() {
	let http_client = start_test_server().await;
	let response = http_client.get("/api/stations/1").send().await.expect("Request failed.");
	assert_eq!(StatusCode::OK, response.status());

	let json = response.text().await.expect("Failed to read response body");
	let station = serde_json::from_str::<StationResponse>(&json).expect("Failed to parse station JSON");

	assert_eq!(StationId::from(1), station.id);
	assert_eq!("City Channel", station.channel);
	assert_eq!(3, station.videos.len());
	assert!(json.contains(r#""duration":40"#), "Unexpected JSON: {json}");
}

#[tokio::test]
async fn should_respond_with_not_found_for_unknown_stations() {
	let http_client = start_test_server().await;
	let response = http_client
		.get("/api/stations/1337")
		.send()
		.await
		.expect("Request failed.");
	assert_eq!(StatusCode::NOT_FOUND, response.status());

	let error = response
		.json::<ApiErrorResponse>()
		.await
		.expect("Failed to parse error JSON");
	assert_eq!(
		ApiErrorResponse {
			r#type: "not_found".to_string(),
			status: 404,
			message: "Station 1337 doesn't exist.".to_string(),
		},
		error
	);
}

#[tokio::test]
async fn should_calculate_the_current_position_of_a_station() {
	let http_client = start_test_server().await;
	let response = http_client
		.get("/api/stations/1/position")
		.send()
		.await
		.expect("Request failed.");
	assert_eq!(StatusCode::OK, response.status());

	let position = response
		.json::<PositionResponse>()
		.await
		.expect("Failed to parse position JSON");

	assert_eq!(server_now(), position.at);
	assert_eq!(
		PlaybackPosition {
			video_index: 2,
			offset_into_video: 15,
			total_elapsed_seconds: 95,
			is_within_window: true,
		},
		position.position
	);
	assert_eq!(Some(VideoId::from(3)), position.video.map(|video| video.id));
}

#[tokio::test]
async fn should_report_idle_position_outside_of_the_broadcast() {
	let http_client = start_test_server().await;
	let response = http_client
		.get("/api/stations/2/position")
		.send()
		.await
		.expect("Request failed.");

	let position = response
		.json::<PositionResponse>()
		.await
		.expect("Failed to parse position JSON");

	assert_eq!(PlaybackPosition::idle(), position.position);
	assert_eq!(None, position.video);
}

#[tokio::test]
async fn api_client_should_fetch_playable_broadcast_windows() {
	let http_client = start_test_server().await;
	let api_client = ApiClient::new(&http_client.base_url(), Duration::from_secs(10)).expect("Failed to create client");

	let station = api_client.station(StationId::from(1)).await.expect("Failed to fetch station");
	let window = BroadcastWindow::try_from(station).expect("Invalid broadcast window");

	assert_eq!(120, window.total_duration_seconds());
}

#[tokio::test]
async fn time_synchronizer_should_measure_the_offset_to_a_real_server() {
	let http_client = start_test_server().await;
	let api_client = ApiClient::new(&http_client.base_url(), Duration::from_secs(10)).expect("Failed to create client");
	// the client clock is 100ms behind the server clock and doesn't move during the request
	let client_time_source = TimeSource::test_at(server_now() - chrono::Duration::milliseconds(100));
	let synchronizer = TimeSynchronizer::new(Arc::new(api_client), client_time_source);

	let state = synchronizer.sync().await;

	assert!(state.is_synced);
	assert_eq!(100, state.offset_milliseconds);
	assert_eq!(server_now(), synchronizer.corrected_now());
	assert_eq!(Some(server_now()), state.last_sync_at);
}

#[tokio::test]
async fn time_synchronizer_should_follow_servers_far_behind() {
	let long_ago = server_now() - chrono::Duration::days(365 * 30);
	let http_client = start_test_server_at(long_ago).await;
	let api_client = ApiClient::new(&http_client.base_url(), Duration::from_secs(10)).expect("Failed to create client");
	let synchronizer = TimeSynchronizer::new(Arc::new(api_client), TimeSource::test_at(server_now()));

	let state = synchronizer.sync().await;

	assert_eq!((long_ago - server_now()).num_milliseconds(), state.offset_milliseconds);
}

#[tokio::test]
async fn api_client_should_report_missing_time_endpoint() {
	let http_client = TestClient::new(Router::new())
		.await
		.expect("Failed to start test server");
	let api_client = ApiClient::new(&http_client.base_url(), Duration::from_secs(10)).expect("Failed to create client");

	let result = api_client.server_time_milliseconds().await;

	assert!(matches!(result, Err(TimeSyncError::Status(status)) if status == StatusCode::NOT_FOUND));
}
