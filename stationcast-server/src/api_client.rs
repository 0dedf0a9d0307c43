use crate::catalog::station::StationId;
use crate::server::rest_api::models::{ServerTimeResponse, StationResponse};
use crate::time_sync::{ServerTimeSource, TimeSyncError};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// HTTP client for the public API of a stationcast server.
#[derive(Clone)]
pub struct ApiClient {
	client: reqwest::Client,
	base_url: String,
}

#[derive(Error, Debug)]
pub enum ApiClientError {
	#[error("Failed to create HTTP client: {0}")]
	Client(#[source] reqwest::Error),
	#[error("Request to '{url}' failed: {source}")]
	Request {
		url: String,
		#[source]
		source: reqwest::Error,
	},
}

impl ApiClient {
	pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiClientError> {
		let client = reqwest::Client::builder()
			.connect_timeout(request_timeout)
			.timeout(request_timeout)
			.build()
			.map_err(ApiClientError::Client)?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	pub async fn station(&self, id: StationId) -> Result<StationResponse, ApiClientError> {
		let url = self.url(&format!("api/stations/{id}"));
		let request_error = |source| ApiClientError::Request {
			url: url.clone(),
			source,
		};

		self.client
			.get(&url)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(request_error)?
			.json()
			.await
			.map_err(request_error)
	}
}

#[async_trait]
impl ServerTimeSource for ApiClient {
	async fn server_time_milliseconds(&self) -> Result<i64, TimeSyncError> {
		let response = self
			.client
			.get(self.url("api/time"))
			.send()
			.await
			.map_err(TimeSyncError::Request)?;

		let status = response.status();
		if !status.is_success() {
			return Err(TimeSyncError::Status(status));
		}

		let server_time = response
			.json::<ServerTimeResponse>()
			.await
			.map_err(|error| TimeSyncError::MalformedResponse(error.to_string()))?;
		Ok(server_time.epoch_milliseconds.into())
	}
}
