use crate::api_client::ApiClientError;
use crate::configuration::ConfigurationError;
use crate::schedule::broadcast_window::BroadcastWindowError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StationcastError {
	#[error("Failed to load configuration: {0}")]
	Configuration(#[from] ConfigurationError),
	#[error("Failed to parse commandline: {0}")]
	Commandline(#[from] clap::Error),
	#[error("IO error while serving requests: {0}")]
	Server(#[from] std::io::Error),
	#[error("Failed to set up application: {0}")]
	Context(#[from] anyhow::Error),
	#[error("Failed to talk to the server: {0}")]
	ApiClient(#[from] ApiClientError),
	#[error("Server sent an unplayable broadcast window: {0}")]
	InvalidWindow(#[from] BroadcastWindowError),
}
