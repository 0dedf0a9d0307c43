use crate::api_client::ApiClient;
use crate::catalog::station::StationId;
use crate::catalog::{InMemoryCatalog, StationCatalog};
use crate::configuration::Configuration;
use crate::context::ApplicationContext;
use crate::duration_resolution::DurationResolver;
use crate::duration_resolution::ffprobe::FfprobeDurationProbe;
use crate::error::StationcastError;
use crate::player::media_element::LoggingMediaElement;
use crate::player::{Player, PlayerSettings};
use crate::schedule::broadcast_window::BroadcastWindow;
use crate::server::run_server;
use crate::utils::time_source::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(clap::Parser)]
pub struct Commandline {
	#[clap(short = 'c', long = "config-file", default_value = "configuration.toml")]
	pub configuration_file_path: String,
	#[clap(subcommand)]
	pub command: Option<BaseCommand>,
}

#[derive(clap::Parser, Default)]
pub enum BaseCommand {
	/// Serve the server time and the station schedules
	#[default]
	Run,
	/// Print the configuration
	Configuration,
	/// Print all stations of the catalog
	Catalog,
	/// Follow a station of a running server and log what a player would play
	Watch {
		/// Base URL of the server, e.g. http://127.0.0.1:8000
		#[clap(long)]
		server: String,
		#[clap(long)]
		station: u64,
	},
}

impl Commandline {
	pub async fn run(self) -> Result<(), StationcastError> {
		let configuration = Configuration::from_file(&self.configuration_file_path)?;

		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(&configuration.log_filters))
			.init();

		let base_command = self.command.unwrap_or_default();
		match base_command {
			BaseCommand::Run => {
				let application_context = ApplicationContext::new(configuration, TimeSource::default())?;
				info!(
					"Starting server. Server time is available at 'http://{}/api/time'.",
					application_context.configuration.address
				);
				run_server(application_context).await?;
			}
			BaseCommand::Configuration => println!("{configuration:#?}"),
			BaseCommand::Catalog => {
				let catalog = InMemoryCatalog::from_file(&configuration.catalog_file).map_err(anyhow::Error::from)?;
				for station in catalog.stations() {
					println!("{station:#?}");
				}
			}
			BaseCommand::Watch { server, station } => {
				watch(&configuration, &server, StationId::from(station)).await?;
			}
		}
		Ok(())
	}
}

async fn watch(configuration: &Configuration, server: &str, station_id: StationId) -> Result<(), StationcastError> {
	let api_client = ApiClient::new(server, REQUEST_TIMEOUT)?;
	let station = api_client.station(station_id).await?;
	let station_name = station.name.clone();
	let window = BroadcastWindow::try_from(station)?;
	info!(
		station = %station_id,
		name = %station_name,
		started_at = %window.started_at(),
		ended_at = %window.ended_at(),
		videos = window.videos().len(),
		"Watching station."
	);

	let time_source = TimeSource::default();
	let resolver = DurationResolver::new(
		Arc::new(FfprobeDurationProbe::new(&configuration.ffprobe_program)),
		time_source.clone(),
		configuration.probe_timeout,
		configuration.fallback_video_duration,
	);
	let player = Player::start(
		window,
		Arc::new(api_client),
		resolver,
		LoggingMediaElement::new(station_name),
		time_source,
		&PlayerSettings::from(configuration),
	)
	.await;

	let mut window_updates = player.window_updates();
	loop {
		tokio::select! {
			result = tokio::signal::ctrl_c() => {
				result?;
				break;
			}
			Ok(()) = window_updates.changed() => {
				let version = window_updates.borrow_and_update().version;
				let position = player.position();
				info!(
					version,
					video_index = position.video_index,
					offset_into_video = position.offset_into_video,
					is_synced = player.time_sync_state().is_synced,
					"Switched to refined playlist."
				);
			}
		}
	}

	player.stop();
	Ok(())
}
