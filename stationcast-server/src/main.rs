use crate::commandline::Commandline;
use crate::error::StationcastError;
use clap::Parser;

mod api_client;
mod catalog;
mod commandline;
mod configuration;
mod context;
mod duration_resolution;
mod error;
mod player;
mod schedule;
mod server;
mod time_sync;
mod utils;

#[tokio::main]
async fn main() -> Result<(), StationcastError> {
	let commandline = Commandline::try_parse()?;
	commandline.run().await
}
