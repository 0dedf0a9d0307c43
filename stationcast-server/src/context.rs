use crate::catalog::{InMemoryCatalog, StationCatalog};
use crate::configuration::Configuration;
use crate::utils::time_source::TimeSource;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone, FromRef)]
pub struct ApplicationContext {
	pub configuration: Configuration,
	pub time_source: TimeSource,
	pub catalog: Arc<dyn StationCatalog>,
}

impl ApplicationContext {
	pub fn new(configuration: Configuration, time_source: TimeSource) -> anyhow::Result<ApplicationContext> {
		let catalog = Arc::new(InMemoryCatalog::from_file(&configuration.catalog_file)?);

		Ok(Self::with_catalog(configuration, time_source, catalog))
	}

	pub fn with_catalog(
		configuration: Configuration,
		time_source: TimeSource,
		catalog: Arc<dyn StationCatalog>,
	) -> ApplicationContext {
		Self {
			configuration,
			time_source,
			catalog,
		}
	}
}
