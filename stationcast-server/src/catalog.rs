use crate::catalog::station::{Station, StationDefinition, StationId};
use crate::schedule::broadcast_window::BroadcastWindowError;
use serde::Deserialize;
use static_assertions::assert_obj_safe;
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub mod station;

/// Read only source of the stations and their broadcast windows.
pub trait StationCatalog: Send + Sync {
	fn station(&self, id: StationId) -> Option<Station>;

	fn stations(&self) -> Vec<Station>;
}

assert_obj_safe!(StationCatalog);

#[derive(Error, Debug)]
pub enum CatalogError {
	#[error("Failed to deserialize catalog with error: {0}")]
	Deserialization(#[from] toml::de::Error),
	#[error("IO operation failed: {0}")]
	Io(#[from] std::io::Error),
	#[error("Station {id} is invalid: {source}")]
	InvalidStation {
		id: StationId,
		#[source]
		source: BroadcastWindowError,
	},
	#[error("Station {0} is defined more than once.")]
	DuplicateStation(StationId),
}

#[derive(Default)]
pub struct InMemoryCatalog {
	stations: BTreeMap<StationId, Station>,
}

#[derive(Deserialize)]
struct CatalogFile {
	#[serde(default)]
	stations: Vec<StationDefinition>,
}

impl InMemoryCatalog {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
		let path = path.as_ref();
		let text = read_to_string(path)?;
		let catalog = Self::try_from(text.as_str())?;

		info!(path = %path.display(), stations = catalog.stations.len(), "Loaded station catalog.");
		Ok(catalog)
	}

	pub fn insert(&mut self, station: Station) -> Result<(), CatalogError> {
		use std::collections::btree_map::Entry::*;
		let Vacant(entry) = self.stations.entry(station.id) else {
			return Err(CatalogError::DuplicateStation(station.id));
		};

		entry.insert(station);
		Ok(())
	}
}

impl TryFrom<&str> for InMemoryCatalog {
	type Error = CatalogError;

	fn try_from(text: &str) -> Result<Self, Self::Error> {
		let CatalogFile { stations } = toml::from_str(text)?;

		let mut catalog = Self::default();
		for definition in stations {
			let id = definition.id;
			let station =
				Station::try_from(definition).map_err(|source| CatalogError::InvalidStation { id, source })?;
			catalog.insert(station)?;
		}

		Ok(catalog)
	}
}

impl StationCatalog for InMemoryCatalog {
	fn station(&self, id: StationId) -> Option<Station> {
		self.stations.get(&id).cloned()
	}

	fn stations(&self) -> Vec<Station> {
		self.stations.values().cloned().collect()
	}
}
