use crate::context::ApplicationContext;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod rest_api;

pub async fn run_server(application_context: ApplicationContext) -> std::io::Result<()> {
	let address = application_context.configuration.address;
	let router = create_router(application_context);

	info!(%address, "Listening for requests.");
	axum_server::bind(address).serve(router.into_make_service()).await
}

pub fn create_router(application_context: ApplicationContext) -> Router {
	Router::new()
		.nest("/api", rest_api::rest_api())
		// the server time and the schedules are public and read by players on other origins
		.layer(CorsLayer::permissive())
		.with_state(application_context)
}
