use std::net::TcpListener;

use food_order_auth::configuration::get_configuration;
use food_order_auth::startup::{build_session_service, run};
use food_order_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(
                environment = ?config.application.environment,
                backend = ?config.database.backend,
                "Configuration loaded successfully"
            );
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let session = build_session_service(&configuration).await.map_err(|e| {
        tracing::error!("Failed to initialise stores: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Store initialisation error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, session, &configuration.application)?;
    server.await
}
