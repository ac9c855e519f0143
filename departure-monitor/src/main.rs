use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use departure_monitor::config::AppConfig;
use departure_monitor::dvb::DvbClient;
use departure_monitor::monitor::DepartureMonitor;
use departure_monitor::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = DvbClient::new(config.dvb.clone()).expect("Failed to create DVB client");
    let stops = config.build_stops();
    info!(
        stops = ?stops.iter().map(|s| s.name()).collect::<Vec<_>>(),
        max_age = ?config.monitor.max_age,
        "monitoring departures"
    );

    let monitor = Arc::new(DepartureMonitor::new(client, stops, config.monitor.clone()));

    // Keep the cache warm so requests rarely wait on the widget.
    if let Some(every) = config.refresh_interval {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match monitor.departures().await {
                    Ok(departures) => info!(
                        count = departures.len(),
                        cached_stops = monitor.cache().entry_count(),
                        "refreshed departures"
                    ),
                    Err(e) => warn!("failed to refresh departures: {e}"),
                }
            }
        });
    }

    let app = create_router(AppState::from_shared(monitor));

    info!("departure monitor listening on http://{}", config.bind_addr);
    info!("  GET  /health                  - Health check");
    info!("  GET  /departures              - Merged departures for all stops");
    info!("  GET  /stops                   - Configured stops");
    info!("  GET  /stops/:stop/departures  - Departures for one stop");

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
