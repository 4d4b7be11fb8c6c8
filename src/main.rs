use std::time::Duration;

use anyhow::Result;
use theweather_app::{error_mapping, setup, DisplayState, WeatherSession};
use theweather_core::Units;
use theweather_forecast::{format, ConnectivityProbe, ConnectivitySignal, LocationPermission};
use tokio_util::sync::CancellationToken;

const PROBE_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    theweather_core::init()?;

    // Create and initialize application
    let mut app = theweather_core::App::new()?;
    let first_run = app.initialize()?;

    tracing::info!("TheWeather started");
    let config = app.shared_config();

    let session = WeatherSession::new(setup::build_store(&config)?);

    // Headless: the configured coordinate stands in for device location.
    if first_run {
        tracing::info!(
            "First run: using configured location {:.4}, {:.4}",
            config.location.latitude,
            config.location.longitude
        );
    }
    session.update_permission(LocationPermission::Granted);

    if session.check_cached_availability().await {
        session.fetch_cached().await;
    }

    let signal = ConnectivitySignal::new();
    let probe_token = CancellationToken::new();
    let probe = ConnectivityProbe::probe_target(&config.weather.base_url).map(|(host, port)| {
        ConnectivityProbe::spawn(signal.clone(), host, port, PROBE_INTERVAL, probe_token.clone())
    });
    session.watch_connectivity(&signal);

    let provider = setup::configured_location(&config.location);
    if let Err(e) = session
        .request_location(&provider, setup::location_timeout(&config.location))
        .await
    {
        tracing::warn!("{}", error_mapping::location_error(&e).user_message());
    }

    let interval = setup::poll_interval(&config);
    session.maybe_start_polling(interval);

    let mut states = session.subscribe();
    let mut last_shown: Option<DisplayState> = None;
    report(&DisplayState::from_session(&session.state()), config.weather.units);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Shutting down");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();

                // Connectivity came back after a start was refused.
                if state.connected && !state.polling {
                    session.maybe_start_polling(interval);
                }

                let display = DisplayState::from_session(&state);
                if last_shown.as_ref() != Some(&display) {
                    report(&display, config.weather.units);
                    last_shown = Some(display);
                }
            }
        }
    }

    // Graceful shutdown
    session.dispose();
    probe_token.cancel();
    if let Some(probe) = probe {
        let _ = probe.await;
    }
    app.shutdown()?;

    Ok(())
}

fn report(display: &DisplayState, units: Units) {
    match display {
        DisplayState::Loading => tracing::info!("Loading weather..."),
        DisplayState::Ready {
            snapshot,
            stale,
            offline,
            updated_at,
        } => {
            let tz = snapshot.city.timezone;
            let source = if *stale { "Cached Data" } else { "Fetched Data" };
            let Some(entry) = snapshot.first_entry() else {
                tracing::info!("{}: no forecast entries ({})", snapshot.city.name, source);
                return;
            };
            let condition = entry.condition();

            tracing::info!(
                "{} | {}{} {} ({}) | humidity {}% | pressure {} hPa | wind {} | sunrise {} sunset {} | {} | updated {}{}",
                snapshot.city.name,
                format::format_decimals(entry.main.temp),
                temperature_suffix(units),
                condition.map(|c| c.main.as_str()).unwrap_or("-"),
                condition.map(|c| c.description.as_str()).unwrap_or("-"),
                entry.main.humidity,
                entry.main.pressure,
                entry.wind.speed,
                format::format_time(snapshot.city.sunrise, tz),
                format::format_time(snapshot.city.sunset, tz),
                source,
                format::format_clock(updated_at.timestamp_millis(), tz),
                if *offline { " | offline" } else { "" },
            );
        }
        DisplayState::Unavailable { message } => tracing::warn!("{}", message),
        DisplayState::NeedsPermission => {
            tracing::warn!("Location permission is required to show local weather")
        }
        DisplayState::NeedsLocationService => {
            tracing::warn!("Turn on location services to show local weather")
        }
    }
}

fn temperature_suffix(units: Units) -> &'static str {
    match units {
        Units::Metric => "ºC",
        Units::Imperial => "ºF",
        Units::Standard => " K",
    }
}
