//! Process configuration.
//!
//! Everything is read from environment variables:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `DEPARTURE_STOPS_FILE` | JSON file with the stop list | |
//! | `DEPARTURE_STOPS` | inline stop list, `Name[:route,...]` separated by `;` | |
//! | `DEPARTURE_BIND` | listen address | `127.0.0.1:3000` |
//! | `DVB_BASE_URL` | widget endpoint | production widget |
//! | `DEPARTURE_USER_AGENT` | client identifier | `Departure/1.1` |
//! | `DEPARTURE_MAX_AGE_SECS` | freshness window | `30` |
//! | `DEPARTURE_REFRESH_SECS` | background refresh interval | off |
//!
//! One of the two stop variables is required; the file wins if both are set.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::Stop;
use crate::dvb::DvbConfig;
use crate::filter::{AcceptAll, AllOf, DestinationFilter, RouteFilter};
use crate::monitor::MonitorConfig;

const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Errors from loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Neither stop variable is set, or the list is empty
    #[error("no stops configured: set DEPARTURE_STOPS or DEPARTURE_STOPS_FILE")]
    NoStops,

    /// A stop entry has an empty name
    #[error("stop {index} has an empty name")]
    EmptyStopName { index: usize },

    /// A variable could not be parsed
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// The stops file could not be read
    #[error("failed to read {path:?}: {message}")]
    ReadFile { path: PathBuf, message: String },

    /// The stops file is not valid JSON
    #[error("invalid stops file: {message}")]
    Json { message: String },
}

/// One configured stop before it is turned into a [`Stop`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopConfig {
    pub name: String,

    /// Routes to keep; empty keeps all routes.
    #[serde(default)]
    pub routes: Vec<String>,

    /// Destinations to keep; empty keeps all destinations.
    #[serde(default)]
    pub destinations: Vec<String>,
}

impl StopConfig {
    /// A stop that keeps every departure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            destinations: Vec::new(),
        }
    }

    /// Build the stop with the filter its route and destination lists describe.
    pub fn into_stop(self) -> Stop {
        let by_route = (!self.routes.is_empty()).then(|| RouteFilter::routes(self.routes));
        let by_dest = (!self.destinations.is_empty())
            .then(|| DestinationFilter::destinations(self.destinations));

        match (by_route, by_dest) {
            (None, None) => Stop::new(self.name, AcceptAll),
            (Some(r), None) => Stop::new(self.name, r),
            (None, Some(d)) => Stop::new(self.name, d),
            (Some(r), Some(d)) => Stop::new(self.name, AllOf::new().and(r).and(d)),
        }
    }
}

/// Parse an inline stop list such as `Hauptbahnhof:3,7;Postplatz`.
pub fn parse_inline_stops(s: &str) -> Result<Vec<StopConfig>, ConfigError> {
    s.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            let (name, routes) = entry.split_once(':').unwrap_or((entry, ""));
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::EmptyStopName { index });
            }

            Ok(StopConfig {
                name: name.to_string(),
                routes: routes
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect(),
                destinations: Vec::new(),
            })
        })
        .collect()
}

/// Load a stop list from a JSON file of the form `{"stops": [...]}`.
pub fn load_stops_file(path: &Path) -> Result<Vec<StopConfig>, ConfigError> {
    #[derive(Deserialize)]
    struct StopsFile {
        stops: Vec<StopConfig>,
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let file: StopsFile = serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
        message: e.to_string(),
    })?;

    for (index, stop) in file.stops.iter().enumerate() {
        if stop.name.trim().is_empty() {
            return Err(ConfigError::EmptyStopName { index });
        }
    }

    Ok(file.stops)
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Upstream client settings
    pub dvb: DvbConfig,
    /// Cache freshness settings
    pub monitor: MonitorConfig,
    /// Stops to monitor, in display order
    pub stops: Vec<StopConfig>,
    /// Interval for refreshing the cache in the background, if enabled
    pub refresh_interval: Option<Duration>,
}

impl AppConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let stops = match (lookup("DEPARTURE_STOPS_FILE"), lookup("DEPARTURE_STOPS")) {
            (Some(path), _) => load_stops_file(Path::new(&path))?,
            (None, Some(inline)) => parse_inline_stops(&inline)?,
            (None, None) => Vec::new(),
        };
        if stops.is_empty() {
            return Err(ConfigError::NoStops);
        }

        let bind_addr = parse_var(&lookup, "DEPARTURE_BIND")?.unwrap_or(DEFAULT_BIND);

        let mut dvb = DvbConfig::new();
        if let Some(url) = lookup("DVB_BASE_URL") {
            dvb = dvb.with_base_url(url);
        }
        if let Some(user_agent) = lookup("DEPARTURE_USER_AGENT") {
            dvb = dvb.with_user_agent(user_agent);
        }

        let mut monitor = MonitorConfig::default();
        if let Some(secs) = parse_var::<u64>(&lookup, "DEPARTURE_MAX_AGE_SECS")? {
            monitor = monitor.with_max_age(Duration::from_secs(secs));
        }

        let refresh_interval = match parse_var::<u64>(&lookup, "DEPARTURE_REFRESH_SECS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    var: "DEPARTURE_REFRESH_SECS",
                    value: "0".to_string(),
                });
            }
            other => other.map(Duration::from_secs),
        };

        Ok(Self {
            bind_addr,
            dvb,
            monitor,
            stops,
            refresh_interval,
        })
    }

    /// Build the configured stops with their filters.
    pub fn build_stops(&self) -> Vec<Stop> {
        self.stops.iter().cloned().map(StopConfig::into_stop).collect()
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Departure;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn inline_stops() {
        let stops = parse_inline_stops("Hauptbahnhof:3, 7 ;Postplatz;").unwrap();
        assert_eq!(
            stops,
            vec![
                StopConfig {
                    name: "Hauptbahnhof".into(),
                    routes: vec!["3".into(), "7".into()],
                    destinations: Vec::new(),
                },
                StopConfig::new("Postplatz"),
            ]
        );
    }

    #[test]
    fn inline_empty_name_rejected() {
        assert!(matches!(
            parse_inline_stops("Postplatz; :3"),
            Err(ConfigError::EmptyStopName { index: 1 })
        ));
    }

    #[test]
    fn stops_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stops.json");
        std::fs::write(
            &path,
            r#"{"stops": [
                {"name": "Hauptbahnhof", "routes": ["76"]},
                {"name": "Albertplatz", "destinations": ["Bühlau"]}
            ]}"#,
        )
        .unwrap();

        let stops = load_stops_file(&path).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].routes, vec!["76"]);
        assert!(stops[0].destinations.is_empty());
        assert_eq!(stops[1].destinations, vec!["Bühlau"]);
    }

    #[test]
    fn stops_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_stops_file(&missing),
            Err(ConfigError::ReadFile { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"stops\": [").unwrap();
        assert!(matches!(load_stops_file(&bad), Err(ConfigError::Json { .. })));

        let unnamed = dir.path().join("unnamed.json");
        std::fs::write(&unnamed, r#"{"stops": [{"name": " "}]}"#).unwrap();
        assert!(matches!(
            load_stops_file(&unnamed),
            Err(ConfigError::EmptyStopName { index: 0 })
        ));
    }

    #[test]
    fn stop_filters_from_config() {
        let board = vec![
            Departure::new("76", "Pillnitz", 5),
            Departure::new("76", "Hauptbahnhof", 7),
            Departure::new("11", "Bühlau", 3),
        ];

        let all = StopConfig::new("A").into_stop();
        assert_eq!(all.filter().filter(board.clone()).len(), 3);

        let by_route = StopConfig {
            routes: vec!["76".into()],
            ..StopConfig::new("A")
        }
        .into_stop();
        assert_eq!(by_route.filter().filter(board.clone()).len(), 2);

        let by_dest = StopConfig {
            destinations: vec!["Bühlau".into()],
            ..StopConfig::new("A")
        }
        .into_stop();
        assert_eq!(
            by_dest.filter().filter(board.clone()),
            vec![Departure::new("11", "Bühlau", 3)]
        );

        let both = StopConfig {
            routes: vec!["76".into()],
            destinations: vec!["Pillnitz".into()],
            ..StopConfig::new("A")
        }
        .into_stop();
        assert_eq!(
            both.filter().filter(board),
            vec![Departure::new("76", "Pillnitz", 5)]
        );
    }

    #[test]
    fn defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DEPARTURE_STOPS", "Postplatz")])).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.dvb.user_agent, "Departure/1.1");
        assert_eq!(config.monitor.max_age, Duration::from_secs(30));
        assert_eq!(config.refresh_interval, None);
        assert_eq!(config.build_stops()[0].name(), "Postplatz");
    }

    #[test]
    fn overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DEPARTURE_STOPS", "Postplatz"),
            ("DEPARTURE_BIND", "0.0.0.0:8080"),
            ("DVB_BASE_URL", "http://localhost:9000/widget"),
            ("DEPARTURE_USER_AGENT", "Hint/2.0"),
            ("DEPARTURE_MAX_AGE_SECS", "10"),
            ("DEPARTURE_REFRESH_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.dvb.base_url, "http://localhost:9000/widget");
        assert_eq!(config.dvb.user_agent, "Hint/2.0");
        assert_eq!(config.monitor.max_age, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(15)));
    }

    #[test]
    fn file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stops.json");
        std::fs::write(&path, r#"{"stops": [{"name": "Albertplatz"}]}"#).unwrap();

        let config = AppConfig::from_lookup(lookup(&[
            ("DEPARTURE_STOPS", "Postplatz"),
            ("DEPARTURE_STOPS_FILE", path.to_str().unwrap()),
        ]))
        .unwrap();

        assert_eq!(config.stops, vec![StopConfig::new("Albertplatz")]);
    }

    #[test]
    fn missing_stops_rejected() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[])),
            Err(ConfigError::NoStops)
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("DEPARTURE_STOPS", " ; ")])),
            Err(ConfigError::NoStops)
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DEPARTURE_STOPS", "Postplatz"),
            ("DEPARTURE_MAX_AGE_SECS", "half a minute"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for DEPARTURE_MAX_AGE_SECS: \"half a minute\""
        );

        assert!(matches!(
            AppConfig::from_lookup(lookup(&[
                ("DEPARTURE_STOPS", "Postplatz"),
                ("DEPARTURE_REFRESH_SECS", "0"),
            ])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[
                ("DEPARTURE_STOPS", "Postplatz"),
                ("DEPARTURE_BIND", "nowhere"),
            ])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
