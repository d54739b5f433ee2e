//! User configuration at ~/.config/eventmap/config.toml
//!
//! Every option has a default, and `EVENTMAP_*` environment variables
//! override the file (nested keys use `__`, e.g. `EVENTMAP_SERVER__BIND`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bounds::LatLng;
use crate::constants::{
    DEFAULT_CENTER_DELAY, DEFAULT_CITY_ZOOM, DEFAULT_CLUSTER_RADIUS_PX, DEFAULT_DECLUSTER_DELAY,
    DEFAULT_EXPAND_RATIO, DEFAULT_FOCUS_ZOOM,
};
use crate::error::{EventMapError, EventMapResult};
use crate::marker::FocusTiming;
use crate::zone::CalendarZone;

static DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4096/events";
static DEFAULT_CACHE_DIR: &str = "~/.cache/eventmap";
static DEFAULT_CACHE_TTL: &str = "24h";
static DEFAULT_DEBOUNCE: &str = "500ms";
static DEFAULT_CITY: &str = "hcm";
static DEFAULT_BIND: &str = "127.0.0.1:4096";
static DEFAULT_DATA_FILE: &str = "~/.local/share/eventmap/events.json";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_cache_ttl() -> String {
    DEFAULT_CACHE_TTL.to_string()
}

fn default_debounce() -> String {
    DEFAULT_DEBOUNCE.to_string()
}

fn default_expand_ratio() -> f64 {
    DEFAULT_EXPAND_RATIO
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

fn default_cluster_radius() -> f64 {
    DEFAULT_CLUSTER_RADIUS_PX
}

fn default_cities() -> IndexMap<String, CityPreset> {
    [
        ("hcm", "Ho Chi Minh City", 10.776, 106.700),
        ("hanoi", "Hanoi", 21.028, 105.834),
        ("danang", "Da Nang", 16.047, 108.206),
    ]
    .into_iter()
    .map(|(key, name, lat, lng)| {
        (
            key.to_string(),
            CityPreset {
                name: name.to_string(),
                center: [lat, lng],
                zoom: DEFAULT_CITY_ZOOM,
            },
        )
    })
    .collect()
}

/// A named map position the user can jump to.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityPreset {
    pub name: String,
    /// `[lat, lng]`
    pub center: [f64; 2],
    #[serde(default = "default_city_zoom")]
    pub zoom: u8,
}

fn default_city_zoom() -> u8 {
    DEFAULT_CITY_ZOOM
}

impl CityPreset {
    pub fn center(&self) -> LatLng {
        LatLng::from(self.center)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FocusConfig {
    pub zoom: u8,
    pub center_delay: String,
    pub decluster_delay: String,
}

impl Default for FocusConfig {
    fn default() -> Self {
        FocusConfig {
            zoom: DEFAULT_FOCUS_ZOOM,
            center_delay: humantime::format_duration(DEFAULT_CENTER_DELAY).to_string(),
            decluster_delay: humantime::format_duration(DEFAULT_DECLUSTER_DELAY).to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// JSON file holding `{"events": [...]}`.
    pub data_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl ServerConfig {
    pub fn data_path(&self) -> PathBuf {
        expand_path(&self.data_file)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventMapConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// humantime duration, e.g. "24h"
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    #[serde(default = "default_debounce")]
    pub debounce: String,

    #[serde(default = "default_expand_ratio")]
    pub expand_ratio: f64,

    /// IANA zone name, or "local".
    #[serde(default)]
    pub timezone: String,

    #[serde(default = "default_city")]
    pub default_city: String,

    #[serde(default = "default_cities")]
    pub cities: IndexMap<String, CityPreset>,

    #[serde(default = "default_cluster_radius")]
    pub cluster_radius_px: f64,

    #[serde(default)]
    pub focus: FocusConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for EventMapConfig {
    fn default() -> Self {
        EventMapConfig {
            endpoint: default_endpoint(),
            cache_dir: default_cache_dir(),
            cache_ttl: default_cache_ttl(),
            debounce: default_debounce(),
            expand_ratio: default_expand_ratio(),
            timezone: String::new(),
            default_city: default_city(),
            cities: default_cities(),
            cluster_radius_px: default_cluster_radius(),
            focus: FocusConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn parse_duration(field: &str, value: &str) -> EventMapResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| EventMapError::Config(format!("Invalid {field} '{value}': {e}")))
}

impl EventMapConfig {
    pub fn config_path() -> EventMapResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EventMapError::Config("Could not determine config directory".into()))?
            .join("eventmap");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user config, writing a commented default file on first run.
    pub fn load() -> EventMapResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (which may be missing) layered under the environment.
    pub fn load_from(path: &Path) -> EventMapResult<Self> {
        Self::load_with_env(path, Self::environment())
    }

    /// `EVENTMAP_ENDPOINT`, `EVENTMAP_SERVER__BIND` and so on.
    fn environment() -> Environment {
        Environment::with_prefix("EVENTMAP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(path: &Path, env: Environment) -> EventMapResult<Self> {
        let config: EventMapConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .map_err(|e| EventMapError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| EventMapError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> EventMapResult<()> {
        if !self.expand_ratio.is_finite() || self.expand_ratio < 0.0 {
            return Err(EventMapError::Config(format!(
                "expand_ratio must be a non-negative number, got {}",
                self.expand_ratio
            )));
        }
        self.cache_ttl()?;
        self.debounce()?;
        self.zone()?;
        self.focus_timing()?;
        Ok(())
    }

    /// Write the current settings to `path`.
    pub fn save(&self, path: &Path) -> EventMapResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EventMapError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| EventMapError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> EventMapResult<()> {
        let contents = format!(
            "\
# eventmap configuration

# Where events are fetched from:
# endpoint = \"{DEFAULT_ENDPOINT}\"

# Local cache of fetched events and saved ids:
# cache_dir = \"{DEFAULT_CACHE_DIR}\"
# cache_ttl = \"{DEFAULT_CACHE_TTL}\"

# Quiet period before a map move triggers a fetch:
# debounce = \"{DEFAULT_DEBOUNCE}\"

# Fraction of the viewport added on each side of a fetch:
# expand_ratio = {DEFAULT_EXPAND_RATIO}

# Zone for \"today\" and date filters (IANA name or \"local\"):
# timezone = \"Asia/Ho_Chi_Minh\"

# City shown on start:
# default_city = \"{DEFAULT_CITY}\"

# [cities.saigon]
# name = \"Saigon\"
# center = [10.776, 106.700]
# zoom = {DEFAULT_CITY_ZOOM}

# [focus]
# zoom = {DEFAULT_FOCUS_ZOOM}
# center_delay = \"500ms\"
# decluster_delay = \"300ms\"

# [server]
# bind = \"{DEFAULT_BIND}\"
# data_file = \"{DEFAULT_DATA_FILE}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EventMapError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| EventMapError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn cache_path(&self) -> PathBuf {
        expand_path(&self.cache_dir)
    }

    pub fn cache_ttl(&self) -> EventMapResult<Duration> {
        parse_duration("cache_ttl", &self.cache_ttl)
    }

    pub fn debounce(&self) -> EventMapResult<Duration> {
        parse_duration("debounce", &self.debounce)
    }

    pub fn zone(&self) -> EventMapResult<CalendarZone> {
        self.timezone.parse()
    }

    pub fn focus_timing(&self) -> EventMapResult<FocusTiming> {
        Ok(FocusTiming {
            zoom: self.focus.zoom,
            center_delay: parse_duration("focus.center_delay", &self.focus.center_delay)?,
            decluster_delay: parse_duration("focus.decluster_delay", &self.focus.decluster_delay)?,
        })
    }

    pub fn city(&self, key: &str) -> EventMapResult<&CityPreset> {
        self.cities
            .get(key)
            .ok_or_else(|| EventMapError::UnknownCity(key.to_string()))
    }

    pub fn start_city(&self) -> EventMapResult<&CityPreset> {
        self.city(&self.default_city)
    }
}
