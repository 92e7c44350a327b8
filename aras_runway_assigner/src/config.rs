use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, FileFormat};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, info, warn};

use crate::{
    catalogue::{RunwayCatalogue, RunwayConfigurationEntry},
    error::{ApplicationError, ApplicationResult},
    util::normalize_icao,
    wind::GustPolicy,
};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_METAR_URL: &str = "https://metar.vatsim.net";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

pub(crate) fn aras_project_dir() -> Option<ProjectDirs> {
    ProjectDirs::from("", "aras", "aras_runway_assigner")
}

/// Settings and runway catalogue, loaded once per run.
#[derive(Debug)]
pub(crate) struct ArasConfig {
    config_file_path: PathBuf,
    config: Configurable,
    firs: IndexMap<String, Vec<String>>,
    catalogue: RunwayCatalogue,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
struct Configurable {
    rwy_file_path: Option<PathBuf>,
    metar_url: Option<String>,
    fetch_timeout_ms: Option<u64>,
    #[serde(default)]
    gust_policy: GustPolicy,
    #[serde(default)]
    firs: IndexMap<String, Vec<String>>,
    #[serde(default)]
    runways: IndexMap<String, Vec<RunwayConfigurationEntry>>,
}

/// What survives `--clean-config`.
#[derive(Debug, Serialize)]
struct KeptSettings<'a> {
    rwy_file_path: &'a Path,
}

impl ArasConfig {
    /// Loads `path`, or the config file in the project config directory
    /// (created from the bundled default when missing).
    pub fn load(path: Option<&Path>, clean_config: bool) -> ApplicationResult<Self> {
        let config_file_path = match path {
            Some(path) => path.to_path_buf(),
            None => project_config_file()?,
        };
        let config = setup_configuration(&config_file_path, clean_config)?;
        Ok(Self::from_configurable(config, config_file_path))
    }

    #[allow(dead_code)] // used in tests
    pub fn from_toml_str(raw: &str) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(config::File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize::<Configurable>()?;
        Ok(Self::from_configurable(config, PathBuf::from("config.toml")))
    }

    fn from_configurable(config: Configurable, config_file_path: PathBuf) -> Self {
        let catalogue = RunwayCatalogue::from_entries(&config.runways);
        let firs = normalize_firs(&config.firs, &catalogue);
        Self {
            config_file_path,
            config,
            firs,
            catalogue,
        }
    }

    pub fn config_file_path(&self) -> &Path {
        &self.config_file_path
    }

    pub fn catalogue(&self) -> &RunwayCatalogue {
        &self.catalogue
    }

    pub fn firs(&self) -> &IndexMap<String, Vec<String>> {
        &self.firs
    }

    pub fn airports_for_fir(&self, fir: &str) -> ApplicationResult<&[String]> {
        normalize_icao(fir)
            .and_then(|fir| self.firs.get(&fir))
            .map(Vec::as_slice)
            .ok_or_else(|| ApplicationError::UnknownFir(fir.to_string()))
    }

    /// `output` wins over the configured path.
    pub fn rwy_file_path(&self, output: Option<&Path>) -> ApplicationResult<PathBuf> {
        output
            .or(self.config.rwy_file_path.as_deref())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                ApplicationError::NoOutputPath(self.config_file_path.display().to_string())
            })
    }

    pub fn metar_url(&self) -> &str {
        self.config.metar_url.as_deref().unwrap_or(DEFAULT_METAR_URL)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(
            self.config
                .fetch_timeout_ms
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
        )
    }

    pub fn gust_policy(&self) -> GustPolicy {
        self.config.gust_policy
    }
}

fn project_config_file() -> ApplicationResult<PathBuf> {
    let dirs = aras_project_dir().ok_or_else(|| {
        ApplicationError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No home directory to keep the config file in",
        ))
    })?;
    Ok(dirs.config_dir().join("config.toml"))
}

fn setup_configuration(config_file: &Path, clean_config: bool) -> ApplicationResult<Configurable> {
    if !config_file.exists() {
        if let Some(dir) = config_file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(config_file, DEFAULT_CONFIG)?;
        info!(path = %config_file.display(), "Created default config file");
    }

    let configurable = Config::builder()
        .add_source(config::File::from(config_file.to_path_buf()).required(true))
        .build()?
        .try_deserialize::<Configurable>()?;

    if clean_config {
        let mut raw_config_file = Cow::Borrowed(DEFAULT_CONFIG);
        if let Some(rwy_file_path) = &configurable.rwy_file_path {
            let kept = toml::to_string(&KeptSettings { rwy_file_path })?;
            raw_config_file = format!("{kept}\n{raw_config_file}").into();
        }
        fs::write(config_file, raw_config_file.as_bytes())?;
        info!(path = %config_file.display(), "Reset config file");
        setup_configuration(config_file, false)
    } else {
        debug!(path = %config_file.display(), "Loaded config file");
        Ok(configurable)
    }
}

fn normalize_firs(
    firs: &IndexMap<String, Vec<String>>,
    catalogue: &RunwayCatalogue,
) -> IndexMap<String, Vec<String>> {
    firs.iter()
        .filter_map(|(raw_fir, airports)| {
            let Some(fir) = normalize_icao(raw_fir) else {
                warn!(fir = %raw_fir, "Invalid FIR identifier in config");
                return None;
            };
            let airports = airports
                .iter()
                .filter_map(|raw| {
                    let icao = normalize_icao(raw);
                    match &icao {
                        None => warn!(fir = %fir, airport = %raw, "Invalid airport identifier"),
                        Some(icao) if !catalogue.contains(icao) => {
                            warn!(fir = %fir, airport = %icao, "No runway configuration")
                        }
                        Some(_) => (),
                    }
                    icao
                })
                .collect();
            Some((fir, airports))
        })
        .collect()
}
