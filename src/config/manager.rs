//! Configuration file wrangling
// (c) 2024 Ross Younger

use super::Parameters;

use anyhow::Result;
use figment::{
    providers::{Format, Serialized, Toml},
    value::Value,
    Figment, Metadata, Provider,
};
use serde::Deserialize;
use std::{
    fmt::Display,
    path::{Path, PathBuf},
};
use tabled::{settings::style::Style, Table, Tabled};

use tracing::trace;

// PATHS /////////////////////////////////////////////////////////////////////////////////////////////////////

const BASE_CONFIG_FILENAME: &str = "ipcal.toml";

fn user_config_path() -> Result<PathBuf> {
    // ~/.<filename> for now
    let mut d = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("could not determine user home directory"))?;
    d.push(format!(".{BASE_CONFIG_FILENAME}"));
    Ok(d)
}

fn system_config_path() -> PathBuf {
    // /etc/<filename> for now
    let mut p: PathBuf = PathBuf::new();
    p.push("/etc");
    p.push(BASE_CONFIG_FILENAME);
    p
}

// SYSTEM DEFAULTS //////////////////////////////////////////////////////////////////////////////////////////////

/// A `[https://docs.rs/figment/latest/figment/trait.Provider.html](figment::Provider)` that holds
/// our set of fixed system default options
#[derive(Default)]
struct SystemDefault {}

impl SystemDefault {
    const META_NAME: &str = "default";
}

impl Provider for SystemDefault {
    fn metadata(&self) -> Metadata {
        figment::Metadata::named(Self::META_NAME)
    }

    fn data(
        &self,
    ) -> std::result::Result<
        figment::value::Map<figment::Profile, figment::value::Dict>,
        figment::Error,
    > {
        Serialized::defaults(Parameters::default()).data()
    }
}

// CONFIG MANAGER /////////////////////////////////////////////////////////////////////////////////////////////

/// Processes and merges all possible configuration sources.
///
/// To see which files apply on the current system, run `ipcal --config-files`.
#[derive(Debug)]
pub struct Manager {
    /// Configuration data
    data: Figment,
}

fn add_user_config(f: Figment) -> Figment {
    let path = match user_config_path() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("could not determine user configuration file path: {e}");
            return f;
        }
    };
    if !path.exists() {
        trace!("user configuration file {path:?} not present");
        return f;
    }
    f.merge(Toml::file(path.as_path()))
}

fn add_system_config(f: Figment) -> Figment {
    let path = system_config_path();
    if !path.exists() {
        trace!("system configuration file {path:?} not present");
        return f;
    }
    f.merge(Toml::file(path.as_path()))
}

impl Default for Manager {
    /// Initialises this structure fully-empty (for new(), or testing)
    fn default() -> Self {
        Self {
            data: Figment::default(),
        }
    }
}

impl Manager {
    /// Initialises this structure, reading the set of config files appropriate to the platform
    /// and the current user.
    #[must_use]
    pub fn new() -> Self {
        let mut data = Figment::new().merge(SystemDefault::default());
        data = add_system_config(data);

        // N.B. This may leave data in a fused-error state, if a data file isn't parseable.
        data = add_user_config(data);
        Self { data }
    }

    /// Returns the list of configuration files we read.
    ///
    /// This is a function of platform and the current user id.
    #[must_use]
    pub fn config_files() -> Vec<String> {
        let inputs = vec![Ok(system_config_path()), user_config_path()];

        inputs
            .into_iter()
            .filter_map(std::result::Result::ok)
            .map(|p| p.into_os_string().to_string_lossy().into())
            .collect()
    }

    /// Testing/internal constructor, does not read files from system
    #[must_use]
    #[allow(unused)]
    pub(crate) fn without_files() -> Self {
        let data = Figment::new().merge(SystemDefault::default());
        Self { data }
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    ///
    /// Within ipcal this is usually a [`ParametersOverride`](super::ParametersOverride)
    /// holding whatever the user gave on the command line.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Merges in a data set from a TOML file
    pub fn merge_toml_file<T>(&mut self, toml: T)
    where
        T: AsRef<Path>,
    {
        let path = toml.as_ref();
        let provider = Toml::file_exact(path);
        self.merge_provider(provider);
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// Within ipcal, `T` is usually [Parameters], but it isn't intrinsically required to be.
    pub fn get<'de, T>(&self) -> anyhow::Result<T, figment::Error>
    where
        T: Deserialize<'de>,
    {
        self.data.extract::<T>()
    }
}

// PRETTY PRINT SUPPORT ///////////////////////////////////////////////////////////////////////////////////////

#[derive(Tabled)]
struct PrettyConfig {
    field: String,
    value: String,
    source: String,
}

impl PrettyConfig {
    fn render_source(meta: Option<&Metadata>) -> String {
        if let Some(m) = meta {
            m.source
                .as_ref()
                .map_or_else(|| m.name.to_string(), figment::Source::to_string)
        } else {
            String::new()
        }
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::String(_tag, s) => s.to_string(),
            Value::Char(_tag, c) => c.to_string(),
            Value::Bool(_tag, b) => b.to_string(),
            Value::Num(_tag, num) => {
                if let Some(i) = num.to_i128() {
                    i.to_string()
                } else if let Some(u) = num.to_u128() {
                    u.to_string()
                } else if let Some(ff) = num.to_f64() {
                    ff.to_string()
                } else {
                    "<number>".into()
                }
            }
            Value::Empty(_tag, _) => "<empty>".into(),
            // we don't currently use dict types
            Value::Dict(_tag, _dict) => "<dict>".into(),
            Value::Array(_tag, vec) => {
                format!(
                    "[{}]",
                    vec.iter()
                        .map(PrettyConfig::render_value)
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }

    fn new(field: &str, value: &Value, meta: Option<&Metadata>) -> Self {
        Self {
            field: field.into(),
            value: PrettyConfig::render_value(value),
            source: PrettyConfig::render_source(meta),
        }
    }
}

impl Display for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = match self.data.data() {
            Ok(d) => d,
            Err(e) => {
                // This isn't terribly helpful as it doesn't have metadata attached; BUT attempting to get() a struct does.
                return write!(f, "error: {e}");
            }
        };
        let Some(data) = data.get(&figment::Profile::Default) else {
            return write!(f, "<no configuration data>");
        };

        let mut fields = Vec::<PrettyConfig>::new();

        for field in data.keys() {
            let value = self.data.find_value(field);
            let value = match value {
                Ok(v) => v,
                Err(e) => {
                    writeln!(f, "error on field {field}: {e}")?;
                    continue;
                }
            };
            let meta = self.data.find_metadata(field);
            fields.push(PrettyConfig::new(field, &value, meta));
        }
        write!(f, "{}", Table::new(fields).with(Style::sharp()))
    }
}
