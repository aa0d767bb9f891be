/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use typed_builder::TypedBuilder;

use crate::od::msr::{LinkObservationModel, ObservationModel};
use crate::od::param::{EstimableParameter, ParameterCatalog};
use crate::od::{LinkEnds, PartialError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read configuration file {}: {source}", path.display()))]
    ReadError { path: PathBuf, source: io::Error },

    #[snafu(display("failed to parse YAML configuration: {source}"))]
    ParseError { source: serde_yaml::Error },
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

pub trait ConfigRepr: Debug + Sized + serde::Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let reader = open(path.as_ref())?;
        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided path to a yaml
    fn load_many<P>(path: P) -> Result<Vec<Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let reader = open(path.as_ref())?;
        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds a map of names to "selves" from the provided path to a yaml
    fn load_named<P>(path: P) -> Result<BTreeMap<String, Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let reader = open(path.as_ref())?;
        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds "Self" from the provided string of a yaml
    fn loads(data: &str) -> Result<Self, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }

    /// Builds a sequence of "Selves" from the provided string of a yaml
    fn loads_many(data: &str) -> Result<Vec<Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ConfigError> {
    let file = File::open(path).context(ReadSnafu { path })?;
    Ok(BufReader::new(file))
}

/// Configuration of the partials of an orbit determination setup: the estimated parameters and the tracking links.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct PartialsConfig {
    /// Estimated parameters, in catalog order
    pub parameters: Vec<EstimableParameter>,
    /// Observation models of each tracking link
    #[builder(default)]
    #[serde(default)]
    pub models: Vec<LinkObservationModel>,
    /// Set to false to never build the partials with respect to the observation biases
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub use_bias_partials: bool,
}

fn default_true() -> bool {
    true
}

impl ConfigRepr for PartialsConfig {}

impl PartialsConfig {
    /// Builds the parameter catalog of this configuration.
    pub fn catalog(&self) -> Result<ParameterCatalog, PartialError> {
        ParameterCatalog::new(self.parameters.clone())
    }

    /// Returns the observation models keyed by their link ends. If two models share link ends, the last one is kept.
    pub fn models_by_link(&self) -> BTreeMap<LinkEnds, Arc<dyn ObservationModel>> {
        let mut models: BTreeMap<LinkEnds, Arc<dyn ObservationModel>> = BTreeMap::new();
        for model in &self.models {
            if models
                .insert(model.link_ends.clone(), Arc::new(model.clone()))
                .is_some()
            {
                warn!("{} defined more than once, using the last definition", model.link_ends);
            }
        }
        models
    }
}
