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

use crate::linalg::DMatrix;
use crate::od::param::EstimableParameter;
use crate::od::{LinkGeometry, PartialError};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

mod relativistic;
pub use relativistic::FirstOrderRelativisticPartial;

/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// A body perturbing the signal path, with its gravitational parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Perturber {
    pub name: String,
    pub gm_km3_s2: f64,
}

/// An additive correction to the light time of one signal path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightTimeCorrection {
    /// Shapiro delay caused by the provided perturbing bodies, scaled by (1 + gamma)
    FirstOrderRelativistic {
        perturbers: Vec<Perturber>,
        #[serde(default = "default_ppn_gamma")]
        ppn_gamma: f64,
    },
    /// Tropospheric delay at the provided station
    Tropospheric { station: String },
    /// Ionospheric delay at the provided station
    Ionospheric { station: String },
}

fn default_ppn_gamma() -> f64 {
    1.0
}

impl LightTimeCorrection {
    /// Returns the name of this correction, used in logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstOrderRelativistic { .. } => "first order relativistic",
            Self::Tropospheric { .. } => "tropospheric",
            Self::Ionospheric { .. } => "ionospheric",
        }
    }
}

/// Partial of a light time correction with respect to the estimated parameters.
pub trait LightTimeCorrectionPartial: Send + Sync + fmt::Debug {
    /// Returns whether the correction depends on the provided parameter.
    fn depends_on(&self, param: &EstimableParameter) -> bool;

    /// Returns the partial of the light time correction (in seconds) with respect to the provided parameter,
    /// as a 1 x parameter size matrix.
    fn wrt_parameter(
        &self,
        param: &EstimableParameter,
        geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError>;
}

/// Builds the partials of the provided corrections. Corrections without any estimated dependency are skipped.
pub fn create_light_time_correction_partials(
    corrections: &[LightTimeCorrection],
) -> Vec<Arc<dyn LightTimeCorrectionPartial>> {
    let mut partials: Vec<Arc<dyn LightTimeCorrectionPartial>> = Vec::new();
    for correction in corrections {
        match correction {
            LightTimeCorrection::FirstOrderRelativistic {
                perturbers,
                ppn_gamma,
            } => partials.push(Arc::new(FirstOrderRelativisticPartial::new(
                perturbers.clone(),
                *ppn_gamma,
            ))),
            LightTimeCorrection::Tropospheric { .. } | LightTimeCorrection::Ionospheric { .. } => {
                debug!(
                    "{} light time correction has no estimated dependency, no partial built",
                    correction.name()
                )
            }
        }
    }
    partials
}

/// The chain of light time correction partials of one signal path, shared by all the observation partials of a link.
#[derive(Clone, Debug, Default)]
pub struct LightTimeCorrectionChain {
    partials: Vec<Arc<dyn LightTimeCorrectionPartial>>,
}

impl LightTimeCorrectionChain {
    pub fn new(corrections: &[LightTimeCorrection]) -> Self {
        Self {
            partials: create_light_time_correction_partials(corrections),
        }
    }

    /// Returns the correction partials which depend on the provided parameter.
    pub fn dependent_on(&self, param: &EstimableParameter) -> Vec<Arc<dyn LightTimeCorrectionPartial>> {
        self.partials
            .iter()
            .filter(|partial| partial.depends_on(param))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }
}
