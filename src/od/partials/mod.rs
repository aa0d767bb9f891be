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
use crate::od::lighttime::LightTimeCorrectionPartial;
use crate::od::msr::ObservableType;
use crate::od::param::EstimableParameter;
use crate::od::{LinkGeometry, ObservationSizeMismatchSnafu, PartialError, ScalingMismatchSnafu};
use snafu::ensure;
use std::fmt;
use std::sync::Arc;

mod builder;
mod multi;
pub mod scaling;
pub mod state;

pub use builder::{SingleLinkPartialBuilder, SingleLinkPartialSet};
pub use multi::{light_time_corrections_by_link, LightTimeCorrectionsByLink, MultiLinkPartialBuilder};
pub use scaling::{create_position_scaling, PositionPartialScaling, ScalingSnapshot};
pub use state::{BodyStatePartials, CartesianStatePartial, StatePartialMap, StatePartialProvider};

/// Sensitivity of one observation to one estimated parameter.
///
/// A partial is only built when a dependency exists, it never evaluates to an identically zero block by construction.
pub trait ObservationPartial: Send + Sync + fmt::Debug {
    fn parameter(&self) -> &EstimableParameter;

    fn parameter_size(&self) -> usize {
        self.parameter().size
    }

    /// Number of light time corrections contributing to this partial.
    fn light_time_partial_count(&self) -> usize {
        0
    }

    /// Evaluates this partial as an observation size x parameter size matrix.
    fn evaluate(
        &self,
        snapshot: &ScalingSnapshot,
        geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError>;
}

/// Partial of an observation through the states of its link ends and through its light time corrections.
#[derive(Debug)]
pub struct LinkObservationPartial {
    parameter: EstimableParameter,
    scaling: Arc<dyn PositionPartialScaling>,
    state_partials: StatePartialMap,
    light_time_partials: Vec<Arc<dyn LightTimeCorrectionPartial>>,
}

impl LinkObservationPartial {
    pub fn new(
        parameter: EstimableParameter,
        scaling: Arc<dyn PositionPartialScaling>,
        state_partials: StatePartialMap,
        light_time_partials: Vec<Arc<dyn LightTimeCorrectionPartial>>,
    ) -> Self {
        Self {
            parameter,
            scaling,
            state_partials,
            light_time_partials,
        }
    }

    pub fn state_partials(&self) -> &StatePartialMap {
        &self.state_partials
    }

    pub fn scaling(&self) -> &Arc<dyn PositionPartialScaling> {
        &self.scaling
    }
}

impl ObservationPartial for LinkObservationPartial {
    fn parameter(&self) -> &EstimableParameter {
        &self.parameter
    }

    fn light_time_partial_count(&self) -> usize {
        self.light_time_partials.len()
    }

    fn evaluate(
        &self,
        snapshot: &ScalingSnapshot,
        geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError> {
        let expected = self.scaling.observable_type();
        ensure!(
            snapshot.observable() == expected,
            ScalingMismatchSnafu {
                expected,
                found: snapshot.observable()
            }
        );

        let mut partial = DMatrix::zeros(snapshot.observation_size(), self.parameter.size);

        for (role, state_partial) in &self.state_partials {
            // Link ends which do not take part in the observable (e.g. a reflector of a one way link)
            if let Some(wrt_state) = snapshot.wrt_link_end(*role) {
                let state = geometry.state(*role)?;
                partial += wrt_state * state_partial.wrt_parameter(state)?;
            }
        }

        for light_time_partial in &self.light_time_partials {
            partial += snapshot.light_time_factor()
                * light_time_partial.wrt_parameter(&self.parameter, geometry)?;
        }

        Ok(partial)
    }
}

/// Partial of an observable with respect to a constant bias added to it.
#[derive(Clone, Debug)]
pub struct AbsoluteBiasPartial {
    parameter: EstimableParameter,
    observable: ObservableType,
}

impl AbsoluteBiasPartial {
    pub fn new(parameter: EstimableParameter, observable: ObservableType) -> Self {
        Self {
            parameter,
            observable,
        }
    }
}

impl ObservationPartial for AbsoluteBiasPartial {
    fn parameter(&self) -> &EstimableParameter {
        &self.parameter
    }

    fn evaluate(
        &self,
        snapshot: &ScalingSnapshot,
        _geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError> {
        ensure!(
            snapshot.observable() == self.observable,
            ScalingMismatchSnafu {
                expected: self.observable,
                found: snapshot.observable()
            }
        );
        Ok(DMatrix::identity(
            snapshot.observation_size(),
            self.parameter.size,
        ))
    }
}

/// Partial of an observable with respect to a constant bias proportional to it, i.e. the current observation.
#[derive(Clone, Debug)]
pub struct RelativeBiasPartial {
    parameter: EstimableParameter,
    observable: ObservableType,
}

impl RelativeBiasPartial {
    pub fn new(parameter: EstimableParameter, observable: ObservableType) -> Self {
        Self {
            parameter,
            observable,
        }
    }
}

impl ObservationPartial for RelativeBiasPartial {
    fn parameter(&self) -> &EstimableParameter {
        &self.parameter
    }

    fn evaluate(
        &self,
        snapshot: &ScalingSnapshot,
        geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError> {
        ensure!(
            snapshot.observable() == self.observable,
            ScalingMismatchSnafu {
                expected: self.observable,
                found: snapshot.observable()
            }
        );
        ensure!(
            geometry.observation.len() == self.parameter.size,
            ObservationSizeMismatchSnafu {
                expected: self.parameter.size,
                found: geometry.observation.len()
            }
        );
        Ok(DMatrix::from_diagonal(&geometry.observation))
    }
}
