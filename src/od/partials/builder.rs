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

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use snafu::ensure;
use typed_builder::TypedBuilder;

use super::scaling::{create_position_scaling, PositionPartialScaling};
use super::state::StatePartialProvider;
use super::{AbsoluteBiasPartial, LinkObservationPartial, ObservationPartial, RelativeBiasPartial};
use crate::linalg::DMatrix;
use crate::od::lighttime::{LightTimeCorrection, LightTimeCorrectionChain};
use crate::od::msr::{ObservableRegistry, ObservableType};
use crate::od::param::{EstimableParameter, ParameterCatalog, ParameterKind};
use crate::od::{
    InvalidParameterSizeSnafu, LinkEnds, LinkGeometry, PartialError, UnrecognizedParameterKindSnafu,
};

/// All the observation partials of one link, keyed by (index in the estimated parameter vector, parameter size).
///
/// The scaling is shared by every partial of the set: compute one snapshot per epoch and evaluate all partials with it.
pub struct SingleLinkPartialSet {
    partials: BTreeMap<(usize, usize), Box<dyn ObservationPartial>>,
    scaling: Arc<dyn PositionPartialScaling>,
}

impl SingleLinkPartialSet {
    pub fn partials(&self) -> &BTreeMap<(usize, usize), Box<dyn ObservationPartial>> {
        &self.partials
    }

    pub fn scaling(&self) -> &Arc<dyn PositionPartialScaling> {
        &self.scaling
    }

    pub fn get(&self, index: usize, size: usize) -> Option<&dyn ObservationPartial> {
        self.partials.get(&(index, size)).map(|partial| partial.as_ref())
    }

    /// Keys of the partials, in increasing index order.
    pub fn keys(&self) -> Vec<(usize, usize)> {
        self.partials.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Evaluates every partial of this link and places them in an observation size x parameter vector size matrix.
    pub fn jacobian(
        &self,
        geometry: &LinkGeometry,
        parameter_vector_size: usize,
    ) -> Result<DMatrix<f64>, PartialError> {
        let snapshot = self.scaling.snapshot(geometry)?;
        let rows = snapshot.observation_size();
        let mut jacobian = DMatrix::zeros(rows, parameter_vector_size);

        for (&(index, size), partial) in &self.partials {
            ensure!(
                index + size <= parameter_vector_size,
                InvalidParameterSizeSnafu {
                    id: partial.parameter().id.clone(),
                    expected: parameter_vector_size.saturating_sub(index),
                    found: size
                }
            );
            let block = partial.evaluate(&snapshot, geometry)?;
            jacobian.view_mut((0, index), (rows, size)).copy_from(&block);
        }

        Ok(jacobian)
    }
}

impl fmt::Debug for SingleLinkPartialSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SingleLinkPartialSet")
            .field("keys", &self.keys())
            .field("scaling", &self.scaling)
            .finish()
    }
}

/// Creates the partial with respect to the translational state of a body, if the link depends on it.
fn create_body_state_partial(
    provider: &dyn StatePartialProvider,
    link_ends: &LinkEnds,
    parameter: &EstimableParameter,
    scaling: &Arc<dyn PositionPartialScaling>,
) -> Result<Option<Box<dyn ObservationPartial>>, PartialError> {
    let state_partials = provider.state_partials_wrt_body_state(link_ends, parameter.body())?;
    if state_partials.is_empty() {
        return Ok(None);
    }
    let partial: Box<dyn ObservationPartial> = Box::new(LinkObservationPartial::new(
        parameter.clone(),
        scaling.clone(),
        state_partials,
        Vec::new(),
    ));
    Ok(Some(partial))
}

/// Creates the partial with respect to the rotational state of a body, if the link depends on it.
fn create_rotational_state_partial(
    provider: &dyn StatePartialProvider,
    link_ends: &LinkEnds,
    parameter: &EstimableParameter,
    scaling: &Arc<dyn PositionPartialScaling>,
) -> Result<Option<Box<dyn ObservationPartial>>, PartialError> {
    let state_partials =
        provider.state_partials_wrt_body_rotational_state(link_ends, parameter.body())?;
    if state_partials.is_empty() {
        return Ok(None);
    }
    let partial: Box<dyn ObservationPartial> = Box::new(LinkObservationPartial::new(
        parameter.clone(),
        scaling.clone(),
        state_partials,
        Vec::new(),
    ));
    Ok(Some(partial))
}

/// Creates the partial with respect to any other physical parameter. The link depends on it if either the link end
/// states or the light time corrections depend on it.
fn create_parameter_partial(
    provider: &dyn StatePartialProvider,
    link_ends: &LinkEnds,
    parameter: &EstimableParameter,
    scaling: &Arc<dyn PositionPartialScaling>,
    light_time: &LightTimeCorrectionChain,
) -> Result<Option<Box<dyn ObservationPartial>>, PartialError> {
    let state_partials = provider.state_partials_wrt_parameter(link_ends, parameter)?;
    let light_time_partials = light_time.dependent_on(parameter);
    if state_partials.is_empty() && light_time_partials.is_empty() {
        return Ok(None);
    }
    let partial: Box<dyn ObservationPartial> = Box::new(LinkObservationPartial::new(
        parameter.clone(),
        scaling.clone(),
        state_partials,
        light_time_partials,
    ));
    Ok(Some(partial))
}

/// Creates the partial with respect to a property of a link (a bias), if it is attached to this link and observable.
fn create_link_property_partial(
    link_ends: &LinkEnds,
    observable: ObservableType,
    parameter: &EstimableParameter,
    scaling: &Arc<dyn PositionPartialScaling>,
) -> Result<Option<Box<dyn ObservationPartial>>, PartialError> {
    let attached = parameter
        .id
        .link
        .as_ref()
        .is_some_and(|link| &link.link_ends == link_ends && link.observable == observable);
    if !attached {
        return Ok(None);
    }

    let size = scaling.observation_size();
    ensure!(
        parameter.size == size,
        InvalidParameterSizeSnafu {
            id: parameter.id.clone(),
            expected: size,
            found: parameter.size
        }
    );

    let partial: Box<dyn ObservationPartial> = match parameter.kind() {
        ParameterKind::ConstantAbsoluteBias => {
            Box::new(AbsoluteBiasPartial::new(parameter.clone(), observable))
        }
        ParameterKind::ConstantRelativeBias => {
            Box::new(RelativeBiasPartial::new(parameter.clone(), observable))
        }
        _ => return Ok(None),
    };
    Ok(Some(partial))
}

/// Assembles the observation partials of one link with respect to all the estimated parameters of a catalog.
#[derive(TypedBuilder)]
#[builder(doc)]
pub struct SingleLinkPartialBuilder<'a> {
    catalog: &'a ParameterCatalog,
    provider: &'a dyn StatePartialProvider,
    #[builder(default = ObservableRegistry::global())]
    registry: &'a ObservableRegistry,
    /// Set to false to never build the partials with respect to the observation biases
    #[builder(default = true)]
    use_bias_partials: bool,
}

impl<'a> SingleLinkPartialBuilder<'a> {
    /// Builds the partials of the observable on the provided link.
    ///
    /// The light time corrections are those of the (single) signal path of the link, and may be empty.
    /// Any error aborts the whole assembly.
    pub fn build(
        &self,
        link_ends: &LinkEnds,
        observable: ObservableType,
        light_time_corrections: &[LightTimeCorrection],
    ) -> Result<SingleLinkPartialSet, PartialError> {
        let light_time = LightTimeCorrectionChain::new(light_time_corrections);
        let scaling = create_position_scaling(self.registry, link_ends, observable)?;

        let mut partials: BTreeMap<(usize, usize), Box<dyn ObservationPartial>> = BTreeMap::new();

        // Initial states are laid out in catalog order, so the offset advances even without dependency.
        let mut offset = 0;
        for parameter in self.catalog.initial_state_parameters() {
            let (partial, block) = match parameter.kind() {
                ParameterKind::InitialBodyState => (
                    create_body_state_partial(self.provider, link_ends, parameter, &scaling)?,
                    6,
                ),
                ParameterKind::InitialRotationalBodyState => (
                    create_rotational_state_partial(self.provider, link_ends, parameter, &scaling)?,
                    7,
                ),
                kind => {
                    return UnrecognizedParameterKindSnafu {
                        kind,
                        body: parameter.body().to_string(),
                    }
                    .fail()
                }
            };
            if let Some(partial) = partial {
                trace!("{observable} on {link_ends} depends on {parameter} at {offset}");
                partials.insert((offset, block), partial);
            }
            offset += block;
        }

        for (&index, parameter) in self.catalog.double_parameters() {
            if let Some(partial) =
                create_parameter_partial(self.provider, link_ends, parameter, &scaling, &light_time)?
            {
                trace!("{observable} on {link_ends} depends on {parameter} at {index}");
                partials.insert((index, 1), partial);
            }
        }

        for (&index, parameter) in self.catalog.vector_parameters() {
            let partial = if parameter.kind().is_link_property() {
                if self.use_bias_partials {
                    create_link_property_partial(link_ends, observable, parameter, &scaling)?
                } else {
                    None
                }
            } else {
                create_parameter_partial(self.provider, link_ends, parameter, &scaling, &light_time)?
            };
            if let Some(partial) = partial {
                trace!("{observable} on {link_ends} depends on {parameter} at {index}");
                partials.insert((index, parameter.size), partial);
            }
        }

        debug!(
            "{} partials of {observable} built for {link_ends} ({} light time correction partials)",
            partials.len(),
            light_time.len()
        );

        Ok(SingleLinkPartialSet { partials, scaling })
    }
}
