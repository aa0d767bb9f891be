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

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ObservableType, ObservationModel};
use crate::od::lighttime::LightTimeCorrection;
use crate::od::partials::scaling::{
    AngularPositionScaling, DopplerScaling, PositionObservableScaling, PositionPartialScaling,
    RangeScaling,
};
use crate::od::{LinkEnds, PartialError, UnrecognizedObservableTypeSnafu};

/// Builds the position partial scaling of an observable for the provided link ends.
pub type ScalingFactory = fn(&LinkEnds) -> Arc<dyn PositionPartialScaling>;

/// What the partials engine may do with one kind of observable.
#[derive(Copy, Clone, Debug)]
pub struct ObservableCapabilities {
    /// Number of scalar values in one observation
    pub size: usize,
    /// Whether the observation models of this kind carry light time calculators
    pub light_time: bool,
    /// Position partial scaling, if the partials of this observable are supported
    pub scaling: Option<ScalingFactory>,
}

lazy_static! {
    static ref OBSERVABLE_REGISTRY: ObservableRegistry = ObservableRegistry::default();
}

/// Lookup table of the capabilities of each observable type.
///
/// The default registry holds the built in observables. Supporting a new observable only requires registering its
/// capabilities, typically under an [`ObservableType::Custom`] identifier.
#[derive(Clone, Debug)]
pub struct ObservableRegistry {
    capabilities: HashMap<ObservableType, ObservableCapabilities>,
}

impl ObservableRegistry {
    /// A registry without any observable.
    pub fn empty() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// The registry of the built in observables, shared by the whole program.
    pub fn global() -> &'static Self {
        &OBSERVABLE_REGISTRY
    }

    /// Registers the capabilities of an observable, returning the previous capabilities if it was already registered.
    pub fn register(
        &mut self,
        observable: ObservableType,
        capabilities: ObservableCapabilities,
    ) -> Option<ObservableCapabilities> {
        debug!(
            "registering {observable} of size {} (light time: {}, partials: {})",
            capabilities.size,
            capabilities.light_time,
            capabilities.scaling.is_some()
        );
        self.capabilities.insert(observable, capabilities)
    }

    pub fn get(&self, observable: ObservableType) -> Option<&ObservableCapabilities> {
        self.capabilities.get(&observable)
    }

    /// Number of scalar values in one observation of this type, if registered.
    pub fn size_of(&self, observable: ObservableType) -> Option<usize> {
        self.get(observable).map(|caps| caps.size)
    }

    /// Returns the light time corrections of each signal path of the provided model.
    pub fn light_time_corrections(
        &self,
        model: &dyn ObservationModel,
    ) -> Result<Vec<Vec<LightTimeCorrection>>, PartialError> {
        let observable = model.observable_type();
        match self.get(observable) {
            Some(caps) if caps.light_time => Ok(model
                .light_time_calculators()
                .iter()
                .map(|calculator| calculator.corrections.clone())
                .collect()),
            _ => UnrecognizedObservableTypeSnafu {
                observable,
                action: "extracting light time corrections",
            }
            .fail(),
        }
    }
}

fn range_scaling(_: &LinkEnds) -> Arc<dyn PositionPartialScaling> {
    Arc::new(RangeScaling)
}

fn doppler_scaling(_: &LinkEnds) -> Arc<dyn PositionPartialScaling> {
    Arc::new(DopplerScaling)
}

fn angular_position_scaling(_: &LinkEnds) -> Arc<dyn PositionPartialScaling> {
    Arc::new(AngularPositionScaling)
}

fn position_scaling(_: &LinkEnds) -> Arc<dyn PositionPartialScaling> {
    Arc::new(PositionObservableScaling)
}

impl Default for ObservableRegistry {
    fn default() -> Self {
        let mut me = Self::empty();
        me.register(
            ObservableType::OneWayRange,
            ObservableCapabilities {
                size: 1,
                light_time: true,
                scaling: Some(range_scaling),
            },
        );
        me.register(
            ObservableType::OneWayDoppler,
            ObservableCapabilities {
                size: 1,
                light_time: true,
                scaling: Some(doppler_scaling),
            },
        );
        me.register(
            ObservableType::AngularPosition,
            ObservableCapabilities {
                size: 2,
                light_time: true,
                scaling: Some(angular_position_scaling),
            },
        );
        me.register(
            ObservableType::Position,
            ObservableCapabilities {
                size: 3,
                light_time: false,
                scaling: Some(position_scaling),
            },
        );
        me
    }
}
