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

use super::ObservableType;
use crate::od::lighttime::LightTimeCorrection;
use crate::od::LinkEnds;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Computes the light time of one signal path, with its ordered list of corrections.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightTimeCalculator {
    #[serde(default)]
    pub corrections: Vec<LightTimeCorrection>,
}

impl LightTimeCalculator {
    pub fn new(corrections: Vec<LightTimeCorrection>) -> Self {
        Self { corrections }
    }
}

/// An observation model of one link, as seen by the partials engine.
pub trait ObservationModel: Send + Sync + fmt::Debug {
    fn observable_type(&self) -> ObservableType;

    fn link_ends(&self) -> &LinkEnds;

    /// Light time calculators of each signal path of this model. Models without any light time return none.
    fn light_time_calculators(&self) -> &[LightTimeCalculator] {
        &[]
    }
}

/// A plain observation model: an observable on a link, with the light time calculators of its signal paths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkObservationModel {
    pub observable: ObservableType,
    pub link_ends: LinkEnds,
    #[serde(default)]
    pub light_time: Vec<LightTimeCalculator>,
}

impl LinkObservationModel {
    pub fn new(observable: ObservableType, link_ends: LinkEnds) -> Self {
        Self {
            observable,
            link_ends,
            light_time: Vec::new(),
        }
    }

    /// Adds a signal path with the provided light time calculator.
    pub fn with_light_time(mut self, calculator: LightTimeCalculator) -> Self {
        self.light_time.push(calculator);
        self
    }
}

impl ObservationModel for LinkObservationModel {
    fn observable_type(&self) -> ObservableType {
        self.observable
    }

    fn link_ends(&self) -> &LinkEnds {
        &self.link_ends
    }

    fn light_time_calculators(&self) -> &[LightTimeCalculator] {
        &self.light_time
    }
}
