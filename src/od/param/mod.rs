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

use crate::od::msr::ObservableType;
use crate::od::LinkEnds;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

mod catalog;
pub use catalog::ParameterCatalog;

/// Body name used for parameters which are not attached to any body, like the PPN parameters.
pub const GLOBAL_METRIC: &str = "global_metric";

/// How a parameter is stored in the catalog.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParameterCategory {
    /// Part of the initial state vector, whose block offsets are computed from the catalog order
    InitialState,
    /// A scalar parameter
    Double,
    /// A vector parameter
    Vector,
}

/// Kind of estimated parameter.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Initial Cartesian state of a body (position and velocity)
    InitialBodyState,
    /// Initial rotational state of a body (quaternion to the inertial frame and body fixed angular velocity)
    InitialRotationalBodyState,
    /// Initial mass of a body
    InitialMassState,
    /// Gravitational parameter of a body (km^3/s^2)
    GravitationalParameter,
    /// Coefficient of reflectivity
    RadiationPressureCoefficient,
    /// Coefficient of drag
    ConstantDragCoefficient,
    /// Post-Newtonian parameter gamma
    PpnGamma,
    /// Body fixed position of a ground station (km)
    GroundStationPosition,
    /// Constant bias added to the observable
    ConstantAbsoluteBias,
    /// Constant bias proportional to the observable
    ConstantRelativeBias,
}

impl ParameterKind {
    pub fn category(self) -> ParameterCategory {
        match self {
            Self::InitialBodyState | Self::InitialRotationalBodyState | Self::InitialMassState => {
                ParameterCategory::InitialState
            }
            Self::GravitationalParameter
            | Self::RadiationPressureCoefficient
            | Self::ConstantDragCoefficient
            | Self::PpnGamma => ParameterCategory::Double,
            Self::GroundStationPosition | Self::ConstantAbsoluteBias | Self::ConstantRelativeBias => {
                ParameterCategory::Vector
            }
        }
    }

    /// Returns whether this parameter is a property of an observation link (e.g. a bias) rather than of the physical state.
    pub fn is_link_property(self) -> bool {
        matches!(self, Self::ConstantAbsoluteBias | Self::ConstantRelativeBias)
    }

    /// Size of parameters of this kind, or None if it depends on the observable it is attached to.
    pub fn expected_size(self) -> Option<usize> {
        match self {
            Self::InitialBodyState => Some(6),
            Self::InitialRotationalBodyState => Some(7),
            Self::InitialMassState
            | Self::GravitationalParameter
            | Self::RadiationPressureCoefficient
            | Self::ConstantDragCoefficient
            | Self::PpnGamma => Some(1),
            Self::GroundStationPosition => Some(3),
            Self::ConstantAbsoluteBias | Self::ConstantRelativeBias => None,
        }
    }
}

/// The link and observable a link property parameter applies to.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkProperty {
    pub link_ends: LinkEnds,
    pub observable: ObservableType,
}

/// Identity of an estimated parameter, unique within a catalog.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterId {
    pub kind: ParameterKind,
    pub body: String,
    #[serde(default)]
    pub reference_point: Option<String>,
    #[serde(default)]
    pub link: Option<LinkProperty>,
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} of {}", self.kind, self.body)?;
        if let Some(point) = &self.reference_point {
            write!(f, "/{point}")?;
        }
        if let Some(link) = &self.link {
            write!(f, " ({} on {})", link.observable, link.link_ends)?;
        }
        Ok(())
    }
}

/// One estimated quantity: its identity and its size in the estimated parameter vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimableParameter {
    #[serde(flatten)]
    pub id: ParameterId,
    pub size: usize,
}

impl EstimableParameter {
    /// Initializes a parameter of the provided kind, attached to the provided body.
    pub fn new<S: Into<String>>(kind: ParameterKind, body: S, size: usize) -> Self {
        Self {
            id: ParameterId {
                kind,
                body: body.into(),
                reference_point: None,
                link: None,
            },
            size,
        }
    }

    /// Initial Cartesian state of the provided body.
    pub fn initial_state<S: Into<String>>(body: S) -> Self {
        Self::new(ParameterKind::InitialBodyState, body, 6)
    }

    /// Initial rotational state of the provided body.
    pub fn initial_rotational_state<S: Into<String>>(body: S) -> Self {
        Self::new(ParameterKind::InitialRotationalBodyState, body, 7)
    }

    pub fn gravitational_parameter<S: Into<String>>(body: S) -> Self {
        Self::new(ParameterKind::GravitationalParameter, body, 1)
    }

    pub fn ppn_gamma() -> Self {
        Self::new(ParameterKind::PpnGamma, GLOBAL_METRIC, 1)
    }

    /// Body fixed position of the ground station `station` on `body`.
    pub fn ground_station_position<S: Into<String>, R: Into<String>>(body: S, station: R) -> Self {
        let mut me = Self::new(ParameterKind::GroundStationPosition, body, 3);
        me.id.reference_point = Some(station.into());
        me
    }

    /// Constant bias added to the `observable` of the provided link, of the size of that observable.
    pub fn absolute_bias(link_ends: LinkEnds, observable: ObservableType, size: usize) -> Self {
        Self::link_property(ParameterKind::ConstantAbsoluteBias, link_ends, observable, size)
    }

    /// Constant bias proportional to the `observable` of the provided link, of the size of that observable.
    pub fn relative_bias(link_ends: LinkEnds, observable: ObservableType, size: usize) -> Self {
        Self::link_property(ParameterKind::ConstantRelativeBias, link_ends, observable, size)
    }

    fn link_property(
        kind: ParameterKind,
        link_ends: LinkEnds,
        observable: ObservableType,
        size: usize,
    ) -> Self {
        let body = link_ends
            .iter()
            .next()
            .map(|(_, id)| id.body.clone())
            .unwrap_or_default();
        let mut me = Self::new(kind, body, size);
        me.id.link = Some(LinkProperty {
            link_ends,
            observable,
        });
        me
    }

    pub fn kind(&self) -> ParameterKind {
        self.id.kind
    }

    pub fn body(&self) -> &str {
        &self.id.body
    }
}

impl fmt::Display for EstimableParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.size)
    }
}
