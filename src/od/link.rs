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

use crate::linalg::{DVector, UnitQuaternion, Vector3};
use crate::time::Epoch;
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{MissingLinkEndStateSnafu, MissingPerturberSnafu, PartialError};

/// Role of a participant in a tracking link.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Sequence, Serialize, Deserialize)]
pub enum LinkEndType {
    Transmitter,
    Reflector1,
    Reflector2,
    Reflector3,
    Receiver,
    /// The body whose state is directly observed (e.g. position observables), there is no signal path
    ObservedBody,
}

/// Identity of a link participant: a body, and optionally a reference point fixed on that body (e.g. a ground station).
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkEndId {
    pub body: String,
    #[serde(default)]
    pub reference_point: Option<String>,
}

impl LinkEndId {
    /// A link end at the center of mass of the provided body.
    pub fn body<S: Into<String>>(body: S) -> Self {
        Self {
            body: body.into(),
            reference_point: None,
        }
    }

    /// A link end at a reference point fixed on the provided body.
    pub fn station<S: Into<String>, R: Into<String>>(body: S, reference_point: R) -> Self {
        Self {
            body: body.into(),
            reference_point: Some(reference_point.into()),
        }
    }
}

impl fmt::Display for LinkEndId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.reference_point {
            Some(point) => write!(f, "{}/{point}", self.body),
            None => write!(f, "{}", self.body),
        }
    }
}

/// Identity of a tracking geometry, i.e. the participant bound to each role.
///
/// Link ends are immutable once built and compare by content, which allows them to be used as map keys.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkEnds {
    ends: BTreeMap<LinkEndType, LinkEndId>,
}

impl LinkEnds {
    /// Builds the link ends of a one way link from the transmitter to the receiver.
    pub fn one_way(transmitter: LinkEndId, receiver: LinkEndId) -> Self {
        Self::from_iter([
            (LinkEndType::Transmitter, transmitter),
            (LinkEndType::Receiver, receiver),
        ])
    }

    /// Builds the link ends of a direct observation of the provided body.
    pub fn observed(body: LinkEndId) -> Self {
        Self::from_iter([(LinkEndType::ObservedBody, body)])
    }

    pub fn get(&self, role: LinkEndType) -> Option<&LinkEndId> {
        self.ends.get(&role)
    }

    pub fn contains(&self, role: LinkEndType) -> bool {
        self.ends.contains_key(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LinkEndType, &LinkEndId)> {
        self.ends.iter()
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

impl FromIterator<(LinkEndType, LinkEndId)> for LinkEnds {
    fn from_iter<T: IntoIterator<Item = (LinkEndType, LinkEndId)>>(iter: T) -> Self {
        Self {
            ends: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for LinkEnds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let seq = self
            .ends
            .iter()
            .map(|(role, id)| format!("{role:?}: {id}"))
            .collect::<Vec<String>>();
        write!(f, "[{}]", seq.join(", "))
    }
}

/// State of one link end at the time it takes part in the link.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinkEndState {
    pub epoch: Epoch,
    /// Inertial position in km
    pub position_km: Vector3<f64>,
    /// Inertial velocity in km/s
    pub velocity_km_s: Vector3<f64>,
    /// Rotation from the body fixed frame of the link end's body to the inertial frame
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity of the link end's body, expressed in its body fixed frame, in rad/s
    pub angular_velocity_rad_s: Vector3<f64>,
}

impl LinkEndState {
    /// Initializes a new link end state, the body fixed frame is aligned with the inertial frame and not rotating.
    pub fn new(epoch: Epoch, position_km: Vector3<f64>, velocity_km_s: Vector3<f64>) -> Self {
        Self {
            epoch,
            position_km,
            velocity_km_s,
            orientation: UnitQuaternion::identity(),
            angular_velocity_rad_s: Vector3::zeros(),
        }
    }

    /// Sets the body orientation and body fixed angular velocity of this link end.
    pub fn with_orientation(
        mut self,
        orientation: UnitQuaternion<f64>,
        angular_velocity_rad_s: Vector3<f64>,
    ) -> Self {
        self.orientation = orientation;
        self.angular_velocity_rad_s = angular_velocity_rad_s;
        self
    }
}

/// Evaluation time geometry of one link, provided by the caller at each epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkGeometry {
    pub states: BTreeMap<LinkEndType, LinkEndState>,
    /// Current value of the computed observation, needed by relative bias partials
    pub observation: DVector<f64>,
    /// Inertial positions of the bodies perturbing the signal path, in km
    pub perturbers: BTreeMap<String, Vector3<f64>>,
}

impl Default for LinkGeometry {
    fn default() -> Self {
        Self {
            states: BTreeMap::new(),
            observation: DVector::zeros(0),
            perturbers: BTreeMap::new(),
        }
    }
}

impl LinkGeometry {
    pub fn new<I: IntoIterator<Item = (LinkEndType, LinkEndState)>>(states: I) -> Self {
        Self {
            states: states.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_observation(mut self, observation: DVector<f64>) -> Self {
        self.observation = observation;
        self
    }

    pub fn with_perturber<S: Into<String>>(mut self, body: S, position_km: Vector3<f64>) -> Self {
        self.perturbers.insert(body.into(), position_km);
        self
    }

    pub fn state(&self, role: LinkEndType) -> Result<&LinkEndState, PartialError> {
        self.states
            .get(&role)
            .ok_or(MissingLinkEndStateSnafu { role }.build())
    }

    pub fn perturber(&self, body: &str) -> Result<&Vector3<f64>, PartialError> {
        self.perturbers
            .get(body)
            .ok_or_else(|| MissingPerturberSnafu { body }.build())
    }
}
