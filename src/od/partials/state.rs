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

use crate::linalg::{DMatrix, Matrix3, Vector3};
use crate::od::param::{EstimableParameter, ParameterKind};
use crate::od::{LinkEndState, LinkEndType, LinkEnds, PartialError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Partials of the Cartesian state of each link end, keyed by the role of that link end.
/// An empty map means that the link does not depend on the parameter.
pub type StatePartialMap = BTreeMap<LinkEndType, Arc<dyn CartesianStatePartial>>;

/// Partial of the inertial Cartesian state of one link end with respect to one parameter.
pub trait CartesianStatePartial: Send + Sync + fmt::Debug {
    fn parameter_size(&self) -> usize;

    /// Returns the 6 x parameter size partial of the position (km) and velocity (km/s) of the link end.
    fn wrt_parameter(&self, state: &LinkEndState) -> Result<DMatrix<f64>, PartialError>;
}

/// Provides the partials of the link end states with respect to the estimated parameters.
pub trait StatePartialProvider: Send + Sync {
    fn state_partials_wrt_parameter(
        &self,
        link_ends: &LinkEnds,
        parameter: &EstimableParameter,
    ) -> Result<StatePartialMap, PartialError>;

    fn state_partials_wrt_body_state(
        &self,
        link_ends: &LinkEnds,
        body: &str,
    ) -> Result<StatePartialMap, PartialError>;

    fn state_partials_wrt_body_rotational_state(
        &self,
        link_ends: &LinkEnds,
        body: &str,
    ) -> Result<StatePartialMap, PartialError>;
}

/// Skew symmetric matrix such that `cross(v) * w == v.cross(&w)`.
fn cross(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Partial of R(q) w with respect to the quaternion (q0, q1, q2, q3), scalar first, as a 3 x 4 matrix.
fn rotated_wrt_quaternion(state: &LinkEndState, w: Vector3<f64>) -> DMatrix<f64> {
    let q = state.orientation.quaternion();
    let q0 = q.w;
    let v = q.imag();

    let wrt_q0 = 2.0 * q0 * w + 2.0 * v.cross(&w);
    let wrt_v = -2.0 * w * v.transpose() + 2.0 * v.dot(&w) * Matrix3::identity()
        + 2.0 * v * w.transpose()
        - 2.0 * q0 * cross(&w);

    let mut partial = DMatrix::zeros(3, 4);
    partial.view_mut((0, 0), (3, 1)).copy_from(&wrt_q0);
    partial.view_mut((0, 1), (3, 3)).copy_from(&wrt_v);
    partial
}

/// The state of a link end moves one to one with the state of its body.
#[derive(Copy, Clone, Debug, Default)]
pub struct BodyStatePartial;

impl CartesianStatePartial for BodyStatePartial {
    fn parameter_size(&self) -> usize {
        6
    }

    fn wrt_parameter(&self, _state: &LinkEndState) -> Result<DMatrix<f64>, PartialError> {
        Ok(DMatrix::identity(6, 6))
    }
}

/// Partial of the inertial state of a reference point fixed on a rotating body, with respect to the rotational
/// state of that body (quaternion to the inertial frame, then body fixed angular velocity).
///
/// With r the body fixed position of the point, the inertial offset from the body center is R(q) r and its
/// inertial velocity is R(q) (ω × r).
#[derive(Copy, Clone, Debug)]
pub struct RotationalStatePartial {
    pub body_fixed_position_km: Vector3<f64>,
}

impl CartesianStatePartial for RotationalStatePartial {
    fn parameter_size(&self) -> usize {
        7
    }

    fn wrt_parameter(&self, state: &LinkEndState) -> Result<DMatrix<f64>, PartialError> {
        let r = self.body_fixed_position_km;
        let omega = state.angular_velocity_rad_s;
        let dcm = state.orientation.to_rotation_matrix().into_inner();

        let mut partial = DMatrix::zeros(6, 7);
        partial
            .view_mut((0, 0), (3, 4))
            .copy_from(&rotated_wrt_quaternion(state, r));
        partial
            .view_mut((3, 0), (3, 4))
            .copy_from(&rotated_wrt_quaternion(state, omega.cross(&r)));
        // ω × r = -r × ω
        partial
            .view_mut((3, 4), (3, 3))
            .copy_from(&(dcm * -cross(&r)));

        Ok(partial)
    }
}

/// Partial of the inertial state of a ground station with respect to its body fixed position.
#[derive(Copy, Clone, Debug, Default)]
pub struct GroundStationPositionPartial;

impl CartesianStatePartial for GroundStationPositionPartial {
    fn parameter_size(&self) -> usize {
        3
    }

    fn wrt_parameter(&self, state: &LinkEndState) -> Result<DMatrix<f64>, PartialError> {
        let dcm = state.orientation.to_rotation_matrix().into_inner();

        let mut partial = DMatrix::zeros(6, 3);
        partial.view_mut((0, 0), (3, 3)).copy_from(&dcm);
        partial
            .view_mut((3, 0), (3, 3))
            .copy_from(&(dcm * cross(&state.angular_velocity_rad_s)));

        Ok(partial)
    }
}

/// State partials of link ends attached to bodies whose translational or rotational states are estimated.
///
/// The body fixed positions of the reference points are needed for the rotational state partials only.
#[derive(Clone, Debug, Default)]
pub struct BodyStatePartials {
    reference_points: BTreeMap<String, BTreeMap<String, Vector3<f64>>>,
}

impl BodyStatePartials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reference point (e.g. a ground station) at the provided body fixed position.
    pub fn add_reference_point<S: Into<String>, R: Into<String>>(
        &mut self,
        body: S,
        name: R,
        body_fixed_position_km: Vector3<f64>,
    ) {
        self.reference_points
            .entry(body.into())
            .or_default()
            .insert(name.into(), body_fixed_position_km);
    }

    pub fn with_reference_point<S: Into<String>, R: Into<String>>(
        mut self,
        body: S,
        name: R,
        body_fixed_position_km: Vector3<f64>,
    ) -> Self {
        self.add_reference_point(body, name, body_fixed_position_km);
        self
    }

    fn reference_point(&self, body: &str, name: &str) -> Option<Vector3<f64>> {
        self.reference_points
            .get(body)
            .and_then(|points| points.get(name))
            .copied()
    }
}

impl StatePartialProvider for BodyStatePartials {
    fn state_partials_wrt_parameter(
        &self,
        link_ends: &LinkEnds,
        parameter: &EstimableParameter,
    ) -> Result<StatePartialMap, PartialError> {
        let mut partials = StatePartialMap::new();
        if parameter.kind() == ParameterKind::GroundStationPosition {
            for (role, end) in link_ends.iter() {
                if end.body == parameter.body() && end.reference_point == parameter.id.reference_point {
                    let partial: Arc<dyn CartesianStatePartial> = Arc::new(GroundStationPositionPartial);
                    partials.insert(*role, partial);
                }
            }
        }
        // Dynamical parameters only affect the link ends through the variational equations, which are not modeled here.
        Ok(partials)
    }

    fn state_partials_wrt_body_state(
        &self,
        link_ends: &LinkEnds,
        body: &str,
    ) -> Result<StatePartialMap, PartialError> {
        let mut partials = StatePartialMap::new();
        for (role, end) in link_ends.iter() {
            if end.body == body {
                let partial: Arc<dyn CartesianStatePartial> = Arc::new(BodyStatePartial);
                partials.insert(*role, partial);
            }
        }
        Ok(partials)
    }

    fn state_partials_wrt_body_rotational_state(
        &self,
        link_ends: &LinkEnds,
        body: &str,
    ) -> Result<StatePartialMap, PartialError> {
        let mut partials = StatePartialMap::new();
        for (role, end) in link_ends.iter().filter(|(_, end)| end.body == body) {
            // Body centers do not depend on the rotation of the body.
            if let Some(point) = &end.reference_point {
                match self.reference_point(body, point) {
                    Some(body_fixed_position_km) => {
                        let partial: Arc<dyn CartesianStatePartial> =
                            Arc::new(RotationalStatePartial {
                                body_fixed_position_km,
                            });
                        partials.insert(*role, partial);
                    }
                    None => warn!(
                        "{end} has no body fixed position: ignoring its dependency on the rotation of {body}"
                    ),
                }
            }
        }
        Ok(partials)
    }
}
