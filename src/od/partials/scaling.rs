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

use crate::linalg::{DMatrix, DVector, Matrix3, RowVector3, Vector3};
use crate::od::lighttime::SPEED_OF_LIGHT_KM_S;
use crate::od::msr::{ObservableRegistry, ObservableType};
use crate::od::{
    LinkEndType, LinkEnds, LinkGeometry, PartialError, UnrecognizedObservableTypeSnafu,
    UnsupportedObservableForSizeSnafu,
};
use crate::time::Epoch;
use snafu::ensure;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Converts the partials of the link end states into partials of the observable.
///
/// A scaling is shared by all the observation partials of a link. It holds no geometry itself: at each evaluation
/// epoch, the caller computes one [`ScalingSnapshot`] from the current link geometry and evaluates every partial
/// of the link against that same snapshot.
pub trait PositionPartialScaling: Send + Sync + fmt::Debug {
    fn observable_type(&self) -> ObservableType;

    fn observation_size(&self) -> usize;

    /// Computes the scaling for the provided link geometry.
    fn snapshot(&self, geometry: &LinkGeometry) -> Result<ScalingSnapshot, PartialError>;
}

/// Scaling of one link at one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalingSnapshot {
    observable: ObservableType,
    epoch: Epoch,
    /// Partial of the observable with respect to the Cartesian state of each link end (observation size x 6)
    wrt_link_end: BTreeMap<LinkEndType, DMatrix<f64>>,
    /// Partial of the observable with respect to the light time, in observable unit per second
    light_time_factor: DVector<f64>,
}

impl ScalingSnapshot {
    pub fn observable(&self) -> ObservableType {
        self.observable
    }

    /// Epoch at which the observable is referenced (the reception epoch for links).
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn observation_size(&self) -> usize {
        self.light_time_factor.len()
    }

    /// Partial of the observable with respect to the state of the provided link end, if that link end takes part in the observable.
    pub fn wrt_link_end(&self, role: LinkEndType) -> Option<&DMatrix<f64>> {
        self.wrt_link_end.get(&role)
    }

    pub fn light_time_factor(&self) -> &DVector<f64> {
        &self.light_time_factor
    }
}

/// Builds the rows of a transmitter and a receiver with opposite sign, and zero velocity partials.
fn position_rows(wrt_receiver_position: &DMatrix<f64>) -> BTreeMap<LinkEndType, DMatrix<f64>> {
    let rows = wrt_receiver_position.nrows();
    let mut wrt_rx = DMatrix::zeros(rows, 6);
    wrt_rx.view_mut((0, 0), (rows, 3)).copy_from(wrt_receiver_position);

    let mut map = BTreeMap::new();
    map.insert(LinkEndType::Transmitter, -&wrt_rx);
    map.insert(LinkEndType::Receiver, wrt_rx);
    map
}

/// Scaling of the one way range: the line of sight, corrected for the motion of the transmitter during the light time.
#[derive(Copy, Clone, Debug, Default)]
pub struct RangeScaling;

impl PositionPartialScaling for RangeScaling {
    fn observable_type(&self) -> ObservableType {
        ObservableType::OneWayRange
    }

    fn observation_size(&self) -> usize {
        1
    }

    fn snapshot(&self, geometry: &LinkGeometry) -> Result<ScalingSnapshot, PartialError> {
        let tx = geometry.state(LinkEndType::Transmitter)?;
        let rx = geometry.state(LinkEndType::Receiver)?;

        let rho_vec = rx.position_km - tx.position_km;
        let los = rho_vec / rho_vec.norm();
        let light_time_scaling = 1.0 / (1.0 - los.dot(&tx.velocity_km_s) / SPEED_OF_LIGHT_KM_S);

        let wrt_rx_pos = DMatrix::from_row_slice(1, 3, (los * light_time_scaling).as_slice());

        Ok(ScalingSnapshot {
            observable: self.observable_type(),
            epoch: rx.epoch,
            wrt_link_end: position_rows(&wrt_rx_pos),
            light_time_factor: DVector::from_element(1, SPEED_OF_LIGHT_KM_S * light_time_scaling),
        })
    }
}

/// Scaling of the one way instantaneous Doppler, modeled as the range rate between the link ends.
#[derive(Copy, Clone, Debug, Default)]
pub struct DopplerScaling;

impl PositionPartialScaling for DopplerScaling {
    fn observable_type(&self) -> ObservableType {
        ObservableType::OneWayDoppler
    }

    fn observation_size(&self) -> usize {
        1
    }

    fn snapshot(&self, geometry: &LinkGeometry) -> Result<ScalingSnapshot, PartialError> {
        let tx = geometry.state(LinkEndType::Transmitter)?;
        let rx = geometry.state(LinkEndType::Receiver)?;

        let delta_r = rx.position_km - tx.position_km;
        let delta_v = rx.velocity_km_s - tx.velocity_km_s;
        let ρ_km = delta_r.norm();
        let los = delta_r / ρ_km;
        let ρ_dot_km_s = los.dot(&delta_v);

        // Partial of the range rate with respect to the receiver position
        let wrt_pos = (delta_v - los * ρ_dot_km_s) / ρ_km;

        let wrt_rx = DMatrix::from_row_slice(
            1,
            6,
            &[wrt_pos.x, wrt_pos.y, wrt_pos.z, los.x, los.y, los.z],
        );

        let mut wrt_link_end = BTreeMap::new();
        wrt_link_end.insert(LinkEndType::Transmitter, -&wrt_rx);
        wrt_link_end.insert(LinkEndType::Receiver, wrt_rx);

        // A longer light time moves the transmitter back along its velocity.
        let light_time_factor = DVector::from_element(1, wrt_pos.dot(&tx.velocity_km_s));

        Ok(ScalingSnapshot {
            observable: self.observable_type(),
            epoch: rx.epoch,
            wrt_link_end,
            light_time_factor,
        })
    }
}

/// Scaling of the angular position (right ascension, declination) of the transmitter as seen from the receiver.
#[derive(Copy, Clone, Debug, Default)]
pub struct AngularPositionScaling;

impl PositionPartialScaling for AngularPositionScaling {
    fn observable_type(&self) -> ObservableType {
        ObservableType::AngularPosition
    }

    fn observation_size(&self) -> usize {
        2
    }

    fn snapshot(&self, geometry: &LinkGeometry) -> Result<ScalingSnapshot, PartialError> {
        let tx = geometry.state(LinkEndType::Transmitter)?;
        let rx = geometry.state(LinkEndType::Receiver)?;

        let r: Vector3<f64> = tx.position_km - rx.position_km;
        let rho_xy_sq = r.x.powi(2) + r.y.powi(2);
        let rho_xy = rho_xy_sq.sqrt();
        let rho_sq = r.norm_squared();

        let wrt_ra = RowVector3::new(-r.y, r.x, 0.0) / rho_xy_sq;
        let wrt_dec =
            RowVector3::new(-r.x * r.z, -r.y * r.z, rho_xy_sq) / (rho_sq * rho_xy);

        // The relative position is that of the transmitter, so the receiver rows carry the opposite sign.
        let wrt_rx_pos = DMatrix::from_row_slice(
            2,
            3,
            &[
                -wrt_ra[0], -wrt_ra[1], -wrt_ra[2], -wrt_dec[0], -wrt_dec[1], -wrt_dec[2],
            ],
        );

        let light_time_factor = DVector::from_column_slice(&[
            -wrt_ra.dot(&tx.velocity_km_s.transpose()),
            -wrt_dec.dot(&tx.velocity_km_s.transpose()),
        ]);

        Ok(ScalingSnapshot {
            observable: self.observable_type(),
            epoch: rx.epoch,
            wrt_link_end: position_rows(&wrt_rx_pos),
            light_time_factor,
        })
    }
}

/// Scaling of a direct observation of the position of a body.
#[derive(Copy, Clone, Debug, Default)]
pub struct PositionObservableScaling;

impl PositionPartialScaling for PositionObservableScaling {
    fn observable_type(&self) -> ObservableType {
        ObservableType::Position
    }

    fn observation_size(&self) -> usize {
        3
    }

    fn snapshot(&self, geometry: &LinkGeometry) -> Result<ScalingSnapshot, PartialError> {
        let observed = geometry.state(LinkEndType::ObservedBody)?;

        let mut wrt_observed = DMatrix::zeros(3, 6);
        wrt_observed
            .view_mut((0, 0), (3, 3))
            .copy_from(&Matrix3::<f64>::identity());

        let mut wrt_link_end = BTreeMap::new();
        wrt_link_end.insert(LinkEndType::ObservedBody, wrt_observed);

        Ok(ScalingSnapshot {
            observable: self.observable_type(),
            epoch: observed.epoch,
            wrt_link_end,
            light_time_factor: DVector::zeros(3),
        })
    }
}

/// Creates the position partial scaling of the provided observable, dispatched on the observable size and type.
pub fn create_position_scaling(
    registry: &ObservableRegistry,
    link_ends: &LinkEnds,
    observable: ObservableType,
) -> Result<Arc<dyn PositionPartialScaling>, PartialError> {
    let capabilities = registry
        .get(observable)
        .ok_or_else(|| {
            UnrecognizedObservableTypeSnafu {
                observable,
                action: "creating position partial scaling",
            }
            .build()
        })?;

    let factory = capabilities.scaling.ok_or_else(|| {
        UnsupportedObservableForSizeSnafu {
            observable,
            size: capabilities.size,
        }
        .build()
    })?;

    let scaling = factory(link_ends);

    ensure!(
        scaling.observable_type() == observable && scaling.observation_size() == capabilities.size,
        UnsupportedObservableForSizeSnafu {
            observable,
            size: capabilities.size
        }
    );

    trace!(
        "{observable} scaling of size {} (in {}) created for {link_ends}",
        capabilities.size,
        observable.unit()
    );

    Ok(scaling)
}
