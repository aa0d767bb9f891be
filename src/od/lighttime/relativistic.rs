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

use super::{LightTimeCorrectionPartial, Perturber, SPEED_OF_LIGHT_KM_S};
use crate::linalg::{DMatrix, Vector3};
use crate::od::param::{EstimableParameter, ParameterKind};
use crate::od::{LinkEndType, LinkGeometry, PartialError};

/// Partial of the first order relativistic (Shapiro) light time correction:
///
/// Δt = Σ_k (1 + γ) μ_k / c³ ln((r_t + r_r + ρ) / (r_t + r_r − ρ))
///
/// where r_t and r_r are the distances from perturber k to the transmitter and receiver, and ρ the link distance.
/// The correction is linear in each μ_k and in γ, hence so are its partials.
#[derive(Clone, Debug, PartialEq)]
pub struct FirstOrderRelativisticPartial {
    perturbers: Vec<Perturber>,
    ppn_gamma: f64,
}

impl FirstOrderRelativisticPartial {
    pub fn new(perturbers: Vec<Perturber>, ppn_gamma: f64) -> Self {
        Self {
            perturbers,
            ppn_gamma,
        }
    }

    /// Logarithmic term of the delay caused by the provided perturber, in s^3/km^3 once divided by c^3.
    fn log_term(
        tx_km: &Vector3<f64>,
        rx_km: &Vector3<f64>,
        perturber_km: &Vector3<f64>,
    ) -> f64 {
        let r_t = (tx_km - perturber_km).norm();
        let r_r = (rx_km - perturber_km).norm();
        let rho = (rx_km - tx_km).norm();
        ((r_t + r_r + rho) / (r_t + r_r - rho)).ln() / SPEED_OF_LIGHT_KM_S.powi(3)
    }
}

impl LightTimeCorrectionPartial for FirstOrderRelativisticPartial {
    fn depends_on(&self, param: &EstimableParameter) -> bool {
        match param.kind() {
            ParameterKind::GravitationalParameter => {
                self.perturbers.iter().any(|p| p.name == param.body())
            }
            ParameterKind::PpnGamma => !self.perturbers.is_empty(),
            _ => false,
        }
    }

    fn wrt_parameter(
        &self,
        param: &EstimableParameter,
        geometry: &LinkGeometry,
    ) -> Result<DMatrix<f64>, PartialError> {
        let tx_km = geometry.state(LinkEndType::Transmitter)?.position_km;
        let rx_km = geometry.state(LinkEndType::Receiver)?.position_km;

        let mut partial = DMatrix::zeros(1, param.size);
        match param.kind() {
            ParameterKind::GravitationalParameter => {
                for perturber in self.perturbers.iter().filter(|p| p.name == param.body()) {
                    let pos_km = geometry.perturber(&perturber.name)?;
                    partial[(0, 0)] += (1.0 + self.ppn_gamma) * Self::log_term(&tx_km, &rx_km, pos_km);
                }
            }
            ParameterKind::PpnGamma => {
                for perturber in &self.perturbers {
                    let pos_km = geometry.perturber(&perturber.name)?;
                    partial[(0, 0)] += perturber.gm_km3_s2 * Self::log_term(&tx_km, &rx_km, pos_km);
                }
            }
            _ => {}
        }

        Ok(partial)
    }
}
