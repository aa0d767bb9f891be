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

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Kind of tracking observable. The size of each kind and how its partials are scaled is defined in the [`super::ObservableRegistry`].
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObservableType {
    /// One way range, in km
    #[serde(rename = "one_way_range")]
    OneWayRange,
    /// One way instantaneous Doppler, expressed as a range rate in km/s
    #[serde(rename = "one_way_doppler")]
    OneWayDoppler,
    /// Right ascension and declination of the transmitter as seen from the receiver, in radians
    #[serde(rename = "angular_position")]
    AngularPosition,
    /// Direct observation of the Cartesian position of a body, in km
    #[serde(rename = "position")]
    Position,
    /// Any other observable, registered at runtime
    #[serde(rename = "custom")]
    Custom(u8),
}

impl ObservableType {
    /// Returns the expected unit of each component of this observable type
    pub fn unit(self) -> &'static str {
        match self {
            Self::OneWayRange | Self::Position => "km",
            Self::OneWayDoppler => "km/s",
            Self::AngularPosition => "rad",
            Self::Custom(_) => "",
        }
    }
}

impl fmt::Display for ObservableType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OneWayRange => write!(f, "one way range"),
            Self::OneWayDoppler => write!(f, "one way Doppler"),
            Self::AngularPosition => write!(f, "angular position"),
            Self::Position => write!(f, "position"),
            Self::Custom(id) => write!(f, "custom observable #{id}"),
        }
    }
}
