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

/*! # nyx-partials

Observation partial assembly for orbit determination.

For a given tracking geometry (the link ends) and observable type, this crate discovers which of the estimated
parameters the observation depends on, builds one partial derivative object per dependency, and packs them into a
sparse map keyed by the `(index, size)` coordinate of each parameter in the full estimated parameter vector.
The resulting sets are consumed by a batch or sequential least squares estimator to fill the rows of its Jacobian.
*/

/// All the input/output needs for this library, i.e. the loading of the partials configuration.
pub mod io;

/// All the orbit determination tools: link ends, observables, estimated parameters, light time corrections and partials.
pub mod od;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::geometry::*;
}

/// Re-export some useful things
pub use self::od::PartialError;
