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

use snafu::prelude::Snafu;

/// Provides the link ends (roles and participants of a tracking geometry) and their evaluation time states.
pub mod link;
pub use link::{LinkEndId, LinkEndState, LinkEndType, LinkEnds, LinkGeometry};

/// Provides the observable types, the registry of their capabilities, and the observation model interface.
pub mod msr;

/// Provides the estimated parameters and the parameter catalog.
pub mod param;

/// Provides the light time corrections and their partials.
pub mod lighttime;

/// Provides the observation partials, their scaling, and the single and multi link builders.
pub mod partials;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::lighttime::*;
    pub use super::link::*;
    pub use super::msr::*;
    pub use super::param::*;
    pub use super::partials::*;
    pub use super::PartialError;

    pub use crate::time::{Epoch, TimeUnits, Unit};
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PartialError {
    #[snafu(display("observable type is not constant across links: expected {expected:?} but {link_ends} is {found:?}"))]
    InconsistentObservableType {
        expected: msr::ObservableType,
        found: msr::ObservableType,
        link_ends: LinkEnds,
    },
    #[snafu(display("{action}: observable type {observable:?} not recognized"))]
    UnrecognizedObservableType {
        observable: msr::ObservableType,
        action: &'static str,
    },
    #[snafu(display("no position partial scaling for {observable:?} of size {size}"))]
    UnsupportedObservableForSize {
        observable: msr::ObservableType,
        size: usize,
    },
    #[snafu(display("could not identify initial state parameter {kind:?} of {body}"))]
    UnrecognizedParameterKind {
        kind: param::ParameterKind,
        body: String,
    },
    #[snafu(display("parameter {id} is estimated more than once"))]
    DuplicateParameter { id: param::ParameterId },
    #[snafu(display("parameter {id} has size {found} but {expected} is required"))]
    InvalidParameterSize {
        id: param::ParameterId,
        expected: usize,
        found: usize,
    },
    #[snafu(display("parameter {id} is a link property but is not attached to any link"))]
    MissingLinkProperty { id: param::ParameterId },
    #[snafu(display("no state provided for the {role:?} link end"))]
    MissingLinkEndState { role: LinkEndType },
    #[snafu(display("no position provided for perturbing body {body}"))]
    MissingPerturber { body: String },
    #[snafu(display("observation of size {found} provided but {expected} is required"))]
    ObservationSizeMismatch { expected: usize, found: usize },
    #[snafu(display("scaling snapshot of {found:?} used to evaluate a partial of {expected:?}"))]
    ScalingMismatch {
        expected: msr::ObservableType,
        found: msr::ObservableType,
    },
}
