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

use snafu::ensure;
use std::collections::{BTreeMap, HashSet};

use super::{EstimableParameter, ParameterCategory};
use crate::od::{
    DuplicateParameterSnafu, InvalidParameterSizeSnafu, MissingLinkPropertySnafu, PartialError,
};

/// Ordered catalog of the estimated parameters.
///
/// The estimated parameter vector is laid out as follows:
/// 1. the initial state parameters, in catalog order, starting at index zero;
/// 2. the scalar parameters, each with its own index;
/// 3. the vector parameters, each index advancing by the size of the previous vector parameter.
///
/// The indices are assigned once at construction and are stable for the lifetime of the catalog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterCatalog {
    initial_states: Vec<EstimableParameter>,
    doubles: BTreeMap<usize, EstimableParameter>,
    vectors: BTreeMap<usize, EstimableParameter>,
    initial_state_size: usize,
    size: usize,
}

impl ParameterCatalog {
    /// Builds a catalog from the provided parameters, keeping their order within each category.
    pub fn new(parameters: Vec<EstimableParameter>) -> Result<Self, PartialError> {
        let mut seen = HashSet::with_capacity(parameters.len());
        let mut initial_states = Vec::new();
        let mut doubles = Vec::new();
        let mut vectors = Vec::new();

        for param in parameters {
            ensure!(
                seen.insert(param.id.clone()),
                DuplicateParameterSnafu {
                    id: param.id.clone()
                }
            );

            let kind = param.kind();
            match kind.expected_size() {
                Some(expected) => ensure!(
                    param.size == expected,
                    InvalidParameterSizeSnafu {
                        id: param.id.clone(),
                        expected,
                        found: param.size
                    }
                ),
                None => ensure!(
                    param.size > 0,
                    InvalidParameterSizeSnafu {
                        id: param.id.clone(),
                        expected: 1_usize,
                        found: param.size
                    }
                ),
            }

            if kind.is_link_property() {
                ensure!(
                    param.id.link.is_some(),
                    MissingLinkPropertySnafu {
                        id: param.id.clone()
                    }
                );
            }

            match kind.category() {
                ParameterCategory::InitialState => initial_states.push(param),
                ParameterCategory::Double => doubles.push(param),
                ParameterCategory::Vector => vectors.push(param),
            }
        }

        let initial_state_size = initial_states.iter().map(|param| param.size).sum();

        let mut index = initial_state_size;
        let mut double_map = BTreeMap::new();
        for param in doubles {
            double_map.insert(index, param);
            index += 1;
        }

        let mut vector_map = BTreeMap::new();
        for param in vectors {
            let size = param.size;
            vector_map.insert(index, param);
            index += size;
        }

        debug!(
            "catalog of {} initial state, {} scalar and {} vector parameters ({index} estimated values)",
            initial_states.len(),
            double_map.len(),
            vector_map.len()
        );

        Ok(Self {
            initial_states,
            doubles: double_map,
            vectors: vector_map,
            initial_state_size,
            size: index,
        })
    }

    /// Initial state parameters, in catalog order.
    pub fn initial_state_parameters(&self) -> &[EstimableParameter] {
        &self.initial_states
    }

    /// Scalar parameters, keyed by their index in the estimated parameter vector.
    pub fn double_parameters(&self) -> &BTreeMap<usize, EstimableParameter> {
        &self.doubles
    }

    /// Vector parameters, keyed by the index of their first element in the estimated parameter vector.
    pub fn vector_parameters(&self) -> &BTreeMap<usize, EstimableParameter> {
        &self.vectors
    }

    /// Length of the initial state part of the estimated parameter vector.
    pub fn initial_state_size(&self) -> usize {
        self.initial_state_size
    }

    /// Length of the full estimated parameter vector.
    pub fn parameter_vector_size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.initial_states.len() + self.doubles.len() + self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
