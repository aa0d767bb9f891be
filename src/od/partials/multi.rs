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

use std::collections::BTreeMap;
use std::sync::Arc;

use snafu::ensure;
use typed_builder::TypedBuilder;

use super::builder::{SingleLinkPartialBuilder, SingleLinkPartialSet};
use super::state::StatePartialProvider;
use crate::od::lighttime::LightTimeCorrection;
use crate::od::msr::{ObservableRegistry, ObservableType, ObservationModel};
use crate::od::param::ParameterCatalog;
use crate::od::{InconsistentObservableTypeSnafu, LinkEnds, PartialError};

/// Light time corrections of each signal path, for each link.
pub type LightTimeCorrectionsByLink = BTreeMap<LinkEnds, Vec<Vec<LightTimeCorrection>>>;

/// Extracts the light time corrections of observation models which all share the same observable type.
///
/// Signal paths without corrections are omitted, and so are links without any correction.
pub fn light_time_corrections_by_link(
    models: &BTreeMap<LinkEnds, Arc<dyn ObservationModel>>,
    registry: &ObservableRegistry,
) -> Result<LightTimeCorrectionsByLink, PartialError> {
    let mut corrections = LightTimeCorrectionsByLink::new();
    let mut expected: Option<ObservableType> = None;

    for (link_ends, model) in models {
        let found = model.observable_type();
        let expected = *expected.get_or_insert(found);
        ensure!(
            found == expected,
            InconsistentObservableTypeSnafu {
                expected,
                found,
                link_ends: link_ends.clone()
            }
        );

        let paths = registry
            .light_time_corrections(model.as_ref())?
            .into_iter()
            .filter(|path| !path.is_empty())
            .collect::<Vec<_>>();

        if !paths.is_empty() {
            corrections.insert(link_ends.clone(), paths);
        }
    }

    Ok(corrections)
}

/// Assembles the observation partials of several links sharing the same observable type.
#[derive(TypedBuilder)]
#[builder(doc)]
pub struct MultiLinkPartialBuilder<'a> {
    catalog: &'a ParameterCatalog,
    provider: &'a dyn StatePartialProvider,
    #[builder(default = ObservableRegistry::global())]
    registry: &'a ObservableRegistry,
    /// Set to false to never build the partials with respect to the observation biases
    #[builder(default = true)]
    use_bias_partials: bool,
}

impl<'a> MultiLinkPartialBuilder<'a> {
    /// Builds the partials of each link. Only the first signal path of each link is used for its light time corrections.
    pub fn build(
        &self,
        links: &[LinkEnds],
        observable: ObservableType,
        corrections: &LightTimeCorrectionsByLink,
    ) -> Result<BTreeMap<LinkEnds, SingleLinkPartialSet>, PartialError> {
        let single = SingleLinkPartialBuilder::builder()
            .catalog(self.catalog)
            .provider(self.provider)
            .registry(self.registry)
            .use_bias_partials(self.use_bias_partials)
            .build();

        let mut sets = BTreeMap::new();
        for link_ends in links {
            let paths = corrections
                .get(link_ends)
                .map(|paths| paths.as_slice())
                .unwrap_or_default();
            if paths.len() > 1 {
                warn!(
                    "{} signal paths found for {observable} on {link_ends}: only the light time corrections of the first are used",
                    paths.len()
                );
            }
            let path = paths.first().map(|path| path.as_slice()).unwrap_or_default();

            sets.insert(link_ends.clone(), single.build(link_ends, observable, path)?);
        }

        info!("built the {observable} partials of {} links", sets.len());

        Ok(sets)
    }

    /// Builds the partials of each observation model. All models must share the same observable type.
    pub fn build_from_models(
        &self,
        models: &BTreeMap<LinkEnds, Arc<dyn ObservationModel>>,
    ) -> Result<BTreeMap<LinkEnds, SingleLinkPartialSet>, PartialError> {
        let observable = match models.values().next() {
            Some(model) => model.observable_type(),
            None => {
                debug!("no observation model provided, no partials built");
                return Ok(BTreeMap::new());
            }
        };

        let links = models.keys().cloned().collect::<Vec<_>>();
        let corrections = light_time_corrections_by_link(models, self.registry)?;

        self.build(&links, observable, &corrections)
    }
}
