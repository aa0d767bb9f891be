use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{dss34_to_lro, dss65_to_lro, shapiro, station_provider};
use nyx::od::prelude::*;
use rstest::*;

#[fixture]
fn catalog() -> ParameterCatalog {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    ParameterCatalog::new(vec![
        EstimableParameter::initial_state("LRO"),
        EstimableParameter::gravitational_parameter("Sun"),
        EstimableParameter::absolute_bias(dss34_to_lro(), ObservableType::OneWayRange, 1),
    ])
    .unwrap()
}

fn range_model(link_ends: LinkEnds, corrections: Vec<LightTimeCorrection>) -> Arc<dyn ObservationModel> {
    Arc::new(
        LinkObservationModel::new(ObservableType::OneWayRange, link_ends)
            .with_light_time(LightTimeCalculator::new(corrections)),
    )
}

#[rstest]
fn build_from_models(catalog: ParameterCatalog) {
    let provider = station_provider();
    let mut models = BTreeMap::new();
    models.insert(dss65_to_lro(), range_model(dss65_to_lro(), vec![shapiro()]));
    models.insert(dss34_to_lro(), range_model(dss34_to_lro(), vec![]));

    let sets = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .build()
        .build_from_models(&models)
        .unwrap();

    assert_eq!(sets.len(), 2);
    // Only DSS-65 carries the relativistic correction, and only DSS-34 has a bias.
    assert_eq!(sets[&dss65_to_lro()].keys(), vec![(0, 6), (6, 1)]);
    assert_eq!(sets[&dss34_to_lro()].keys(), vec![(0, 6), (7, 1)]);
}

#[rstest]
fn corrections_discovery() {
    let mut models = BTreeMap::new();
    models.insert(dss65_to_lro(), range_model(dss65_to_lro(), vec![shapiro()]));
    // A path without any correction
    models.insert(dss34_to_lro(), range_model(dss34_to_lro(), vec![]));

    let corrections = light_time_corrections_by_link(&models, ObservableRegistry::global()).unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[&dss65_to_lro()], vec![vec![shapiro()]]);
    assert!(!corrections.contains_key(&dss34_to_lro()));
}

#[rstest]
fn inconsistent_observables(catalog: ParameterCatalog) {
    let provider = station_provider();
    let mut models: BTreeMap<LinkEnds, Arc<dyn ObservationModel>> = BTreeMap::new();
    models.insert(dss34_to_lro(), range_model(dss34_to_lro(), vec![]));
    models.insert(
        dss65_to_lro(),
        Arc::new(LinkObservationModel::new(
            ObservableType::OneWayDoppler,
            dss65_to_lro(),
        )),
    );

    let err = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .build()
        .build_from_models(&models)
        .unwrap_err();
    assert_eq!(
        err,
        PartialError::InconsistentObservableType {
            expected: ObservableType::OneWayRange,
            found: ObservableType::OneWayDoppler,
            link_ends: dss65_to_lro()
        }
    );
}

#[rstest]
fn observables_without_light_time(catalog: ParameterCatalog) {
    let provider = station_provider();
    let lro = LinkEnds::observed(LinkEndId::body("LRO"));
    let mut models: BTreeMap<LinkEnds, Arc<dyn ObservationModel>> = BTreeMap::new();
    models.insert(
        lro.clone(),
        Arc::new(LinkObservationModel::new(ObservableType::Position, lro.clone())),
    );

    let builder = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .build();

    assert_eq!(
        builder.build_from_models(&models).unwrap_err(),
        PartialError::UnrecognizedObservableType {
            observable: ObservableType::Position,
            action: "extracting light time corrections"
        }
    );

    // Position observables may still be assembled when no correction is requested.
    let sets = builder
        .build(&[lro.clone()], ObservableType::Position, &BTreeMap::new())
        .unwrap();
    assert_eq!(sets[&lro].keys(), vec![(0, 6)]);
    assert_eq!(sets[&lro].scaling().observation_size(), 3);
}

#[rstest]
fn first_signal_path_is_used(catalog: ParameterCatalog) {
    let provider = station_provider();
    let builder = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .build();
    let troposphere = LightTimeCorrection::Tropospheric {
        station: "DSS-65".to_string(),
    };

    let mut corrections = LightTimeCorrectionsByLink::new();
    corrections.insert(
        dss65_to_lro(),
        vec![vec![troposphere.clone()], vec![shapiro()]],
    );
    let sets = builder
        .build(&[dss65_to_lro()], ObservableType::OneWayRange, &corrections)
        .unwrap();
    assert_eq!(sets[&dss65_to_lro()].keys(), vec![(0, 6)]);

    corrections.insert(dss65_to_lro(), vec![vec![shapiro()], vec![troposphere]]);
    let sets = builder
        .build(&[dss65_to_lro()], ObservableType::OneWayRange, &corrections)
        .unwrap();
    assert_eq!(sets[&dss65_to_lro()].keys(), vec![(0, 6), (6, 1)]);
}

#[rstest]
fn no_models(catalog: ParameterCatalog) {
    let provider = station_provider();
    let sets = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .build()
        .build_from_models(&BTreeMap::new())
        .unwrap();
    assert!(sets.is_empty());
}

#[rstest]
fn concurrent_assembly(catalog: ParameterCatalog) {
    let provider = station_provider();
    let links = [dss65_to_lro(), dss34_to_lro()];

    let keys = std::thread::scope(|scope| {
        let handles = links
            .iter()
            .map(|link| {
                let catalog = &catalog;
                let provider = &provider;
                scope.spawn(move || {
                    SingleLinkPartialBuilder::builder()
                        .catalog(catalog)
                        .provider(provider)
                        .build()
                        .build(link, ObservableType::OneWayRange, &[shapiro()])
                        .unwrap()
                        .keys()
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(keys[0], vec![(0, 6), (6, 1)]);
    assert_eq!(keys[1], vec![(0, 6), (6, 1), (7, 1)]);
}
