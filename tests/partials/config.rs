use std::env;
use std::path::PathBuf;

use crate::{dss34_to_lro, dss65_to_lro, station_provider};
use nyx::io::{ConfigError, ConfigRepr, PartialsConfig};
use nyx::od::prelude::*;
use rstest::*;

#[fixture]
fn data_dir() -> PathBuf {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or(".".to_string())).join("data")
}

#[rstest]
fn partials_from_yaml(data_dir: PathBuf) {
    let cfg = PartialsConfig::load(data_dir.join("lro_partials.yaml")).unwrap();
    assert!(cfg.use_bias_partials);
    assert_eq!(cfg.models.len(), 2);

    let catalog = cfg.catalog().unwrap();
    assert_eq!(catalog.initial_state_size(), 13);
    assert_eq!(catalog.parameter_vector_size(), 19);

    let provider = station_provider();
    let sets = MultiLinkPartialBuilder::builder()
        .catalog(&catalog)
        .provider(&provider)
        .use_bias_partials(cfg.use_bias_partials)
        .build()
        .build_from_models(&cfg.models_by_link())
        .unwrap();

    assert_eq!(
        sets[&dss65_to_lro()].keys(),
        vec![(0, 6), (6, 7), (13, 1), (14, 1), (15, 3), (18, 1)]
    );
    assert_eq!(sets[&dss34_to_lro()].keys(), vec![(0, 6), (6, 7)]);
}

#[rstest]
fn many_configs(data_dir: PathBuf) {
    let configs = PartialsConfig::load_many(data_dir.join("partials_many.yaml")).unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs[0].use_bias_partials);
    assert!(!configs[1].use_bias_partials);
    assert_eq!(configs[1].catalog().unwrap().parameter_vector_size(), 7);
}

#[rstest]
fn config_round_trip() {
    let cfg = PartialsConfig::builder()
        .parameters(vec![
            EstimableParameter::initial_state("LRO"),
            EstimableParameter::relative_bias(dss65_to_lro(), ObservableType::OneWayDoppler, 1),
        ])
        .models(vec![LinkObservationModel::new(
            ObservableType::OneWayDoppler,
            dss65_to_lro(),
        )])
        .build();

    let serialized = serde_yaml::to_string(&cfg).unwrap();
    let deserialized = PartialsConfig::loads(&serialized).unwrap();
    assert_eq!(cfg, deserialized);
}

#[rstest]
fn invalid_configs(data_dir: PathBuf) {
    assert!(matches!(
        PartialsConfig::load(data_dir.join("does_not_exist.yaml")),
        Err(ConfigError::ReadError { .. })
    ));

    assert!(matches!(
        PartialsConfig::loads("parameters: not a list"),
        Err(ConfigError::ParseError { .. })
    ));

    // Well formed but inconsistent: an initial state of size 3
    let cfg = PartialsConfig::loads("parameters:\n  - kind: InitialBodyState\n    body: LRO\n    size: 3\n")
        .unwrap();
    assert!(matches!(
        cfg.catalog(),
        Err(PartialError::InvalidParameterSize {
            expected: 6,
            found: 3,
            ..
        })
    ));
}
