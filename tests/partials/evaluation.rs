use crate::{dss65_to_lro, shapiro, simple_geometry, station_provider};
use approx::assert_relative_eq;
use nyx::linalg::{DMatrix, DVector, UnitQuaternion, Vector3};
use nyx::od::lighttime::SPEED_OF_LIGHT_KM_S;
use nyx::od::prelude::*;
use rstest::*;

#[fixture]
fn link() -> LinkEnds {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    dss65_to_lro()
}

fn assemble(
    catalog: &ParameterCatalog,
    link: &LinkEnds,
    observable: ObservableType,
    corrections: &[LightTimeCorrection],
) -> SingleLinkPartialSet {
    let provider = station_provider();
    SingleLinkPartialBuilder::builder()
        .catalog(catalog)
        .provider(&provider)
        .build()
        .build(link, observable, corrections)
        .unwrap()
}

#[rstest]
fn range_wrt_receiver_is_line_of_sight(link: LinkEnds) {
    let catalog = ParameterCatalog::new(vec![EstimableParameter::initial_state("LRO")]).unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayRange, &[]);

    let geometry = simple_geometry();
    let snapshot = set.scaling().snapshot(&geometry).unwrap();
    assert_eq!(snapshot.epoch(), geometry.states[&LinkEndType::Receiver].epoch);

    let partial = set.get(0, 6).unwrap().evaluate(&snapshot, &geometry).unwrap();
    // The station does not move, so the light time scaling is unity.
    let expected = DMatrix::from_row_slice(1, 6, &[0.0, 0.6, 0.8, 0.0, 0.0, 0.0]);
    assert_relative_eq!(partial, expected, epsilon = 1e-12);
}

#[rstest]
fn doppler_wrt_receiver(link: LinkEnds) {
    let catalog = ParameterCatalog::new(vec![EstimableParameter::initial_state("LRO")]).unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayDoppler, &[]);

    let geometry = simple_geometry();
    let snapshot = set.scaling().snapshot(&geometry).unwrap();
    let partial = set.get(0, 6).unwrap().evaluate(&snapshot, &geometry).unwrap();

    // LRO moves perpendicular to the line of sight: the range rate is zero.
    let expected = DMatrix::from_row_slice(1, 6, &[1.6 / 5000.0, 0.0, 0.0, 0.0, 0.6, 0.8]);
    assert_relative_eq!(partial, expected, epsilon = 1e-12);
}

#[rstest]
fn station_position_moves_transmitter(link: LinkEnds) {
    let catalog = ParameterCatalog::new(vec![EstimableParameter::ground_station_position(
        "Earth", "DSS-65",
    )])
    .unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayRange, &[]);

    let geometry = simple_geometry();
    let snapshot = set.scaling().snapshot(&geometry).unwrap();
    let partial = set.get(0, 3).unwrap().evaluate(&snapshot, &geometry).unwrap();
    assert_relative_eq!(
        partial,
        DMatrix::from_row_slice(1, 3, &[0.0, -0.6, -0.8]),
        epsilon = 1e-12
    );
}

#[rstest]
fn earth_rotation_finite_difference(link: LinkEnds) {
    let dss65_km = Vector3::new(4849.092, -360.180, 4115.109);
    let lro_km = Vector3::new(-250_000.0, 280_000.0, 120_000.0);
    let omega = Vector3::new(0.0, 0.0, 7.292_115e-5);
    let orientation = UnitQuaternion::from_euler_angles(0.1, 0.2, -0.4);

    let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
    let geometry = LinkGeometry::new([
        (
            LinkEndType::Transmitter,
            LinkEndState::new(epoch, orientation * dss65_km, Vector3::zeros())
                .with_orientation(orientation, omega),
        ),
        (
            LinkEndType::Receiver,
            LinkEndState::new(epoch + 1.3 * Unit::Second, lro_km, Vector3::zeros()),
        ),
    ]);

    let catalog =
        ParameterCatalog::new(vec![EstimableParameter::initial_rotational_state("Earth")])
            .unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayRange, &[]);
    let snapshot = set.scaling().snapshot(&geometry).unwrap();
    let partial = set.get(0, 7).unwrap().evaluate(&snapshot, &geometry).unwrap();

    let range = |q: [f64; 4]| {
        let v = Vector3::new(q[1], q[2], q[3]);
        let station = (q[0] * q[0] - v.dot(&v)) * dss65_km
            + 2.0 * v.dot(&dss65_km) * v
            + 2.0 * q[0] * v.cross(&dss65_km);
        (lro_km - station).norm()
    };

    let q = orientation.quaternion();
    let nominal = [q.w, q.i, q.j, q.k];
    let h = 1e-6;
    for col in 0..4 {
        let mut plus = nominal;
        let mut minus = nominal;
        plus[col] += h;
        minus[col] -= h;
        assert_relative_eq!(
            partial[(0, col)],
            (range(plus) - range(minus)) / (2.0 * h),
            epsilon = 1e-3
        );
    }
    // The range does not depend on the angular velocity
    for col in 4..7 {
        assert_eq!(partial[(0, col)], 0.0);
    }
}

#[rstest]
fn jacobian_layout(link: LinkEnds) {
    let catalog = ParameterCatalog::new(vec![
        EstimableParameter::initial_state("LRO"),
        EstimableParameter::gravitational_parameter("Sun"),
        EstimableParameter::ppn_gamma(),
        EstimableParameter::absolute_bias(link.clone(), ObservableType::OneWayRange, 1),
        EstimableParameter::relative_bias(link.clone(), ObservableType::OneWayRange, 1),
    ])
    .unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayRange, &[shapiro()]);
    assert_eq!(set.keys(), vec![(0, 6), (6, 1), (7, 1), (8, 1), (9, 1)]);

    let geometry = simple_geometry();
    let jacobian = set
        .jacobian(&geometry, catalog.parameter_vector_size())
        .unwrap();
    assert_eq!(jacobian.shape(), (1, 10));

    assert_relative_eq!(jacobian[(0, 1)], 0.6, epsilon = 1e-12);
    assert_relative_eq!(jacobian[(0, 2)], 0.8, epsilon = 1e-12);
    assert_eq!(jacobian[(0, 3)], 0.0);

    let sun_km = geometry.perturbers["Sun"];
    let tx_km = geometry.states[&LinkEndType::Transmitter].position_km;
    let rx_km = geometry.states[&LinkEndType::Receiver].position_km;
    let r_t = (tx_km - sun_km).norm();
    let r_r = (rx_km - sun_km).norm();
    let log_term = ((r_t + r_r + 5000.0) / (r_t + r_r - 5000.0)).ln();
    let c = SPEED_OF_LIGHT_KM_S;

    // Range partials of the light time are scaled by the speed of light
    assert_relative_eq!(jacobian[(0, 6)], 2.0 * log_term / c.powi(2), max_relative = 1e-9);
    assert_relative_eq!(
        jacobian[(0, 7)],
        crate::sun().gm_km3_s2 * log_term / c.powi(2),
        max_relative = 1e-9
    );
    assert!(jacobian[(0, 6)] > 0.0);
    assert_eq!(jacobian[(0, 8)], 1.0);
    assert_eq!(jacobian[(0, 9)], 5000.0);

    // A parameter vector too short for the catalog is rejected
    assert!(matches!(
        set.jacobian(&geometry, 8),
        Err(PartialError::InvalidParameterSize { .. })
    ));
}

#[rstest]
fn position_observable() {
    let lro = LinkEnds::observed(LinkEndId::body("LRO"));
    let catalog = ParameterCatalog::new(vec![
        EstimableParameter::initial_state("Moon"),
        EstimableParameter::initial_state("LRO"),
    ])
    .unwrap();
    let set = assemble(&catalog, &lro, ObservableType::Position, &[]);
    assert_eq!(set.keys(), vec![(6, 6)]);

    let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
    let geometry = LinkGeometry::new([(
        LinkEndType::ObservedBody,
        LinkEndState::new(epoch, Vector3::new(1738.0, 50.0, 0.0), Vector3::new(0.0, 1.6, 0.0)),
    )]);
    let jacobian = set.jacobian(&geometry, 12).unwrap();

    let mut expected = DMatrix::<f64>::zeros(3, 12);
    expected.view_mut((0, 6), (3, 3)).fill_with_identity();
    assert_eq!(jacobian, expected);
}

#[rstest]
fn snapshots_are_independent(link: LinkEnds) {
    let catalog = ParameterCatalog::new(vec![
        EstimableParameter::initial_state("LRO"),
        EstimableParameter::relative_bias(link.clone(), ObservableType::OneWayRange, 1),
    ])
    .unwrap();
    let set = assemble(&catalog, &link, ObservableType::OneWayRange, &[]);

    let first = simple_geometry();
    let mut second = simple_geometry();
    second
        .states
        .get_mut(&LinkEndType::Receiver)
        .unwrap()
        .position_km = Vector3::new(0.0, 0.0, 7000.0);
    second.observation = DVector::from_element(1, 7000.0);

    let (j1, j2) = std::thread::scope(|scope| {
        let h1 = scope.spawn(|| set.jacobian(&first, 7).unwrap());
        let h2 = scope.spawn(|| set.jacobian(&second, 7).unwrap());
        (h1.join().unwrap(), h2.join().unwrap())
    });

    assert_relative_eq!(j1[(0, 2)], 0.8, epsilon = 1e-12);
    assert_relative_eq!(j2[(0, 2)], 1.0, epsilon = 1e-12);
    assert_eq!(j1[(0, 6)], 5000.0);
    assert_eq!(j2[(0, 6)], 7000.0);

    // Missing link end states are reported
    let err = set.jacobian(&LinkGeometry::default(), 7).unwrap_err();
    assert_eq!(
        err,
        PartialError::MissingLinkEndState {
            role: LinkEndType::Transmitter
        }
    );
}
