extern crate arclight;

mod common;

use arclight::prelude::*;
use arclight::linalg::Vector3;
use common::{CircularTarget, InertialFrames, StaticScene};
use std::sync::Arc;

const TERRA_RADIUS_KM: f64 = 6378.0;
const ORBIT_RADIUS_KM: f64 = 7000.0;
const PERIOD_S: f64 = 6000.0;

fn epoch0() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
}

/// A polar orbit passing directly over a station at the north pole of a non
/// rotating body: visibility holds while `cos(theta) > R/r`, so the window
/// half width is `acos(R/r) / omega` exactly.
fn scene() -> (Arc<CircularTarget>, Arc<StaticScene>, Arc<InertialFrames>) {
    let target = Arc::new(CircularTarget {
        name: "LEOSat".to_string(),
        epoch0: epoch0(),
        span: 2.0 * PERIOD_S * Unit::Second,
        radius_km: ORBIT_RADIUS_KM,
        period_s: PERIOD_S,
        u: Vector3::new(0.0, 0.0, 1.0),
        v: Vector3::new(1.0, 0.0, 0.0),
    });
    let scene = Arc::new(
        StaticScene::default()
            .with_body("Terra", Vector3::zeros(), TERRA_RADIUS_KM)
            // A far away third body which never blocks the path
            .with_body("Luna", Vector3::new(0.0, 1.0e6, 0.0), 1737.4),
    );
    (target, scene, Arc::new(InertialFrames))
}

fn pole_station() -> GroundStation {
    GroundStation::from_point("Pole".to_string(), 90.0, 0.0, 0.0, "Terra".to_string())
}

#[test]
fn polar_pass_windows() {
    let _ = pretty_env_logger::try_init();
    let (target, scene, frames) = scene();
    let omega = target.omega();

    let dir = std::env::temp_dir().join("arclight_contact_windows");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let report = dir.join("contacts.txt");

    let cfg = SearchConfig::builder()
        .step(1 * Unit::Minute)
        .precision(1 * Unit::Millisecond)
        .filename(report.clone())
        .build();
    let mut locator = ContactLocator::new(target.clone(), scene, frames, cfg);
    locator.add_station(pole_station());
    locator.add_occulter("Luna");
    locator.initialize().unwrap();

    let mut table = LocatedEventTable::new();
    locator.locate_events(&mut table).unwrap();

    let results = locator.results();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.station, "Pole");
    assert_eq!(result.target, "LEOSat");

    // The pass is centered on theta = 0 mod 2*pi, and the search window
    // opens with the target overhead: [0, t*], [T - t*, T + t*], [2T - t*, 2T]
    let t_star = (TERRA_RADIUS_KM / ORBIT_RADIUS_KM).acos() / omega;
    assert_eq!(result.len(), 3);

    let t0 = epoch0();
    let tol_s = 0.05;

    let first = result.get(0).unwrap();
    assert_eq!(first.start(), t0, "window edge must bound the first pass");
    assert!(((first.end() - t0).to_seconds() - t_star).abs() < tol_s);

    let second = result.get(1).unwrap();
    assert!(((second.start() - t0).to_seconds() - (PERIOD_S - t_star)).abs() < tol_s);
    assert!(((second.end() - t0).to_seconds() - (PERIOD_S + t_star)).abs() < tol_s);

    let third = result.get(2).unwrap();
    assert!(((third.start() - t0).to_seconds() - (2.0 * PERIOD_S - t_star)).abs() < tol_s);
    assert_eq!(
        third.end(),
        t0 + 2.0 * PERIOD_S * Unit::Second,
        "window edge must bound the last pass"
    );

    // Interior passes must be symmetric about the overhead epoch
    let mid = (second.start() - t0).to_seconds() + second.duration().to_seconds() / 2.0;
    assert!((mid - PERIOD_S).abs() < tol_s);

    // Each pass contributes an entry and an exit boundary to the run table
    assert_eq!(table.len(), 6);

    // The report was written and survives a rotation on the next run
    assert!(locator.file_was_written());
    let text = std::fs::read_to_string(&report).unwrap();
    assert!(text.contains("Observer: Pole"));
    assert!(text.contains("Number of events : 3"));

    locator.initialize().unwrap();
    let mut table = LocatedEventTable::new();
    locator.locate_events(&mut table).unwrap();
    assert!(dir.join("contacts__1.txt").exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

/// Sizing property of the composite: one elevation and k line of sight
/// members yield 3*(k+1) buffered reals, elevation first.
#[test]
fn contact_composite_sizing() {
    let (target, scene, frames) = scene();
    let station = pole_station();

    let mut contact = Contact::new(target.clone());
    contact.set_member(ContactMember::Elevation(Elevation::new(
        target.clone(),
        station.clone(),
        scene.clone(),
        frames.clone(),
    )));
    for _ in 0..2 {
        contact.set_member(ContactMember::LineOfSight(LineOfSight::new(
            target.clone(),
            station.clone(),
            "Luna",
            Aberration::NONE,
            scene.clone(),
            frames.clone(),
        )));
    }
    contact.initialize().unwrap();

    assert_eq!(contact.function_count(), 3);
    assert_eq!(contact.buffer_len(), 9);

    let epoch = epoch0() + 100 * Unit::Second;
    let state = target.state_km(epoch).unwrap();
    let samples = contact.evaluate_all(epoch, &state).unwrap();
    assert_eq!(samples.len(), 3);

    // Slot 0 carries the elevation sample
    let mut elevation = Elevation::new(target.clone(), station, scene, frames);
    elevation.initialize().unwrap();
    assert_eq!(samples[0], elevation.evaluate(epoch, &state).unwrap());
    // Both line of sight members see the same clear path
    assert_eq!(samples[1], samples[2]);
    assert!(samples[1].value > 0.0, "Luna never blocks this pass");

    assert!(contact.has_member("LEOSat-Pole"));
    assert!(contact.has_member("LEOSat-Pole-Luna"));
    assert!(!contact.has_member("LEOSat-Elsewhere"));

    contact.clear_members();
    assert!(!contact.has_member("LEOSat-Pole"));
    assert!(matches!(
        contact.initialize(),
        Err(EventError::MissingReference { .. })
    ));
}

#[test]
fn evaluate_before_initialize_fails() {
    let (target, scene, frames) = scene();
    let contact_fn = Elevation::new(target.clone(), pole_station(), scene, frames);
    let epoch = epoch0();
    let state = target.state_km(epoch).unwrap();
    assert!(matches!(
        contact_fn.evaluate(epoch, &state),
        Err(EventError::EvalBeforeInit { .. })
    ));
}

#[test]
fn transmit_prefix_and_renames() {
    let (target, scene, frames) = scene();
    let cfg = SearchConfig::builder()
        .use_light_time(true)
        .write_report(false)
        .build();
    let mut locator = ContactLocator::new(target, scene, frames, cfg);
    locator.add_station(pole_station());
    locator.add_occulter("Luna");
    locator.set_light_time_direction_str("Transmit").unwrap();
    assert!(locator.set_light_time_direction_str("Bounce").is_err());
    locator.initialize().unwrap();

    assert_eq!(locator.abcorr(), "XCN");
    assert_eq!(locator.core().abcorr(), "CN");

    // Renames reach the name list and the constructed functions
    locator.rename_ref("Pole", "NorthPole");
    assert_eq!(locator.stations()[0].name, "NorthPole");
    assert!(locator.contacts()[0].has_member("LEOSat-NorthPole"));
    assert!(locator.contacts()[0].has_member("LEOSat-NorthPole-Luna"));
}

#[test]
fn locator_without_stations_fails() {
    let (target, scene, frames) = scene();
    let cfg = SearchConfig::builder().write_report(false).build();
    let mut locator = ContactLocator::new(target, scene, frames, cfg);
    assert!(matches!(
        locator.initialize(),
        Err(LocatorError::NoStations)
    ));
}
