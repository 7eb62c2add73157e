//! Behavioural properties of the home graph, exercised across crates

use sh_automation::{Command, ScenarioRun};
use sh_config::HomeConfig;
use sh_core::{timestamp_from_epoch, Device, DeviceKind, EnergyReport, PowerUpdate};
use sh_home::{Home, HomeError};
use sh_registries::{Record, Storage};
use tempfile::TempDir;

fn empty_home(dir: &TempDir) -> Home {
    Home::new(dir.path(), &HomeConfig::default())
}

// ============================================================================
// Power clamping
// ============================================================================

#[test]
fn test_power_is_clamped_to_range() {
    let mut device = Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 0.0);

    assert_eq!(device.update_current_value(-5.0), PowerUpdate::ClampedToZero);
    assert_eq!(device.power_watts(), 0.0);

    assert_eq!(device.update_current_value(12_000.0), PowerUpdate::ClampedToMax);
    assert_eq!(device.power_watts(), 10_000.0);

    for watts in [0.0, 15.0, 999.5, 10_000.0] {
        assert_eq!(device.update_current_value(watts), PowerUpdate::Accepted);
        assert_eq!(device.power_watts(), watts);
    }
}

// ============================================================================
// Device record round trip
// ============================================================================

#[test]
fn test_device_round_trip_with_room() {
    let temp_dir = TempDir::new().unwrap();
    let mut home = empty_home(&temp_dir);
    home.add_room("R1", "Living Room", 20.0).unwrap();
    home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0).with_room("R1"))
        .unwrap();
    home.switch_device("D1", true).unwrap();
    home.save().unwrap();

    let (reloaded, report) = Home::load(temp_dir.path(), &HomeConfig::default()).unwrap();
    assert!(report.is_clean());

    let device = reloaded.device("D1").unwrap();
    assert_eq!(device.name, "Lamp");
    assert_eq!(device.manufacturer, "X");
    assert_eq!(device.kind, DeviceKind::Actuator);
    assert_eq!(device.room_id.as_deref(), Some("R1"));
    assert!(device.is_on());
    assert!(device.is_online);
    assert_eq!(device.power_watts(), 15.0);
    assert!(reloaded.room("R1").unwrap().contains("D1"));
}

// ============================================================================
// Room power
// ============================================================================

#[test]
fn test_room_power_counts_devices_that_are_on() {
    let temp_dir = TempDir::new().unwrap();
    let mut home = empty_home(&temp_dir);
    home.add_room("R1", "Office", 12.0).unwrap();
    home.add_device(Device::new("D1", "Heater", "X", DeviceKind::Actuator, 100.0).with_room("R1"))
        .unwrap();
    home.add_device(Device::new("D2", "Lamp", "X", DeviceKind::Actuator, 50.0).with_room("R1"))
        .unwrap();

    home.switch_device("D1", true).unwrap();
    assert_eq!(home.room_power("R1").unwrap(), 100.0);

    home.switch_device("D1", false).unwrap();
    assert_eq!(home.room_power("R1").unwrap(), 0.0);
}

#[test]
fn test_room_power_skips_offline_devices() {
    let temp_dir = TempDir::new().unwrap();
    let mut home = empty_home(&temp_dir);
    home.add_room("R1", "Office", 12.0).unwrap();
    home.add_device(Device::new("D1", "Heater", "X", DeviceKind::Actuator, 100.0).with_room("R1"))
        .unwrap();
    home.switch_device("D1", true).unwrap();
    home.device_mut("D1").unwrap().set_online(false);

    assert_eq!(home.room_power("R1").unwrap(), 0.0);
}

// ============================================================================
// Scenario execution
// ============================================================================

#[test]
fn test_inactive_scenario_mutates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mut home = empty_home(&temp_dir);
    home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0)).unwrap();
    home.add_device(Device::new("D2", "Fan", "X", DeviceKind::Actuator, 40.0)).unwrap();
    home.switch_device("D2", true).unwrap();

    let id = home.add_scenario("Morning", "07:00").unwrap();
    home.add_action(&id, Some("D1"), Command::TurnOn).unwrap();
    home.add_action(&id, Some("D2"), Command::TurnOff).unwrap();

    assert_eq!(home.execute_scenario(&id).unwrap(), ScenarioRun::Skipped);
    assert!(!home.device("D1").unwrap().is_on());
    assert!(home.device("D2").unwrap().is_on());
}

#[test]
fn test_active_scenario_applies_actions_in_order() {
    // Both prior states must end up the same way
    for (d1_on, d2_on) in [(false, false), (false, true), (true, false), (true, true)] {
        let temp_dir = TempDir::new().unwrap();
        let mut home = empty_home(&temp_dir);
        home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0)).unwrap();
        home.add_device(Device::new("D2", "Fan", "X", DeviceKind::Actuator, 40.0)).unwrap();
        home.switch_device("D1", d1_on).unwrap();
        home.switch_device("D2", d2_on).unwrap();

        let id = home.add_scenario("Morning", "07:00").unwrap();
        home.add_action(&id, Some("D1"), Command::TurnOn).unwrap();
        home.add_action(&id, Some("D2"), Command::TurnOff).unwrap();
        home.activate_scenario(&id).unwrap();

        let run = home.execute_scenario(&id).unwrap();
        let order: Vec<&str> = run.outcomes().iter().map(|o| o.action_id()).collect();
        assert_eq!(order, vec!["ACT1", "ACT2"]);
        assert!(home.device("D1").unwrap().is_on());
        assert!(!home.device("D2").unwrap().is_on());
    }
}

// ============================================================================
// Energy report
// ============================================================================

#[test]
fn test_energy_report_totals_and_ranking() {
    let start = timestamp_from_epoch(1_700_000_000).unwrap();
    let end = timestamp_from_epoch(1_700_086_400).unwrap();
    let mut report = EnergyReport::new("RPT1", start, end);
    report.add_device_consumption("D1", 10.0);
    report.add_device_consumption("D2", 30.0);
    report.add_device_consumption("D3", 20.0);
    report.generate_report();

    assert_eq!(report.total_consumption, 60.0);
    assert_eq!(report.peak_load, 30.0);
    assert_eq!(report.top_consuming_devices(2), vec!["D2", "D3"]);
    assert_eq!(report.average_consumption(), 20.0);
}

// ============================================================================
// Room deletion
// ============================================================================

#[test]
fn test_deleting_occupied_room_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let mut home = empty_home(&temp_dir);
    home.add_room("R1", "Kitchen", 12.0).unwrap();
    home.add_room("R2", "Hall", 8.0).unwrap();
    home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0).with_room("R1"))
        .unwrap();

    let result = home.delete_room("R1");
    assert!(matches!(
        result,
        Err(HomeError::RoomNotEmpty { device_count: 1, .. })
    ));
    assert_eq!(home.rooms().len(), 2);
    assert!(home.room("R1").unwrap().contains("D1"));

    home.delete_room("R2").unwrap();
    assert_eq!(home.rooms().len(), 1);
    assert!(matches!(home.delete_room("R2"), Err(HomeError::RoomNotFound(_))));
}

// ============================================================================
// Garbled records
// ============================================================================

#[test]
fn test_garbled_numeric_field_yields_no_entity() {
    assert!(Device::decode("D1|Lamp|X|1|NULL|1|1|fifteen").is_err());
    assert!(Device::decode("D1|Lamp|X|1|NULL|1|1").is_err());

    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(temp_dir.path());
    storage
        .write_lines(
            "devices.dat",
            [
                "D1|Lamp|X|1|NULL|1|1|15",
                "D2|Fan|X|1|NULL|0|1|forty",
                "D3|Radio|X|4|NULL|0|1|20",
            ],
        )
        .unwrap();

    let (home, report) = Home::load(temp_dir.path(), &HomeConfig::default()).unwrap();
    assert_eq!(home.devices().len(), 2);
    assert!(home.devices().contains("D1"));
    assert!(home.devices().contains("D3"));
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].file, "devices.dat");
    assert_eq!(report.rejected[0].line, 2);
}
