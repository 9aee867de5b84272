use approx::assert_relative_eq;
use embedded_hal::digital::v2::InputPin;
use hcsr04::sensor::HCSR04;
use hcsr04sim::Simulator;
use uom::si::f32::{Length, Time};
use uom::si::{length::centimeter, time::second};

#[test]
fn test_read_nominal() {
    test_read(Some(1000), 17.15, true);
}

#[test]
fn test_read_below_min_range() {
    test_read(Some(100), 1.715, false);
}

#[test]
fn test_read_beyond_max_range() {
    test_read(Some(30000), 514.5, false);
}

#[test]
fn test_read_no_echo() {
    test_read(None, 0.0, false);
}

#[test]
fn test_read_echo_outlasting_timeout() {
    test_read(Some(2_000_000), 0.0, false);
}

fn test_read(echo_width: Option<u32>, expected: f32, expected_valid: bool) {
    let sim = Simulator::builder().build();
    sim.set_echo_width(echo_width);
    let mut sensor = HCSR04::new("front", sim.trigger(), sim.echo()).unwrap();
    let mut delay = sim.delay();

    let distance = sensor.read(&mut delay).unwrap();

    assert_relative_eq!(distance.get::<centimeter>(), expected, epsilon = 0.001);
    assert_relative_eq!(sensor.distance().get::<centimeter>(), expected, epsilon = 0.001);
    assert_eq!(sensor.valid(), expected_valid);
}

#[test]
fn test_no_echo_blocks_until_timeout() {
    let sim = Simulator::builder().build();
    let mut sensor = HCSR04::new("front", sim.trigger(), sim.echo()).unwrap();
    let mut delay = sim.delay();

    sensor.read(&mut delay).unwrap();

    assert!(sim.elapsed() >= Time::new::<second>(1.0));
}

#[test]
fn test_distance_reflects_latest_read() {
    let sim = Simulator::builder().echo_width(1000).build();
    let mut sensor = HCSR04::new("front", sim.trigger(), sim.echo()).unwrap();
    let mut delay = sim.delay();

    sensor.read(&mut delay).unwrap();
    assert_relative_eq!(sensor.distance().get::<centimeter>(), 17.15, epsilon = 0.001);

    sim.set_echo_width(Some(2000));
    sensor.read(&mut delay).unwrap();
    assert_relative_eq!(sensor.distance().get::<centimeter>(), 34.3, epsilon = 0.001);

    sim.set_echo_width(None);
    sensor.read(&mut delay).unwrap();
    assert_relative_eq!(sensor.distance().get::<centimeter>(), 0.0, epsilon = 0.001);
    assert!(!sensor.valid());
}

#[test]
fn test_accessors_unchanged_by_reads() {
    let sim = Simulator::builder().echo_width(500).build();
    let mut sensor = HCSR04::with_range(
        "rear",
        sim.trigger(),
        sim.echo(),
        Length::new::<centimeter>(300.0),
        Length::new::<centimeter>(5.0),
    )
    .unwrap();
    let mut delay = sim.delay();

    for _ in 0..3 {
        sensor.read(&mut delay).unwrap();
    }

    assert_eq!(sensor.name(), "rear");
    assert_relative_eq!(sensor.max_range().get::<centimeter>(), 300.0, epsilon = 0.001);
    assert_relative_eq!(sensor.min_range().get::<centimeter>(), 5.0, epsilon = 0.001);
    assert!(!sim.trigger_is_high());
    assert!(sensor.echo().is_low().unwrap());
}

#[test]
fn test_range_bounds_inclusive() {
    let sim = Simulator::builder().echo_width(1000).build();
    let mut sensor = HCSR04::new("front", sim.trigger(), sim.echo()).unwrap();
    let mut delay = sim.delay();
    let measured = sensor.read(&mut delay).unwrap();

    let sim = Simulator::builder().echo_width(1000).build();
    let mut sensor =
        HCSR04::with_range("front", sim.trigger(), sim.echo(), measured, measured).unwrap();
    let mut delay = sim.delay();
    sensor.read(&mut delay).unwrap();

    assert!(sensor.valid());
}

#[test]
fn test_echo_width_for_target_distance() {
    let sim = Simulator::builder()
        .echo_width(Simulator::echo_width_for(Length::new::<centimeter>(100.0)))
        .build();
    let mut sensor = HCSR04::new("front", sim.trigger(), sim.echo()).unwrap();
    let mut delay = sim.delay();

    let distance = sensor.read(&mut delay).unwrap();

    assert!(sensor.valid());
    assert_relative_eq!(distance.get::<centimeter>(), 100.0, epsilon = 0.02);
}
