#![no_std]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};
use typed_builder::TypedBuilder;
use uom::si::{
    f32::{Length, Time},
    length::meter,
    time::microsecond,
};

//trigger pulses narrower than this do not arm an echo response
const MIN_TRIGGER_PULSE_US: u64 = 10;
//speed of sound in air assumed by the simulated transducer
const SOUND_SPEED: f32 = 343.0;

#[derive(TypedBuilder)]
pub struct Simulator {
    #[builder(default, setter(transform = |width: u32| Cell::new(Some(width))))]
    echo_width: Cell<Option<u32>>,
    #[builder(default = 250)]
    response_delay: u32,
    #[builder(default, setter(skip))]
    line: RefCell<Line>,
}

#[derive(Default)]
struct Line {
    now: u64,
    trigger_high: bool,
    trigger_rise: u64,
    echo_rise: u64,
    echo_fall: u64,
}

impl Simulator {
    pub fn trigger(&self) -> Trigger<'_> {
        Trigger { sim: self }
    }

    pub fn echo(&self) -> Echo<'_> {
        Echo { sim: self }
    }

    pub fn delay(&self) -> Delay<'_> {
        Delay { sim: self }
    }

    pub fn set_echo_width(&self, width: Option<u32>) {
        self.echo_width.set(width);
    }

    pub fn elapsed(&self) -> Time {
        Time::new::<microsecond>(self.line.borrow().now as f32)
    }

    pub fn trigger_is_high(&self) -> bool {
        self.line.borrow().trigger_high
    }

    pub fn echo_width_for(distance: Length) -> u32 {
        let round_trip = 2.0 * distance.get::<meter>() / SOUND_SPEED;
        (round_trip * 1_000_000.0 + 0.5) as u32
    }

    fn raise_trigger(&self) {
        let mut line = self.line.borrow_mut();
        if !line.trigger_high {
            line.trigger_high = true;
            line.trigger_rise = line.now;
        }
    }

    fn drop_trigger(&self) {
        let mut line = self.line.borrow_mut();
        if !line.trigger_high {
            return;
        }
        line.trigger_high = false;
        if line.now - line.trigger_rise < MIN_TRIGGER_PULSE_US {
            return;
        }
        if let Some(width) = self.echo_width.get() {
            line.echo_rise = line.now + self.response_delay as u64;
            line.echo_fall = line.echo_rise + width as u64;
        }
    }

    fn advance(&self, us: u32) {
        self.line.borrow_mut().now += us as u64;
    }

    fn echo_level(&self) -> bool {
        let line = self.line.borrow();
        line.now >= line.echo_rise && line.now < line.echo_fall
    }
}

pub struct Trigger<'a> {
    sim: &'a Simulator,
}

impl OutputPin for Trigger<'_> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.sim.drop_trigger();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.sim.raise_trigger();
        Ok(())
    }
}

pub struct Echo<'a> {
    sim: &'a Simulator,
}

impl InputPin for Echo<'_> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.sim.echo_level())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.sim.echo_level())
    }
}

pub struct Delay<'a> {
    sim: &'a Simulator,
}

impl DelayUs<u32> for Delay<'_> {
    fn delay_us(&mut self, us: u32) {
        self.sim.advance(us);
    }
}
