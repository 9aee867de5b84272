use core::{fmt, marker::PhantomData};

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};
use heapless::String;
use uom::si::{
    f32::{Length, Time, Velocity},
    time::microsecond,
};

/// Capacity of a sensor name in bytes.
pub const NAME_CAPACITY: usize = 20;

/// Upper range bound applied by `HCSR04::new`, 400 cm.
pub const DEFAULT_MAX_RANGE: Length = Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 4.0,
};

/// Lower range bound applied by `HCSR04::new`, 2 cm.
pub const DEFAULT_MIN_RANGE: Length = Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 0.02,
};

/// Recommended minimum spacing between successive reads, 60 ms.
///
/// Triggering faster risks picking up reflections of the previous burst.
pub const RECOMMENDED_CYCLE_TIME: Time = Time {
    dimension: PhantomData,
    units: PhantomData,
    value: 0.06,
};

//speed of sound in air
const SOUND_SPEED: Velocity = Velocity {
    dimension: PhantomData,
    units: PhantomData,
    value: 343.0,
};

/// Error on sensor setup or pin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HCSR04Error {
    NameTooLong,
    Pin,
}

impl fmt::Display for HCSR04Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooLong => write!(f, "name longer than {} bytes", NAME_CAPACITY),
            Self::Pin => write!(f, "trigger or echo pin access failed"),
        }
    }
}

/// Driver for an HC-SR04 ultrasonic distance sensor.
///
/// Owns the trigger and echo pins; the delay is borrowed per measurement.
pub struct HCSR04<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    name: String<NAME_CAPACITY>,
    trigger: O,
    echo: I,
    max_range: Length,
    min_range: Length,
    distance: Length,
}

impl<O, I> HCSR04<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    //low level before the burst
    const SETTLE_PULSE_US: u32 = 2;
    //width of the trigger burst
    const TRIGGER_PULSE_US: u32 = 10;
    //give up on the echo pulse after this long
    const ECHO_TIMEOUT_US: u32 = 1_000_000;

    pub fn new(name: &str, trigger: O, echo: I) -> Result<Self, HCSR04Error> {
        Self::with_range(name, trigger, echo, DEFAULT_MAX_RANGE, DEFAULT_MIN_RANGE)
    }

    pub fn with_range(
        name: &str,
        mut trigger: O,
        echo: I,
        max_range: Length,
        min_range: Length,
    ) -> Result<Self, HCSR04Error> {
        let mut stored = String::new();
        stored.push_str(name).map_err(|_| HCSR04Error::NameTooLong)?;

        //idle the trigger line before the first burst
        trigger.set_low().map_err(|_| HCSR04Error::Pin)?;

        Ok(Self {
            name: stored,
            trigger,
            echo,
            max_range,
            min_range,
            distance: Length::default(),
        })
    }

    /// Takes one measurement and returns the distance.
    ///
    /// Blocks for the echo round trip, typically below 50 ms and up to
    /// about a second when no echo arrives; a timed-out read measures
    /// zero. Space successive calls by `RECOMMENDED_CYCLE_TIME`.
    pub fn read<D: DelayUs<u32>>(&mut self, delay: &mut D) -> Result<Length, HCSR04Error> {
        self.trigger.set_low().map_err(|_| HCSR04Error::Pin)?;
        delay.delay_us(Self::SETTLE_PULSE_US);
        self.trigger.set_high().map_err(|_| HCSR04Error::Pin)?;
        delay.delay_us(Self::TRIGGER_PULSE_US);
        self.trigger.set_low().map_err(|_| HCSR04Error::Pin)?;

        let duration = self.echo_pulse_width(delay)?;
        self.distance = duration_to_distance(duration);
        Ok(self.distance)
    }

    //wait for the echo line to rise, then measure how long it stays high;
    //one budget covers both phases and exhausting it measures zero
    fn echo_pulse_width<D: DelayUs<u32>>(&self, delay: &mut D) -> Result<Time, HCSR04Error> {
        let mut budget = Self::ECHO_TIMEOUT_US;
        while self.echo.is_low().map_err(|_| HCSR04Error::Pin)? {
            if budget == 0 {
                return Ok(Time::default());
            }
            delay.delay_us(1);
            budget -= 1;
        }

        let mut width: u32 = 0;
        while self.echo.is_high().map_err(|_| HCSR04Error::Pin)? {
            if budget == 0 {
                return Ok(Time::default());
            }
            delay.delay_us(1);
            budget -= 1;
            width += 1;
        }
        Ok(Time::new::<microsecond>(width as f32))
    }

    /// Whether the last measured distance lies within the sensor range,
    /// both bounds inclusive.
    pub fn valid(&self) -> bool {
        self.distance >= self.min_range && self.distance <= self.max_range
    }

    /// Distance measured by the most recent read, zero before the first one.
    pub fn distance(&self) -> Length {
        self.distance
    }

    pub fn max_range(&self) -> Length {
        self.max_range
    }

    pub fn min_range(&self) -> Length {
        self.min_range
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &O {
        &self.trigger
    }

    pub fn echo(&self) -> &I {
        &self.echo
    }
}

impl<O, I> fmt::Display for HCSR04<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

//half the round trip at the speed of sound
fn duration_to_distance(duration: Time) -> Length {
    SOUND_SPEED * duration / 2.0
}
