use aerso::types::{Frame, UnitQuaternion, Vector3};
use aerso::types::StateView;

use crate::aircraft::{Aircraft, Controls};

/// Named output channels, one per logged column.
///
/// `ALL` fixes both the log record layout and the CSV column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Time,
    North,
    East,
    Altitude,
    U,
    V,
    W,
    Roll,
    Pitch,
    Heading,
    P,
    Q,
    R,
    Airspeed,
    Aileron,
    Elevator,
    Throttle,
    Rudder,
}

impl Channel {
    pub const ALL: [Channel; 18] = [
        Channel::Time,
        Channel::North,
        Channel::East,
        Channel::Altitude,
        Channel::U,
        Channel::V,
        Channel::W,
        Channel::Roll,
        Channel::Pitch,
        Channel::Heading,
        Channel::P,
        Channel::Q,
        Channel::R,
        Channel::Airspeed,
        Channel::Aileron,
        Channel::Elevator,
        Channel::Throttle,
        Channel::Rudder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Time => "time",
            Channel::North => "north",
            Channel::East => "east",
            Channel::Altitude => "altitude",
            Channel::U => "u",
            Channel::V => "v",
            Channel::W => "w",
            Channel::Roll => "roll",
            Channel::Pitch => "pitch",
            Channel::Heading => "heading",
            Channel::P => "p",
            Channel::Q => "q",
            Channel::R => "r",
            Channel::Airspeed => "airspeed",
            Channel::Aileron => "aileron",
            Channel::Elevator => "elevator",
            Channel::Throttle => "throttle",
            Channel::Rudder => "rudder",
        }
    }

    // `ALL` lists the variants in declaration order, so the discriminant is
    // the column index.
    fn index(&self) -> usize {
        *self as usize
    }
}

/// One tick's worth of named output values, dense in `Channel::ALL` order.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    values: Vec<f64>,
}

impl LogRecord {
    pub fn get(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Full state vector of the most recently computed tick.
///
/// Produced once per tick by the runner, replaced atomically, read-only to
/// every consumer. Positions are NED (z down), velocities and rates are body
/// frame, angles are radians.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightState {
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub rates: Vector3<f64>,
    pub controls: Controls,
}

impl FlightState {
    pub fn capture(time: f64, aircraft: &Aircraft, controls: &Controls) -> Self {
        Self {
            time,
            position: aircraft.position(),
            velocity: aircraft.velocity_in_frame(Frame::Body),
            attitude: aircraft.attitude(),
            rates: aircraft.rates_in_frame(Frame::Body),
            controls: *controls,
        }
    }

    pub fn altitude(&self) -> f64 {
        -self.position[2]
    }

    pub fn airspeed(&self) -> f64 {
        self.velocity.norm()
    }

    /// (roll, pitch, heading) in radians.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.attitude.euler_angles()
    }

    pub fn record(&self) -> LogRecord {
        let (roll, pitch, heading) = self.euler_angles();
        LogRecord {
            values: vec![
                self.time,
                self.position[0],
                self.position[1],
                self.altitude(),
                self.velocity[0],
                self.velocity[1],
                self.velocity[2],
                roll,
                pitch,
                heading,
                self.rates[0],
                self.rates[1],
                self.rates[2],
                self.airspeed(),
                self.controls.aileron,
                self.controls.elevator,
                self.controls.throttle,
                self.controls.rudder,
            ],
        }
    }
}
