// Synthetic series generation - deterministic daily/weekly/monthly shape
// plus seeded noise, and the bounded random walk behind live updates.
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::sensor::{Channel, SensorProfile};
use crate::domain::series::{SeriesBuffer, SeriesPoint, TimeRange};

/// Lower bound on the interval count of a generated series. A chart needs at
/// least two intervals (three samples) to draw a line.
pub const MIN_POINT_COUNT: usize = 2;

/// Sinusoidal modulation applied on top of a channel baseline. The phase is
/// derived from the sample's local clock, so the curve shape repeats across
/// regenerations while the noise does not.
struct Wave {
    divisor: f64,
    amplitude: f64,
}

// Channel order everywhere below: temperature, vibration, pressure, rpm,
// voltage, current.
const DAILY_WAVES: [Wave; 6] = [
    Wave { divisor: 24.0, amplitude: 5.0 },
    Wave { divisor: 12.0, amplitude: 0.5 },
    Wave { divisor: 8.0, amplitude: 8.0 },
    Wave { divisor: 6.0, amplitude: 100.0 },
    Wave { divisor: 12.0, amplitude: 3.0 },
    Wave { divisor: 8.0, amplitude: 2.0 },
];

const WEEKLY_WAVES: [Wave; 6] = [
    Wave { divisor: 24.0, amplitude: 8.0 },
    Wave { divisor: 12.0, amplitude: 0.8 },
    Wave { divisor: 8.0, amplitude: 12.0 },
    Wave { divisor: 6.0, amplitude: 150.0 },
    Wave { divisor: 12.0, amplitude: 4.0 },
    Wave { divisor: 8.0, amplitude: 2.5 },
];

const MONTHLY_WAVES: [Wave; 6] = [
    Wave { divisor: 30.0, amplitude: 10.0 },
    Wave { divisor: 15.0, amplitude: 1.0 },
    Wave { divisor: 10.0, amplitude: 15.0 },
    Wave { divisor: 5.0, amplitude: 200.0 },
    Wave { divisor: 7.0, amplitude: 5.0 },
    Wave { divisor: 8.0, amplitude: 3.0 },
];

/// Uniform noise amplitude per channel, scaled by the range's noise factor.
const NOISE_AMPLITUDES: [f64; 6] = [1.0, 0.15, 1.5, 25.0, 0.5, 0.25];

/// Step size and clamp bounds for the live random walk.
struct Walk {
    step: f64,
    floor: f64,
    ceiling: Option<f64>,
}

const LIVE_WALKS: [Walk; 6] = [
    Walk { step: 0.15, floor: 20.0, ceiling: Some(80.0) },
    Walk { step: 0.05, floor: 0.5, ceiling: None },
    Walk { step: 0.5, floor: 80.0, ceiling: Some(200.0) },
    Walk { step: 5.0, floor: 2500.0, ceiling: Some(3500.0) },
    Walk { step: 0.1, floor: 400.0, ceiling: Some(430.0) },
    Walk { step: 0.05, floor: 20.0, ceiling: Some(70.0) },
];

/// Readings a live walk starts from when the buffer is empty.
const LIVE_BASELINE: [f64; 6] = [50.0, 2.5, 120.0, 2800.0, 415.0, 45.0];

fn carrier(channel: Channel, phase: f64) -> f64 {
    match channel {
        Channel::Temperature | Channel::Pressure | Channel::Voltage => (phase * PI).sin(),
        Channel::Vibration | Channel::Rpm | Channel::Current => (phase * PI).cos(),
    }
}

fn base_signal(channel: Channel, baseline: f64, range: TimeRange, hour: f64, day: f64) -> f64 {
    let idx = channel as usize;
    let (wave, phase) = match range {
        TimeRange::Month => {
            let wave = &MONTHLY_WAVES[idx];
            (wave, day / wave.divisor)
        }
        TimeRange::Week => {
            let wave = &WEEKLY_WAVES[idx];
            (wave, hour / wave.divisor + day)
        }
        _ => {
            let wave = &DAILY_WAVES[idx];
            (wave, hour / wave.divisor)
        }
    };
    baseline + carrier(channel, phase) * wave.amplitude
}

/// Produces the synthetic sensor series for a machine profile.
///
/// The generator owns its RNG so a seeded instance replays the exact same
/// noise, which the tests and the `seed` query parameter rely on.
pub struct SeriesGenerator {
    rng: StdRng,
}

impl SeriesGenerator {
    pub fn new() -> SeriesGenerator {
        SeriesGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> SeriesGenerator {
        SeriesGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> SeriesGenerator {
        match seed {
            Some(seed) => SeriesGenerator::with_seed(seed),
            None => SeriesGenerator::new(),
        }
    }

    /// Generate a full series ending at the current instant.
    pub fn generate_series(
        &mut self,
        profile: &SensorProfile,
        range: TimeRange,
        point_count: usize,
    ) -> SeriesBuffer {
        self.generate_series_at(profile, range, point_count, Utc::now())
    }

    /// Like [`SeriesGenerator::generate_series`] with an explicit reference
    /// instant, so callers can pin the clock.
    ///
    /// `point_count` is the number of intervals; the returned buffer holds
    /// `point_count + 1` samples covering the range window, oldest first and
    /// ending exactly at `now`.
    pub fn generate_series_at(
        &mut self,
        profile: &SensorProfile,
        range: TimeRange,
        point_count: usize,
        now: DateTime<Utc>,
    ) -> SeriesBuffer {
        let point_count = point_count.max(MIN_POINT_COUNT);
        let window = range.window();
        let mut points = Vec::with_capacity(point_count + 1);

        // Sampled newest to oldest, then reversed so the buffer reads
        // oldest-first.
        for i in 0..=point_count {
            let offset = window * i as i32 / point_count as i32;
            points.push(self.sample(profile, range, now - offset));
        }
        points.reverse();

        SeriesBuffer::from_points(points)
    }

    fn sample(&mut self, profile: &SensorProfile, range: TimeRange, at: DateTime<Utc>) -> SeriesPoint {
        let local = at.with_timezone(&Local);
        let hour = local.hour() as f64;
        let day = local.day() as f64;
        let noise_factor = range.noise_factor();

        let mut values = [0.0f64; 6];
        for channel in Channel::ALL {
            let idx = channel as usize;
            let baseline = profile.channel(channel).current;
            let base = base_signal(channel, baseline, range, hour, day);
            let noise = self.rng.gen_range(-1.0..1.0) * NOISE_AMPLITUDES[idx] * noise_factor;
            values[idx] = channel.round_reading(base + noise);
        }

        SeriesPoint {
            time: range.format_label(local),
            timestamp: at,
            temperature: values[0],
            vibration: values[1],
            pressure: values[2],
            rpm: values[3],
            voltage: values[4],
            current: values[5],
        }
    }

    /// Advance the live walk one step from the most recent point, or from the
    /// fixed baseline when the buffer is empty.
    pub fn next_live_point(&mut self, last: Option<&SeriesPoint>) -> SeriesPoint {
        self.next_live_point_at(last, Utc::now())
    }

    pub fn next_live_point_at(
        &mut self,
        last: Option<&SeriesPoint>,
        now: DateTime<Utc>,
    ) -> SeriesPoint {
        let mut values = [0.0f64; 6];
        for channel in Channel::ALL {
            let idx = channel as usize;
            let walk = &LIVE_WALKS[idx];
            let previous = last.map(|point| point.value(channel)).unwrap_or(LIVE_BASELINE[idx]);
            let mut next = previous + self.rng.gen_range(-1.0..1.0) * walk.step;
            next = next.max(walk.floor);
            if let Some(ceiling) = walk.ceiling {
                next = next.min(ceiling);
            }
            values[idx] = next;
        }

        SeriesPoint {
            time: now.with_timezone(&Local).format("%H:%M:%S").to_string(),
            timestamp: now,
            temperature: values[0],
            vibration: values[1],
            pressure: values[2],
            rpm: values[3],
            voltage: values[4],
            current: values[5],
        }
    }
}
