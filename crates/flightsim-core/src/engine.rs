//! The single-tick simulation step.
//!
//! [`advance`] moves the shared [`FlightState`] forward by exactly one tick
//! and describes the result as a [`TelemetrySample`]. The step runs in a
//! fixed order:
//!
//! 1. **Phase** -- with a small probability, move to the next launch phase.
//! 2. **Altitude** -- climb in phases 2-4, descend (clamped at 0) in 5-6.
//! 3. **Delta** -- report the change since the previous tick.
//! 4. **Drift** -- random walk on latitude and longitude.
//! 5. **Fault** -- occasionally report a non-zero error code.
//! 6. **Sensors** -- fresh temperature, voltage, and gyro readings.
//! 7. **Raw line** -- pipe-delimited text copy of the key numbers.
//!
//! Sensor channels are redrawn independently every tick with no smoothing;
//! the stream is deliberately noisy. The step cannot fail.

use chrono::Utc;
use flightsim_types::{ErrorCode, TelemetrySample};

use crate::config::SimulationParams;
use crate::entropy::Entropy;
use crate::state::FlightState;

/// Largest altitude gain in one tick while climbing, meters.
pub const MAX_CLIMB_STEP: f64 = 50.0;

/// Largest altitude loss in one tick while descending, meters.
pub const MAX_DESCENT_STEP: f64 = 30.0;

/// Largest position change per axis in one tick, degrees.
pub const MAX_DRIFT: f64 = 0.0005;

/// Temperature range in degrees Celsius.
pub const TEMPERATURE_RANGE: (f64, f64) = (20.0, 35.0);

/// Battery voltage range.
pub const VOLTAGE_RANGE: (f64, f64) = (11.1, 12.6);

/// Gyro range per axis, degrees per second.
pub const GYRO_RANGE: (f64, f64) = (-180.0, 180.0);

/// Range of the extra scalar appended to the raw line.
const RAW_SCALAR_RANGE: (f64, f64) = (0.0, 100.0);

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Advance `state` by one tick and return the sample describing it.
///
/// `timestamp` is stamped onto the sample as-is; production callers pass
/// [`unix_timestamp`].
pub fn advance<E>(
    state: &mut FlightState,
    entropy: &mut E,
    params: &SimulationParams,
    timestamp: i64,
) -> TelemetrySample
where
    E: Entropy + ?Sized,
{
    // 1. Phase
    if !state.launch_phase().is_terminal() && entropy.chance(params.phase_advance_probability) {
        state.advance_phase();
    }

    // 2. Altitude
    let phase = state.launch_phase();
    if phase.is_climbing() {
        state.apply_altitude_step(entropy.uniform(0.0, MAX_CLIMB_STEP));
    } else if phase.is_descending() {
        state.apply_altitude_step(-entropy.uniform(0.0, MAX_DESCENT_STEP));
    }

    // 3. Delta
    let altitude_diff = state.commit_altitude();

    // 4. Drift
    let d_latitude = entropy.uniform(-MAX_DRIFT, MAX_DRIFT);
    let d_longitude = entropy.uniform(-MAX_DRIFT, MAX_DRIFT);
    state.drift(d_latitude, d_longitude);

    // 5. Fault
    let error_code = if entropy.chance(params.error_probability) {
        ErrorCode::new(entropy.uniform_int(ErrorCode::FIRST_FAULT, ErrorCode::LAST_FAULT))
            .unwrap_or(ErrorCode::NOMINAL)
    } else {
        ErrorCode::NOMINAL
    };

    // 6. Sensors
    let temperature = entropy.uniform(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
    let voltage = entropy.uniform(VOLTAGE_RANGE.0, VOLTAGE_RANGE.1);
    let gyro_x = entropy.uniform(GYRO_RANGE.0, GYRO_RANGE.1);
    let gyro_y = entropy.uniform(GYRO_RANGE.0, GYRO_RANGE.1);
    let gyro_z = entropy.uniform(GYRO_RANGE.0, GYRO_RANGE.1);

    // 7. Raw line
    let scalar = entropy.uniform(RAW_SCALAR_RANGE.0, RAW_SCALAR_RANGE.1);
    let raw_data = format_raw_line(timestamp, state, scalar);

    state.record_tick();

    TelemetrySample {
        timestamp,
        temperature,
        voltage,
        gyro_x,
        gyro_y,
        gyro_z,
        altitude: state.altitude(),
        altitude_diff,
        latitude: state.latitude(),
        longitude: state.longitude(),
        launch_status: state.launch_phase(),
        error_code,
        raw_data,
    }
}

/// `RAW|<timestamp>|<altitude>|<latitude>|<longitude>|<scalar>`, numbers to
/// two decimals.
fn format_raw_line(timestamp: i64, state: &FlightState, scalar: f64) -> String {
    format!(
        "RAW|{timestamp}|{:.2}|{:.2}|{:.2}|{scalar:.2}",
        state.altitude(),
        state.latitude(),
        state.longitude(),
    )
}
