use crate::error::ConfigError;
use std::time::Duration;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

// =============================================================================
// Schedule
// =============================================================================

/// Each of the `connections` clients fires once per `fire_interval`, and client
/// `i` starts `i * stagger_step` after the run begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    connections: usize,
    fire_interval: Duration,
    stagger_step: Duration,
}

/// Timing for one simulated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandle {
    pub index: usize,
    pub start_delay: Duration,
    pub fire_interval: Duration,
}

impl Schedule {
    /// Interval and stagger are computed in whole nanoseconds, always floored,
    /// so the last stagger stays strictly below one interval.
    pub fn compute(connections: usize, rps: f64) -> Result<Self, ConfigError> {
        if connections == 0 {
            return Err(ConfigError::NoConnections);
        }
        if !rps.is_finite() || rps <= 0.0 {
            return Err(ConfigError::InvalidRate(rps));
        }

        let interval_nanos = (connections as f64 * NANOS_PER_SEC / rps).floor();
        if interval_nanos < 1.0 {
            return Err(ConfigError::RateTooHigh { rps, connections });
        }
        if interval_nanos >= u64::MAX as f64 {
            return Err(ConfigError::InvalidRate(rps));
        }

        let fire_interval = Duration::from_nanos(interval_nanos as u64);
        let stagger_step =
            Duration::from_nanos(fire_interval.as_nanos() as u64 / connections as u64);

        Ok(Self {
            connections,
            fire_interval,
            stagger_step,
        })
    }

    pub fn fire_interval(&self) -> Duration {
        self.fire_interval
    }

    pub fn stagger_step(&self) -> Duration {
        self.stagger_step
    }

    pub fn stagger(&self, index: usize) -> Duration {
        Duration::from_nanos(self.stagger_step.as_nanos() as u64 * index as u64)
    }

    /// Requests per second the schedule actually produces.
    pub fn effective_rps(&self) -> f64 {
        self.connections as f64 / self.fire_interval.as_secs_f64()
    }

    pub fn handles(&self) -> impl Iterator<Item = ClientHandle> + '_ {
        (0..self.connections).map(move |index| ClientHandle {
            index,
            start_delay: self.stagger(index),
            fire_interval: self.fire_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_clients_ten_rps() {
        let schedule = Schedule::compute(2, 10.0).unwrap();
        assert_eq!(schedule.fire_interval(), Duration::from_millis(200));

        let handles: Vec<_> = schedule.handles().collect();
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].start_delay, Duration::ZERO);
        assert_eq!(handles[1].start_delay, Duration::from_millis(100));
        assert!(handles
            .iter()
            .all(|h| h.fire_interval == Duration::from_millis(200)));
    }

    #[test]
    fn test_staggers_evenly_spaced() {
        for (connections, rps) in [(1, 1.0), (3, 7.0), (7, 3.0), (50, 333.3), (64, 0.5)] {
            let schedule = Schedule::compute(connections, rps).unwrap();
            let staggers: Vec<_> = schedule.handles().map(|h| h.start_delay).collect();

            let gaps: Vec<_> = staggers.windows(2).map(|w| w[1] - w[0]).collect();
            assert!(gaps.iter().all(|g| *g == schedule.stagger_step()));

            let last = *staggers.last().unwrap();
            assert!(last < schedule.fire_interval());
        }
    }

    #[test]
    fn test_effective_rate_matches_target() {
        for (connections, rps) in [(1, 1.0), (2, 10.0), (3, 7.0), (10, 1000.0), (50, 333.3)] {
            let schedule = Schedule::compute(connections, rps).unwrap();
            let effective = schedule.effective_rps();
            assert!(
                (effective - rps).abs() / rps < 1e-6,
                "connections={connections} rps={rps} effective={effective}"
            );
        }
    }

    #[test]
    fn test_non_integer_millis_not_truncated() {
        // 1/3 s is not a whole number of milliseconds.
        let schedule = Schedule::compute(1, 3.0).unwrap();
        assert_eq!(schedule.fire_interval(), Duration::from_nanos(333_333_333));
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(Schedule::compute(0, 1.0), Err(ConfigError::NoConnections)));
        assert!(matches!(Schedule::compute(1, -1.0), Err(ConfigError::InvalidRate(_))));
        assert!(matches!(
            Schedule::compute(1, f64::INFINITY),
            Err(ConfigError::InvalidRate(_))
        ));
        assert!(matches!(
            Schedule::compute(1, 1e12),
            Err(ConfigError::RateTooHigh { .. })
        ));
    }
}
