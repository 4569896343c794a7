/// Natural log of the factor the spring's envelope decays by over the
/// requested duration (1000x, i.e. visually settled).
const SETTLE_LN: f32 = 6.907_755;

/// Largest integration step, in seconds. Longer frames are sub-stepped.
const MAX_STEP: f32 = 1.0 / 240.0;

/// Configuration for spring physics animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    /// Mass of the spring
    pub mass: f32,
    /// Stiffness of the spring
    pub stiffness: f32,
    /// Damping coefficient
    pub damping: f32,
}

impl SpringConfig {
    /// Spring that visually settles within `duration_secs`.
    ///
    /// `damping_ratio` of 1.0 is critically damped (no overshoot); lower
    /// values oscillate around the target before settling.
    pub fn from_damping_ratio(duration_secs: f32, damping_ratio: f32) -> Self {
        let ratio = damping_ratio.max(0.05);
        let duration = duration_secs.max(1e-3);
        let omega = SETTLE_LN / (ratio * duration);
        Self {
            mass: 1.0,
            stiffness: omega * omega,
            damping: 2.0 * ratio * omega,
        }
    }

    /// The damping ratio this configuration corresponds to.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

/// State for spring physics simulation
#[derive(Clone, Debug)]
pub struct SpringState {
    /// Current position (0.0 = start, 1.0 = target)
    pub position: f32,
    /// Current velocity, in target distances per second
    pub velocity: f32,
    /// Last evaluation time
    pub last_t: f32,
}

impl SpringState {
    /// Create a new spring state at rest at position 0.0
    pub fn new() -> Self {
        Self::with_velocity(0.0)
    }

    /// Create a spring state at position 0.0 that is already moving.
    ///
    /// A velocity of 1.0 covers the full distance in one second if kept
    /// constant; positive values move toward the target.
    pub fn with_velocity(velocity: f32) -> Self {
        Self {
            position: 0.0,
            velocity,
            last_t: 0.0,
        }
    }

    /// Step the simulation forward to `elapsed_secs` since the animation
    /// started and return the current position (may overshoot 1.0).
    pub fn step(&mut self, elapsed_secs: f32, config: &SpringConfig) -> f32 {
        let mut remaining = (elapsed_secs - self.last_t).max(0.0);
        self.last_t = elapsed_secs;

        while remaining > 1e-6 {
            let dt = remaining.min(MAX_STEP);
            remaining -= dt;

            // Target is always 1.0
            let displacement = self.position - 1.0;
            let spring_force = -config.stiffness * displacement;
            let damping_force = -config.damping * self.velocity;
            let acceleration = (spring_force + damping_force) / config.mass;

            // Semi-implicit Euler
            self.velocity += acceleration * dt;
            self.position += self.velocity * dt;
        }

        self.position
    }
}

impl Default for SpringState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: &SpringConfig, state: &mut SpringState, secs: f32) -> (f32, f32) {
        let mut max_position: f32 = 0.0;
        let frames = (secs * 60.0) as u32;
        let mut position = 0.0;
        for i in 1..=frames {
            position = state.step(i as f32 / 60.0, config);
            max_position = max_position.max(position);
        }
        (position, max_position)
    }

    #[test]
    fn test_damping_ratio_round_trips() {
        let config = SpringConfig::from_damping_ratio(0.5, 0.8);
        assert!((config.damping_ratio() - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_spring_settles_within_duration() {
        let config = SpringConfig::from_damping_ratio(0.5, 0.8);
        let mut state = SpringState::new();
        let (position, _) = run(&config, &mut state, 0.5);
        assert!(
            (position - 1.0).abs() < 0.01,
            "Spring should settle near target, got {}",
            position
        );
    }

    #[test]
    fn test_underdamped_spring_overshoots() {
        let config = SpringConfig::from_damping_ratio(0.5, 0.3);
        let mut state = SpringState::new();
        let (_, max_position) = run(&config, &mut state, 0.5);
        assert!(
            max_position > 1.0,
            "Underdamped spring should overshoot, max was {}",
            max_position
        );
    }

    #[test]
    fn test_critically_damped_spring_does_not_overshoot() {
        let config = SpringConfig::from_damping_ratio(0.7, 1.0);
        let mut state = SpringState::new();
        let (_, max_position) = run(&config, &mut state, 0.7);
        assert!(max_position <= 1.0 + 1e-3, "max was {}", max_position);
    }

    #[test]
    fn test_initial_velocity_moves_faster() {
        let config = SpringConfig::from_damping_ratio(0.7, 1.0);
        let mut resting = SpringState::new();
        let mut flung = SpringState::with_velocity(10.0);
        let a = resting.step(0.05, &config);
        let b = flung.step(0.05, &config);
        assert!(b > a, "{} should lead {}", b, a);
    }
}
