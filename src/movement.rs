use crate::utils::Position;

/// Constant-acceleration motion, integrated with a half-step velocity update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Movement {
    pub velocity: Position,
    pub acceleration: Position,
}

impl Movement {
    pub fn new(velocity: Position, acceleration: Position) -> Self {
        Self {
            velocity,
            acceleration,
        }
    }

    /// Advances by `dt` seconds and returns the position delta.
    pub fn update(&mut self, dt: f32) -> Position {
        let half = self.acceleration * (0.5 * dt);
        self.velocity += half;
        let delta = self.velocity * dt;
        self.velocity += half;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_velocity_is_linear() {
        let mut m = Movement::new(Position::new(10.0, -4.0), Position::ZERO);
        assert_eq!(m.update(0.5), Position::new(5.0, -2.0));
        assert_eq!(m.velocity, Position::new(10.0, -4.0));
    }

    #[test]
    fn acceleration_matches_closed_form() {
        // x = v0*t + a*t^2/2 holds exactly for the half-step scheme
        let mut m = Movement::new(Position::new(2.0, 0.0), Position::new(4.0, 8.0));
        let mut total = Position::ZERO;
        for _ in 0..4 {
            total += m.update(0.25);
        }
        assert!((total.x - (2.0 + 2.0)).abs() < 1e-5);
        assert!((total.y - 4.0).abs() < 1e-5);
        assert!((m.velocity.x - 6.0).abs() < 1e-5);
    }
}
