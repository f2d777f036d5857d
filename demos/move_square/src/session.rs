use nudge2d::Vec2;

/// Distance moved per recognized key event.
pub const MOVE_SPEED: f32 = 0.6;

/// Side length of the drawn square.
pub const SQUARE_SIZE: f32 = 10.0;

/// Fill color of the square (CSS "green").
pub const SQUARE_COLOR: [f32; 4] = [0.0, 0.5, 0.0, 1.0];

/// Position state mutated by drained key tokens.
///
/// Single writer: only the frame driver touches this, once per frame,
/// while draining the queue.
pub struct Session {
    pub position: Vec2,
}

impl Session {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
        }
    }

    /// Apply one key token to the position.
    ///
    /// Tokens outside the four movement keys are silently ignored.
    /// Coordinates are y-down, so "w" moves the square toward the
    /// bottom of the window.
    pub fn apply_token(&mut self, token: &str) {
        match token {
            "w" => self.position.y += MOVE_SPEED,
            "s" => self.position.y -= MOVE_SPEED,
            "d" => self.position.x += MOVE_SPEED,
            "a" => self.position.x -= MOVE_SPEED,
            _ => {}
        }
    }

    /// Apply a drained batch of tokens cumulatively.
    pub fn advance<I>(&mut self, tokens: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for token in tokens {
            self.apply_token(token.as_ref());
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_frame_scenario() {
        let mut session = Session::new();
        session.advance(["w", "w", "d"]);
        assert_eq!(session.position, Vec2::new(0.6, 1.2));

        session.advance(Vec::<String>::new());
        assert_eq!(session.position, Vec2::new(0.6, 1.2));

        session.advance(["s", "a", "a"]);
        assert_eq!(session.position, Vec2::new(0.6 - 1.2, 1.2 - 0.6));
    }

    #[test]
    fn unrecognized_tokens_are_no_ops() {
        let mut session = Session::new();
        session.advance(["q", "Shift", "ArrowUp", ""]);
        assert_eq!(session.position, Vec2::ZERO);
    }

    #[test]
    fn repeated_tokens_apply_cumulatively() {
        let mut session = Session::new();
        session.advance(["w", "w", "w"]);
        assert_eq!(session.position.y, 3.0 * MOVE_SPEED);
        assert_eq!(session.position.x, 0.0);
    }

    #[test]
    fn token_order_within_a_frame_does_not_matter() {
        let mut forward = Session::new();
        forward.advance(["w", "s", "d", "a", "w"]);

        let mut shuffled = Session::new();
        shuffled.advance(["a", "w", "w", "d", "s"]);

        assert_eq!(forward.position, shuffled.position);
    }

    #[test]
    fn opposite_tokens_cancel() {
        let mut session = Session::new();
        session.advance(["w", "s", "d", "a"]);
        assert_eq!(session.position, Vec2::ZERO);
    }
}
