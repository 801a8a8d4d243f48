use super::{ArithmeticResult, GameId, GameModule, SessionResult};
use crate::error::InputError;
use crate::timers::{TimerId, Timers};
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::fmt;
use std::time::{Duration, Instant};

/// How long the correct/wrong banner stays up
pub const FEEDBACK_MS: u64 = 800;

const MAX_INPUT_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn symbol(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '−',
            Operator::Multiply => '×',
            Operator::Divide => '÷',
        }
    }

    /// `None` when the result is not an exact integer
    pub fn apply(&self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Subtract => lhs.checked_sub(rhs),
            Operator::Multiply => lhs.checked_mul(rhs),
            Operator::Divide => {
                if rhs == 0 || lhs % rhs != 0 {
                    None
                } else {
                    Some(lhs / rhs)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
    pub answer: i64,
}

impl Challenge {
    /// Every operator yields a non-negative integer answer
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let op = Operator::ALL[rng.gen_range(0..Operator::ALL.len())];
        let (lhs, rhs, answer) = match op {
            Operator::Add => {
                let a = rng.gen_range(1..=50);
                let b = rng.gen_range(1..=50);
                (a, b, a + b)
            }
            Operator::Subtract => {
                let a = rng.gen_range(2..=50);
                let b = rng.gen_range(1..=a);
                (a, b, a - b)
            }
            Operator::Multiply => {
                let a = rng.gen_range(2..=12);
                let b = rng.gen_range(2..=12);
                (a, b, a * b)
            }
            Operator::Divide => {
                let divisor = rng.gen_range(2..=12);
                let quotient = rng.gen_range(1..=12);
                (divisor * quotient, divisor, quotient)
            }
        };
        Self {
            lhs,
            op,
            rhs,
            answer,
        }
    }

    /// Recomputes the answer from the displayed operands
    pub fn evaluate(&self) -> Option<i64> {
        self.op.apply(self.lhs, self.rhs)
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Wrong { answer: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticTimer {
    ClearFeedback,
}

/// Mental arithmetic drill with streak tracking
#[derive(Debug)]
pub struct ArithmeticGame {
    challenge: Challenge,
    input: String,
    correct: u32,
    total: u32,
    streak: u32,
    best_streak: u32,
    feedback: Option<Feedback>,
    clear_feedback: Option<TimerId>,
    timers: Timers<ArithmeticTimer>,
    rng: StdRng,
    running: bool,
}

impl Default for ArithmeticGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArithmeticGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let challenge = Challenge::generate(&mut rng);
        Self {
            challenge,
            input: String::new(),
            correct: 0,
            total: 0,
            streak: 0,
            best_streak: 0,
            feedback: None,
            clear_feedback: None,
            timers: Timers::new(),
            rng,
            running: false,
        }
    }

    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Checks an answer; the next challenge is generated right away while the
    /// feedback stays visible for [`FEEDBACK_MS`].
    pub fn submit(&mut self, text: &str, now: Instant) -> Result<Feedback, InputError> {
        if !self.running {
            return Err(InputError::NotAccepting);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::Empty);
        }
        let value: i64 = text.parse().map_err(|_| InputError::NotANumber)?;

        self.total += 1;
        let feedback = if value == self.challenge.answer {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            Feedback::Correct
        } else {
            self.streak = 0;
            Feedback::Wrong {
                answer: self.challenge.answer,
            }
        };

        self.show_feedback(feedback, now);
        self.next_challenge();
        Ok(feedback)
    }

    fn show_feedback(&mut self, feedback: Feedback, now: Instant) {
        if let Some(id) = self.clear_feedback.take() {
            self.timers.cancel(id);
        }
        self.feedback = Some(feedback);
        self.clear_feedback = Some(self.timers.schedule_after(
            now,
            Duration::from_millis(FEEDBACK_MS),
            ArithmeticTimer::ClearFeedback,
        ));
    }

    fn next_challenge(&mut self) {
        self.challenge = Challenge::generate(&mut self.rng);
        self.input.clear();
    }
}

impl GameModule for ArithmeticGame {
    fn id(&self) -> GameId {
        GameId::Arithmetic
    }

    fn start(&mut self, _now: Instant) {
        self.timers.cancel_all();
        self.clear_feedback = None;
        self.feedback = None;
        self.correct = 0;
        self.total = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.next_challenge();
        self.running = true;
    }

    fn stop(&mut self, _now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.timers.cancel_all();
        self.clear_feedback = None;

        Some(SessionResult::Arithmetic(ArithmeticResult {
            correct: self.correct,
            total: self.total,
            best_streak: self.best_streak,
        }))
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if !self.running {
            return;
        }
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || (c == '-' && self.input.is_empty()) => {
                if self.input.len() < MAX_INPUT_LEN {
                    self.input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let text = self.input.clone();
                if let Err(err) = self.submit(&text, now) {
                    tracing::debug!("Rejected arithmetic answer {:?}: {}", text, err);
                }
            }
            _ => {}
        }
    }

    fn advance(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        while let Some(timer) = self.timers.pop_due(now) {
            match timer {
                ArithmeticTimer::ClearFeedback => {
                    self.clear_feedback = None;
                    self.feedback = None;
                }
            }
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_arithmetic(self, area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crossterm::event::KeyModifiers;

    fn started(seed: u64) -> (ArithmeticGame, Instant) {
        let mut game = ArithmeticGame::with_rng(StdRng::seed_from_u64(seed));
        let t0 = Instant::now();
        game.start(t0);
        (game, t0)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn generated_challenges_are_exact() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5_000 {
            let c = Challenge::generate(&mut rng);
            assert_eq!(c.evaluate(), Some(c.answer), "{c}");
            assert!(c.answer >= 0, "{c}");
            match c.op {
                Operator::Add => {
                    assert!((1..=50).contains(&c.lhs) && (1..=50).contains(&c.rhs))
                }
                Operator::Subtract => assert!(c.rhs <= c.lhs && c.rhs >= 1),
                Operator::Multiply => {
                    assert!((2..=12).contains(&c.lhs) && (2..=12).contains(&c.rhs))
                }
                Operator::Divide => {
                    assert!((2..=12).contains(&c.rhs));
                    assert_eq!(c.lhs % c.rhs, 0);
                    assert!((1..=12).contains(&c.answer));
                }
            }
        }
    }

    #[test]
    fn all_operators_show_up() {
        let mut rng = StdRng::seed_from_u64(1);
        let ops: Vec<Operator> = (0..200).map(|_| Challenge::generate(&mut rng).op).collect();
        for op in Operator::ALL {
            assert!(ops.contains(&op), "{op:?} never generated");
        }
    }

    #[test]
    fn three_right_one_wrong() {
        let (mut game, t0) = started(3);
        for _ in 0..3 {
            let answer = game.challenge().answer.to_string();
            assert_eq!(game.submit(&answer, t0), Ok(Feedback::Correct));
        }
        let wrong = (game.challenge().answer + 1).to_string();
        assert_matches!(game.submit(&wrong, t0), Ok(Feedback::Wrong { .. }));
        assert_eq!(game.streak(), 0);

        assert_eq!(
            game.stop(t0),
            Some(SessionResult::Arithmetic(ArithmeticResult {
                correct: 3,
                total: 4,
                best_streak: 3,
            }))
        );
    }

    #[test]
    fn wrong_answer_feedback_shows_expected_value() {
        let (mut game, t0) = started(9);
        let expected = game.challenge().answer;
        let feedback = game.submit(&(expected + 1).to_string(), t0).unwrap();
        assert_eq!(feedback, Feedback::Wrong { answer: expected });
    }

    #[test]
    fn invalid_input_is_not_counted() {
        let (mut game, t0) = started(5);
        let before = *game.challenge();

        assert_eq!(game.submit("", t0), Err(InputError::Empty));
        assert_eq!(game.submit("   ", t0), Err(InputError::Empty));
        assert_eq!(game.submit("abc", t0), Err(InputError::NotANumber));

        assert_eq!(game.total(), 0);
        assert_eq!(*game.challenge(), before);
        assert_eq!(game.feedback(), None);
    }

    #[test]
    fn feedback_clears_after_delay_and_challenge_advances_immediately() {
        let (mut game, t0) = started(11);
        let answer = game.challenge().answer.to_string();
        game.submit(&answer, t0).unwrap();
        assert_eq!(game.feedback(), Some(Feedback::Correct));

        game.advance(t0 + Duration::from_millis(FEEDBACK_MS - 1));
        assert_eq!(game.feedback(), Some(Feedback::Correct));

        game.advance(t0 + Duration::from_millis(FEEDBACK_MS));
        assert_eq!(game.feedback(), None);
    }

    #[test]
    fn newer_feedback_is_not_cleared_by_older_timer() {
        let (mut game, t0) = started(12);
        let answer = game.challenge().answer.to_string();
        game.submit(&answer, t0).unwrap();

        let later = t0 + Duration::from_millis(600);
        let wrong = (game.challenge().answer + 1).to_string();
        game.submit(&wrong, later).unwrap();

        game.advance(t0 + Duration::from_millis(FEEDBACK_MS));
        assert_matches!(game.feedback(), Some(Feedback::Wrong { .. }));
    }

    #[test]
    fn keys_edit_and_submit_answer() {
        let (mut game, t0) = started(21);
        let answer = game.challenge().answer.to_string();

        game.handle_key(key(KeyCode::Char('x')), t0);
        game.handle_key(key(KeyCode::Char('9')), t0);
        game.handle_key(key(KeyCode::Backspace), t0);
        for c in answer.chars() {
            game.handle_key(key(KeyCode::Char(c)), t0);
        }
        assert_eq!(game.input(), answer);

        game.handle_key(key(KeyCode::Enter), t0);
        assert_eq!(game.correct(), 1);
        assert_eq!(game.input(), "");
    }

    #[test]
    fn enter_on_empty_buffer_counts_nothing() {
        let (mut game, t0) = started(22);
        game.handle_key(key(KeyCode::Enter), t0);
        assert_eq!(game.total(), 0);
    }

    #[test]
    fn stopped_game_ignores_input() {
        let (mut game, t0) = started(8);
        game.stop(t0);
        assert_eq!(game.submit("1", t0), Err(InputError::NotAccepting));
        assert_eq!(game.stop(t0), None);
    }

    #[test]
    fn restart_resets_counters() {
        let (mut game, t0) = started(2);
        let answer = game.challenge().answer.to_string();
        game.submit(&answer, t0).unwrap();
        game.stop(t0);
        game.start(t0);

        assert_eq!(
            (game.correct(), game.total(), game.best_streak()),
            (0, 0, 0)
        );
        assert_eq!(game.feedback(), None);
    }
}
