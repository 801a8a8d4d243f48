use super::{GameId, GameModule, SessionResult, TypingResult};
use crate::corpus::Corpus;
use crate::error::InputError;
use crate::util::round_u32;
use crossterm::event::{KeyCode, KeyEvent};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use ratatui::{buffer::Buffer, layout::Rect};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

pub const SENTENCE_WORDS: RangeInclusive<usize> = 5..=12;

/// Presses of the advance key this soon after finishing a sentence are ignored,
/// so the keystroke that completed it cannot also skip the result screen
pub const ADVANCE_COOLDOWN_MS: u64 = 100;

/// Below this much elapsed time WPM reads as zero instead of spiking
const MIN_WPM_MINUTES: f64 = 0.01;

/// Words-per-minute typing test over a short random sentence
#[derive(Debug)]
pub struct TypingGame {
    corpus: Corpus,
    words: Vec<String>,
    results: Vec<bool>,
    index: usize,
    correct_words: u32,
    attempted: u32,
    correct_chars: u32,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    sentences_completed: u32,
    input: String,
    rng: StdRng,
    running: bool,
}

impl TypingGame {
    pub fn new(corpus: Corpus) -> Self {
        Self::with_rng(corpus, StdRng::from_entropy())
    }

    pub fn with_rng(corpus: Corpus, rng: StdRng) -> Self {
        let mut game = Self {
            corpus,
            words: Vec::new(),
            results: Vec::new(),
            index: 0,
            correct_words: 0,
            attempted: 0,
            correct_chars: 0,
            started_at: None,
            finished_at: None,
            sentences_completed: 0,
            input: String::new(),
            rng,
            running: false,
        };
        game.generate_sentence();
        game
    }

    fn generate_sentence(&mut self) {
        let len = self
            .rng
            .gen_range(SENTENCE_WORDS)
            .min(self.corpus.words.len());
        let mut words: Vec<String> = self
            .corpus
            .words
            .choose_multiple(&mut self.rng, len)
            .cloned()
            .collect();
        words.shuffle(&mut self.rng);

        self.words = words;
        self.results.clear();
        self.index = 0;
        self.correct_words = 0;
        self.attempted = 0;
        self.correct_chars = 0;
        self.started_at = None;
        self.finished_at = None;
        self.input.clear();
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Per submitted word, whether it matched
    pub fn results(&self) -> &[bool] {
        &self.results
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn expected_word(&self) -> Option<&str> {
        self.words.get(self.index).map(String::as_str)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_done(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn sentences_completed(&self) -> u32 {
        self.sentences_completed
    }

    pub fn correct_words(&self) -> u32 {
        self.correct_words
    }

    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    /// Exact match only. Every accepted submission moves to the next word.
    pub fn submit_word(&mut self, token: &str, now: Instant) -> Result<bool, InputError> {
        if !self.running || self.is_done() {
            return Err(InputError::NotAccepting);
        }
        let typed = token.trim();
        if typed.is_empty() {
            return Err(InputError::Empty);
        }
        let Some(expected) = self.words.get(self.index) else {
            return Err(InputError::NotAccepting);
        };

        self.started_at.get_or_insert(now);
        self.attempted += 1;
        let correct = typed == expected.as_str();
        if correct {
            self.correct_words += 1;
            // the trailing space counts towards throughput
            self.correct_chars += expected.chars().count() as u32 + 1;
        }
        self.results.push(correct);
        self.index += 1;
        self.input.clear();

        if self.index >= self.words.len() {
            self.finished_at = Some(now);
            self.sentences_completed += 1;
        }
        Ok(correct)
    }

    /// Starts a new sentence once the current one is finished and the cooldown has passed
    pub fn next_sentence(&mut self, now: Instant) -> bool {
        let Some(finished_at) = self.finished_at else {
            return false;
        };
        if !self.running
            || now.saturating_duration_since(finished_at)
                < Duration::from_millis(ADVANCE_COOLDOWN_MS)
        {
            return false;
        }
        self.generate_sentence();
        true
    }

    /// Measured from the first submission to `now`, or to completion once done
    pub fn words_per_minute(&self, now: Instant) -> f64 {
        let Some(started_at) = self.started_at else {
            return 0.0;
        };
        if self.correct_chars == 0 {
            return 0.0;
        }
        let end = self.finished_at.unwrap_or(now);
        let minutes = end.saturating_duration_since(started_at).as_secs_f64() / 60.0;
        if minutes < MIN_WPM_MINUTES {
            return 0.0;
        }
        (self.correct_chars as f64 / 5.0) / minutes
    }

    pub fn accuracy(&self) -> f64 {
        if self.attempted == 0 {
            100.0
        } else {
            self.correct_words as f64 / self.attempted as f64 * 100.0
        }
    }
}

impl GameModule for TypingGame {
    fn id(&self) -> GameId {
        GameId::Typing
    }

    fn start(&mut self, _now: Instant) {
        self.sentences_completed = 0;
        self.generate_sentence();
        self.running = true;
    }

    fn stop(&mut self, now: Instant) -> Option<SessionResult> {
        if !self.running {
            return None;
        }
        self.running = false;

        Some(SessionResult::Typing(TypingResult {
            words_per_minute: round_u32(self.words_per_minute(now)),
            accuracy_percent: round_u32(self.accuracy()),
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
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.is_done() {
                    self.next_sentence(now);
                } else {
                    let typed = self.input.clone();
                    if let Err(err) = self.submit_word(&typed, now) {
                        tracing::trace!("Ignored word submission: {}", err);
                    }
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !self.is_done() => self.input.push(c),
            _ => {}
        }
    }

    fn advance(&mut self, _now: Instant) {}

    fn render(&self, area: Rect, buf: &mut Buffer) {
        crate::ui::games::render_typing(self, area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn started(seed: u64) -> (TypingGame, Instant) {
        let corpus = Corpus::builtin().unwrap();
        let mut game = TypingGame::with_rng(corpus, StdRng::seed_from_u64(seed));
        let t0 = Instant::now();
        game.start(t0);
        (game, t0)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn sentence_length_within_bounds_and_from_corpus() {
        let corpus = Corpus::builtin().unwrap();
        for seed in 0..50 {
            let (game, _) = started(seed);
            assert!(SENTENCE_WORDS.contains(&game.words().len()));
            assert!(game.words().iter().all(|w| corpus.words.contains(w)));
        }
    }

    #[test]
    fn wpm_zero_and_accuracy_hundred_before_input() {
        let (game, t0) = started(1);
        assert_eq!(game.words_per_minute(t0 + ms(60_000)), 0.0);
        assert_eq!(game.accuracy(), 100.0);
    }

    #[test]
    fn empty_submission_is_rejected_without_counting() {
        let (mut game, t0) = started(2);
        assert_eq!(game.submit_word("  ", t0), Err(InputError::Empty));
        assert_eq!(game.attempted(), 0);
        assert_eq!(game.current_index(), 0);
    }

    #[test]
    fn wrong_word_still_advances() {
        let (mut game, t0) = started(3);
        assert_eq!(game.submit_word("zzzz", t0), Ok(false));
        assert_eq!(game.current_index(), 1);
        assert_eq!(game.attempted(), 1);
        assert_eq!(game.correct_words(), 0);
        assert_eq!(game.results(), &[false]);
    }

    #[test]
    fn wpm_counts_correct_chars_plus_space() {
        let corpus = Corpus::from_words(
            "fixed",
            ["abcd"; 12].iter().copied(),
        )
        .unwrap();
        let mut game = TypingGame::with_rng(corpus, StdRng::seed_from_u64(4));
        let t0 = Instant::now();
        game.start(t0);

        game.submit_word("abcd", t0).unwrap();
        game.submit_word("abcd", t0 + ms(6_000)).unwrap();
        // 10 chars = 2 words in 0.1 minutes
        let wpm = game.words_per_minute(t0 + ms(6_000));
        assert!((wpm - 20.0).abs() < 1e-9, "wpm was {wpm}");
    }

    #[test]
    fn wpm_freezes_at_completion() {
        let (mut game, t0) = started(5);
        let words = game.words().to_vec();
        for (i, w) in words.iter().enumerate() {
            game.submit_word(w, t0 + ms(1_000 * i as u64)).unwrap();
        }
        assert!(game.is_done());
        let at_done = game.words_per_minute(t0 + ms(1_000 * words.len() as u64));
        let later = game.words_per_minute(t0 + ms(600_000));
        assert_eq!(at_done, later);
        assert!(at_done > 0.0);
    }

    #[test]
    fn finishing_sentence_enters_done_once() {
        let (mut game, t0) = started(6);
        let words = game.words().to_vec();
        for w in &words[..words.len() - 1] {
            game.submit_word(w, t0).unwrap();
        }
        assert_eq!(game.submit_word("nope", t0), Ok(false));

        assert!(game.is_done());
        assert_eq!(game.sentences_completed(), 1);
        assert_eq!(
            game.submit_word("more", t0),
            Err(InputError::NotAccepting)
        );
        assert_eq!(game.sentences_completed(), 1);

        let expected_accuracy =
            round_u32((words.len() - 1) as f64 / words.len() as f64 * 100.0);
        match game.stop(t0 + ms(1_000)) {
            Some(SessionResult::Typing(result)) => {
                assert_eq!(result.accuracy_percent, expected_accuracy)
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn advance_is_debounced_after_completion() {
        let (mut game, t0) = started(7);
        let words = game.words().to_vec();
        for w in &words {
            game.submit_word(w, t0).unwrap();
        }

        assert!(!game.next_sentence(t0 + ms(ADVANCE_COOLDOWN_MS - 1)));
        assert!(game.is_done());
        assert!(game.next_sentence(t0 + ms(ADVANCE_COOLDOWN_MS)));
        assert!(!game.is_done());
        assert_eq!(game.attempted(), 0);
        assert_eq!(game.current_index(), 0);
    }

    #[test]
    fn next_sentence_requires_done() {
        let (mut game, t0) = started(8);
        assert!(!game.next_sentence(t0 + ms(10_000)));
    }

    #[test]
    fn keystrokes_type_and_submit() {
        let (mut game, t0) = started(9);
        let first = game.words()[0].clone();
        for c in first.chars() {
            game.handle_key(key(KeyCode::Char(c)), t0);
        }
        assert_eq!(game.input(), first);
        game.handle_key(key(KeyCode::Char(' ')), t0);

        assert_eq!(game.results(), &[true]);
        assert_eq!(game.input(), "");

        // space on an empty buffer is not an attempt
        game.handle_key(key(KeyCode::Char(' ')), t0);
        assert_eq!(game.attempted(), 1);
    }

    #[test]
    fn completing_key_does_not_skip_results() {
        let (mut game, t0) = started(10);
        let words = game.words().to_vec();
        for w in &words {
            for c in w.chars() {
                game.handle_key(key(KeyCode::Char(c)), t0);
            }
            game.handle_key(key(KeyCode::Enter), t0);
        }
        assert!(game.is_done());

        // the same key repeated straight away is swallowed
        game.handle_key(key(KeyCode::Enter), t0 + ms(20));
        assert!(game.is_done());

        game.handle_key(key(KeyCode::Enter), t0 + ms(500));
        assert!(!game.is_done());
    }

    #[test]
    fn stop_reports_defaults_without_input() {
        let (mut game, t0) = started(11);
        assert_eq!(
            game.stop(t0),
            Some(SessionResult::Typing(TypingResult {
                words_per_minute: 0,
                accuracy_percent: 100,
            }))
        );
        assert_eq!(game.stop(t0), None);
    }
}
