use log::{debug, error, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::bank::{Question, QuestionBank};
use crate::scoring::ScoringMode;
use crate::timer::{QuestionTimer, TimerTick};

pub const DEFAULT_ROUND_SIZE: usize = 20;
pub const DEFAULT_SECS_PER_QUESTION: u64 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Questions per round; a smaller bank plays in full
    pub round_size: usize,
    pub time_per_question: Duration,
    pub scoring: ScoringMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            round_size: DEFAULT_ROUND_SIZE,
            time_per_question: Duration::from_secs(DEFAULT_SECS_PER_QUESTION),
            scoring: ScoringMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Running,
    Finished,
}

/// Where the current question is in its answer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Armed,
    Answered,
    TimedOut,
    Revealed,
}

/// How a question was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Answered { chosen: usize },
    TimedOut,
}

/// Everything a host needs to render the reveal of one question
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub question_id: i64,
    pub resolution: Resolution,
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
    pub points_awarded: u32,
}

impl Feedback {
    pub fn chosen(&self) -> Option<usize> {
        match self.resolution {
            Resolution::Answered { chosen } => Some(chosen),
            Resolution::TimedOut => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.resolution == Resolution::TimedOut
    }
}

/// Notifications for fire-and-forget collaborators such as sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Click,
    Correct,
    Wrong,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session is finished")]
    Finished,
    /// A second answer or a late timeout for an already resolved question
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("cannot advance before the answer is revealed")]
    NotRevealed,
}

/// One play-through of a shuffled round drawn from a shared bank.
///
/// The session is pulled: hosts call an operation, then read the accessors
/// to re-render. Input and timer ticks race only in the sense that either
/// may arrive first; whichever resolves the question first wins and the
/// other becomes a no-op until `advance` arms the next question.
#[derive(Debug)]
pub struct QuizSession {
    bank: Arc<QuestionBank>,
    settings: SessionSettings,
    phase: SessionPhase,
    play_order: Vec<usize>,
    cursor: usize,
    score: u32,
    answer_state: AnswerState,
    resolved: bool,
    timer: QuestionTimer,
    last_feedback: Option<Feedback>,
    history: Vec<Feedback>,
    events: Vec<SessionEvent>,
}

impl QuizSession {
    pub fn new(bank: Arc<QuestionBank>, settings: SessionSettings) -> Self {
        let timer = QuestionTimer::new(settings.time_per_question);
        Self {
            bank,
            settings,
            phase: SessionPhase::NotStarted,
            play_order: Vec::new(),
            cursor: 0,
            score: 0,
            answer_state: AnswerState::Armed,
            resolved: false,
            timer,
            last_feedback: None,
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Create a session and immediately begin a round
    pub fn start(bank: Arc<QuestionBank>, settings: SessionSettings) -> Self {
        let mut session = Self::new(bank, settings);
        session.restart();
        session
    }

    pub fn restart(&mut self) {
        self.restart_with_rng(&mut rand::thread_rng());
    }

    /// Begin a fresh round: new order, zeroed score, first question armed.
    pub fn restart_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.timer.stop();

        let mut order: Vec<usize> = (0..self.bank.size()).collect();
        order.shuffle(rng);
        order.truncate(self.settings.round_size.min(self.bank.size()));

        self.play_order = order;
        self.cursor = 0;
        self.score = 0;
        self.last_feedback = None;
        self.history.clear();
        self.events.clear();

        if self.play_order.is_empty() {
            self.phase = SessionPhase::Finished;
            self.answer_state = AnswerState::Revealed;
            self.resolved = true;
            info!("round started with no questions; finished immediately");
            return;
        }

        self.phase = SessionPhase::Running;
        info!(
            "round started: {} of {} questions, {}s per question",
            self.play_order.len(),
            self.bank.size(),
            self.settings.time_per_question.as_secs()
        );
        self.arm();
    }

    fn arm(&mut self) {
        self.answer_state = AnswerState::Armed;
        self.resolved = false;
        self.last_feedback = None;
        self.timer.start();
        debug!(
            "armed question {}/{}",
            self.current_index_1_based(),
            self.total_questions()
        );
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Running => Ok(()),
            SessionPhase::NotStarted => Err(SessionError::NotStarted),
            SessionPhase::Finished => Err(SessionError::Finished),
        }
    }

    /// Resolve the current question with the user's choice.
    ///
    /// Out-of-range choices are simply wrong. Returns `AlreadyAnswered` with
    /// no state change once the question has been resolved.
    pub fn select_answer(&mut self, chosen: usize) -> Result<Feedback, SessionError> {
        self.ensure_running()?;
        if self.resolved {
            debug!("ignoring answer {chosen}: question already resolved");
            return Err(SessionError::AlreadyAnswered);
        }
        self.resolved = true;
        self.timer.stop();
        self.answer_state = AnswerState::Answered;
        self.events.push(SessionEvent::Click);

        let bank = Arc::clone(&self.bank);
        let question = bank.at(self.play_order[self.cursor]);
        let correct = question.is_correct(chosen);
        let points = if correct {
            self.settings.scoring.points_for(question)
        } else {
            0
        };
        self.score = self.score.saturating_add(points);
        self.events.push(if correct {
            SessionEvent::Correct
        } else {
            SessionEvent::Wrong
        });
        debug!(
            "question {} answered with {chosen}: correct={correct} points={points}",
            question.id
        );

        Ok(self.reveal(question, Resolution::Answered { chosen }, correct, points))
    }

    /// The timer ran out. Never awards points.
    pub fn on_timer_expired(&mut self) -> Result<Feedback, SessionError> {
        self.ensure_running()?;
        if self.resolved {
            debug!("ignoring timeout: question already resolved");
            return Err(SessionError::AlreadyAnswered);
        }
        self.resolved = true;
        self.timer.stop();
        self.answer_state = AnswerState::TimedOut;
        self.events.push(SessionEvent::Timeout);

        let bank = Arc::clone(&self.bank);
        let question = bank.at(self.play_order[self.cursor]);
        debug!("question {} timed out", question.id);

        Ok(self.reveal(question, Resolution::TimedOut, false, 0))
    }

    fn reveal(
        &mut self,
        question: &Question,
        resolution: Resolution,
        correct: bool,
        points_awarded: u32,
    ) -> Feedback {
        let feedback = Feedback {
            question_id: question.id,
            resolution,
            correct,
            correct_index: question.correct_option_index,
            explanation: question.explanation.clone(),
            points_awarded,
        };
        self.answer_state = AnswerState::Revealed;
        self.history.push(feedback.clone());
        self.last_feedback = Some(feedback.clone());
        feedback
    }

    /// Feed elapsed host time to the countdown. Returns the timeout feedback
    /// on the tick that drains it.
    pub fn on_tick(&mut self, elapsed: Duration) -> Option<Feedback> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        match self.timer.tick(elapsed) {
            TimerTick::Expired => self.on_timer_expired().ok(),
            TimerTick::Running | TimerTick::Idle => None,
        }
    }

    /// Move past a revealed question. Calling it at any other time is a
    /// host bug; it is rejected without touching state.
    pub fn advance(&mut self) -> Result<SessionPhase, SessionError> {
        if let Err(e) = self.ensure_running() {
            error!("advance called in phase {:?}", self.phase);
            return Err(e);
        }
        if self.answer_state != AnswerState::Revealed {
            error!("advance called while {:?}", self.answer_state);
            return Err(SessionError::NotRevealed);
        }

        self.timer.stop();
        self.cursor += 1;
        if self.cursor >= self.play_order.len() {
            self.phase = SessionPhase::Finished;
            info!(
                "round finished: score {} ({} correct, {} timed out)",
                self.score,
                self.correct_count(),
                self.timeout_count()
            );
        } else {
            self.arm();
        }
        Ok(self.phase)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.play_order.get(self.cursor).map(|&i| self.bank.at(i))
    }

    /// Progress position; stays at the total once finished
    pub fn current_index_1_based(&self) -> usize {
        (self.cursor + 1).min(self.play_order.len())
    }

    pub fn total_questions(&self) -> usize {
        self.play_order.len()
    }

    pub fn current_score(&self) -> u32 {
        self.score
    }

    /// Whole seconds left on the current question
    pub fn time_remaining(&self) -> u64 {
        self.timer.seconds_remaining()
    }

    pub fn time_fraction_remaining(&self) -> f64 {
        self.timer.fraction_remaining()
    }

    pub fn answer_state(&self) -> AnswerState {
        self.answer_state
    }

    pub fn play_order(&self) -> &[usize] {
        &self.play_order
    }

    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.last_feedback.as_ref()
    }

    pub fn history(&self) -> &[Feedback] {
        &self.history
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn correct_count(&self) -> usize {
        self.history.iter().filter(|f| f.correct).count()
    }

    pub fn timeout_count(&self) -> usize {
        self.history.iter().filter(|f| f.timed_out()).count()
    }

    pub fn points_for_current(&self) -> Option<u32> {
        self.current_question()
            .map(|q| self.settings.scoring.points_for(q))
    }

    /// Best possible score for this round
    pub fn max_score(&self) -> u32 {
        self.play_order
            .iter()
            .map(|&i| self.settings.scoring.points_for(self.bank.at(i)))
            .fold(0, u32::saturating_add)
    }

    /// Take the events raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.timer.stop();
    }
}
