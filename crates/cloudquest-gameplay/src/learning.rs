//! Multi-phase learning session at a station.
//!
//! A session walks one concept through introduction, content pages, an
//! interactive demo, one quiz page per question, a practical exercise and a
//! summary. Advancing past the summary completes the session; cancelling at
//! any point discards it without a completion record.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::education::{self, CloudConcept, QuizQuestion, PASS_PERCENTAGE};
use crate::input::{Action, InputSnapshot};

/// Characters of lesson text per content page.
const CHARS_PER_PAGE: usize = 800;

/// Choices on the practical page.
const PRACTICAL_OPTIONS: usize = 2;

/// Practical option that completes the exercise.
pub const PRACTICAL_COMPLETE: usize = 0;

/// Practical option that skips the exercise.
pub const PRACTICAL_SKIP: usize = 1;

/// Session phases in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningPhase {
    /// Concept overview
    Introduction,
    /// Lesson text pages
    Content,
    /// Interactive demonstration
    Interactive,
    /// One page per quiz question
    Quiz,
    /// Complete or skip the exercise
    Practical,
    /// Results
    Summary,
}

impl LearningPhase {
    /// Fixed progress-bar fraction for the phase.
    #[must_use]
    pub const fn progress(self) -> f32 {
        match self {
            Self::Introduction => 0.1,
            Self::Content => 0.3,
            Self::Interactive => 0.5,
            Self::Quiz => 0.7,
            Self::Practical => 0.9,
            Self::Summary => 1.0,
        }
    }
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCompletion {
    /// Concept studied
    pub concept_id: String,
    /// Correct first answers
    pub quiz_score: u32,
    /// Questions asked
    pub quiz_total: u32,
    /// `100 * score / total`, 0 without questions
    pub quiz_percentage: f32,
    /// Whether the practical was completed
    pub practical_completed: bool,
    /// Quiz at or above the pass mark and practical completed
    pub passed: bool,
    /// Seconds spent in the session
    pub study_time: f32,
}

/// What a frame of input did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum LearningStatus {
    /// Still running
    InProgress,
    /// Advanced past the summary
    Completed(LearningCompletion),
    /// Aborted, nothing recorded
    Cancelled,
}

/// One walk through a concept.
#[derive(Debug, Clone)]
pub struct LearningSession {
    concept: &'static CloudConcept,
    questions: Vec<&'static QuizQuestion>,
    phase: LearningPhase,
    page: usize,
    content_pages: usize,
    total_pages: usize,
    selected: usize,
    answers: Vec<Option<usize>>,
    quiz_score: u32,
    practical_completed: bool,
    elapsed: f32,
}

impl LearningSession {
    /// Starts a session for `concept_id`, or `None` if it is unknown.
    #[must_use]
    pub fn start(concept_id: &str) -> Option<Self> {
        let concept = education::concept(concept_id)?;
        let questions = education::questions_for(concept_id);
        let content_pages = (concept.content.len() / CHARS_PER_PAGE).max(1);
        // Introduction, content, interactive, quiz, practical and summary
        let total_pages = 1 + content_pages + 1 + questions.len() + 1 + 1;
        info!("Learning session started: {}", concept.name);
        Some(Self {
            concept,
            answers: vec![None; questions.len()],
            questions,
            phase: LearningPhase::Introduction,
            page: 0,
            content_pages,
            total_pages,
            selected: 0,
            quiz_score: 0,
            practical_completed: false,
            elapsed: 0.0,
        })
    }

    /// Advances the study clock.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Seconds spent in the session so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Applies one frame of input.
    pub fn handle_input(&mut self, input: &InputSnapshot) -> LearningStatus {
        if input.is_just_pressed(Action::Cancel) {
            info!("Learning session cancelled: {}", self.concept.name);
            return LearningStatus::Cancelled;
        }
        if input.is_just_pressed(Action::MoveUp) {
            self.select_previous();
        }
        if input.is_just_pressed(Action::MoveDown) {
            self.select_next();
        }
        if input.is_just_pressed(Action::Confirm) {
            self.select();
        }
        if input.is_just_pressed(Action::MoveLeft) {
            self.back();
        }
        if input.is_just_pressed(Action::Interact) || input.is_just_pressed(Action::MoveRight) {
            if !self.advance() {
                let completion = self.completion();
                info!(
                    "Learning session finished: {} ({:.0}%, passed: {})",
                    self.concept.name, completion.quiz_percentage, completion.passed
                );
                return LearningStatus::Completed(completion);
            }
        }
        LearningStatus::InProgress
    }

    /// Moves to the next page or phase. Returns false when advancing past
    /// the summary, which ends the session.
    pub fn advance(&mut self) -> bool {
        match self.phase {
            LearningPhase::Introduction => self.enter(LearningPhase::Content, 0),
            LearningPhase::Content => {
                if self.page + 1 < self.content_pages {
                    self.turn_to(self.page + 1);
                } else {
                    self.enter(LearningPhase::Interactive, 0);
                }
            },
            LearningPhase::Interactive => {
                if self.questions.is_empty() {
                    self.enter(LearningPhase::Practical, 0);
                } else {
                    self.enter(LearningPhase::Quiz, 0);
                }
            },
            LearningPhase::Quiz => {
                if self.page + 1 < self.questions.len() {
                    self.turn_to(self.page + 1);
                } else {
                    self.enter(LearningPhase::Practical, 0);
                }
            },
            LearningPhase::Practical => self.enter(LearningPhase::Summary, 0),
            LearningPhase::Summary => return false,
        }
        true
    }

    /// Moves to the previous page or phase.
    pub fn back(&mut self) {
        if self.page > 0 {
            self.turn_to(self.page - 1);
            return;
        }
        match self.phase {
            LearningPhase::Introduction => {},
            LearningPhase::Content => self.enter(LearningPhase::Introduction, 0),
            LearningPhase::Interactive => {
                self.enter(LearningPhase::Content, self.content_pages - 1);
            },
            LearningPhase::Quiz => self.enter(LearningPhase::Interactive, 0),
            LearningPhase::Practical => {
                if self.questions.is_empty() {
                    self.enter(LearningPhase::Interactive, 0);
                } else {
                    self.enter(LearningPhase::Quiz, self.questions.len() - 1);
                }
            },
            LearningPhase::Summary => self.enter(LearningPhase::Practical, 0),
        }
    }

    fn enter(&mut self, phase: LearningPhase, page: usize) {
        debug!("Learning phase {:?} page {page}", phase);
        self.phase = phase;
        self.turn_to(page);
    }

    fn turn_to(&mut self, page: usize) {
        self.page = page;
        self.selected = 0;
    }

    fn option_count(&self) -> usize {
        match self.phase {
            LearningPhase::Quiz => self.current_question().map_or(1, |q| q.options.len()),
            LearningPhase::Practical => PRACTICAL_OPTIONS,
            _ => 1,
        }
    }

    /// Moves the highlighted option down.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1).min(self.option_count().saturating_sub(1));
    }

    /// Moves the highlighted option up.
    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Highlights an option directly.
    pub fn set_selected(&mut self, option: usize) {
        self.selected = option.min(self.option_count().saturating_sub(1));
    }

    /// Confirms the highlighted option. On a quiz page the first answer is
    /// final; on the practical page option 0 completes the exercise.
    pub fn select(&mut self) {
        match self.phase {
            LearningPhase::Quiz => {
                let Some(question) = self.current_question() else {
                    return;
                };
                let Some(slot) = self.answers.get_mut(self.page) else {
                    return;
                };
                if slot.is_some() {
                    debug!("Question {} already answered", self.page + 1);
                    return;
                }
                *slot = Some(self.selected);
                if self.selected == question.correct {
                    self.quiz_score += 1;
                }
            },
            LearningPhase::Practical => {
                if self.selected == PRACTICAL_COMPLETE {
                    self.practical_completed = true;
                }
            },
            _ => {},
        }
    }

    /// Completion record as of now.
    #[must_use]
    pub fn completion(&self) -> LearningCompletion {
        let total = self.questions.len() as u32;
        let quiz_percentage = if total == 0 {
            0.0
        } else {
            self.quiz_score as f32 / total as f32 * 100.0
        };
        LearningCompletion {
            concept_id: self.concept.id.to_string(),
            quiz_score: self.quiz_score,
            quiz_total: total,
            quiz_percentage,
            practical_completed: self.practical_completed,
            passed: quiz_percentage >= PASS_PERCENTAGE && self.practical_completed,
            study_time: self.elapsed,
        }
    }

    /// Concept under study.
    #[must_use]
    pub fn concept(&self) -> &'static CloudConcept {
        self.concept
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LearningPhase {
        self.phase
    }

    /// Page within the phase.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Page count for the whole session.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Progress-bar fraction.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.phase.progress()
    }

    /// Highlighted option.
    #[must_use]
    pub fn selected_option(&self) -> usize {
        self.selected
    }

    /// Correct first answers so far.
    #[must_use]
    pub fn quiz_score(&self) -> u32 {
        self.quiz_score
    }

    /// Recorded answer for quiz page `page`.
    #[must_use]
    pub fn answer(&self, page: usize) -> Option<usize> {
        self.answers.get(page).copied().flatten()
    }

    /// Whether the practical was completed.
    #[must_use]
    pub fn practical_completed(&self) -> bool {
        self.practical_completed
    }

    /// Question on the current quiz page.
    #[must_use]
    pub fn current_question(&self) -> Option<&'static QuizQuestion> {
        if self.phase == LearningPhase::Quiz {
            self.questions.get(self.page).copied()
        } else {
            None
        }
    }

    /// Lesson text for the current content page.
    #[must_use]
    pub fn content_page(&self) -> &'static str {
        if self.phase != LearningPhase::Content {
            return "";
        }
        let text = self.concept.content;
        let chunk = text.len().div_ceil(self.content_pages);
        let start = char_floor(text, self.page * chunk);
        let end = char_floor(text, (self.page + 1) * chunk);
        &text[start..end]
    }
}

fn char_floor(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(action: Action) -> InputSnapshot {
        InputSnapshot::new().with_pressed(action)
    }

    /// Walks to the quiz, answers with `answers`, then handles the practical.
    fn run(answers: &[usize], practical: usize) -> LearningCompletion {
        let mut session = LearningSession::start("ec2_basics").expect("concept");
        while session.phase() != LearningPhase::Quiz {
            assert!(session.advance());
        }
        for &answer in answers {
            session.set_selected(answer);
            session.select();
            session.advance();
        }
        assert_eq!(session.phase(), LearningPhase::Practical);
        session.set_selected(practical);
        session.select();
        session.advance();
        assert_eq!(session.phase(), LearningPhase::Summary);
        match session.handle_input(&press(Action::Interact)) {
            LearningStatus::Completed(completion) => completion,
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_study_clock() {
        let mut session = LearningSession::start("ec2_basics").expect("concept");
        session.tick(0.5);
        session.tick(-1.0);
        session.tick(0.25);
        assert!((session.elapsed() - 0.75).abs() < f32::EPSILON);
        assert!((session.completion().study_time - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_selection_clamps_on_single_option_pages() {
        let mut session = LearningSession::start("ec2_basics").expect("concept");
        session.set_selected(usize::MAX);
        assert_eq!(session.selected_option(), 0);
        session.select_next();
        assert_eq!(session.selected_option(), 0);
    }

    #[test]
    fn test_unknown_concept() {
        assert!(LearningSession::start("quantum_computing").is_none());
    }

    #[test]
    fn test_page_count() {
        let session = LearningSession::start("ec2_basics").expect("concept");
        // Intro, 1 content page, interactive, 3 questions, practical, summary
        assert_eq!(session.total_pages(), 8);
        assert_eq!(session.phase(), LearningPhase::Introduction);
        assert!((session.progress() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_phase_order_and_back() {
        let mut session = LearningSession::start("s3_storage").expect("concept");
        let mut phases = vec![session.phase()];
        while session.advance() {
            if phases.last() != Some(&session.phase()) {
                phases.push(session.phase());
            }
        }
        assert_eq!(
            phases,
            vec![
                LearningPhase::Introduction,
                LearningPhase::Content,
                LearningPhase::Interactive,
                LearningPhase::Quiz,
                LearningPhase::Practical,
                LearningPhase::Summary,
            ]
        );

        session.back();
        assert_eq!(session.phase(), LearningPhase::Practical);
        session.back();
        assert_eq!((session.phase(), session.page()), (LearningPhase::Quiz, 1));
        session.back();
        assert_eq!((session.phase(), session.page()), (LearningPhase::Quiz, 0));
        session.back();
        assert_eq!(session.phase(), LearningPhase::Interactive);
        session.back();
        session.back();
        session.back();
        assert_eq!(session.phase(), LearningPhase::Introduction);
    }

    #[test]
    fn test_perfect_run_passes() {
        let completion = run(&[0, 2, 1], PRACTICAL_COMPLETE);
        assert_eq!(completion.quiz_score, 3);
        assert_eq!(completion.quiz_total, 3);
        assert!((completion.quiz_percentage - 100.0).abs() < f32::EPSILON);
        assert!(completion.practical_completed);
        assert!(completion.passed);
    }

    #[test]
    fn test_low_score_fails() {
        let completion = run(&[0, 0, 0], PRACTICAL_COMPLETE);
        assert_eq!(completion.quiz_score, 1);
        assert!(!completion.passed);
    }

    #[test]
    fn test_skipped_practical_fails() {
        let completion = run(&[0, 2, 1], PRACTICAL_SKIP);
        assert!(!completion.practical_completed);
        assert!(!completion.passed);
    }

    #[test]
    fn test_first_answer_is_final() {
        let mut session = LearningSession::start("ec2_basics").expect("concept");
        while session.phase() != LearningPhase::Quiz {
            session.advance();
        }
        session.set_selected(3);
        session.select();
        session.set_selected(0);
        session.select();
        assert_eq!(session.answer(0), Some(3));
        assert_eq!(session.quiz_score(), 0);
    }

    #[test]
    fn test_selection_clamps() {
        let mut session = LearningSession::start("ec2_basics").expect("concept");
        session.select_next();
        assert_eq!(session.selected_option(), 0);

        while session.phase() != LearningPhase::Practical {
            session.advance();
        }
        session.select_next();
        session.select_next();
        assert_eq!(session.selected_option(), 1);
        session.select_previous();
        session.select_previous();
        assert_eq!(session.selected_option(), 0);
    }

    #[test]
    fn test_cancel_discards() {
        let mut session = LearningSession::start("vpc_networking").expect("concept");
        session.advance();
        assert_eq!(
            session.handle_input(&press(Action::Cancel)),
            LearningStatus::Cancelled
        );
    }

    #[test]
    fn test_input_navigation() {
        let mut session = LearningSession::start("iam_security").expect("concept");
        assert_eq!(
            session.handle_input(&press(Action::MoveRight)),
            LearningStatus::InProgress
        );
        assert_eq!(session.phase(), LearningPhase::Content);
        assert!(!session.content_page().is_empty());
        session.handle_input(&press(Action::MoveLeft));
        assert_eq!(session.phase(), LearningPhase::Introduction);
        assert_eq!(session.content_page(), "");
    }

    #[test]
    fn test_content_pages_cover_text() {
        let session = LearningSession::start("lambda_serverless").expect("concept");
        let mut session = session;
        session.advance();
        assert_eq!(session.content_page(), session.concept().content);
    }
}
