//! Quiz session state machine over a fixed, non-empty list of questions.
//!
//! A session is `InProgress` until the last question is answered and the
//! player advances, at which point it is `Finished` with the final score.
//! The first answer to a question is binding; rejected transitions return a
//! [`QuizError`] and leave the session exactly as it was.

use tracing::debug;

use crate::error::QuizError;
use crate::models::QuizQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    InProgress {
        current_index: usize,
        score: usize,
        answered: Option<usize>,
    },
    Finished {
        final_score: usize,
    },
}

impl QuizState {
    const START: QuizState = QuizState::InProgress {
        current_index: 0,
        score: 0,
        answered: None,
    };
}

/// Result of a recorded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    state: QuizState,
}

impl QuizSession {
    /// Start a session. An empty list is rejected: callers render an empty
    /// state instead of a quiz.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        Ok(Self {
            questions,
            state: QuizState::START,
        })
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Sessions are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, QuizState::Finished { .. })
    }

    /// Question on screen, `None` once finished.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            QuizState::InProgress { current_index, .. } => self.questions.get(current_index),
            QuizState::Finished { .. } => None,
        }
    }

    /// Option chosen for the current question, if any.
    pub fn answered(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { answered, .. } => answered,
            QuizState::Finished { .. } => None,
        }
    }

    pub fn score(&self) -> usize {
        match self.state {
            QuizState::InProgress { score, .. } => score,
            QuizState::Finished { final_score } => final_score,
        }
    }

    /// `(position, total)` with a 1-based position; `position == total` once
    /// finished.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.questions.len();
        match self.state {
            QuizState::InProgress { current_index, .. } => (current_index + 1, total),
            QuizState::Finished { .. } => (total, total),
        }
    }

    /// Final percentage, only available once finished.
    pub fn percentage(&self) -> Option<u32> {
        match self.state {
            QuizState::Finished { final_score } => {
                Some(percentage(final_score, self.questions.len()))
            }
            QuizState::InProgress { .. } => None,
        }
    }

    /// Record the answer for the current question.
    pub fn answer(&mut self, selected: usize) -> Result<AnswerOutcome, QuizError> {
        let QuizState::InProgress {
            current_index,
            score,
            answered,
        } = self.state
        else {
            return Err(QuizError::Finished);
        };
        if answered.is_some() {
            return Err(QuizError::AlreadyAnswered);
        }

        let question = &self.questions[current_index];
        if selected >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                index: selected,
                len: question.options.len(),
            });
        }

        let is_correct = selected == question.correct_index;
        let score = if is_correct { score + 1 } else { score };
        self.state = QuizState::InProgress {
            current_index,
            score,
            answered: Some(selected),
        };
        debug!(current_index, selected, is_correct, score, "quiz answer recorded");

        Ok(AnswerOutcome {
            selected,
            correct_index: question.correct_index,
            is_correct,
        })
    }

    /// Move past an answered question, finishing after the last one.
    pub fn advance(&mut self) -> Result<QuizState, QuizError> {
        let QuizState::InProgress {
            current_index,
            score,
            answered,
        } = self.state
        else {
            return Err(QuizError::Finished);
        };
        if answered.is_none() {
            return Err(QuizError::NotAnswered);
        }

        self.state = if current_index + 1 >= self.questions.len() {
            QuizState::Finished { final_score: score }
        } else {
            QuizState::InProgress {
                current_index: current_index + 1,
                score,
                answered: None,
            }
        };
        debug!(state = ?self.state, "quiz advanced");
        Ok(self.state)
    }

    /// Start over on the same questions.
    pub fn restart(&mut self) {
        self.state = QuizState::START;
    }

    /// Swap in a fresh question list and start over, from any state. An empty
    /// list is rejected and the current session is kept.
    pub fn load_new_questions(&mut self, questions: Vec<QuizQuestion>) -> Result<(), QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        self.questions = questions;
        self.state = QuizState::START;
        Ok(())
    }
}

/// `score / total` as a whole percentage, rounding halves up.
pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score * 200 + total) / (total * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct_index: usize) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question: format!("question {id}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index,
            explanation: None,
        }
    }

    fn three_questions() -> QuizSession {
        QuizSession::new(vec![question("a", 0), question("b", 1), question("c", 2)]).unwrap()
    }

    fn play(session: &mut QuizSession, answers: &[usize]) {
        for &selected in answers {
            session.answer(selected).unwrap();
            session.advance().unwrap();
        }
    }

    #[test]
    fn empty_quiz_is_rejected() {
        assert_eq!(QuizSession::new(Vec::new()).unwrap_err(), QuizError::EmptyQuiz);
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let mut session = three_questions();
        play(&mut session, &[0, 1, 2]);
        assert_eq!(session.state(), QuizState::Finished { final_score: 3 });
        assert_eq!(session.percentage(), Some(100));
    }

    #[test]
    fn one_of_three_rounds_down_to_33() {
        let mut session = three_questions();
        play(&mut session, &[0, 0, 0]);
        assert_eq!(session.score(), 1);
        assert_eq!(session.percentage(), Some(33));
    }

    #[test]
    fn two_of_three_rounds_up_to_67() {
        let mut session = three_questions();
        play(&mut session, &[0, 1, 3]);
        assert_eq!(session.score(), 2);
        assert_eq!(session.percentage(), Some(67));
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn first_answer_is_binding() {
        let mut session = three_questions();
        let outcome = session.answer(0).unwrap();
        assert!(outcome.is_correct);

        assert_eq!(session.answer(2), Err(QuizError::AlreadyAnswered));
        assert_eq!(session.answered(), Some(0));
        assert_eq!(session.score(), 1);

        let mut session = three_questions();
        session.answer(3).unwrap();
        assert_eq!(session.answer(0), Err(QuizError::AlreadyAnswered));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = three_questions();
        assert_eq!(session.advance(), Err(QuizError::NotAnswered));
        assert_eq!(session.progress(), (1, 3));
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let mut session = three_questions();
        assert_eq!(
            session.answer(4),
            Err(QuizError::OptionOutOfRange { index: 4, len: 4 })
        );
        assert_eq!(session.answered(), None);
    }

    #[test]
    fn finished_session_rejects_moves() {
        let mut session = three_questions();
        play(&mut session, &[0, 1, 2]);
        assert_eq!(session.answer(0), Err(QuizError::Finished));
        assert_eq!(session.advance(), Err(QuizError::Finished));
        assert!(session.current_question().is_none());
    }

    #[test]
    fn restart_resets_progress() {
        let mut session = three_questions();
        play(&mut session, &[0, 1]);
        session.restart();
        assert_eq!(
            session.state(),
            QuizState::InProgress {
                current_index: 0,
                score: 0,
                answered: None
            }
        );
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn loading_new_questions_resets_mid_session() {
        let mut session = three_questions();
        session.answer(0).unwrap();
        session.load_new_questions(vec![question("x", 3)]).unwrap();

        assert_eq!(session.len(), 1);
        assert_eq!(session.current_question().map(|q| q.id.as_str()), Some("x"));
        assert_eq!(session.score(), 0);
        assert_eq!(session.answered(), None);
    }

    #[test]
    fn loading_empty_list_keeps_session() {
        let mut session = three_questions();
        session.answer(0).unwrap();
        assert_eq!(session.load_new_questions(Vec::new()), Err(QuizError::EmptyQuiz));
        assert_eq!(session.len(), 3);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn percentage_unavailable_while_in_progress() {
        let session = three_questions();
        assert_eq!(session.percentage(), None);
    }
}
