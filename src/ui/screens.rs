use std::cmp::Reverse;

use crate::error::QuizError;
use crate::genai::Playback;
use crate::jobs::PendingSlot;
use crate::models::{Article, ContentItem, ContentKind, Prayer, PrayerRequest, QuizQuestion, Study};
use crate::quiz::{AnswerOutcome, QuizSession};

use super::forms::PromptForm;

/// Move `selected` by `offset` inside `0..len`, clamping at both ends.
pub(crate) fn step_index(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as isize - 1;
    (selected as isize + offset).clamp(0, max) as usize
}

/// Entries of the home menu, in display order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Destination {
    Studies,
    Quiz,
    Prayers,
    Articles,
    Community,
    Admin,
}

impl Destination {
    /// Every destination in the order the home menu lists them.
    pub(crate) const MENU: [Destination; 6] = [
        Destination::Studies,
        Destination::Quiz,
        Destination::Prayers,
        Destination::Articles,
        Destination::Community,
        Destination::Admin,
    ];

    /// Menu entry and screen title.
    pub(crate) fn title(self) -> &'static str {
        match self {
            Destination::Studies => "Studies",
            Destination::Quiz => "Quiz",
            Destination::Prayers => "Prayers",
            Destination::Articles => "Articles",
            Destination::Community => "Prayer Wall",
            Destination::Admin => "Content Admin",
        }
    }

    /// One-line blurb shown next to the title.
    pub(crate) fn description(self) -> &'static str {
        match self {
            Destination::Studies => "Dive into the Word",
            Destination::Quiz => "Test your knowledge",
            Destination::Prayers => "Talk with God",
            Destination::Articles => "Reflections",
            Destination::Community => "Pray for one another",
            Destination::Admin => "Curate and generate content",
        }
    }
}

/// Landing menu.
#[derive(Default)]
pub(crate) struct HomeScreen {
    /// Index into `Destination::MENU`.
    pub(crate) selected: usize,
}

impl HomeScreen {
    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, Destination::MENU.len(), offset);
    }

    /// Destination under the cursor.
    pub(crate) fn current(&self) -> Destination {
        Destination::MENU[self.selected.min(Destination::MENU.len() - 1)]
    }
}

/// Outcome of an AI request as shown in a panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum Generated {
    /// Nothing requested, or the request is still running.
    #[default]
    Idle,
    Ready(String),
    /// The service gave nothing back.
    Failed,
}

/// Guided journey over the first studies.
pub(crate) struct StudiesScreen {
    /// Journey steps in stored order.
    pub(crate) studies: Vec<Study>,
    pub(crate) step: usize,
    /// Vertical scroll of the study body.
    pub(crate) scroll: u16,
    /// AI insight for the current step.
    pub(crate) insight: Generated,
    /// Insight request in flight.
    pub(crate) slot: PendingSlot,
}

impl StudiesScreen {
    /// Keep only the first `journey_len` studies.
    pub(crate) fn new(mut studies: Vec<Study>, journey_len: usize) -> Self {
        studies.truncate(journey_len);
        Self {
            studies,
            step: 0,
            scroll: 0,
            insight: Generated::Idle,
            slot: PendingSlot::default(),
        }
    }

    /// Study of the current step.
    pub(crate) fn current(&self) -> Option<&Study> {
        self.studies.get(self.step)
    }

    /// Jump to a step. Any insight for the previous step is discarded,
    /// including one still on its way.
    pub(crate) fn select_step(&mut self, step: usize) {
        if step >= self.studies.len() || step == self.step {
            return;
        }
        self.step = step;
        self.scroll = 0;
        self.insight = Generated::Idle;
        self.slot.cancel();
    }

    /// Step forward or back, clamped to the journey.
    pub(crate) fn move_step(&mut self, offset: isize) {
        self.select_step(step_index(self.step, self.studies.len(), offset));
    }

    pub(crate) fn scroll_by(&mut self, offset: i16) {
        self.scroll = self.scroll.saturating_add_signed(offset);
    }
}

/// Articles, newest first.
pub(crate) struct ArticlesScreen {
    pub(crate) articles: Vec<Article>,
    pub(crate) selected: usize,
    /// Full-text reader is open for the selected article.
    pub(crate) reading: bool,
    /// Vertical scroll inside the reader.
    pub(crate) scroll: u16,
}

impl ArticlesScreen {
    /// Sorts by timestamp, newest first.
    pub(crate) fn new(mut articles: Vec<Article>) -> Self {
        articles.sort_by_key(|article| Reverse(article.timestamp));
        Self {
            articles,
            selected: 0,
            reading: false,
            scroll: 0,
        }
    }

    /// Article under the cursor.
    pub(crate) fn current_article(&self) -> Option<&Article> {
        self.articles.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.articles.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.articles.len().saturating_sub(1);
    }
}

/// Prayer list with read-aloud.
pub(crate) struct PrayersScreen {
    pub(crate) prayers: Vec<Prayer>,
    pub(crate) selected: usize,
    /// Prayer whose speech is being synthesized.
    pub(crate) listening: Option<String>,
    /// Prayer being read aloud and its playback. Replacing it stops the old
    /// audio.
    pub(crate) playing: Option<(String, Playback)>,
    /// Speech request in flight.
    pub(crate) slot: PendingSlot,
}

impl PrayersScreen {
    pub(crate) fn new(prayers: Vec<Prayer>) -> Self {
        Self {
            prayers,
            selected: 0,
            listening: None,
            playing: None,
            slot: PendingSlot::default(),
        }
    }

    /// Prayer under the cursor.
    pub(crate) fn current_prayer(&self) -> Option<&Prayer> {
        self.prayers.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.prayers.len(), offset);
    }

    /// Speech for `id` is being prepared.
    pub(crate) fn is_preparing(&self, id: &str) -> bool {
        self.listening.as_deref() == Some(id)
    }

    /// Speech for `id` is still coming out of the speakers.
    pub(crate) fn is_playing(&self, id: &str) -> bool {
        matches!(
            &self.playing,
            Some((playing_id, playback)) if playing_id == id && playback.is_playing()
        )
    }

    /// Start tracking new playback for `id`, stopping whatever played before.
    pub(crate) fn start_playback(&mut self, id: String, playback: Playback) {
        self.stop_playback();
        self.playing = Some((id, playback));
    }

    /// Drop the pending speech request and silence current playback.
    pub(crate) fn stop_listening(&mut self) {
        self.listening = None;
        self.slot.cancel();
        self.stop_playback();
    }

    fn stop_playback(&mut self) {
        if let Some((_, mut playback)) = self.playing.take() {
            playback.stop();
        }
    }
}

/// Quiz view. `session` is `None` when there are no questions to play.
pub(crate) struct QuizScreen {
    pub(crate) session: Option<QuizSession>,
    /// Highlighted option of the current question.
    pub(crate) cursor: usize,
    /// Feedback for the answer just given, cleared on advance.
    pub(crate) outcome: Option<AnswerOutcome>,
    /// Topic of the quiz being generated.
    pub(crate) generating: Option<String>,
    pub(crate) slot: PendingSlot,
}

impl QuizScreen {
    pub(crate) fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            session: QuizSession::new(questions).ok(),
            cursor: 0,
            outcome: None,
            generating: None,
            slot: PendingSlot::default(),
        }
    }

    /// Options offered by the current question, zero when finished.
    pub(crate) fn option_count(&self) -> usize {
        self.session
            .as_ref()
            .and_then(QuizSession::current_question)
            .map_or(0, |question| question.options.len())
    }

    pub(crate) fn move_cursor(&mut self, offset: isize) {
        self.cursor = step_index(self.cursor, self.option_count(), offset);
    }

    /// Lock in an answer and remember its outcome for display.
    pub(crate) fn answer(&mut self, selected: usize) -> Result<AnswerOutcome, QuizError> {
        let session = self.session.as_mut().ok_or(QuizError::EmptyQuiz)?;
        let outcome = session.answer(selected)?;
        self.cursor = selected;
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    /// Move to the next question or the results.
    pub(crate) fn advance(&mut self) -> Result<(), QuizError> {
        let session = self.session.as_mut().ok_or(QuizError::EmptyQuiz)?;
        session.advance()?;
        self.cursor = 0;
        self.outcome = None;
        Ok(())
    }

    /// Replay the same questions from the start.
    pub(crate) fn restart(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.restart();
        }
        self.cursor = 0;
        self.outcome = None;
    }

    /// Replace the questions and start over. An empty list keeps whatever is
    /// being played.
    pub(crate) fn load(&mut self, questions: Vec<QuizQuestion>) -> Result<(), QuizError> {
        match self.session.as_mut() {
            Some(session) => session.load_new_questions(questions)?,
            None => self.session = Some(QuizSession::new(questions)?),
        }
        self.cursor = 0;
        self.outcome = None;
        Ok(())
    }
}

/// Community prayer board.
pub(crate) struct CommunityScreen {
    /// Board contents, newest first.
    pub(crate) requests: Vec<PrayerRequest>,
    pub(crate) selected: usize,
}

impl CommunityScreen {
    pub(crate) fn new(requests: Vec<PrayerRequest>) -> Self {
        Self {
            requests,
            selected: 0,
        }
    }

    /// Request under the cursor.
    pub(crate) fn current_request(&self) -> Option<&PrayerRequest> {
        self.requests.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.requests.len(), offset);
    }

    /// Replace the board contents, keeping `focus_id` selected when present.
    pub(crate) fn set_requests(&mut self, requests: Vec<PrayerRequest>, focus_id: Option<&str>) {
        self.requests = requests;
        if let Some(index) =
            focus_id.and_then(|id| self.requests.iter().position(|request| request.id == id))
        {
            self.selected = index;
        }
        self.ensure_in_bounds();
    }

    /// Clamp the selection after the board shrank.
    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.requests.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.requests.len() {
            self.selected = self.requests.len() - 1;
        }
    }
}

/// Content curation with one tab per collection.
pub(crate) struct AdminScreen {
    /// Index into `ContentKind::ALL`.
    pub(crate) tab: usize,
    /// Records of the current tab.
    pub(crate) items: Vec<ContentItem>,
    pub(crate) selected: usize,
    /// Topic of the AI request in flight.
    pub(crate) generating: Option<String>,
    pub(crate) slot: PendingSlot,
}

impl AdminScreen {
    pub(crate) fn new(items: Vec<ContentItem>) -> Self {
        Self {
            tab: 0,
            items,
            selected: 0,
            generating: None,
            slot: PendingSlot::default(),
        }
    }

    /// Collection shown by the current tab.
    pub(crate) fn kind(&self) -> ContentKind {
        ContentKind::ALL[self.tab % ContentKind::ALL.len()]
    }

    /// Switch tab. A pending generation belongs to the old tab and is dropped.
    pub(crate) fn shift_tab(&mut self, offset: isize) {
        let len = ContentKind::ALL.len() as isize;
        self.tab = (self.tab as isize + offset).rem_euclid(len) as usize;
        self.selected = 0;
        self.generating = None;
        self.slot.cancel();
    }

    /// Record under the cursor.
    pub(crate) fn current_item(&self) -> Option<&ContentItem> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.items.len(), offset);
    }

    /// Replace the tab's records after a re-read, keeping the cursor in range.
    pub(crate) fn set_items(&mut self, items: Vec<ContentItem>) {
        self.items = items;
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
    }

    /// AI quick-create is offered for these tabs only.
    pub(crate) fn supports_generation(&self) -> bool {
        matches!(self.kind(), ContentKind::Quiz | ContentKind::Prayer)
    }
}

/// Mentor overlay: ask a question, wait, read the answer.
pub(crate) struct MentorState {
    pub(crate) prompt: PromptForm,
    /// Question last sent, shown above the answer.
    pub(crate) asked: Option<String>,
    pub(crate) answer: Generated,
    /// Vertical scroll of the answer.
    pub(crate) scroll: u16,
    /// Mentor request in flight.
    pub(crate) slot: PendingSlot,
}

impl MentorState {
    /// Empty prompt, nothing asked yet.
    pub(crate) fn new() -> Self {
        Self {
            prompt: PromptForm::new("Question"),
            asked: None,
            answer: Generated::Idle,
            scroll: 0,
            slot: PendingSlot::default(),
        }
    }
}
