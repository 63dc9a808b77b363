use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::style::{Color, Style};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::db::{ContentStore, KeyValueStore};
use crate::error::StoreError;
use crate::genai::{audio, GenAiClient, GeneratedQuestion, PcmAudio};
use crate::jobs::{JobOutput, JobRunner, Ticket};
use crate::models::{
    excerpt, new_token_id, timestamp_id, today_label, ContentItem, ContentKind, Prayer,
    PrayerKind, QuizQuestion,
};

use super::forms::{ConfirmDelete, ContentForm, FormAction, MessageForm, PromptForm};
use super::helpers::surface_error;
use super::screens::{
    AdminScreen, ArticlesScreen, CommunityScreen, Destination, Generated, HomeScreen,
    MentorState, PrayersScreen, QuizScreen, StudiesScreen,
};

const MISSING_KEY: &str = "AI features need an API key (set GEMINI_API_KEY).";

/// High-level navigation states. Each screen owns the state it renders,
/// including the slot of any AI request it is waiting on, so leaving a
/// screen discards its late results.
pub(super) enum Screen {
    Home(HomeScreen),
    Studies(StudiesScreen),
    Articles(ArticlesScreen),
    Prayers(PrayersScreen),
    Quiz(QuizScreen),
    Community(CommunityScreen),
    Admin(AdminScreen),
}

/// Fine-grained modes scoped to the current screen.
pub(super) enum Mode {
    /// Keys go to the current screen.
    Normal,
    /// Admin form for a new record of the current tab.
    CreatingContent(ContentForm),
    ConfirmDelete(ConfirmDelete),
    /// New prayer wall request.
    PostingRequest(MessageForm),
    /// Reply to the request with `request_id`.
    Commenting { request_id: String, form: MessageForm },
    /// Topic prompt for a generated quiz session.
    QuizTopic(PromptForm),
    /// Topic prompt for AI quick-create in the admin screen.
    AdminTopic(PromptForm),
    /// Mentor overlay, reachable from any screen.
    Mentor(MentorState),
}

/// Holds the footer message text plus its severity.
pub(super) struct StatusMessage {
    /// Text shown in the footer until the next key changes it.
    pub(super) text: String,
    pub(super) kind: StatusKind,
}

impl StatusMessage {
    fn info<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    fn error<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }
}

/// Severity levels shown in the footer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum StatusKind {
    /// Confirmation or progress, shown in green.
    Info,
    /// Failure the user should see, shown in red.
    Error,
}

impl StatusKind {
    /// Footer colour for this severity.
    pub(super) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Which view asked for a generated quiz.
enum QuizTarget {
    Session(Option<String>),
    Admin,
}

/// Central application state shared across the TUI.
pub struct App<S> {
    /// Every screen re-reads from here after a mutation.
    pub(super) store: ContentStore<S>,
    genai: GenAiClient,
    /// Background AI requests, drained once per tick.
    jobs: JobRunner,
    /// Number of studies in the guided journey.
    journey_len: usize,
    /// Where exported speech lands when no audio device is compiled in.
    scratch_dir: PathBuf,
    pub(super) screen: Screen,
    pub(super) mode: Mode,
    /// Footer message, if any.
    pub(super) status: Option<StatusMessage>,
}

impl<S: KeyValueStore> App<S> {
    /// `data_dir` receives exported speech when no audio device is compiled in.
    pub fn new(store: ContentStore<S>, config: &AppConfig, data_dir: PathBuf) -> Result<Self> {
        let genai = GenAiClient::new(config.genai.clone())
            .context("failed to build generative service client")?;
        if !genai.is_configured() {
            info!("no API key configured, AI features disabled");
        }
        Ok(Self {
            store,
            genai,
            jobs: JobRunner::new()?,
            journey_len: config.studies_per_journey.max(1),
            scratch_dir: data_dir,
            screen: Screen::Home(HomeScreen::default()),
            mode: Mode::Normal,
            status: None,
        })
    }

    /// Route a key press to the active mode or screen. Returns `true` when the
    /// app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::CreatingContent(form) => self.handle_create_content(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::PostingRequest(form) => self.handle_post_request(code, form),
            Mode::Commenting { request_id, form } => self.handle_comment(code, request_id, form),
            Mode::QuizTopic(form) => self.handle_quiz_topic(code, form),
            Mode::AdminTopic(form) => self.handle_admin_topic(code, form),
            Mode::Mentor(state) => self.handle_mentor(code, state),
        };

        Ok(exit)
    }

    /// Apply every background result that finished since the last tick.
    pub fn poll_jobs(&mut self) {
        for (ticket, output) in self.jobs.drain() {
            self.apply_job(ticket, output);
        }
    }

    /// Global keys first, then the current screen's handler.
    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Mode::Normal;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.clear_status();
                return Mode::Mentor(MentorState::new());
            }
            KeyCode::Esc => {
                match &mut self.screen {
                    Screen::Home(_) => *exit = true,
                    Screen::Articles(articles) if articles.reading => articles.reading = false,
                    _ => self.go_home(),
                }
                return Mode::Normal;
            }
            _ => {}
        }

        match self.screen {
            Screen::Home(_) => self.handle_home_key(code),
            Screen::Studies(_) => self.handle_studies_key(code),
            Screen::Articles(_) => self.handle_articles_key(code),
            Screen::Prayers(_) => self.handle_prayers_key(code),
            Screen::Quiz(_) => self.handle_quiz_key(code),
            Screen::Community(_) => self.handle_community_key(code),
            Screen::Admin(_) => self.handle_admin_key(code),
        }
    }

    /// Menu navigation. Digits jump straight to a destination.
    fn handle_home_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Home(home) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Up => home.move_selection(-1),
            KeyCode::Down => home.move_selection(1),
            KeyCode::Enter => {
                let destination = home.current();
                self.open(destination);
            }
            KeyCode::Char(ch) => {
                if let Some(destination) =
                    digit_index(ch).and_then(|i| Destination::MENU.get(i).copied())
                {
                    self.open(destination);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    /// Journey steps, body scroll and the insight request.
    fn handle_studies_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Studies(studies) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Left => studies.move_step(-1),
            KeyCode::Right => studies.move_step(1),
            KeyCode::Up => studies.scroll_by(-1),
            KeyCode::Down => studies.scroll_by(1),
            KeyCode::Char('i') | KeyCode::Char('I') => self.request_insight(),
            KeyCode::Char(ch) => {
                if let Some(step) = digit_index(ch) {
                    studies.select_step(step);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    /// List navigation, the reader and the cover image link.
    fn handle_articles_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Articles(articles) = &mut self.screen else {
            return Mode::Normal;
        };
        if articles.reading {
            match code {
                KeyCode::Up => articles.scroll = articles.scroll.saturating_sub(1),
                KeyCode::Down => articles.scroll = articles.scroll.saturating_add(1),
                KeyCode::Enter | KeyCode::Backspace => articles.reading = false,
                KeyCode::Char('o') | KeyCode::Char('O') => self.open_article_image(),
                _ => {}
            }
            return Mode::Normal;
        }

        match code {
            KeyCode::Up => articles.move_selection(-1),
            KeyCode::Down => articles.move_selection(1),
            KeyCode::PageUp => articles.move_selection(-5),
            KeyCode::PageDown => articles.move_selection(5),
            KeyCode::Home => articles.select_first(),
            KeyCode::End => articles.select_last(),
            KeyCode::Enter => {
                if articles.current_article().is_some() {
                    articles.reading = true;
                    articles.scroll = 0;
                }
            }
            KeyCode::Char('o') | KeyCode::Char('O') => self.open_article_image(),
            _ => {}
        }
        Mode::Normal
    }

    /// Selection and read-aloud.
    fn handle_prayers_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Prayers(prayers) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Up => prayers.move_selection(-1),
            KeyCode::Down => prayers.move_selection(1),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Char('L') => self.toggle_listen(),
            _ => {}
        }
        Mode::Normal
    }

    /// Answering, advancing, restarting and asking for a generated quiz.
    fn handle_quiz_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Quiz(quiz) = &mut self.screen else {
            return Mode::Normal;
        };
        let result = match code {
            KeyCode::Up => {
                quiz.move_cursor(-1);
                Ok(())
            }
            KeyCode::Down => {
                quiz.move_cursor(1);
                Ok(())
            }
            KeyCode::Enter => {
                if quiz.outcome.is_some() {
                    quiz.advance()
                } else {
                    let cursor = quiz.cursor;
                    quiz.answer(cursor).map(|_| ())
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                quiz.restart();
                Ok(())
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                return Mode::QuizTopic(PromptForm::new("Topic"));
            }
            KeyCode::Char(ch) => match digit_index(ch) {
                Some(index) => quiz.answer(index).map(|_| ()),
                None => Ok(()),
            },
            _ => Ok(()),
        };
        if let Err(err) = result {
            debug!(error = %err, "quiz input ignored");
        }
        Mode::Normal
    }

    /// Posting, amen and comments on the prayer wall.
    fn handle_community_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Community(board) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Up => board.move_selection(-1),
            KeyCode::Down => board.move_selection(1),
            KeyCode::Char('+') | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.status = None;
                return Mode::PostingRequest(MessageForm::new());
            }
            KeyCode::Char('a') | KeyCode::Char('A') => self.say_amen(),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if let Some(request) = board.current_request() {
                    let request_id = request.id.clone();
                    self.status = None;
                    return Mode::Commenting {
                        request_id,
                        form: MessageForm::new(),
                    };
                }
                self.status = Some(StatusMessage::error("No request selected."));
            }
            _ => {}
        }
        Mode::Normal
    }

    /// Tabs, create, delete and AI quick-create.
    fn handle_admin_key(&mut self, code: KeyCode) -> Mode {
        let Screen::Admin(admin) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Tab | KeyCode::Right => {
                admin.shift_tab(1);
                self.reload_admin();
            }
            KeyCode::BackTab | KeyCode::Left => {
                admin.shift_tab(-1);
                self.reload_admin();
            }
            KeyCode::Up => admin.move_selection(-1),
            KeyCode::Down => admin.move_selection(1),
            KeyCode::Char('+') | KeyCode::Char('n') | KeyCode::Char('N') => {
                let form = ContentForm::for_kind(admin.kind());
                self.status = None;
                return Mode::CreatingContent(form);
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                if let Some(item) = admin.current_item() {
                    let confirm = ConfirmDelete::from(item);
                    self.status = None;
                    return Mode::ConfirmDelete(confirm);
                }
                self.status = Some(StatusMessage::error("Nothing selected to delete."));
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                if !admin.supports_generation() {
                    self.status = Some(StatusMessage::error(
                        "AI creation is available on the Quiz and Prayers tabs.",
                    ));
                } else if admin.generating.is_some() {
                    self.status = Some(StatusMessage::info("Still generating..."));
                } else {
                    let label = if admin.kind() == ContentKind::Quiz {
                        "Quiz topic"
                    } else {
                        "Feeling"
                    };
                    self.status = None;
                    return Mode::AdminTopic(PromptForm::new(label));
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    /// Drive the admin form. Invalid input keeps the form open.
    fn handle_create_content(&mut self, code: KeyCode, mut form: ContentForm) -> Mode {
        match form.form.handle_key(code) {
            FormAction::Continue => Mode::CreatingContent(form),
            FormAction::Cancel => {
                self.set_status("Creation cancelled.", StatusKind::Info);
                Mode::Normal
            }
            FormAction::Submit => match form.parse_inputs() {
                Ok(item) => {
                    let headline = excerpt(&item.headline(), 40);
                    if self.save_content(item) {
                        self.set_status(format!("Saved \"{headline}\"."), StatusKind::Info);
                    }
                    Mode::Normal
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Mode::CreatingContent(form)
                }
            },
        }
    }

    /// `y` or Enter deletes, `n` or Esc backs out.
    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.store.delete_item(confirm.kind, &confirm.id) {
                    Ok(()) => {
                        self.reload_admin();
                        self.set_status(
                            format!("Deleted \"{}\".", excerpt(&confirm.headline, 40)),
                            StatusKind::Info,
                        );
                    }
                    Err(err) => {
                        if let Screen::Admin(admin) = &mut self.screen {
                            admin.items.retain(|item| item.id() != confirm.id);
                            admin.move_selection(0);
                        }
                        self.report_store_error("Deleting", err);
                    }
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Drive the request form and post it on submit.
    fn handle_post_request(&mut self, code: KeyCode, mut form: MessageForm) -> Mode {
        match form.form.handle_key(code) {
            FormAction::Continue => Mode::PostingRequest(form),
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit => match form.parse_request() {
                Ok(request) => {
                    let id = request.id.clone();
                    match self.store.post_request(request.clone()) {
                        Ok(()) => {
                            self.reload_community(Some(&id));
                            self.set_status("Your request is on the wall.", StatusKind::Info);
                        }
                        Err(err) => {
                            if let Screen::Community(board) = &mut self.screen {
                                board.requests.insert(0, request);
                                board.selected = 0;
                            }
                            self.report_store_error("Posting", err);
                        }
                    }
                    Mode::Normal
                }
                Err(err) => {
                    form.form.error = Some(surface_error(&err));
                    Mode::PostingRequest(form)
                }
            },
        }
    }

    /// Drive the comment form and append the reply on submit.
    fn handle_comment(&mut self, code: KeyCode, request_id: String, mut form: MessageForm) -> Mode {
        match form.form.handle_key(code) {
            FormAction::Continue => Mode::Commenting { request_id, form },
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit => match form.parse_comment() {
                Ok(comment) => {
                    match self.store.add_comment(&request_id, comment.clone()) {
                        Ok(true) => {
                            self.reload_community(Some(&request_id));
                            self.set_status("Comment added.", StatusKind::Info);
                        }
                        Ok(false) => {
                            self.reload_community(None);
                            self.set_status(
                                "That request is no longer on the wall.",
                                StatusKind::Error,
                            );
                        }
                        Err(err) => {
                            if let Screen::Community(board) = &mut self.screen {
                                if let Some(request) =
                                    board.requests.iter_mut().find(|r| r.id == request_id)
                                {
                                    request.comments.push(comment);
                                }
                            }
                            self.report_store_error("Commenting", err);
                        }
                    }
                    Mode::Normal
                }
                Err(err) => {
                    form.form.error = Some(surface_error(&err));
                    Mode::Commenting { request_id, form }
                }
            },
        }
    }

    fn handle_quiz_topic(&mut self, code: KeyCode, mut form: PromptForm) -> Mode {
        match form.form.handle_key(code) {
            FormAction::Continue => Mode::QuizTopic(form),
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit => match form.parse_inputs() {
                Ok(topic) => {
                    self.request_session_quiz(topic);
                    Mode::Normal
                }
                Err(err) => {
                    form.form.error = Some(surface_error(&err));
                    Mode::QuizTopic(form)
                }
            },
        }
    }

    fn handle_admin_topic(&mut self, code: KeyCode, mut form: PromptForm) -> Mode {
        match form.form.handle_key(code) {
            FormAction::Continue => Mode::AdminTopic(form),
            FormAction::Cancel => Mode::Normal,
            FormAction::Submit => match form.parse_inputs() {
                Ok(topic) => {
                    self.request_admin_generation(topic);
                    Mode::Normal
                }
                Err(err) => {
                    form.form.error = Some(surface_error(&err));
                    Mode::AdminTopic(form)
                }
            },
        }
    }

    /// Type a question and send it. Esc closes the overlay.
    fn handle_mentor(&mut self, code: KeyCode, mut state: MentorState) -> Mode {
        match code {
            // Dropping the state discards an answer still on its way.
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Up => state.scroll = state.scroll.saturating_sub(1),
            KeyCode::Down => state.scroll = state.scroll.saturating_add(1),
            KeyCode::Enter => match state.prompt.parse_inputs() {
                Ok(question) => {
                    if self.ensure_genai() {
                        let client = self.genai.clone();
                        let asked = question.clone();
                        let ticket = self.jobs.spawn(async move {
                            JobOutput::Mentor(client.ask_mentor(&asked).await)
                        });
                        state.slot.begin(ticket);
                        state.asked = Some(question);
                        state.answer = Generated::Idle;
                        state.scroll = 0;
                        state.prompt = PromptForm::new("Question");
                    }
                }
                Err(err) => state.prompt.form.error = Some(surface_error(&err)),
            },
            KeyCode::Backspace => state.prompt.form.backspace(),
            KeyCode::Char(ch) => {
                if state.prompt.form.push_char(ch) {
                    state.prompt.form.error = None;
                }
            }
            _ => {}
        }
        Mode::Mentor(state)
    }

    /// Hand a finished job to whichever view is waiting for it.
    fn apply_job(&mut self, ticket: Ticket, output: JobOutput) {
        let applied = match output {
            JobOutput::Insight(text) => self.apply_insight(ticket, text),
            JobOutput::Speech(speech) => self.apply_speech(ticket, speech),
            JobOutput::Mentor(answer) => self.apply_mentor(ticket, answer),
            JobOutput::Quiz(questions) => self.apply_quiz(ticket, questions),
            JobOutput::Prayer(text) => self.apply_prayer(ticket, text),
        };
        if !applied {
            debug!(?ticket, "stale job result discarded");
        }
    }

    /// Show the insight if the studies screen still wants it.
    fn apply_insight(&mut self, ticket: Ticket, text: Option<String>) -> bool {
        let Screen::Studies(studies) = &mut self.screen else {
            return false;
        };
        if !studies.slot.accept(ticket) {
            return false;
        }
        match text {
            Some(text) => {
                studies.insight = Generated::Ready(text);
                self.status = None;
            }
            None => {
                studies.insight = Generated::Failed;
                self.status = Some(StatusMessage::error("Could not get an insight. Try again."));
            }
        }
        true
    }

    /// Start playback for the prayer that asked for it. The new audio
    /// replaces whatever was playing.
    fn apply_speech(&mut self, ticket: Ticket, speech: Option<PcmAudio>) -> bool {
        let Screen::Prayers(prayers) = &mut self.screen else {
            return false;
        };
        if !prayers.slot.accept(ticket) {
            return false;
        }
        let Some(prayer_id) = prayers.listening.take() else {
            return false;
        };
        let status = match speech {
            Some(pcm) => match audio::play(pcm, &self.scratch_dir) {
                Ok(playback) => {
                    let status = StatusMessage::info(playback.label());
                    prayers.start_playback(prayer_id, playback);
                    status
                }
                Err(err) => {
                    warn!(error = %err, "speech playback failed");
                    StatusMessage::error(format!("Playback failed: {err}"))
                }
            },
            None => StatusMessage::error("Speech is unavailable right now. Try again."),
        };
        self.status = Some(status);
        true
    }

    /// Show the mentor answer if the overlay is still open.
    fn apply_mentor(&mut self, ticket: Ticket, answer: Option<String>) -> bool {
        let Mode::Mentor(state) = &mut self.mode else {
            return false;
        };
        if !state.slot.accept(ticket) {
            return false;
        }
        state.answer = match answer {
            Some(text) => Generated::Ready(text),
            None => Generated::Failed,
        };
        true
    }

    /// Load generated questions into the session or save them from the admin screen.
    fn apply_quiz(&mut self, ticket: Ticket, generated: Option<Vec<GeneratedQuestion>>) -> bool {
        let target = match &mut self.screen {
            Screen::Quiz(quiz) => {
                if !quiz.slot.accept(ticket) {
                    return false;
                }
                QuizTarget::Session(quiz.generating.take())
            }
            Screen::Admin(admin) => {
                if !admin.slot.accept(ticket) {
                    return false;
                }
                admin.generating = None;
                QuizTarget::Admin
            }
            _ => return false,
        };

        let Some(generated) = generated else {
            self.set_status("Could not generate a quiz. Try again.", StatusKind::Error);
            return true;
        };
        let questions: Vec<QuizQuestion> = generated
            .into_iter()
            .map(|question| question.into_question(new_token_id()))
            .collect();
        let count = questions.len();

        match target {
            QuizTarget::Admin => {
                let mut all_saved = true;
                for question in questions {
                    all_saved &= self.save_content(ContentItem::Quiz(question));
                }
                if all_saved {
                    self.set_status(
                        format!("{count} questions generated and saved."),
                        StatusKind::Info,
                    );
                }
            }
            QuizTarget::Session(topic) => {
                let mut failure = None;
                for question in &questions {
                    if let Err(err) = self.store.save(question.clone()) {
                        failure = Some(err);
                    }
                }
                if let Screen::Quiz(quiz) = &mut self.screen {
                    if let Err(err) = quiz.load(questions) {
                        debug!(error = %err, "generated quiz not loaded");
                    }
                }
                match failure {
                    Some(err) => self.report_store_error("Saving the quiz", err),
                    None => {
                        let topic = topic.unwrap_or_default();
                        self.set_status(
                            format!("New quiz about {topic}: {count} questions."),
                            StatusKind::Info,
                        );
                    }
                }
            }
        }
        true
    }

    /// Save a generated prayer from the admin screen.
    fn apply_prayer(&mut self, ticket: Ticket, text: Option<String>) -> bool {
        let Screen::Admin(admin) = &mut self.screen else {
            return false;
        };
        if !admin.slot.accept(ticket) {
            return false;
        }
        let topic = admin.generating.take().unwrap_or_default();
        let Some(content) = text else {
            self.set_status("Could not generate a prayer. Try again.", StatusKind::Error);
            return true;
        };
        let prayer = Prayer {
            id: timestamp_id(),
            kind: PrayerKind::Custom,
            title: format!("Prayer for: {topic}"),
            content,
            date: today_label(),
        };
        if self.save_content(ContentItem::Prayer(prayer)) {
            self.set_status("Prayer generated and saved.", StatusKind::Info);
        }
        true
    }

    /// Ask for an insight on the current study verse.
    fn request_insight(&mut self) {
        if !self.ensure_genai() {
            return;
        }
        let Screen::Studies(studies) = &mut self.screen else {
            return;
        };
        let Some(study) = studies.current() else {
            return;
        };
        let client = self.genai.clone();
        let verse = study.verse.clone();
        let context = study.explanation.clone();
        let ticket = self.jobs.spawn(async move {
            JobOutput::Insight(client.generate_insight(&verse, &context).await)
        });
        studies.slot.begin(ticket);
        studies.insight = Generated::Idle;
        self.status = Some(StatusMessage::info("Seeking insight..."));
    }

    /// Read the selected prayer aloud, or stop it when it is already being
    /// prepared or played.
    fn toggle_listen(&mut self) {
        let Screen::Prayers(prayers) = &mut self.screen else {
            return;
        };
        let Some(prayer) = prayers.current_prayer().cloned() else {
            return;
        };
        if prayers.is_preparing(&prayer.id) || prayers.is_playing(&prayer.id) {
            prayers.stop_listening();
            self.status = Some(StatusMessage::info("Stopped."));
            return;
        }
        // A new request replaces whatever is being prepared or played.
        prayers.stop_listening();
        if !self.genai.is_configured() {
            self.status = Some(StatusMessage::error(MISSING_KEY));
            return;
        }

        let client = self.genai.clone();
        let text = prayer.content.clone();
        let ticket = self.jobs.spawn(async move {
            JobOutput::Speech(client.synthesize_speech(&text).await)
        });
        prayers.slot.begin(ticket);
        prayers.listening = Some(prayer.id);
        self.status = Some(StatusMessage::info(format!(
            "Preparing audio for {}...",
            prayer.title
        )));
    }

    /// Generate a quiz on `topic` to replace the session being played.
    fn request_session_quiz(&mut self, topic: String) {
        if !self.ensure_genai() || !matches!(self.screen, Screen::Quiz(_)) {
            return;
        }
        let ticket = self.spawn_quiz_job(&topic);
        if let Screen::Quiz(quiz) = &mut self.screen {
            quiz.slot.begin(ticket);
            quiz.generating = Some(topic.clone());
        }
        self.set_status(format!("Generating a quiz about {topic}..."), StatusKind::Info);
    }

    /// Generate content for the current admin tab.
    fn request_admin_generation(&mut self, topic: String) {
        if !self.ensure_genai() {
            return;
        }
        let kind = match &self.screen {
            Screen::Admin(admin) => admin.kind(),
            _ => return,
        };
        let ticket = match kind {
            ContentKind::Quiz => self.spawn_quiz_job(&topic),
            ContentKind::Prayer => {
                let client = self.genai.clone();
                let mood = topic.clone();
                self.jobs.spawn(async move {
                    JobOutput::Prayer(client.generate_prayer_text(&mood).await)
                })
            }
            ContentKind::Study | ContentKind::Article => return,
        };
        if let Screen::Admin(admin) = &mut self.screen {
            admin.slot.begin(ticket);
            admin.generating = Some(topic.clone());
        }
        self.set_status(format!("Generating for \"{topic}\"..."), StatusKind::Info);
    }

    fn spawn_quiz_job(&mut self, topic: &str) -> Ticket {
        let client = self.genai.clone();
        let topic = topic.to_string();
        self.jobs.spawn(async move {
            JobOutput::Quiz(client.generate_quiz_questions(&topic).await)
        })
    }

    /// Add an amen to the selected request and re-read the board.
    fn say_amen(&mut self) {
        let id = match &self.screen {
            Screen::Community(board) => board.current_request().map(|request| request.id.clone()),
            _ => None,
        };
        let Some(id) = id else {
            self.set_status("No request selected.", StatusKind::Error);
            return;
        };
        match self.store.add_amen(&id) {
            Ok(true) => {
                self.reload_community(Some(&id));
                self.set_status("Amen!", StatusKind::Info);
            }
            Ok(false) => {
                self.reload_community(None);
                self.set_status("That request is no longer on the wall.", StatusKind::Error);
            }
            Err(err) => {
                if let Screen::Community(board) = &mut self.screen {
                    if let Some(request) = board.requests.iter_mut().find(|r| r.id == id) {
                        request.amens = request.amens.saturating_add(1);
                    }
                }
                self.report_store_error("Saving your amen", err);
            }
        }
    }

    /// Open the selected article's cover image in the browser.
    fn open_article_image(&mut self) {
        let Screen::Articles(articles) = &self.screen else {
            return;
        };
        let Some(article) = articles.current_article() else {
            return;
        };
        let link = article.image.as_deref().map(str::trim).unwrap_or_default();
        let status = if link.is_empty() {
            StatusMessage::error("This article has no image link.")
        } else if let Err(err) = open_link(link) {
            StatusMessage::error(format!("Failed to open link: {err}"))
        } else {
            StatusMessage::info(format!("Opened image for {}.", article.title))
        };
        self.status = Some(status);
    }

    /// Persist a curated item and refresh the admin list. On a failed write
    /// the item is still shown. Returns whether the write succeeded.
    fn save_content(&mut self, item: ContentItem) -> bool {
        let id = item.id().to_string();
        match self.store.save_item(item.clone()) {
            Ok(()) => {
                self.reload_admin();
                if let Screen::Admin(admin) = &mut self.screen {
                    if let Some(index) = admin.items.iter().position(|i| i.id() == id) {
                        admin.selected = index;
                    }
                }
                true
            }
            Err(err) => {
                if let Screen::Admin(admin) = &mut self.screen {
                    if admin.kind() == item.kind() {
                        admin.items.push(item);
                        admin.selected = admin.items.len() - 1;
                    }
                }
                self.report_store_error("Saving", err);
                false
            }
        }
    }

    /// Switch to a destination, loading its data fresh from the store.
    fn open(&mut self, destination: Destination) {
        self.clear_status();
        self.screen = match destination {
            Destination::Studies => {
                Screen::Studies(StudiesScreen::new(self.store.all(), self.journey_len))
            }
            Destination::Articles => Screen::Articles(ArticlesScreen::new(self.store.all())),
            Destination::Prayers => Screen::Prayers(PrayersScreen::new(self.store.all())),
            Destination::Quiz => Screen::Quiz(QuizScreen::new(self.store.all())),
            Destination::Community => {
                Screen::Community(CommunityScreen::new(self.store.requests()))
            }
            Destination::Admin => {
                Screen::Admin(AdminScreen::new(self.store.list_items(ContentKind::ALL[0])))
            }
        };
        debug!(screen = destination.title(), "screen opened");
    }

    /// Back to the menu. The left screen's pending requests and playback go
    /// with it.
    fn go_home(&mut self) {
        self.clear_status();
        self.screen = Screen::Home(HomeScreen::default());
    }

    /// Re-read the current admin tab.
    fn reload_admin(&mut self) {
        let kind = match &self.screen {
            Screen::Admin(admin) => admin.kind(),
            _ => return,
        };
        let items = self.store.list_items(kind);
        if let Screen::Admin(admin) = &mut self.screen {
            admin.set_items(items);
        }
    }

    /// Re-read the board, keeping `focus_id` selected.
    fn reload_community(&mut self, focus_id: Option<&str>) {
        let requests = self.store.requests();
        if let Screen::Community(board) = &mut self.screen {
            board.set_requests(requests, focus_id);
        }
    }

    /// Check for an API key, explaining in the footer when it is missing.
    fn ensure_genai(&mut self) -> bool {
        if self.genai.is_configured() {
            return true;
        }
        self.set_status(MISSING_KEY, StatusKind::Error);
        false
    }

    /// Show a storage failure in red.
    fn report_store_error(&mut self, action: &str, err: StoreError) {
        warn!(error = %err, "{action} failed");
        let err = anyhow::Error::from(err);
        self.set_status(
            format!(
                "{action} failed: {}. The change is only shown until you leave.",
                surface_error(&err)
            ),
            StatusKind::Error,
        );
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// `'1'..='9'` as a zero-based index.
fn digit_index(ch: char) -> Option<usize> {
    ch.to_digit(10)
        .and_then(|digit| (digit as usize).checked_sub(1))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::db::{keys, MemoryStore};
    use crate::models::{PrayerRequest, Study};
    use crate::quiz::QuizState;

    fn app() -> App<MemoryStore> {
        app_with(MemoryStore::new())
    }

    fn app_with(store: MemoryStore) -> App<MemoryStore> {
        let dir = std::env::temp_dir().join("daily-bread-tests");
        App::new(ContentStore::new(store), &AppConfig::default(), dir).unwrap()
    }

    fn press(app: &mut App<MemoryStore>, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key).unwrap();
        }
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn status_kind(app: &App<MemoryStore>) -> Option<StatusKind> {
        app.status.as_ref().map(|status| status.kind)
    }

    fn render(app: &App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn quit_and_escape_from_home() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(app.handle_key(KeyCode::Esc).unwrap());
    }

    #[test]
    fn menu_opens_screens_and_escape_returns_home() {
        let mut app = app();
        press(&mut app, &[KeyCode::Enter]);
        assert!(matches!(app.screen, Screen::Studies(_)));
        assert!(!app.handle_key(KeyCode::Esc).unwrap());
        assert!(matches!(app.screen, Screen::Home(_)));

        type_text(&mut app, "5");
        assert!(matches!(app.screen, Screen::Community(_)));
    }

    #[test]
    fn seeded_quiz_plays_to_full_marks() {
        let mut app = app();
        type_text(&mut app, "2");
        type_text(&mut app, "2");
        press(&mut app, &[KeyCode::Enter]);

        let Screen::Quiz(quiz) = &app.screen else {
            panic!("expected quiz screen");
        };
        let session = quiz.session.as_ref().unwrap();
        assert_eq!(session.state(), QuizState::Finished { final_score: 1 });
        assert_eq!(session.percentage(), Some(100));
        assert!(render(&app).contains("100%"));
    }

    #[test]
    fn second_answer_does_not_count() {
        let mut app = app();
        type_text(&mut app, "2");
        type_text(&mut app, "1");
        type_text(&mut app, "2");

        let Screen::Quiz(quiz) = &app.screen else {
            panic!("expected quiz screen");
        };
        assert_eq!(quiz.session.as_ref().map(|s| s.score()), Some(0));
        assert_eq!(quiz.outcome.map(|o| o.selected), Some(0));
    }

    #[test]
    fn empty_quiz_renders_placeholder() {
        let mut app = app_with(MemoryStore::new().with_entry(keys::QUIZ, "[]"));
        type_text(&mut app, "2");
        press(&mut app, &[KeyCode::Enter]);

        let Screen::Quiz(quiz) = &app.screen else {
            panic!("expected quiz screen");
        };
        assert!(quiz.session.is_none());
        assert!(render(&app).contains("No questions yet"));
    }

    #[test]
    fn posting_and_amen_read_back_from_store() {
        let mut app = app();
        type_text(&mut app, "5+");
        type_text(&mut app, "Ana");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Pray for my family");
        press(&mut app, &[KeyCode::Enter]);

        let stored = app.store.requests();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].author, "Ana");

        type_text(&mut app, "aa");
        assert_eq!(app.store.requests()[0].amens, 2);
        let Screen::Community(board) = &app.screen else {
            panic!("expected community screen");
        };
        assert_eq!(board.requests[0].amens, 2);
    }

    #[test]
    fn comment_is_appended_to_selected_request() {
        let board = serde_json::to_string(&vec![PrayerRequest::new("Ana", "Healing")]).unwrap();
        let mut app = app_with(MemoryStore::new().with_entry(keys::COMMUNITY_PRAYERS, &board));
        type_text(&mut app, "5c");
        type_text(&mut app, "Joao");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Praying with you");
        press(&mut app, &[KeyCode::Enter]);

        let comments = &app.store.requests()[0].comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "Praying with you");
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn failed_write_keeps_optimistic_view() {
        let board = serde_json::to_string(&vec![PrayerRequest::new("Ana", "Healing")]).unwrap();
        let mut app = app_with(MemoryStore::new().with_entry(keys::COMMUNITY_PRAYERS, &board));
        type_text(&mut app, "5");
        app.store.backend().set_fail_writes(true);
        type_text(&mut app, "a");

        assert_eq!(app.store.requests()[0].amens, 0);
        let Screen::Community(board) = &app.screen else {
            panic!("expected community screen");
        };
        assert_eq!(board.requests[0].amens, 1);
        assert_eq!(status_kind(&app), Some(StatusKind::Error));
    }

    #[test]
    fn unreadable_board_is_not_overwritten_by_a_post() {
        let board = serde_json::to_string(&vec![
            PrayerRequest::new("Ana", "Healing"),
            PrayerRequest::new("Rui", "Work"),
        ])
        .unwrap();
        let mut app = app_with(MemoryStore::new().with_entry(keys::COMMUNITY_PRAYERS, &board));
        type_text(&mut app, "5+");
        type_text(&mut app, "Lia");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Peace at home");
        app.store.backend().set_fail_reads(true);
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(status_kind(&app), Some(StatusKind::Error));
        assert_eq!(
            app.store.backend().raw(keys::COMMUNITY_PRAYERS).as_deref(),
            Some(board.as_str())
        );
        app.store.backend().set_fail_reads(false);
        assert_eq!(app.store.requests().len(), 2);
    }

    #[test]
    fn enter_on_a_playing_prayer_stops_the_audio() {
        let mut app = app();
        type_text(&mut app, "3");
        let (finished, stopped) = std::sync::mpsc::channel();
        let Screen::Prayers(prayers) = &mut app.screen else {
            panic!("expected prayers screen");
        };
        let id = prayers.prayers[0].id.clone();
        let playback = crate::genai::Playback::spawn("Playing (3s)".into(), move |stop| {
            let _ = stop.recv();
            let _ = finished.send(());
        })
        .unwrap();
        prayers.start_playback(id, playback);

        press(&mut app, &[KeyCode::Enter]);

        assert!(stopped.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
        let Screen::Prayers(prayers) = &app.screen else {
            panic!("expected prayers screen");
        };
        assert!(prayers.playing.is_none());
        assert!(!prayers.slot.is_pending());
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("Stopped."));
    }

    #[test]
    fn listening_to_another_prayer_stops_current_audio() {
        let mut app = app();
        type_text(&mut app, "3");
        let (finished, stopped) = std::sync::mpsc::channel();
        if let Screen::Prayers(prayers) = &mut app.screen {
            let id = prayers.prayers[0].id.clone();
            let playback = crate::genai::Playback::spawn("Playing (3s)".into(), move |stop| {
                let _ = stop.recv();
                let _ = finished.send(());
            })
            .unwrap();
            prayers.start_playback(id, playback);
        }

        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);

        assert!(stopped.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
        let Screen::Prayers(prayers) = &app.screen else {
            panic!("expected prayers screen");
        };
        assert!(prayers.playing.is_none());
    }

    #[test]
    fn admin_delete_requires_confirmation() {
        let mut app = app();
        type_text(&mut app, "6");
        press(&mut app, &[KeyCode::Char('-'), KeyCode::Esc]);
        assert_eq!(app.store.all::<Study>().len(), 8);

        press(&mut app, &[KeyCode::Char('-'), KeyCode::Char('y')]);
        let remaining = app.store.all::<Study>();
        assert_eq!(remaining.len(), 7);
        assert!(remaining.iter().all(|study| study.id != "s1"));
    }

    #[test]
    fn admin_creates_prayer_from_form() {
        let mut app = app_with(MemoryStore::new().with_entry(keys::PRAYERS, "[]"));
        type_text(&mut app, "6");
        press(&mut app, &[KeyCode::BackTab]);
        let Screen::Admin(admin) = &app.screen else {
            panic!("expected admin screen");
        };
        assert_eq!(admin.kind(), ContentKind::Prayer);

        press(&mut app, &[KeyCode::Char('+'), KeyCode::Tab]);
        type_text(&mut app, "Evening");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Lord, thank you. Amen.");
        press(&mut app, &[KeyCode::Enter]);

        let prayers = app.store.all::<Prayer>();
        assert_eq!(prayers.len(), 1);
        assert_eq!(prayers[0].title, "Evening");
        assert_eq!(prayers[0].kind, PrayerKind::Custom);
        assert_eq!(status_kind(&app), Some(StatusKind::Info));
    }

    #[test]
    fn invalid_form_stays_open() {
        let mut app = app();
        type_text(&mut app, "6+");
        press(&mut app, &[KeyCode::Enter]);
        let Mode::CreatingContent(form) = &app.mode else {
            panic!("expected the form to stay open");
        };
        assert_eq!(form.form.error.as_deref(), Some("Title is required."));
    }

    #[test]
    fn ai_actions_need_a_key() {
        let mut app = app();
        type_text(&mut app, "1i");
        assert_eq!(status_kind(&app), Some(StatusKind::Error));
        let Screen::Studies(studies) = &app.screen else {
            panic!("expected studies screen");
        };
        assert!(!studies.slot.is_pending());
    }

    #[test]
    fn only_the_awaited_insight_is_applied() {
        let mut app = app();
        type_text(&mut app, "1");
        if let Screen::Studies(studies) = &mut app.screen {
            studies.slot.begin(Ticket::for_test(2));
        }

        app.apply_job(Ticket::for_test(1), JobOutput::Insight(Some("old".into())));
        let Screen::Studies(studies) = &app.screen else {
            panic!("expected studies screen");
        };
        assert_eq!(studies.insight, Generated::Idle);

        app.apply_job(Ticket::for_test(2), JobOutput::Insight(Some("fresh".into())));
        let Screen::Studies(studies) = &app.screen else {
            panic!("expected studies screen");
        };
        assert_eq!(studies.insight, Generated::Ready("fresh".into()));
    }

    #[test]
    fn result_for_a_left_screen_is_dropped() {
        let mut app = app();
        type_text(&mut app, "2");
        if let Screen::Quiz(quiz) = &mut app.screen {
            quiz.slot.begin(Ticket::for_test(9));
        }
        press(&mut app, &[KeyCode::Esc]);

        let generated = crate::genai::prompts::parse_quiz(
            r#"[{"question":"Q","options":["A","B"],"correctIndex":0}]"#,
        )
        .unwrap();
        app.apply_job(Ticket::for_test(9), JobOutput::Quiz(Some(generated)));

        assert_eq!(app.store.all::<QuizQuestion>().len(), 1);
    }

    #[test]
    fn generated_quiz_replaces_session_and_is_saved() {
        let mut app = app();
        type_text(&mut app, "2");
        type_text(&mut app, "1");
        if let Screen::Quiz(quiz) = &mut app.screen {
            quiz.slot.begin(Ticket::for_test(4));
            quiz.generating = Some("Psalms".into());
        }

        let generated = crate::genai::prompts::parse_quiz(
            r#"[{"question":"Q1","options":["A","B"],"correctIndex":0},
                {"question":"Q2","options":["A","B"],"correctIndex":1}]"#,
        )
        .unwrap();
        app.apply_job(Ticket::for_test(4), JobOutput::Quiz(Some(generated)));

        let Screen::Quiz(quiz) = &app.screen else {
            panic!("expected quiz screen");
        };
        let session = quiz.session.as_ref().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.answered(), None);
        assert_eq!(app.store.all::<QuizQuestion>().len(), 3);
    }

    #[test]
    fn admin_generated_prayer_is_saved() {
        let mut app = app_with(MemoryStore::new().with_entry(keys::PRAYERS, "[]"));
        type_text(&mut app, "6");
        press(&mut app, &[KeyCode::BackTab]);
        if let Screen::Admin(admin) = &mut app.screen {
            admin.slot.begin(Ticket::for_test(5));
            admin.generating = Some("anxiety".into());
        }

        app.apply_job(
            Ticket::for_test(5),
            JobOutput::Prayer(Some("Lord, calm my heart. Amen.".into())),
        );

        let prayers = app.store.all::<Prayer>();
        assert_eq!(prayers.len(), 1);
        assert_eq!(prayers[0].title, "Prayer for: anxiety");
        assert_eq!(prayers[0].kind, PrayerKind::Custom);
    }

    #[test]
    fn closing_mentor_discards_answer() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('m')]);
        if let Mode::Mentor(state) = &mut app.mode {
            state.slot.begin(Ticket::for_test(3));
        }
        press(&mut app, &[KeyCode::Esc]);
        app.apply_job(Ticket::for_test(3), JobOutput::Mentor(Some("Ruth".into())));
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn every_screen_renders() {
        let mut app = app();
        for key in ['1', '2', '3', '4', '5', '6'] {
            press(&mut app, &[KeyCode::Char(key)]);
            assert!(!render(&app).trim().is_empty());
            press(&mut app, &[KeyCode::Esc]);
        }
        press(&mut app, &[KeyCode::Char('m')]);
        assert!(render(&app).contains("Mentor"));
    }
}
