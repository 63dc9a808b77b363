use anyhow::{anyhow, Context, Result};
use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{
    new_token_id, now_millis, timestamp_id, today_label, Article, Comment, ContentItem,
    ContentKind, Prayer, PrayerKind, PrayerRequest, QuizQuestion, Study,
};

/// Maximum options a manually written quiz question can carry.
const QUIZ_OPTION_FIELDS: usize = 4;

/// What a single form field holds.
#[derive(Clone, Debug)]
pub(crate) enum FieldValue {
    Text(String),
    /// Cycled with Space or the arrow keys instead of typed.
    PrayerKind(PrayerKind),
}

#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: FieldValue,
    pub(crate) required: bool,
}

impl FormField {
    fn text(label: &'static str, required: bool) -> Self {
        Self {
            label,
            value: FieldValue::Text(String::new()),
            required,
        }
    }

    fn prayer_kind(label: &'static str) -> Self {
        Self {
            label,
            value: FieldValue::PrayerKind(PrayerKind::Custom),
            required: true,
        }
    }

    fn display(&self) -> String {
        match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::PrayerKind(kind) => format!("< {kind} >"),
        }
    }
}

/// What a key press means to an open form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FormAction {
    Continue,
    Submit,
    Cancel,
}

/// A vertical list of labelled inputs with one focused field.
#[derive(Clone, Debug)]
pub(crate) struct TextForm {
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl TextForm {
    fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            active: 0,
            error: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn focus(&mut self, index: usize) {
        if index < self.fields.len() {
            self.active = index;
        }
    }

    /// Move focus to the next field, wrapping around.
    pub(crate) fn toggle_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
    }

    pub(crate) fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Append a character to the active field. Choice fields treat a space as
    /// "next choice".
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let Some(field) = self.fields.get_mut(self.active) else {
            return false;
        };
        match &mut field.value {
            FieldValue::Text(text) => {
                if ch.is_control() {
                    false
                } else {
                    text.push(ch);
                    true
                }
            }
            FieldValue::PrayerKind(kind) => {
                if ch == ' ' {
                    *kind = kind.next();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Cycle the active choice field. Returns `false` on text fields.
    pub(crate) fn cycle_choice(&mut self) -> bool {
        match self.fields.get_mut(self.active).map(|field| &mut field.value) {
            Some(FieldValue::PrayerKind(kind)) => {
                *kind = kind.next();
                true
            }
            _ => false,
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        if let Some(FieldValue::Text(text)) =
            self.fields.get_mut(self.active).map(|field| &mut field.value)
        {
            text.pop();
        }
    }

    /// Shared editing keys: Tab and arrows move focus or cycle a choice,
    /// Enter submits, Esc cancels.
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> FormAction {
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.toggle_field(),
            KeyCode::BackTab | KeyCode::Up => self.previous_field(),
            KeyCode::Left | KeyCode::Right => {
                self.cycle_choice();
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(ch) => {
                if self.push_char(ch) {
                    self.error = None;
                }
            }
            _ => {}
        }
        FormAction::Continue
    }

    /// Trimmed text of a field; empty for choice fields.
    pub(crate) fn value(&self, index: usize) -> &str {
        match self.fields.get(index).map(|field| &field.value) {
            Some(FieldValue::Text(text)) => text.trim(),
            _ => "",
        }
    }

    fn required(&self, index: usize) -> Result<String> {
        let value = self.value(index);
        if value.is_empty() {
            let label = self.fields.get(index).map_or("Field", |field| field.label);
            return Err(anyhow!("{label} is required."));
        }
        Ok(value.to_string())
    }

    fn optional(&self, index: usize) -> Option<String> {
        let value = self.value(index);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn prayer_kind(&self, index: usize) -> PrayerKind {
        match self.fields.get(index).map(|field| &field.value) {
            Some(FieldValue::PrayerKind(kind)) => *kind,
            _ => PrayerKind::Custom,
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let Some(field) = self.fields.get(index) else {
            return Line::from("");
        };
        let is_active = self.active == index;
        let value = field.display();

        let display = if value.is_empty() {
            if field.required {
                "<required>".to_string()
            } else {
                "<optional>".to_string()
            }
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, index: usize) -> usize {
        self.fields
            .get(index)
            .map_or(0, |field| field.display().chars().count())
    }

    pub(crate) fn label_len(&self, index: usize) -> usize {
        self.fields
            .get(index)
            .map_or(0, |field| field.label.chars().count() + 2)
    }
}

/// Admin form for one curated collection.
#[derive(Clone, Debug)]
pub(crate) struct ContentForm {
    pub(crate) kind: ContentKind,
    pub(crate) form: TextForm,
}

impl ContentForm {
    pub(crate) fn for_kind(kind: ContentKind) -> Self {
        let fields = match kind {
            ContentKind::Study => vec![
                FormField::text("Title", true),
                FormField::text("Verse", true),
                FormField::text("Meditation", true),
                FormField::text("Application", true),
                FormField::text("Prayer", true),
                FormField::text("Image URL", false),
            ],
            ContentKind::Article => vec![
                FormField::text("Title", true),
                FormField::text("Author", true),
                FormField::text("Content", true),
                FormField::text("Image URL", false),
            ],
            ContentKind::Prayer => vec![
                FormField::prayer_kind("Type"),
                FormField::text("Title", true),
                FormField::text("Content", true),
            ],
            ContentKind::Quiz => vec![
                FormField::text("Question", true),
                FormField::text("Option 1", true),
                FormField::text("Option 2", true),
                FormField::text("Option 3", false),
                FormField::text("Option 4", false),
                FormField::text("Correct option (1-4)", true),
                FormField::text("Explanation", false),
            ],
        };
        Self {
            kind,
            form: TextForm::new(fields),
        }
    }

    pub(crate) fn title(&self) -> String {
        format!("New {}", singular(self.kind))
    }

    /// Validate the inputs and build a record with a fresh id.
    pub(crate) fn parse_inputs(&self) -> Result<ContentItem> {
        let form = &self.form;
        let item = match self.kind {
            ContentKind::Study => ContentItem::Study(Study {
                id: timestamp_id(),
                title: form.required(0)?,
                verse: form.required(1)?,
                explanation: form.required(2)?,
                application: form.required(3)?,
                prayer: form.required(4)?,
                date: today_label(),
                image: form.optional(5),
                timestamp: now_millis(),
            }),
            ContentKind::Article => ContentItem::Article(Article {
                id: timestamp_id(),
                title: form.required(0)?,
                author: form.required(1)?,
                content: form.required(2)?,
                date: today_label(),
                image: form.optional(3),
                timestamp: now_millis(),
            }),
            ContentKind::Prayer => ContentItem::Prayer(Prayer {
                id: timestamp_id(),
                kind: form.prayer_kind(0),
                title: form.required(1)?,
                content: form.required(2)?,
                date: today_label(),
            }),
            ContentKind::Quiz => ContentItem::Quiz(self.parse_question()?),
        };
        Ok(item)
    }

    fn parse_question(&self) -> Result<QuizQuestion> {
        let form = &self.form;
        let question = form.required(0)?;
        let mut options = Vec::with_capacity(QUIZ_OPTION_FIELDS);
        for index in 1..=QUIZ_OPTION_FIELDS {
            if let Some(option) = form.optional(index) {
                options.push(option);
            }
        }
        if options.len() < 2 {
            return Err(anyhow!("A question needs at least two options."));
        }

        let correct_raw = form.required(QUIZ_OPTION_FIELDS + 1)?;
        let correct: usize = correct_raw
            .parse()
            .context("Correct option must be a number.")?;
        if correct == 0 || correct > options.len() {
            return Err(anyhow!(
                "Correct option must be between 1 and {}.",
                options.len()
            ));
        }

        Ok(QuizQuestion {
            id: new_token_id(),
            question,
            options,
            correct_index: correct - 1,
            explanation: form.optional(QUIZ_OPTION_FIELDS + 2),
        })
    }
}

fn singular(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Study => "Study",
        ContentKind::Article => "Article",
        ContentKind::Prayer => "Prayer",
        ContentKind::Quiz => "Quiz Question",
    }
}

/// Name plus message, shared by new prayer requests and comments.
#[derive(Clone, Debug)]
pub(crate) struct MessageForm {
    pub(crate) form: TextForm,
}

impl MessageForm {
    pub(crate) fn new() -> Self {
        Self {
            form: TextForm::new(vec![
                FormField::text("Your name", true),
                FormField::text("Message", true),
            ]),
        }
    }

    fn parse_parts(&self) -> Result<(String, String)> {
        Ok((self.form.required(0)?, self.form.required(1)?))
    }

    pub(crate) fn parse_request(&self) -> Result<PrayerRequest> {
        let (author, content) = self.parse_parts()?;
        Ok(PrayerRequest::new(&author, &content))
    }

    pub(crate) fn parse_comment(&self) -> Result<Comment> {
        let (author, content) = self.parse_parts()?;
        Ok(Comment::new(&author, &content))
    }
}

/// Single-line prompt: a quiz topic, a feeling, or a question for the mentor.
#[derive(Clone, Debug)]
pub(crate) struct PromptForm {
    pub(crate) form: TextForm,
}

impl PromptForm {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            form: TextForm::new(vec![FormField::text(label, true)]),
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<String> {
        self.form.required(0)
    }
}

/// Pending removal from the admin screen.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) kind: ContentKind,
    pub(crate) id: String,
    pub(crate) headline: String,
}

impl ConfirmDelete {
    /// Build the confirmation state from the item being considered.
    pub(crate) fn from(item: &ContentItem) -> Self {
        Self {
            kind: item.kind(),
            id: item.id().to_string(),
            headline: item.headline(),
        }
    }
}
