use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::db::KeyValueStore;
use crate::models::{excerpt, ContentKind};
use crate::quiz::QuizState;

use super::app::{App, Mode, Screen};
use super::forms::{ConfirmDelete, TextForm};
use super::helpers::{centered_rect, hint_line, row_marker, visible_window};
use super::screens::{
    AdminScreen, ArticlesScreen, CommunityScreen, Destination, Generated, HomeScreen,
    MentorState, PrayersScreen, QuizScreen, StudiesScreen,
};

const FOOTER_HEIGHT: u16 = 3;
const FEATURED_VERSE: &str = "Your word is a lamp for my feet, a light on my path.";
const FEATURED_REFERENCE: &str = "Psalm 119:105";
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn empty_state(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);
}

impl<S: KeyValueStore> App<S> {
    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Home(home) => self.draw_home(frame, content_area, home),
            Screen::Studies(studies) => self.draw_studies(frame, content_area, studies),
            Screen::Articles(articles) => self.draw_articles(frame, content_area, articles),
            Screen::Prayers(prayers) => self.draw_prayers(frame, content_area, prayers),
            Screen::Quiz(quiz) => self.draw_quiz(frame, content_area, quiz),
            Screen::Community(board) => self.draw_community(frame, content_area, board),
            Screen::Admin(admin) => self.draw_admin(frame, content_area, admin),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::CreatingContent(form) => {
                self.draw_form(frame, area, &form.title(), &form.form, "Enter to save")
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::PostingRequest(form) => {
                self.draw_form(frame, area, "New Prayer Request", &form.form, "Enter to post")
            }
            Mode::Commenting { form, .. } => {
                self.draw_form(frame, area, "Comment", &form.form, "Enter to send")
            }
            Mode::QuizTopic(form) => {
                self.draw_form(frame, area, "Generate Quiz", &form.form, "Enter to generate")
            }
            Mode::AdminTopic(form) => {
                self.draw_form(frame, area, "Create with AI", &form.form, "Enter to generate")
            }
            Mode::Mentor(state) => self.draw_mentor(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect, home: &HomeScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(format!("\"{FEATURED_VERSE}\""), bold())),
            Line::from(Span::styled(
                FEATURED_REFERENCE,
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Daily Bread"));
        frame.render_widget(header, chunks[0]);

        let lines: Vec<Line> = Destination::MENU
            .iter()
            .enumerate()
            .map(|(index, destination)| {
                let (marker, style) = row_marker(index == home.selected);
                Line::from(vec![
                    Span::styled(
                        format!("{marker}{}. {:<14}", index + 1, destination.title()),
                        style,
                    ),
                    Span::styled(
                        destination.description(),
                        Style::default().fg(Color::Gray),
                    ),
                ])
            })
            .collect();
        let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, chunks[1]);
    }

    fn draw_studies(&self, frame: &mut Frame, area: Rect, studies: &StudiesScreen) {
        let Some(study) = studies.current() else {
            empty_state(frame, area, "Studies", "No studies yet. Add one from Content Admin.");
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(7),
            ])
            .split(area);

        let steps: Vec<Span> = (0..studies.studies.len())
            .flat_map(|index| {
                let style = if index == studies.step {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else if index < studies.step {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [Span::styled(format!(" {} ", index + 1), style), Span::raw(" ")]
            })
            .collect();
        let indicator = Paragraph::new(Line::from(steps)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Journey: step {} of {}", studies.step + 1, studies.studies.len())),
        );
        frame.render_widget(indicator, chunks[0]);

        let body = vec![
            Line::from(Span::styled(study.title.clone(), bold())),
            Line::from(Span::styled(study.date.clone(), Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(Span::styled(
                study.verse.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(""),
            heading("Meditation"),
            Line::from(study.explanation.clone()),
            Line::from(""),
            heading("Application"),
            Line::from(study.application.clone()),
            Line::from(""),
            heading("Prayer"),
            Line::from(study.prayer.clone()),
        ];
        let paragraph = Paragraph::new(body)
            .wrap(Wrap { trim: true })
            .scroll((studies.scroll, 0))
            .block(Block::default().borders(Borders::ALL).title("Study"));
        frame.render_widget(paragraph, chunks[1]);

        let insight = match &studies.insight {
            Generated::Ready(text) => Line::from(text.clone()),
            Generated::Failed => Line::from(Span::styled(
                "Could not get an insight. Press i to try again.",
                Style::default().fg(Color::Red),
            )),
            Generated::Idle if studies.slot.is_pending() => {
                hint_line("Seeking insight...")
            }
            Generated::Idle => hint_line("Press i for a deeper insight on this verse."),
        };
        let panel = Paragraph::new(insight)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Insight"));
        frame.render_widget(panel, chunks[2]);
    }

    fn draw_articles(&self, frame: &mut Frame, area: Rect, articles: &ArticlesScreen) {
        if articles.articles.is_empty() {
            empty_state(frame, area, "Articles", "No articles yet.");
            return;
        }

        if articles.reading {
            if let Some(article) = articles.current_article() {
                let mut lines = vec![
                    Line::from(Span::styled(article.title.clone(), bold())),
                    Line::from(Span::styled(
                        format!("{} • {}", article.author, article.date),
                        Style::default().fg(Color::Gray),
                    )),
                ];
                if let Some(image) = article.image.as_deref().filter(|i| !i.trim().is_empty()) {
                    lines.push(Line::from(Span::styled(
                        format!("Image: {image}"),
                        Style::default().fg(Color::Blue),
                    )));
                }
                lines.push(Line::from(""));
                lines.extend(article.content.lines().map(|line| Line::from(line.to_string())));

                let paragraph = Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((articles.scroll, 0))
                    .block(Block::default().borders(Borders::ALL).title("Article"));
                frame.render_widget(paragraph, area);
                return;
            }
        }

        let rows_per_item = 3usize;
        let capacity = (area.height.saturating_sub(2) as usize / rows_per_item).max(1);
        let (start, end) = visible_window(articles.selected, articles.articles.len(), capacity);
        let mut lines = Vec::new();
        for (index, article) in articles.articles[start..end].iter().enumerate() {
            let (marker, style) = row_marker(start + index == articles.selected);
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", article.title),
                style,
            )));
            lines.push(Line::from(Span::styled(
                format!("  {} • {}  {}", article.author, article.date, excerpt(&article.content, 50)),
                Style::default().fg(Color::Gray),
            )));
            lines.push(Line::from(""));
        }
        let list = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Articles ({})", articles.articles.len())),
        );
        frame.render_widget(list, area);
    }

    fn draw_prayers(&self, frame: &mut Frame, area: Rect, prayers: &PrayersScreen) {
        if prayers.prayers.is_empty() {
            empty_state(frame, area, "Prayers", "No prayers yet.");
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let lines: Vec<Line> = prayers
            .prayers
            .iter()
            .enumerate()
            .map(|(index, prayer)| {
                let (marker, style) = row_marker(index == prayers.selected);
                let speaker = if prayers.is_preparing(&prayer.id) || prayers.is_playing(&prayer.id) {
                    " ♪"
                } else {
                    ""
                };
                Line::from(vec![
                    Span::styled(format!("{marker}{}", prayer.title), style),
                    Span::styled(format!(" ({}){speaker}", prayer.kind), Style::default().fg(Color::Gray)),
                ])
            })
            .collect();
        let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Prayers"));
        frame.render_widget(list, chunks[0]);

        if let Some(prayer) = prayers.current_prayer() {
            let mut lines = vec![
                Line::from(Span::styled(prayer.title.clone(), bold())),
                Line::from(Span::styled(
                    format!("{} • {}", prayer.kind, prayer.date),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(""),
            ];
            lines.extend(prayer.content.lines().map(|line| Line::from(line.to_string())));
            lines.push(Line::from(""));
            if prayers.is_preparing(&prayer.id) {
                lines.push(hint_line("Preparing audio... press Enter to stop."));
            } else if prayers.is_playing(&prayer.id) {
                lines.push(hint_line("Playing... press Enter to stop."));
            } else {
                lines.push(hint_line("Press Enter to listen."));
            }
            let paragraph = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Prayer"));
            frame.render_widget(paragraph, chunks[1]);
        }
    }

    fn draw_quiz(&self, frame: &mut Frame, area: Rect, quiz: &QuizScreen) {
        let title = match &quiz.generating {
            Some(topic) => format!("Quiz (generating: {topic})"),
            None => "Quiz".to_string(),
        };
        let Some(session) = &quiz.session else {
            empty_state(frame, area, &title, "No questions yet. Press g to generate a quiz.");
            return;
        };

        let block = Block::default().borders(Borders::ALL).title(title);
        let (position, total) = session.progress();

        if let QuizState::Finished { final_score } = session.state() {
            let percent = session.percentage().unwrap_or_default();
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled("Quiz complete!", bold())),
                Line::from(""),
                Line::from(format!("You got {final_score} of {total} right.")),
                Line::from(Span::styled(
                    format!("{percent}%"),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                hint_line("Press r to play again or g for a new quiz."),
            ];
            let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let Some(question) = session.current_question() else {
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                format!("Question {position} of {total}  •  Score {}", session.score()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            Line::from(Span::styled(question.question.clone(), bold())),
            Line::from(""),
        ];

        for (index, option) in question.options.iter().enumerate() {
            let label = OPTION_LABELS.get(index).copied().unwrap_or('?');
            let marker = if index == quiz.cursor { "▶ " } else { "  " };
            let style = match quiz.outcome {
                Some(outcome) if index == outcome.correct_index => {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                }
                Some(outcome) if index == outcome.selected => Style::default().fg(Color::Red),
                Some(_) => Style::default().fg(Color::DarkGray),
                None if index == quiz.cursor => Style::default().fg(Color::Yellow),
                None => Style::default(),
            };
            lines.push(Line::from(Span::styled(
                format!("{marker}{label}) {option}"),
                style,
            )));
        }

        if let Some(outcome) = quiz.outcome {
            lines.push(Line::from(""));
            let verdict = if outcome.is_correct {
                Span::styled("Correct!", Style::default().fg(Color::Green))
            } else {
                Span::styled("Not quite.", Style::default().fg(Color::Red))
            };
            lines.push(Line::from(verdict));
            if let Some(explanation) = &question.explanation {
                lines.push(Line::from(explanation.clone()));
            }
            lines.push(hint_line("Press Enter for the next question."));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
        frame.render_widget(paragraph, area);
    }

    fn draw_community(&self, frame: &mut Frame, area: Rect, board: &CommunityScreen) {
        if board.requests.is_empty() {
            empty_state(
                frame,
                area,
                "Prayer Wall",
                "No requests yet. Press + to share the first one.",
            );
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let rows_per_item = 2usize;
        let capacity = (chunks[0].height.saturating_sub(2) as usize / rows_per_item).max(1);
        let (start, end) = visible_window(board.selected, board.requests.len(), capacity);
        let mut lines = Vec::new();
        for (index, request) in board.requests[start..end].iter().enumerate() {
            let (marker, style) = row_marker(start + index == board.selected);
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", excerpt(&request.content, 40)),
                style,
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "  {} • {} amen • {} comments",
                    request.author,
                    request.amens,
                    request.comments.len()
                ),
                Style::default().fg(Color::Gray),
            )));
        }
        let list = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Prayer Wall ({})", board.requests.len())),
        );
        frame.render_widget(list, chunks[0]);

        if let Some(request) = board.current_request() {
            let mut lines = vec![
                Line::from(Span::styled(request.author.clone(), bold())),
                Line::from(request.content.clone()),
                Line::from(Span::styled(
                    format!("🙏 {} amen", request.amens),
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(""),
                heading("Comments"),
            ];
            if request.comments.is_empty() {
                lines.push(hint_line("No comments yet. Press c to add one."));
            }
            for comment in &request.comments {
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", comment.author), bold()),
                    Span::raw(comment.content.clone()),
                ]));
            }
            let thread = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Request"));
            frame.render_widget(thread, chunks[1]);
        }
    }

    fn draw_admin(&self, frame: &mut Frame, area: Rect, admin: &AdminScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let titles: Vec<&str> = ContentKind::ALL.iter().map(|kind| kind.label()).collect();
        let tabs = Tabs::new(titles)
            .select(admin.tab)
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).title("Content Admin"));
        frame.render_widget(tabs, chunks[0]);

        let title = match &admin.generating {
            Some(topic) => format!("{} (generating: {topic})", admin.kind().label()),
            None => format!("{} ({})", admin.kind().label(), admin.items.len()),
        };
        if admin.items.is_empty() {
            empty_state(frame, chunks[1], &title, "Nothing here yet. Press + to add.");
            return;
        }

        let rows_per_item = 2usize;
        let capacity = (chunks[1].height.saturating_sub(2) as usize / rows_per_item).max(1);
        let (start, end) = visible_window(admin.selected, admin.items.len(), capacity);
        let mut lines = Vec::new();
        for (index, item) in admin.items[start..end].iter().enumerate() {
            let (marker, style) = row_marker(start + index == admin.selected);
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", excerpt(&item.headline(), 60)),
                style,
            )));
            lines.push(Line::from(Span::styled(
                format!("  {}", item.subtitle()),
                Style::default().fg(Color::Gray),
            )));
        }
        let list = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, chunks[1]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let text = match &self.mode {
            Mode::Normal => match &self.screen {
                Screen::Home(_) => "↑/↓ choose • Enter/1-6 open • m mentor • q quit",
                Screen::Studies(_) => {
                    "←/→ step • ↑/↓ scroll • i insight • m mentor • Esc home"
                }
                Screen::Articles(articles) if articles.reading => {
                    "↑/↓ scroll • o open image • Enter/Esc back"
                }
                Screen::Articles(_) => "↑/↓ choose • Enter read • o open image • Esc home",
                Screen::Prayers(_) => "↑/↓ choose • Enter listen/stop • m mentor • Esc home",
                Screen::Quiz(_) => {
                    "↑/↓ choose • Enter answer/next • 1-4 answer • r restart • g generate • Esc home"
                }
                Screen::Community(_) => "↑/↓ choose • + post • a amen • c comment • Esc home",
                Screen::Admin(_) => {
                    "Tab/←/→ collection • + add • - delete • g create with AI • Esc home"
                }
            },
            Mode::ConfirmDelete(_) => "y confirm • n/Esc cancel",
            Mode::Mentor(_) => "Enter ask • ↑/↓ scroll • Esc close",
            _ => "Enter submit • Tab next field • Esc cancel",
        };
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &TextForm, submit: &str) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(hint_line(&format!(
                "{submit} • Tab to switch • Esc to cancel"
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + (form.label_len(form.active) + form.value_len(form.active)) as u16;
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), cursor_y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Removal").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete \"{}\" from {}?",
                excerpt(&confirm.headline, 50),
                confirm.kind.label()
            )),
            Line::from(""),
            hint_line("Press Y to confirm or N / Esc to cancel."),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_mentor(&self, frame: &mut Frame, area: Rect, state: &MentorState) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Bible Mentor").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let mut prompt_lines = vec![state.prompt.form.build_line(0)];
        if let Some(error) = &state.prompt.form.error {
            prompt_lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        frame.render_widget(Paragraph::new(prompt_lines), chunks[0]);

        let mut lines = Vec::new();
        if let Some(asked) = &state.asked {
            lines.push(Line::from(Span::styled(format!("You asked: {asked}"), bold())));
            lines.push(Line::from(""));
        }
        match &state.answer {
            Generated::Ready(text) => {
                lines.extend(text.lines().map(|line| Line::from(line.to_string())))
            }
            Generated::Failed => lines.push(Line::from(Span::styled(
                "The mentor could not answer. Try asking again.",
                Style::default().fg(Color::Red),
            ))),
            Generated::Idle if state.slot.is_pending() => lines.push(hint_line("Thinking...")),
            Generated::Idle => lines.push(hint_line(
                "Ask anything about the Bible, its people or its places.",
            )),
        }
        let answer = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .scroll((state.scroll, 0));
        frame.render_widget(answer, chunks[1]);

        let form = &state.prompt.form;
        let cursor_x = chunks[0].x + (form.label_len(0) + form.value_len(0)) as u16;
        frame.set_cursor_position((cursor_x.min(chunks[0].right().saturating_sub(1)), chunks[0].y));
    }
}
