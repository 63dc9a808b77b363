//! Records persisted by the content store. Field names on the wire follow the
//! stored JSON layout (`correctIndex`, `userName`, epoch-millisecond
//! `timestamp`), so data written by earlier builds keeps loading.

use std::fmt;

use chrono::{Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A daily Bible study: a verse with meditation, application and a prayer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: String,
    pub title: String,
    pub verse: String,
    pub explanation: String,
    pub application: String,
    pub prayer: String,
    /// Display label, not parsed.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub timestamp: i64,
}

/// A reflection article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub timestamp: i64,
}

/// When a prayer is meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerKind {
    #[serde(alias = "manha")]
    Morning,
    #[serde(alias = "noite")]
    Night,
    #[serde(alias = "personalizada")]
    Custom,
}

impl PrayerKind {
    pub const ALL: [PrayerKind; 3] = [PrayerKind::Morning, PrayerKind::Night, PrayerKind::Custom];

    /// Next kind in display order, used by the admin form selector.
    pub fn next(self) -> Self {
        match self {
            PrayerKind::Morning => PrayerKind::Night,
            PrayerKind::Night => PrayerKind::Custom,
            PrayerKind::Custom => PrayerKind::Morning,
        }
    }
}

impl fmt::Display for PrayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PrayerKind::Morning => "Morning",
            PrayerKind::Night => "Night",
            PrayerKind::Custom => "Custom",
        };
        write!(f, "{label}")
    }
}

/// A prayer. There is no timestamp: insertion order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PrayerKind,
    pub title: String,
    pub content: String,
    pub date: String,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// True when `correct_index` points at an existing option.
    pub fn is_well_formed(&self) -> bool {
        self.correct_index < self.options.len()
    }
}

/// A reply in a prayer request thread. Owned by exactly one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "userName")]
    pub author: String,
    pub content: String,
    pub timestamp: i64,
}

impl Comment {
    pub fn new(author: &str, content: &str) -> Self {
        Self {
            id: new_token_id(),
            author: author.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
        }
    }
}

/// A community prayer request with its amen counter and comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerRequest {
    pub id: String,
    #[serde(rename = "userName")]
    pub author: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(default)]
    pub amens: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl PrayerRequest {
    /// Fresh request with a random token id, so two posted within the same
    /// millisecond stay distinct.
    pub fn new(author: &str, content: &str) -> Self {
        Self {
            id: new_token_id(),
            author: author.to_string(),
            content: content.to_string(),
            timestamp: now_millis(),
            amens: 0,
            comments: Vec::new(),
        }
    }
}

/// Discriminant for the curated collections shown in the admin screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Study,
    Article,
    Prayer,
    Quiz,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Study,
        ContentKind::Article,
        ContentKind::Quiz,
        ContentKind::Prayer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Study => "Studies",
            ContentKind::Article => "Articles",
            ContentKind::Prayer => "Prayers",
            ContentKind::Quiz => "Quiz",
        }
    }
}

/// Any curated record, tagged with its collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentItem {
    Study(Study),
    Article(Article),
    Prayer(Prayer),
    Quiz(QuizQuestion),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::Study(_) => ContentKind::Study,
            ContentItem::Article(_) => ContentKind::Article,
            ContentItem::Prayer(_) => ContentKind::Prayer,
            ContentItem::Quiz(_) => ContentKind::Quiz,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ContentItem::Study(study) => &study.id,
            ContentItem::Article(article) => &article.id,
            ContentItem::Prayer(prayer) => &prayer.id,
            ContentItem::Quiz(question) => &question.id,
        }
    }

    /// Main line for list rows: the title, the question, or the start of the
    /// content when a prayer has no title.
    pub fn headline(&self) -> String {
        match self {
            ContentItem::Study(study) => study.title.clone(),
            ContentItem::Article(article) => article.title.clone(),
            ContentItem::Quiz(question) => question.question.clone(),
            ContentItem::Prayer(prayer) => {
                if prayer.title.trim().is_empty() {
                    excerpt(&prayer.content, 30)
                } else {
                    prayer.title.clone()
                }
            }
        }
    }

    /// Secondary line for list rows.
    pub fn subtitle(&self) -> String {
        match self {
            ContentItem::Study(study) => study.date.clone(),
            ContentItem::Article(article) => article.date.clone(),
            ContentItem::Prayer(prayer) => format!("{} • {}", prayer.kind, prayer.date),
            ContentItem::Quiz(_) => "Quiz question".to_string(),
        }
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 9;

/// Random short base-36 token. Practically unique, not guaranteed.
pub fn new_token_id() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Creation time in milliseconds rendered as a string.
pub fn timestamp_id() -> String {
    now_millis().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's date as a `dd/mm/yyyy` display label.
pub fn today_label() -> String {
    Local::now().format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prayer_kind_accepts_legacy_values() {
        let prayer: Prayer = serde_json::from_str(
            r#"{"id":"p1","type":"manha","title":"Morning","content":"Lord","date":"01/01/2024"}"#,
        )
        .unwrap();
        assert_eq!(prayer.kind, PrayerKind::Morning);

        let json = serde_json::to_string(&prayer).unwrap();
        assert!(json.contains(r#""type":"morning""#));
    }

    #[test]
    fn quiz_question_uses_camel_case_index() {
        let question: QuizQuestion = serde_json::from_str(
            r#"{"id":"q1","question":"?","options":["A","B"],"correctIndex":1}"#,
        )
        .unwrap();
        assert_eq!(question.correct_index, 1);
        assert!(question.is_well_formed());
        assert!(question.explanation.is_none());

        let json = serde_json::to_string(&question).unwrap();
        assert!(json.contains("correctIndex"));
        assert!(!json.contains("explanation"));
    }

    #[test]
    fn out_of_range_index_is_not_well_formed() {
        let question = QuizQuestion {
            id: "q".into(),
            question: "?".into(),
            options: vec!["A".into()],
            correct_index: 1,
            explanation: None,
        };
        assert!(!question.is_well_formed());
    }

    #[test]
    fn request_without_comments_defaults_to_empty_thread() {
        let request: PrayerRequest = serde_json::from_str(
            r#"{"id":"r1","userName":"Ana","content":"Pray for me","timestamp":1}"#,
        )
        .unwrap();
        assert_eq!(request.amens, 0);
        assert!(request.comments.is_empty());
    }

    #[test]
    fn content_item_carries_discriminant() {
        let item = ContentItem::Quiz(QuizQuestion {
            id: "q9".into(),
            question: "Who built the ark?".into(),
            options: vec!["Noah".into(), "Moses".into()],
            correct_index: 0,
            explanation: None,
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "quiz");
        assert_eq!(item.kind(), ContentKind::Quiz);
        assert_eq!(item.headline(), "Who built the ark?");
        assert_eq!(item.subtitle(), "Quiz question");
    }

    #[test]
    fn untitled_prayer_headline_falls_back_to_excerpt() {
        let item = ContentItem::Prayer(Prayer {
            id: "p".into(),
            kind: PrayerKind::Custom,
            title: String::new(),
            content: "Lord, give me peace in the middle of this storm today.".into(),
            date: "01/01/2024".into(),
        });
        assert_eq!(item.headline(), "Lord, give me peace in the mid...");
    }

    #[test]
    fn token_ids_are_short_base36() {
        let id = new_token_id();
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn back_to_back_requests_get_distinct_ids() {
        let requests: Vec<PrayerRequest> = (0..50)
            .map(|n| PrayerRequest::new("Ana", &format!("request {n}")))
            .collect();
        let mut ids: Vec<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), requests.len());

        let first = Comment::new("João", "praying");
        let second = Comment::new("João", "praying");
        assert_ne!(first.id, second.id);
    }
}
