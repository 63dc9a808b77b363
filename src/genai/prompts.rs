//! Request bodies and response parsing for the `generateContent` endpoint.
//! Everything here is pure so it can be tested without a network.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::models::QuizQuestion;

/// Number of questions requested per generated quiz.
pub const QUIZ_SIZE: usize = 3;

pub fn quiz_prompt(topic: &str, language: &str) -> String {
    format!(
        "Generate {QUIZ_SIZE} quiz questions about the theme \"{topic}\". Write them in {language}. \
         Return only JSON following this schema: \
         Array<{{question: string, options: string[], correctIndex: number}}>"
    )
}

pub fn prayer_prompt(mood: &str, language: &str) -> String {
    format!(
        "Write a short, heartfelt prayer in {language} for someone who is feeling: {mood}. \
         Begin with \"Lord,\" and end with \"Amen.\""
    )
}

pub fn insight_prompt(verse: &str, context: &str, language: &str) -> String {
    format!(
        "Analyse the verse \"{verse}\" in the context of: {context}. Answer in {language} and provide: \
         1. Original meaning, 2. Application for today, 3. A short prayer. Use Markdown."
    )
}

pub fn mentor_prompt(question: &str, language: &str) -> String {
    format!(
        "You are a wise and welcoming Bible mentor. Answer the following question in {language}, \
         biblically and encouragingly: \"{question}\""
    )
}

/// Plain text generation request.
pub fn text_request(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

/// Text generation constrained to the quiz JSON schema.
pub fn quiz_request(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "correctIndex": { "type": "NUMBER" }
                    },
                    "required": ["question", "options", "correctIndex"]
                }
            }
        }
    })
}

/// Speech synthesis request returning base64 PCM in `inlineData`.
pub fn speech_request(text: &str, voice: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

fn first_parts(body: &str) -> Result<Vec<Part>, ServiceError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|err| ServiceError::Parse(err.to_string()))?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .ok_or_else(|| ServiceError::Parse("response has no candidates".to_string()))
}

/// Concatenated text of the first candidate. Blank text counts as no answer.
pub fn extract_text(body: &str) -> Result<String, ServiceError> {
    let text: String = first_parts(body)?
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Parse("response text is empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Base64 audio payload of the first candidate.
pub fn extract_audio(body: &str) -> Result<String, ServiceError> {
    first_parts(body)?
        .into_iter()
        .find_map(|part| part.inline_data.map(|inline| inline.data))
        .ok_or_else(|| ServiceError::Parse("response has no audio data".to_string()))
}

/// A quiz question as produced by the model, before it gets an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_index: f64,
}

impl GeneratedQuestion {
    /// Index as a usize when it is a whole number pointing at an option.
    fn valid_index(&self) -> Option<usize> {
        let index = self.correct_index;
        if index.fract() != 0.0 || index < 0.0 {
            return None;
        }
        let index = index as usize;
        (index < self.options.len()).then_some(index)
    }

    fn is_usable(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() >= 2
            && self.options.iter().all(|option| !option.trim().is_empty())
            && self.valid_index().is_some()
    }

    pub fn into_question(self, id: String) -> QuizQuestion {
        let correct_index = self.valid_index().unwrap_or(0);
        QuizQuestion {
            id,
            question: self.question.trim().to_string(),
            options: self
                .options
                .into_iter()
                .map(|option| option.trim().to_string())
                .collect(),
            correct_index,
            explanation: None,
        }
    }
}

/// Parse the quiz JSON the model returned, dropping unusable questions.
pub fn parse_quiz(text: &str) -> Result<Vec<GeneratedQuestion>, ServiceError> {
    let cleaned = strip_code_fence(text);
    let questions: Vec<GeneratedQuestion> =
        serde_json::from_str(cleaned).map_err(|err| ServiceError::Parse(err.to_string()))?;
    let usable: Vec<GeneratedQuestion> = questions.into_iter().filter(|q| q.is_usable()).collect();
    if usable.is_empty() {
        return Err(ServiceError::Parse("no usable quiz questions".to_string()));
    }
    Ok(usable)
}

/// Models occasionally wrap JSON in a Markdown fence despite the MIME type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches("json");
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
