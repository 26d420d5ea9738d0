use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::model::card::Card;

/// Static priorities used only to fill the prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Priorities {
    #[serde(rename = "year", default)]
    pub long_term: Vec<String>,
    #[serde(rename = "short-term", default)]
    pub short_term: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
}

impl Priorities {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read priorities from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Priorities,
    Short,
    Context,
    NoteText,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "priorities" => Some(Field::Priorities),
            "short" => Some(Field::Short),
            "context" => Some(Field::Context),
            "note_text" => Some(Field::NoteText),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Prompt text with `{priorities}`, `{short}`, `{context}` and `{note_text}`
/// placeholders. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template from {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid template {}", path.display()))
    }

    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => bail!("unclosed placeholder '{{{name}'"),
                        }
                    }
                    let field = Field::parse(name.trim())
                        .with_context(|| format!("unknown placeholder '{{{name}}}'"))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => bail!("single '}}' outside a placeholder"),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, priorities: &Priorities, note_text: &str) -> String {
        let long_term = bullets(&priorities.long_term);
        let short_term = bullets(&priorities.short_term);
        let context = bullets(&priorities.context);

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::Priorities) => out.push_str(&long_term),
                Segment::Field(Field::Short) => out.push_str(&short_term),
                Segment::Field(Field::Context) => out.push_str(&context),
                Segment::Field(Field::NoteText) => out.push_str(note_text),
            }
        }
        out
    }
}

/// The note handed to the model for one card.
pub fn note_text(card: &Card) -> String {
    let mut note = format!("Title: {}", card.name);
    if let Some(desc) = card.description() {
        note.push_str("\nDescription: ");
        note.push_str(desc);
    }
    note
}
