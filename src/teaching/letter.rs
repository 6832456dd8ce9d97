//! Parent letters (Elternbriefe).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::LlmProvider;

use super::{Prompts, TeachingError, Template, Tone, ValidationError, required_text};

/// What kind of letter to write. Unknown kinds fall back to a plain letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LetterType {
    Wochenbericht,
    #[default]
    Elternbrief,
    Leistungsinfo,
    Ausflug,
}

impl LetterType {
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("wochenbericht") => LetterType::Wochenbericht,
            Some("leistungsinfo") => LetterType::Leistungsinfo,
            Some("ausflug") => LetterType::Ausflug,
            _ => LetterType::Elternbrief,
        }
    }

    fn description(self) -> &'static str {
        match self {
            LetterType::Wochenbericht => "einen Wochenbericht über den aktuellen Unterrichtsstand",
            LetterType::Elternbrief => "einen Elternbrief mit den wichtigsten Informationen",
            LetterType::Leistungsinfo => "eine Leistungsinformation mit Empfehlungen",
            LetterType::Ausflug => "eine Einladung/Information zu einem geplanten Ausflug oder Event",
        }
    }
}

fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Formell => "formell und professionell",
        Tone::Einfach => "einfach und verständlich",
        Tone::Freundlich => "freundlich und einladend",
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLetterRequest {
    #[serde(default)]
    pub class_name: Option<Value>,
    #[serde(default)]
    pub topics: Option<Value>,
    #[serde(default)]
    pub tone: Option<Value>,
    #[serde(default, rename = "type")]
    pub letter_type: Option<Value>,
    #[serde(default)]
    pub custom_note: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParentLetterInput {
    pub class_name: String,
    pub topics: Vec<String>,
    pub tone: Tone,
    pub letter_type: LetterType,
    pub custom_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLetter {
    pub content: String,
}

impl ParentLetterRequest {
    pub fn validate(&self) -> Result<ParentLetterInput, ValidationError> {
        let missing = || ValidationError::new("className and topics required");

        let class_name = required_text(self.class_name.as_ref()).ok_or_else(missing)?;
        let topics: Vec<String> = self
            .topics
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|t| required_text(Some(t)))
                    .collect()
            })
            .unwrap_or_default();
        if topics.is_empty() {
            return Err(missing());
        }

        Ok(ParentLetterInput {
            class_name,
            topics,
            tone: Tone::parse_lenient(self.tone.as_ref().and_then(Value::as_str)),
            letter_type: LetterType::parse_lenient(self.letter_type.as_ref().and_then(Value::as_str)),
            custom_note: required_text(self.custom_note.as_ref()),
        })
    }
}

impl ParentLetterInput {
    pub fn prompt(&self, prompts: &Prompts) -> String {
        let note = self
            .custom_note
            .as_ref()
            .map(|n| format!("Zusätzliche Hinweise: {n}"))
            .unwrap_or_default();

        prompts
            .builder()
            .layer(Template::ParentLetter)
            .var("letter_type", self.letter_type.description())
            .var("class_name", &self.class_name)
            .var("topics", self.topics.join(", "))
            .var("tone", tone_instruction(self.tone))
            .var("custom_note", note)
            .build()
    }
}

pub async fn generate(
    llm: &LlmProvider,
    prompts: &Prompts,
    input: &ParentLetterInput,
) -> Result<ParentLetter, TeachingError> {
    let content = llm.generate(&input.prompt(prompts), None).await?;
    Ok(ParentLetter { content })
}
