//! Prompt templates and the builder that fills them.
//!
//! Templates live as plain text under `config/prompts/` (configurable via
//! `server.prompts_dir`). A deployment can edit them without rebuilding; when
//! a file is missing the copy compiled into the binary is used instead.
//!
//! Variables use `{{key}}` syntax and are substituted in a single pass at
//! [`build()`](PromptBuilder::build) time, so values that themselves contain
//! `{{...}}` are inserted verbatim and never re-expanded.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const SEPARATOR: &str = "\n\n";

/// Every template the server renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    LessonPlan,
    ParentLetter,
    Insights,
    ChatSystem,
    ChatLanguage,
    Curriculum,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Template::LessonPlan,
        Template::ParentLetter,
        Template::Insights,
        Template::ChatSystem,
        Template::ChatLanguage,
        Template::Curriculum,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Template::LessonPlan => "lesson_plan.txt",
            Template::ParentLetter => "parent_letter.txt",
            Template::Insights => "insights.txt",
            Template::ChatSystem => "chat_system.txt",
            Template::ChatLanguage => "chat_language.txt",
            Template::Curriculum => "curriculum.txt",
        }
    }

    /// Copy compiled into the binary.
    pub fn builtin(self) -> &'static str {
        match self {
            Template::LessonPlan => include_str!("../../config/prompts/lesson_plan.txt"),
            Template::ParentLetter => include_str!("../../config/prompts/parent_letter.txt"),
            Template::Insights => include_str!("../../config/prompts/insights.txt"),
            Template::ChatSystem => include_str!("../../config/prompts/chat_system.txt"),
            Template::ChatLanguage => include_str!("../../config/prompts/chat_language.txt"),
            Template::Curriculum => include_str!("../../config/prompts/curriculum.txt"),
        }
    }
}

/// Handle on the prompts directory, shared by all handlers.
#[derive(Debug, Clone)]
pub struct Prompts {
    dir: PathBuf,
}

impl Prompts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Template text, trimmed. Reads from disk on every call so edits apply
    /// to the next request.
    pub fn load(&self, template: Template) -> String {
        let path = self.dir.join(template.file_name());
        match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(_) => {
                tracing::debug!("prompt: '{}' not found — using built-in", path.display());
                template.builtin().trim().to_string()
            }
        }
    }

    pub fn builder(&self) -> PromptBuilder {
        PromptBuilder { prompts: self.clone(), parts: Vec::new(), vars: HashMap::new() }
    }
}

/// Fluent builder that assembles a prompt from templates and inline text.
pub struct PromptBuilder {
    prompts: Prompts,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// Append a template as the next layer.
    pub fn layer(mut self, template: Template) -> Self {
        let text = self.prompts.load(template);
        if !text.is_empty() {
            self.parts.push(text);
        }
        self
    }

    /// Register a `{{key}}` → `value` substitution applied at build time.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join layers with blank lines and substitute variables.
    /// Unknown placeholders are left as they are.
    pub fn build(self) -> String {
        substitute(&self.parts.join(SEPARATOR), &self.vars)
    }
}

fn substitute(text: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
