//! Lesson plan generation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::llm::LlmProvider;

use super::{Prompts, TeachingError, Template, ValidationError, loose_number, parse_json, required_text};

/// Grades the planner covers (Sekundarstufe I + II).
pub const GRADE_RANGE: std::ops::RangeInclusive<u8> = 5..=12;
/// Lesson length in minutes, single to double period.
pub const MINUTES_RANGE: std::ops::RangeInclusive<u16> = 30..=90;

/// Request body as clients send it: numbers may arrive as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanRequest {
    #[serde(default)]
    pub thema: Option<Value>,
    #[serde(default)]
    pub klasse: Option<Value>,
    #[serde(default)]
    pub fach: Option<Value>,
    #[serde(default)]
    pub zeit: Option<Value>,
    #[serde(default)]
    pub tone: Option<Value>,
    #[serde(default)]
    pub klassen_name: Option<Value>,
}

/// Validated planner input.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonPlanInput {
    pub thema: String,
    pub klasse: u8,
    pub fach: String,
    pub zeit: u16,
    pub tone: Option<String>,
    pub klassen_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPhase {
    #[serde(default)]
    pub name: String,
    /// Minutes.
    #[serde(default)]
    pub dauer: u32,
    #[serde(default)]
    pub beschreibung: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    #[serde(default)]
    pub ziele: String,
    #[serde(default)]
    pub phasen: Vec<LessonPhase>,
    #[serde(default)]
    pub materialien: Vec<String>,
    #[serde(default)]
    pub hausaufgaben: String,
}

impl LessonPlan {
    pub fn total_minutes(&self) -> u32 {
        self.phasen.iter().map(|p| p.dauer).sum()
    }
}

fn whole_in_range<T>(value: Option<&Value>, range: &std::ops::RangeInclusive<T>) -> Option<T>
where
    T: Copy + PartialOrd + Into<f64> + TryFrom<u32>,
{
    let n = loose_number(value)?;
    if n.fract() != 0.0 || n < (*range.start()).into() || n > (*range.end()).into() {
        return None;
    }
    T::try_from(n as u32).ok()
}

impl LessonPlanRequest {
    pub fn validate(&self) -> Result<LessonPlanInput, ValidationError> {
        let thema = required_text(self.thema.as_ref()).ok_or_else(|| ValidationError::new("thema is required"))?;
        let klasse = whole_in_range(self.klasse.as_ref(), &GRADE_RANGE)
            .ok_or_else(|| ValidationError::new("klasse must be 5–12"))?;
        let fach = required_text(self.fach.as_ref()).ok_or_else(|| ValidationError::new("fach is required"))?;
        let zeit = whole_in_range(self.zeit.as_ref(), &MINUTES_RANGE)
            .ok_or_else(|| ValidationError::new("zeit must be 30–90"))?;

        Ok(LessonPlanInput {
            thema,
            klasse,
            fach,
            zeit,
            tone: required_text(self.tone.as_ref()),
            klassen_name: required_text(self.klassen_name.as_ref()),
        })
    }
}

impl LessonPlanInput {
    pub fn prompt(&self, prompts: &Prompts) -> String {
        let mut extra = String::new();
        if let Some(name) = &self.klassen_name {
            extra.push_str(&format!("\nKlasse/Gruppe: {name}"));
        }
        if let Some(tone) = &self.tone {
            extra.push_str(&format!("\nTon/Stil: Antworte in einem {tone}en Stil."));
        }

        prompts
            .builder()
            .layer(Template::LessonPlan)
            .var("context", prompts.load(Template::Curriculum))
            .var("thema", &self.thema)
            .var("klasse", self.klasse.to_string())
            .var("fach", &self.fach)
            .var("zeit", self.zeit.to_string())
            .var("extra", extra)
            .build()
    }
}

pub async fn generate(
    llm: &LlmProvider,
    prompts: &Prompts,
    input: &LessonPlanInput,
) -> Result<LessonPlan, TeachingError> {
    let prompt = input.prompt(prompts);
    let reply = llm.generate(&prompt, None).await?;
    let plan: LessonPlan = parse_json(&reply)?;
    debug!(
        thema = %input.thema,
        phases = plan.phasen.len(),
        minutes = plan.total_minutes(),
        "lesson plan generated"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;
    use serde_json::json;

    fn request(body: Value) -> LessonPlanRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid() -> Value {
        json!({"thema": " Photosynthese ", "klasse": 8, "fach": "Biologie", "zeit": "45"})
    }

    #[test]
    fn accepts_numeric_strings_and_trims() {
        let input = request(valid()).validate().unwrap();
        assert_eq!(input.thema, "Photosynthese");
        assert_eq!(input.klasse, 8);
        assert_eq!(input.zeit, 45);
        assert!(input.tone.is_none());
    }

    #[test]
    fn rejects_each_missing_field() {
        let cases = [
            ("thema", json!("   "), "thema is required"),
            ("klasse", json!(4), "klasse must be 5–12"),
            ("klasse", json!(13), "klasse must be 5–12"),
            ("klasse", json!("x"), "klasse must be 5–12"),
            ("fach", json!(null), "fach is required"),
            ("zeit", json!(29), "zeit must be 30–90"),
            ("zeit", json!(91), "zeit must be 30–90"),
            ("zeit", json!(45.5), "zeit must be 30–90"),
        ];
        for (field, value, msg) in cases {
            let mut body = valid();
            body[field] = value;
            assert_eq!(request(body).validate().unwrap_err().0, msg, "field {field}");
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut body = valid();
        body["klasse"] = json!(12);
        body["zeit"] = json!(90);
        assert!(request(body).validate().is_ok());
        let mut body = valid();
        body["klasse"] = json!(5);
        body["zeit"] = json!(30);
        assert!(request(body).validate().is_ok());
    }

    #[test]
    fn prompt_carries_parameters_and_context() {
        let mut body = valid();
        body["tone"] = json!("freundlich");
        body["klassenName"] = json!("8b");
        let input = request(body).validate().unwrap();
        let prompt = input.prompt(&Prompts::new("/nonexistent"));
        assert!(prompt.contains("Thema: Photosynthese | Klasse: 8 | Fach: Biologie | Dauer: 45 Minuten"));
        assert!(prompt.contains("Klasse/Gruppe: 8b"));
        assert!(prompt.contains("freundlichen Stil"));
        assert!(prompt.contains("Chloroplasten"));
        assert!(!prompt.contains("{{"));
    }

    #[tokio::test]
    async fn generate_parses_fenced_reply() {
        let reply = "```json\n{\"ziele\":\"Verstehen\",\"phasen\":[{\"name\":\"Einstieg\",\"dauer\":5,\"beschreibung\":\"Pflanze\"},{\"name\":\"Erarbeitung\",\"dauer\":30,\"beschreibung\":\"Versuch\"}],\"materialien\":[\"Tafel\"],\"hausaufgaben\":\"Lesen\"}\n```";
        let llm = LlmProvider::Dummy(DummyProvider::with_reply(reply));
        let input = request(valid()).validate().unwrap();
        let plan = generate(&llm, &Prompts::new("/nonexistent"), &input).await.unwrap();
        assert_eq!(plan.phasen.len(), 2);
        assert_eq!(plan.total_minutes(), 35);
        assert_eq!(plan.materialien, vec!["Tafel".to_string()]);
    }

    #[tokio::test]
    async fn generate_reports_bad_json() {
        let llm = LlmProvider::Dummy(DummyProvider::with_reply("Das kann ich nicht."));
        let input = request(valid()).validate().unwrap();
        let err = generate(&llm, &Prompts::new("/nonexistent"), &input).await.unwrap_err();
        assert!(matches!(err, TeachingError::Extract(_)));
    }
}
