//! Grade insights: weaknesses, recommendations and a summary from a grade
//! table sent as CSV text or as JSON rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::llm::LlmProvider;

use super::{Prompts, TeachingError, Template, ValidationError, parse_json};

#[derive(Debug, Default, Deserialize)]
pub struct InsightsRequest {
    #[serde(default)]
    pub csv: Option<Value>,
    #[serde(default)]
    pub rows: Option<Value>,
}

/// The grade data in the form it will be shown to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeData {
    Csv(String),
    Rows(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(rename = "schwächen", alias = "schwaechen", default)]
    pub schwaechen: Vec<String>,
    #[serde(default)]
    pub empfehlungen: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl InsightsRequest {
    /// Non-blank `csv` wins over `rows`.
    pub fn validate(&self) -> Result<GradeData, ValidationError> {
        if let Some(csv) = self.csv.as_ref().and_then(Value::as_str).map(str::trim) {
            if !csv.is_empty() {
                return Ok(GradeData::Csv(csv.to_string()));
            }
        }
        match self.rows.as_ref().and_then(Value::as_array) {
            Some(rows) if !rows.is_empty() => Ok(GradeData::Rows(rows.clone())),
            _ => Err(ValidationError::new("Provide 'csv' (string) or 'rows' (array)")),
        }
    }
}

impl GradeData {
    pub fn render(&self) -> String {
        match self {
            GradeData::Csv(text) => text.clone(),
            GradeData::Rows(rows) => {
                serde_json::to_string_pretty(rows).unwrap_or_else(|_| Value::Array(rows.clone()).to_string())
            }
        }
    }

    pub fn prompt(&self, prompts: &Prompts) -> String {
        prompts.builder().layer(Template::Insights).var("data", self.render()).build()
    }
}

pub async fn analyze(llm: &LlmProvider, prompts: &Prompts, data: &GradeData) -> Result<Insights, TeachingError> {
    let reply = llm.generate(&data.prompt(prompts), None).await?;
    let insights: Insights = parse_json(&reply)?;
    debug!(
        weaknesses = insights.schwaechen.len(),
        recommendations = insights.empfehlungen.len(),
        "grade insights generated"
    );
    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;
    use serde_json::json;

    fn validate(body: Value) -> Result<GradeData, ValidationError> {
        serde_json::from_value::<InsightsRequest>(body).unwrap().validate()
    }

    #[test]
    fn csv_is_trimmed_and_preferred() {
        let data = validate(json!({"csv": "\n name,note\nAli,2\n", "rows": [{"a": 1}]})).unwrap();
        assert_eq!(data, GradeData::Csv("name,note\nAli,2".into()));
    }

    #[test]
    fn blank_csv_falls_through_to_rows() {
        let data = validate(json!({"csv": "   ", "rows": [{"name": "Mia", "note": 1}]})).unwrap();
        assert!(matches!(data, GradeData::Rows(ref r) if r.len() == 1));
        assert!(data.render().contains("\"name\": \"Mia\""));
    }

    #[test]
    fn neither_is_rejected() {
        for body in [json!({}), json!({"rows": []}), json!({"csv": 5}), json!({"rows": "a,b"})] {
            assert_eq!(validate(body).unwrap_err().0, "Provide 'csv' (string) or 'rows' (array)");
        }
    }

    #[test]
    fn output_keeps_umlaut_key() {
        let insights = Insights { schwaechen: vec!["Bruchrechnung".into()], empfehlungen: vec![], summary: "ok".into() };
        let json = serde_json::to_value(&insights).unwrap();
        assert_eq!(json["schwächen"][0], "Bruchrechnung");
    }

    #[tokio::test]
    async fn analyze_parses_reply() {
        let reply = r#"{"schwächen":["Geometrie"],"empfehlungen":["Mehr Übungen"],"summary":"Solide Klasse."}"#;
        let llm = LlmProvider::Dummy(DummyProvider::with_reply(reply));
        let data = GradeData::Csv("name,note\nAli,4".into());
        let insights = analyze(&llm, &Prompts::new("/nonexistent"), &data).await.unwrap();
        assert_eq!(insights.schwaechen, vec!["Geometrie".to_string()]);
        assert_eq!(insights.summary, "Solide Klasse.");
    }

    #[test]
    fn prompt_embeds_data() {
        let prompt = GradeData::Csv("name,note\nAli,4".into()).prompt(&Prompts::new("/nonexistent"));
        assert!(prompt.ends_with("name,note\nAli,4"));
        assert!(prompt.contains("\"schwächen\""));
    }
}
