//! Classes store: the teacher's class list and everything a student keeps
//! about their own learning (topics, notes, focus sessions, moods).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::teaching::Tone;

use super::{JsonDoc, now_rfc3339};

pub const FILE_NAME: &str = "naggy-classes.json";

/// Class name used when a student adds topics without a shared class.
pub const OWN_TOPICS_CLASS: &str = "Eigene Themen";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonAssignment {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherClass {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub lessons: Vec<LessonAssignment>,
}

/// Offen / In Arbeit / Verstanden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    #[default]
    Open,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLearning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statuses: BTreeMap<String, TopicStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentNote {
    pub id: String,
    pub topic: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub topic: String,
    pub duration_minutes: u32,
    pub completed_at: String,
}

/// Mood on a 1 (very bad) to 5 (great) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Mood {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Mood::new(value).ok_or_else(|| format!("mood must be 1-5, got {value}"))
    }
}

impl From<Mood> for u8 {
    fn from(m: Mood) -> u8 {
        m.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub mood: Mood,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassesState {
    pub teacher_classes: Vec<TeacherClass>,
    pub student_learning: Option<StudentLearning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_class_name: Option<String>,
    pub student_completed_lessons: Vec<String>,
    pub student_notes: Vec<StudentNote>,
    pub study_sessions: Vec<StudySession>,
    pub student_moods: Vec<MoodEntry>,
}

pub struct ClassesStore {
    doc: JsonDoc<ClassesState>,
}

impl ClassesStore {
    pub fn open(state_dir: &Path) -> Result<Self, AppError> {
        Ok(Self { doc: JsonDoc::open(state_dir.join(FILE_NAME))? })
    }

    pub async fn state(&self) -> ClassesState {
        self.doc.snapshot().await
    }

    pub async fn set_teacher_classes(&self, classes: Vec<TeacherClass>) -> Result<(), AppError> {
        self.doc.update(|s| s.teacher_classes = classes).await
    }

    pub async fn set_student_learning(&self, learning: Option<StudentLearning>) -> Result<(), AppError> {
        self.doc.update(|s| s.student_learning = learning).await
    }

    /// Append a topic to the current learning list, starting one if needed.
    pub async fn add_own_topic(&self, topic: &str) -> Result<StudentLearning, AppError> {
        self.doc
            .update(|s| {
                let learning = s.student_learning.get_or_insert_with(StudentLearning::default);
                learning.class_name.get_or_insert_with(|| OWN_TOPICS_CLASS.to_string());
                learning.topics.push(topic.to_string());
                learning.clone()
            })
            .await
    }

    /// `None` when there is no learning list or it lacks `topic`.
    pub async fn set_topic_status(
        &self,
        topic: &str,
        status: TopicStatus,
    ) -> Result<Option<StudentLearning>, AppError> {
        self.doc
            .update(|s| {
                let learning = s.student_learning.as_mut()?;
                if !learning.topics.iter().any(|t| t == topic) {
                    return None;
                }
                learning.statuses.insert(topic.to_string(), status);
                Some(learning.clone())
            })
            .await
    }

    /// Switching class starts the completed-lesson list over.
    pub async fn set_student_class(&self, name: &str, class_id: Option<String>) -> Result<(), AppError> {
        self.doc
            .update(|s| {
                s.student_class_name = Some(name.to_string());
                s.student_class_id = class_id;
                s.student_completed_lessons.clear();
            })
            .await
    }

    /// Returns whether the lesson is now marked completed.
    pub async fn toggle_lesson_completed(&self, lesson_id: &str) -> Result<bool, AppError> {
        self.doc
            .update(|s| {
                let done = &mut s.student_completed_lessons;
                if let Some(pos) = done.iter().position(|id| id == lesson_id) {
                    done.remove(pos);
                    false
                } else {
                    done.push(lesson_id.to_string());
                    true
                }
            })
            .await
    }

    pub async fn add_note(&self, topic: &str) -> Result<StudentNote, AppError> {
        let now = now_rfc3339();
        let note = StudentNote {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            content: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        let stored = note.clone();
        self.doc.update(move |s| s.student_notes.push(stored)).await?;
        Ok(note)
    }

    pub async fn update_note(&self, id: &str, content: &str) -> Result<Option<StudentNote>, AppError> {
        let now = now_rfc3339();
        self.doc
            .update(|s| {
                let note = s.student_notes.iter_mut().find(|n| n.id == id)?;
                note.content = content.to_string();
                note.updated_at = now;
                Some(note.clone())
            })
            .await
    }

    /// Returns whether a note was removed.
    pub async fn delete_note(&self, id: &str) -> Result<bool, AppError> {
        self.doc
            .update(|s| {
                let before = s.student_notes.len();
                s.student_notes.retain(|n| n.id != id);
                s.student_notes.len() != before
            })
            .await
    }

    pub async fn add_study_session(&self, topic: &str, duration_minutes: u32) -> Result<StudySession, AppError> {
        let session = StudySession {
            id: Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            duration_minutes,
            completed_at: now_rfc3339(),
        };
        let stored = session.clone();
        self.doc.update(move |s| s.study_sessions.push(stored)).await?;
        Ok(session)
    }

    /// One mood per UTC day; a second entry on the same day replaces the first.
    pub async fn add_mood(&self, mood: Mood) -> Result<MoodEntry, AppError> {
        let now = Utc::now();
        let entry = MoodEntry {
            date: now.format("%Y-%m-%d").to_string(),
            mood,
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        let stored = entry.clone();
        self.doc
            .update(move |s| {
                s.student_moods.retain(|m| m.date != stored.date);
                s.student_moods.push(stored);
            })
            .await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ClassesStore) {
        let dir = TempDir::new().unwrap();
        let store = ClassesStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn mood_range() {
        assert!(Mood::new(0).is_none());
        assert!(Mood::new(6).is_none());
        assert_eq!(Mood::new(3).unwrap().value(), 3);
        assert!(serde_json::from_str::<Mood>("7").is_err());
    }

    #[test]
    fn state_uses_client_field_names() {
        let json = serde_json::to_value(ClassesState::default()).unwrap();
        assert!(json.get("teacherClasses").is_some());
        assert!(json.get("studentCompletedLessons").is_some());
        assert!(json["studentLearning"].is_null());
        assert!(json.get("studentClassId").is_none());
    }

    #[test]
    fn teacher_class_accepts_minimal_shape() {
        let class: TeacherClass =
            serde_json::from_str(r#"{"id":"c1","name":"8b","topics":["Optik"],"tone":"formell"}"#).unwrap();
        assert_eq!(class.tone, Some(Tone::Formell));
        assert!(class.lessons.is_empty());
    }

    #[tokio::test]
    async fn own_topic_starts_learning_list() {
        let (_dir, store) = store();
        let learning = store.add_own_topic("Vulkane").await.unwrap();
        assert_eq!(learning.class_name.as_deref(), Some(OWN_TOPICS_CLASS));
        assert_eq!(learning.topics, vec!["Vulkane".to_string()]);

        store
            .set_student_learning(Some(StudentLearning {
                class_name: Some("7a".into()),
                topics: vec!["Brüche".into()],
                tone: Some("einfach".into()),
                statuses: BTreeMap::new(),
            }))
            .await
            .unwrap();
        let learning = store.add_own_topic("Dezimalzahlen").await.unwrap();
        assert_eq!(learning.class_name.as_deref(), Some("7a"));
        assert_eq!(learning.topics.len(), 2);
        assert_eq!(learning.tone.as_deref(), Some("einfach"));
    }

    #[tokio::test]
    async fn topic_status_only_for_known_topics() {
        let (_dir, store) = store();
        assert!(store.set_topic_status("x", TopicStatus::Done).await.unwrap().is_none());
        store.add_own_topic("Optik").await.unwrap();
        assert!(store.set_topic_status("Akustik", TopicStatus::Done).await.unwrap().is_none());
        let learning = store.set_topic_status("Optik", TopicStatus::InProgress).await.unwrap().unwrap();
        assert_eq!(learning.statuses["Optik"], TopicStatus::InProgress);
        let json = serde_json::to_value(&learning).unwrap();
        assert_eq!(json["statuses"]["Optik"], "in_progress");
    }

    #[tokio::test]
    async fn switching_class_clears_completed_lessons() {
        let (_dir, store) = store();
        assert!(store.toggle_lesson_completed("l1").await.unwrap());
        assert!(store.toggle_lesson_completed("l2").await.unwrap());
        assert!(!store.toggle_lesson_completed("l1").await.unwrap());
        assert_eq!(store.state().await.student_completed_lessons, vec!["l2".to_string()]);

        store.set_student_class("8b", Some("c8b".into())).await.unwrap();
        let state = store.state().await;
        assert!(state.student_completed_lessons.is_empty());
        assert_eq!(state.student_class_name.as_deref(), Some("8b"));
        assert_eq!(state.student_class_id.as_deref(), Some("c8b"));
    }

    #[tokio::test]
    async fn note_lifecycle() {
        let (_dir, store) = store();
        let note = store.add_note("Zellen").await.unwrap();
        assert!(note.content.is_empty());
        assert_eq!(note.created_at, note.updated_at);

        let updated = store.update_note(&note.id, "Mitochondrien!").await.unwrap().unwrap();
        assert_eq!(updated.content, "Mitochondrien!");
        assert_eq!(updated.created_at, note.created_at);
        assert!(store.update_note("missing", "x").await.unwrap().is_none());

        assert!(store.delete_note(&note.id).await.unwrap());
        assert!(!store.delete_note(&note.id).await.unwrap());
        assert!(store.state().await.student_notes.is_empty());
    }

    #[tokio::test]
    async fn mood_replaces_same_day() {
        let (_dir, store) = store();
        store.add_mood(Mood::new(2).unwrap()).await.unwrap();
        let entry = store.add_mood(Mood::new(5).unwrap()).await.unwrap();
        let moods = store.state().await.student_moods;
        assert_eq!(moods.len(), 1);
        assert_eq!(moods[0].mood.value(), 5);
        assert_eq!(moods[0].date, entry.date);
        assert_eq!(entry.date.len(), 10);
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = ClassesStore::open(dir.path()).unwrap();
            store.add_study_session("Brüche", 25).await.unwrap();
            store.add_mood(Mood::new(4).unwrap()).await.unwrap();
        }
        let store = ClassesStore::open(dir.path()).unwrap();
        let state = store.state().await;
        assert_eq!(state.study_sessions[0].duration_minutes, 25);
        assert_eq!(state.student_moods[0].mood.value(), 4);
    }
}
