//! School-term glossary for newcomers, with translations.

use serde::Serialize;

use super::Language;

pub struct TermEntry {
    pub key: &'static str,
    pub de: &'static str,
    pub explanation_de: &'static str,
    /// Indexed in [`Language::ALL`] order: en, ar, tr, uk.
    translations: [&'static str; 4],
}

impl TermEntry {
    pub fn translation(&self, lang: Language) -> &'static str {
        let idx = Language::ALL.iter().position(|l| *l == lang).unwrap_or(0);
        self.translations[idx]
    }
}

pub const TERM_GLOSSARY: &[TermEntry] = &[
    TermEntry {
        key: "thema",
        de: "Thema",
        explanation_de: "Worum es in einer Stunde oder Aufgabe geht.",
        translations: [
            "Topic – what the lesson or task is about.",
            "الموضوع – ما تدور حوله الحصة أو الواجب.",
            "Konu – dersin veya ödevin ne hakkında olduğu.",
            "Тема – про що урок або завдання.",
        ],
    },
    TermEntry {
        key: "klasse",
        de: "Klasse",
        explanation_de: "Deine Jahrgangs- oder Lerngruppe, z.B. 8a.",
        translations: [
            "Class / grade group, e.g. 8a.",
            "الصف / الشعبة، مثل 8a.",
            "Sınıf / şube, örn. 8a.",
            "Клас / група, наприклад 8a.",
        ],
    },
    TermEntry {
        key: "lernen",
        de: "Lernen",
        explanation_de: "Dein Bereich mit Themen und Aufgaben.",
        translations: [
            "Learning – your area with topics and tasks.",
            "التعلّم – قسمك الذي يحتوي على المواضيع والمهام.",
            "Öğrenme – konuların ve görevlerin olduğu alan.",
            "Навчання – твій розділ з темами та завданнями.",
        ],
    },
    TermEntry {
        key: "aufgabe",
        de: "Aufgabe",
        explanation_de: "Eine Sache, die du machen sollst, z.B. Übung oder Hausaufgabe.",
        translations: [
            "Task – something you should do, e.g. exercise or homework.",
            "مهمة – شيء يجب أن تقوم به، مثل تمرين أو واجب منزلي.",
            "Görev – yapman gereken şey, örn. alıştırma veya ödev.",
            "Завдання – те, що ти маєш зробити, напр. вправа чи домашнє.",
        ],
    },
    TermEntry {
        key: "status",
        de: "Offen / In Arbeit / Verstanden",
        explanation_de: "Zeigt, wie weit du bei einem Thema bist.",
        translations: [
            "\"Open / In progress / Understood\" – shows how far you are with a topic.",
            "«مفتوح / قيد العمل / مفهوم» – يوضّح مدى تقدّمك في الموضوع.",
            "\"Açık / Çalışılıyor / Anlaşıldı\" – bir konuda ne kadar ilerlediğini gösterir.",
            "«Відкрите / У процесі / Зрозуміло» – показує, як ти просуваєшся по темі.",
        ],
    },
    TermEntry {
        key: "notiz",
        de: "Notiz",
        explanation_de: "Eigene kurze Erinnerung oder Idee zu einem Thema.",
        translations: [
            "Note – your own short reminder or idea about a topic.",
            "ملاحظة – تذكير قصير أو فكرة عن موضوع.",
            "Not – bir konu hakkında kendi kısa hatırlatman veya fikrin.",
            "Нотатка – власне коротке нагадування чи ідея про тему.",
        ],
    },
];

/// One glossary entry as served over HTTP. `translations` holds either every
/// language or just the requested one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermView {
    pub key: &'static str,
    pub de: &'static str,
    pub explanation_de: &'static str,
    pub translations: std::collections::BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct LanguageView {
    pub code: &'static str,
    pub label: &'static str,
}

pub fn languages() -> Vec<LanguageView> {
    Language::ALL.iter().map(|l| LanguageView { code: l.code(), label: l.label() }).collect()
}

pub fn lookup(lang: Option<Language>) -> Vec<TermView> {
    let wanted: Vec<Language> = match lang {
        Some(l) => vec![l],
        None => Language::ALL.to_vec(),
    };
    TERM_GLOSSARY
        .iter()
        .map(|entry| TermView {
            key: entry.key,
            de: entry.de,
            explanation_de: entry.explanation_de,
            translations: wanted.iter().map(|l| (l.code(), entry.translation(*l))).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_has_every_language() {
        for entry in TERM_GLOSSARY {
            for lang in Language::ALL {
                assert!(!entry.translation(lang).is_empty(), "{} missing {}", entry.key, lang.code());
            }
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = TERM_GLOSSARY.iter().map(|e| e.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), TERM_GLOSSARY.len());
    }

    #[test]
    fn lookup_filters_language() {
        let all = lookup(None);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].translations.len(), 4);

        let tr = lookup(Some(Language::Tr));
        assert_eq!(tr[0].translations.len(), 1);
        assert!(tr[0].translations["tr"].starts_with("Konu"));
    }

    #[test]
    fn language_labels_in_german() {
        let labels: Vec<_> = languages().into_iter().map(|l| l.label).collect();
        assert_eq!(labels, vec!["Englisch", "Arabisch", "Türkisch", "Ukrainisch"]);
    }
}
