//! Static fallback templates.
//!
//! When every provider fails, the router answers from this table. Entries
//! are keyed by `(kind, language)`; a missing language falls back to the
//! table's default language, and a missing kind to the built-in English
//! entry. Template text may reference prompt context as `{key}`; unknown
//! placeholders are left untouched.
//!
//! Rendered fields go through the same schema as provider output, so a
//! template result has exactly the shape of a real one.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::normalize::schema;
use crate::types::GenerationKind;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"));

type Fields = &'static [(&'static str, &'static str)];

const BUILTIN: &[(GenerationKind, &str, Fields)] = &[
    // en
    (
        GenerationKind::Question,
        "en",
        &[(
            "question",
            "Can you walk me through a recent project where you worked as a {role}?",
        )],
    ),
    (
        GenerationKind::Persona,
        "en",
        &[
            ("name", "Alex Morgan"),
            ("role", "Hiring Manager"),
            ("background", "Experienced interviewer for {role} positions."),
        ],
    ),
    (
        GenerationKind::Assessment,
        "en",
        &[
            ("score", "0"),
            (
                "feedback",
                "We could not evaluate your answer right now. Structure it as Situation, Task, Action and Result, then try again.",
            ),
        ],
    ),
    (GenerationKind::Translation, "en", &[("translation", "{text}")]),
    // hi
    (
        GenerationKind::Question,
        "hi",
        &[(
            "question",
            "क्या आप किसी हाल के प्रोजेक्ट के बारे में बता सकते हैं जिसमें आपने {role} के रूप में काम किया?",
        )],
    ),
    (
        GenerationKind::Persona,
        "hi",
        &[
            ("name", "Alex Morgan"),
            ("role", "हायरिंग मैनेजर"),
            ("background", "{role} पदों के लिए अनुभवी साक्षात्कारकर्ता।"),
        ],
    ),
    (
        GenerationKind::Assessment,
        "hi",
        &[
            ("score", "0"),
            (
                "feedback",
                "अभी आपके उत्तर का मूल्यांकन नहीं हो सका। कृपया स्थिति, कार्य, कदम और परिणाम के क्रम में उत्तर दें और फिर से प्रयास करें।",
            ),
        ],
    ),
    (GenerationKind::Translation, "hi", &[("translation", "{text}")]),
    // es
    (
        GenerationKind::Question,
        "es",
        &[(
            "question",
            "¿Puede describir un proyecto reciente en el que trabajó como {role}?",
        )],
    ),
    (
        GenerationKind::Persona,
        "es",
        &[
            ("name", "Alex Morgan"),
            ("role", "Responsable de contratación"),
            ("background", "Entrevistador con experiencia en puestos de {role}."),
        ],
    ),
    (
        GenerationKind::Assessment,
        "es",
        &[
            ("score", "0"),
            (
                "feedback",
                "No pudimos evaluar su respuesta en este momento. Estructúrela con Situación, Tarea, Acción y Resultado e inténtelo de nuevo.",
            ),
        ],
    ),
    (GenerationKind::Translation, "es", &[("translation", "{text}")]),
    // fr
    (
        GenerationKind::Question,
        "fr",
        &[(
            "question",
            "Pouvez-vous décrire un projet récent sur lequel vous avez travaillé en tant que {role} ?",
        )],
    ),
    (
        GenerationKind::Persona,
        "fr",
        &[
            ("name", "Alex Morgan"),
            ("role", "Responsable du recrutement"),
            ("background", "Recruteur expérimenté pour les postes de {role}."),
        ],
    ),
    (
        GenerationKind::Assessment,
        "fr",
        &[
            ("score", "0"),
            (
                "feedback",
                "Nous n'avons pas pu évaluer votre réponse pour le moment. Structurez-la selon Situation, Tâche, Action et Résultat, puis réessayez.",
            ),
        ],
    ),
    (GenerationKind::Translation, "fr", &[("translation", "{text}")]),
    // de
    (
        GenerationKind::Question,
        "de",
        &[(
            "question",
            "Können Sie ein aktuelles Projekt beschreiben, an dem Sie als {role} gearbeitet haben?",
        )],
    ),
    (
        GenerationKind::Persona,
        "de",
        &[
            ("name", "Alex Morgan"),
            ("role", "Hiring Manager"),
            ("background", "Erfahren in Interviews für {role}-Positionen."),
        ],
    ),
    (
        GenerationKind::Assessment,
        "de",
        &[
            ("score", "0"),
            (
                "feedback",
                "Ihre Antwort konnte gerade nicht bewertet werden. Gliedern Sie sie nach Situation, Aufgabe, Handlung und Ergebnis und versuchen Sie es erneut.",
            ),
        ],
    ),
    (GenerationKind::Translation, "de", &[("translation", "{text}")]),
];

/// Per-`(kind, language)` fallback content.
///
/// ```rust
/// # use mimir::{GenerationKind, TemplateTable};
/// # use std::collections::BTreeMap;
/// let table = TemplateTable::builtin();
/// let context = BTreeMap::from([("role".to_string(), "data analyst".to_string())]);
/// let fields = table.render(GenerationKind::Question, "en", &context);
/// assert_eq!(
///     fields["question"],
///     "Can you walk me through a recent project where you worked as a data analyst?"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TemplateTable {
    templates: HashMap<(GenerationKind, String), Vec<(String, String)>>,
    default_language: String,
}

impl TemplateTable {
    /// The built-in table for en, hi, es, fr and de, defaulting to English.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (kind, language, fields) in BUILTIN {
            table = table.template(*kind, language, fields.iter().copied());
        }
        table
    }

    /// A table with no entries; every lookup resolves to the built-in
    /// English entry for the kind.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
            default_language: "en".to_string(),
        }
    }

    /// Set the language used when the target language has no entry.
    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into().trim().to_lowercase();
        self
    }

    /// Add or replace the entry for `(kind, language)`.
    pub fn template<I, K, V>(mut self, kind: GenerationKind, language: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.templates
            .insert((kind, language.trim().to_lowercase()), fields);
        self
    }

    /// Whether an entry exists for exactly `(kind, language)`.
    pub fn contains(&self, kind: GenerationKind, language: &str) -> bool {
        self.templates.contains_key(&(kind, language.to_string()))
    }

    fn lookup(&self, kind: GenerationKind, language: &str) -> Vec<(String, String)> {
        self.templates
            .get(&(kind, language.to_string()))
            .or_else(|| self.templates.get(&(kind, self.default_language.clone())))
            .cloned()
            .unwrap_or_else(|| builtin_english(kind))
    }

    /// Render the fields for `(kind, language)` with `{key}` placeholders
    /// filled from `context`.
    pub fn render(
        &self,
        kind: GenerationKind,
        language: &str,
        context: &BTreeMap<String, String>,
    ) -> Map<String, Value> {
        let mut rendered = Map::new();
        for (field, template) in self.lookup(kind, language) {
            rendered.insert(field, Value::String(fill(&template, context)));
        }
        schema::conform(kind, rendered.clone(), language).unwrap_or(rendered)
    }
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_english(kind: GenerationKind) -> Vec<(String, String)> {
    BUILTIN
        .iter()
        .find(|(k, language, _)| *k == kind && *language == "en")
        .map(|(_, _, fields)| {
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn fill(template: &str, context: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match context.get(&caps[1]) {
            Some(value) => value.trim().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
