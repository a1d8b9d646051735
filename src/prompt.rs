//! Prompt construction for provider calls.
//!
//! The system prompt fixes the role, the target language and the JSON shape
//! expected back; the single user turn lists the prompt context in key
//! order so identical requests always produce identical prompts.

use std::fmt::Write as _;

use crate::types::{GenerationKind, GenerationRequest, InvokeRequest, Message};

fn task(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Question => {
            "You are an experienced interviewer. Ask exactly one interview question suited to the candidate context below."
        }
        GenerationKind::Persona => {
            "You design interviewer personas for mock interviews. Create one realistic interviewer for the context below."
        }
        GenerationKind::Assessment => {
            "You assess interview answers using the STAR method (Situation, Task, Action, Result). Score each part from 0 to 10 and give an overall score from 0 to 10."
        }
        GenerationKind::Translation => {
            "You translate interview content faithfully, keeping tone and meaning. Do not add commentary."
        }
    }
}

fn shape(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Question => {
            r#"{"question": string, "category": string, "difficulty": "easy" | "medium" | "hard"}"#
        }
        GenerationKind::Persona => {
            r#"{"name": string, "role": string, "company": string, "style": string, "background": string}"#
        }
        GenerationKind::Assessment => {
            r#"{"score": number, "feedback": string, "situation": number, "task": number, "action": number, "result": number, "strengths": [string], "improvements": [string]}"#
        }
        GenerationKind::Translation => r#"{"translation": string, "source_language": string}"#,
    }
}

/// Human-readable name of a language code, for the instructions.
fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "hi" => "Hindi",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        other => other,
    }
}

/// Build the provider-agnostic call for `request`.
pub fn build(request: &GenerationRequest) -> InvokeRequest {
    let kind = request.kind();
    let language = request.target_language();

    let system_prompt = format!(
        "{task}\nWrite every text value in {name} (language code \"{language}\").\nRespond with only a JSON object of this shape, without markdown or explanations:\n{shape}",
        task = task(kind),
        name = language_name(language),
        shape = shape(kind),
    );

    let mut user = String::new();
    for (key, value) in request.prompt_context() {
        let _ = writeln!(user, "{key}: {}", value.trim());
    }
    if user.is_empty() {
        user.push_str("(no additional context)");
    }

    InvokeRequest {
        system_prompt,
        messages: vec![Message::user(user.trim_end())],
        max_tokens: request.max_tokens(),
        temperature: request.temperature(),
    }
}
