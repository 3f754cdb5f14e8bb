//! Prompt text sent with every explanation batch.
//!
//! The output format described here is what [`crate::script`] parses. Panel
//! numbers are always requested relative to the batch (the first image of a
//! request is "Panel 1"); the explainer shifts them onto whole-document
//! indices.

use crate::explainer::Batch;

/// Narration language and voice the script should be written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationStyle {
    pub language: String,
    pub tone: String,
}

impl Default for NarrationStyle {
    fn default() -> Self {
        Self {
            language: "Hindi".to_string(),
            tone: "a deep, calm, male narrator tone. Cinematic and emotional".to_string(),
        }
    }
}

impl NarrationStyle {
    #[must_use]
    pub fn new(language: impl Into<String>, tone: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            tone: tone.into(),
        }
    }
}

/// Builds the system instruction for the storyboard producer persona.
#[must_use]
pub fn system_instruction(style: &NarrationStyle) -> String {
    let language = &style.language;
    format!(
        r#"You are a world-class professional Manga Storyboard Producer and Script Writer.
The user uploads manga panels in reading order. Refer to them as "Panel 1", "Panel 2", etc., counting from the first image in the current request.

TASK: Break the story into "Production Beats". Each beat must be tied to specific panels.

REQUIREMENTS:
1. Granular Beats: every beat should ideally focus on 1-2 specific panels.
2. Precise Mapping: clearly state which panel numbers are active during the beat.
3. Extremely Detailed Script: for each beat, write a long, cinematic narration in {language}.
4. Deep Description: describe the characters' gaze, the background details, the tension in the lines, and the overall atmosphere.
5. Timing: give a realistic duration in seconds for reading that narration slowly and emotionally.
6. Style: use {tone}.

Output format STRICTLY like this for EACH beat:

Scene [Number]: [Action-Oriented Title]
Panels: [Panel numbers, e.g. 1 or 2, 3]
Duration: [Seconds] sec
Voice:
"[EXTREMELY DETAILED {language} SCRIPT]"
---

After the last beat, write a short English summary of where the story stands, wrapped exactly like this:
[SUMMARY]...[/SUMMARY]"#,
        language = language,
        tone = style.tone,
    )
}

/// Builds the user prompt for one batch.
///
/// `context` is the summary produced by the previous batch; it is left out
/// when empty.
#[must_use]
pub fn batch_prompt(batch: &Batch, total_pages: usize, context: &str, style: &NarrationStyle) -> String {
    let mut prompt = String::new();

    if !context.trim().is_empty() {
        prompt.push_str(&format!(
            "STORY SO FAR (for continuity only, do not narrate it again):\n{}\n\n",
            context.trim()
        ));
    }

    if batch.len == total_pages {
        prompt.push_str(&format!(
            "This request contains all {} panels of the chapter.\n",
            batch.len
        ));
    } else {
        prompt.push_str(&format!(
            "This request contains {} panels: pages {} to {} of a {}-page chapter.\n",
            batch.len,
            batch.start + 1,
            batch.start + batch.len,
            total_pages
        ));
    }

    prompt.push_str(&format!(
        "Number panels within this request only, from Panel 1 to Panel {}.\n\n",
        batch.len
    ));
    prompt.push_str(&format!(
        "Analyze these manga panels beat by beat. Create a professional production script where each narration segment is matched to the panel it describes. \
         Make the narration long, descriptive, and deeply atmospheric: explain the emotions, the hidden details in the background, and the flow of the scene in cinematic {}.",
        style.language
    ));

    prompt
}
