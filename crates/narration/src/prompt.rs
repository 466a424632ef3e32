//! Prompt assembly for the generation strategies.
//!
//! Wording is English and is not part of any contract; the structure is:
//! sentence budget, sector texts (newlines flattened), image tags, and the
//! previously narrated section when the request carries memory text.

use serde::Serialize;
use sightline_core::generation::{GenerationRequest, NarrationMode, SectorTexts, Verbosity};
use sightline_core::image::CapturedImage;
use sightline_core::provider::StructuredSchema;

/// Fields of a surroundings narration.
pub const NARRATION_FIELDS: [&str; 3] = ["description", "translated", "lang"];

/// Fields of a stop-reason narration. `message` is the spoken text.
pub const STOP_REASON_FIELDS: [&str; 6] = [
    "pedestrian_info",
    "object_info",
    "thought",
    "message",
    "translated",
    "lang",
];

pub fn narration_schema() -> StructuredSchema {
    StructuredSchema::new("translated_description", &NARRATION_FIELDS)
}

pub fn stop_reason_schema() -> StructuredSchema {
    StructuredSchema::new("stop_reason", &STOP_REASON_FIELDS)
}

/// Schema the final call of a request must answer with.
pub fn schema_for(mode: NarrationMode) -> StructuredSchema {
    match mode {
        NarrationMode::Surroundings => narration_schema(),
        NarrationMode::StopReason => stop_reason_schema(),
    }
}

/// Field holding the spoken description for `mode`.
pub fn description_field(mode: NarrationMode) -> &'static str {
    match mode {
        NarrationMode::Surroundings => "description",
        NarrationMode::StopReason => "message",
    }
}

/// Images the request narrates: everything for surroundings, only the front
/// camera when explaining a stop.
pub fn images_for(request: &GenerationRequest) -> Vec<CapturedImage> {
    match request.mode {
        NarrationMode::Surroundings => request.images.clone(),
        NarrationMode::StopReason => request
            .images
            .iter()
            .filter(|img| img.sector_tag == "front")
            .cloned()
            .collect(),
    }
}

/// `"1: front\n2: left\n"` for the given images.
pub fn image_tags(images: &[CapturedImage]) -> String {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| format!("{}: {}\n", i + 1, img.sector_tag))
        .collect()
}

/// Assembled prompts for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PromptPlan {
    /// One call carrying every image.
    SinglePhase {
        prompt: String,
        schema: StructuredSchema,
    },
    /// A describe prompt sent with each image, then a synthesis prompt that
    /// receives the collected descriptions.
    TwoPhase {
        describe: String,
        synthesize: SynthesisTemplate,
        schema: StructuredSchema,
    },
}

/// The synthesis prompt, split around the slot where image descriptions go.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisTemplate {
    before: String,
    after: String,
}

impl SynthesisTemplate {
    pub fn render(&self, image_descriptions: &str) -> String {
        format!("{}{image_descriptions}{}", self.before, self.after)
    }
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn atmosphere(verbosity: &Verbosity) -> &'static str {
    if verbosity.is_terse() {
        "Very briefly, give only the name and position of each object."
    } else {
        "In detail, describe each object and its position, adding what can be \
         inferred and descriptive adjectives."
    }
}

fn sentences(n: u32) -> String {
    if n == 1 {
        "one sentence".into()
    } else {
        format!("{n} sentences")
    }
}

fn style_rules(verbosity: &Verbosity) -> String {
    format!(
        "## Rules\n\
         1. {} Use exactly {} in total.\n\
         2. The text is read aloud by a speech engine: no symbols or markup, one continuous passage.\n\
         3. Be polite and speak like a guide (\"overall\", \"on your left\", \"on your right\", \
         \"ahead of you\"). Start with a summary, then describe left, front and right in that order.\n\
         4. Mention crosswalks or traffic lights only when they are actually present.\n\
         5. Never use words that sound unnatural to the listener, such as \"image\", \
         \"viewpoint\", \"important\" or \"additional information\".\n\
         6. Do not describe what is behind.\n",
        atmosphere(verbosity),
        sentences(verbosity.sentence_count())
    )
}

fn annotation_section(texts: &SectorTexts) -> String {
    format!(
        "Descriptions written in advance by experts for this location may also be provided. \
         Use them, but describe everything as if you saw it directly. Directions inside a \
         description are relative to its own sector.\n\n{}\n{}\n{}\n\n\
         For each direction, describe what is visible first and then the provided information. \
         Always include details about signs, facilities and important items.\n",
        flatten(&texts.front),
        flatten(&texts.right),
        flatten(&texts.left),
    )
}

fn translation_section(language_code: &str, field: &str) -> String {
    format!(
        "Translate {field} into the language with code \"{language_code}\" and put it in \
         translated; put the code you used in lang. If {field} is already in that language, \
         copy it into translated unchanged.\n"
    )
}

fn past_explanations_section(memory_text: &str) -> String {
    if memory_text.trim().is_empty() {
        return String::new();
    }
    format!(
        "\n## Previously narrated\n\
         You have already told the user the following. Leave it out of the new narration; \
         it is fine if the result gets shorter.\n\n{memory_text}\n"
    )
}

/// Only the front annotation matters when explaining a stop, and not even
/// that for a one-sentence budget.
fn stop_reason_annotation(request: &GenerationRequest) -> String {
    let front = flatten(&request.sector_texts.front);
    if front.trim().is_empty() || request.verbosity.sentence_count() <= 1 {
        return String::new();
    }
    format!(
        "A description written in advance by experts for what is ahead may also be \
         provided. Use it only where it helps explain the stop.\n\n{front}\n\n"
    )
}

const STOP_REASON_TASK: &str = "A robot guiding a blind pedestrian has stopped. Using the \
    robot's front view, explain why.\n\
    First count the people close by and note where they face and what they do \
    (pedestrian_info). If people are only far away, say so; if there are none, say so.\n\
    Then count nearby obstacles and their kinds (object_info), or say there are none.\n\
    In thought, reason about why the robot stopped and what the user should be told.\n\
    Finally state the concrete reason in message, which is read to the user directly.\n";

const STOP_REASON_RULES: &str = "## Rules\n\
    1. Be concise and polite.\n\
    2. Start with \"Stopped because ...\", giving the most specific reason possible, \
    for example \"someone is standing in the path\" rather than \"someone is ahead\".\n\
    3. Say where people or obstacles are and what they are doing.\n\
    4. If both people and obstacles are present, explain the one closest to the robot.\n\
    5. If there is no clear reason, ask the user to wait a moment and describe the surroundings.\n\
    6. Do not speculate, do not tell the user to act, and do not describe what is behind.\n\
    7. The camera is low: nearby people may only show their feet.\n";

const STOP_REASON_DESCRIBE: &str = "A robot guiding a blind pedestrian has stopped. Extract \
    the information needed to explain why from this front view.\n\
    - pedestrian_info: people close by, where they face and what they do.\n\
    - object_info: nearby obstacles and their kinds.\n";

const DESCRIBE_TASK: &str = "# Task\nDescribe the given image.\n\n";

/// Single-phase prompt: every image and all context in one call.
pub fn single_phase(request: &GenerationRequest) -> PromptPlan {
    let images = images_for(request);
    let prompt = match request.mode {
        NarrationMode::Surroundings => format!(
            "# Task\nDescribe the given images and put the result in description.\n\
             The images face these directions:\n{}\n{}\n{}\n{}{}",
            image_tags(&images),
            annotation_section(&request.sector_texts),
            translation_section(&request.language_code, "description"),
            style_rules(&request.verbosity),
            past_explanations_section(&request.narration_memory_text),
        ),
        NarrationMode::StopReason => format!(
            "# Task\n{STOP_REASON_TASK}\n{}{}\n{STOP_REASON_RULES}{}",
            stop_reason_annotation(request),
            translation_section(&request.language_code, "message"),
            past_explanations_section(&request.narration_memory_text),
        ),
    };
    PromptPlan::SinglePhase {
        prompt,
        schema: schema_for(request.mode),
    }
}

/// Two-phase prompts: a per-image describe prompt and the synthesis template.
pub fn two_phase(request: &GenerationRequest) -> PromptPlan {
    let (describe, before, after) = match request.mode {
        NarrationMode::Surroundings => (
            format!("{DESCRIBE_TASK}{}", style_rules(&request.verbosity)),
            "# Task\nSummarize the following descriptions of live images into description.\n\n"
                .to_string(),
            format!(
                "\n{}\n{}\n{}{}",
                annotation_section(&request.sector_texts),
                translation_section(&request.language_code, "description"),
                style_rules(&request.verbosity),
                past_explanations_section(&request.narration_memory_text),
            ),
        ),
        NarrationMode::StopReason => (
            STOP_REASON_DESCRIBE.to_string(),
            "# Task\nThe robot's front view has been described as follows.\n\n".to_string(),
            format!(
                "\n{STOP_REASON_TASK}\n{}{}\n{STOP_REASON_RULES}{}",
                stop_reason_annotation(request),
                translation_section(&request.language_code, "message"),
                past_explanations_section(&request.narration_memory_text),
            ),
        ),
    };
    PromptPlan::TwoPhase {
        describe,
        synthesize: SynthesisTemplate { before, after },
        schema: schema_for(request.mode),
    }
}
