//! Prompt Builder: turns a generation request or a raw transcript into the
//! (system, user) prompt pair sent to the LLM.
//!
//! Everything here is pure. Participant names are resolved by the caller and
//! threaded in so the prompt and the final transcript always agree.

use crate::generation::names::ParticipantNames;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::interview::{GenerationRequest, InterviewTopic};

/// Transcripts longer than this are cut before parsing (roughly 3000 tokens).
pub const MAX_TRANSCRIPT_CHARS: usize = 12_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Interview generation system prompt.
/// Replace: {topic}, {interviewer_name}, {interviewee_name}, {company_type},
///          {difficulty}, {duration}, {focus_areas}, {json_only}
pub const GENERATION_SYSTEM_TEMPLATE: &str = r#"You are an expert at creating realistic technical interview transcripts.

Generate a {topic} interview between:
- Interviewer: {interviewer_name} (Senior hiring manager at a {company_type} company)
- Interviewee: {interviewee_name} ({difficulty} level candidate)

Requirements:
- Topic: {topic}
- Duration: {duration} minutes total
- Difficulty: {difficulty}
- Company type: {company_type}
- Focus areas: {focus_areas}

Create a realistic back-and-forth conversation with:
1. Natural dialogue and realistic responses
2. Technical questions appropriate for the level
3. Follow-up questions based on answers
4. Realistic pauses, clarifications, and thinking moments
5. Structured chapters covering different topics

{json_only}

Return a JSON object in this EXACT format:
{
  "chapters": [
    {
      "title": "Introduction & Background",
      "duration_minutes": 5,
      "description": "Getting to know the candidate",
      "exchanges": [
        {
          "speaker": "interviewer",
          "text": "Hi {interviewee_name}, thanks for joining us today...",
          "timestamp": "00:00"
        },
        {
          "speaker": "interviewee",
          "text": "Thank you for having me, {interviewer_name}...",
          "timestamp": "00:15"
        }
      ]
    }
  ]
}

RULES:
- "speaker" is exactly "interviewer" or "interviewee"
- "timestamp" is MM:SS elapsed since the start of the interview and never decreases
- Chapter durations should add up to roughly {duration} minutes

Make it feel authentic with realistic technical discussions, problem-solving, and natural conversation flow."#;

/// Interview generation user prompt.
/// Replace: {duration}, {topic}, {chapter_suggestions}, {difficulty}
pub const GENERATION_USER_TEMPLATE: &str = r#"Generate a {duration}-minute {topic} interview with these chapters:

{chapter_suggestions}

Make sure to:
- Include realistic technical questions for {difficulty} level
- Show natural conversation flow with follow-ups
- Include moments where candidate asks clarifying questions
- Add realistic thinking pauses and "umm" moments
- Make the interviewer ask progressively harder questions
- Include both technical and behavioral elements
- End with candidate questions for the interviewer

Generate the complete JSON structure now."#;

/// Transcript parsing system prompt. Replace: {json_only}
pub const PARSING_SYSTEM_TEMPLATE: &str = r#"You are an expert at analyzing interview transcripts.
Parse the interview transcript you are given and extract:

1. INTRO_SUMMARY: A 2-3 sentence overview of the interview, participants, and main topic
2. HIGHLIGHTS: Key positive moments, insights, or achievements mentioned
3. LOWLIGHTS: Challenges, failures, or difficult moments discussed
4. KEY_ENTITIES: Important people, companies, technologies, or concepts mentioned, grouped by category
5. EXECUTABLE_TASKS: Specific action items, follow-ups, or takeaways that could be tracked

{json_only}

Return a JSON object with these EXACT keys: intro_summary, highlights, lowlights, key_entities, executable_tasks.
{
  "intro_summary": "string",
  "highlights": [{"timestamp": "MM:SS or null", "description": "string"}],
  "lowlights": [{"timestamp": "MM:SS or null", "description": "string"}],
  "key_entities": {"people": ["string"], "companies": ["string"], "technologies": ["string"], "concepts": ["string"]},
  "executable_tasks": [
    {
      "title": "string",
      "description": "string",
      "priority": "low" | "medium" | "high",
      "category": "string",
      "estimated_due_days": 7
    }
  ]
}"#;

/// Transcript parsing user prompt. Replace: {transcript}
pub const PARSING_USER_TEMPLATE: &str = "Transcript to analyze:\n\n{transcript}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSuggestion {
    pub title: &'static str,
    pub minutes: u32,
}

const fn chapter(title: &'static str, minutes: u32) -> ChapterSuggestion {
    ChapterSuggestion { title, minutes }
}

const SOFTWARE_ENGINEERING_CHAPTERS: &[ChapterSuggestion] = &[
    chapter("Introduction & Background", 5),
    chapter("Technical Experience Discussion", 10),
    chapter("Coding Problem - Easy", 10),
    chapter("Coding Problem - Medium", 15),
    chapter("System Design Discussion", 10),
    chapter("Behavioral Questions", 8),
    chapter("Questions for Interviewer", 2),
];

const FRONTEND_ENGINEERING_CHAPTERS: &[ChapterSuggestion] = &[
    chapter("Introduction & Background", 5),
    chapter("Frontend Technologies Discussion", 8),
    chapter("JavaScript/React Coding", 15),
    chapter("CSS & Responsive Design", 10),
    chapter("Performance Optimization", 7),
    chapter("Behavioral Questions", 5),
    chapter("Questions for Interviewer", 3),
];

const PRODUCT_MANAGEMENT_CHAPTERS: &[ChapterSuggestion] = &[
    chapter("Introduction & Background", 5),
    chapter("Product Strategy Discussion", 12),
    chapter("Case Study - Feature Design", 15),
    chapter("Metrics & Analytics", 8),
    chapter("Stakeholder Management", 10),
    chapter("Behavioral Questions", 8),
    chapter("Questions for Interviewer", 2),
];

/// Suggested chapter breakdown for a topic. Topics without their own table use
/// the software engineering one.
pub fn chapter_suggestions(topic: InterviewTopic) -> &'static [ChapterSuggestion] {
    match topic {
        InterviewTopic::FrontendEngineering => FRONTEND_ENGINEERING_CHAPTERS,
        InterviewTopic::ProductManagement => PRODUCT_MANAGEMENT_CHAPTERS,
        _ => SOFTWARE_ENGINEERING_CHAPTERS,
    }
}

/// Renders the suggestion table as a bullet list, scaling minutes to the requested duration.
pub fn format_chapter_suggestions(topic: InterviewTopic, duration_minutes: u32) -> String {
    let chapters = chapter_suggestions(topic);
    let table_total: u32 = chapters.iter().map(|c| c.minutes).sum();

    chapters
        .iter()
        .map(|c| {
            let scaled = (f64::from(c.minutes) * f64::from(duration_minutes)
                / f64::from(table_total))
            .round()
            .max(1.0) as u32;
            format!("- {} ({} min)", c.title, scaled)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_generation_prompts(request: &GenerationRequest, names: &ParticipantNames) -> PromptPair {
    let duration = request.duration_minutes.to_string();
    let focus_areas = request.focus_areas.join(", ");
    let chapter_suggestions = format_chapter_suggestions(request.topic, request.duration_minutes);

    let values = [
        ("json_only", JSON_ONLY_INSTRUCTION),
        ("topic", request.topic.as_str()),
        ("company_type", request.company_type.as_str()),
        ("difficulty", request.difficulty.as_str()),
        ("duration", duration.as_str()),
        ("chapter_suggestions", chapter_suggestions.as_str()),
        ("focus_areas", focus_areas.as_str()),
        ("interviewer_name", names.interviewer.as_str()),
        ("interviewee_name", names.interviewee.as_str()),
    ];

    PromptPair {
        system: fill_template(GENERATION_SYSTEM_TEMPLATE, &values),
        user: fill_template(GENERATION_USER_TEMPLATE, &values),
    }
}

pub fn build_parsing_prompt(transcript_text: &str) -> PromptPair {
    let transcript = clean_transcript_text(transcript_text);
    PromptPair {
        system: fill_template(PARSING_SYSTEM_TEMPLATE, &[("json_only", JSON_ONLY_INSTRUCTION)]),
        user: fill_template(PARSING_USER_TEMPLATE, &[("transcript", transcript.as_str())]),
    }
}

/// Substitutes `{key}` placeholders in one left-to-right pass.
///
/// Inserted values are never rescanned, so a caller-supplied name containing
/// `{duration}` lands in the prompt verbatim. Braces that do not name a known
/// key (the JSON example) are copied as is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapses whitespace runs and truncates to `MAX_TRANSCRIPT_CHARS`, appending `...` when cut.
pub fn clean_transcript_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}
