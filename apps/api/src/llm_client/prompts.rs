// Cross-cutting prompt fragments shared by every LLM call.
// Feature-specific prompts live in a prompts.rs next to the code that uses them.

/// Appended to every system prompt: the interpreters parse the reply as raw JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";
