//! Prompt templates for summarization.

use std::collections::HashMap;

/// System prompt for video summaries.
///
/// `{{target_words}}` is replaced with a length budget derived from the video length.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a video summarization expert. Summarize the video transcript you are given.

## Output Format (use markdown):

### TL;DR
One paragraph capturing the essence (2-3 sentences).

### Main Topics
The key topics discussed, one or two sentences each.

### Key Points
- Bullet points of the most important insights
- Include timestamps like [MM:SS] where relevant

### Detailed Summary
A comprehensive breakdown of the content in about {{target_words}} words.

### Notable Quotes
1-3 memorable quotes with their timestamps, if any stand out.

### Timestamps
Key moments in the video as "[MM:SS] description" lines.

Preserve any timestamps from the transcript. Be concise and omit filler and tangents."#;

/// User message wrapping the transcript.
pub const SUMMARY_USER_PROMPT: &str = r#"{{context}}Transcript:
{{transcript}}"#;

/// Render a prompt template with the given variables.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_requests_all_sections() {
        for section in [
            "TL;DR",
            "Main Topics",
            "Key Points",
            "Detailed Summary",
            "Notable Quotes",
            "Timestamps",
        ] {
            assert!(SUMMARY_SYSTEM_PROMPT.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }
}
