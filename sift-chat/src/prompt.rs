//! Prompt payloads sent to the chat service.
//!
//! Both builders are pure. Every document becomes one numbered block fenced
//! by [`divider`] lines, in the order given.

use sift_common::{truncate_chars, SourceDocument};
use std::fmt::Write as _;

/// Role description sent as `systemPrompt` with every request.
pub const SYSTEM_PROMPT: &str = "You are an advanced research assistant. Your role is to:
1. Analyze multiple sources of information
2. Identify common themes and agreements across sources
3. Note any significant disagreements or unique perspectives
4. Synthesize a comprehensive answer based on the consensus
5. Highlight any limitations or areas where more research might be needed
6. For follow-up questions, provide more detailed analysis and explore specific aspects
Be thorough and analytical while maintaining clarity and readability.";

/// Closing instruction appended to every search prompt.
pub const SEARCH_INSTRUCTION: &str = "Please analyze these sources and provide:
1. Key points of agreement across sources
2. Any significant disagreements
3. A comprehensive synthesis of the information
4. Areas where the information might be incomplete";

/// Closing instruction appended to every follow-up prompt.
pub const FOLLOWUP_INSTRUCTION: &str =
    "Please provide a detailed answer to the follow-up question using this context.";

const DIVIDER_WIDTH: usize = 50;

pub fn divider() -> String {
    "-".repeat(DIVIDER_WIDTH)
}

/// Prompt for a fresh search over `documents`.
///
/// ```
/// use sift_chat::prompt::{build_search_prompt, SEARCH_INSTRUCTION};
/// use sift_common::SourceDocument;
///
/// let docs = vec![SourceDocument::new("https://a.test/", None, "alpha", 4500)];
/// let prompt = build_search_prompt("rust", &docs);
/// assert!(prompt.starts_with("Search query: rust\n\nAnalyzing 1 sources:"));
/// assert!(prompt.ends_with(SEARCH_INSTRUCTION));
/// ```
pub fn build_search_prompt(query: &str, documents: &[SourceDocument]) -> String {
    let rule = divider();
    let mut out = format!(
        "Search query: {query}\n\nAnalyzing {} sources:\n\n{rule}\n",
        documents.len()
    );
    push_sources(&mut out, documents, None, &rule);
    out.push('\n');
    out.push_str(SEARCH_INSTRUCTION);
    out
}

/// Prompt for a follow-up question, with every document cut to
/// `followup_cap` characters.
pub fn build_followup_prompt(
    question: &str,
    documents: &[SourceDocument],
    followup_cap: usize,
) -> String {
    let rule = divider();
    let mut out = format!(
        "Follow-up question: {question}\n\nBased on these previously analyzed sources:\n\n{rule}\n"
    );
    push_sources(&mut out, documents, Some(followup_cap), &rule);
    out.push('\n');
    out.push_str(FOLLOWUP_INSTRUCTION);
    out
}

fn push_sources(out: &mut String, documents: &[SourceDocument], cap: Option<usize>, rule: &str) {
    for (i, doc) in documents.iter().enumerate() {
        let content = match cap {
            Some(cap) => truncate_chars(doc.content(), cap),
            None => doc.content(),
        };
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\nSource {}: {}\n\n{}\n\n{}\n",
            i + 1,
            doc.url(),
            content,
            rule
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<SourceDocument> {
        vec![
            SourceDocument::new("https://a.test/", Some("A".into()), "alpha body", 4500),
            SourceDocument::new("https://b.test/", None, "beta body", 4500),
            SourceDocument::new("https://c.test/", Some("C".into()), "gamma body", 4500),
        ]
    }

    #[test]
    fn search_prompt_layout_is_exact() {
        let docs = &docs()[..1];
        let rule = "-".repeat(50);
        let expected = format!(
            "Search query: q\n\nAnalyzing 1 sources:\n\n{rule}\n\nSource 1: https://a.test/\n\nalpha body\n\n{rule}\n\n{SEARCH_INSTRUCTION}"
        );
        assert_eq!(build_search_prompt("q", docs), expected);
    }

    #[test]
    fn sources_appear_once_in_rank_order() {
        let prompt = build_search_prompt("rust vs go performance", &docs());
        let a = prompt.find("Source 1: https://a.test/").unwrap();
        let b = prompt.find("Source 2: https://b.test/").unwrap();
        let c = prompt.find("Source 3: https://c.test/").unwrap();
        assert!(a < b && b < c);
        for url in ["https://a.test/", "https://b.test/", "https://c.test/"] {
            assert_eq!(prompt.matches(url).count(), 1);
        }
        assert!(prompt.contains("Analyzing 3 sources:"));
        assert!(prompt.ends_with(
            "4. Areas where the information might be incomplete"
        ));
    }

    #[test]
    fn followup_prompt_uses_shorter_cap() {
        let long = "é".repeat(3000);
        let docs = vec![SourceDocument::new("https://a.test/", None, &long, 4500)];
        let prompt = build_followup_prompt("why?", &docs, 1000);

        assert!(prompt.starts_with("Follow-up question: why?\n\nBased on these previously analyzed sources:\n\n"));
        assert!(prompt.contains(&format!("\n\n{}\n\n", "é".repeat(1000))));
        assert!(!prompt.contains(&"é".repeat(1001)));
        assert!(prompt.ends_with(FOLLOWUP_INSTRUCTION));
    }

    #[test]
    fn followup_leaves_short_content_alone() {
        let prompt = build_followup_prompt("q", &docs(), 1000);
        assert!(prompt.contains("\n\ngamma body\n\n"));
    }

    #[test]
    fn system_prompt_lists_six_duties() {
        assert!(SYSTEM_PROMPT.starts_with("You are an advanced research assistant."));
        assert!(SYSTEM_PROMPT.contains("\n6. For follow-up questions"));
    }
}
