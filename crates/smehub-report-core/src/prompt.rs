//! Search query and prompt composition.
//!
//! Pure string building; the generator feeds the results to the search and
//! completion providers.

use crate::models::BusinessInfo;
use crate::provider::SearchSnippet;

/// Default per-snippet character limit in the context section.
pub const DEFAULT_SNIPPET_CHARS: usize = 500;

/// System instruction sent alongside every report prompt.
pub const SYSTEM_PROMPT: &str = "You are a business analyst writing reports for small and \
medium-sized enterprises. Answer in well-structured markdown with headings, short paragraphs \
and bullet lists. Ground market statements in the provided web context when it is relevant, \
and do not invent figures.";

/// Build the web search query from the business name, country and industry.
///
/// Blank parts are skipped; the result is empty when all three are blank.
pub fn compose_search_query(info: &BusinessInfo) -> String {
    let parts = [
        info.business_name.trim(),
        info.industry.trim(),
        info.country.trim(),
    ];
    let mut query = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if !query.is_empty() {
        query.push_str(" market trends");
    }
    query
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Render snippets as a numbered context block, keeping their order.
///
/// Returns an empty string when there are no snippets.
pub fn format_context(snippets: &[SearchSnippet], max_chars: usize) -> String {
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let body = truncate_snippet(&s.text, max_chars);
            match &s.source {
                Some(src) => format!("[{}] ({}) {}", i + 1, src, body),
                None => format!("[{}] {}", i + 1, body),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field(value: &str) -> &str {
    let v = value.trim();
    if v.is_empty() {
        "Not provided"
    } else {
        v
    }
}

/// Compose the user prompt for the completion provider.
pub fn compose_prompt(
    info: &BusinessInfo,
    final_prompt: &str,
    snippets: &[SearchSnippet],
    snippet_chars: usize,
) -> String {
    let context = format_context(snippets, snippet_chars);
    let context = if context.is_empty() {
        "No web context available.".to_string()
    } else {
        context
    };

    format!(
        "## Request\n{}\n\n\
         ## Business Profile\n\
         - Business name: {}\n\
         - Postal code: {}\n\
         - Country: {}\n\
         - Industry: {}\n\n\
         ## Web Context\n{}\n\n\
         Write the complete report in markdown.",
        final_prompt.trim(),
        field(&info.business_name),
        field(&info.postal_code),
        field(&info.country),
        field(&info.industry),
        context,
    )
}
