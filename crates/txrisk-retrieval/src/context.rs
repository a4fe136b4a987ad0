//! Context formatting for the prompt

use txrisk_domain::EvidenceDocument;

/// Separator between document contents
pub const SEPARATOR: &str = "\n\n";

/// Formatted context plus what the length guard did to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock {
    /// Joined document contents
    pub text: String,
    /// Documents included (fully or cut)
    pub included: usize,
    /// Lower-ranked documents left out
    pub dropped: usize,
    /// Whether the single included document was cut
    pub truncated: bool,
}

/// Join document contents in fused order
///
/// With `max_chars`, the lowest-ranked documents are dropped until the text
/// fits. A first document that alone exceeds the bound is cut on a char
/// boundary.
pub fn format_context<'a, I>(documents: I, max_chars: Option<usize>) -> ContextBlock
where
    I: IntoIterator<Item = &'a EvidenceDocument>,
{
    let documents: Vec<&EvidenceDocument> = documents.into_iter().collect();
    let limit = max_chars.unwrap_or(usize::MAX);

    let mut block = ContextBlock::default();
    let mut used = 0usize;

    for document in &documents {
        let content = document.content();
        let separator = if block.included == 0 { 0 } else { SEPARATOR.len() };
        let needed = separator + content.chars().count();

        if used.saturating_add(needed) > limit {
            if block.included == 0 {
                block.text = content.chars().take(limit).collect();
                block.included = 1;
                block.truncated = true;
            }
            break;
        }

        if separator > 0 {
            block.text.push_str(SEPARATOR);
        }
        block.text.push_str(content);
        block.included += 1;
        used += needed;
    }

    block.dropped = documents.len() - block.included;
    block
}
