//! Query and passage tokenization shared by indexing and search.

/// English function words dropped from both sides of the match.
pub const STOP_WORDS: [&str; 82] = [
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "shall", "to",
    "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through", "during",
    "before", "after", "above", "below", "between", "under", "this", "that", "these", "those",
    "it", "its", "my", "your", "our", "their", "i", "you", "he", "she", "we", "they", "me", "him",
    "her", "us", "them", "what", "which", "who", "whom", "how", "where", "when", "why", "not",
    "no", "nor", "and", "but", "or", "if", "then", "so", "than",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercase, split on whitespace, drop stop words.
///
/// Punctuation stays attached, so `"deductible?"` and `"deductible"` are
/// different tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}
