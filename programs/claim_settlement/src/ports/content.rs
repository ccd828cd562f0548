use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::constants::MIN_VERIFICATION_TEXT_LEN;
use crate::error::OracleError;

/**
 * Judges whether post text satisfies a verification requirement
 *
 * Treated as a black box by the engine: a keyword heuristic and a language
 * model judgment are interchangeable behind this trait.
 */
#[async_trait]
pub trait ContentOracle: Send + Sync {
    async fn check(&self, post_text: &str, requirement_text: &str) -> Result<bool, OracleError>;
}

/**
 * Keyword overlap heuristic
 *
 * Rules:
 * - Post must be non-blank and at least 10 characters
 * - Keywords are the distinct alphanumeric words of the requirement longer
 *   than 5 characters, lower-cased
 * - Required matches: min(2, max(1, keywords / 2))
 * - A keyword matches when it appears anywhere in the lower-cased post
 */
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordOverlapOracle;

impl KeywordOverlapOracle {
    pub fn keywords(requirement_text: &str) -> BTreeSet<String> {
        requirement_text
            .split_whitespace()
            .filter(|word| word.chars().count() > 5 && word.chars().all(char::is_alphanumeric))
            .map(str::to_lowercase)
            .collect()
    }

    pub fn required_matches(keyword_count: usize) -> usize {
        2.min(1.max(keyword_count / 2))
    }

    pub fn evaluate(post_text: &str, requirement_text: &str) -> bool {
        if post_text.trim().is_empty() {
            warn!("empty post text");
            return false;
        }
        if post_text.chars().count() < MIN_VERIFICATION_TEXT_LEN {
            warn!(len = post_text.chars().count(), "post text too short");
            return false;
        }

        let keywords = Self::keywords(requirement_text);
        let post = post_text.to_lowercase();
        let matches = keywords.iter().filter(|word| post.contains(word.as_str())).count();
        let required = Self::required_matches(keywords.len());

        debug!(matches, keywords = keywords.len(), required, "keyword overlap");
        matches >= required
    }
}

#[async_trait]
impl ContentOracle for KeywordOverlapOracle {
    async fn check(&self, post_text: &str, requirement_text: &str) -> Result<bool, OracleError> {
        Ok(Self::evaluate(post_text, requirement_text))
    }
}
