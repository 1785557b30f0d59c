//! Tiered scientific-name candidate extraction.
//!
//! Three tiers, highest priority first:
//! 1. **Parenthetical** (10): a lowercase common name (the first letter
//!    may be capitalised) followed by a binomial in parentheses, e.g.
//!    `pintassilgo (Carduelis carduelis)`.
//! 2. **Emphasis** (8): a binomial wrapped in `*...*`.
//! 3. **Keyword-gated** (5): any capitalised binomial in a sentence that
//!    also contains a domain keyword, unless it starts with a region name.
//!
//! A name found by an earlier tier is never repeated by a later one
//! (case-insensitive). The merged list is stable-sorted by priority and
//! capped at `max_candidates`.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use biodex_common::MentionCandidate;

use crate::{NerError, Result};

pub const PRIORITY_PARENTHETICAL: u8 = 10;
pub const PRIORITY_EMPHASIS: u8 = 8;
pub const PRIORITY_KEYWORD: u8 = 5;

const BINOMIAL: &str = r"[A-Z][a-z]+\s+[a-z]+(?:\s+[a-z]+)?";

/// Keyword-gate context is truncated to this many characters.
const CONTEXT_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Domain words that open the keyword-gated tier for a sentence.
    /// Matched case-insensitively at a word start, so plurals match too.
    pub keywords: HashSet<String>,
    /// Keyword-tier binomials starting with any of these are dropped.
    pub excluded_prefixes: Vec<String>,
    pub max_candidates: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let mut keywords = HashSet::new();
        // Portuguese
        for kw in &[
            "espécie", "animal", "ave", "mamífero", "peixe", "réptil", "anfíbio", "inseto",
            "planta", "árvore", "flor", "gato", "cão", "lince", "lobo", "raposa", "coelho",
            "rato", "pardal", "águia", "cobra", "lagarto", "sapo", "truta", "carpa",
            "borboleta", "abelha", "rosa", "carvalho", "pinheiro", "eucalipto", "fauna",
            "flora", "biodiversidade", "natureza", "selvagem", "doméstico",
        ] {
            keywords.insert(kw.to_string());
        }
        // English
        for kw in &[
            "species", "bird", "mammal", "fish", "reptile", "amphibian", "insect", "plant",
            "tree", "flower", "wildlife", "nature", "wild",
        ] {
            keywords.insert(kw.to_string());
        }

        let excluded_prefixes = [
            "Portugal", "Europa", "Europe", "América", "America", "África", "Africa", "Ásia",
            "Asia", "Oceania",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self { keywords, excluded_prefixes, max_candidates: 3 }
    }
}

pub struct MentionExtractor {
    config: ExtractorConfig,
    parenthetical: Regex,
    emphasis: Regex,
    binomial: Regex,
    sentence_split: Regex,
    /// `None` when no keywords are configured: the keyword tier is off.
    keyword_gate: Option<Regex>,
}

impl MentionExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        if config.max_candidates == 0 {
            return Err(NerError::InvalidConfig("max_candidates must be at least 1".into()));
        }

        let parenthetical = Regex::new(&format!(
            r"(?:^|[^a-zA-Z])([A-ZÁÀÂÃÉÈÊÍÌÎÓÒÔÕÚÙÛÇ]?[a-záàâãéèêíìîóòôõúùûç\s]+)\s*\(({BINOMIAL})\)"
        ))?;
        let emphasis = Regex::new(&format!(r"\*({BINOMIAL})\*"))?;
        let binomial = Regex::new(&format!(r"\b({BINOMIAL})\b"))?;
        let sentence_split = Regex::new(r"[.!?]+")?;

        let keyword_gate = if config.keywords.is_empty() {
            None
        } else {
            let mut words: Vec<&str> = config.keywords.iter().map(String::as_str).collect();
            words.sort_unstable();
            let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
            Some(Regex::new(&format!(r"(?i)\b(?:{alternation})"))?)
        };

        Ok(Self { config, parenthetical, emphasis, binomial, sentence_split, keyword_gate })
    }

    pub fn max_candidates(&self) -> usize {
        self.config.max_candidates
    }

    /// Scan `text` for scientific-name candidates, best first.
    pub fn extract(&self, text: &str) -> Vec<MentionCandidate> {
        let mut candidates: Vec<MentionCandidate> = Vec::new();

        for caps in self.parenthetical.captures_iter(text) {
            let common = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if let Some(name) = caps.get(2) {
                push_unique(&mut candidates, name.as_str(), PRIORITY_PARENTHETICAL, common.to_string());
            }
        }

        for caps in self.emphasis.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                push_unique(&mut candidates, name.as_str(), PRIORITY_EMPHASIS, "emphasis".to_string());
            }
        }

        if let Some(gate) = &self.keyword_gate {
            for sentence in self.sentence_split.split(text) {
                if !gate.is_match(sentence) {
                    continue;
                }
                for caps in self.binomial.captures_iter(sentence) {
                    let Some(name) = caps.get(1) else { continue };
                    if self.is_excluded(name.as_str()) {
                        debug!(name = name.as_str(), "Skipping region-like binomial");
                        continue;
                    }
                    let context: String = sentence.trim().chars().take(CONTEXT_CHARS).collect();
                    push_unique(&mut candidates, name.as_str(), PRIORITY_KEYWORD, context);
                }
            }
        }

        // sort_by is stable: equal priorities keep text order.
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        candidates.truncate(self.config.max_candidates);
        candidates
    }

    fn is_excluded(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.config
            .excluded_prefixes
            .iter()
            .any(|prefix| lowered.starts_with(&prefix.to_lowercase()))
    }
}

/// Add a candidate unless the same name (case-insensitive) is already present.
fn push_unique(candidates: &mut Vec<MentionCandidate>, raw: &str, priority: u8, context: String) {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if candidates.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
        return;
    }
    candidates.push(MentionCandidate { name, priority, context });
}
