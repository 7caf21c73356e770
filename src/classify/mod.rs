// src/classify/mod.rs
//! Ad/news discrimination: a fixed-priority rule chain over one article.
//!
//! Rules run in this order and the first one that fires names the rejection:
//!  1. declared section        8. phone / price / percentage repeats
//!  2. ad-related tags         9. business address
//!  3. missing headline/body  10. call-to-action phrase
//!  4. body length            11. bulleted list
//!  5. sentence count         12. real-estate vocabulary
//!  6. symbol ratio           13. event listing
//!  7. ad keyword density
//!
//! Reordering changes which reason is reported for inputs matching several
//! rules, so the order is part of the contract.

pub mod config;
pub mod handle;
pub mod signals;

use crate::article::{ArticleCandidate, Section};
use crate::debug::dev_log_verdict;
use crate::error::Result;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

pub use config::{ClassifierConfig, Lexicon, Thresholds};
pub use handle::{start_hot_reload_thread, ClassifierHandle};

/// Why an article was rejected. `as_str()` is the stable label written to
/// `skip_hsa_reason` and aggregated in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    SectionExcluded,
    AdTag,
    MissingHeadline,
    MissingBody,
    BodyTooShort,
    TooFewSentences,
    HighSymbolRatio,
    AdKeywords,
    PhoneNumbers,
    PriceMentions,
    PercentageMentions,
    BusinessAddress,
    AdPhrase,
    BulletList,
    RealEstateListing,
    EventListing,
}

impl RejectReason {
    pub const ALL: [RejectReason; 16] = [
        RejectReason::SectionExcluded,
        RejectReason::AdTag,
        RejectReason::MissingHeadline,
        RejectReason::MissingBody,
        RejectReason::BodyTooShort,
        RejectReason::TooFewSentences,
        RejectReason::HighSymbolRatio,
        RejectReason::AdKeywords,
        RejectReason::PhoneNumbers,
        RejectReason::PriceMentions,
        RejectReason::PercentageMentions,
        RejectReason::BusinessAddress,
        RejectReason::AdPhrase,
        RejectReason::BulletList,
        RejectReason::RealEstateListing,
        RejectReason::EventListing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::SectionExcluded => "Section type excluded",
            RejectReason::AdTag => "Ad-related tag found",
            RejectReason::MissingHeadline => "Missing headline",
            RejectReason::MissingBody => "Missing body",
            RejectReason::BodyTooShort => "Body too short",
            RejectReason::TooFewSentences => "Too few sentences",
            RejectReason::HighSymbolRatio => "High symbol-to-word ratio",
            RejectReason::AdKeywords => "Multiple ad keywords",
            RejectReason::PhoneNumbers => "Multiple phone numbers",
            RejectReason::PriceMentions => "Multiple price mentions",
            RejectReason::PercentageMentions => "Multiple percentage mentions (likely discounts)",
            RejectReason::BusinessAddress => "Contains business address",
            RejectReason::AdPhrase => "Contains ad phrase",
            RejectReason::BulletList => "Contains multiple bullet points (likely a list or ad)",
            RejectReason::RealEstateListing => "Contains multiple real estate listing indicators",
            RejectReason::EventListing => "Appears to be an event listing",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == label)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RejectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of classifying one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub accepted: bool,
    pub reason: Option<RejectReason>,
    /// Diagnostic detail for the firing rule (matched terms, counts). Never
    /// affects the decision.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

impl ClassificationResult {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
            evidence: Vec::new(),
        }
    }

    pub fn reject(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            evidence: Vec::new(),
        }
    }

    fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn reason_str(&self) -> Option<&'static str> {
        self.reason.map(|r| r.as_str())
    }
}

/* ----------------------------
Compiled engine structures
---------------------------- */

#[derive(Debug, Clone)]
struct Patterns {
    /// `None` when the configured keyword list is empty.
    ad_keywords: Option<Regex>,
    phone: Regex,
    price: Regex,
    percentage: Regex,
    /// `None` when no street suffix is configured.
    address: Option<Regex>,
    month_day: Regex,
    clock_time: Regex,
}

impl Patterns {
    fn compile(lexicon: &Lexicon) -> Result<Self> {
        Ok(Self {
            ad_keywords: word_alternation(&lexicon.ad_keywords, |alt| format!(r"(?i)\b(?:{alt})\b"))?,
            phone: Regex::new(r"\b\d{3}[-.)/ ]?\d{3}[-.)/ ]?\d{4}\b")?,
            price: Regex::new(r"\$\s*\d+(?:,\d{3})*(?:\.\d{2})?\b")?,
            percentage: Regex::new(r"\b\d+\s*%")?,
            address: word_alternation(&lexicon.street_suffixes, |alt| {
                format!(r"(?i)\b\d+(?:\s+[a-z]+){{1,4}}\s+(?:{alt})\b")
            })?,
            month_day: Regex::new(
                r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]* \d{1,2}\b",
            )?,
            clock_time: Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b")?,
        })
    }
}

/// Escape and join `terms` into one alternation, then wrap it with `build`.
fn word_alternation(terms: &[String], build: impl Fn(&str) -> String) -> Result<Option<Regex>> {
    if terms.is_empty() {
        return Ok(None);
    }
    let alt = terms
        .iter()
        .map(|t| regex::escape(&t.to_lowercase()))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&build(&alt))?))
}

fn lowered(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

/// Heuristic ad/news classifier. Immutable after construction; cheap to clone.
#[derive(Debug, Clone)]
pub struct Classifier {
    cfg: ClassifierConfig,
    patterns: Patterns,
    tag_terms: Vec<String>,
    phrases: Vec<String>,
    real_estate_terms: Vec<String>,
    event_terms: Vec<String>,
}

impl Classifier {
    pub fn new(cfg: ClassifierConfig) -> Result<Self> {
        let patterns = Patterns::compile(&cfg.lexicon)?;
        Ok(Self {
            tag_terms: lowered(&cfg.lexicon.ad_tag_terms),
            phrases: lowered(&cfg.lexicon.ad_phrases),
            real_estate_terms: lowered(&cfg.lexicon.real_estate_terms),
            event_terms: lowered(&cfg.lexicon.event_terms),
            patterns,
            cfg,
        })
    }

    /// Classifier over the built-in configuration.
    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default()).expect("built-in classifier patterns")
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Copy of this classifier with `unknown` sections rejected as well.
    pub fn with_strict_sections(&self) -> Self {
        let mut out = self.clone();
        out.cfg.strict_section_exclusion = true;
        out
    }

    /// Classify a raw JSON record (missing fields default to empty).
    pub fn classify_value(&self, record: &serde_json::Value) -> ClassificationResult {
        self.classify(&ArticleCandidate::from_value(record))
    }

    pub fn classify(&self, article: &ArticleCandidate) -> ClassificationResult {
        let verdict = self.evaluate(article);
        dev_log_verdict(&article.headline, &article.body, &verdict);
        verdict
    }

    fn evaluate(&self, article: &ArticleCandidate) -> ClassificationResult {
        use ClassificationResult as R;
        use RejectReason::*;
        let t = &self.cfg.thresholds;

        // 1) Declared section
        match article.section {
            Section::Ad | Section::Classified => {
                return R::reject(SectionExcluded).with_evidence(vec![article.section.as_str().into()])
            }
            Section::Unknown if self.cfg.strict_section_exclusion => {
                return R::reject(SectionExcluded).with_evidence(vec!["unknown".into()])
            }
            _ => {}
        }

        // 2) Tags
        for tag in &article.tags {
            let lc = tag.to_lowercase();
            if let Some(term) = self.tag_terms.iter().find(|term| lc.contains(term.as_str())) {
                return R::reject(AdTag).with_evidence(vec![tag.clone(), term.clone()]);
            }
        }

        // 3) Missing fields
        if article.headline.is_empty() {
            return R::reject(MissingHeadline);
        }
        let body = article.body.as_str();
        if body.is_empty() {
            return R::reject(MissingBody);
        }

        // 4) Length
        let body_chars = body.chars().count();
        if body_chars < t.min_body_chars {
            return R::reject(BodyTooShort).with_evidence(vec![format!("chars={body_chars}")]);
        }

        // 5) Narrative structure
        let sentences = signals::count_sentences(body);
        if sentences < t.min_sentences {
            return R::reject(TooFewSentences).with_evidence(vec![format!("sentences={sentences}")]);
        }

        // 6) Symbol density
        let ratio = signals::symbol_ratio(body);
        if ratio > t.max_symbol_ratio {
            return R::reject(HighSymbolRatio).with_evidence(vec![format!("ratio={ratio:.3}")]);
        }

        let text = article.combined_text();

        // 7) Ad keyword density
        if let Some(re) = &self.patterns.ad_keywords {
            let distinct: BTreeSet<String> = re
                .find_iter(&text)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            if distinct.len() >= t.min_distinct_ad_keywords {
                return R::reject(AdKeywords).with_evidence(distinct.into_iter().take(5).collect());
            }
        }

        // 8) Repeated contact / price signals
        let phones = signals::count_isolated_matches(&self.patterns.phone, &text);
        if phones > t.max_phone_numbers {
            return R::reject(PhoneNumbers).with_evidence(vec![format!("count={phones}")]);
        }
        let prices = signals::count_isolated_matches(&self.patterns.price, &text);
        if prices > t.max_price_mentions {
            return R::reject(PriceMentions).with_evidence(vec![format!("count={prices}")]);
        }
        let percents = signals::count_isolated_matches(&self.patterns.percentage, &text);
        if percents > t.max_percentage_mentions {
            return R::reject(PercentageMentions).with_evidence(vec![format!("count={percents}")]);
        }

        // 9) Business address
        if let Some(m) = self.patterns.address.as_ref().and_then(|re| re.find(&text)) {
            return R::reject(BusinessAddress).with_evidence(vec![m.as_str().to_string()]);
        }

        // 10) Call-to-action phrases
        if let Some(phrase) = self.phrases.iter().find(|p| text.contains(p.as_str())) {
            return R::reject(AdPhrase).with_evidence(vec![phrase.clone()]);
        }

        // 11) Bulleted lists
        let bullets = signals::count_bullet_lines(body, &self.cfg.lexicon.bullet_glyphs);
        if bullets >= t.min_bullet_lines {
            return R::reject(BulletList).with_evidence(vec![format!("bullets={bullets}")]);
        }

        // 12) Real-estate vocabulary
        let re_terms = signals::count_present_terms(&text, &self.real_estate_terms);
        if re_terms >= t.min_real_estate_terms {
            return R::reject(RealEstateListing).with_evidence(vec![format!("terms={re_terms}")]);
        }

        // 13) Event listing: vocabulary plus a date or clock time
        let event_terms = signals::count_present_terms(&text, &self.event_terms);
        if event_terms >= t.min_event_terms
            && (self.patterns.month_day.is_match(&text) || self.patterns.clock_time.is_match(&text))
        {
            return R::reject(EventListing).with_evidence(vec![format!("terms={event_terms}")]);
        }

        R::accept()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_body() -> String {
        "The city council met on Tuesday evening to debate the new budget. \
         Members argued for nearly three hours about road repairs and school funding. \
         The mayor said a final vote would follow next week."
            .to_string()
    }

    fn article(body: &str) -> ArticleCandidate {
        ArticleCandidate {
            headline: "Council debates budget".into(),
            body: body.into(),
            byline: "By Staff Writer".into(),
            section: Section::News,
            tags: vec!["politics".into()],
        }
    }

    #[test]
    fn plain_news_is_accepted() {
        let c = Classifier::with_defaults();
        let res = c.classify(&article(&news_body()));
        assert_eq!(res, ClassificationResult::accept(), "evidence: {:?}", res.evidence);
    }

    #[test]
    fn reason_labels_round_trip() {
        for r in RejectReason::ALL {
            assert_eq!(RejectReason::from_label(r.as_str()), Some(r));
        }
        assert_eq!(RejectReason::from_label("Processing error"), None);
    }

    #[test]
    fn unknown_section_only_rejected_in_strict_mode() {
        let c = Classifier::with_defaults();
        let mut a = article(&news_body());
        a.section = Section::Unknown;
        assert!(c.classify(&a).accepted);
        let strict = c.with_strict_sections();
        assert_eq!(strict.classify(&a).reason, Some(RejectReason::SectionExcluded));
    }

    #[test]
    fn empty_keyword_list_disables_rule() {
        let mut cfg = ClassifierConfig::default();
        cfg.lexicon.ad_keywords.clear();
        let c = Classifier::new(cfg).unwrap();
        let body = format!("{} Free sale on cash deals.", news_body());
        assert_ne!(c.classify(&article(&body)).reason, Some(RejectReason::AdKeywords));
    }

    #[test]
    fn keyword_evidence_is_distinct_and_lowercase() {
        let c = Classifier::with_defaults();
        let body = format!("{} SALE sale Discount cash.", news_body());
        let res = c.classify(&article(&body));
        assert_eq!(res.reason, Some(RejectReason::AdKeywords));
        assert_eq!(res.evidence, vec!["cash", "discount", "sale"]);
    }

    #[test]
    fn serializes_reason_as_label() {
        let res = ClassificationResult::reject(RejectReason::BodyTooShort);
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["accepted"], false);
        assert_eq!(v["reason"], "Body too short");
        assert!(v.get("evidence").is_none());
    }
}
