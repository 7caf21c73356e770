// src/classify/config.rs
//! Classifier configuration: thresholds + vocabularies, loaded from TOML.
//!
//! Every field has a built-in default, so a config file only needs to name
//! what it overrides:
//!
//! ```toml
//! strict_section_exclusion = true
//!
//! [thresholds]
//! min_body_chars = 300
//!
//! [lexicon]
//! ad_phrases = ["call now", "free estimate"]
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// --- env defaults & names ---
pub const DEFAULT_CLASSIFIER_CONFIG_PATH: &str = "config/classifier.toml";
pub const ENV_CLASSIFIER_CONFIG_PATH: &str = "HSA_FILTER_CONFIG";
pub const ENV_STRICT_SECTIONS: &str = "HSA_FILTER_STRICT_SECTIONS";

const MAX_SYMBOL_RATIO_CEILING: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Also reject articles whose declared section is `unknown` (or absent).
    /// `ad` and `classified` are rejected regardless.
    pub strict_section_exclusion: bool,
    pub thresholds: Thresholds,
    pub lexicon: Lexicon,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strict_section_exclusion: false,
            thresholds: Thresholds::default(),
            lexicon: Lexicon::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Bodies shorter than this (in chars) are rejected.
    pub min_body_chars: usize,
    /// Minimum number of sentence-terminator runs.
    pub min_sentences: usize,
    /// Symbols per word token above which a body is rejected.
    pub max_symbol_ratio: f32,
    /// Distinct ad keywords at or above which a text is rejected.
    pub min_distinct_ad_keywords: usize,
    pub max_phone_numbers: usize,
    pub max_price_mentions: usize,
    pub max_percentage_mentions: usize,
    pub min_bullet_lines: usize,
    pub min_real_estate_terms: usize,
    pub min_event_terms: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_body_chars: 150,
            min_sentences: 2,
            max_symbol_ratio: 0.25,
            min_distinct_ad_keywords: 3,
            max_phone_numbers: 1,
            max_price_mentions: 1,
            max_percentage_mentions: 1,
            min_bullet_lines: 3,
            min_real_estate_terms: 2,
            min_event_terms: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Substrings that mark a tag as ad-related.
    pub ad_tag_terms: Vec<String>,
    /// Whole-word commerce/real-estate/employment vocabulary.
    pub ad_keywords: Vec<String>,
    /// Call-to-action idioms, matched as substrings.
    pub ad_phrases: Vec<String>,
    pub real_estate_terms: Vec<String>,
    pub event_terms: Vec<String>,
    /// Street-type words closing a business address.
    pub street_suffixes: Vec<String>,
    /// Line prefixes counted as list bullets.
    pub bullet_glyphs: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            ad_tag_terms: strings(&["ad", "advertisement", "classified", "listing", "shopping"]),
            ad_keywords: strings(&[
                "sale", "discount", "special", "offer", "price", "buy", "call", "contact",
                "financing", "money", "cash", "credit", "cheap", "affordable", "deal",
                "service", "appointment", "opening", "rent", "lease", "property", "realty",
                "bedroom", "bath", "sq ft", "house", "home", "apartment", "condo", "office",
                "shop", "store", "mall", "phone", "wanted", "hiring", "position", "job",
                "employment", "salary", "wage", "benefit", "insurance", "opportunity",
                "resume", "interview", "apply", "application", "free", "low price",
                "clearance", "retail", "wholesale", "dealer", "dealership", "market",
            ]),
            ad_phrases: strings(&[
                "call now", "call today", "for appointment", "free estimate", "open house",
                "open sunday", "call for", "for information", "for details", "buy now",
                "limited time", "apply today", "walk-in", "come see", "sale ends",
                "don't miss", "visit us",
            ]),
            real_estate_terms: strings(&[
                "bedroom", "bath", "sq ft", "square foot", "lot size", "acreage",
                "open floor plan", "master suite", "garage",
            ]),
            event_terms: strings(&[
                "admission", "tickets", "event", "show", "performance", "concert", "exhibit",
                "exhibition", "gallery", "matinee", "pm", "am",
            ]),
            street_suffixes: strings(&[
                "road", "st", "street", "ave", "avenue", "blvd", "boulevard", "ln", "lane",
                "dr", "drive", "ct", "court", "pl", "place",
            ]),
            bullet_glyphs: strings(&["•", "-", "*", "–"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ClassifierConfig {
    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut cfg: ClassifierConfig = toml::from_str(toml_str)?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read classifier config at {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $HSA_FILTER_CONFIG
    /// 2) config/classifier.toml
    /// 3) built-in defaults
    ///
    /// `$HSA_FILTER_STRICT_SECTIONS` then overrides `strict_section_exclusion`.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CLASSIFIER_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(Error::Config(format!(
                        "{ENV_CLASSIFIER_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    )));
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_CLASSIFIER_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load `path` if given, otherwise run the default discovery. Env
    /// overrides apply either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let mut cfg = Self::load_from(p)?;
                cfg.apply_env_overrides();
                Ok(cfg)
            }
            None => Self::load_default(),
        }
    }

    /// `$HSA_FILTER_STRICT_SECTIONS` overrides `strict_section_exclusion`
    /// whatever file the config came from.
    pub fn apply_env_overrides(&mut self) {
        if let Some(strict) = parse_bool_env(std::env::var(ENV_STRICT_SECTIONS).ok()) {
            info!(strict, "strict section exclusion overridden from env");
            self.strict_section_exclusion = strict;
        }
    }

    /// Path the default loader would read, if any.
    pub fn resolved_path() -> Option<PathBuf> {
        if let Ok(p) = std::env::var(ENV_CLASSIFIER_CONFIG_PATH) {
            return Some(PathBuf::from(p));
        }
        let p = PathBuf::from(DEFAULT_CLASSIFIER_CONFIG_PATH);
        p.exists().then_some(p)
    }

    /// Keep thresholds in a usable range; blank lexicon entries are dropped.
    fn sanitize(&mut self) {
        let t = &mut self.thresholds;
        if !t.max_symbol_ratio.is_finite() {
            t.max_symbol_ratio = Thresholds::default().max_symbol_ratio;
        }
        t.max_symbol_ratio = t.max_symbol_ratio.clamp(0.0, MAX_SYMBOL_RATIO_CEILING);

        let lx = &mut self.lexicon;
        for list in [
            &mut lx.ad_tag_terms,
            &mut lx.ad_keywords,
            &mut lx.ad_phrases,
            &mut lx.real_estate_terms,
            &mut lx.event_terms,
            &mut lx.street_suffixes,
            &mut lx.bullet_glyphs,
        ] {
            list.retain(|s| !s.trim().is_empty());
        }
    }
}

fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
