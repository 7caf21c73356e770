// src/article.rs
//! Article candidate records as produced by the splitting/classification stages.
//!
//! Records arrive as loosely-typed JSON. Every text field is read leniently:
//! absent, `null` or non-string values become empty strings so the rule chain
//! never has to special-case missing data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared category of an article, as assigned by an upstream stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    News,
    Ad,
    Editorial,
    Classified,
    Sports,
    Business,
    Entertainment,
    Lifestyle,
    Other,
    #[default]
    Unknown,
}

impl Section {
    /// Case-insensitive parse. Empty input is `Unknown`; unrecognized labels are `Other`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "" | "unknown" => Section::Unknown,
            "news" => Section::News,
            "ad" | "ads" | "advertisement" => Section::Ad,
            "editorial" => Section::Editorial,
            "classified" | "classifieds" => Section::Classified,
            "sports" => Section::Sports,
            "business" => Section::Business,
            "entertainment" => Section::Entertainment,
            "lifestyle" => Section::Lifestyle,
            _ => Section::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::News => "news",
            Section::Ad => "ad",
            Section::Editorial => "editorial",
            Section::Classified => "classified",
            Section::Sports => "sports",
            Section::Business => "business",
            Section::Entertainment => "entertainment",
            Section::Lifestyle => "lifestyle",
            Section::Other => "other",
            Section::Unknown => "unknown",
        }
    }
}

/// The unit of work for the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleCandidate {
    pub headline: String,
    pub body: String,
    pub byline: String,
    pub section: Section,
    pub tags: Vec<String>,
}

impl ArticleCandidate {
    /// Build a candidate from an arbitrary JSON value.
    ///
    /// Non-object values yield an all-empty candidate. `tags` accepts an array
    /// (non-string entries are skipped) or a single string.
    pub fn from_value(v: &Value) -> Self {
        let tags = match v.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        Self {
            headline: text_field(v, "headline"),
            body: text_field(v, "body"),
            byline: text_field(v, "byline"),
            section: Section::parse(&text_field(v, "section")),
            tags,
        }
    }

    /// `headline + " " + body + " " + byline`, lowercased. Shared input of the lexical rules.
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.headline, self.body, self.byline).to_lowercase()
    }
}

impl<'de> Deserialize<'de> for ArticleCandidate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&v))
    }
}

fn text_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
