// tests/classify_rules.rs
//
// Each rule of the chain fired in isolation, plus first-match ordering.

use hsa_filter::{Classifier, RejectReason};
use serde_json::{json, Value};

const NEWS: &str = "The city council met on Tuesday evening to debate the new budget. \
Members argued for nearly three hours about road repairs and school funding. \
The mayor said a final vote would follow next week.";

fn record(body: &str) -> Value {
    json!({
        "headline": "Council debates budget",
        "body": body,
        "byline": "By Staff Writer",
        "section": "news",
        "tags": ["politics"]
    })
}

fn reason_for(rec: &Value) -> Option<RejectReason> {
    Classifier::with_defaults().classify_value(rec).reason
}

fn with_extra(extra: &str) -> Value {
    record(&format!("{NEWS} {extra}"))
}

#[test]
fn news_article_is_accepted() {
    let res = Classifier::with_defaults().classify_value(&record(NEWS));
    assert!(res.accepted, "unexpected rejection: {:?}", res);
    assert!(res.reason.is_none());
}

#[test]
fn ad_and_classified_sections_are_excluded() {
    for section in ["ad", "classified", "Classifieds"] {
        let mut rec = record(NEWS);
        rec["section"] = json!(section);
        assert_eq!(reason_for(&rec), Some(RejectReason::SectionExcluded), "{section}");
    }
}

#[test]
fn ad_tag_substring_matches() {
    let mut rec = record(NEWS);
    rec["tags"] = json!(["local", "Classified Ads"]);
    assert_eq!(reason_for(&rec), Some(RejectReason::AdTag));
}

#[test]
fn missing_fields() {
    let mut rec = record(NEWS);
    rec["headline"] = json!("");
    assert_eq!(reason_for(&rec), Some(RejectReason::MissingHeadline));

    let rec = record("");
    assert_eq!(reason_for(&rec), Some(RejectReason::MissingBody));

    let rec = json!({ "headline": "Only a headline" });
    assert_eq!(reason_for(&rec), Some(RejectReason::MissingBody));
}

#[test]
fn short_body() {
    assert_eq!(
        reason_for(&record("Too short. Really.")),
        Some(RejectReason::BodyTooShort)
    );
}

#[test]
fn body_without_sentences() {
    let body = "word ".repeat(40);
    assert_eq!(reason_for(&record(&body)), Some(RejectReason::TooFewSentences));
}

#[test]
fn symbol_heavy_body() {
    let rec = with_extra("@@@@@@@@@@@@@@@@@@@@");
    assert_eq!(reason_for(&rec), Some(RejectReason::HighSymbolRatio));

    // No word tokens at all: ratio is 1.0
    let rec = record(&"!@#$%".repeat(30));
    assert_eq!(reason_for(&rec), Some(RejectReason::HighSymbolRatio));
}

#[test]
fn three_distinct_ad_keywords() {
    assert_eq!(
        reason_for(&with_extra("Cash sale with discount.")),
        Some(RejectReason::AdKeywords)
    );
    // Repeats of one keyword are not distinct
    assert_eq!(reason_for(&with_extra("Sale sale SALE.")), None);
}

#[test]
fn repeated_phone_numbers() {
    let rec = with_extra("Reach 555-123-4567 or 555-987-6543.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PhoneNumbers));
    assert_eq!(reason_for(&with_extra("Reach 555-123-4567.")), None);

    let rec = with_extra("Lines 555-123-4567, 555.987.6543 and 555 222 3333 opened.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PhoneNumbers));
    // Part of a longer digit run is not a phone number
    assert_eq!(reason_for(&with_extra("Serial 15551234567 and 25559876543.")), None);
}

#[test]
fn repeated_prices() {
    let rec = with_extra("Seats were $5 and $10.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PriceMentions));

    // Thousands separators and cents
    let rec = with_extra("Repairs ran $1,250.00 and $3,400.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PriceMentions));
    assert_eq!(reason_for(&with_extra("Repairs ran $1,250.00.")), None);
}

#[test]
fn repeated_percentages() {
    let rec = with_extra("Turnout rose 12% while costs fell 8%.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PercentageMentions));

    // Space before the sign
    let rec = with_extra("Turnout rose 12 % while costs fell 8 %.");
    assert_eq!(reason_for(&rec), Some(RejectReason::PercentageMentions));
}

#[test]
fn business_address() {
    let res = Classifier::with_defaults()
        .classify_value(&with_extra("Crews met at 12 North Elm Street early."));
    assert_eq!(res.reason, Some(RejectReason::BusinessAddress));
    assert_eq!(res.evidence, vec!["12 north elm street"]);
}

#[test]
fn call_to_action_phrase() {
    assert_eq!(
        reason_for(&with_extra("Visit us soon.")),
        Some(RejectReason::AdPhrase)
    );
}

#[test]
fn bulleted_list() {
    let body = format!("{NEWS}\n- roads\n- schools\n- parks");
    assert_eq!(reason_for(&record(&body)), Some(RejectReason::BulletList));
}

#[test]
fn real_estate_vocabulary() {
    let rec = with_extra("The garage and the master suite were rebuilt.");
    assert_eq!(reason_for(&rec), Some(RejectReason::RealEstateListing));
}

#[test]
fn event_listing_needs_a_date_or_time() {
    let rec = with_extra("The concert and exhibit open Aug 14.");
    assert_eq!(reason_for(&rec), Some(RejectReason::EventListing));

    let rec = with_extra("The concert and exhibit were praised.");
    assert_eq!(reason_for(&rec), None);

    // Clock time instead of a date
    let rec = with_extra("Doors open at 7 pm for the concert and the show.");
    assert_eq!(reason_for(&rec), Some(RejectReason::EventListing));
    let rec = with_extra("The concert and exhibit start at 7:30 PM.");
    assert_eq!(reason_for(&rec), Some(RejectReason::EventListing));
}

#[test]
fn first_matching_rule_wins() {
    // Ad section beats every later signal
    let rec = json!({ "section": "ad", "tags": ["advertisement"] });
    assert_eq!(reason_for(&rec), Some(RejectReason::SectionExcluded));

    // Missing headline is reported before the short body
    let rec = json!({ "body": "short", "section": "news" });
    assert_eq!(reason_for(&rec), Some(RejectReason::MissingHeadline));

    // Keywords (rule 7) before phones (rule 8)
    let rec = with_extra("Cash sale with discount. Reach 555-123-4567 or 555-987-6543.");
    assert_eq!(reason_for(&rec), Some(RejectReason::AdKeywords));
}

#[test]
fn strict_mode_rejects_sectionless_records() {
    let mut rec = record(NEWS);
    rec.as_object_mut().unwrap().remove("section");
    let c = Classifier::with_defaults();
    assert!(c.classify_value(&rec).accepted);
    assert_eq!(
        c.with_strict_sections().classify_value(&rec).reason,
        Some(RejectReason::SectionExcluded)
    );
}

#[test]
fn classification_is_deterministic() {
    let c = Classifier::with_defaults();
    let rec = with_extra("Visit us soon.");
    assert_eq!(c.classify_value(&rec), c.classify_value(&rec));
}
