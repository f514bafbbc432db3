//! PII redaction: a pluggable analyzer trait plus a regex fallback.
//!
//! `scrub` is idempotent — placeholders never match any entity regex, so
//! running it twice over the same text yields the same text.

use std::sync::LazyLock;

use regex::Regex;

/// A PII entity recognized by an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiEntity {
    Person,
    Email,
    Phone,
    CreditCard,
    BankAccount,
    Ip,
    Location,
    NationalId,
    MedicalId,
    Url,
}

impl PiiEntity {
    #[must_use]
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Person => "<PERSON>",
            Self::Email => "<EMAIL>",
            Self::Phone => "<PHONE>",
            Self::CreditCard => "<CARD>",
            Self::BankAccount => "<IBAN>",
            Self::Ip => "<IP>",
            Self::Location => "<LOCATION>",
            Self::NationalId => "<ID>",
            Self::MedicalId => "<MEDICAL_ID>",
            Self::Url => "<URL>",
        }
    }
}

/// A single entity match within a text span.
#[derive(Debug, Clone, Copy)]
pub struct PiiMatch {
    pub entity: PiiEntity,
    pub start: usize,
    pub end: usize,
}

/// Pluggable PII detector. The shipped implementation (`RegexAnalyzer`) is the
/// fixed-taxonomy fallback the contract requires when no higher-fidelity NER
/// model is wired in; a richer analyzer can be swapped in behind this trait
/// without touching the rest of the pipeline.
pub trait PiiAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<PiiMatch>;
}

#[expect(clippy::unwrap_used, reason = "static regex patterns are compile-time validated")]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

#[expect(clippy::unwrap_used, reason = "static regex patterns are compile-time validated")]
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

#[expect(clippy::unwrap_used, reason = "static regex patterns are compile-time validated")]
static CARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap());

#[expect(clippy::unwrap_used, reason = "static regex patterns are compile-time validated")]
static IP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").unwrap());

#[expect(clippy::unwrap_used, reason = "static regex patterns are compile-time validated")]
static NATIONAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-\s]?\d{2}[-\s]?\d{4}\b").unwrap());

/// Fixed-taxonomy regex analyzer: email, NA/international phone, 16-digit
/// card, dotted IPv4, 9-digit national ID. Dates, person names, locations,
/// bank accounts, medical IDs, and URLs are out of reach of a regex-only
/// analyzer and are left to a richer `PiiAnalyzer` if one is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexAnalyzer;

impl PiiAnalyzer for RegexAnalyzer {
    fn analyze(&self, text: &str) -> Vec<PiiMatch> {
        let mut matches = Vec::new();
        for m in EMAIL_RE.find_iter(text) {
            matches.push(PiiMatch { entity: PiiEntity::Email, start: m.start(), end: m.end() });
        }
        for m in PHONE_RE.find_iter(text) {
            matches.push(PiiMatch { entity: PiiEntity::Phone, start: m.start(), end: m.end() });
        }
        for m in CARD_RE.find_iter(text) {
            matches.push(PiiMatch { entity: PiiEntity::CreditCard, start: m.start(), end: m.end() });
        }
        for m in IP_RE.find_iter(text) {
            matches.push(PiiMatch { entity: PiiEntity::Ip, start: m.start(), end: m.end() });
        }
        for m in NATIONAL_ID_RE.find_iter(text) {
            matches.push(PiiMatch { entity: PiiEntity::NationalId, start: m.start(), end: m.end() });
        }
        matches
    }
}

/// Scrubs text through a `PiiAnalyzer`, replacing each match with its fixed placeholder.
pub struct Redactor {
    analyzer: Box<dyn PiiAnalyzer>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(Box::new(RegexAnalyzer))
    }
}

impl Redactor {
    #[must_use]
    pub fn new(analyzer: Box<dyn PiiAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Replaces every detected PII span with its placeholder. Idempotent:
    /// placeholders are bracket-delimited uppercase tokens that never match
    /// any of the entity regexes, so re-scrubbing scrubbed text is a no-op.
    /// Applies `scrub` to named fields of a record, leaving everything else
    /// (structural and numeric fields) untouched. Field order is preserved.
    #[must_use]
    pub fn scrub_record(&self, mut fields: Vec<(String, String)>) -> Vec<(String, String)> {
        for (_, value) in &mut fields {
            *value = self.scrub(value);
        }
        fields
    }

    #[must_use]
    pub fn scrub(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return text.to_owned();
        }

        let mut matches = self.analyzer.analyze(text);
        if matches.is_empty() {
            return text.to_owned();
        }
        matches.sort_by_key(|m| m.start);

        let mut result = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for m in matches {
            if m.start < cursor {
                continue; // overlapping match, already covered
            }
            result.push_str(&text[cursor..m.start]);
            result.push_str(m.entity.placeholder());
            cursor = m.end;
        }
        result.push_str(&text[cursor..]);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_is_idempotent() {
        let r = Redactor::default();
        let input = "Call me at 555-123-4567 or email john.doe@accor.com";
        let once = r.scrub(input);
        let twice = r.scrub(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn scrub_empty_unchanged() {
        let r = Redactor::default();
        assert_eq!(r.scrub(""), "");
        assert_eq!(r.scrub("   "), "   ");
    }

    #[test]
    fn scrub_replaces_email_and_ip() {
        let r = Redactor::default();
        let out = r.scrub("Server IP is 192.168.1.100, contact a@b.com");
        assert!(out.contains("<IP>"));
        assert!(out.contains("<EMAIL>"));
        assert!(!out.contains("192.168.1.100"));
    }

    #[test]
    fn scrub_replaces_card() {
        let r = Redactor::default();
        let out = r.scrub("My credit card is 4111-1111-1111-1111");
        assert_eq!(out, "My credit card is <CARD>");
    }

    #[test]
    fn scrub_preserves_dates() {
        let r = Redactor::default();
        let out = r.scrub("Incident opened on 2026-07-27 at noon");
        assert!(out.contains("2026-07-27"));
    }
}
