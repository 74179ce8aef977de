//! Markup stripping and title/company parsing for feeds that mix them.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

pub const UNKNOWN_COMPANY: &str = "Unknown";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// "<Company> busca personal para el cargo de <Title> en <Location>"
static SPANISH_HIRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<company>.+?)\s+busca\s+personal\s+para\s+el\s+cargo\s+de\s+(?P<title>.+?)(?:\s+en\s+(?P<location>.+?))?\s*$",
    )
    .expect("valid regex")
});

/// "<Title> at <Company>", matched on the original text so offsets stay valid.
static TITLE_AT_COMPANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<title>.+?)\s+at\s+(?P<company>.+)$").expect("valid regex")
});

/// Title, company and optional location recovered from one line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
}

/// Visible text of an HTML fragment, whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Splits a combined headline into title and company.
///
/// Tried in order: the Spanish hiring phrase, "Title at Company",
/// "Company: Title". Anything else keeps the whole line as the title.
pub fn parse_title_company(raw: &str) -> ParsedTitle {
    let text = WHITESPACE.replace_all(raw.trim(), " ").into_owned();

    if let Some(caps) = SPANISH_HIRING.captures(&text) {
        let company = caps.name("company").map(|m| m.as_str().trim()).unwrap_or_default();
        let title = caps.name("title").map(|m| m.as_str().trim()).unwrap_or_default();
        if !company.is_empty() && !title.is_empty() {
            return ParsedTitle {
                title: title.to_string(),
                company: company.to_string(),
                location: caps
                    .name("location")
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|l| !l.is_empty()),
            };
        }
    }

    if let Some(caps) = TITLE_AT_COMPANY.captures(&text) {
        let title = caps.name("title").map(|m| m.as_str().trim()).unwrap_or_default();
        let company = caps.name("company").map(|m| m.as_str().trim()).unwrap_or_default();
        if !title.is_empty() && !company.is_empty() {
            return ParsedTitle {
                title: title.to_string(),
                company: company.to_string(),
                location: None,
            };
        }
    }

    if let Some((company, title)) = text.split_once(": ") {
        let (company, title) = (company.trim(), title.trim());
        if !company.is_empty() && !title.is_empty() {
            return ParsedTitle {
                title: title.to_string(),
                company: company.to_string(),
                location: None,
            };
        }
    }

    ParsedTitle {
        title: text,
        company: UNKNOWN_COMPANY.to_string(),
        location: None,
    }
}
