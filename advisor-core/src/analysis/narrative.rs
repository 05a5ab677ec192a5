//! Layout of long narrative strings into `HEADER:` sections.

/// Sections of each solution's `moduleAnalysisContext`.
pub(crate) const SOLUTION_HEADERS: [&str; 7] = [
    "EXECUTIVE SUMMARY",
    "BUSINESS CHALLENGES ADDRESSED",
    "SOLUTION OVERVIEW",
    "BUSINESS IMPACT & ROI",
    "IMPLEMENTATION STRATEGY",
    "COMPETITIVE ADVANTAGES",
    "CONCLUSION",
];

pub(crate) const COMPANY_PROFILE_HEADERS: [&str; 3] =
    ["INDUSTRY ANALYSIS", "SCALE ASSESSMENT", "REGIONAL FACTORS"];

pub(crate) const BUSINESS_CONTEXT_HEADERS: [&str; 4] = [
    "BUSINESS CHALLENGES",
    "CURRENT SYSTEMS",
    "BUDGET ALIGNMENT",
    "TIMELINE ASSESSMENT",
];

pub(crate) const METHODOLOGY_HEADERS: [&str; 3] =
    ["DATA SOURCES", "CALCULATION METHOD", "BUSINESS CASE SUMMARY"];

/// Rewrites narrative text as `HEADER:` sections separated by blank lines.
///
/// Headers already present (in any case, optionally wrapped in Markdown
/// emphasis) are normalized. Text without any of them is split into
/// sentences and spread across the headers in order. Formatting its own
/// output changes nothing.
#[derive(Debug, Clone)]
pub(crate) struct NarrativeFormatter {
    min_chars: usize,
}

impl NarrativeFormatter {
    pub(crate) fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub(crate) fn format(&self, text: &str, headers: &[&str]) -> String {
        let text = text.trim();
        if text.chars().count() < self.min_chars || headers.is_empty() {
            return text.to_string();
        }

        let found = locate_headers(text, headers);
        if found.is_empty() {
            return synthesize(text, headers);
        }

        let mut sections = Vec::with_capacity(found.len() + 1);
        let preamble = clean(&text[..found[0].start]);
        if !preamble.is_empty() {
            sections.push(preamble.to_string());
        }
        for (i, header) in found.iter().enumerate() {
            let end = found.get(i + 1).map_or(text.len(), |next| next.start);
            let body = clean(&text[header.body_start..end]);
            if !body.is_empty() {
                sections.push(format!("{}:\n{body}", header.name));
            }
        }
        sections.join("\n\n")
    }
}

struct FoundHeader<'h> {
    name: &'h str,
    start: usize,
    body_start: usize,
}

/// First occurrence of each `HEADER:` in the text, in text order.
fn locate_headers<'h>(text: &str, headers: &[&'h str]) -> Vec<FoundHeader<'h>> {
    let haystack = text.to_ascii_lowercase();
    let mut found: Vec<FoundHeader<'h>> = headers
        .iter()
        .filter_map(|name| {
            let needle = format!("{}:", name.to_ascii_lowercase());
            haystack.find(&needle).map(|start| FoundHeader {
                name,
                start,
                body_start: start + needle.len(),
            })
        })
        .collect();
    found.sort_by_key(|h| h.start);
    // A header found inside another's span (e.g. a shorter header that is a
    // suffix of a longer one) is not a section boundary.
    found.dedup_by(|later, earlier| later.start < earlier.body_start);
    found
}

fn clean(fragment: &str) -> &str {
    fragment.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '#')
}

fn synthesize(text: &str, headers: &[&str]) -> String {
    let sentences = split_sentences(text);
    let groups = headers.len().min(sentences.len()).max(1);
    let per_group = sentences.len().div_ceil(groups).max(1);

    sentences
        .chunks(per_group)
        .zip(headers)
        .map(|(group, header)| format!("{header}:\n{}", group.join(" ")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits on sentence-ending punctuation followed by whitespace, and on line
/// breaks.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut flush = |current: &mut String| {
        let sentence = current.trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        current.clear();
    };

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            flush(&mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |next| next.is_whitespace()) {
            flush(&mut current);
        }
    }
    flush(&mut current);
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> NarrativeFormatter {
        NarrativeFormatter::new(20)
    }

    #[test]
    fn test_existing_headers_normalized() {
        let text = "Overview first. **industry analysis:** Discrete manufacturing is consolidating. \
                    Scale Assessment: 1,200 employees across 4 plants. REGIONAL FACTORS: EU data residency applies.";
        let formatted = formatter().format(text, &COMPANY_PROFILE_HEADERS);
        assert_eq!(
            formatted,
            "Overview first.\n\n\
             INDUSTRY ANALYSIS:\nDiscrete manufacturing is consolidating.\n\n\
             SCALE ASSESSMENT:\n1,200 employees across 4 plants.\n\n\
             REGIONAL FACTORS:\nEU data residency applies."
        );
        assert_eq!(formatter().format(&formatted, &COMPANY_PROFILE_HEADERS), formatted);
    }

    #[test]
    fn test_sections_synthesized_from_sentences() {
        let text = "Acme runs SAP ECC 6.0. Support ends in 2027. Budget is $1.5M. The board wants results in 12 months.";
        let formatted = formatter().format(text, &BUSINESS_CONTEXT_HEADERS);
        assert_eq!(
            formatted,
            "BUSINESS CHALLENGES:\nAcme runs SAP ECC 6.0.\n\n\
             CURRENT SYSTEMS:\nSupport ends in 2027.\n\n\
             BUDGET ALIGNMENT:\nBudget is $1.5M.\n\n\
             TIMELINE ASSESSMENT:\nThe board wants results in 12 months."
        );
        assert_eq!(formatter().format(&formatted, &BUSINESS_CONTEXT_HEADERS), formatted);
    }

    #[test]
    fn test_fewer_sentences_than_headers() {
        let formatted = formatter().format("Only one sentence here, but long enough.", &METHODOLOGY_HEADERS);
        assert_eq!(formatted, "DATA SOURCES:\nOnly one sentence here, but long enough.");
    }

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(NarrativeFormatter::new(200).format("  Brief note. ", &SOLUTION_HEADERS), "Brief note.");
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Costs fall 12.5% in year one! Why?\nBecause of automation"),
            vec!["Costs fall 12.5% in year one!", "Why?", "Because of automation"]
        );
    }
}
