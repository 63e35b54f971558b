use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Phase metadata declared in the phase-analysis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseInfo {
    pub number: u32,
    pub name: String,
    pub is_pull_request_boundary: bool,
}

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    HEADER_RE.get_or_init(|| Regex::new(r"(?i)^#{2,3}\s*phase\s+(\d+)\s*[:\-]\s*(.+?)\s*$").unwrap())
}

fn boundary_re() -> &'static Regex {
    BOUNDARY_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:[-*]\s+)?\**pr\s+boundary\**\s*:\s*\**\s*(yes|no|true|false)\b").unwrap()
    })
}

/// Scan for `## Phase <N>: <name>` headers. The first non-blank line after a
/// header may be `PR Boundary: yes|no`; without it the phase is not a boundary.
/// A repeated phase number keeps its first declaration.
pub fn parse(content: &str) -> Vec<PhaseInfo> {
    let mut phases: Vec<PhaseInfo> = Vec::new();
    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        let Some(caps) = header_re().captures(line.trim_end()) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u32>() else {
            continue;
        };
        let name = caps[2].to_string();

        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        let is_pull_request_boundary = match lines.peek().and_then(|l| boundary_re().captures(l)) {
            Some(b) => {
                let flag = b[1].to_ascii_lowercase();
                lines.next();
                flag == "yes" || flag == "true"
            }
            None => false,
        };

        if phases.iter().any(|p| p.number == number) {
            tracing::warn!(number, "duplicate phase header ignored");
            continue;
        }
        phases.push(PhaseInfo {
            number,
            name,
            is_pull_request_boundary,
        });
    }
    phases
}
