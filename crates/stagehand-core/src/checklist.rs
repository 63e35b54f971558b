//! Line-oriented checklist document: `- [ |x] [<identifier>] <free text>`.
//!
//! Rewrites touch exactly one line (or insert new ones) and leave every other
//! byte alone, so a flag flip shows up in git as a single modified line.

use crate::error::{Result, StagehandError};
use crate::phase_analysis::PhaseInfo;
use crate::types::{phase_identifier, PHASE_ID_PREFIX};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChecklistItem {
    pub identifier: String,
    pub description: String,
    pub is_checked: bool,
    pub phase_number: Option<u32>,
}

static LINE_RE: OnceLock<Regex> = OnceLock::new();

fn line_re() -> &'static Regex {
    LINE_RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s\[([ xX])\]\s\[([A-Za-z0-9_-]+)\](?:\s+(.*?))?\s*$").unwrap()
    })
}

fn phase_number(identifier: &str) -> Option<u32> {
    identifier
        .strip_prefix(PHASE_ID_PREFIX)
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse().ok())
}

/// Split a line into its body and its terminator (`""`, `"\n"` or `"\r\n"`).
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn parse_line(body: &str) -> Option<StateChecklistItem> {
    let caps = line_re().captures(body)?;
    let identifier = caps[2].to_string();
    Some(StateChecklistItem {
        phase_number: phase_number(&identifier),
        is_checked: &caps[1] != " ",
        description: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        identifier,
    })
}

/// Every checklist row in document order. Other lines are ignored.
pub fn parse(content: &str) -> Vec<StateChecklistItem> {
    content
        .split_inclusive('\n')
        .filter_map(|line| parse_line(split_terminator(line).0))
        .collect()
}

/// Set the checked state of `identifier`, leaving all other bytes untouched.
/// Setting a row to the state it already has returns the content unchanged.
pub fn set_checked(content: &str, identifier: &str, checked: bool) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut found = false;
    for line in content.split_inclusive('\n') {
        if !found {
            let (body, _) = split_terminator(line);
            if let Some(caps) = line_re().captures(body) {
                if &caps[2] == identifier {
                    found = true;
                    let mark = caps.get(1).map(|m| m.start()).unwrap_or(0);
                    out.push_str(&line[..mark]);
                    out.push(if checked { 'x' } else { ' ' });
                    out.push_str(&line[mark + 1..]);
                    continue;
                }
            }
        }
        out.push_str(line);
    }
    if !found {
        return Err(StagehandError::ChecklistItemNotFound(identifier.to_string()));
    }
    Ok(out)
}

/// Flip the checked state of `identifier`.
pub fn toggle(content: &str, identifier: &str) -> Result<String> {
    let current = parse(content)
        .into_iter()
        .find(|i| i.identifier == identifier)
        .ok_or_else(|| StagehandError::ChecklistItemNotFound(identifier.to_string()))?;
    set_checked(content, identifier, !current.is_checked)
}

/// Insert one unchecked `phase_<N>` row per phase directly after the `anchor`
/// row. Phases that already have a row are skipped.
pub fn insert_phase_rows(content: &str, anchor: &str, phases: &[PhaseInfo]) -> Result<String> {
    let existing: Vec<u32> = parse(content).iter().filter_map(|i| i.phase_number).collect();
    let mut out = String::with_capacity(content.len() + phases.len() * 40);
    let mut found = false;
    for line in content.split_inclusive('\n') {
        out.push_str(line);
        if found {
            continue;
        }
        let (body, terminator) = split_terminator(line);
        let Some(caps) = line_re().captures(body) else {
            continue;
        };
        if &caps[2] != anchor {
            continue;
        }
        found = true;
        let indent: String = body.chars().take_while(|c| c.is_whitespace()).collect();
        let newline = match terminator {
            "" if content.contains("\r\n") => "\r\n",
            "" => "\n",
            t => t,
        };
        if terminator.is_empty() {
            out.push_str(newline);
        }
        for phase in phases.iter().filter(|p| !existing.contains(&p.number)) {
            out.push_str(&format!(
                "{indent}- [ ] [{}] {}{newline}",
                phase_identifier(phase.number),
                phase.name
            ));
        }
    }
    if !found {
        return Err(StagehandError::ChecklistAnchorNotFound(anchor.to_string()));
    }
    Ok(out)
}
