use crate::error::{Result, StagehandError};
use rust_embed::Embed;

/// Phrases the bundled templates use to mark unfinished sections. A document
/// that still contains either one has not been filled in.
pub const PLACEHOLDER_PHRASES: [&str; 2] = ["<!-- TODO: fill in -->", "_Replace this section._"];

pub trait TemplateStore {
    fn read_template(&self, name: &str) -> Result<String>;
}

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/templates/"]
struct BundledTemplates;

/// Templates compiled into the binary, addressed by file name (`goal.md`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl TemplateStore for EmbeddedTemplates {
    fn read_template(&self, name: &str) -> Result<String> {
        let file = <BundledTemplates as Embed>::get(name)
            .ok_or_else(|| StagehandError::TemplateNotFound(name.to_string()))?;
        String::from_utf8(file.data.into_owned())
            .map_err(|_| StagehandError::TemplateNotFound(format!("{name} (not utf-8)")))
    }
}

/// Normalize line endings and trailing whitespace so cosmetic edits don't
/// count as filling in a document.
pub fn normalize(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    lines[..end].join("\n")
}

/// True when `content` is still the scaffold produced from `template`.
pub fn is_unedited(content: &str, template: &str) -> bool {
    normalize(content) == normalize(template)
        || PLACEHOLDER_PHRASES.iter().any(|p| content.contains(p))
}
