//! The rich-text toolbar of the post editor. Article bodies are HTML
//! fragments; the toolbar wraps the selected text in a tag.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A toolbar button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Bold,
    Italic,
    Quote,
}

impl FormatTag {
    /// HTML element the button wraps the selection in.
    pub fn element(self) -> &'static str {
        match self {
            FormatTag::Bold => "b",
            FormatTag::Italic => "i",
            FormatTag::Quote => "blockquote",
        }
    }
}

impl FromStr for FormatTag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bold" | "b" => Ok(FormatTag::Bold),
            "italic" | "i" => Ok(FormatTag::Italic),
            "quote" | "blockquote" => Ok(FormatTag::Quote),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Wrap the bytes `start..end` of `content` in `tag`. Offsets past the
/// end are clamped, offsets inside a character move back to its start
/// and a reversed range is swapped.
///
/// ```
/// use newsdesk::editor::{format_selection, FormatTag};
///
/// assert_eq!(format_selection("Vote today", 0, 4, FormatTag::Bold), "<b>Vote</b> today");
/// ```
pub fn format_selection(content: &str, start: usize, end: usize, tag: FormatTag) -> String {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let start = floor_char_boundary(content, start);
    let end = floor_char_boundary(content, end);
    let element = tag.element();
    format!(
        "{}<{element}>{}</{element}>{}",
        &content[..start],
        &content[start..end],
        &content[end..]
    )
}
