//! Emphasis Markup
//!
//! Generated quote/content text embeds `<keyword>` / `</keyword>` pairs
//! around salient terms. Rather than passing marked-up strings around,
//! callers split them into typed segments; plain-prose fields get the
//! markers stripped instead.

pub const OPEN: &str = "<keyword>";
pub const CLOSE: &str = "</keyword>";

/// One run of text, either plain or emphasized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub emphasized: bool,
}

/// Split marked-up text into alternating plain/emphasized segments.
/// Both markers act as toggles, so unbalanced input degrades to
/// alternation instead of erroring. Empty runs are dropped.
pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut emphasized = false;
    for piece in text.replace(CLOSE, OPEN).split(OPEN) {
        if !piece.is_empty() {
            out.push(Segment {
                text: piece.to_string(),
                emphasized,
            });
        }
        emphasized = !emphasized;
    }
    out
}

/// Remove all emphasis markers, keeping the text between them.
pub fn strip(text: &str) -> String {
    text.replace(OPEN, "").replace(CLOSE, "")
}
