//! Guess whether a reply was cut off before the model finished.
//!
//! Only the displayed copy is ever annotated; the transcript keeps the
//! reply exactly as received.

use regex::RegexSet;
use std::sync::OnceLock;

/// Replies at or under this many characters are never annotated.
///
/// Counted in Unicode scalar values (`str::chars`), not UTF-16 code units, so
/// an emoji counts once here where a browser's `String.length` counts it twice.
pub const MIN_ANNOTATED_CHARS: usize = 200;

pub const CAVEAT: &str =
    "\n\n💡 *Response may be incomplete. Feel free to ask me to continue or clarify!*";

fn cutoff_signs() -> &'static RegexSet {
    static SIGNS: OnceLock<RegexSet> = OnceLock::new();
    SIGNS.get_or_init(|| {
        RegexSet::new([
            // numbered list item with nothing after it ("7.")
            r"[0-9]+\.$",
            // bare number ("wait 5")
            r"[0-9]+$",
            // no terminal punctuation
            r"[^.!?]$",
            // ends mid-word
            r"[A-Za-z0-9_]{3,}$",
        ])
        .expect("truncation patterns are valid")
    })
}

/// True if the trimmed reply ends the way a cut-off reply tends to.
pub fn looks_truncated(reply: &str) -> bool {
    cutoff_signs().is_match(reply.trim())
}

/// Text to show for `reply`: the reply itself, plus [`CAVEAT`] when it looks
/// cut off and is long enough for that to matter.
pub fn annotate(reply: &str) -> String {
    if looks_truncated(reply) && reply.chars().count() > MIN_ANNOTATED_CHARS {
        tracing::debug!(chars = reply.chars().count(), "reply looks truncated");
        format!("{reply}{CAVEAT}")
    } else {
        reply.to_string()
    }
}
