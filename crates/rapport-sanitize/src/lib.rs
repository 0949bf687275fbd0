//! Renderer-safe text normalization
//!
//! Completion services return markdown-flavored prose; the PDF renderer wants
//! plain text restricted to the glyphs its font is guaranteed to carry. This
//! crate turns raw analysis text into that form.
//!
//! [`sanitize`] is pure, deterministic, and idempotent: a second pass over
//! its own output changes nothing. The steps run in a fixed order — later
//! steps assume the earlier ones already ran (the bullet normalization, for
//! instance, relies on en/em dashes having been folded to `-`).

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Canonical bullet glyph for normalized list markers
pub const BULLET: char = '•';

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("link pattern is valid")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>\n]*>").expect("tag pattern is valid"));
static NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"));
static SPACES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("space pattern is valid"));
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ ?- +").expect("list marker pattern is valid"));

/// Whether a character survives the charset filter
///
/// Allowed: printable ASCII plus `\n`/`\t`, Latin-1 accented letters
/// (excluding the × and ÷ operators), Œ/œ, the currency signs € £ ¥ ¢, and
/// the canonical bullet.
fn is_allowed(c: char) -> bool {
    match c {
        '\n' | '\t' => true,
        ' '..='~' => true,
        'À'..='ÿ' => c != '×' && c != '÷',
        'Œ' | 'œ' => true,
        '€' | '£' | '¥' | '¢' => true,
        BULLET => true,
        _ => false,
    }
}

/// Step 1: drop characters outside the allowed set
///
/// A few common typographic characters are folded to ASCII equivalents
/// instead of being dropped, so prose keeps its meaning.
fn filter_charset(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{00A0}' => out.push(' '),
            '\u{2026}' => out.push_str("..."),
            c if is_allowed(c) => out.push(c),
            _ => {}
        }
    }
    out
}

/// Step 2: strip emphasis, heading, and code markers
///
/// Hyphens are left alone here; only line-leading list markers are rewritten,
/// in step 5, so words like "long-term" survive.
fn strip_emphasis(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#' | '~'))
        .collect()
}

/// Replace until nothing matches anymore
///
/// A single `replace_all` pass can expose a fresh match when brackets nest
/// (`<<b>>` leaves `<>` behind), so these rewrites run to a fixed point.
fn replace_to_fixpoint(re: &Regex, input: String, rep: &str) -> String {
    let mut text = input;
    loop {
        match re.replace_all(&text, rep) {
            Cow::Borrowed(_) => return text,
            Cow::Owned(replaced) => text = replaced,
        }
    }
}

/// Normalize raw analysis text into renderer-safe plain text
///
/// Empty input yields empty output.
pub fn sanitize(raw: &str) -> String {
    // 1. charset filter
    let text = filter_charset(raw);

    // 2. emphasis / heading / code markers
    let text = strip_emphasis(&text);

    // 3. markdown links become their label; HTML-like tags vanish
    let text = replace_to_fixpoint(&LINK_RE, text, "$1");
    let text = replace_to_fixpoint(&TAG_RE, text, "");

    // 4. whitespace collapse
    let text = NEWLINES_RE.replace_all(&text, "\n\n");
    let text = SPACES_RE.replace_all(&text, " ");

    // 5. leading list markers become the canonical bullet
    let text = LIST_MARKER_RE.replace_all(&text, format!("{BULLET} "));

    // 6. outer trim
    text.trim().to_string()
}
