//! Greedy word wrapping for the body column

/// Wrap text to a column of at most `width` characters per line
///
/// Paragraph structure is preserved: existing newlines start new lines, and
/// blank lines stay blank. Words longer than the column are hard-split so a
/// pathological token (a long URL, say) cannot overflow the page.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                if word_len <= width {
                    current.push_str(word);
                } else {
                    hard_split(word, width, &mut lines, &mut current);
                }
            } else if current.chars().count() + 1 + word_len <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                if word_len <= width {
                    current.push_str(word);
                } else {
                    hard_split(word, width, &mut lines, &mut current);
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Split an over-long word into full-width chunks; the tail becomes `current`
fn hard_split(word: &str, width: usize, lines: &mut Vec<String>, current: &mut String) {
    let chars: Vec<char> = word.chars().collect();
    let mut chunks = chars.chunks(width).peekable();
    while let Some(chunk) = chunks.next() {
        let piece: String = chunk.iter().collect();
        if chunks.peek().is_some() {
            lines.push(piece);
        } else {
            *current = piece;
        }
    }
}
