//! Label fitting for fixed-width cells.
//!
//! Glyph widths are estimated from the font size; the host font is close to
//! monospaced at the sizes the grid uses. Text is measured in terminal-style
//! columns, so double-width glyphs count twice.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const STAR_NAME_FONT_SIZE: f32 = 12.0;
pub const GLYPH_WIDTH_RATIO: f32 = 0.55;
pub const LINE_HEIGHT_RATIO: f32 = 1.25;
pub const ELLIPSIS: char = '…';

/// Columns of narrow glyphs that fit `width`.
pub fn max_chars(width: f32, font_size: f32) -> usize {
    let glyph = (font_size * GLYPH_WIDTH_RATIO).max(f32::EPSILON);
    ((width / glyph).floor().max(1.0)) as usize
}

pub fn line_height(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_RATIO
}

/// Word-wraps `text` into at most `max_lines` lines that fit `width`,
/// trimming with an ellipsis where something was cut.
pub fn wrap_label(text: &str, width: f32, font_size: f32, max_lines: usize) -> Vec<String> {
    let limit = max_chars(width, font_size);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };

        if current.is_empty() {
            current.push_str(word);
        } else if needed <= limit {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let truncated = lines.len() > max_lines.max(1);
    lines.truncate(max_lines.max(1));

    let last = lines.len().saturating_sub(1);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| ellipsize(&line, limit, truncated && i == last))
        .collect()
}

fn ellipsize(line: &str, limit: usize, force: bool) -> String {
    let columns = line.width();
    if columns <= limit && !force {
        return line.to_string();
    }
    if force && columns < limit {
        return format!("{}{}", line, ELLIPSIS);
    }
    let budget = limit.saturating_sub(1);
    let mut used = 0;
    let mut kept = String::new();
    for glyph in line.chars() {
        let glyph_width = glyph.width().unwrap_or(0);
        if used + glyph_width > budget {
            break;
        }
        used += glyph_width;
        kept.push(glyph);
    }
    format!("{}{}", kept, ELLIPSIS)
}
