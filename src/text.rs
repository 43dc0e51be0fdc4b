use crate::text_metrics;

/// Wrapped text with its measured extent.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub font_family: &'a str,
    pub font_size: f32,
    pub line_height: f32,
    /// Use the built-in width table instead of system fonts.
    pub fast_metrics: bool,
}

/// Wraps `text` to at most `max_width` pixels per line and measures it.
pub fn measure_text(text: &str, max_width: f32, style: TextStyle<'_>) -> TextBlock {
    let mut lines: Vec<String> = split_lines(text)
        .into_iter()
        .flat_map(|line| wrap_line(&line, max_width, style))
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| text_width(line, style))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * style.font_size * style.line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

pub fn text_width(text: &str, style: TextStyle<'_>) -> f32 {
    if style.fast_metrics {
        return fallback_text_width(text, style.font_size);
    }
    text_metrics::measure_text_width(text, style.font_size, style.font_family)
        .unwrap_or_else(|| fallback_text_width(text, style.font_size))
}

pub fn average_char_width(style: TextStyle<'_>) -> f32 {
    let fallback = style.font_size * 0.56;
    if style.fast_metrics {
        return fallback;
    }
    text_metrics::average_char_width(style.font_family, style.font_size).unwrap_or(fallback)
}

fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

fn wrap_line(line: &str, max_width: f32, style: TextStyle<'_>) -> Vec<String> {
    if text_width(line, style) <= max_width {
        return vec![line.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, style) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Rough em widths for a proportional sans-serif face.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.31,
        'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.26,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '-' => 0.35,
        'm' | 'w' => 0.84,
        'M' | 'W' | '@' | '%' => 0.92,
        'A'..='Z' => 0.66,
        'a'..='z' | '0'..='9' => 0.56,
        c if c.is_ascii() => 0.55,
        c if is_wide(c) => 1.0,
        _ => 0.6,
    }
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFF00..=0xFF60)
}
