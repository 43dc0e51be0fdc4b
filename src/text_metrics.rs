use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

static FONT_MEASURER: Lazy<Mutex<FontMeasurer>> = Lazy::new(|| Mutex::new(FontMeasurer::new()));

/// Width of `text` in the first installed font of `font_family`, or `None`
/// when no matching system font is available.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = FONT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

pub fn average_char_width(font_family: &str, font_size: f32) -> Option<f32> {
    if font_size <= 0.0 {
        return None;
    }
    let sample = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let width = measure_text_width(sample, font_size, font_family)?;
    Some(width / sample.len() as f32)
}

struct FontMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontMetrics>>,
}

/// Advance widths extracted once per family; the font bytes are not kept.
struct FontMetrics {
    units_per_em: f32,
    ascii: [u16; 128],
    other: HashMap<char, u16>,
}

impl FontMetrics {
    fn from_face(face: &Face<'_>) -> Self {
        let mut ascii = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Self {
            units_per_em: f32::from(face.units_per_em().max(1)),
            ascii,
            other: HashMap::new(),
        }
    }

    fn width(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                let advance = if ch.is_ascii() {
                    self.ascii[ch as usize]
                } else {
                    self.other.get(&ch).copied().unwrap_or(0)
                };
                if advance == 0 {
                    fallback
                } else {
                    f32::from(advance) * scale
                }
            })
            .sum()
    }
}

impl FontMeasurer {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_string();
        if !self.faces.contains_key(&key) {
            let metrics = self.load_metrics(font_family);
            if metrics.is_none() {
                tracing::debug!(font_family, "no system font found, using fallback widths");
            }
            self.faces.insert(key.clone(), metrics);
        }
        let non_ascii: Vec<char> = text.chars().filter(|ch| !ch.is_ascii()).collect();
        if !non_ascii.is_empty() {
            self.load_glyphs(&key, font_family, &non_ascii);
        }
        let metrics = self.faces.get(&key)?.as_ref()?;
        Some(metrics.width(&text.replace('\t', "    "), font_size))
    }

    fn query_face(&mut self, font_family: &str) -> Option<fontdb::ID> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "monospace" | "ui-monospace" => Family::Monospace,
                "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                    Family::SansSerif
                }
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }
        self.db.query(&Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
    }

    fn load_metrics(&mut self, font_family: &str) -> Option<FontMetrics> {
        let id = self.query_face(font_family)?;
        self.db
            .with_face_data(id, |data, index| {
                Face::parse(data, index)
                    .ok()
                    .map(|face| FontMetrics::from_face(&face))
            })
            .flatten()
    }

    fn load_glyphs(&mut self, key: &str, font_family: &str, chars: &[char]) {
        let missing: Vec<char> = match self.faces.get(key) {
            Some(Some(metrics)) => chars
                .iter()
                .copied()
                .filter(|ch| !metrics.other.contains_key(ch))
                .collect(),
            _ => return,
        };
        if missing.is_empty() {
            return;
        }
        let Some(id) = self.query_face(font_family) else {
            return;
        };
        let advances: Vec<(char, u16)> = self
            .db
            .with_face_data(id, |data, index| {
                let face = Face::parse(data, index).ok()?;
                Some(
                    missing
                        .iter()
                        .map(|ch| {
                            let advance = face
                                .glyph_index(*ch)
                                .and_then(|glyph| face.glyph_hor_advance(glyph))
                                .unwrap_or(0);
                            (*ch, advance)
                        })
                        .collect(),
                )
            })
            .flatten()
            .unwrap_or_default();
        if let Some(Some(metrics)) = self.faces.get_mut(key) {
            metrics.other.extend(advances);
        }
    }
}
