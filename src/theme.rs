use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub panel_fill: String,
    pub panel_border: String,
    pub panel_header_fill: String,
    pub panel_header_text_color: String,
    pub problem_text_color: String,
    pub solution_text_color: String,
    pub row_divider_color: String,
    pub source_fill: String,
    pub source_border: String,
    pub source_text_color: String,
    pub line_color: String,
    pub spine_width: f32,
    pub connector_width: f32,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            panel_fill: "#ECECFF".to_string(),
            panel_border: "#9370DB".to_string(),
            panel_header_fill: "#D6D6F5".to_string(),
            panel_header_text_color: "#333333".to_string(),
            problem_text_color: "#333333".to_string(),
            solution_text_color: "#2E7D32".to_string(),
            row_divider_color: "#C9C3E6".to_string(),
            source_fill: "#FFFFDE".to_string(),
            source_border: "#AAAA33".to_string(),
            source_text_color: "#333333".to_string(),
            line_color: "#333333".to_string(),
            spine_width: 3.0,
            connector_width: 1.6,
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            panel_fill: "#F8FAFF".to_string(),
            panel_border: "#C7D2E5".to_string(),
            panel_header_fill: "#EEF2F8".to_string(),
            panel_header_text_color: "#1C2430".to_string(),
            problem_text_color: "#1C2430".to_string(),
            solution_text_color: "#2F7A4E".to_string(),
            row_divider_color: "#D7E0F0".to_string(),
            source_fill: "#FFF4E5".to_string(),
            source_border: "#E0A96D".to_string(),
            source_text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            spine_width: 2.5,
            connector_width: 1.4,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "modern" => Some(Self::modern()),
            "classic" | "default" | "base" => Some(Self::classic()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Theme::from_name("Modern").map(|t| t.font_size), Some(13.0));
        assert_eq!(Theme::from_name(" default ").map(|t| t.font_size), Some(14.0));
        assert!(Theme::from_name("neon").is_none());
    }
}
