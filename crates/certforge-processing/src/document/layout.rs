//! Certificate page layout
//!
//! A flowing top-down text cursor over a fixed A4 landscape page. Placement
//! depends only on font metrics, so the layout is computed here and handed to
//! the PDF writer as a list of positioned lines.
//!
//! All coordinates are PDF points with the origin at the bottom-left corner.

use certforge_core::models::RenderDetails;

pub const PAGE_WIDTH: f32 = 841.89;
pub const PAGE_HEIGHT: f32 = 595.28;

pub const MARGIN_LEFT: f32 = 30.0;
pub const MARGIN_RIGHT: f32 = 40.0;
pub const MARGIN_TOP: f32 = 7.0;
pub const MARGIN_BOTTOM: f32 = 0.0;

/// Points per template pixel.
pub const BACKGROUND_SCALE: f32 = 0.2397;

pub const NAME_COLOR: RgbColor = RgbColor::from_hex(0xF28E24);
pub const TEXT_COLOR: RgbColor = RgbColor::from_hex(0x6F7072);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Heading,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn from_hex(hex: u32) -> Self {
        RgbColor {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    /// Left aligned; the first line of each paragraph is indented.
    Left { indent: f32 },
    /// Centred between the margins.
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: RgbColor,
    pub align: Align,
}

/// Size-scaled vertical metrics and advance widths of a font.
pub trait FontMetrics {
    /// Height above the baseline (positive).
    fn ascent(&self, size: f32) -> f32;
    /// Depth below the baseline (negative).
    fn descent(&self, size: f32) -> f32;
    fn line_gap(&self, size: f32) -> f32;
    fn text_width(&self, text: &str, size: f32) -> f32;

    fn line_height(&self, size: f32) -> f32 {
        self.ascent(size) - self.descent(size) + self.line_gap(size)
    }
}

/// One line of text at its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub face: FontFace,
    pub size: f32,
    pub color: RgbColor,
    pub x: f32,
    pub baseline: f32,
}

/// Person signing the certificate and the place printed before the date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signatory {
    pub name: String,
    pub location: String,
}

impl Signatory {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Signatory {
            name: name.into(),
            location: location.into(),
        }
    }
}

pub fn footer_text(url: &str) -> String {
    format!(
        "To verify the authenticity of this certificate, visit: {}",
        url
    )
}

/// Text flow over a single page.
pub struct PageFlow<'a> {
    heading: &'a dyn FontMetrics,
    body: &'a dyn FontMetrics,
    cursor: f32,
    lines: Vec<PlacedLine>,
}

impl<'a> PageFlow<'a> {
    pub fn new(heading: &'a dyn FontMetrics, body: &'a dyn FontMetrics) -> Self {
        PageFlow {
            heading,
            body,
            cursor: PAGE_HEIGHT - MARGIN_TOP,
            lines: Vec::new(),
        }
    }

    /// Current cursor height.
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn move_down(&mut self, amount: f32) {
        self.cursor -= amount;
    }

    /// Flow `text` at the cursor. Each `\n` starts a new paragraph; an empty
    /// text occupies no space.
    pub fn text(&mut self, text: &str, style: TextStyle) {
        if text.trim().is_empty() {
            return;
        }

        let metrics = match style.face {
            FontFace::Heading => self.heading,
            FontFace::Body => self.body,
        };
        let available = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let indent = match style.align {
            Align::Left { indent } => indent,
            Align::Center => 0.0,
        };

        for paragraph in text.lines() {
            let wrapped = wrap_paragraph(metrics, paragraph, style.size, available - indent, available);
            if wrapped.is_empty() {
                self.cursor -= metrics.line_height(style.size);
                continue;
            }

            for (i, line) in wrapped.into_iter().enumerate() {
                let x = match style.align {
                    Align::Left { indent } if i == 0 => MARGIN_LEFT + indent,
                    Align::Left { .. } => MARGIN_LEFT,
                    Align::Center => {
                        let width = metrics.text_width(&line, style.size);
                        MARGIN_LEFT + (available - width) / 2.0
                    }
                };
                self.lines.push(PlacedLine {
                    text: line,
                    face: style.face,
                    size: style.size,
                    color: style.color,
                    x,
                    baseline: self.cursor - metrics.ascent(style.size),
                });
                self.cursor -= metrics.line_height(style.size);
            }
        }
    }

    pub fn finish(self) -> Vec<PlacedLine> {
        self.lines
    }
}

/// Greedy word wrap. Words wider than a whole line are split between
/// characters.
fn wrap_paragraph(
    metrics: &dyn FontMetrics,
    paragraph: &str,
    size: f32,
    first_width: f32,
    rest_width: f32,
) -> Vec<String> {
    let limit = |lines: &Vec<String>| {
        if lines.is_empty() {
            first_width
        } else {
            rest_width
        }
    };

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if metrics.text_width(&candidate, size) <= limit(&lines) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let mut remainder = word;
        while metrics.text_width(remainder, size) > limit(&lines) {
            let split = split_point(metrics, remainder, size, limit(&lines));
            lines.push(remainder[..split].to_string());
            remainder = &remainder[split..];
        }
        current = remainder.to_string();
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Byte index of the longest prefix of `word` that fits in `max_width`,
/// never less than one character.
fn split_point(metrics: &dyn FontMetrics, word: &str, size: f32, max_width: f32) -> usize {
    let mut end = 0;
    for (idx, c) in word.char_indices() {
        let next = idx + c.len_utf8();
        if end > 0 && metrics.text_width(&word[..next], size) > max_width {
            break;
        }
        end = next;
    }
    end
}

/// Lay out the fixed certificate design.
pub fn layout_certificate(
    details: &RenderDetails,
    footer_url: &str,
    signatory: &Signatory,
    heading: &dyn FontMetrics,
    body: &dyn FontMetrics,
) -> Vec<PlacedLine> {
    let name_style = TextStyle {
        face: FontFace::Heading,
        size: 44.0,
        color: NAME_COLOR,
        align: Align::Left { indent: 55.0 },
    };
    let course_style = TextStyle {
        face: FontFace::Body,
        size: 20.0,
        color: TEXT_COLOR,
        align: Align::Left { indent: 55.0 },
    };
    let signature_style = TextStyle {
        face: FontFace::Body,
        size: 12.0,
        color: TEXT_COLOR,
        align: Align::Left { indent: 40.0 },
    };
    let footer_style = TextStyle {
        face: FontFace::Body,
        size: 8.0,
        color: TEXT_COLOR,
        align: Align::Center,
    };

    let mut flow = PageFlow::new(heading, body);

    flow.move_down(200.0);
    flow.text(&details.name, name_style);

    flow.move_down(100.0);
    flow.text(&details.course_name, course_style);
    flow.text(&details.course_desc, course_style);

    flow.move_down(55.0);
    flow.text(&signatory.name, signature_style);
    flow.text(
        &format!("{} {}", signatory.location, details.date),
        signature_style,
    );

    flow.move_down(85.0);
    flow.text(&footer_text(footer_url), footer_style);

    flow.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Monospaced metrics: every char is half an em wide.
    struct Mono;

    impl FontMetrics for Mono {
        fn ascent(&self, size: f32) -> f32 {
            0.8 * size
        }
        fn descent(&self, size: f32) -> f32 {
            -0.2 * size
        }
        fn line_gap(&self, _size: f32) -> f32 {
            0.0
        }
        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * 0.5 * size
        }
    }

    fn details() -> RenderDetails {
        RenderDetails {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            date: "2024-01-10".to_string(),
            course_name: "Systems Design".to_string(),
            course_desc: "Intro".to_string(),
            verify_url: "http://host/verify/abc123".to_string(),
        }
    }

    fn signatory() -> Signatory {
        Signatory::new("Thomas Ochman", "Göteborg")
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_fixed_design_order_and_styles() {
        let lines = layout_certificate(&details(), "http://bit.ly/x", &signatory(), &Mono, &Mono);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "Ada Lovelace",
                "Systems Design",
                "Intro",
                "Thomas Ochman",
                "Göteborg 2024-01-10",
                "To verify the authenticity of this certificate, visit: http://bit.ly/x",
            ]
        );
        assert_eq!(lines[0].face, FontFace::Heading);
        assert_eq!(lines[0].color, RgbColor { r: 0xF2, g: 0x8E, b: 0x24 });
        assert_eq!(lines[0].size, 44.0);
        assert!(lines[1..].iter().all(|l| l.face == FontFace::Body));
        assert!(lines[1..].iter().all(|l| l.color == TEXT_COLOR));
        assert_eq!(lines[3].size, 12.0);
        assert_eq!(lines[5].size, 8.0);
    }

    #[test]
    fn test_vertical_flow() {
        let lines = layout_certificate(&details(), "u", &signatory(), &Mono, &Mono);

        // top margin 7, move 200, ascent 0.8 * 44
        let mut cursor = PAGE_HEIGHT - 7.0 - 200.0;
        assert_close(lines[0].baseline, cursor - 35.2);
        cursor -= 44.0;

        cursor -= 100.0;
        assert_close(lines[1].baseline, cursor - 16.0);
        cursor -= 20.0;
        assert_close(lines[2].baseline, cursor - 16.0);
        cursor -= 20.0;

        cursor -= 55.0;
        assert_close(lines[3].baseline, cursor - 9.6);
        cursor -= 12.0;
        assert_close(lines[4].baseline, cursor - 9.6);
        cursor -= 12.0;

        cursor -= 85.0;
        assert_close(lines[5].baseline, cursor - 6.4);
    }

    #[test]
    fn test_indents_and_centering() {
        let lines = layout_certificate(&details(), "u", &signatory(), &Mono, &Mono);

        assert_close(lines[0].x, 85.0);
        assert_close(lines[1].x, 85.0);
        assert_close(lines[3].x, 70.0);

        let footer_width = Mono.text_width(&lines[5].text, 8.0);
        let available = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        assert_close(lines[5].x, MARGIN_LEFT + (available - footer_width) / 2.0);
    }

    #[test]
    fn test_long_description_wraps_with_first_line_indent_only() {
        let mut d = details();
        d.course_desc = "word ".repeat(40).trim_end().to_string();

        let lines = layout_certificate(&d, "u", &signatory(), &Mono, &Mono);
        let desc: Vec<&PlacedLine> = lines
            .iter()
            .filter(|l| l.text.starts_with("word"))
            .collect();

        assert!(desc.len() >= 2);
        assert_close(desc[0].x, 85.0);
        assert_close(desc[1].x, MARGIN_LEFT);
        let right_edge = PAGE_WIDTH - MARGIN_RIGHT;
        for line in &desc {
            assert!(line.x + Mono.text_width(&line.text, 20.0) <= right_edge + 0.01);
        }
        assert_close(desc[0].baseline - desc[1].baseline, 20.0);
    }

    #[test]
    fn test_overlong_word_is_split() {
        let word = "x".repeat(200);
        let lines = wrap_paragraph(&Mono, &word, 10.0, 100.0, 200.0);

        assert_eq!(lines[0].len(), 20);
        assert_eq!(lines[1].len(), 40);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_empty_description_takes_no_space() {
        let mut d = details();
        d.course_desc = String::new();

        let with_desc = layout_certificate(&details(), "u", &signatory(), &Mono, &Mono);
        let without = layout_certificate(&d, "u", &signatory(), &Mono, &Mono);

        assert_eq!(without.len(), with_desc.len() - 1);
        assert_close(without[2].baseline, with_desc[3].baseline + 20.0);
    }
}
