//! Markdown to paged text layout.
//!
//! The primary renderer parses the report body into blocks, wraps each block
//! to the printable width and places lines top-down on A4 pages, starting a
//! new page whenever the next line would cross the bottom margin. Positions
//! are in millimetres from the bottom-left corner, as PDF expects.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// A4 portrait.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width relative to the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;

/// One line of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    /// Font size in points.
    pub size: f32,
    pub bold: bool,
    pub x_mm: f32,
    pub y_mm: f32,
}

/// Lines placed on one page, top to bottom.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub lines: Vec<LayoutLine>,
}

impl PageLayout {
    /// Page text, one line per row.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A structural piece of the report body.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem(String),
    Rule,
}

impl Block {
    fn text(&self) -> Option<&str> {
        match self {
            Block::Heading { text, .. } | Block::Paragraph(text) | Block::ListItem(text) => {
                Some(text)
            }
            Block::Rule => None,
        }
    }
}

/// Parse markdown into flat blocks. Inline emphasis is dropped; raw HTML is ignored.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut buffer = String::new();
    let mut heading: Option<u8> = None;
    let mut item_depth = 0usize;

    let flush_item = |buffer: &mut String, blocks: &mut Vec<Block>| {
        let text = buffer.trim().to_string();
        if !text.is_empty() {
            blocks.push(Block::ListItem(text));
        }
        buffer.clear();
    };

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                buffer.clear();
                heading = Some(heading_level(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                let text = buffer.trim().to_string();
                if !text.is_empty() {
                    blocks.push(Block::Heading {
                        level: heading.unwrap_or(1),
                        text,
                    });
                }
                heading = None;
                buffer.clear();
            }
            Event::Start(Tag::Paragraph) if item_depth == 0 => buffer.clear(),
            Event::End(TagEnd::Paragraph) if item_depth == 0 => {
                let text = buffer.trim().to_string();
                if !text.is_empty() {
                    blocks.push(Block::Paragraph(text));
                }
                buffer.clear();
            }
            Event::End(TagEnd::Paragraph) => buffer.push(' '),
            Event::Start(Tag::Item) => {
                if item_depth > 0 {
                    flush_item(&mut buffer, &mut blocks);
                }
                item_depth += 1;
            }
            Event::End(TagEnd::Item) => {
                flush_item(&mut buffer, &mut blocks);
                item_depth = item_depth.saturating_sub(1);
            }
            Event::Text(text) | Event::Code(text) => buffer.push_str(&text),
            Event::SoftBreak | Event::HardBreak => buffer.push(' '),
            Event::Rule => blocks.push(Block::Rule),
            _ => {}
        }
    }

    blocks
}

/// Markdown reduced to plain text lines (headings and paragraphs separated by blank lines).
pub fn plain_text(markdown: &str) -> String {
    let mut out = Vec::new();
    for block in parse_blocks(markdown) {
        match block {
            Block::ListItem(text) => out.push(format!("- {}", text)),
            Block::Rule => out.push(String::new()),
            other => {
                if let Some(text) = other.text() {
                    out.push(text.to_string());
                }
                out.push(String::new());
            }
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Characters that fit on one line at `size` points.
pub fn chars_per_line(size: f32) -> usize {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    (usable / (size * PT_TO_MM * AVG_GLYPH_WIDTH)).floor().max(1.0) as usize
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Places lines on pages, breaking by remaining height.
struct Cursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn space(&mut self, mm: f32) {
        // Spacing never starts a page on its own
        self.y -= mm;
    }

    fn line(&mut self, text: String, size: f32, bold: bool, indent_mm: f32) {
        let height = line_height(size);
        if self.y - height < MARGIN_MM {
            self.pages.push(PageLayout::default());
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.y -= height;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(LayoutLine {
                text,
                size,
                bold,
                x_mm: MARGIN_MM + indent_mm,
                y_mm: self.y,
            });
        }
    }

    fn block(&mut self, text: &str, size: f32, bold: bool, indent_mm: f32) {
        let indent_chars = (indent_mm / (size * PT_TO_MM * AVG_GLYPH_WIDTH)) as usize;
        let width = chars_per_line(size).saturating_sub(indent_chars);
        for line in wrap(text, width) {
            self.line(line, size, bold, indent_mm);
        }
    }
}

/// Lay out a titled markdown body on A4 pages.
pub fn layout(title: &str, subtitle: &str, markdown: &str, body_size: f32) -> Vec<PageLayout> {
    let mut cursor = Cursor::new();

    cursor.block(title, 20.0, true, 0.0);
    if !subtitle.is_empty() {
        cursor.space(1.0);
        cursor.block(subtitle, body_size - 1.0, false, 0.0);
    }
    cursor.space(6.0);

    for block in parse_blocks(markdown) {
        match block {
            Block::Heading { level, text } => {
                // The document title already occupies the top of page one
                if level == 1 && text == title {
                    continue;
                }
                let size = match level {
                    1 => 16.0,
                    2 => 14.0,
                    _ => 12.0,
                };
                cursor.space(4.0);
                cursor.block(&text, size, true, 0.0);
                cursor.space(1.5);
            }
            Block::Paragraph(text) => {
                cursor.block(&text, body_size, false, 0.0);
                cursor.space(2.5);
            }
            Block::ListItem(text) => {
                cursor.block(&format!("- {}", text), body_size, false, 4.0);
                cursor.space(1.0);
            }
            Block::Rule => cursor.space(5.0),
        }
    }

    cursor.pages
}

/// Paginate pre-wrapped lines at a fixed count per page (fallback path).
pub fn fixed_pages(lines: &[String], lines_per_page: usize, size: f32) -> Vec<PageLayout> {
    let per_page = lines_per_page.max(1);
    let step = (PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / per_page as f32;

    let mut pages: Vec<PageLayout> = lines
        .chunks(per_page)
        .map(|chunk| PageLayout {
            lines: chunk
                .iter()
                .enumerate()
                .map(|(i, text)| LayoutLine {
                    text: text.clone(),
                    size,
                    bold: false,
                    x_mm: MARGIN_MM,
                    y_mm: PAGE_HEIGHT_MM - MARGIN_MM - step * (i as f32 + 1.0),
                })
                .collect(),
        })
        .collect();

    if pages.is_empty() {
        pages.push(PageLayout::default());
    }
    pages
}
