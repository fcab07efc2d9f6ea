//! PDF renderers.
//!
//! [`LayoutRenderer`] is the primary path: it lays out the markdown body with
//! headings, paragraphs and lists. [`PlainTextRenderer`] is the fallback: the
//! title on the first line, then the body as wrapped plain text at a fixed
//! number of lines per page. It only fails if PDF encoding itself fails.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ExportConfig;
use crate::document::ReportDocument;
use crate::error::ExportError;
use crate::layout::{self, PageLayout};
use crate::pdf;

/// A rendered PDF with the layout it was drawn from.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageLayout>,
    /// Name of the renderer that produced it.
    pub renderer: &'static str,
}

impl RenderedPdf {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Something that can turn a report document into PDF bytes.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, doc: &ReportDocument) -> Result<RenderedPdf, ExportError>;

    /// Short name for logs and artifacts.
    fn name(&self) -> &'static str;
}

/// Primary renderer: structured layout with Helvetica faces.
#[derive(Debug, Clone)]
pub struct LayoutRenderer {
    body_size: f32,
}

impl LayoutRenderer {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            body_size: config.body_font_size,
        }
    }

    /// Lay out the document without encoding it.
    pub fn layout(&self, doc: &ReportDocument) -> Result<Vec<PageLayout>, ExportError> {
        let title = transliterate(&doc.title)?;
        let subtitle = transliterate(&doc.subtitle())?;
        let content = transliterate(&doc.content)?;
        Ok(layout::layout(&title, &subtitle, &content, self.body_size))
    }
}

impl Default for LayoutRenderer {
    fn default() -> Self {
        Self::new(&ExportConfig::default())
    }
}

#[async_trait]
impl Renderer for LayoutRenderer {
    async fn render(&self, doc: &ReportDocument) -> Result<RenderedPdf, ExportError> {
        let renderer = self.clone();
        let doc = doc.clone();

        // Layout and encoding are CPU-bound
        tokio::task::spawn_blocking(move || {
            let pages = renderer.layout(&doc)?;
            debug!(pages = pages.len(), "Laid out report");
            let bytes = pdf::encode(&doc.title, &pages)?;
            Ok(RenderedPdf {
                bytes,
                pages,
                renderer: "layout",
            })
        })
        .await
        .map_err(|e| ExportError::Render(format!("render task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "layout"
    }
}

/// Fallback renderer: fixed lines per page, no styling.
#[derive(Debug, Clone)]
pub struct PlainTextRenderer {
    lines_per_page: usize,
    wrap_width: usize,
}

impl PlainTextRenderer {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            lines_per_page: config.fallback_lines_per_page,
            wrap_width: config.fallback_wrap_width,
        }
    }

    /// Title, blank line, subtitle, blank line, then the wrapped body.
    pub fn layout(&self, doc: &ReportDocument) -> Vec<PageLayout> {
        let mut lines = vec![to_latin1_lossy(&doc.title), String::new()];
        lines.push(to_latin1_lossy(&doc.subtitle()));
        lines.push(String::new());

        for row in layout::plain_text(&doc.content).lines() {
            let row = to_latin1_lossy(row);
            if row.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.extend(layout::wrap(&row, self.wrap_width));
            }
        }

        layout::fixed_pages(&lines, self.lines_per_page, 10.0)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new(&ExportConfig::default())
    }
}

#[async_trait]
impl Renderer for PlainTextRenderer {
    async fn render(&self, doc: &ReportDocument) -> Result<RenderedPdf, ExportError> {
        let pages = self.layout(doc);
        let bytes = pdf::encode(&to_latin1_lossy(&doc.title), &pages)?;
        Ok(RenderedPdf {
            bytes,
            pages,
            renderer: "plain-text",
        })
    }

    fn name(&self) -> &'static str {
        "plain-text"
    }
}

/// Replacement text for symbols the built-in fonts cannot draw.
fn glyph_name(c: char) -> Option<&'static str> {
    let name = match c {
        '☉' => "Sun",
        '☽' | '☾' => "Moon",
        '☿' => "Mercury",
        '♀' => "Venus",
        '♂' => "Mars",
        '♃' => "Jupiter",
        '♄' => "Saturn",
        '♅' => "Uranus",
        '♆' => "Neptune",
        '♇' => "Pluto",
        '♈' => "Aries",
        '♉' => "Taurus",
        '♊' => "Gemini",
        '♋' => "Cancer",
        '♌' => "Leo",
        '♍' => "Virgo",
        '♎' => "Libra",
        '♏' => "Scorpio",
        '♐' => "Sagittarius",
        '♑' => "Capricorn",
        '♒' => "Aquarius",
        '♓' => "Pisces",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        '\u{2013}' | '\u{2014}' | '\u{2022}' => "-",
        '\u{2026}' => "...",
        '\u{FE0F}' => "",
        _ => return None,
    };
    Some(name)
}

/// Map text into the Latin-1 range, failing on anything unmappable.
fn transliterate(text: &str) -> Result<String, ExportError> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) <= 0xFF {
            out.push(c);
        } else if let Some(name) = glyph_name(c) {
            out.push_str(name);
        } else {
            return Err(ExportError::Render(format!(
                "unsupported character {:?} (U+{:04X})",
                c, c as u32
            )));
        }
    }
    Ok(out)
}

/// Like [`transliterate`] but substitutes `?` instead of failing.
fn to_latin1_lossy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (c as u32) <= 0xFF {
            out.push(c);
        } else if let Some(name) = glyph_name(c) {
            out.push_str(name);
        } else {
            out.push('?');
        }
    }
    out
}
