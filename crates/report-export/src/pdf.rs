//! PDF encoding of laid-out pages.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::ExportError;
use crate::layout::{PageLayout, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const FOOTER_SIZE: f32 = 8.0;

/// Encode pages into a PDF using the built-in Helvetica faces.
///
/// Every page gets a "Page n of m" footer. An empty slice still produces a
/// single blank page.
pub fn encode(title: &str, pages: &[PageLayout]) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let total = pages.len().max(1);
    let empty = PageLayout::default();
    let pages: Vec<&PageLayout> = if pages.is_empty() {
        vec![&empty]
    } else {
        pages.iter().collect()
    };

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            let font = if line.bold { &bold } else { &regular };
            layer.use_text(line.text.clone(), line.size, Mm(line.x_mm), Mm(line.y_mm), font);
        }

        layer.use_text(
            format!("Page {} of {}", index + 1, total),
            FOOTER_SIZE,
            Mm(PAGE_WIDTH_MM - MARGIN_MM - 25.0),
            Mm(MARGIN_MM / 2.0),
            &regular,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}
