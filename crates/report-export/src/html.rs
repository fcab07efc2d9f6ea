//! HTML export.

use std::path::{Path, PathBuf};

use askama::Template;
use pulldown_cmark::{html, Event, Options, Parser};

use crate::document::ReportDocument;
use crate::error::ExportError;
use crate::filename::sanitize_filename;

/// Standalone printable document.
#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    title: &'a str,
    subtitle: &'a str,
    generated_at: String,
    body: &'a str,
}

/// Body only, for embedding in another page.
#[derive(Template)]
#[template(path = "report_fragment.html")]
struct ReportFragment<'a> {
    title: &'a str,
    subtitle: &'a str,
    body: &'a str,
}

/// An HTML file ready to be downloaded or written out.
#[derive(Debug, Clone)]
pub struct HtmlArtifact {
    pub filename: String,
    pub html: String,
}

impl HtmlArtifact {
    /// Write the file into `dir`, creating it if needed.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, self.html.as_bytes()).await?;
        Ok(path)
    }
}

/// Markdown to HTML. Raw HTML in the source is escaped, not passed through.
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render a full HTML document.
pub fn render_html(doc: &ReportDocument) -> Result<String, ExportError> {
    let body = markdown_to_html(&doc.content);
    let subtitle = doc.subtitle();
    let page = ReportPage {
        title: &doc.title,
        subtitle: &subtitle,
        generated_at: doc.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        body: &body,
    };
    Ok(page.render()?)
}

/// Render the report as an embeddable `<article>`.
pub fn render_html_fragment(doc: &ReportDocument) -> Result<String, ExportError> {
    let body = markdown_to_html(&doc.content);
    let subtitle = doc.subtitle();
    let fragment = ReportFragment {
        title: &doc.title,
        subtitle: &subtitle,
        body: &body,
    };
    Ok(fragment.render()?)
}

/// Render a full document with its download file name.
pub fn export_html(doc: &ReportDocument) -> Result<HtmlArtifact, ExportError> {
    Ok(HtmlArtifact {
        filename: sanitize_filename(&doc.title, "html"),
        html: render_html(doc)?,
    })
}
