//! Download file names.

/// Turn a report title into a safe file name with the given extension.
///
/// Anything other than ASCII letters and digits becomes `_`, runs collapse,
/// and the result is lowercased. An empty result falls back to `report`.
pub fn sanitize_filename(title: &str, extension: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "report" } else { stem };

    // Keep names well under common filesystem limits
    let stem: String = stem.chars().take(120).collect();
    format!("{}.{}", stem, extension.trim_start_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_unsafe_characters() {
        assert_eq!(
            sanitize_filename("Ada's Natal Chart: 1990/05/01", "pdf"),
            "ada_s_natal_chart_1990_05_01.pdf"
        );
    }

    #[test]
    fn test_path_traversal_neutralised() {
        assert_eq!(sanitize_filename("../../etc/passwd", ".html"), "etc_passwd.html");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(sanitize_filename("☉☽", "pdf"), "report.pdf");
    }
}
