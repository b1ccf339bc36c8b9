//! A fixed header row over a matrix of string cells.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ImpactTable {
    pub fn new<H: Into<String>>(
        headers: impl IntoIterator<Item = H>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    /// Render as an HTML `<table>`, rows in input order, every cell escaped.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table class=\"impact-table\">\n<thead><tr>");
        for header in &self.headers {
            html.push_str("<th>");
            html.push_str(&escape_html(header));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(&escape_html(cell));
                html.push_str("</td>");
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }
}

/// Plain-text rendering with tab-separated columns.
impl fmt::Display for ImpactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headers.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
