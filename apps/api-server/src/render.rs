//! HTML for the creation page and the 404 body.

use std::fmt::Write;

use domain::{LinkRecord, LinkSet};
use http_common::{build_short_url, escape_html};

pub const NOT_FOUND_BODY: &str = "<h2>404 - Short link not found</h2><p><a href='/'>Back</a></p>";

pub const INTERNAL_ERROR_BODY: &str = "<h2>500 - Internal server error</h2><p><a href='/'>Back</a></p>";

/// Message shown above the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback<'a> {
    Info(&'a str),
    Error(&'a str),
}

pub struct Page<'a> {
    /// Base URL short links hang off; empty renders relative links.
    pub base: &'a str,
    pub feedback: Option<Feedback<'a>>,
    pub created: Option<&'a LinkRecord>,
    pub links: &'a LinkSet,
}

impl Page<'_> {
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(2048 + self.links.len() * 256);
        html.push_str(
            "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>URL Shortener</title>\n\
             <link href=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css\" rel=\"stylesheet\">\n\
             <style>body{background:#f5f6fa}</style>\n</head>\n<body class=\"p-4\">\n<div class=\"container\">\n\
             <h1 class=\"mb-3\">URL Shortener</h1>\n",
        );

        match self.feedback {
            Some(Feedback::Info(msg)) => {
                let _ = writeln!(html, "<div class=\"alert alert-info\">{}</div>", escape_html(msg));
            }
            Some(Feedback::Error(msg)) => {
                let _ = writeln!(html, "<div class=\"alert alert-danger\">{}</div>", escape_html(msg));
            }
            None => {}
        }

        let _ = write!(
            html,
            "<div class=\"card mb-4\"><div class=\"card-body\">\n\
             <form method=\"post\" class=\"row g-2\">\n\
             <div class=\"col-md-9\"><input name=\"longurl\" class=\"form-control\" placeholder=\"Enter a long URL\" required></div>\n\
             <div class=\"col-md-3 d-grid\"><button class=\"btn btn-primary\">Create</button></div>\n\
             </form>\n\
             <small class=\"text-muted\">Links look like <code>{}</code></small>\n\
             </div></div>\n",
            escape_html(&build_short_url(self.base, "code"))
        );

        if let Some(record) = self.created {
            let short = escape_html(&build_short_url(self.base, record.short_code.as_str()));
            let _ = writeln!(
                html,
                "<div class=\"alert alert-success\">Short URL: <a target=\"_blank\" href=\"{0}\">{0}</a></div>",
                short
            );
        }

        html.push_str("<div class=\"card\"><div class=\"card-body\">\n<h5>Saved Links</h5>\n");
        if self.links.is_empty() {
            html.push_str("<p class=\"text-muted\">No links yet.</p>\n");
        } else {
            html.push_str(
                "<table class=\"table table-sm\">\n\
                 <thead><tr><th>Short</th><th>Original</th><th>Created</th><th>Visits</th></tr></thead>\n<tbody>\n",
            );
            // Newest first
            let records: Vec<_> = self.links.iter().collect();
            for record in records.into_iter().rev() {
                self.row(&mut html, record);
            }
            html.push_str("</tbody>\n</table>\n");
        }
        html.push_str("</div></div>\n</div>\n</body>\n</html>\n");
        html
    }

    fn row(&self, html: &mut String, record: &LinkRecord) {
        let code = record.short_code.as_str();
        let url = escape_html(&record.original_url);
        let created = record
            .created_at
            .map(json_store::format_created_at)
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<tr><td><a target=\"_blank\" href=\"{}\">{}</a></td>\
             <td><a target=\"_blank\" href=\"{url}\">{url}</a></td>\
             <td>{}</td><td>{}</td></tr>",
            escape_html(&build_short_url(self.base, code)),
            escape_html(code),
            escape_html(&created),
            record.visit_count,
        );
    }
}
