//! Metadata table fragment for the document editor.
//!
//! # Responsibility
//! - Render one table row per metadata entry with a delete action cell.
//! - Turn a cell that starts with a bare `http(s)://` URL into a link.
//!
//! # Invariants
//! - Key and value text is HTML-escaped; only generated tags are raw.
//! - The delete action writes the metaid into the scope's hidden input and
//!   submits `editor_form`.

use crate::model::document::DocId;
use crate::model::metadata::{MetaScope, MetadataEntry};
use crate::repo::doc_repo::RepoResult;
use crate::repo::meta_repo::MetadataRepository;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s<>]+").expect("valid url regex"));

const EDITOR_FORM_ID: &str = "editor_form";

/// Element ids that differ between document and corpus tables.
struct TableIds {
    hidden_input: &'static str,
    table: &'static str,
    class: Option<&'static str>,
}

fn table_ids(scope: MetaScope) -> TableIds {
    match scope {
        MetaScope::Document => TableIds {
            hidden_input: "metaid",
            table: "meta_table",
            class: None,
        },
        MetaScope::Corpus => TableIds {
            hidden_input: "corpus_metaid",
            table: "meta_table_corpus",
            class: Some("corpus_metatable"),
        },
    }
}

/// Loads the entries for `docid` in `scope` and renders them.
pub fn print_meta<R: MetadataRepository + ?Sized>(
    repo: &R,
    docid: DocId,
    scope: MetaScope,
) -> RepoResult<String> {
    let entries = repo.get_doc_meta(docid, scope)?;
    Ok(render_meta_table(&entries, scope))
}

/// Renders a metadata table fragment including its hidden delete-target input.
pub fn render_meta_table(entries: &[MetadataEntry], scope: MetaScope) -> String {
    let ids = table_ids(scope);
    let mut html = format!(
        "<input type=\"hidden\" id=\"{id}\" name=\"{id}\" value=\"\">\n<table id=\"{table}\"",
        id = ids.hidden_input,
        table = ids.table,
    );
    if let Some(class) = ids.class {
        html.push_str(&format!(" class=\"{class}\""));
    }
    html.push_str(
        ">\n  <colgroup>\n    <col>\n    <col>\n    <col style=\"width: 40px\">\n  </colgroup>\n  <tbody>",
    );

    for entry in entries {
        html.push_str("\n  <tr>");
        html.push_str(&cell(&linkify(&entry.key)));
        html.push_str(&cell(&linkify(&entry.value)));
        html.push_str(&cell(&delete_button(ids.hidden_input, entry.metaid)));
        html.push_str("\n  </tr>");
    }

    html.push_str("\n  </tbody>\n</table>\n");
    html
}

fn cell(inner: &str) -> String {
    format!("\n    <td>{inner}</td>")
}

fn delete_button(hidden_input: &str, metaid: i64) -> String {
    format!(
        "<div class=\"button slim\" onclick=\"document.getElementById('{hidden_input}').value='{metaid}'; document.getElementById('{EDITOR_FORM_ID}').submit();\"><i class=\"fa fa-trash\"></i> </div>"
    )
}

/// Escapes `text`, wrapping a leading bare URL in an anchor.
fn linkify(text: &str) -> String {
    match LEADING_URL_RE.find(text) {
        Some(url) => {
            let href = escape_html(url.as_str());
            format!(
                "<a href=\"{href}\">{href}</a>{}",
                escape_html(&text[url.end()..])
            )
        }
        None => escape_html(text),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, linkify};

    #[test]
    fn linkify_wraps_leading_url_only() {
        assert_eq!(
            linkify("https://example.org/a?b=1 rest"),
            "<a href=\"https://example.org/a?b=1\">https://example.org/a?b=1</a> rest"
        );
        assert_eq!(linkify("see http://x.org"), "see http://x.org");
    }

    #[test]
    fn linkify_stops_url_at_angle_bracket() {
        assert_eq!(
            linkify("http://x.org<b>"),
            "<a href=\"http://x.org\">http://x.org</a>&lt;b&gt;"
        );
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
