//! Standalone document assembly and export file naming.
//!
//! Wraps transformed HTML into a complete page that pulls in KaTeX (inline
//! `\( \)` and display `\[ \]` delimiters) and TikZJax (scans for
//! `<script type="text/tikz">`), and derives filesystem-safe names for the
//! plain-text export.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use ogetheory_markup::html;
use ogetheory_shared::{BucketKey, OgeTheoryError, Result};

/// Maximum length, in characters, of a derived filename stem.
pub const MAX_FILENAME_CHARS: usize = 80;

const STYLE_SHEET: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    padding: 20px 28px 40px;
    color: #1c1c2e;
    line-height: 1.7;
    font-size: 15px;
}
h1 { font-size:1.5em;  color:#1a237e; margin:22px 0 10px }
h2 { font-size:1.3em;  color:#283593; margin:18px 0 8px  }
h3 { font-size:1.15em; color:#303f9f; margin:14px 0 6px  }
h4 { font-size:1.05em; color:#3949ab; margin:12px 0 4px  }
p  { margin: 6px 0 9px }
ul, ol { padding-left:22px; margin:6px 0 9px }
li { margin:3px 0 }
mark { border-radius:3px; padding:1px 5px }

.warning-block {
    border-left:4px solid #f59e0b; background:#fffbeb;
    padding:14px 18px; border-radius:0 8px 8px 0; margin:16px 0;
}
.cblock { margin:14px 0; padding:12px 18px; border-radius:0 6px 6px 0; }
.cblock.bid-14 { background:#eff6ff; border-left:3px solid #3b82f6; }
.cblock.bid-15 { background:none; border-left:none; padding-left:0; }
.cblock.bid-17 { background:#f0fdf4; border-left:3px solid #22c55e; }
.cblock.bid-18 { background:#fdf4ff; border-left:3px solid #a855f7; }
.cblock.bid-19 { background:none; border-left:none; padding-left:0; }
.cblock.bid-20 { background:#ecfeff; border-left:3px solid #06b6d4; }
.cblock.bid-x  { background:none; border-left:none; padding-left:0; }

.text-block { margin:10px 0 }
.step-divider { border:none; border-top:2px dashed #cbd5e1; margin:26px 0 }

.tikz-wrap { text-align:center; margin:20px 0; min-height:40px }
.tikz-wrap svg { max-width:100%; height:auto }

.katex-display { overflow-x:auto; padding:6px 0 }
.math-inline   { display:inline }
"#;

const HEAD_OPEN: &str = "<!DOCTYPE html>\n<html lang=\"ru\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>";

const HEAD_ASSETS: &str = r#"</title>

  <!-- KaTeX -->
  <link rel="stylesheet"
        href="https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.css"
        crossorigin="anonymous">
  <script defer
          src="https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.js"
          crossorigin="anonymous"></script>
  <script defer
          src="https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/contrib/auto-render.min.js"
          crossorigin="anonymous"
          onload="renderMathInElement(document.body, {
              delimiters: [
                {left: '\\(', right: '\\)', display: false},
                {left: '\\[', right: '\\]', display: true}
              ],
              throwOnError: false
          });"></script>

  <!-- TikZJax -->
  <link rel="stylesheet" href="https://tikzjax.com/v1/fonts.css">
  <script src="https://tikzjax.com/v1/tikzjax.js"></script>

  <style>"#;

const HEAD_CLOSE: &str = "</style>\n</head>\n<body>\n";

const DOC_CLOSE: &str = "\n</body>\n</html>\n";

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Wrap an already-transformed HTML body into a standalone document.
pub fn render_document(body_html: &str, title: &str) -> String {
    let mut doc = String::with_capacity(
        HEAD_OPEN.len() + HEAD_ASSETS.len() + STYLE_SHEET.len() + body_html.len() + 256,
    );
    doc.push_str(HEAD_OPEN);
    push_escaped_title(title, &mut doc);
    doc.push_str(HEAD_ASSETS);
    doc.push_str(STYLE_SHEET);
    doc.push_str(HEAD_CLOSE);
    doc.push_str(body_html);
    doc.push_str(DOC_CLOSE);
    doc
}

/// Transform an item's markup and wrap it into a standalone document.
#[instrument(skip(markup), fields(input_len = markup.len()))]
pub fn make_full_html(markup: &str, title: &str) -> String {
    let body = html::transform(markup);
    let doc = render_document(&body, title);
    debug!(doc_len = doc.len(), "document assembled");
    doc
}

fn push_escaped_title(title: &str, out: &mut String) {
    for c in title.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Strip characters illegal in filenames, fold newlines to spaces, trim, and
/// cap the result at [`MAX_FILENAME_CHARS`] characters.
pub fn safe_filename(title: &str) -> String {
    static ILLEGAL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"));

    let cleaned = ILLEGAL_RE.replace_all(title, "").replace('\n', " ");
    cleaned.trim().chars().take(MAX_FILENAME_CHARS).collect()
}

/// Export filename for an item: `Задание_{N}_{title}.txt`.
pub fn export_filename(key: BucketKey, title: &str) -> String {
    format!("Задание_{}_{}.txt", key.file_token(), safe_filename(title))
}

/// Write an export into `dir`, creating it if needed. Returns the file path.
pub fn write_export(dir: &Path, filename: &str, text: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| OgeTheoryError::io(dir, e))?;

    let path = dir.join(filename);
    std::fs::write(&path, text).map_err(|e| OgeTheoryError::io(&path, e))?;

    debug!(path = %path.display(), size = text.len(), "wrote export");
    Ok(path)
}
