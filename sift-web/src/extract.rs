use scraper::{ElementRef, Html, Node, Selector};

/// Subtrees that never carry page content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// Elements whose boundaries separate words even without whitespace.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "article",
    "section", "main", "blockquote", "pre", "figcaption", "dt", "dd", "table", "ul", "ol",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    /// Visible text with every whitespace run collapsed to one space.
    pub text: String,
}

/// Reduce rendered HTML to its title and readable text.
pub fn extract_page(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);

    let mut buf = String::with_capacity(html.len() / 4);
    collect_text(&doc.root_element(), &mut buf);

    ExtractedPage {
        title: extract_title(&doc),
        text: collapse_whitespace(&buf),
    }
}

fn extract_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    let title: String = doc.select(&sel).next()?.text().collect();
    let title = collapse_whitespace(&title);
    (!title.is_empty()).then_some(title)
}

fn collect_text(node: &ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if tag == "title" || SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    buf.push(' ');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, buf);
                }
                if block {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
