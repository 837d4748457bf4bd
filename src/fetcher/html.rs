use scraper::{Html, Selector};
use std::sync::LazyLock;

static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));

/// Text of every `<p>` element in document order, one paragraph per line.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);

    document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
