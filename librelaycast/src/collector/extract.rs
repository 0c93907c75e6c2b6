//! Post extraction from a rendered X profile page

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

const ARTICLE_SELECTOR: &str = "article";
const STATUS_LINK_SELECTOR: &str = "a[href*='/status/']";
const POST_TEXT_SELECTOR: &str = "div[data-testid='tweetText']";

/// A post found on the page, before it is timestamped
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedPost {
    pub external_id: String,
    pub text: String,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Find every post link inside an `<article>` and pair it with the
/// article's post text.
///
/// Blank texts are skipped and identical (id, text) pairs collapse to one,
/// keeping document order.
pub fn extract_posts(html: &str) -> Vec<ExtractedPost> {
    let document = Html::parse_document(html);
    let article_sel = selector(ARTICLE_SELECTOR);
    let link_sel = selector(STATUS_LINK_SELECTOR);
    let text_sel = selector(POST_TEXT_SELECTOR);

    let mut seen = HashSet::new();
    let mut posts = Vec::new();

    for article in document.select(&article_sel) {
        let text = match article.select(&text_sel).next() {
            Some(el) => element_text(&el),
            None => continue,
        };
        if text.is_empty() {
            continue;
        }

        for link in article.select(&link_sel) {
            let Some(external_id) = link.value().attr("href").and_then(status_id_from_href)
            else {
                continue;
            };

            let post = ExtractedPost {
                external_id,
                text: text.clone(),
            };
            if seen.insert(post.clone()) {
                posts.push(post);
            }
        }
    }

    posts
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Pull the numeric id following a `status` path segment.
///
/// Works for absolute and relative links and ignores trailing segments such
/// as `/analytics` or `/photo/1`.
pub fn status_id_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/');

    segments.by_ref().find(|s| *s == "status")?;
    let id = segments.next()?;

    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
