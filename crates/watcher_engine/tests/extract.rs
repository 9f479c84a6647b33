use pretty_assertions::assert_eq;
use watcher_engine::{
    ExtractionError, Extractor, ExtractorSettings, ListingSelectors, RawDocument,
    SelectorExtractor,
};

const LISTING_URL: &str = "https://example.gov/presidential-actions/";

fn extractor() -> SelectorExtractor {
    SelectorExtractor::new(&ExtractorSettings::default()).expect("default selectors compile")
}

fn listing(html: &str) -> RawDocument {
    RawDocument::from_html(LISTING_URL, html)
}

#[test]
fn primary_selectors_pick_the_first_post() {
    let html = r#"
        <ul>
          <li class="wp-block-post">
            <h2 class="wp-block-post-title"><a href="https://example.gov/orders/b/">  Order B
            </a></h2>
          </li>
          <li class="wp-block-post">
            <h2 class="wp-block-post-title"><a href="https://example.gov/orders/a/">Order A</a></h2>
          </li>
        </ul>"#;

    let item = extractor().extract_listing(&listing(html)).expect("item");
    assert_eq!(item.title(), "Order B");
    assert_eq!(item.link().as_str(), "https://example.gov/orders/b/");
}

#[test]
fn relative_links_resolve_against_the_listing_url() {
    let html = r#"<li class="wp-block-post">
        <h2 class="wp-block-post-title"><a href="/orders/c/">Order C</a></h2></li>"#;

    let item = extractor().extract_listing(&listing(html)).expect("item");
    assert_eq!(item.link().as_str(), "https://example.gov/orders/c/");
}

#[test]
fn markup_change_falls_back_to_article_headings() {
    let html = r#"
        <main>
          <article><h3><a href="/orders/d/">Order D</a></h3></article>
          <article><h3><a href="/orders/old/">Older order</a></h3></article>
        </main>"#;

    let item = extractor().extract_listing(&listing(html)).expect("fallback item");
    assert_eq!(item.title(), "Order D");
    assert_eq!(item.link().as_str(), "https://example.gov/orders/d/");
}

#[test]
fn page_without_entries_reports_every_strategy() {
    let err = extractor()
        .extract_listing(&listing("<html><body><p>Maintenance</p></body></html>"))
        .expect_err("nothing to find");
    assert_eq!(
        err,
        ExtractionError::NoListingEntry {
            tried: "post-list, article, heading-link".to_string()
        }
    );
}

#[test]
fn entry_with_unusable_link_is_an_invalid_item() {
    let settings = ExtractorSettings {
        listing: vec![ListingSelectors {
            name: "custom".to_string(),
            entry: "li".to_string(),
            title: "span".to_string(),
            link: "a[href]".to_string(),
        }],
        ..ExtractorSettings::default()
    };
    let extractor = SelectorExtractor::new(&settings).expect("compiles");
    let html = r#"<li><span>Order E</span><a href="mailto:press@example.gov">mail</a></li>"#;

    let err = extractor.extract_listing(&listing(html)).expect_err("mailto is not a page");
    assert!(matches!(err, ExtractionError::InvalidItem { ref strategy, .. } if strategy == "custom"));
}

#[test]
fn body_joins_paragraphs_of_the_content_container() {
    let html = r#"
        <nav><p>Skip to content</p></nav>
        <div class="wp-block-whitehouse-post-template__content">
          <p>By the authority vested in me.</p>
          <p></p>
          <p>It is hereby   ordered.</p>
        </div>"#;

    let body = extractor()
        .extract_body(&RawDocument::from_html("https://example.gov/orders/b/", html))
        .expect("body");
    assert_eq!(body, "By the authority vested in me. It is hereby ordered.");
}

#[test]
fn short_bodies_are_kept() {
    let html = "<article><p>Signed today.</p></article>";
    let body = extractor()
        .extract_body(&RawDocument::from_html("https://example.gov/orders/b/", html))
        .expect("short body is still a body");
    assert_eq!(body, "Signed today.");
}

#[test]
fn container_without_paragraphs_uses_its_text() {
    let html = r#"<div class="wp-block-whitehouse-post-template__content">
        Section 1. Purpose.</div>"#;
    let body = extractor()
        .extract_body(&RawDocument::from_html("https://example.gov/orders/b/", html))
        .expect("body");
    assert_eq!(body, "Section 1. Purpose.");
}

#[test]
fn empty_detail_page_has_no_body() {
    let settings = ExtractorSettings {
        body_containers: vec!["div.content".to_string()],
        ..ExtractorSettings::default()
    };
    let extractor = SelectorExtractor::new(&settings).expect("compiles");
    let err = extractor
        .extract_body(&RawDocument::from_html(
            "https://example.gov/orders/b/",
            r#"<div class="content">   </div>"#,
        ))
        .expect_err("nothing there");
    assert_eq!(err, ExtractionError::EmptyBody);
}

#[test]
fn invalid_selectors_are_rejected_up_front() {
    let settings = ExtractorSettings {
        paragraph: "p[".to_string(),
        ..ExtractorSettings::default()
    };
    let err = SelectorExtractor::new(&settings).err().expect("bad selector");
    assert!(matches!(err, ExtractionError::InvalidSelector { ref selector, .. } if selector == "p["));
}
