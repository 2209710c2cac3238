// tests/atom_fixture.rs
use status_feed_watcher::ingest::atom::parse_entries;

const FEED_XML: &str = include_str!("fixtures/status_history.atom");

#[test]
fn fixture_parses_entries_in_feed_order() {
    let entries = parse_entries(FEED_XML).expect("atom parse ok");
    assert_eq!(entries.len(), 3);

    let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "tag:status.openai.com,2005:Incident/3003",
            "tag:status.openai.com,2005:Incident/3002",
            "tag:status.openai.com,2005:Incident/3001",
        ]
    );
    assert_eq!(entries[0].updated, "2024-06-04T18:12:00Z");
    assert_eq!(entries[0].title, "Elevated error rates on Chat Completions");
    assert!(entries[0].summary.is_none());
}

#[test]
fn escaped_html_is_unescaped_once() {
    let entries = parse_entries(FEED_XML).unwrap();
    let content = entries[0].content.as_deref().unwrap();
    assert!(content.starts_with("<p><small>Jun"));
    assert!(content.contains("-&nbsp;We are investigating"));
}

#[test]
fn summary_wins_over_content_for_the_body() {
    let entries = parse_entries(FEED_XML).unwrap();
    assert_eq!(
        entries[2].body_raw(),
        "<p>Embeddings requests are   slower than usual.</p>"
    );
}

#[test]
fn feed_level_elements_do_not_leak_into_entries() {
    let entries = parse_entries(FEED_XML).unwrap();
    assert!(entries.iter().all(|e| e.title != "OpenAI Status - Incident History"));
}
