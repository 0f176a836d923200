//! End-to-end coverage of `QueryService` over a small on-disk vault:
//! frontmatter projection, body wiki-links, transitive paths across
//! notes, and incremental re-indexing via `updateFile`.

use std::fs;
use std::io::Write;
use std::path::Path;
use vault_index::{IndexerConfig, QueryService};

fn write_note(dir: &Path, name: &str, content: &str) {
    let mut file = fs::File::create(dir.join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn service_over(dir: &Path) -> QueryService {
    let mut service = QueryService::new(IndexerConfig {
        root: dir.to_path_buf(),
        ..IndexerConfig::default()
    });
    service.initialize().unwrap();
    service
}

#[test]
fn frontmatter_wikilink_and_body_wikilink_both_become_queryable_triples() {
    let dir = tempfile::tempdir().unwrap();
    write_note(
        dir.path(),
        "Meeting.md",
        "---\nkind: \"[[Event]]\"\n---\nDiscussed with [[Alice]].\n",
    );
    let service = service_over(dir.path());

    let frontmatter_hits = service.query("SELECT ?note WHERE { ?note <kind> <note://Event> }").unwrap();
    assert_eq!(frontmatter_hits.len(), 1);

    let body_hits = service
        .query("PREFIX exo: <https://vault.local/exo#> SELECT ?note WHERE { ?note exo:bodyLink <note://Alice> }")
        .unwrap();
    assert_eq!(body_hits.len(), 1);
}

#[test]
fn transitive_path_follows_links_across_several_notes() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "A.md", "---\nnext: \"[[B]]\"\n---\nbody");
    write_note(dir.path(), "B.md", "---\nnext: \"[[C]]\"\n---\nbody");
    write_note(dir.path(), "C.md", "---\n---\nbody");
    let service = service_over(dir.path());

    let reachable = service
        .query("SELECT DISTINCT ?n WHERE { <note://A> <next>* ?n }")
        .unwrap();
    let mut names: Vec<_> = reachable
        .iter()
        .map(|m| m.get_by_name("n").unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["<note://A>".to_string(), "<note://B>".to_string(), "<note://C>".to_string()]);
}

#[test]
fn update_file_reflects_edits_without_a_full_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Note.md");
    write_note(dir.path(), "Note.md", "---\nstatus: \"open\"\n---\nbody");
    let mut service = service_over(dir.path());

    let open = service.query("SELECT ?n WHERE { ?n <status> \"open\" }").unwrap();
    assert_eq!(open.len(), 1);

    write_note(dir.path(), "Note.md", "---\nstatus: \"closed\"\n---\nbody");
    service.update_file(&path).unwrap();

    let still_open = service.query("SELECT ?n WHERE { ?n <status> \"open\" }").unwrap();
    assert!(still_open.is_empty());
    let now_closed = service.query("SELECT ?n WHERE { ?n <status> \"closed\" }").unwrap();
    assert_eq!(now_closed.len(), 1);
}

#[test]
fn malformed_note_is_skipped_and_the_rest_of_the_vault_stays_queryable() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "Good.md", "---\nstatus: \"open\"\n---\nbody");
    write_note(dir.path(), "Bad.md", "---\nmeta:\n  nested: value\n---\nbody");
    let service = service_over(dir.path());

    let results = service.query("SELECT ?n WHERE { ?n <status> \"open\" }").unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn refresh_rebuilds_the_index_from_scratch() {
    let dir = tempfile::tempdir().unwrap();
    write_note(dir.path(), "A.md", "---\nstatus: \"open\"\n---\nbody");
    let mut service = service_over(dir.path());
    write_note(dir.path(), "B.md", "---\nstatus: \"open\"\n---\nbody");

    let before_refresh = service.query("SELECT ?n WHERE { ?n <status> \"open\" }").unwrap();
    assert_eq!(before_refresh.len(), 1);

    service.refresh().unwrap();
    let after_refresh = service.query("SELECT ?n WHERE { ?n <status> \"open\" }").unwrap();
    assert_eq!(after_refresh.len(), 2);
}
