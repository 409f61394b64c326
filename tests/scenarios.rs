//! Integration tests through the public API, covering the documented
//! scenarios (S1-S6) and the well-formedness / ordering invariants.

use std::io::Cursor;

use pretty_assertions::assert_eq;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use xtokenize::{TokenizerBuilder, TokenizeError};

fn collect(path: &str, wrap: bool, xml: &str) -> Vec<String> {
    let mut cursor = TokenizerBuilder::new(path)
        .wrap(wrap)
        .build(Cursor::new(xml.as_bytes().to_vec()))
        .expect("builder should accept a valid path");
    let mut out = Vec::new();
    while cursor.has_next() {
        out.push(cursor.next().expect("has_next implies next is Some"));
    }
    out
}

/// A fragment is well-formed iff quick-xml can read it start-to-finish
/// without raising an error (invariant 3 in spec §8).
fn assert_well_formed(fragment: &str) {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("fragment {fragment:?} is not well-formed: {e}"),
        }
        buf.clear();
    }
}

#[test]
fn s1_inject_mode_two_siblings() {
    let xml = r#"<a xmlns="u"><b><c/></b><b/></a>"#;
    let got = collect("/a/b", false, xml);
    assert_eq!(got, vec!["<b xmlns=\"u\"><c/></b>".to_string(), "<b xmlns=\"u\"/>".to_string()]);
    for f in &got {
        assert_well_formed(f);
    }
}

#[test]
fn s2_wrap_mode_two_siblings() {
    let xml = r#"<a xmlns="u"><b><c/></b><b/></a>"#;
    let got = collect("/a/b", true, xml);
    assert_eq!(
        got,
        vec![
            "<a xmlns=\"u\"><b><c/></b></a>".to_string(),
            "<a xmlns=\"u\"><b/></a>".to_string(),
        ]
    );
    for f in &got {
        assert_well_formed(f);
    }
}

#[test]
fn s3_descendant_axis_matches_both_depths() {
    let xml = "<a><b><c>1</c></b><c>2</c></a>";
    let got = collect("//c", false, xml);
    assert_eq!(got, vec!["<c>1</c>".to_string(), "<c>2</c>".to_string()]);
}

#[test]
fn s4_wildcard_namespace_excludes_unmatched_sibling() {
    let xml = r#"<r xmlns:x="u" xmlns:y="v"><x:item/><y:item/><other/></r>"#;
    let got = collect("/*:item", false, xml);
    assert_eq!(
        got,
        vec!["<x:item xmlns:x=\"u\"/>".to_string(), "<y:item xmlns:y=\"v\"/>".to_string()]
    );
}

#[test]
fn s5_local_glob_matches_single_char_wildcard() {
    let xml = "<r><item>a</item><itxm>b</itxm><itssm>c</itssm></r>";
    let got = collect("/r/it?m", false, xml);
    assert_eq!(got, vec!["<item>a</item>".to_string(), "<itxm>b</itxm>".to_string()]);
}

#[test]
fn s6_inject_preserves_existing_declaration_and_skips_unneeded() {
    let xml = "<a xmlns='u'><b xmlns='v'>x</b></a>";
    let got = collect("/a/b", false, xml);
    assert_eq!(got, vec!["<b xmlns='v'>x</b>".to_string()]);
}

/// Invariant 2 (spec §8): fragments are emitted in document order.
#[test]
fn fragments_emitted_in_document_order() {
    let xml = "<r><m>1</m><x/><m>2</m><x/><m>3</m></r>";
    let got = collect("/r/m", false, xml);
    assert_eq!(got, vec!["<m>1</m>".to_string(), "<m>2</m>".to_string(), "<m>3</m>".to_string()]);
}

/// Invariant 4 (spec §8): every in-scope binding appears exactly once on
/// the matched element's own start tag, even across several ancestor levels.
#[test]
fn inject_collects_bindings_from_multiple_ancestor_levels() {
    let xml = "<a xmlns:x='u'><b xmlns:y='v'><c/></b></a>";
    let got = collect("/a/b/c", false, xml);
    assert_eq!(got.len(), 1);
    let frag = &got[0];
    assert_eq!(frag.matches("xmlns:x=\"u\"").count() + frag.matches("xmlns:x='u'").count(), 1);
    assert_eq!(frag.matches("xmlns:y=\"v\"").count() + frag.matches("xmlns:y='v'").count(), 1);
    assert_well_formed(frag);
}

/// Invariant 5 (spec §8): wrap mode produces a balanced ancestor chain
/// even three levels deep, with synthetic closes in reverse order.
#[test]
fn wrap_mode_balances_three_ancestor_levels() {
    let xml = "<a><b><c><d>x</d></c></b></a>";
    let got = collect("/a/b/c/d", true, xml);
    assert_eq!(got, vec!["<a><b><c><d>x</d></c></b></a>".to_string()]);
}

/// A selector that never matches anything yields no fragments and no error.
#[test]
fn no_match_yields_empty_sequence() {
    let xml = "<a><b/><b/></a>";
    let got = collect("/a/zzz", false, xml);
    assert!(got.is_empty());
}

/// Sibling subtrees that don't match are skipped without polluting the
/// context stacks used by later matches.
#[test]
fn skipped_siblings_do_not_affect_later_matches() {
    let xml = "<a><skip><deep><deeper/></deep></skip><b>kept</b></a>";
    let got = collect("/a/b", false, xml);
    assert_eq!(got, vec!["<b>kept</b>".to_string()]);
}

/// A malformed document surfaces through `last_error` rather than being
/// silently swallowed (spec §7's redesign of the original policy).
#[test]
fn malformed_document_surfaces_via_last_error() {
    let xml = "<a><b>";
    let mut cursor = TokenizerBuilder::new("/a/b")
        .build(Cursor::new(xml.as_bytes().to_vec()))
        .unwrap();
    while cursor.has_next() {
        cursor.next();
    }
    assert!(cursor.last_error().is_some(), "a truncated document should not end silently");
}

#[test]
fn empty_path_rejected_before_any_parsing() {
    let err = TokenizerBuilder::new("")
        .build(Cursor::new(b"<a/>".to_vec()))
        .unwrap_err();
    assert!(matches!(err, TokenizeError::EmptyPath));
}
