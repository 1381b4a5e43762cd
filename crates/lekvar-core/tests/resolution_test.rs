//! Integration tests for reading and resolving documents through the public API

use lekvar_core::{Lekvar, LekvarError, ParserSettings};
use std::io::Write;

fn read(source: &str) -> Lekvar {
    let mut doc = Lekvar::new();
    doc.read_str(source, "test.lkv").unwrap();
    doc
}

fn read_err(source: &str) -> LekvarError {
    let mut doc = Lekvar::new();
    doc.read_str(source, "test.lkv").unwrap_err()
}

#[test]
fn test_dot_parent_and_explicit_parent_both_contribute() {
    let doc = read(
        r#"
[a]
x = 1
[a.b]
y = 2
[a.b.c : a]
"#,
    );

    let options = doc.options("a.b.c").unwrap();
    assert!(options.contains(&"x"));
    assert!(options.contains(&"y"));
    assert_eq!(doc.get("a.b.c", "x").unwrap(), Some("1"));
    assert_eq!(doc.get("a.b.c", "y").unwrap(), Some("2"));
}

#[test]
fn test_closer_definitions_win() {
    let doc = read(
        r#"
[p1]
k = from-p1
shared = p1
[p2]
k = from-p2
[a]
k = from-dot-parent
only_dot = yes
[a.c : p2, p1]
[a.d : p1]
k = local
"#,
    );

    assert_eq!(doc.get("a.c", "k").unwrap(), Some("from-p2"));
    assert_eq!(doc.get("a.c", "shared").unwrap(), Some("p1"));
    assert_eq!(doc.get("a.c", "only_dot").unwrap(), Some("yes"));
    assert_eq!(doc.get("a.d", "k").unwrap(), Some("local"));
}

#[test]
fn test_default_section_is_inherited_everywhere() {
    let doc = read(
        r#"
[DEFAULT]
timeout = 30
[server]
[server.http.tls]
"#,
    );

    assert_eq!(doc.get("server", "timeout").unwrap(), Some("30"));
    assert_eq!(doc.get("server.http.tls", "timeout").unwrap(), Some("30"));
    assert_eq!(doc.get("DEFAULT", "timeout").unwrap(), Some("30"));
}

#[test]
fn test_default_values_travel_with_explicit_parents() {
    let doc = read(
        r#"
[DEFAULT]
x = 0
[a]
x = 1
[p]
[a.b : p]
"#,
    );

    assert_eq!(doc.get("a", "x").unwrap(), Some("1"));
    assert_eq!(doc.get("p", "x").unwrap(), Some("0"));
    // `p` already exposes the default value, and explicit parents outrank the dot-parent
    assert_eq!(doc.get("a.b", "x").unwrap(), Some("0"));
}

#[test]
fn test_rename() {
    let doc = read(
        r#"
[base]
old = value
[child : base]
RENAME old TO new
"#,
    );

    assert!(!doc.has_option("child", "old").unwrap());
    assert!(doc.has_option("child", "new").unwrap());
    assert_eq!(doc.get("child", "new").unwrap(), Some("value"));
    assert!(doc.has_option("base", "old").unwrap());
}

#[test]
fn test_avoid_hides_inherited_option() {
    let doc = read(
        r#"
[parent]
secret = s3cr3t
public = ok
[parent.child]
AVOID secret
"#,
    );

    assert!(!doc.has_option("parent.child", "secret").unwrap());
    assert!(doc.has_option("parent.child", "public").unwrap());
    assert!(doc.has_option("parent", "secret").unwrap());
}

#[test]
fn test_avoid_only_affects_its_own_section() {
    let doc = read(
        r#"
[DEFAULT]
secret = s
[a]
AVOID secret
[a.b]
"#,
    );

    assert!(!doc.has_option("a", "secret").unwrap());
    assert!(doc.has_option("a.b", "secret").unwrap());
}

#[test]
fn test_only_filter() {
    let doc = read(
        r#"
[base]
a = 1
b = 2
c = 3
[base.narrow]
d = 4
ONLY a, d, missing
"#,
    );

    assert_eq!(doc.options("base.narrow").unwrap(), vec!["d", "a"]);
}

#[test]
fn test_directives_apply_rename_then_avoid_then_only() {
    let doc = read(
        r#"
[s]
a = 1
b = 2
c = 3
RENAME a TO z
AVOID b
ONLY z, b
"#,
    );

    assert_eq!(doc.options("s").unwrap(), vec!["z"]);
    assert_eq!(doc.get("s", "z").unwrap(), Some("1"));
}

#[test]
fn test_relocation() {
    let doc = read(
        r#"
[s]
x > sub = 5
"#,
    );

    assert!(doc.has_section("s.sub"));
    assert_eq!(doc.get("s.sub", "x").unwrap(), Some("5"));
    assert!(!doc.has_option("s", "x").unwrap());
}

#[test]
fn test_multiline_value() {
    let doc = read("[S]\nkey =\n    line1\n    line2\nnext = 1\n");
    assert_eq!(doc.get("S", "key").unwrap(), Some("line1\nline2"));
    assert_eq!(doc.get("S", "next").unwrap(), Some("1"));
}

#[test]
fn test_multiline_value_keeps_inner_blank_lines() {
    let doc = read("[S]\nkey = first\n    second\n\n    # not part of it\n    third\n\n");
    assert_eq!(doc.get("S", "key").unwrap(), Some("first\nsecond\n\nthird"));
}

#[test]
fn test_include() {
    let doc = read(
        r#"
[database]
port = 5432
[app]
INCLUDE database.port AS db_port
INCLUDE database.port
"#,
    );

    assert_eq!(doc.get("app", "db_port").unwrap(), Some("5432"));
    assert_eq!(doc.get("app", "port").unwrap(), Some("5432"));
}

#[test]
fn test_include_of_missing_option() {
    let err = read_err("[app]\nINCLUDE nowhere.port\n");
    assert!(matches!(err, LekvarError::UnresolvedInclude { .. }));
}

#[test]
fn test_include_does_not_take_part_in_cycle_detection() {
    let doc = read(
        r#"
[a]
x = 1
INCLUDE b.y
[b]
y = 2
INCLUDE a.x
"#,
    );

    assert_eq!(doc.get("a", "y").unwrap(), Some("2"));
    assert_eq!(doc.get("b", "x").unwrap(), Some("1"));
}

#[test]
fn test_cyclic_inheritance() {
    let mut doc = Lekvar::new();
    let err = doc.read_str("[a : b]\n[b : a]\n", "cycle.lkv").unwrap_err();

    match err {
        LekvarError::CyclicInheritance { cycle } => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert!(!doc.is_resolved());
    assert!(matches!(doc.options("a"), Err(LekvarError::NotResolved)));
}

#[test]
fn test_default_section_cannot_inherit() {
    let err = read_err("[DEFAULT: foo]\n");
    assert!(matches!(err, LekvarError::SectionInheritance { .. }));
}

#[test]
fn test_duplicates_in_strict_mode() {
    assert!(matches!(
        read_err("[a]\n[a]\n"),
        LekvarError::DuplicateSection { .. }
    ));
    assert!(matches!(
        read_err("[a]\nk = 1\nk = 2\n"),
        LekvarError::DuplicateOption { .. }
    ));
}

#[test]
fn test_implicit_section_can_be_declared_later() {
    let doc = read(
        r#"
[a.b]
y = 2
[a]
x = 1
"#,
    );
    assert_eq!(doc.get("a.b", "x").unwrap(), Some("1"));
}

#[test]
fn test_resolution_is_idempotent() {
    let mut doc = read(
        r#"
[DEFAULT]
d = 0
[a]
x = 1
RENAME d TO dd
[a.b : c]
[c]
z = 3
AVOID d
"#,
    );

    let snapshot = |doc: &Lekvar| {
        doc.sections()
            .into_iter()
            .map(|s| (s.to_string(), doc.items(s, None).unwrap()))
            .collect::<Vec<_>>()
    };

    let first = snapshot(&doc);
    doc.resolve().unwrap();
    assert_eq!(first, snapshot(&doc));
}

#[test]
fn test_sequential_reads_share_the_document() {
    let mut doc = Lekvar::new();
    doc.read_str("[base]\nx = 1\n", "first.lkv").unwrap();
    doc.read_str("[derived : base]\n", "second.lkv").unwrap();

    assert_eq!(doc.get("derived", "x").unwrap(), Some("1"));
    assert_eq!(doc.sections(), vec!["base", "derived"]);
}

#[test]
fn test_topological_order_and_dot() {
    let doc = read("[a.b]\n[c : a.b]\n");

    assert_eq!(
        doc.topological_order().unwrap(),
        &["DEFAULT", "a", "a.b", "c"]
    );
    let dot = doc.to_dot().unwrap();
    assert!(dot.contains("dot-parent"));
    assert!(dot.contains("explicit"));
}

#[test]
fn test_read_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 8080\nenabled = on").unwrap();

    let mut doc = Lekvar::new();
    doc.read_file(file.path()).unwrap();
    assert_eq!(doc.get("server", "port").unwrap(), Some("8080"));
    assert!(doc.get_bool("server", "enabled").unwrap());
}

#[test]
fn test_read_missing_file() {
    let mut doc = Lekvar::new();
    let err = doc.read_file("/definitely/not/here.lkv").unwrap_err();
    assert!(matches!(err, LekvarError::Io { .. }));
}

#[test]
fn test_case_sensitive_option_names() {
    let settings = ParserSettings {
        case_sensitive: true,
        ..Default::default()
    };
    let mut doc = Lekvar::with_settings(settings).unwrap();
    doc.read_str("[s]\nKey = 1\nkey = 2\n", "case.lkv").unwrap();

    assert_eq!(doc.get("s", "Key").unwrap(), Some("1"));
    assert_eq!(doc.get("s", "key").unwrap(), Some("2"));
}

#[test]
fn test_custom_default_section() {
    let settings = ParserSettings {
        default_section: "common".to_string(),
        ..Default::default()
    };
    let mut doc = Lekvar::with_settings(settings).unwrap();
    doc.read_str("[common]\nlevel = info\n[svc]\n", "common.lkv")
        .unwrap();

    assert_eq!(doc.default_section(), "common");
    assert_eq!(doc.get("svc", "level").unwrap(), Some("info"));
    assert_eq!(doc.sections(), vec!["svc"]);
}
