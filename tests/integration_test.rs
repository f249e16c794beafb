// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for a11yscan

use a11yscan::config::ScanConfig;
use a11yscan::report::{build_static, generate_report, OutputFormat, ScanOutput};
use a11yscan::scanner::{DocumentRequest, Scanner};
use a11yscan::ScanError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn write_rule(rules: &Path, team: &str, id: &str, check_id: &str, applies_to: Option<&str>) {
    let mut content = format!(
        "id: {}\ndescription: {} rule\nseverity: high\ncheckId: {}\nrecommendation: Fix {}\nwcagCriteria: 1.1.1\n",
        id, id, check_id, id
    );
    if let Some(kinds) = applies_to {
        content.push_str(&format!("appliesTo: {}\n", kinds));
    }
    write(rules, &format!("{}/{}.yml", team, id), &content);
}

/// A small corpus and site exercising markup, style and script sources
fn fixture() -> (TempDir, TempDir) {
    let rules = TempDir::new().unwrap();
    write_rule(rules.path(), "web", "img-alt", "missing-alt-text", None);
    write_rule(rules.path(), "web", "contrast", "insufficient-contrast", Some("css"));
    write_rule(rules.path(), "web", "button-name", "unlabeled-button", None);
    write_rule(rules.path(), "desktop", "xaml-names", "xaml-missing-name", None);

    let site = TempDir::new().unwrap();
    write(
        site.path(),
        "index.html",
        "<html lang=\"en\">\n<head><link rel=\"stylesheet\" href=\"css/site.css\"></head>\n<body>\n\
         <img src=\"logo.png\">\n<button aria-label=\"Save\"></button>\n<button></button>\n\
         <p style=\"color: #777777; background-color: #888888\">low</p>\n</body>\n</html>\n",
    );
    write(site.path(), "css/site.css", ".muted {\n  color: #777;\n  background-color: #888;\n}\n");
    write(site.path(), "css/ok.css", ".plain { color: #000; background-color: #fff; }\n");
    write(
        site.path(),
        "js/app.js",
        "const a = 1;\nconst t = `<img src=\"x.png\">`;\n// const u = '<img src=\"y.png\">';\n",
    );
    write(site.path(), "node_modules/lib/index.html", "<img src=\"vendored.png\">\n");

    (rules, site)
}

#[test]
fn test_static_scan_finds_expected_issues() {
    let (rules, site) = fixture();
    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .expect("scan should succeed");

    let mut located: Vec<(&str, &str, usize)> = scan
        .issues
        .iter()
        .map(|i| (i.rule_id.as_str(), i.file_path.as_str(), i.line))
        .collect();
    located.sort();

    assert_eq!(
        located,
        vec![
            ("button-name", "index.html", 6),
            ("contrast", "css/site.css", 1),
            ("img-alt", "index.html", 4),
            ("img-alt", "js/app.js", 2),
        ]
    );
    assert!(scan.issues.iter().all(|i| i.team_name.as_deref() == Some("web")));
    assert!(scan.documents.iter().all(|d| !d.url.starts_with("node_modules")));
}

#[test]
fn test_issue_keys_are_unique() {
    let (rules, site) = fixture();
    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap();

    let keys: HashSet<_> = scan.issues.iter().map(|i| i.dedup_key()).collect();
    assert_eq!(keys.len(), scan.issues.len());

    let script = "const a = `<img src=\"x.png\">`;\nconst b = `<img src=\"x.png\">`;\n";
    let request = DocumentRequest::new(rules.path(), "https://x.test/app.js", script).with_kind("js");
    let doc = Scanner::default().scan_document(&request).unwrap();
    let keys: HashSet<_> = doc.issues.iter().map(|i| i.dedup_key()).collect();
    assert_eq!(keys.len(), doc.issues.len());
    assert_eq!(doc.issues.len(), 2);
}

#[test]
fn test_applies_to_restricts_views() {
    let (rules, site) = fixture();
    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap();

    // The contrast rule is limited to css, so the inline style in index.html is skipped
    let contrast: Vec<_> = scan.issues.iter().filter(|i| i.rule_id == "contrast").collect();
    assert_eq!(contrast.len(), 1);
    assert_eq!(contrast[0].file_path, "css/site.css");
}

#[test]
fn test_button_named_by_aria_label_passes() {
    let (rules, _site) = fixture();
    let request = DocumentRequest::new(
        rules.path(),
        "https://x.test/",
        "<button aria-label=\"Close\"></button>\n<button></button>",
    );
    let scan = Scanner::default().scan_document(&request).unwrap();
    let buttons: Vec<_> = scan.issues.iter().filter(|i| i.check_id == "unlabeled-button").collect();
    assert_eq!(buttons.len(), 1);
    assert_eq!(buttons[0].line, 2);
}

#[test]
fn test_template_lines_survive_rendering() {
    let (rules, _site) = fixture();
    let template = "<@layout.page\n    title=\"Home\">\n<img src=\"a.png\">\n</@layout.page>\n";
    let request = DocumentRequest::new(rules.path(), "home.ftl", template).with_kind("ftl");
    let scan = Scanner::default().scan_document(&request).unwrap();

    let images: Vec<_> = scan.issues.iter().filter(|i| i.rule_id == "img-alt").collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].line, 3);
    assert_eq!(scan.document.kind, "ftl");
}

#[test]
fn test_runtime_document_records_stylesheets() {
    let (rules, _site) = fixture();
    let request = DocumentRequest::new(
        rules.path(),
        "https://x.test/docs/page.html",
        "<link rel=\"stylesheet\" href=\"../css/a.css?v=2\"><p>hi</p>",
    );
    let scan = Scanner::default().scan_document(&request).unwrap();
    assert_eq!(scan.document.stylesheets, vec!["https://x.test/css/a.css"]);
    assert_eq!(scan.document.body.as_deref(), Some(request.content.as_str()));
}

#[test]
fn test_static_report_is_deterministic() {
    let (rules, site) = fixture();
    let render = || {
        let scan = Scanner::default()
            .scan_root(site.path(), rules.path(), &ScanConfig::default())
            .unwrap();
        let report = build_static(&scan.documents, &scan.issues, &scan.rules);
        generate_report(
            &ScanOutput {
                report: &report,
                documents: &scan.documents,
                issues: &scan.issues,
            },
            OutputFormat::Json,
        )
    };
    assert_eq!(render(), render());
}

#[test]
fn test_static_report_coverage_and_linked_stylesheets() {
    let (rules, site) = fixture();
    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap();
    let report = build_static(&scan.documents, &scan.issues, &scan.rules);

    // css/ok.css has no issues but is still listed
    assert_eq!(report.summary.files, 4);
    assert!(report.by_file.iter().any(|f| f.file_path == "css/ok.css" && f.issue_count == 0));

    let index = report.by_file.iter().find(|f| f.file_path == "index.html").unwrap();
    assert_eq!(index.linked_stylesheets_with_issues.len(), 1);
    assert_eq!(index.linked_stylesheets_with_issues[0].file_path, "css/site.css");

    let coverage = report.coverage.unwrap();
    assert_eq!(coverage.total_rules, 4);
    assert_eq!(coverage.triggered_rules, 3);
    assert_eq!(coverage.coverage_percent, 75);
    assert_eq!(coverage.missing_rules[0].rule_id, "xaml-names");
}

#[test]
fn test_coverage_one_of_three() {
    let rules = TempDir::new().unwrap();
    write_rule(rules.path(), "web", "img-alt", "missing-alt-text", None);
    write_rule(rules.path(), "web", "page-title", "missing-page-title", None);
    write_rule(rules.path(), "web", "doc-lang", "missing-document-language", None);

    let site = TempDir::new().unwrap();
    write(
        site.path(),
        "index.html",
        "<html lang=\"en\"><head><title>Home</title></head><body><img src=\"a.png\"></body></html>",
    );

    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap();
    let coverage = build_static(&scan.documents, &scan.issues, &scan.rules).coverage.unwrap();
    assert_eq!(coverage.coverage_percent, 33);
    assert_eq!(coverage.missing_rule_count, 2);
}

#[test]
fn test_invalid_corpus_aborts_scan() {
    let (rules, site) = fixture();
    write(
        rules.path(),
        "web/broken.yml",
        "id: broken\ndescription: Broken\nseverity: urgent\ncheckId: missing-alt-text\n",
    );

    let err = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap_err();
    match err {
        ScanError::RuleValidation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].team, "web");
            assert_eq!(errors[0].rule_id, "broken");
        }
        other => panic!("unexpected error: {}", other),
    }

    let request = DocumentRequest::new(rules.path(), "https://x.test/", "<img>");
    assert!(Scanner::default().scan_document(&request).is_err());
}

#[test]
fn test_missing_rules_root() {
    let site = TempDir::new().unwrap();
    let err = Scanner::default()
        .scan_root(site.path(), &site.path().join("nope"), &ScanConfig::default())
        .unwrap_err();
    assert!(matches!(err, ScanError::RulesNotFound(_)));
}

#[test]
fn test_script_markup_is_not_judged_as_a_page() {
    let rules = TempDir::new().unwrap();
    write_rule(rules.path(), "web", "page-title", "missing-page-title", None);
    write_rule(rules.path(), "web", "skip-link", "missing-skip-link", None);
    write_rule(rules.path(), "web", "doc-lang", "missing-document-language", None);

    let script = "const t = `<span class=\"x\">ok</span>`;\nconst p = '<html><body></body></html>';\n";
    let request = DocumentRequest::new(rules.path(), "https://x.test/app.js", script).with_kind("js");
    let doc = Scanner::default().scan_document(&request).unwrap();
    assert!(doc.issues.is_empty(), "unexpected issues: {:?}", doc.issues);

    let site = TempDir::new().unwrap();
    write(site.path(), "js/app.js", script);
    let scan = Scanner::default()
        .scan_root(site.path(), rules.path(), &ScanConfig::default())
        .unwrap();
    assert!(scan.issues.is_empty(), "unexpected issues: {:?}", scan.issues);
}
