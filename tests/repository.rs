// Pattern files loaded from disk and run through a scanner.

use anyhow::Result;
use ust_matcher::config::OutputFormat;
use ust_matcher::reporter::create_reporter;
use ust_matcher::repository::{MemoryPatternRepository, PatternDto, PatternRepository};
use ust_matcher::{Config, Language, Scanner, SourceFile, TextSpan, UstBuilder};

const PATTERNS: &str = r#"[
    {
        "Key": "js-eval",
        "Name": "Dynamic code evaluation",
        "Languages": ["JavaScript", "Cobol"],
        "Value": "{\"kind\": \"Invocation\", \"target\": {\"kind\": \"IdToken\", \"name\": \"eval\"}, \"arguments\": [{\"kind\": \"AnyExpression\"}]}",
        "CweId": "CWE-95",
        "DataFormat": "Json"
    },
    {
        "Key": "todo-comment",
        "Name": "Unfinished code",
        "Value": "{\"kind\": \"CommentRegex\", \"regex\": \"TODO\"}",
        "DataFormat": "Whatever"
    },
    {
        "Key": "cobol-only",
        "Languages": ["Cobol"],
        "Value": "{\"kind\": \"Any\"}"
    },
    {
        "Key": "bad-regex",
        "Value": "{\"kind\": \"IdRegex\", \"regex\": \"(\"}"
    },
    {
        "Name": "no key",
        "Value": "{\"kind\": \"Any\"}"
    }
]"#;

fn eval_tree() -> ust_matcher::RootUst {
    // eval(input); // TODO sanitize
    let code = "eval(input); // TODO sanitize";
    let mut b = UstBuilder::new(Language::JavaScript, SourceFile::new("src/app.js", code));
    let eval = b.identifier("eval", TextSpan::new(0, 4));
    let input = b.identifier("input", TextSpan::new(5, 5));
    let call = b.invocation(eval, vec![input], TextSpan::new(0, 11));
    let stmt = b.expression_statement(call);
    let root = b.statements(vec![stmt]);
    b.comment("// TODO sanitize", TextSpan::new(13, 16));
    b.build(root)
}

#[test]
fn test_tolerant_pattern_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("patterns.json");
    std::fs::write(&path, PATTERNS)?;

    let mut repository = MemoryPatternRepository::new();
    let report = repository.load_file(&path, None)?;

    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, 3);

    let eval = repository.get("js-eval").expect("js-eval loaded");
    assert_eq!(eval.languages.len(), 1);
    assert!(eval.applies_to(Language::JavaScript));
    assert_eq!(eval.cwe_id.as_deref(), Some("CWE-95"));

    let todo = repository.get("todo-comment").expect("todo-comment loaded");
    assert!(todo.applies_to(Language::Go));
    assert!(todo.applies_to(Language::MySql));
    Ok(())
}

#[test]
fn test_pattern_file_through_scanner() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("patterns.json");
    std::fs::write(&path, PATTERNS)?;

    let config = Config::builder()
        .builtin_patterns(false)
        .pattern_path(path)
        .threads(1)
        .build();
    let scanner = Scanner::new(config)?;
    assert_eq!(scanner.load_report().skipped, 3);

    let summary = scanner.match_trees(&[eval_tree()]);
    let keys: Vec<&str> = summary.results.iter().map(|r| r.pattern_key.as_str()).collect();
    assert_eq!(keys, vec!["js-eval", "todo-comment"]);
    assert_eq!(summary.results[1].text_spans, vec![TextSpan::new(13, 16)]);
    assert_eq!(summary.stats.patterns_skipped, 3);
    assert_eq!(summary.errors.len(), 3);

    let sarif = create_reporter(OutputFormat::Sarif, false, &scanner.repository().all()).generate(&summary);
    let parsed: serde_json::Value = serde_json::from_str(&sarif)?;
    let rules = &parsed["runs"][0]["tool"]["driver"]["rules"];
    assert_eq!(rules[0]["id"], "js-eval");
    assert_eq!(rules[0]["properties"]["tags"][0], "CWE-95");
    Ok(())
}

#[test]
fn test_loose_records_do_not_sink_the_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("loose.json");
    std::fs::write(
        &path,
        r#"[
            {"Key": "good", "Languages": ["JavaScript"], "Value": "{\"kind\": \"IdToken\", \"name\": \"eval\"}"},
            {"Key": "numeric-cwe", "CweId": 79, "Languages": ["JavaScript"], "Value": "{\"kind\": \"NullLiteral\"}"},
            ["not", "a", "record"]
        ]"#,
    )?;

    let config = Config::builder()
        .builtin_patterns(false)
        .pattern_path(path)
        .threads(1)
        .build();
    let scanner = Scanner::new(config)?;

    assert_eq!(scanner.load_report().loaded, 2);
    assert_eq!(scanner.load_report().skipped, 1);
    let keys: Vec<String> = scanner.repository().all().iter().map(|p| p.key.clone()).collect();
    assert_eq!(keys, vec!["good", "numeric-cwe"]);

    let summary = scanner.match_trees(&[eval_tree()]);
    assert_eq!(summary.results_for_pattern("good").len(), 1);
    Ok(())
}

#[test]
fn test_missing_pattern_file_is_fatal() {
    let config = Config::builder()
        .builtin_patterns(false)
        .pattern_path("/nonexistent/patterns.json".into())
        .build();
    assert!(Scanner::new(config).is_err());
}

#[test]
fn test_dtos_reload() -> Result<()> {
    let mut repository = MemoryPatternRepository::new();
    repository.load_json(PATTERNS, None)?;

    let json = serde_json::to_string(&repository.to_dtos())?;
    let mut reloaded = MemoryPatternRepository::new();
    let report = reloaded.load_json(&json, None)?;

    assert_eq!(report.skipped, 0);
    let keys = |r: &MemoryPatternRepository| r.all().iter().map(|p| p.key.clone()).collect::<Vec<_>>();
    assert_eq!(keys(&reloaded), keys(&repository));

    let dtos: Vec<PatternDto> = serde_json::from_str(&json)?;
    assert_eq!(dtos[0].cwe_id, "CWE-95");
    Ok(())
}
