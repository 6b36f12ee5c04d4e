// End-to-end matching scenarios over hand-built trees.

use anyhow::Result;
use std::sync::Arc;
use ust_matcher::concurrency::Interrupt;
use ust_matcher::pattern::{PatternNode, PatternRegex, PatternRoot};
use ust_matcher::repository::MemoryPatternRepository;
use ust_matcher::{
    Config, Language, MatchingEngine, MatchingOptions, RootUst, Scanner, SourceFile, TextSpan,
    UstBuilder,
};

/// `code` is a single member chain statement such as `a.b.window.name;`.
fn member_chain(code: &str) -> RootUst {
    let path = code.trim_end_matches(';');
    let mut b = UstBuilder::new(Language::JavaScript, SourceFile::new("chain.js", code));
    let mut offset = 0;
    let mut expr = None;
    for segment in path.split('.') {
        let id = b.identifier(segment, TextSpan::new(offset, segment.len()));
        offset += segment.len() + 1;
        expr = Some(match expr {
            None => id,
            Some(target) => b.member_ref(target, id),
        });
    }
    let stmt = b.expression_statement(expr.unwrap());
    let root = b.statements(vec![stmt]);
    b.build(root)
}

/// `name(arg?);` in the given language.
fn call(language: Language, name: &str, arg: Option<&str>) -> RootUst {
    let code = format!("{}({});", name, arg.unwrap_or_default());
    let mut b = UstBuilder::new(language, SourceFile::new("call.src", code.as_str()));
    let target = b.identifier(name, TextSpan::new(0, name.len()));
    let args = match arg {
        Some(arg) => vec![b.identifier(arg, TextSpan::new(name.len() + 1, arg.len()))],
        None => vec![],
    };
    let invocation = b.invocation(target, args, TextSpan::new(0, code.len() - 1));
    let stmt = b.expression_statement(invocation);
    let root = b.statements(vec![stmt]);
    b.build(root)
}

fn run(engine: &MatchingEngine, tree: &RootUst, pattern: PatternRoot) -> Result<Vec<Vec<TextSpan>>> {
    let results = engine.match_tree(tree, &[Arc::new(pattern)], &Interrupt::none())?;
    Ok(results.into_iter().map(|r| r.text_spans).collect())
}

#[test]
fn test_window_name_anywhere() -> Result<()> {
    let pattern = || {
        PatternRoot::builder("window-name")
            .language(Language::JavaScript)
            .pattern(PatternNode::member(PatternNode::id("window"), PatternNode::id("name")).anywhere())
            .build()
    };
    let engine = MatchingEngine::new(MatchingOptions::default());

    let qualified = run(&engine, &member_chain("a.b.window.name;"), pattern()?)?;
    assert_eq!(qualified, vec![vec![TextSpan::new(4, 6), TextSpan::new(11, 4)]]);

    let bare = run(&engine, &member_chain("window.name;"), pattern()?)?;
    assert_eq!(bare, vec![vec![TextSpan::new(0, 6), TextSpan::new(7, 4)]]);

    assert!(run(&engine, &member_chain("window.title;"), pattern()?)?.is_empty());
    Ok(())
}

#[test]
fn test_zero_arg_call_and_case_folding() -> Result<()> {
    let pattern = || {
        PatternRoot::builder("sha1-call")
            .languages([Language::MySql, Language::JavaScript])
            .pattern(PatternNode::invocation(
                PatternNode::id_regex(PatternRegex::new("^sha1$")?),
                vec![],
            ))
            .build()
    };
    let engine = MatchingEngine::new(MatchingOptions::default());

    let hit = run(&engine, &call(Language::JavaScript, "sha1", None), pattern()?)?;
    assert_eq!(hit, vec![vec![TextSpan::new(0, 4)]]);

    assert!(run(&engine, &call(Language::JavaScript, "sha1", Some("x")), pattern()?)?.is_empty());

    // MySQL identifiers compare case-insensitively, JavaScript ones do not.
    assert_eq!(run(&engine, &call(Language::MySql, "SHA1", None), pattern()?)?.len(), 1);
    assert!(run(&engine, &call(Language::JavaScript, "SHA1", None), pattern()?)?.is_empty());
    Ok(())
}

#[test]
fn test_nested_occurrences_by_mode() -> Result<()> {
    // f(f(x));
    let mut b = UstBuilder::new(Language::Php, SourceFile::new("nested.php", "f(f(x));"));
    let outer_f = b.identifier("f", TextSpan::new(0, 1));
    let inner_f = b.identifier("f", TextSpan::new(2, 1));
    let x = b.identifier("x", TextSpan::new(4, 1));
    let inner = b.invocation(inner_f, vec![x], TextSpan::new(2, 4));
    let outer = b.invocation(outer_f, vec![inner], TextSpan::new(0, 7));
    let stmt = b.expression_statement(outer);
    let root = b.statements(vec![stmt]);
    let tree = b.build(root);

    let mut repository = MemoryPatternRepository::new();
    repository.add(
        PatternRoot::builder("call-f")
            .language(Language::Php)
            .pattern(PatternNode::invocation(PatternNode::id("f"), vec![PatternNode::AnyExpression]))
            .build()?,
    );
    let repository = Arc::new(repository);
    let trees = [tree];

    let once = Scanner::with_repository(Config::builder().threads(1).build(), repository.clone())?;
    let summary = once.match_trees(&trees);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].text_spans, vec![TextSpan::new(0, 1), TextSpan::new(2, 4)]);

    let all = Scanner::with_repository(
        Config::builder().threads(1).find_all_alternatives(true).build(),
        repository,
    )?;
    let summary = all.match_trees(&trees);
    let spans: Vec<Vec<TextSpan>> = summary.results.iter().map(|r| r.text_spans.clone()).collect();
    assert_eq!(
        spans,
        vec![
            vec![TextSpan::new(0, 1), TextSpan::new(2, 4)],
            vec![TextSpan::new(2, 1), TextSpan::new(4, 1)],
        ]
    );
    Ok(())
}

/// `try { run(); } catch (Exception e) { <body> }` in Java.
fn java_try(empty_catch: bool) -> RootUst {
    let code = if empty_catch {
        "try { run(); } catch (Exception e) { }"
    } else {
        "try { run(); } catch (Exception e) { log(e); }"
    };
    let mut b = UstBuilder::new(Language::Java, SourceFile::new("Main.java", code));
    let run = b.identifier("run", TextSpan::new(6, 3));
    let call = b.invocation(run, vec![], TextSpan::new(6, 5));
    let stmt = b.expression_statement(call);
    let try_block = b.block(vec![stmt], TextSpan::new(4, 10));
    let exception = b.type_token("Exception", TextSpan::new(22, 9));
    let body = if empty_catch {
        b.block(vec![], TextSpan::new(36, 3))
    } else {
        let log = b.identifier("log", TextSpan::new(38, 3));
        let e = b.identifier("e", TextSpan::new(42, 1));
        let call = b.invocation(log, vec![e], TextSpan::new(38, 6));
        let stmt = b.expression_statement(call);
        b.block(vec![stmt], TextSpan::new(36, 11))
    };
    let clause = b.catch_clause(Some(exception), body, TextSpan::new(15, code.len() - 15));
    let try_catch = b.try_catch(try_block, vec![clause]);
    let root = b.statements(vec![try_catch]);
    b.build(root)
}

#[test]
fn test_builtin_empty_catch() -> Result<()> {
    let scanner = Scanner::new(Config::builder().threads(1).build())?;

    let results = scanner.match_tree(&java_try(true))?;
    let keys: Vec<&str> = results.iter().map(|r| r.pattern_key.as_str()).collect();
    assert_eq!(keys, vec!["empty-catch-block"]);

    assert!(scanner.match_tree(&java_try(false))?.is_empty());
    Ok(())
}

#[test]
fn test_match_files_counts_bad_input() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let good = dir.path().join("good.ust.json");
    let bad = dir.path().join("bad.ust.json");
    std::fs::write(&good, serde_json::to_string(&java_try(true).to_document())?)?;
    std::fs::write(&bad, "{ not a tree")?;
    std::fs::write(dir.path().join("notes.txt"), "ignored")?;

    let files = ust_matcher::collect_ust_files(&[dir.path().to_path_buf()]);
    assert_eq!(files, vec![bad.clone(), good.clone()]);

    let scanner = Scanner::new(Config::builder().threads(2).build())?;
    let summary = scanner.match_files(&files);

    assert_eq!(summary.stats.files_total, 2);
    assert_eq!(summary.stats.files_matched, 1);
    assert_eq!(summary.stats.files_failed, 1);
    assert!(!summary.is_complete());
    assert_eq!(summary.results_for_pattern("empty-catch-block").len(), 1);
    assert!(summary.errors.iter().any(|e| e.contains("bad.ust.json")));
    Ok(())
}

#[test]
fn test_language_selection_skips_file() -> Result<()> {
    let scanner = Scanner::new(
        Config::builder()
            .threads(1)
            .languages(vec![Language::Php])
            .build(),
    )?;
    let summary = scanner.match_trees(&[java_try(true)]);
    assert!(summary.results.is_empty());
    assert_eq!(summary.stats.files_matched, 1);
    assert!(summary.is_complete());
    Ok(())
}
