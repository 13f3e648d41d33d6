use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn write_template(root: &Path, name: &str, files: &[&str]) {
    let entries: Vec<String> = files.iter().map(|f| format!("\"{}\"", f)).collect();
    let json = format!(
        r#"{{"templates":{{"{}":{{"files":[{}],"saved_at":"2026-01-01T00:00:00Z"}}}}}}"#,
        name,
        entries.join(",")
    );
    write_file(&root.join(".treemark/templates.json"), &json);
}

fn treemark() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("treemark"))
}

#[test]
fn print_emits_markdown_document() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n");
    write_file(&temp.path().join("README.md"), "# demo\n");
    write_template(temp.path(), "review", &["README.md", "src/lib.rs"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("review")
        .arg("--print")
        .assert()
        .success()
        .stdout(predicate::str::contains("### `src/lib.rs`"))
        .stdout(predicate::str::contains("pub fn answer()"))
        .stdout(predicate::str::contains("2 files"));
}

#[test]
fn print_lists_each_file_once_in_tree_order() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("b.txt"), "b\n");
    write_file(&temp.path().join("a.txt"), "a\n");
    write_template(temp.path(), "all", &["a.txt", "b.txt"]);

    let assert = treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("all")
        .arg("--print")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.matches("### `a.txt`").count(), 1);
    assert_eq!(stdout.matches("### `b.txt`").count(), 1);
    let a_pos = stdout.find("### `a.txt`").unwrap();
    let b_pos = stdout.find("### `b.txt`").unwrap();
    assert!(a_pos < b_pos);
}

#[test]
fn print_reports_missing_template_entries_and_continues() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("keep1.txt"), "one\n");
    write_file(&temp.path().join("keep2.txt"), "two\n");
    write_template(temp.path(), "trio", &["gone.txt", "keep1.txt", "keep2.txt"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("trio")
        .arg("--print")
        .arg("--no-color")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 files"))
        .stdout(predicate::str::contains("gone.txt").not())
        .stderr(predicate::str::contains("1 missing"))
        .stderr(predicate::str::contains("gone.txt"));
}

#[test]
fn print_with_unknown_template_fails() {
    let temp = tempdir().unwrap();
    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("nope")
        .arg("--print")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn print_requires_template() {
    let temp = tempdir().unwrap();
    treemark().arg(temp.path()).arg("--print").assert().failure();
}

#[test]
fn missing_root_fails() {
    treemark()
        .arg("/definitely/not/a/real/path")
        .arg("--template")
        .arg("x")
        .arg("--print")
        .assert()
        .failure();
}

#[test]
fn cypher_format_emits_graph_statements() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("src/a.rs"), "struct A;\n");
    write_template(temp.path(), "g", &["src/a.rs"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("g")
        .arg("--print")
        .arg("--format")
        .arg("cypher")
        .assert()
        .success()
        .stdout(predicate::str::contains("MERGE (f0:File {path: \"src/a.rs\"})"))
        .stdout(predicate::str::contains("-[:CONTAINS]->"));
}

#[test]
fn sexpr_format_emits_document() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "hi\n");
    write_template(temp.path(), "s", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("s")
        .arg("--print")
        .arg("--format")
        .arg("sexpr")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("(context"))
        .stdout(predicate::str::contains("(file (path \"a.txt\")"));
}

#[test]
fn unknown_format_fails() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "hi\n");
    write_template(temp.path(), "s", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("s")
        .arg("--print")
        .arg("--format")
        .arg("xml")
        .assert()
        .failure();
}

#[test]
fn output_flag_writes_file_instead_of_stdout() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "hi\n");
    write_template(temp.path(), "s", &["a.txt"]);
    let out = temp.path().join("context.md");

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("s")
        .arg("--print")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("### `a.txt`"));
}

#[test]
fn heuristic_model_is_accepted() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "some plain words here\n");
    write_template(temp.path(), "s", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("s")
        .arg("--print")
        .arg("--model")
        .arg("heuristic")
        .assert()
        .success()
        .stdout(predicate::str::contains("(heuristic)"));
}

#[test]
fn templates_list_shows_saved_entries() {
    let temp = tempdir().unwrap();
    write_template(temp.path(), "review", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("templates")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("1 files"));
}

#[test]
fn templates_delete_removes_entry() {
    let temp = tempdir().unwrap();
    write_template(temp.path(), "review", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("templates")
        .arg("delete")
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted 'review'"));

    treemark()
        .arg(temp.path())
        .arg("templates")
        .arg("delete")
        .arg("review")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn prompt_is_embedded_in_document() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("a.txt"), "hi\n");
    write_template(temp.path(), "s", &["a.txt"]);

    treemark()
        .arg(temp.path())
        .arg("--template")
        .arg("s")
        .arg("--print")
        .arg("--prompt")
        .arg("Review this carefully")
        .assert()
        .success()
        .stdout(predicate::str::contains("Review this carefully"));
}
