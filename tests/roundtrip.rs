//! End-to-end round-trip: export a directory to Markdown, materialize the
//! document into a fresh directory, and compare every file byte for byte.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mdfold::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

fn generate_cmd(input: &Path, output: &Path) -> Commands {
    Commands::Generate {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        dry_run: false,
        preview: false,
        no_overwrite: false,
        no_cache: true,
        strict: false,
        keep_hints: false,
        no_unassigned: false,
        skip_empty: false,
        set_exec: false,
        force_file: vec![],
        force_dir: vec![],
        non_interactive: true,
        summary: "json".to_string(),
        json_summary: None,
        verbose: false,
    }
}

fn export_cmd(source: &Path, output: &Path) -> Commands {
    Commands::Export {
        source: source.to_path_buf(),
        output: Some(output.to_path_buf()),
        title: None,
        ignore: vec![],
        verify: false,
        max_file_size: None,
    }
}

fn collect_files(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        if rel == ".mdfold-cache.json" {
            continue;
        }
        out.insert(rel, fs::read(entry.path()).unwrap());
    }
    out
}

fn seed(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let fs_path = root.join(path);
        fs::create_dir_all(fs_path.parent().unwrap()).unwrap();
        fs::write(fs_path, content).unwrap();
    }
}

fn roundtrip(files: &[(&str, &str)]) {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let regenerated = temp.path().join("regenerated");
    let doc_path = temp.path().join("doc.md");
    fs::create_dir_all(&source).unwrap();
    seed(&source, files);

    let cli = CliContext::new(None).unwrap();
    cli.execute(&export_cmd(&source, &doc_path)).unwrap();
    cli.execute(&generate_cmd(&doc_path, &regenerated)).unwrap();

    let before = collect_files(&source);
    let after = collect_files(&regenerated);
    assert_eq!(before, after);
}

#[test]
fn plain_source_tree_survives_the_round_trip() {
    roundtrip(&[
        ("README.md", "# Project\n\nHello.\n"),
        ("src/main.rs", "fn main() {\n    println!(\"hi\");\n}\n"),
        ("src/lib.rs", "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n"),
        ("docs/guide.md", "Guide text.\n"),
    ]);
}

#[test]
fn fenced_markdown_content_survives_the_round_trip() {
    roundtrip(&[
        (
            "README.md",
            "# Doc\n\n```rust\nfn main() {}\n```\n\nDone.\n",
        ),
        ("nested.md", "````\nfour backticks outside\n````\n"),
    ]);
}

#[test]
fn escaped_fences_survive_the_round_trip() {
    // content that already carries the escape prefix must gain and then
    // shed exactly one more backslash
    roundtrip(&[
        ("tricky.md", "\\```\nalready escaped once\n\\```\n"),
        ("double.md", "\\\\```\ntwo backslashes\n\\\\```\n"),
    ]);
}

#[test]
fn deep_nesting_and_special_names_survive() {
    roundtrip(&[
        ("a/b/c/d/leaf.txt", "deep\n"),
        ("Makefile", "all:\n\techo hi\n"),
        (".gitignore", "target/\n"),
        ("scripts/run.sh", "#!/bin/sh\necho run\n"),
    ]);
}

#[test]
fn exported_document_verifies_against_its_source() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    seed(
        &source,
        &[
            ("src/app.py", "print('x')\n"),
            ("notes.md", "```text\nfence inside\n```\n"),
        ],
    );
    let cli = CliContext::new(None).unwrap();
    let command = Commands::Export {
        source: source.clone(),
        output: None,
        title: None,
        ignore: vec![],
        verify: true,
        max_file_size: None,
    };
    let markdown = cli.execute(&command).unwrap();
    assert!(markdown.contains("## File Structure"));
    assert!(markdown.contains("## src/app.py"));
}

#[test]
fn second_generate_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    let out = temp.path().join("out");
    let doc_path = temp.path().join("doc.md");
    fs::create_dir_all(&source).unwrap();
    seed(&source, &[("a.txt", "stable\n"), ("dir/b.txt", "also\n")]);

    let cli = CliContext::new(None).unwrap();
    cli.execute(&export_cmd(&source, &doc_path)).unwrap();

    let mut cached = generate_cmd(&doc_path, &out);
    if let Commands::Generate { no_cache, .. } = &mut cached {
        *no_cache = false;
    }
    let first = cli.execute(&cached).unwrap();
    let first: serde_json::Value = serde_json::from_str(&first).unwrap();
    let second = cli.execute(&cached).unwrap();
    let second: serde_json::Value = serde_json::from_str(&second).unwrap();

    let count = |v: &serde_json::Value, status: &str| {
        v["outcomes"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|o| o["status"] == status)
            .count()
    };
    assert!(count(&first, "created") > 0);
    assert_eq!(count(&second, "created"), 0);
    assert_eq!(collect_files(&source), {
        let mut files = collect_files(&out);
        files.retain(|k, _| !k.starts_with("_unassigned/"));
        files
    });
}
