use std::path::Path;

use assert_cmd::Command;

fn newsdesk(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    Command::cargo_bin("newsdesk")
        .unwrap()
        .current_dir(dir)
        .env_remove("NEWSDESK_DB")
        .env_remove("NEWSDESK_LISTEN")
        .args(args)
        .assert()
}

fn stdout(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn stderr(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stderr.clone()).unwrap()
}

#[test]
fn init_migrate_and_publish() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    newsdesk(root, &["init", "sqlite", "db.sqlite"]).success();
    assert!(root.join("db.sqlite").exists());
    assert!(root.join(".newsdesk/config.json").exists());

    let listed = newsdesk(root, &["list"]).success();
    assert!(stdout(&listed).contains("Migration '20250112_093000_init' (not applied)"));

    let migrated = newsdesk(root, &["migrate"]).success();
    let out = stdout(&migrated);
    assert!(out.starts_with("2 migrations to apply"), "{out}");
    assert!(out.contains("Applied migration 20250203_141500_post_likes"));

    let listed = newsdesk(root, &["list"]).success();
    assert!(!stdout(&listed).contains("not applied"));

    let created = newsdesk(
        root,
        &[
            "post",
            "create",
            "--title",
            "Lake levels rise",
            "--category",
            "Politics",
            "--summary",
            "Water is up across the region.",
            "--content",
            "<p>Levels rose again this spring.</p>",
            "--publish",
        ],
    )
    .success();
    assert_eq!(
        stdout(&created).trim(),
        "Created post 1 at /politics/lake-levels-rise"
    );

    let published = newsdesk(root, &["post", "list", "--status", "published"]).success();
    assert!(stdout(&published).contains("Lake levels rise"));
    let drafts = newsdesk(root, &["post", "list", "--status", "draft"]).success();
    assert_eq!(stdout(&drafts).trim(), "No draft posts");

    let found = newsdesk(root, &["search", "lake"]).success();
    assert!(stdout(&found).starts_with("1 results"));

    newsdesk(root, &["post", "trash", "1"]).success();
    let trash = newsdesk(root, &["trash"]).success();
    assert!(stdout(&trash).contains("trashed"));
}

#[test]
fn settings_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    newsdesk(root, &["init", "sqlite", "db.sqlite"]).success();
    newsdesk(root, &["migrate"]).success();

    let toggled = newsdesk(root, &["settings", "toggle", "public-comments"]).success();
    assert_eq!(stdout(&toggled).trim(), "public-comments is off");
    let set = newsdesk(root, &["settings", "set", "public-comments", "true"]).success();
    assert_eq!(stdout(&set).trim(), "public-comments is on");

    newsdesk(root, &["settings", "toggle", "dark-mode"]).failure();
}

#[test]
fn missing_post_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    newsdesk(root, &["init", "sqlite", "db.sqlite"]).success();
    newsdesk(root, &["migrate"]).success();

    let shown = newsdesk(root, &["post", "show", "42"]).failure();
    assert!(stderr(&shown).starts_with("Encountered unexpected error"));
}

#[test]
fn unknown_backend() {
    let dir = tempfile::tempdir().unwrap();
    let shown = newsdesk(dir.path(), &["init", "mysql", "db"]).failure();
    assert!(stderr(&shown).contains("Unknown backend mysql"));
    assert!(!dir.path().join(".newsdesk").exists());
}
