//! Integration tests for devportal-fs commands.
//!
//! The lower layer is the real built-in web bundle; the upper layer is a
//! temporary override directory.

use std::io;
use std::path::Path;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use devportal_fs::{Cli, run};

/// Override directory replacing the theme and adding one stylesheet.
fn overrides() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("static/css")).unwrap();
    std::fs::write(dir.path().join("static/css/theme.css"), "body { color: red; }\n").unwrap();
    std::fs::write(dir.path().join("static/extra.css"), "").unwrap();
    dir
}

/// Run a command line with `upper` as the override directory.
async fn run_with(upper: &Path, args: &[&str]) -> anyhow::Result<String> {
    let upper = upper.to_string_lossy().into_owned();
    let argv = ["devportal-fs", "--upper", upper.as_str()]
        .into_iter()
        .chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv)?;
    let mut out = Vec::new();
    run(&cli, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[rstest]
#[case::overridden("static/css/theme.css", "body { color: red; }\n")]
#[case::built_in("static/robots.txt", "User-agent: *\nDisallow: /\n")]
#[tokio::test]
async fn cat_prefers_overrides(#[case] path: &str, #[case] expected: &str) {
    let upper = overrides();
    let output = run_with(upper.path(), &["cat", path]).await.unwrap();
    assert_eq!(output, expected);
}

#[tokio::test]
async fn cat_copies_files_larger_than_one_read() {
    let upper = overrides();
    let contents: String = (0..5000).map(|i| format!("line {i}\n")).collect();
    std::fs::write(upper.path().join("static/big.txt"), &contents).unwrap();

    let output = run_with(upper.path(), &["cat", "static/big.txt"]).await.unwrap();
    assert_eq!(output.len(), contents.len());
    assert_eq!(output, contents);
}

#[tokio::test]
async fn ls_merges_layers() {
    let upper = overrides();
    let output = run_with(upper.path(), &["ls", "static"]).await.unwrap();
    assert_eq!(output, "css/\nextra.css\nrobots.txt\n");
}

#[tokio::test]
async fn ls_json() {
    let upper = overrides();
    let output = run_with(upper.path(), &["ls", "--json", "static/css"]).await.unwrap();
    let entries: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        entries,
        serde_json::json!([{ "name": "theme.css", "kind": "file" }])
    );
}

#[tokio::test]
async fn layers_reports_origin() {
    let upper = overrides();
    let output = run_with(upper.path(), &["layers", "static"]).await.unwrap();
    assert_eq!(output, "both   css/\nupper  extra.css\nlower  robots.txt\n");
}

#[tokio::test]
async fn tree_walks_merged_view() {
    let upper = tempfile::tempdir().unwrap();
    let output = run_with(upper.path(), &["tree", "templates"]).await.unwrap();
    assert_eq!(
        output,
        "home/\n  index.page.tmpl\nshared/\n  base.layout.tmpl\n"
    );
}

#[tokio::test]
async fn stat_built_in_file() {
    let upper = tempfile::tempdir().unwrap();
    let output = run_with(upper.path(), &["stat", "static/robots.txt"]).await.unwrap();
    assert_eq!(output, "kind: file\nsize: 26\n");
}

#[tokio::test]
async fn root_scopes_both_layers() {
    let upper = overrides();
    let output = run_with(upper.path(), &["--root", "static", "cat", "css/theme.css"])
        .await
        .unwrap();
    assert_eq!(output, "body { color: red; }\n");

    let output = run_with(upper.path(), &["--root", "static", "ls"]).await.unwrap();
    assert_eq!(output, "css/\nextra.css\nrobots.txt\n");
}

#[tokio::test]
async fn lower_directory_replaces_bundle() {
    let upper = overrides();
    let lower = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(lower.path().join("static")).unwrap();
    std::fs::write(lower.path().join("static/only-on-disk.txt"), "disk").unwrap();

    let lower_arg = lower.path().to_string_lossy().into_owned();
    let output = run_with(upper.path(), &["--lower", lower_arg.as_str(), "ls", "static"])
        .await
        .unwrap();
    assert_eq!(output, "css/\nextra.css\nonly-on-disk.txt\n");
}

#[tokio::test]
async fn missing_file_reports_not_found() {
    let upper = overrides();
    let err = run_with(upper.path(), &["cat", "static/missing.css"])
        .await
        .unwrap_err();

    let io_err = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .expect("io error in chain");
    assert!(devportal_vfs::is_not_found(io_err));
    assert!(format!("{err:#}").contains("couldn't open static/missing.css in lower"));
}
