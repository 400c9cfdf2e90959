mod common;

use common::{fake_pandoc, failing_tool, write_file};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use wiki_pdf_core::assemble::{assemble_document, AssembleError, AssemblyPlan, PandocConverter};
use wiki_pdf_core::config::ExternalTool;

fn pages(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn converter_receives_toc_flags_and_ordered_inputs() {
    let wiki = tempdir().unwrap();
    let drive = tempdir().unwrap();
    write_file(wiki.path(), "HOME.md", "# Home");
    write_file(wiki.path(), "Setup-Guide.md", "# Setup");

    let converter = PandocConverter::new(fake_pandoc(), vec!["--pdf-engine=xelatex".into()]);
    let files = pages(&["HOME.md", "Setup-Guide.md"]);
    let upload = drive.path().join("My Drive");
    let plan = AssemblyPlan {
        files: &files,
        working_dir: wiki.path(),
        output: Path::new("Chronos-Wiki.pdf"),
        upload_target: Some(&upload),
        toc_depth: 2,
    };

    let written = assemble_document(&converter, plan).await.unwrap();
    assert_eq!(written, upload.join("Chronos-Wiki.pdf"));

    let recorded = fs::read_to_string(&written).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        args,
        vec![
            "-o",
            written.to_str().unwrap(),
            "--toc",
            "--toc-depth=2",
            "--pdf-engine=xelatex",
            "HOME.md",
            "Setup-Guide.md",
        ]
    );
}

#[tokio::test]
async fn missing_input_names_the_file() {
    let wiki = tempdir().unwrap();
    write_file(wiki.path(), "HOME.md", "# Home");

    let converter = PandocConverter::new(fake_pandoc(), vec![]);
    let files = pages(&["HOME.md", "Ghost-Page.md"]);
    let plan = AssemblyPlan {
        files: &files,
        working_dir: wiki.path(),
        output: Path::new("out.pdf"),
        upload_target: None,
        toc_depth: 2,
    };

    let err = assemble_document(&converter, plan).await.unwrap_err();
    assert!(err.is_missing_input());
    match &err {
        AssembleError::MissingInput { file } => assert_eq!(file, "Ghost-Page.md"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Ghost-Page.md"));
}

#[tokio::test]
async fn other_converter_failures_are_generic() {
    let wiki = tempdir().unwrap();
    write_file(wiki.path(), "HOME.md", "# Home");

    let converter = PandocConverter::new(failing_tool("Error producing PDF.", 43), vec![]);
    let files = pages(&["HOME.md"]);
    let plan = AssemblyPlan {
        files: &files,
        working_dir: wiki.path(),
        output: Path::new("out.pdf"),
        upload_target: None,
        toc_depth: 3,
    };

    let err = assemble_document(&converter, plan).await.unwrap_err();
    match err {
        AssembleError::ConversionFailed { status, stderr } => {
            assert_eq!(status.code(), Some(43));
            assert!(stderr.contains("Error producing PDF"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unlaunchable_converter_is_reported() {
    let wiki = tempdir().unwrap();
    let converter = PandocConverter::new(ExternalTool::new("no-such-pandoc-binary"), vec![]);
    let files = pages(&["HOME.md"]);
    let plan = AssemblyPlan {
        files: &files,
        working_dir: wiki.path(),
        output: Path::new("out.pdf"),
        upload_target: None,
        toc_depth: 2,
    };

    let err = assemble_document(&converter, plan).await.unwrap_err();
    assert!(matches!(err, AssembleError::Launch { .. }));
}

#[tokio::test]
async fn empty_page_list_is_rejected_before_converting() {
    let wiki = tempdir().unwrap();
    let converter = PandocConverter::new(fake_pandoc(), vec![]);
    let files: Vec<String> = vec![];
    let plan = AssemblyPlan {
        files: &files,
        working_dir: wiki.path(),
        output: Path::new("out.pdf"),
        upload_target: None,
        toc_depth: 2,
    };

    let err = assemble_document(&converter, plan).await.unwrap_err();
    assert!(matches!(err, AssembleError::NoInputs));
    assert!(!wiki.path().join("out.pdf").exists());
}
