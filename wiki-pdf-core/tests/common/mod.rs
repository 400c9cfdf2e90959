#![allow(dead_code)]

use std::path::Path;
use wiki_pdf_core::config::ExternalTool;

/// Stand-in for pandoc: fails like pandoc on a missing input, otherwise writes
/// its argument list (one per line) to the `-o` target.
pub const FAKE_PANDOC: &str = r#"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
for a in "$@"; do
  case "$a" in
    -*) ;;
    *)
      if [ "$a" != "$out" ] && [ ! -f "$a" ]; then
        echo "pandoc: $a: withBinaryFile: does not exist (No such file or directory)" >&2
        exit 1
      fi
      ;;
  esac
done
printf '%s\n' "$@" > "$out"
"#;

pub fn fake_pandoc() -> ExternalTool {
    ExternalTool::new("sh").with_args(["-c", FAKE_PANDOC, "pandoc"])
}

pub fn failing_tool(stderr: &str, code: i32) -> ExternalTool {
    let script = format!("echo '{stderr}' >&2; exit {code}");
    ExternalTool::new("sh").with_args(["-c".to_string(), script, "tool".to_string()])
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
