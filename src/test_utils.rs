//! Shared helpers for unit tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, FixedOffset};

use crate::config::{parse_deadline, Config, CourseConfig, GradingConfig, PathsConfig};

/// Stand-in compiler: fails with a gcc-style error line when a source
/// contains `MISSING_SEMI`, otherwise writes a `cat` script to the `-o`
/// path.
pub const FAKE_CC: &str = r#"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
for arg in "$@"; do
  case "$arg" in
    *.c)
      if grep -q MISSING_SEMI "$arg"; then
        echo "$arg:3:12: error: expected ';' before '}' token"
        exit 1
      fi
      ;;
  esac
done
printf '#!/bin/sh\ncat\n' > "$out"
chmod +x "$out"
"#;

/// Write the stand-in compiler into `dir` and return its command string.
pub fn fake_compiler(dir: &Path) -> String {
    let script = dir.join("fakecc.sh");
    std::fs::write(&script, FAKE_CC).unwrap();
    format!("sh {}", script.display())
}

/// Create an executable shell script at `path`.
///
/// The file is written by a child process so this process never holds a
/// writable descriptor to something it later executes (ETXTBSY).
pub fn make_executable(path: &Path, body: &str) {
    let staging = path.with_extension("body");
    std::fs::write(&staging, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let status = Command::new("sh")
        .arg("-c")
        .arg("cp \"$0\" \"$1\" && chmod +x \"$1\"")
        .arg(&staging)
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success());
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub fn test_deadline() -> DateTime<FixedOffset> {
    parse_deadline("2017-07-31T00:00:00-05:00").unwrap()
}

/// Configuration rooted at `root` with the stand-in compiler.
pub fn test_config(root: &Path) -> Config {
    let tools = root.join("tools");
    std::fs::create_dir_all(&tools).unwrap();

    Config {
        paths: PathsConfig {
            course_dir: root.join("course"),
            roster_path: root.join("course/roster.json"),
            support_dir: root.join("support_files"),
            results_dir: root.join("results"),
        },
        grading: GradingConfig {
            deadline: Some(test_deadline()),
            compiler: fake_compiler(&tools),
            ..GradingConfig::default()
        },
        course: CourseConfig {
            name: "CS240".to_string(),
            grader_email: "grader@cs.umb.edu".to_string(),
            ..CourseConfig::default()
        },
    }
}

/// Lay out support files for `hw1` with the given fixtures.
pub fn write_support(config: &Config, required: &[&str], fixtures: &[(&str, &str, &str)]) {
    let paths = &config.paths;
    write_file(&paths.grading_criteria("hw1"), "Correctness: 10 pts");
    write_file(&paths.required_files("hw1"), &format!("{}\n", required.join("\n")));
    std::fs::create_dir_all(paths.input_fixtures("hw1")).unwrap();
    std::fs::create_dir_all(paths.output_fixtures("hw1")).unwrap();
    for (name, input, expected) in fixtures {
        write_file(&paths.input_fixtures("hw1").join(name), input);
        write_file(&paths.output_fixtures("hw1").join(name), expected);
    }
}

/// Submit `files` for `student` under `hw1`.
pub fn write_submission(config: &Config, student: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = config.paths.submission_dir(student, "hw1");
    std::fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        write_file(&dir.join(name), contents);
    }
    dir
}
