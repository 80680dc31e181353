//! Build step: compile a submission's sources into one executable.
//!
//! The compiler is an external command. Its combined output is scanned for
//! an error marker, and the build only counts as successful when the
//! executable actually exists afterwards. Nothing in here is fatal to a
//! grading run: every problem becomes a failed [`BuildResult`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;

use autograder_common::{BuildResult, RunOutput};

use crate::constants::COMPILER_ERROR_MARKER;
use crate::judge::process::ProcessRunner;
use crate::utils::base_name;

/// Compiler handles the build step of every submission.
pub struct Compiler {
    /// Compiler command, whitespace tokenized
    command: String,
    runner: ProcessRunner,
}

impl Compiler {
    /// Create a new compiler invoking `command` under `timeout`.
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            runner: ProcessRunner::new(timeout),
        }
    }

    /// Compile `sources` into `executable`, passing `flags` through.
    pub async fn compile(&self, sources: &[PathBuf], executable: &Path, flags: &str) -> BuildResult {
        let exe_name = base_name(executable);

        if sources.is_empty() {
            return failure(&exe_name, "no source files to compile");
        }

        // A leftover executable would make a failed build look successful.
        if let Err(e) = remove_stale(executable).await {
            return failure(&exe_name, &format!("could not replace {}: {}", executable.display(), e));
        }

        let invocation = self.invocation(sources, executable, flags);
        tracing::debug!(command = %invocation, "Compiling");

        let output = match self.runner.run(&invocation, None).await {
            Ok(RunOutput::Completed(text)) => text,
            Ok(RunOutput::TimedOut) => {
                tracing::warn!(executable = %executable.display(), "Compiler timed out");
                return failure(
                    &exe_name,
                    &format!(
                        "compiler did not finish within {} seconds",
                        self.runner.timeout().as_secs()
                    ),
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Compiler could not be started");
                return failure(&exe_name, &e.to_string());
            }
        };

        if output.contains(COMPILER_ERROR_MARKER) {
            return failure(&exe_name, &output);
        }

        if !is_executable(executable).await {
            let detail = if output.trim().is_empty() {
                "compiler produced no executable".to_string()
            } else {
                format!("compiler produced no executable\n{}", output)
            };
            return failure(&exe_name, &detail);
        }

        BuildResult::succeeded(format!("COMPILATION SUCCESSFUL ({})\n", exe_name))
    }

    /// `<compiler> <flags> <sources...> -o <executable>`
    fn invocation(&self, sources: &[PathBuf], executable: &Path, flags: &str) -> String {
        let sources = sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let output = executable.display().to_string();
        [
            self.command.as_str(),
            flags,
            sources.as_str(),
            "-o",
            output.as_str(),
        ]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn failure(exe_name: &str, detail: &str) -> BuildResult {
    BuildResult::failed(format!("COMPILATION FAILURE ({})\n{}\n", exe_name, detail))
}

async fn remove_stale(executable: &Path) -> std::io::Result<()> {
    match fs::remove_file(executable).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
