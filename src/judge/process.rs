//! Bounded-time process execution
//!
//! Commands are split on whitespace and executed directly, without a shell.
//! Standard error shares one pipe with standard output so the captured text
//! keeps the interleaving the program produced. Every child is started in
//! its own process group. The group is killed once the program exits or
//! runs out of time, so nothing it spawned outlives the run.

use std::io::Read;
use std::os::fd::OwnedFd;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{pipe2, Pid};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use autograder_common::{GradeError, GradeResult, RunOutput};

/// How long to wait for the capture thread after the group was killed
const DRAIN_GRACE: Duration = Duration::from_secs(1);

type Capture = JoinHandle<std::io::Result<Vec<u8>>>;

/// Runs commands under a fixed wall-clock limit
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Create a runner with the given limit
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command`, optionally feeding `stdin_path` as standard input.
    pub async fn run(&self, command: &str, stdin_path: Option<&Path>) -> GradeResult<RunOutput> {
        run_command(command, stdin_path, self.timeout).await
    }
}

/// Run `command` and capture its combined output.
///
/// The exit status is not inspected. A timeout is reported as
/// [`RunOutput::TimedOut`]; failing to start the program is an error.
pub async fn run_command(
    command: &str,
    stdin_path: Option<&Path>,
    limit: Duration,
) -> GradeResult<RunOutput> {
    let mut tokens = command.split_whitespace();
    let program = tokens.next().ok_or(GradeError::EmptyCommand)?;
    let launch_error = |source: std::io::Error| GradeError::Launch {
        command: command.to_string(),
        source,
    };

    let stdin = match stdin_path {
        Some(path) => Stdio::from(std::fs::File::open(path).map_err(|e| GradeError::fs(path, e))?),
        None => Stdio::null(),
    };

    // Close-on-exec: only the dup'ed stdout/stderr reach the program, so the
    // capture sees EOF once the program and its descendants let go of them.
    let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(|e| launch_error(e.into()))?;
    let stderr_end = write_end.try_clone().map_err(launch_error)?;

    let mut cmd = Command::new(program);
    cmd.args(tokens)
        .stdin(stdin)
        .stdout(Stdio::from(write_end))
        .stderr(Stdio::from(stderr_end))
        .process_group(0)
        .kill_on_drop(true);

    let spawned = cmd.spawn();
    // The command still owns the stdin file and our copies of the pipe's
    // write end; the reader only sees EOF once they are closed.
    drop(cmd);
    let mut child = spawned.map_err(launch_error)?;
    let pid = child.id();
    let started = Instant::now();

    tracing::debug!(command = %command, pid = ?pid, "Spawned process");

    let mut capture: Capture = tokio::task::spawn_blocking(move || read_all(read_end));

    match timeout(limit, child.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            kill_group(pid);
            return Err(launch_error(e));
        }
        Err(_) => return Ok(abandon(command, pid, &mut child, capture, limit).await),
    }

    // Whatever the program left running in its group goes with it.
    kill_group(pid);

    let remaining = limit.saturating_sub(started.elapsed()).max(DRAIN_GRACE);
    match timeout(remaining, &mut capture).await {
        Ok(joined) => {
            let bytes = joined
                .map_err(std::io::Error::other)
                .and_then(|read| read)
                .map_err(launch_error)?;
            tracing::debug!(
                command = %command,
                elapsed_ms = started.elapsed().as_millis() as u64,
                bytes = bytes.len(),
                "Process completed"
            );
            Ok(RunOutput::Completed(String::from_utf8_lossy(&bytes).into_owned()))
        }
        // Output held open by something outside the group
        Err(_) => Ok(abandon(command, pid, &mut child, capture, limit).await),
    }
}

/// Kill everything left of the run and report a timeout.
async fn abandon(
    command: &str,
    pid: Option<u32>,
    child: &mut Child,
    capture: Capture,
    limit: Duration,
) -> RunOutput {
    kill_group(pid);
    // Reap the group leader so no zombie remains.
    let _ = child.kill().await;
    let _ = timeout(DRAIN_GRACE, capture).await;
    tracing::warn!(
        command = %command,
        limit_ms = limit.as_millis() as u64,
        "Process timed out and was killed"
    );
    RunOutput::TimedOut
}

fn read_all(fd: OwnedFd) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::from(fd);
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// SIGKILL every process in the child's group.
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, error = %e, "Failed to kill process group"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(5);

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        format!("sh {}", path.display())
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let out = run_command("echo hello world", None, LIMIT).await.unwrap();
        assert_eq!(out, RunOutput::Completed("hello world\n".to_string()));
    }

    #[tokio::test]
    async fn test_redirects_stdin_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("case1");
        std::fs::write(&input, "3 4\n5 6\n").unwrap();

        let out = run_command("cat", Some(&input), LIMIT).await.unwrap();
        assert_eq!(out.text(), Some("3 4\n5 6\n"));
    }

    #[tokio::test]
    async fn test_merges_stderr_into_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = write_script(dir.path(), "both.sh", "echo out\necho err 1>&2\necho done\n");

        let out = run_command(&cmd, None, LIMIT).await.unwrap();
        assert_eq!(out.text(), Some("out\nerr\ndone\n"));
    }

    #[tokio::test]
    async fn test_exit_code_is_ignored() {
        let out = run_command("false", None, LIMIT).await.unwrap();
        assert_eq!(out, RunOutput::Completed(String::new()));
    }

    #[tokio::test]
    async fn test_timeout_marker_text_is_plain_output() {
        let out = run_command("echo __TIMEOUT__", None, LIMIT).await.unwrap();
        assert!(!out.is_timeout());
        assert_eq!(out.text(), Some("__TIMEOUT__\n"));
    }

    #[tokio::test]
    async fn test_times_out() {
        let started = Instant::now();
        let out = run_command("sleep 30", None, Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(out, RunOutput::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// Pid written by a script to `path`.
    fn read_pid(path: &Path) -> i32 {
        std::fs::read_to_string(path).unwrap().trim().parse().unwrap()
    }

    /// Whether `pid` is still running. Zombies count as dead; they only
    /// wait for whoever reaps orphans in this environment.
    fn is_alive(pid: i32) -> bool {
        let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
            return false;
        };
        let state = stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next());
        !matches!(state, Some('Z') | Some('X') | None)
    }

    async fn wait_until_dead(pid: i32) -> bool {
        for _ in 0..40 {
            if !is_alive(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_timeout_kills_spawned_children() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("bg.pid");
        let cmd = write_script(
            dir.path(),
            "fork.sh",
            &format!("echo started\nsleep 30 &\necho $! > {}\nsleep 30\n", pid_file.display()),
        );

        let started = Instant::now();
        let out = run_command(&cmd, None, Duration::from_millis(500))
            .await
            .unwrap();
        assert!(out.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(wait_until_dead(read_pid(&pid_file)).await);
    }

    #[tokio::test]
    async fn test_detached_background_process_does_not_hold_output() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = write_script(
            dir.path(),
            "detach.sh",
            "sleep 30 >/dev/null 2>&1 &\necho done\n",
        );

        let started = Instant::now();
        let out = run_command(&cmd, None, LIMIT).await.unwrap();
        assert_eq!(out, RunOutput::Completed("done\n".to_string()));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_normal_exit_kills_background_children() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("bg.pid");
        // The background sleep inherits the output pipe.
        let cmd = write_script(
            dir.path(),
            "leave.sh",
            &format!("sleep 30 &\necho $! > {}\necho done\n", pid_file.display()),
        );

        let started = Instant::now();
        let out = run_command(&cmd, None, LIMIT).await.unwrap();
        assert_eq!(out, RunOutput::Completed("done\n".to_string()));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(wait_until_dead(read_pid(&pid_file)).await);
    }

    #[tokio::test]
    async fn test_launch_failure_is_an_error() {
        let err = run_command("no-such-program-for-autograder", None, LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_empty_command() {
        let err = run_command("   ", None, LIMIT).await.unwrap_err();
        assert!(matches!(err, GradeError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_missing_stdin_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command("cat", Some(&dir.path().join("absent")), LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Filesystem { .. }));
    }

    #[tokio::test]
    async fn test_runner_uses_its_limit() {
        let runner = ProcessRunner::new(Duration::from_millis(200));
        assert_eq!(runner.timeout(), Duration::from_millis(200));
        assert!(runner.run("sleep 10", None).await.unwrap().is_timeout());
    }
}
