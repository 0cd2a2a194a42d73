//! Backend process execution

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Instant;

use super::timing::ResourceUsage;
use crate::error::{BenchError, BenchResult};

/// A single backend program invocation
#[derive(Debug, Clone)]
pub struct ProgramInvocation {
    /// Executable to spawn
    pub executable: PathBuf,

    /// Arguments passed to the executable
    pub args: Vec<String>,

    /// Working directory of the child
    pub cwd: PathBuf,

    /// Timing artifact path, relative to `cwd`
    pub time_file: Option<PathBuf>,

    /// Whether to persist stdout/stderr to a log file in `cwd`
    pub log: bool,

    /// Log file name prefix (defaults to the executable's file stem)
    pub log_prefix: Option<String>,

    /// Instant after which the child is killed
    pub deadline: Option<Instant>,
}

impl ProgramInvocation {
    /// Create an invocation of `executable` running in `cwd`
    pub fn new(executable: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            time_file: None,
            log: false,
            log_prefix: None,
            deadline: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    /// Record resource usage to `time_file` after the process exits
    pub fn with_time_file(mut self, time_file: impl Into<PathBuf>) -> Self {
        self.time_file = Some(time_file.into());
        self
    }

    /// Persist output to `<prefix>.log`
    pub fn with_log(mut self, log_prefix: Option<&str>) -> Self {
        self.log = true;
        self.log_prefix = log_prefix.map(str::to_string);
        self
    }

    /// Kill the child if it is still running at `deadline`
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Human-readable command line, used in errors and logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn effective_log_prefix(&self) -> String {
        self.log_prefix.clone().unwrap_or_else(|| {
            self.executable
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "program".to_string())
        })
    }
}

/// Output of a finished backend process
#[derive(Debug, Clone)]
pub struct ProgramOutput {
    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Exit code (None if terminated by a signal)
    pub exit_code: Option<i32>,

    /// Resource usage of the child
    pub usage: ResourceUsage,
}

impl ProgramOutput {
    /// Check whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

struct CompletedChild {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    #[cfg(unix)]
    rusage: libc::rusage,
}

/// Run a backend program to completion
///
/// The returned future resolves once the child has exited. A non-zero exit
/// is reported as [`BenchError::BackendExecution`]; the timing artifact and
/// log file are written before that check so failed runs can be inspected.
pub async fn run_program(invocation: &ProgramInvocation) -> BenchResult<ProgramOutput> {
    let command_line = invocation.command_line();

    if !invocation.cwd.is_dir() {
        return Err(BenchError::Io(format!(
            "Working directory {:?} does not exist",
            invocation.cwd
        )));
    }

    tracing::debug!(
        command = %command_line,
        cwd = %invocation.cwd.display(),
        "Spawning backend process"
    );

    // The child runs elsewhere, so a relative executable path must not be
    // resolved against its cwd
    let executable = if invocation.executable.components().count() > 1 {
        absolute_path(&invocation.executable)?
    } else {
        invocation.executable.clone()
    };

    let mut command = Command::new(&executable);
    command
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Own process group, so a timeout also reaches anything the backend forks
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let child = command
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BenchError::BackendNotFound {
                path: invocation.executable.clone(),
            },
            _ => BenchError::io(format!("Failed to spawn `{}`", command_line), e),
        })?;
    let pid = child.id();

    let mut handle = tokio::task::spawn_blocking(move || collect_child(child));

    let joined = match invocation.deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    kill_process_group(pid);
                    // Every pipe writer is gone now; reap before reporting
                    let _ = handle.await;
                    tracing::warn!(command = %command_line, "Backend process timed out");
                    return Err(BenchError::Timeout {
                        command: command_line,
                        elapsed: start.elapsed(),
                    });
                }
            }
        }
        None => handle.await,
    };

    let completed = joined
        .map_err(|e| BenchError::Io(format!("Process reaper failed: {}", e)))?
        .map_err(|e| BenchError::io(format!("Failed to wait for `{}`", command_line), e))?;
    let wall_time = start.elapsed();

    #[cfg(unix)]
    let usage = super::timing::from_rusage(wall_time, &completed.rusage);
    #[cfg(not(unix))]
    let usage = ResourceUsage {
        wall_time,
        ..Default::default()
    };

    let output = ProgramOutput {
        stdout: completed.stdout,
        stderr: completed.stderr,
        exit_code: completed.exit_code,
        usage,
    };

    if let Some(time_file) = &invocation.time_file {
        output
            .usage
            .write_time_file(&invocation.cwd.join(time_file))
            .await?;
    }

    if invocation.log {
        write_log(invocation, &command_line, &output).await?;
    }

    if !output.success() {
        return Err(BenchError::BackendExecution {
            command: command_line,
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}

async fn write_log(
    invocation: &ProgramInvocation,
    command_line: &str,
    output: &ProgramOutput,
) -> BenchResult<()> {
    let log_path = invocation
        .cwd
        .join(format!("{}.log", invocation.effective_log_prefix()));
    let content = format!(
        "$ {}\n--- stdout ---\n{}\n--- stderr ---\n{}\n",
        command_line, output.stdout, output.stderr
    );
    tokio::fs::write(&log_path, content)
        .await
        .map_err(|e| BenchError::io(format!("Failed to write log file {:?}", log_path), e))?;
    tracing::debug!("Wrote log file: {:?}", log_path);
    Ok(())
}

/// Drain both pipes and reap the child, on a blocking thread
fn collect_child(mut child: Child) -> std::io::Result<CompletedChild> {
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let stderr_reader = std::thread::spawn(move || read_pipe(stderr_pipe));
    let stdout = read_pipe(stdout_pipe);
    let stderr = stderr_reader.join().unwrap_or_default();

    #[cfg(unix)]
    {
        let (exit_code, rusage) = wait_with_rusage(&child)?;
        Ok(CompletedChild {
            stdout,
            stderr,
            exit_code,
            rusage,
        })
    }

    #[cfg(not(unix))]
    {
        let status = child.wait()?;
        Ok(CompletedChild {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(unix)]
fn wait_with_rusage(child: &Child) -> std::io::Result<(Option<i32>, libc::rusage)> {
    let pid = child.id() as libc::pid_t;
    let mut status: libc::c_int = 0;
    // SAFETY: rusage is a plain C struct for which all-zero bytes is a valid value.
    let mut rusage: libc::rusage = unsafe { std::mem::zeroed() };

    loop {
        // SAFETY: pid belongs to a child spawned by this process that has not
        // been reaped yet; status and rusage point to valid, writable memory.
        let ret = unsafe { libc::wait4(pid, &mut status, 0, &mut rusage) };
        if ret == pid {
            break;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }

    let exit_code = if libc::WIFEXITED(status) {
        Some(libc::WEXITSTATUS(status))
    } else {
        None
    };

    Ok((exit_code, rusage))
}

/// SIGKILL the process group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        tracing::warn!("Failed to kill process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(pid: u32) {
    tracing::warn!("Cannot kill process {} on this platform", pid);
}

/// Make `path` absolute against the harness working directory
///
/// Backends run inside their run directory, so paths handed to them must
/// not depend on where the harness was started.
pub fn absolute_path(path: &Path) -> BenchResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| BenchError::io(format!("Failed to resolve path {:?}", path), e))
}

/// Resolve a backend executable at configuration time
///
/// Bare names are searched for in `PATH`; anything containing a path
/// separator must point at an existing file.
pub fn locate_executable(program: &Path) -> BenchResult<PathBuf> {
    let not_found = || BenchError::BackendNotFound {
        path: program.to_path_buf(),
    };

    if program.components().count() > 1 || program.is_absolute() {
        return if program.is_file() {
            Ok(program.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let path_var = std::env::var_os("PATH").ok_or_else(not_found)?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
        .ok_or_else(not_found)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sh(cwd: &Path, script: &str) -> ProgramInvocation {
        ProgramInvocation::new("/bin/sh", cwd).arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let dir = TempDir::new().unwrap();
        let output = run_program(&sh(dir.path(), "echo hello; echo oops >&2"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "oops\n");
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        run_program(&sh(dir.path(), "echo data > created.txt"))
            .await
            .unwrap();
        assert!(dir.path().join("created.txt").exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_backend_execution_error() {
        let dir = TempDir::new().unwrap();
        let err = run_program(&sh(dir.path(), "echo broken >&2; exit 2"))
            .await
            .unwrap_err();
        match err {
            BenchError::BackendExecution {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(2));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_backend_not_found() {
        let dir = TempDir::new().unwrap();
        let invocation = ProgramInvocation::new(dir.path().join("no-such-binary"), dir.path());
        let err = run_program(&invocation).await.unwrap_err();
        assert_eq!(err.kind(), "backend_not_found");
    }

    #[tokio::test]
    async fn test_writes_time_file_and_log() {
        let dir = TempDir::new().unwrap();
        let invocation = sh(dir.path(), "echo max-tree-depth 5")
            .with_time_file("train.time")
            .with_log(Some("stub-train"));
        run_program(&invocation).await.unwrap();

        let time_file = std::fs::read_to_string(dir.path().join("train.time")).unwrap();
        assert!(time_file.starts_with("wall-time: "));
        assert!(time_file.contains("max-memory: "));

        let log = std::fs::read_to_string(dir.path().join("stub-train.log")).unwrap();
        assert!(log.contains("max-tree-depth 5"));
    }

    #[tokio::test]
    async fn test_time_file_written_for_failed_run() {
        let dir = TempDir::new().unwrap();
        let invocation = sh(dir.path(), "exit 3").with_time_file("test.time");
        assert!(run_program(&invocation).await.is_err());
        assert!(dir.path().join("test.time").exists());
    }

    #[tokio::test]
    async fn test_deadline_kills_child() {
        let dir = TempDir::new().unwrap();
        let invocation = sh(dir.path(), "exec sleep 30")
            .with_deadline(Some(Instant::now() + Duration::from_millis(200)));
        let started = Instant::now();
        let err = run_program(&invocation).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_deadline_kills_forked_descendants() {
        let dir = TempDir::new().unwrap();
        // sh stays the parent here and sleep keeps the output pipes open
        let invocation = sh(dir.path(), "sleep 30; echo done")
            .with_deadline(Some(Instant::now() + Duration::from_millis(200)));
        let started = Instant::now();
        let err = run_program(&invocation).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_relative_executable_resolved_against_harness_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let scripts = TempDir::new_in(&cwd).unwrap();
        let run_dir = TempDir::new().unwrap();
        let script = scripts.path().join("stub.sh");
        std::fs::write(&script, "#!/bin/sh\necho relative-ok\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let relative = script.strip_prefix(&cwd).unwrap().to_path_buf();
        assert!(relative.is_relative());
        let output = run_program(&ProgramInvocation::new(relative, run_dir.path()))
            .await
            .unwrap();
        assert_eq!(output.stdout, "relative-ok\n");
    }

    #[test]
    fn test_absolute_path() {
        let resolved = absolute_path(Path::new("data/train.bin")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data/train.bin"));
    }

    #[test]
    fn test_locate_executable() {
        assert!(locate_executable(Path::new("sh")).is_ok());
        assert!(locate_executable(Path::new("/bin/sh")).is_ok());
        let err = locate_executable(Path::new("definitely-not-a-real-binary-xyz")).unwrap_err();
        assert_eq!(err.kind(), "backend_not_found");
    }

    #[test]
    fn test_command_line() {
        let invocation = ProgramInvocation::new("/opt/balsa/balsa_train", "/tmp")
            .args(["-c", "10"])
            .arg(4);
        assert_eq!(invocation.command_line(), "/opt/balsa/balsa_train -c 10 4");
    }
}
