use crate::config::DebugConfig;
use crate::error::{DebugError, Result};
use log::debug;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub passed: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl RenderOutcome {
    pub fn from_exit(exit_code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            passed: exit_code == 0,
            exit_code,
            stdout,
            stderr,
            duration_ms,
        }
    }

    /// The lines of stderr that carry the actual error, or all of it.
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            return String::new();
        }
        let error_lines: Vec<&str> = stderr
            .lines()
            .filter(|l| l.contains("Error:") || l.contains("error:") || l.contains("template:"))
            .collect();
        if error_lines.is_empty() {
            stderr.to_string()
        } else {
            error_lines.join("\n")
        }
    }
}

/// Runs the external render command against a chart directory.
pub trait Renderer {
    fn execute(&self, chart_root: &Path) -> Result<RenderOutcome>;
}

/// `helm template <release> <chart> [-f ..] [--set ..] [extra..]`
#[derive(Debug, Clone)]
pub struct HelmCommand {
    helm_path: PathBuf,
    release_name: String,
    values_files: Vec<PathBuf>,
    set_values: Vec<String>,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl HelmCommand {
    pub fn new(helm_path: PathBuf, config: &DebugConfig) -> Self {
        Self {
            helm_path,
            release_name: config.release_name.clone(),
            values_files: config.values_files.clone(),
            set_values: config.set_values.clone(),
            extra_args: config.extra_args.clone(),
            timeout: config.timeout,
        }
    }

    pub fn args(&self, chart_root: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "template".into(),
            self.release_name.clone().into(),
            chart_root.as_os_str().to_owned(),
        ];
        for values_file in &self.values_files {
            args.push("-f".into());
            args.push(values_file.as_os_str().to_owned());
        }
        for set_val in &self.set_values {
            args.push("--set".into());
            args.push(set_val.into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }
}

impl Renderer for HelmCommand {
    fn execute(&self, chart_root: &Path) -> Result<RenderOutcome> {
        let mut cmd = Command::new(&self.helm_path);
        cmd.args(self.args(chart_root));
        run_with_timeout(cmd, self.timeout)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Run a command to completion, capturing both streams. A command still
/// running after `timeout` is killed and reported as a tool error.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<RenderOutcome> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DebugError::HelmNotFound,
            _ => DebugError::RenderSpawn {
                program: program.clone(),
                source,
            },
        })?;

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DebugError::RenderTimeout {
                seconds: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let collect = |h: Option<thread::JoinHandle<String>>| {
        h.and_then(|h| h.join().ok()).unwrap_or_default()
    };
    let stdout = collect(stdout);
    let stderr = collect(stderr);

    let exit_code = status.code().unwrap_or(-1);
    let duration_ms = start.elapsed().as_millis() as u64;
    debug!("{} exited with {} in {} ms", program, exit_code, duration_ms);

    Ok(RenderOutcome::from_exit(exit_code, stdout, stderr, duration_ms))
}

/// Locate `helm`: an explicit path wins, then `PATH`, then common install dirs.
pub fn find_helm_executable(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }

    let helm_cmd = if cfg!(windows) { "helm.exe" } else { "helm" };

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(helm_cmd);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let common = [
        "/usr/local/bin/helm",
        "/usr/bin/helm",
        "C:\\Program Files\\Helm\\helm.exe",
        "C:\\ProgramData\\chocolatey\\bin\\helm.exe",
    ];
    common
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}
