use std::fs::File;
use std::io::{self, stderr, Read, Stderr, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};

use super::Error;

/// What a successful tool run left behind.
#[derive(Debug)]
pub struct ToolOutput {
    /// Captured stdout, unless it was redirected to a file.
    pub stdout: Option<String>,
    /// Captured stderr (diagnostics).
    pub stderr: String,
}

/// Run `cmd` to completion, blocking until it exits.
///
/// Stdout goes to `stdout_file` if given, otherwise it is captured.
/// Stderr is always captured, and also echoed to our stderr if `echo` is set.
/// A missing executable is reported as [`Error::ToolNotFound`], a non-zero exit
/// as [`Error::ToolFailed`] carrying the captured stderr.
/// Based on:
/// <https://stackoverflow.com/questions/66060139/how-to-tee-stdout-stderr-from-a-subprocess-in-rust>
pub fn run_cmd(
    tool: &'static str,
    cmd: &mut Command,
    stdout_file: Option<File>,
    echo: bool,
) -> Result<ToolOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!(
        "Running {tool}: {program} {}",
        cmd.get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let spawned = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::ToolNotFound { tool, program }.into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to execute {tool} \"{program}\""));
        }
    };

    let child_out = child.stdout.take().ok_or(Error::NoPipe("stdout"))?;
    let child_err = child.stderr.take().ok_or(Error::NoPipe("stderr"))?;

    let out_sink = match stdout_file {
        Some(f) => Sink::File(f),
        None => Sink::Buffer(Vec::with_capacity(4096)),
    };
    let err_sink = Sink::Buffer(Vec::with_capacity(1024));

    let thread_out = thread::spawn(move || communicate(child_out, out_sink, None));
    let thread_err =
        thread::spawn(move || communicate(child_err, err_sink, echo.then(stderr)));

    let out_sink = thread_out
        .join()
        .map_err(|_| Error::Communicate("stdout"))?
        .with_context(|| format!("reading {tool} stdout"))?;
    let err_sink = thread_err
        .join()
        .map_err(|_| Error::Communicate("stderr"))?
        .with_context(|| format!("reading {tool} stderr"))?;

    let status = child
        .wait()
        .with_context(|| format!("waiting on {tool} process"))?;
    let stderr = err_sink.into_text().unwrap_or_default();

    log::debug!("{tool} finished with {status}");
    if !status.success() {
        return Err(Error::ToolFailed {
            tool,
            status,
            stderr,
        }
        .into());
    }

    Ok(ToolOutput {
        stdout: out_sink.into_text(),
        stderr,
    })
}

/// Where a child stream ends up.
enum Sink {
    File(File),
    Buffer(Vec<u8>),
}

impl Sink {
    fn into_text(self) -> Option<String> {
        match self {
            Self::File(_) => None,
            Self::Buffer(buf) => Some(String::from_utf8_lossy(&buf).into_owned()),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::File(f) => f.write(buf),
            Self::Buffer(v) => v.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(f) => f.flush(),
            Self::Buffer(_) => Ok(()),
        }
    }
}

fn communicate<R: Read>(mut stream: R, mut sink: Sink, mut echo: Option<Stderr>) -> io::Result<Sink> {
    let mut buf = [0u8; 4096];
    loop {
        let num_read = stream.read(&mut buf)?;
        if num_read == 0 {
            break;
        }

        let buf = &buf[..num_read];
        sink.write_all(buf)?;
        if let Some(echo) = echo.as_mut() {
            echo.write_all(buf)?;
        }
    }
    sink.flush()?;
    Ok(sink)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable() {
        let mut cmd = Command::new("/nonexistent/bin/aligner");
        let err = run_cmd("MAFFT", &mut cmd, None, false).unwrap_err();
        assert!(Error::is_not_found(&err));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo bad input >&2; exit 3");
        let err = run_cmd("MAFFT", &mut cmd, None, false).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::ToolFailed { stderr, status, .. }) => {
                assert_eq!(stderr, "bad input\n");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_captures_output() -> Result<()> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo aligned; echo progress >&2");
        let out = run_cmd("MAFFT", &mut cmd, None, false)?;
        assert_eq!(out.stdout.as_deref(), Some("aligned\n"));
        assert_eq!(out.stderr, "progress\n");
        Ok(())
    }

    #[test]
    fn test_stdout_to_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.txt");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("printf '>a\\nAC\\n'");
        let out = run_cmd("MAFFT", &mut cmd, Some(File::create(&path)?), false)?;
        assert!(out.stdout.is_none());
        assert_eq!(std::fs::read_to_string(&path)?, ">a\nAC\n");
        Ok(())
    }
}
