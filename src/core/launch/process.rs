// ─── Process Supervisor ───
// Spawns the game, merges stdout and stderr into one line stream and waits
// for the exit code.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::pipeline::LaunchReporter;

use super::command::LaunchCommand;

/// Prefix separating game output from launcher log lines.
pub const GAME_LINE_PREFIX: &str = "[MC] ";

const LINE_BUFFER: usize = 256;

/// Combined stdout/stderr of a running game, one line at a time.
///
/// Finite and not restartable: once both streams reach end-of-file
/// [`OutputLines::next_line`] keeps returning `None`.
pub struct OutputLines {
    rx: mpsc::Receiver<String>,
}

impl OutputLines {
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// How supervision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    /// The process was killed because the launch was cancelled.
    pub killed: bool,
}

pub struct GameProcess {
    child: Child,
    pid: Option<u32>,
    lines: OutputLines,
}

impl GameProcess {
    /// Spawns `command` in its working directory with piped output.
    pub fn spawn(command: &LaunchCommand) -> LauncherResult<Self> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Spawning: {}", command.display());
        let mut child = cmd.spawn().map_err(|source| LauncherError::ProcessSpawn {
            program: command.program.to_string_lossy().to_string(),
            source,
        })?;
        let pid = child.id();

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        info!("Game process started (PID {:?})", pid);
        Ok(Self {
            child,
            pid,
            lines: OutputLines { rx },
        })
    }

    /// Platform process id; `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn lines(&mut self) -> &mut OutputLines {
        &mut self.lines
    }

    /// Forwards output to `reporter` until end-of-stream, then waits for exit.
    ///
    /// On cancellation the child is killed when `kill_on_cancel` is set and
    /// the remaining output is still drained. Otherwise supervision stops,
    /// the child keeps running and [`LauncherError::Cancelled`] is returned.
    pub async fn supervise(
        mut self,
        reporter: &dyn LaunchReporter,
        cancel: &CancellationToken,
        kill_on_cancel: bool,
    ) -> LauncherResult<ProcessExit> {
        let mut killed = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled(), if !killed => {
                    if !kill_on_cancel {
                        warn!("Launch cancelled; leaving PID {:?} running", self.pid);
                        return Err(LauncherError::Cancelled);
                    }
                    info!("Launch cancelled; killing PID {:?}", self.pid);
                    if let Err(e) = self.child.start_kill() {
                        warn!("Failed to kill game process: {}", e);
                    }
                    killed = true;
                }
                line = self.lines.next_line() => match line {
                    Some(line) => reporter.log(&format!("{GAME_LINE_PREFIX}{line}")),
                    None => break,
                },
            }
        }

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| LauncherError::Other(format!("waiting for game process: {e}")))?;
        debug!("Game process exited: {:?}", status);
        Ok(ProcessExit {
            code: status.code(),
            killed,
        })
    }
}

async fn forward_lines<R>(stream: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Game output stream closed: {}", e);
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::pipeline::RecordingReporter;

    fn shell(script: &str) -> LaunchCommand {
        LaunchCommand::new(
            "/bin/sh",
            vec!["-c".into(), script.into()],
            std::env::temp_dir(),
        )
    }

    #[tokio::test]
    async fn output_is_prefixed_and_exit_code_reported() {
        let process = GameProcess::spawn(&shell("echo hello; echo oops 1>&2; exit 3")).unwrap();
        assert!(process.pid().is_some());

        let reporter = RecordingReporter::new();
        let exit = process
            .supervise(&reporter, &CancellationToken::new(), true)
            .await
            .unwrap();

        assert_eq!(exit, ProcessExit { code: Some(3), killed: false });
        let mut logs = reporter.logs();
        logs.sort();
        assert_eq!(logs, vec!["[MC] hello".to_string(), "[MC] oops".to_string()]);
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let process = GameProcess::spawn(&shell("echo started; exec sleep 30")).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let exit = process
            .supervise(&RecordingReporter::new(), &cancel, true)
            .await
            .unwrap();
        assert!(exit.killed);
        assert_ne!(exit.code, Some(0));
    }

    #[tokio::test]
    async fn cancellation_without_kill_detaches() {
        let process = GameProcess::spawn(&shell("exec sleep 30")).unwrap();
        let pid = process.pid();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = process
            .supervise(&RecordingReporter::new(), &cancel, false)
            .await;
        assert!(matches!(result, Err(LauncherError::Cancelled)));

        if let Some(pid) = pid {
            let _ = std::process::Command::new("kill").arg(pid.to_string()).status();
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let command = LaunchCommand::new("/definitely/not/java", vec![], std::env::temp_dir());
        assert!(matches!(
            GameProcess::spawn(&command),
            Err(LauncherError::ProcessSpawn { .. })
        ));
    }
}
