//! Player driver: supervises one external player process at a time.
//!
//! ```text
//!   Controller ── play/pause/mute/... ──► MPlayerDriver ── stdin bytes ──► player
//!                                              │
//!                                              └── stdout ──► handoff ──► status reader
//! ```
//!
//! The player is controlled through its slave-less keyboard interface: one
//! raw byte per command on stdin, no acknowledgement.  Status comes back as
//! plain text lines on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use wavedial_proto::config::PlayerConfig;
use wavedial_proto::platform;

use crate::handoff::{self, PipeReceiver, PipeSender};

/// URL suffixes that make the player treat the target as a playlist file.
const PLAYLIST_SUFFIXES: [&str; 2] = [".m3u", ".pls"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0} not found")]
    ExecutableNotFound(String),
    #[error("cannot start {executable}: {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot map {executable} {pipe}")]
    Pipe {
        executable: String,
        pipe: &'static str,
    },
}

/// Single-byte commands understood by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Quit,
    Mute,
    Pause,
    VolumeUp,
    VolumeDown,
}

impl ControlKey {
    pub fn byte(self) -> u8 {
        match self {
            Self::Quit => b'q',
            Self::Mute => b'm',
            Self::Pause => b'p',
            Self::VolumeUp => b'*',
            Self::VolumeDown => b'/',
        }
    }
}

/// Control surface the controller drives.
///
/// `play` hands the new process's output to whoever holds `pipe_channel()`
/// and waits for it to be taken, so it must never be called from the task
/// draining that channel.
pub trait Driver {
    fn check_prerequisites(&self) -> Result<(), DriverError>;

    async fn play(&mut self, url: &str) -> Result<(), DriverError>;

    async fn pause(&mut self);

    async fn mute(&mut self);

    async fn inc_volume(&mut self);

    async fn dec_volume(&mut self);

    /// Stop the player.  Idempotent; a no-op when idle.
    async fn close(&mut self);

    /// The output hand-off receiver.  Only the first call returns it.
    fn pipe_channel(&mut self) -> Option<PipeReceiver>;

    fn state(&self) -> &PlaybackState;
}

/// Arguments for one invocation of the player.
pub fn play_args(url: &str, extra_args: &[String]) -> Vec<String> {
    let mut args: Vec<String> = extra_args.to_vec();
    args.push("-quiet".to_string());
    if is_playlist_url(url) {
        args.push("-playlist".to_string());
    }
    args.push(url.to_string());
    args
}

pub fn is_playlist_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    PLAYLIST_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

// ── process handle ────────────────────────────────────────────────────────────

/// One running player invocation.  The stdout half is handed off separately.
struct ProcessHandle {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ProcessHandle {
    fn spawn(
        executable: &str,
        program: &Path,
        args: &[String],
    ) -> Result<(Self, ChildStdout), DriverError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DriverError::Spawn {
                executable: executable.to_string(),
                source,
            })?;

        let pipe_err = |pipe| DriverError::Pipe {
            executable: executable.to_string(),
            pipe,
        };
        let stdin = child.stdin.take().ok_or_else(|| pipe_err("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| pipe_err("stdout"))?;

        Ok((
            Self {
                child,
                stdin: Some(stdin),
            },
            stdout,
        ))
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn send_key(&mut self, key: ControlKey) -> std::io::Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(());
        };
        stdin.write_all(&[key.byte()]).await?;
        stdin.flush().await
    }

    /// Ask the player to quit, close its input, then kill and reap it.
    async fn terminate(mut self) {
        if let Err(e) = self.send_key(ControlKey::Quit).await {
            debug!("player: quit key not delivered: {}", e);
        }
        drop(self.stdin.take());

        // kill() also waits, so the process is reaped once this returns.
        if let Err(e) = self.child.kill().await {
            debug!("player: kill failed ({}), waiting for exit", e);
            let _ = self.child.wait().await;
        }
    }
}

// ── driver ────────────────────────────────────────────────────────────────────

pub struct MPlayerDriver {
    executable: String,
    /// Where `executable` was found; `None` when it cannot be resolved.
    resolved: Option<PathBuf>,
    extra_args: Vec<String>,
    state: PlaybackState,
    process: Option<ProcessHandle>,
    pipe_tx: PipeSender,
    pipe_rx: Option<PipeReceiver>,
}

impl MPlayerDriver {
    pub fn new(config: &PlayerConfig) -> Self {
        Self::with_args(&config.executable, config.extra_args.clone())
    }

    pub fn with_args(executable: &str, extra_args: Vec<String>) -> Self {
        let (pipe_tx, pipe_rx) = handoff::channel();
        Self {
            executable: executable.to_string(),
            resolved: platform::resolve_executable(executable),
            extra_args,
            state: PlaybackState::Idle,
            process: None,
            pipe_tx,
            pipe_rx: Some(pipe_rx),
        }
    }

    /// OS process id of the running player, if any.
    #[cfg(test)]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(ProcessHandle::pid)
    }

    async fn send_key(&mut self, key: ControlKey) {
        if self.state == PlaybackState::Idle {
            return;
        }
        if let Some(process) = self.process.as_mut() {
            if let Err(e) = process.send_key(key).await {
                warn!("player: cannot send {:?}: {}", key, e);
            }
        }
    }
}

impl Driver for MPlayerDriver {
    fn check_prerequisites(&self) -> Result<(), DriverError> {
        match &self.resolved {
            Some(path) => {
                info!("player: using {:?}", path);
                Ok(())
            }
            None => Err(DriverError::ExecutableNotFound(self.executable.clone())),
        }
    }

    async fn play(&mut self, url: &str) -> Result<(), DriverError> {
        if let PlaybackState::Playing(current) = &self.state {
            if current == url {
                debug!("player: already playing {}", url);
                return Ok(());
            }
            self.close().await;
        }

        let args = play_args(url, &self.extra_args);
        info!("player: starting {} {}", self.executable, args.join(" "));
        let program = self
            .resolved
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.executable));
        let (process, stdout) = ProcessHandle::spawn(&self.executable, &program, &args)?;
        debug!("player: pid {:?}", process.pid());

        self.process = Some(process);
        self.state = PlaybackState::Playing(url.to_string());

        if let Err(e) = self.pipe_tx.publish(Box::new(stdout)).await {
            warn!("player: {}; status output is not monitored", e);
        }
        Ok(())
    }

    async fn pause(&mut self) {
        self.send_key(ControlKey::Pause).await;
    }

    async fn mute(&mut self) {
        self.send_key(ControlKey::Mute).await;
    }

    async fn inc_volume(&mut self) {
        self.send_key(ControlKey::VolumeUp).await;
    }

    async fn dec_volume(&mut self) {
        self.send_key(ControlKey::VolumeDown).await;
    }

    async fn close(&mut self) {
        self.state = PlaybackState::Idle;
        let Some(process) = self.process.take() else {
            return;
        };
        info!("player: closing pid {:?}", process.pid());
        process.terminate().await;
    }

    fn pipe_channel(&mut self) -> Option<PipeReceiver> {
        self.pipe_rx.take()
    }

    fn state(&self) -> &PlaybackState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_stream_args() {
        assert_eq!(play_args("http://x/stream", &[]), vec!["-quiet", "http://x/stream"]);
    }

    #[test]
    fn test_playlist_args() {
        assert_eq!(
            play_args("http://x/list.m3u", &[]),
            vec!["-quiet", "-playlist", "http://x/list.m3u"]
        );
        assert_eq!(
            play_args("http://x/LIST.PLS", &["-cache".to_string(), "512".to_string()]),
            vec!["-cache", "512", "-quiet", "-playlist", "http://x/LIST.PLS"]
        );
        assert!(!is_playlist_url("http://x/m3u"));
    }

    #[test]
    fn test_control_bytes() {
        let bytes: Vec<u8> = [
            ControlKey::Quit,
            ControlKey::Mute,
            ControlKey::Pause,
            ControlKey::VolumeUp,
            ControlKey::VolumeDown,
        ]
        .iter()
        .map(|k| k.byte())
        .collect();
        assert_eq!(bytes, b"qmp*/");
    }

    #[test]
    fn test_missing_executable() {
        let driver = MPlayerDriver::with_args("no-such-player-binary-4711", vec![]);
        assert!(matches!(
            driver.check_prerequisites(),
            Err(DriverError::ExecutableNotFound(name)) if name == "no-such-player-binary-4711"
        ));
    }

    #[tokio::test]
    async fn test_close_when_idle_is_noop() {
        let mut driver = MPlayerDriver::with_args("no-such-player-binary-4711", vec![]);
        driver.close().await;
        driver.pause().await;
        driver.close().await;
        assert_eq!(driver.state(), &PlaybackState::Idle);
        assert!(driver.pid().is_none());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let mut driver = MPlayerDriver::with_args("/nonexistent/player", vec![]);
        let err = driver.play("http://a").await.unwrap_err();
        assert!(matches!(err, DriverError::Spawn { .. }));
        assert_eq!(driver.state(), &PlaybackState::Idle);
    }

    #[test]
    fn test_pipe_channel_taken_once() {
        let mut driver = MPlayerDriver::with_args("mplayer", vec![]);
        assert!(driver.pipe_channel().is_some());
        assert!(driver.pipe_channel().is_none());
    }

    /// Tests against a real child process: `sh -c <script>` stands in for the
    /// player, receiving `-quiet [-playlist] <url>` as its positional args.
    #[cfg(unix)]
    mod process {
        use super::*;
        use std::time::Duration;
        use tokio::io::{AsyncBufReadExt, BufReader};
        use tokio::sync::mpsc;

        const ECHO_ARGS: &str = r#"echo "args: $*"; exec cat > /dev/null"#;
        const ECHO_ONE_KEY: &str =
            r#"echo ready; dd bs=1 count=1 2>/dev/null; echo; exec cat > /dev/null"#;

        fn fake_player(script: &str) -> MPlayerDriver {
            MPlayerDriver::with_args(
                "sh",
                vec!["-c".to_string(), script.to_string(), "fake-player".to_string()],
            )
        }

        /// Forward every output line, plus `<eof>` at the end of each stream.
        fn spawn_line_collector(mut pipes: PipeReceiver) -> mpsc::UnboundedReceiver<String> {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(async move {
                while let Some(stream) = pipes.recv().await {
                    let mut lines = BufReader::new(stream).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let _ = tx.send(line);
                    }
                    let _ = tx.send("<eof>".to_string());
                }
            });
            rx
        }

        async fn next_line(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
            tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for player output")
                .expect("collector stopped")
        }

        #[tokio::test]
        async fn test_play_same_url_twice_starts_one_process() {
            let mut driver = fake_player(ECHO_ARGS);
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());

            driver.play("http://x/a").await.unwrap();
            let pid = driver.pid();
            driver.play("http://x/a").await.unwrap();
            assert_eq!(driver.pid(), pid);
            assert_eq!(driver.state(), &PlaybackState::Playing("http://x/a".into()));

            driver.close().await;
            drop(driver);

            let mut seen = Vec::new();
            while let Ok(Some(line)) =
                tokio::time::timeout(Duration::from_secs(5), lines.recv()).await
            {
                seen.push(line);
            }
            assert_eq!(seen, vec!["args: -quiet http://x/a", "<eof>"]);
        }

        #[tokio::test]
        async fn test_restart_closes_previous_process_first() {
            let mut driver = fake_player(ECHO_ARGS);
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());

            driver.play("http://x/a").await.unwrap();
            let first_pid = driver.pid().unwrap();
            driver.play("http://x/b").await.unwrap();
            let second_pid = driver.pid().unwrap();
            assert_ne!(first_pid, second_pid);

            // The first process was reaped before the second was started.
            #[cfg(target_os = "linux")]
            assert!(!std::path::Path::new(&format!("/proc/{}", first_pid)).exists());

            assert_eq!(next_line(&mut lines).await, "args: -quiet http://x/a");
            assert_eq!(next_line(&mut lines).await, "<eof>");
            assert_eq!(next_line(&mut lines).await, "args: -quiet http://x/b");

            driver.close().await;
            assert_eq!(next_line(&mut lines).await, "<eof>");
            assert_eq!(driver.state(), &PlaybackState::Idle);
        }

        #[tokio::test]
        async fn test_playlist_url_uses_playlist_mode() {
            let mut driver = fake_player(ECHO_ARGS);
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());

            driver.play("http://x/list.m3u").await.unwrap();
            assert_eq!(
                next_line(&mut lines).await,
                "args: -quiet -playlist http://x/list.m3u"
            );

            driver.play("http://x/stream").await.unwrap();
            assert_eq!(next_line(&mut lines).await, "<eof>");
            assert_eq!(next_line(&mut lines).await, "args: -quiet http://x/stream");
            driver.close().await;
        }

        #[tokio::test]
        async fn test_control_key_reaches_player_stdin() {
            let mut driver = fake_player(ECHO_ONE_KEY);
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());

            driver.play("http://x/a").await.unwrap();
            assert_eq!(next_line(&mut lines).await, "ready");

            driver.pause().await;
            assert_eq!(next_line(&mut lines).await, "p");

            driver.close().await;
            driver.close().await;
            assert_eq!(next_line(&mut lines).await, "<eof>");
        }

        #[tokio::test]
        async fn test_player_beside_current_exe_is_launched() {
            let exe = std::env::current_exe().unwrap();
            let name = format!("wavedial-test-player-{}", std::process::id());
            let beside = exe.parent().unwrap().join(&name);
            std::fs::copy("/bin/sh", &beside).unwrap();

            let mut driver = MPlayerDriver::with_args(
                &name,
                vec!["-c".to_string(), ECHO_ARGS.to_string(), "fake-player".to_string()],
            );
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());
            assert!(driver.check_prerequisites().is_ok());

            let played = driver.play("http://x/a").await;
            let first = match &played {
                Ok(()) => Some(next_line(&mut lines).await),
                Err(_) => None,
            };
            driver.close().await;
            std::fs::remove_file(&beside).unwrap();

            assert!(played.is_ok(), "{:?}", played);
            assert_eq!(first.as_deref(), Some("args: -quiet http://x/a"));
        }

        #[tokio::test]
        async fn test_close_after_player_exited() {
            let mut driver = fake_player("echo bye");
            let mut lines = spawn_line_collector(driver.pipe_channel().unwrap());

            driver.play("http://x/a").await.unwrap();
            assert_eq!(next_line(&mut lines).await, "bye");
            assert_eq!(next_line(&mut lines).await, "<eof>");

            // Still Playing as far as the driver knows; closing must not fail.
            driver.mute().await;
            driver.close().await;
            assert_eq!(driver.state(), &PlaybackState::Idle);
        }
    }
}
