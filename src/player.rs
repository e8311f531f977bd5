//! Player hand-off: session state for the now-playing view and the external
//! player process that actually renders the stream.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

use crate::models::ChannelRecord;

/// Now-playing view state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlayerSession {
    #[default]
    Closed,
    Open(ChannelRecord),
    Minimized(ChannelRecord),
}

impl PlayerSession {
    /// Open a channel from any state (replaces whatever was playing)
    pub fn open(&mut self, channel: ChannelRecord) {
        *self = PlayerSession::Open(channel);
    }

    pub fn minimize(&mut self) -> bool {
        match std::mem::take(self) {
            PlayerSession::Open(channel) => {
                *self = PlayerSession::Minimized(channel);
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }

    pub fn restore(&mut self) -> bool {
        match std::mem::take(self) {
            PlayerSession::Minimized(channel) => {
                *self = PlayerSession::Open(channel);
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }

    pub fn close(&mut self) -> bool {
        !matches!(std::mem::take(self), PlayerSession::Closed)
    }

    pub fn channel(&self) -> Option<&ChannelRecord> {
        match self {
            PlayerSession::Open(channel) | PlayerSession::Minimized(channel) => Some(channel),
            PlayerSession::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PlayerSession::Open(_))
    }

    pub fn is_minimized(&self) -> bool {
        matches!(self, PlayerSession::Minimized(_))
    }
}

/// Command-line arguments for the given player
pub fn player_args(player: &str, channel: &ChannelRecord, user_agent: &str) -> Vec<String> {
    let player_lower = player.to_lowercase();
    let title = channel.name.clone();

    if player_lower.contains("ffplay") {
        vec![
            "-window_title".to_string(), title,
            "-user_agent".to_string(), user_agent.to_string(),
            channel.stream_uri.clone(),
        ]
    } else if player_lower.contains("mpv") || player_lower.contains("celluloid") {
        vec![
            format!("--force-media-title={}", title),
            format!("--user-agent={}", user_agent),
            channel.stream_uri.clone(),
        ]
    } else if player_lower.contains("vlc") {
        vec![
            format!("--meta-title={}", title),
            format!("--http-user-agent={}", user_agent),
            channel.stream_uri.clone(),
        ]
    } else {
        // Generic player - just pass URL
        vec![channel.stream_uri.clone()]
    }
}

/// One external player process at a time
#[derive(Default)]
pub struct ExternalPlayer {
    current: Option<Child>,
}

impl ExternalPlayer {
    /// Kill any running player, then launch `player` for the channel.
    /// Returns the new process id.
    pub fn launch(
        &mut self,
        player: &str,
        channel: &ChannelRecord,
        user_agent: &str,
        stderr_lines: Sender<String>,
    ) -> std::io::Result<u32> {
        self.stop();

        let args = player_args(player, channel, user_agent);
        tracing::info!(player, channel = %channel.name, url = %channel.stream_uri, "launching player");

        let mut child = Command::new(player)
            .args(&args)
            .env("USER_AGENT", user_agent)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let pid = child.id();

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                for line in reader.lines().map_while(Result::ok) {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if stderr_lines.send(line).is_err() {
                        break;
                    }
                }
            });
        }

        self.current = Some(child);
        Ok(pid)
    }

    /// Exit code if the running player has finished
    pub fn poll_exit(&mut self) -> Option<Option<i32>> {
        let child = self.current.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                self.current = None;
                Some(status.code())
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll player");
                self.current = None;
                Some(None)
            }
        }
    }

    /// Poll the player and close the session once the process has exited.
    /// Returns the exit code when it did.
    pub fn reap(&mut self, session: &mut PlayerSession) -> Option<Option<i32>> {
        let code = self.poll_exit()?;
        session.close();
        Some(code)
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.current.take() {
            let _ = child.kill();
            let _ = child.wait(); // Reap the process
            tracing::debug!("previous player stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
