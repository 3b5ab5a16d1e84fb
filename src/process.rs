//! GameProcess - Runs the game and streams its output

use crate::{Error, Result};
use log::{debug, warn};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

const CHUNK_SIZE: usize = 1024;

/// Split a command line into the executable and its flags.
///
/// The executable path may contain spaces, so only `" -"` separates
/// arguments: `bin/Shattered Pixel Dungeon -Xmx2g` runs
/// `bin/Shattered Pixel Dungeon` with `-Xmx2g`.
pub fn split_command(cmd: &str) -> (String, Vec<String>) {
    let mut parts = cmd.split(" -");
    let program = parts.next().unwrap_or_default().trim().to_string();
    let args = parts.map(|a| format!("-{}", a.trim())).collect();
    (program, args)
}

/// The game, run from its installation folder
pub struct GameProcess {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl GameProcess {
    /// Prepare `cmd` to run inside `working_dir`
    pub fn new(working_dir: impl AsRef<Path>, cmd: &str) -> Result<Self> {
        let working_dir = working_dir.as_ref().to_path_buf();
        let (program, args) = split_command(cmd);

        if program.is_empty() {
            return Err(Error::Process("no game command configured".to_string()));
        }

        let program = working_dir.join(program);
        if !program.is_file() {
            return Err(Error::Process(format!(
                "game executable not found: {}",
                program.display()
            )));
        }

        Ok(Self {
            program,
            args,
            working_dir,
        })
    }

    /// Run the game to completion.
    ///
    /// Output is echoed to stdout as it arrives, and `on_output` receives
    /// the whole log so far after every chunk. An error from `on_output`
    /// stops the game and is returned.
    pub fn run<F>(&self, mut on_output: F) -> Result<ExitStatus>
    where
        F: FnMut(&str) -> Result<()>,
    {
        debug!("running {} {:?}", self.program.display(), self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Process("game stdout unavailable".to_string()))?;

        let mut echo = io::stdout();
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut pending = Vec::new();
        let mut log = String::new();

        loop {
            let n = match stdout.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            };

            echo.write_all(&buffer[..n])?;
            echo.flush()?;

            pending.extend_from_slice(&buffer[..n]);
            let valid = match std::str::from_utf8(&pending) {
                Ok(s) => s.len(),
                Err(e) if e.error_len().is_some() => {
                    warn!("dropping invalid UTF-8 in game output");
                    log.push_str(&String::from_utf8_lossy(&pending));
                    pending.clear();
                    0
                }
                Err(e) => e.valid_up_to(),
            };
            if valid > 0 {
                // from_utf8 already checked this prefix
                log.push_str(&String::from_utf8_lossy(&pending[..valid]));
                pending.drain(..valid);
            }

            if let Err(e) = on_output(&log) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }

        let status = child.wait()?;
        debug!("game exited with {}", status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_paths_with_spaces() {
        let (program, args) = split_command("bin/Shattered Pixel Dungeon");
        assert_eq!(program, "bin/Shattered Pixel Dungeon");
        assert!(args.is_empty());

        let (program, args) = split_command("bin/Shattered Pixel Dungeon -Xmx2g -debug");
        assert_eq!(program, "bin/Shattered Pixel Dungeon");
        assert_eq!(args, ["-Xmx2g", "-debug"]);
    }

    #[test]
    fn missing_executable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = GameProcess::new(tmp.path(), "bin/game").err().unwrap();
        assert!(matches!(err, Error::Process(_)));
    }

    #[cfg(unix)]
    #[test]
    fn streams_whole_log() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("game.sh");
        std::fs::write(&script, "#!/bin/sh\necho one\necho two\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let game = GameProcess::new(tmp.path(), "game.sh").unwrap();
        let mut last = String::new();
        let status = game
            .run(|log| {
                last = log.to_string();
                Ok(())
            })
            .unwrap();

        assert!(status.success());
        assert_eq!(last, "one\ntwo\n");
    }
}
