use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use thiserror::Error;

const FIELD_CODES: [&str; 9] = ["%f", "%F", "%u", "%U", "%d", "%D", "%i", "%c", "%k"];

/// Container runtime properties mirrored by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeProperty {
    Uevent,
    Suspend,
}

impl RuntimeProperty {
    pub const ALL: [Self; 2] = [Self::Uevent, Self::Suspend];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uevent => "uevent",
            Self::Suspend => "suspend",
        }
    }
}

#[derive(Debug, Error)]
pub enum HelperError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read output of {command}: {source}")]
    Output {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with status: {status}")]
    CommandFailed { command: String, status: ExitStatus },
    #[error("invalid command line {command:?}: {message}")]
    InvalidCommandLine { command: String, message: String },
}

pub type HelperResult<T> = std::result::Result<T, HelperError>;

/// The `waydroid` command-line tool.
pub trait HelperTool: Send + Sync {
    /// First line printed by `prop get <name>`.
    fn get_property(&self, property: RuntimeProperty) -> HelperResult<String>;
    fn set_property(&self, property: RuntimeProperty, value: bool) -> HelperResult<()>;
    /// Runs `app install <apk>` to completion and reports how it exited.
    fn install_app(&self, apk: &Path) -> HelperResult<ExitStatus>;
}

/// Starts a desktop-entry style command line without waiting for it.
pub trait CommandLauncher: Send + Sync {
    fn launch(&self, command_line: &str) -> HelperResult<()>;
}

pub fn parse_property_line(line: &str) -> bool {
    line.contains("true")
}

/// Splits a desktop `Exec` line into argv; field codes are dropped and `%%` becomes `%`.
pub fn exec_argv(command_line: &str) -> HelperResult<Vec<String>> {
    let words = shlex::split(command_line).ok_or_else(|| HelperError::InvalidCommandLine {
        command: command_line.to_string(),
        message: "unbalanced quoting".to_string(),
    })?;
    Ok(words
        .into_iter()
        .filter(|word| !FIELD_CODES.contains(&word.as_str()))
        .map(|word| word.replace("%%", "%"))
        .collect())
}

#[derive(Debug, Clone)]
pub struct WaydroidCli {
    program: PathBuf,
}

impl WaydroidCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args).env_clear().stdin(Stdio::null());
        command
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program.display(), args.join(" "))
    }

    fn spawn(&self, args: &[&str], stdout: Stdio) -> HelperResult<Child> {
        self.command(args)
            .stdout(stdout)
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HelperError::Spawn {
                command: self.describe(args),
                source,
            })
    }
}

impl HelperTool for WaydroidCli {
    fn get_property(&self, property: RuntimeProperty) -> HelperResult<String> {
        let args = ["prop", "get", property.as_str()];
        let mut child = self.spawn(&args, Stdio::piped())?;

        let mut line = String::new();
        let read = match child.stdout.take() {
            Some(stdout) => BufReader::new(stdout).read_line(&mut line),
            None => Ok(0),
        };
        reap(&mut child, &self.describe(&args));
        read.map_err(|source| HelperError::Output {
            command: self.describe(&args),
            source,
        })?;

        Ok(line)
    }

    fn set_property(&self, property: RuntimeProperty, value: bool) -> HelperResult<()> {
        let value = if value { "true" } else { "false" };
        let args = ["prop", "set", property.as_str(), value];
        let mut child = self.spawn(&args, Stdio::null())?;
        reap(&mut child, &self.describe(&args));
        Ok(())
    }

    fn install_app(&self, apk: &Path) -> HelperResult<ExitStatus> {
        let apk = apk.to_string_lossy();
        let args = ["app", "install", apk.as_ref()];
        let mut child = self.spawn(&args, Stdio::null())?;
        child.wait().map_err(|source| HelperError::Output {
            command: self.describe(&args),
            source,
        })
    }
}

/// Exit codes of helper calls aren't acted on; they're only logged.
fn reap(child: &mut Child, command: &str) {
    match child.wait() {
        Ok(status) if !status.success() => {
            tracing::debug!(command, %status, "helper exited unsuccessfully");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(command, ?err, "failed to wait for helper"),
    }
}

#[derive(Debug, Default)]
pub struct SpawnLauncher;

impl CommandLauncher for SpawnLauncher {
    fn launch(&self, command_line: &str) -> HelperResult<()> {
        let argv = exec_argv(command_line)?;
        let Some((program, args)) = argv.split_first() else {
            return Err(HelperError::InvalidCommandLine {
                command: command_line.to_string(),
                message: "empty command".to_string(),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| HelperError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        let command = command_line.to_string();
        std::thread::spawn(move || reap(&mut child, &command));
        Ok(())
    }
}

/// Runs a shell snippet once and returns its trimmed stdout.
pub fn run_shell_sync(script: &str) -> HelperResult<String> {
    let output = Command::new("sh")
        .args(["-c", script])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| HelperError::Spawn {
            command: script.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(HelperError::CommandFailed {
            command: script.to_string(),
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
