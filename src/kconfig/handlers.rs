//! Macro handlers for `$(name,arg,...)` references
//!
//! Handlers are looked up in a [`HandlerTable`] owned by the caller and
//! passed to the preprocessor, so tests can swap in fakes without touching
//! global state. [`HandlerTable::builtin`] registers:
//!
//! | name         | expansion                                              |
//! |--------------|--------------------------------------------------------|
//! | `shell`      | stdout of `sh -c ARGS`, trimmed, newlines as spaces    |
//! | `info`       | logs the text, expands to nothing                      |
//! | `warning-if` | logs the text when the condition is `y`                |
//! | `error-if`   | fails when the condition is `y`                        |
//! | `filename`   | the file being preprocessed                            |
//! | `lineno`     | the line being preprocessed                            |

use super::errors::HandlerError;
use rustc_hash::FxHashMap;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Where a macro is being expanded
#[derive(Debug, Clone, Copy)]
pub struct MacroContext<'a> {
    pub file: &'a str,
    pub line: usize,
}

/// A named macro function.
///
/// `args` are the comma-separated tokens following the handler name,
/// untrimmed.
pub trait MacroHandler: Send + Sync {
    fn expand(&self, ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError>;
}

impl<F> MacroHandler for F
where
    F: Fn(&MacroContext<'_>, &[&str]) -> Result<String, HandlerError> + Send + Sync,
{
    fn expand(&self, ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError> {
        self(ctx, args)
    }
}

/// Registry of handlers by name
#[derive(Default)]
pub struct HandlerTable {
    handlers: FxHashMap<String, Box<dyn MacroHandler>>,
}

impl HandlerTable {
    /// An empty table; only environment lookups will resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard handlers and an unbounded `shell`.
    pub fn builtin() -> Self {
        Self::with_shell(ShellHandler::new())
    }

    /// Standard handlers with a caller-configured `shell`.
    pub fn with_shell(shell: ShellHandler) -> Self {
        let mut table = Self::new();
        table.register("shell", shell);
        table.register("info", info);
        table.register("warning-if", warning_if);
        table.register("error-if", error_if);
        table.register("filename", |ctx: &MacroContext<'_>, _: &[&str]| {
            Ok(ctx.file.to_string())
        });
        table.register("lineno", |ctx: &MacroContext<'_>, _: &[&str]| {
            Ok(ctx.line.to_string())
        });
        table
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: impl MacroHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&dyn MacroHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerTable").field("handlers", &names).finish()
    }
}

/// Runs its arguments through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellHandler {
    shell: String,
    timeout: Option<Duration>,
}

impl ShellHandler {
    pub fn new() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            timeout: None,
        }
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn run(&self, command: &str) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), HandlerError> {
        let spawn_error = |source| HandlerError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let Some(timeout) = self.timeout else {
            let output = child.wait_with_output().map_err(spawn_error)?;
            return Ok((output.status, output.stdout, output.stderr));
        };

        // Drain both pipes off-thread so a chatty child cannot block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait().map_err(spawn_error)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(HandlerError::Timeout {
                        command: command.to_string(),
                        timeout,
                    });
                }
                None => thread::sleep(Duration::from_millis(5)),
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        Ok((status, stdout, stderr))
    }
}

impl Default for ShellHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroHandler for ShellHandler {
    fn expand(&self, _ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError> {
        let command = args.join(",");
        log::debug!("$(shell) running `{}`", command.trim());

        let (status, stdout, stderr) = self.run(&command)?;
        if !status.success() {
            return Err(HandlerError::Subprocess {
                command: command.trim().to_string(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(collapse_output(&String::from_utf8_lossy(&stdout)))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Trim command output and fold its lines into one.
fn collapse_output(output: &str) -> String {
    output
        .trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" ")
}

fn info(ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError> {
    log::info!("{}:{}: {}", ctx.file, ctx.line, args.join(",").trim());
    Ok(String::new())
}

fn split_condition<'a>(args: &[&'a str]) -> (bool, String) {
    let condition = args.first().map(|c| c.trim() == "y").unwrap_or(false);
    let message = args.get(1..).unwrap_or_default().join(",");
    (condition, message.trim().to_string())
}

fn warning_if(ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError> {
    let (condition, message) = split_condition(args);
    if condition {
        log::warn!("{}:{}: {}", ctx.file, ctx.line, message);
    }
    Ok(String::new())
}

fn error_if(_ctx: &MacroContext<'_>, args: &[&str]) -> Result<String, HandlerError> {
    let (condition, message) = split_condition(args);
    if condition {
        return Err(HandlerError::Failed(message));
    }
    Ok(String::new())
}
