use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::runner::command_line;
use super::{CommandRunner, Error, Result};

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Failure { status: i32, stderr: String },
}

/// A [`CommandRunner`] that answers from a script keyed by the full command line.
///
/// Several replies for one command are handed out in order; the last one repeats.
/// Unscripted commands fail with exit code 127.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(self, command: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn on(self, command: &str, stdout: &str) -> Self {
        self.push(command, Reply::Output(stdout.to_string()))
    }

    pub(crate) fn fail(self, command: &str, status: i32, stderr: &str) -> Self {
        self.push(
            command,
            Reply::Failure {
                status,
                stderr: stderr.to_string(),
            },
        )
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    fn answer(&self, command: String) -> Result<String> {
        self.calls.lock().unwrap().push(command.clone());
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&command) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply {
            Some(Reply::Output(out)) => Ok(out),
            Some(Reply::Failure { status, stderr }) => Err(Error::CommandFailed {
                command,
                status: Some(status),
                stderr,
            }),
            None => Err(Error::CommandFailed {
                command,
                status: Some(127),
                stderr: "unscripted command".to_string(),
            }),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        self.answer(command_line(program, args))
    }

    async fn run_with_stdin(&self, program: &str, args: &[String], input: &str) -> Result<String> {
        self.inputs.lock().unwrap().push(input.to_string());
        self.answer(command_line(program, args))
    }
}
