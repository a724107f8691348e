//! Scripted executor for collector tests.

use crate::client::SlurmClient;
use camino::Utf8Path;
use schmutz_core::SlurmConfig;
use schmutz_parsers::{CommandExecutor, CommandOutput};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays canned outputs in order and records every invocation.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<(String, CommandOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next call, which must be to `tool`.
    pub fn respond(self, tool: &str, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((tool.to_string(), output));
        self
    }

    pub fn ok(self, tool: &str, stdout: &str) -> Self {
        self.respond(tool, CommandOutput::ok(stdout))
    }

    /// Queue an empty, failing result (e.g. unknown job ID).
    pub fn fail(self, tool: &str) -> Self {
        self.respond(
            tool,
            CommandOutput {
                stdout: String::new(),
                stderr: "Invalid job id specified".to_string(),
                exit_code: 1,
            },
        )
    }

    /// Invocations so far, as "tool arg arg ...".
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl CommandExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        program: &Utf8Path,
        args: &[String],
        _timeout: Option<Duration>,
    ) -> CommandOutput {
        let name = program.file_name().unwrap_or(program.as_str());
        let call = format!("{} {}", name, args.join(" "));
        self.calls.lock().unwrap().push(call.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some((tool, output)) => {
                assert_eq!(tool, name, "unexpected call: {}", call);
                output
            }
            None => panic!("no scripted response for: {}", call),
        }
    }
}

pub fn client(executor: ScriptedExecutor) -> SlurmClient<ScriptedExecutor> {
    SlurmClient::with_executor(&SlurmConfig::default(), executor)
}
