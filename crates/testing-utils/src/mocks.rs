//! Mock implementations for the executor, session and lifecycle traits
//!
//! This module provides in-memory test doubles that can be used for
//! testing the validation engine without a live cluster or SSH access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::time::Instant;
use validator_core::{
    models::FailoverScenario, CommandExecutor, LifecycleAction, RemoteSession, SessionConnector,
    ValidatorError, ValidatorResult,
};

/// A scripted reply for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    SessionLost,
    Fail(String),
}

impl Reply {
    pub fn output<S: Into<String>>(text: S) -> Self {
        Reply::Output(text.into())
    }

    fn into_result(self, command: &str) -> ValidatorResult<String> {
        match self {
            Reply::Output(text) => Ok(text),
            Reply::SessionLost => Err(ValidatorError::SessionLost {
                command: command.to_string(),
            }),
            Reply::Fail(message) => Err(ValidatorError::transport(command, message)),
        }
    }
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Mock command executor answering by command substring
///
/// Rules are matched in insertion order. A rule with several replies hands
/// them out one per call and keeps repeating the last one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<P: Into<String>>(self, pattern: P, reply: Reply) -> Self {
        self.on_sequence(pattern, vec![reply])
    }

    pub fn on_output<P: Into<String>, S: Into<String>>(self, pattern: P, output: S) -> Self {
        self.on(pattern, Reply::output(output))
    }

    pub fn on_sequence<P: Into<String>>(self, pattern: P, replies: Vec<Reply>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.into(),
            replies: replies.into(),
        });
        self
    }

    /// All executed commands in order
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }

    /// Executed commands with the (tokio) instant they were issued
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(command, _)| command.contains(pattern))
            .count()
    }

    fn next_reply(&self, command: &str) -> Option<Reply> {
        let mut rules = self.rules.lock().unwrap();
        let rule = rules.iter_mut().find(|rule| command.contains(&rule.pattern))?;
        if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().cloned()
        }
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), Instant::now()));
        match self.next_reply(command) {
            Some(reply) => reply.into_result(command),
            None => Err(ValidatorError::transport(command, "no scripted response")),
        }
    }
}

/// Mock remote session backed by a scripted executor
#[derive(Debug)]
pub struct MockSession {
    target: String,
    executor: ScriptedExecutor,
    closes: Arc<AtomicUsize>,
}

impl MockSession {
    pub fn new<T: Into<String>>(target: T, executor: ScriptedExecutor) -> Self {
        Self {
            target: target.into(),
            executor,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter incremented on every `close`
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        self.closes.clone()
    }

    fn with_counter(mut self, closes: Arc<AtomicUsize>) -> Self {
        self.closes = closes;
        self
    }
}

#[async_trait]
impl CommandExecutor for MockSession {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        self.executor.execute(command).await
    }
}

impl RemoteSession for MockSession {
    fn target(&self) -> &str {
        &self.target
    }

    fn close(&mut self) -> ValidatorResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock session connector returning scripted sessions per target
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    sessions: Arc<Mutex<HashMap<String, ScriptedExecutor>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target<T: Into<String>>(self, target: T, executor: ScriptedExecutor) -> Self {
        self.sessions.lock().unwrap().insert(target.into(), executor);
        self
    }

    /// Targets passed to `connect`, successful or not
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Number of sessions handed out by this connector that have been closed
    pub fn closed_sessions(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(&self, target: &str) -> ValidatorResult<Box<dyn RemoteSession>> {
        self.attempts.lock().unwrap().push(target.to_string());
        let executor = self.sessions.lock().unwrap().get(target).cloned();
        match executor {
            Some(executor) => Ok(Box::new(
                MockSession::new(target, executor).with_counter(self.closes.clone()),
            )),
            None => Err(ValidatorError::connection(target, "connection refused")),
        }
    }
}

/// Mock lifecycle action recording stop/start calls
#[derive(Debug, Clone)]
pub struct MockLifecycleAction {
    stop_reply: Reply,
    start_reply: Reply,
    stops: Arc<Mutex<Vec<(String, FailoverScenario)>>>,
    starts: Arc<Mutex<Vec<String>>>,
}

impl MockLifecycleAction {
    /// A stop that drops the session, as a real reboot/shutdown does
    pub fn disconnecting() -> Self {
        Self {
            stop_reply: Reply::SessionLost,
            start_reply: Reply::output("started"),
            stops: Arc::new(Mutex::new(Vec::new())),
            starts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_stop_reply(mut self, reply: Reply) -> Self {
        self.stop_reply = reply;
        self
    }

    pub fn with_start_reply(mut self, reply: Reply) -> Self {
        self.start_reply = reply;
        self
    }

    pub fn stops(&self) -> Vec<(String, FailoverScenario)> {
        self.stops.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<String> {
        self.starts.lock().unwrap().clone()
    }
}

impl Default for MockLifecycleAction {
    fn default() -> Self {
        Self::disconnecting()
    }
}

#[async_trait]
impl LifecycleAction for MockLifecycleAction {
    async fn stop(
        &self,
        _session: &dyn CommandExecutor,
        node: &str,
        scenario: FailoverScenario,
    ) -> ValidatorResult<String> {
        self.stops
            .lock()
            .unwrap()
            .push((node.to_string(), scenario));
        self.stop_reply.clone().into_result("stop")
    }

    async fn start(&self, node: &str) -> ValidatorResult<()> {
        self.starts.lock().unwrap().push(node.to_string());
        self.start_reply.clone().into_result("start").map(|_| ())
    }
}
