//! In-memory connections for unit tests.
//!
//! A [`RecordingConnection`] records every statement it is asked to run and
//! answers queries from canned responses matched by substring. Connections
//! opened through a [`RecordingConnector`] share one journal so tests can
//! assert on the interleaving of statements across users.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::{Row, Value};
use crate::error::{DdlError, Result};

/// One executed statement.
#[derive(Debug, Clone)]
pub struct Executed {
    pub user: String,
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct Journal {
    executed: Vec<Executed>,
    connects: usize,
    closes: usize,
    checks_disabled: bool,
}

#[derive(Debug, Clone, Default)]
struct Script {
    responses: Vec<(String, Vec<Row>)>,
    fail_on: Option<String>,
    toggles_constraints: bool,
}

fn lock(journal: &Arc<Mutex<Journal>>) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(|e| e.into_inner())
}

/// Connection that records statements instead of running them.
#[derive(Debug)]
pub struct RecordingConnection {
    settings: DatabaseConfig,
    journal: Arc<Mutex<Journal>>,
    script: Script,
    closed: bool,
}

impl RecordingConnection {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self {
            settings,
            journal: Arc::default(),
            script: Script::default(),
            closed: false,
        }
    }

    /// Answer statements containing `pattern` with `rows`.
    pub fn respond(&mut self, pattern: &str, rows: Vec<Row>) {
        self.script.responses.push((pattern.to_string(), rows));
    }

    /// Fail statements containing `pattern`.
    pub fn fail_on(&mut self, pattern: &str) {
        self.script.fail_on = Some(pattern.to_string());
    }

    /// Report constraint checking as disableable.
    pub fn toggles_constraints(&mut self) {
        self.script.toggles_constraints = true;
    }

    pub fn statements(&self) -> Vec<String> {
        lock(&self.journal)
            .executed
            .iter()
            .map(|e| e.sql.clone())
            .collect()
    }

    pub fn params(&self) -> Vec<Vec<Value>> {
        lock(&self.journal)
            .executed
            .iter()
            .map(|e| e.params.clone())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn checks_disabled(&self) -> bool {
        lock(&self.journal).checks_disabled
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn settings(&self) -> &DatabaseConfig {
        &self.settings
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        lock(&self.journal).executed.push(Executed {
            user: self.settings.user.clone(),
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(pattern) = &self.script.fail_on {
            if sql.contains(pattern.as_str()) {
                return Err(DdlError::Config(format!("statement rejected: {}", pattern)));
            }
        }
        Ok(self
            .script
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn disable_constraint_checking(&mut self) -> Result<bool> {
        if self.script.toggles_constraints {
            lock(&self.journal).checks_disabled = true;
        }
        Ok(self.script.toggles_constraints)
    }

    async fn enable_constraint_checking(&mut self) -> Result<()> {
        lock(&self.journal).checks_disabled = false;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            lock(&self.journal).closes += 1;
        }
        Ok(())
    }
}

/// Connector handing out [`RecordingConnection`]s over a shared journal.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    journal: Arc<Mutex<Journal>>,
    script: Script,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&mut self, pattern: &str) {
        self.script.fail_on = Some(pattern.to_string());
    }

    /// `(user, sql)` pairs in execution order across all connections.
    pub fn executed(&self) -> Vec<(String, String)> {
        lock(&self.journal)
            .executed
            .iter()
            .map(|e| (e.user.clone(), e.sql.clone()))
            .collect()
    }

    pub fn connects(&self) -> usize {
        lock(&self.journal).connects
    }

    pub fn closes(&self) -> usize {
        lock(&self.journal).closes
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, settings: &DatabaseConfig) -> Result<Box<dyn Connection>> {
        lock(&self.journal).connects += 1;
        Ok(Box::new(RecordingConnection {
            settings: settings.clone(),
            journal: Arc::clone(&self.journal),
            script: self.script.clone(),
            closed: false,
        }))
    }
}
