//! Recording mock engine shared by the integration tests.
//!
//! `MockFactory` stands in for a resource's session layer; every session it
//! opens records its calls into the factory's [`Probe`] so tests can assert
//! exactly which operations reached which resource. Statements named
//! `"boom"` fail, and [`FailureMode`] injects commit/rollback/close/open
//! failures.

use multitx::{ExecutorType, IsolationLevel, Params, Session, SessionFactory, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenDefault,
    OpenWith(IsolationLevel, ExecutorType),
    SelectOne(String),
    SelectList(String),
    SelectMap(String),
    Insert(String),
    Update(String),
    Delete(String),
    Flush,
    ClearCache,
    Commit { force: bool },
    Rollback { force: bool },
    Close,
}

/// Shared view on a factory's recorded events.
#[derive(Clone, Default)]
pub struct Probe(Arc<Mutex<Vec<Event>>>);

impl Probe {
    fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|&e| e == wanted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

#[derive(Clone, Copy, Default)]
pub struct FailureMode {
    pub on_open: bool,
    pub on_commit: bool,
    pub on_rollback: bool,
    pub on_close: bool,
}

pub struct MockFactory {
    pub probe: Probe,
    failures: FailureMode,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Self::with_failures(FailureMode::default())
    }

    pub fn with_failures(failures: FailureMode) -> Arc<Self> {
        Arc::new(Self {
            probe: Probe::default(),
            failures,
        })
    }

    fn session(&self) -> MockSession {
        MockSession {
            probe: self.probe.clone(),
            failures: self.failures,
        }
    }
}

impl SessionFactory for MockFactory {
    fn open_session(&self) -> anyhow::Result<Box<dyn Session>> {
        if self.failures.on_open {
            anyhow::bail!("injected open failure");
        }
        self.probe.record(Event::OpenDefault);
        Ok(Box::new(self.session()))
    }

    fn open_session_with(
        &self,
        isolation: IsolationLevel,
        executor_type: ExecutorType,
    ) -> anyhow::Result<Box<dyn Session>> {
        if self.failures.on_open {
            anyhow::bail!("injected open failure");
        }
        self.probe.record(Event::OpenWith(isolation, executor_type));
        Ok(Box::new(self.session()))
    }
}

struct MockSession {
    probe: Probe,
    failures: FailureMode,
}

impl MockSession {
    fn check(&self, statement: &str) -> anyhow::Result<()> {
        if statement == "boom" {
            anyhow::bail!("injected statement failure");
        }
        Ok(())
    }
}

impl Session for MockSession {
    fn select_one(&mut self, statement: &str, _params: Params) -> anyhow::Result<Option<Value>> {
        self.probe.record(Event::SelectOne(statement.to_string()));
        self.check(statement)?;
        Ok(Some(Value::from(1)))
    }

    fn select_list(&mut self, statement: &str, _params: Params) -> anyhow::Result<Vec<Value>> {
        self.probe.record(Event::SelectList(statement.to_string()));
        self.check(statement)?;
        Ok(vec![Value::from(1)])
    }

    fn select_map(
        &mut self,
        statement: &str,
        _params: Params,
        _map_key: &str,
    ) -> anyhow::Result<HashMap<String, Value>> {
        self.probe.record(Event::SelectMap(statement.to_string()));
        self.check(statement)?;
        Ok(HashMap::new())
    }

    fn insert(&mut self, statement: &str, _params: Params) -> anyhow::Result<u64> {
        self.probe.record(Event::Insert(statement.to_string()));
        self.check(statement)?;
        Ok(1)
    }

    fn update(&mut self, statement: &str, _params: Params) -> anyhow::Result<u64> {
        self.probe.record(Event::Update(statement.to_string()));
        self.check(statement)?;
        Ok(1)
    }

    fn delete(&mut self, statement: &str, _params: Params) -> anyhow::Result<u64> {
        self.probe.record(Event::Delete(statement.to_string()));
        self.check(statement)?;
        Ok(1)
    }

    fn flush_statements(&mut self) -> anyhow::Result<Vec<u64>> {
        self.probe.record(Event::Flush);
        Ok(Vec::new())
    }

    fn clear_cache(&mut self) {
        self.probe.record(Event::ClearCache);
    }

    fn commit(&mut self, force: bool) -> anyhow::Result<()> {
        self.probe.record(Event::Commit { force });
        if self.failures.on_commit {
            anyhow::bail!("injected commit failure");
        }
        Ok(())
    }

    fn rollback(&mut self, force: bool) -> anyhow::Result<()> {
        self.probe.record(Event::Rollback { force });
        if self.failures.on_rollback {
            anyhow::bail!("injected rollback failure");
        }
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.probe.record(Event::Close);
        if self.failures.on_close {
            anyhow::bail!("injected close failure");
        }
        Ok(())
    }
}
