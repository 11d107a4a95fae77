//! Scripted build system for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{BuildSystem, BuildSystemError, Crumb};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Crumb,
    Post(String),
}

#[derive(Default)]
struct Script {
    crumb_failures: usize,
    posts: VecDeque<Result<u16, String>>,
    calls: Vec<Call>,
}

/// Records every call. Crumbs succeed unless a failure is queued; posts
/// answer from the queue and fall back to 200.
#[derive(Clone, Default)]
pub struct ScriptedBuildSystem {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBuildSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_crumb_failure(&self) {
        self.script.lock().unwrap().crumb_failures += 1;
    }

    pub fn push_post(&self, status: Result<u16, String>) {
        self.script.lock().unwrap().posts.push_back(status);
    }

    pub fn push_post_failure(&self, message: &str) {
        self.push_post(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn crumb_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Crumb).count()
    }

    pub fn post_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Post(_)))
            .count()
    }

    pub fn posted_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Post(path) => Some(path),
                Call::Crumb => None,
            })
            .collect()
    }
}

impl BuildSystem for ScriptedBuildSystem {
    async fn crumb(&self) -> Result<Crumb, BuildSystemError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Crumb);
        if script.crumb_failures > 0 {
            script.crumb_failures -= 1;
            return Err(BuildSystemError::CrumbStatus {
                url: "mock/crumbIssuer/api/json".to_string(),
                status: 503,
            });
        }
        Ok(Crumb {
            field: "Jenkins-Crumb".to_string(),
            value: "mock".to_string(),
        })
    }

    async fn post(&self, path: &str, _crumb: &Crumb) -> Result<u16, BuildSystemError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Post(path.to_string()));
        match script.posts.pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(BuildSystemError::transport_without_source(path, message)),
            None => Ok(200),
        }
    }
}
