use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::lookup::PermissionLookup;

/// In-memory role → permission-key relation that counts the queries it answers.
#[derive(Default)]
pub struct MemoryLookup {
    grants: Mutex<HashMap<i32, HashSet<String>>>,
    queries: AtomicUsize,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, role_id: i32, key: &str) {
        self.grants
            .lock()
            .unwrap()
            .entry(role_id)
            .or_default()
            .insert(key.to_string());
    }

    pub fn detach(&self, role_id: i32, key: &str) {
        if let Some(keys) = self.grants.lock().unwrap().get_mut(&role_id) {
            keys.remove(key);
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionLookup for MemoryLookup {
    type Error = Infallible;

    async fn role_grants(&self, role_id: i32, key: &str) -> Result<bool, Infallible> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let grants = self.grants.lock().unwrap();
        Ok(grants.get(&role_id).is_some_and(|keys| keys.contains(key)))
    }

    async fn role_grants_any(&self, role_id: i32, keys: &[String]) -> Result<bool, Infallible> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let grants = self.grants.lock().unwrap();
        Ok(grants
            .get(&role_id)
            .is_some_and(|granted| keys.iter().any(|k| granted.contains(k))))
    }
}
