//! Content snapshot and population status.
//!
//! The snapshot is replaced wholesale by a successful population and never
//! patched. A failed population keeps the previous posts but marks the state
//! `failed`, which disables local search until the next success.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::paging::PageRequest;
use crate::domain::posts::{Post, PostResponse};
use crate::domain::search::SearchQuery;

use super::search::search_posts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationState {
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationStatus {
    pub state: PopulationState,
    /// Fetch attempts made by the current population run.
    pub attempts: u32,
    /// Posts held by the snapshot, stale or not.
    pub posts: usize,
    pub last_error: Option<String>,
    pub generation: u64,
}

struct SnapshotState {
    posts: Arc<Vec<Post>>,
    status: PopulationStatus,
}

pub struct SnapshotStore {
    state: watch::Sender<SnapshotState>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(SnapshotState {
                posts: Arc::new(Vec::new()),
                status: PopulationStatus {
                    state: PopulationState::Pending,
                    attempts: 0,
                    posts: 0,
                    last_error: None,
                    generation: 0,
                },
            }),
        }
    }

    /// Start tracking population run `generation`. Later calls carrying an
    /// older generation are ignored.
    pub fn begin(&self, generation: u64) {
        self.state.send_modify(|state| {
            state.status.state = PopulationState::Pending;
            state.status.attempts = 0;
            state.status.last_error = None;
            state.status.generation = generation;
        });
    }

    pub fn record_failure(&self, generation: u64, attempt: u32, error: String) -> bool {
        self.update(generation, |state| {
            state.status.attempts = attempt;
            state.status.last_error = Some(error);
        })
    }

    pub fn commit(&self, generation: u64, attempt: u32, posts: Vec<Post>) -> bool {
        self.update(generation, |state| {
            state.status.state = PopulationState::Ready;
            state.status.attempts = attempt;
            state.status.posts = posts.len();
            state.status.last_error = None;
            state.posts = Arc::new(posts);
        })
    }

    pub fn fail(&self, generation: u64) -> bool {
        self.update(generation, |state| {
            state.status.state = PopulationState::Failed;
        })
    }

    /// Search the snapshot. `None` unless the last population succeeded and
    /// no newer one is in flight.
    pub fn search(&self, query: &SearchQuery, request: PageRequest) -> Option<PostResponse> {
        let posts = {
            let state = self.state.borrow();
            if state.status.state != PopulationState::Ready {
                return None;
            }
            Arc::clone(&state.posts)
        };
        Some(search_posts(&posts, query, request))
    }

    pub fn status(&self) -> PopulationStatus {
        self.state.borrow().status.clone()
    }

    /// Wait until the current population run has either succeeded or given up.
    pub async fn settled(&self) -> PopulationStatus {
        let mut receiver = self.state.subscribe();
        match receiver
            .wait_for(|state| state.status.state != PopulationState::Pending)
            .await
        {
            Ok(state) => state.status.clone(),
            Err(_) => self.status(),
        }
    }

    fn update(&self, generation: u64, apply: impl FnOnce(&mut SnapshotState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.status.generation != generation {
                return false;
            }
            apply(state);
            true
        })
    }
}
