//! Jobs accumulated across page scans within one session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jobmap_core::GeocodedJob;

use crate::storage::{load_json, remove_logged, save_json_logged, KeyValueStore};

pub const ALL_JOBS_KEY: &str = "ljm_all_jobs";
pub const COMPANY_NAMES_KEY: &str = "ljm_company_names";

#[derive(Default)]
struct State {
    jobs: HashMap<String, GeocodedJob>,
    company_names: HashMap<String, String>,
}

/// Geocoded jobs keyed by job id, mirrored to the session store.
///
/// The in-memory map is authoritative; failed writes only cost durability.
pub struct AccumulatedJobStore {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<State>,
}

impl AccumulatedJobStore {
    /// Restore whatever the session store already holds.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let state = State {
            jobs: load_json(store.as_ref(), ALL_JOBS_KEY).unwrap_or_default(),
            company_names: load_json(store.as_ref(), COMPANY_NAMES_KEY).unwrap_or_default(),
        };
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    /// Insert or overwrite each job by id, then persist the full map.
    pub fn merge(&self, jobs: Vec<GeocodedJob>) {
        let mut state = self.state();
        for job in jobs {
            state.jobs.insert(job.job_id.clone(), job);
        }
        save_json_logged(self.store.as_ref(), ALL_JOBS_KEY, &state.jobs);
    }

    /// Snapshot of every stored job, in no particular order.
    #[must_use]
    pub fn get_all(&self) -> Vec<GeocodedJob> {
        self.state().jobs.values().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, job_id: &str) -> Option<GeocodedJob> {
        self.state().jobs.get(job_id).cloned()
    }

    #[must_use]
    pub fn contains(&self, job_id: &str) -> bool {
        self.state().jobs.contains_key(job_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remember employer names shown on the page, keyed by job id.
    /// Empty names are ignored.
    pub fn record_company_names(&self, names: &HashMap<String, String>) {
        let mut state = self.state();
        let mut changed = false;
        for (job_id, name) in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if state.company_names.get(job_id).map(String::as_str) != Some(name) {
                state.company_names.insert(job_id.clone(), name.to_owned());
                changed = true;
            }
        }
        if changed {
            save_json_logged(self.store.as_ref(), COMPANY_NAMES_KEY, &state.company_names);
        }
    }

    #[must_use]
    pub fn company_names(&self) -> HashMap<String, String> {
        self.state().company_names.clone()
    }

    /// Empty the jobs and captured names and persist the empty state.
    pub fn clear(&self) {
        let mut state = self.state();
        state.jobs.clear();
        state.company_names.clear();
        save_json_logged(self.store.as_ref(), ALL_JOBS_KEY, &state.jobs);
        remove_logged(self.store.as_ref(), COMPANY_NAMES_KEY);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
