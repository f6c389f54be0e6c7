use std::sync::Mutex;

use log::debug;

/// Outcome of one in-flight or completed remote read. `data` keeps its
/// previous value when a later attempt fails, so a transient error does
/// not wipe what was already fetched.
#[derive(Clone, Debug)]
pub struct FetchState<T: Clone> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Clone> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

struct Inner<T: Clone> {
    state: FetchState<T>,
    generation: u64,
}

/// Shared state cell behind every fetch agent. Each attempt is tagged with
/// a generation; a resolution is applied only while its generation is still
/// the current one, so the newest attempt always wins and a stale in-flight
/// response can never overwrite a newer one.
pub struct FetchCell<T: Clone> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> FetchCell<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: FetchState::default(),
                generation: 0,
            }),
        }
    }

    /// Starts a new attempt: bumps the generation, raises `loading` and
    /// clears any previous error. Returns the generation tag the caller
    /// must hand back at resolution time.
    pub fn begin(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();

        inner.generation += 1;
        inner.state.loading = true;
        inner.state.error = None;

        inner.generation
    }

    /// Settles the attempt tagged `generation`. Returns `false` when the
    /// attempt went stale in the meantime and the outcome was discarded.
    pub fn resolve(&self, generation: u64, outcome: Result<T, String>) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if generation != inner.generation {
            debug!("discarding stale fetch result (generation {generation})");
            return false;
        }

        inner.state.loading = false;

        match outcome {
            Ok(data) => {
                inner.state.data = Some(data);
                inner.state.error = None;
            }
            Err(message) => {
                inner.state.error = Some(message);
            }
        }

        true
    }

    pub fn snapshot(&self) -> FetchState<T> {
        self.inner.lock().unwrap().state.to_owned()
    }
}
