use crate::api::Session;
use crate::cache::QueryCache;

/// Everything a controller needs to talk to the backend and report back.
///
/// The context is passed explicitly into every async operation instead of being
/// looked up from global state, so tests can swap each collaborator.
pub struct AppContext<A, T> {
    pub api: A,
    pub session: Session,
    pub cache: QueryCache,
    pub toaster: T,
}

impl<A, T> AppContext<A, T> {
    pub fn new(api: A, session: Session, toaster: T) -> Self {
        Self {
            api,
            session,
            cache: QueryCache::new(),
            toaster,
        }
    }
}
