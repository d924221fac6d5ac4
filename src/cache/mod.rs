pub mod entry;
pub mod lock;
pub mod lookup;
pub mod store;

pub use entry::{CacheData, CacheEntry};
pub use lock::{CacheLock, CacheLockGuard};
pub use lookup::{entity_from_query, CachedLookup, FetchError, Fetcher, LookupOutcome, LookupSource};
pub use store::{CacheError, Clock, SystemClock, TtlCache, CACHE_FILE_NAME, LOCK_FILE_NAME};
