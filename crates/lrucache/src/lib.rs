//! # lrucache
//!
//! Bounded least-recently-used cache with O(1) `get` and `set`.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to arena slot (O(1))
//! - **LRU List**: Doubly-linked list of arena slots between two sentinels (O(1))
//! - **Shared**: `SharedLruCache` puts the whole structure behind one lock and
//!   counts hits, misses and evictions
//!
//! ```
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2)?;
//! cache.set(1, "a");
//! cache.set(2, "b");
//! assert_eq!(cache.get(&1), Some(&"a"));
//!
//! cache.set(3, "c"); // 2 is now the least recently used
//! assert_eq!(cache.get(&2), None);
//! # Ok::<(), lrucache::Error>(())
//! ```

#![warn(missing_docs)]

mod error;
mod lru;
mod shared;
mod stats;

pub use error::{Error, Result};
pub use lru::{Iter, LruCache};
pub use shared::SharedLruCache;
pub use stats::{CacheStats, StatsSnapshot};
