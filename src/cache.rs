// Copyright 2026 The simdre Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The process-wide compiled-pattern cache behind the free functions.
//!
//! Purely an optimization: correctness never depends on a hit, and a
//! compiled [`Regex`] is immutable, so handing out shared `Arc`s is safe.
//! The cache is the only process-wide mutable state in the crate.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::Error;
use crate::re::Regex;

/// Past this many distinct patterns the cache is wiped wholesale. Cheap,
/// and callers with more live patterns than this should hold their own
/// `Regex` values anyway.
const CACHE_CAPACITY: usize = 256;

static CACHE: OnceLock<Mutex<HashMap<String, Arc<Regex>>>> = OnceLock::new();

fn cache() -> &'static Mutex<HashMap<String, Arc<Regex>>> {
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Fetch the compiled form of `pattern`, compiling on a miss.
pub fn compile_cached(pattern: &str) -> Result<Arc<Regex>, Error> {
    if let Some(re) = cache().lock().get(pattern) {
        return Ok(Arc::clone(re));
    }
    // Compile outside the lock; patterns can be slow to build and other
    // threads should not wait on that.
    let re = Arc::new(Regex::new(pattern)?);
    let mut guard = cache().lock();
    if guard.len() >= CACHE_CAPACITY {
        guard.clear();
    }
    let entry = guard.entry(pattern.to_owned()).or_insert(re);
    Ok(Arc::clone(entry))
}

/// Drop every cached pattern. Exposed so tests can run deterministically.
pub fn cache_clear() {
    if let Some(cache) = CACHE.get() {
        cache.lock().clear();
    }
}

/// The number of patterns currently cached.
pub fn cache_len() -> usize {
    CACHE.get().map_or(0, |cache| cache.lock().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test function: the cache is process-global and the test
    // harness runs functions concurrently.
    #[test]
    fn cache_lifecycle() {
        cache_clear();
        assert_eq!(cache_len(), 0);

        let a = compile_cached("cache-test-[0-9]+").unwrap();
        let b = compile_cached("cache-test-[0-9]+").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache_len(), 1);

        // Failed compilations leave no residue.
        assert!(compile_cached("cache-test-(").is_err());
        assert_eq!(cache_len(), 1);

        cache_clear();
        assert_eq!(cache_len(), 0);
        // The old handle keeps working after a clear.
        assert!(a.is_match("77"));
    }
}
