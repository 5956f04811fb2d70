use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::Serialize;

macro_rules! define_counters {
    ( $( $name:ident => $record:ident ),* $(,)? ) => {
        /// Process-wide counters shared by every concurrently running expansion.
        pub struct SearchStats {
            $($name: AtomicU64,)*
            max_depth: AtomicU32,
        }

        impl SearchStats {
            #[must_use]
            pub const fn new() -> Self {
                Self {
                    $($name: AtomicU64::new(0),)*
                    max_depth: AtomicU32::new(0),
                }
            }

            $(
                #[inline]
                pub fn $record(&self) {
                    self.$name.fetch_add(1, Ordering::Relaxed);
                }
            )*

            #[must_use]
            pub fn snapshot(&self) -> SearchSnapshot {
                SearchSnapshot {
                    $($name: self.$name.load(Ordering::Relaxed),)*
                    max_depth: self.max_depth.load(Ordering::Relaxed),
                }
            }
        }

        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
        pub struct SearchSnapshot {
            $(pub $name: u64,)*
            pub max_depth: u32,
        }
    };
}

define_counters! {
    leaves => record_leaf,
    interior => record_interior,
    truncated => record_truncation,
    range_errors => record_range_error,
}

impl SearchStats {
    #[inline]
    pub fn observe_height(&self, height: u32) {
        self.max_depth.fetch_max(height, Ordering::Relaxed);
    }

    /// Counts a generated node as leaf or interior and tracks its height.
    #[inline]
    pub fn record_node(&self, height: u32, num_children: u32) {
        if num_children == 0 {
            self.record_leaf();
        } else {
            self.record_interior();
        }
        self.observe_height(height);
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.leaves
            .load(Ordering::Relaxed)
            .saturating_add(self.interior.load(Ordering::Relaxed))
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSnapshot {
    #[must_use]
    pub const fn nodes(&self) -> u64 {
        self.leaves.saturating_add(self.interior)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn concurrent_updates_are_not_lost() {
        let stats = SearchStats::new();
        thread::scope(|scope| {
            for worker in 0..8u32 {
                let stats = &stats;
                scope.spawn(move || {
                    for i in 0..10_000u32 {
                        stats.record_node(worker * 10 + i % 7, i % 2);
                    }
                });
            }
        });
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.leaves, 40_000);
        assert_eq!(snapshot.interior, 40_000);
        assert_eq!(snapshot.nodes(), 80_000);
        assert_eq!(snapshot.max_depth, 76);
    }

    #[test]
    fn max_depth_never_decreases() {
        let stats = SearchStats::new();
        stats.observe_height(5);
        stats.observe_height(2);
        assert_eq!(stats.snapshot().max_depth, 5);
    }
}
