use core::num::NonZeroU32;

use portable_atomic::{AtomicI64, Ordering};
use rand::{Rng, rng};

/// A source of uniformly distributed offsets into the window.
pub trait RandSource {
    /// Returns a uniformly distributed value in `[0, bound)`.
    fn below(&self, bound: NonZeroU32) -> u32;
}

/// A [`RandSource`] backed by the thread-local RNG (`rand::rng()`).
///
/// Each OS thread has its own RNG instance, so concurrent updaters sample
/// without contention. This type does not store the RNG; it is a zero-sized
/// handle that reaches the thread-local generator on every call, which makes
/// it `Send + Sync` even though the underlying `ThreadRng` is not.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn below(&self, bound: NonZeroU32) -> u32 {
        rng().random_range(0..bound.get())
    }
}

/// Shared progress cursor defining the trailing window of "live" order keys.
///
/// The cursor holds the order key most recently confirmed as inserted. Every
/// order key in `[cursor - window, cursor)` is considered eligible for an
/// update. The inserter moves the window forward with [`Self::advance`];
/// updaters pick a key inside it with [`Self::sample`].
///
/// ## Ordering
/// Both the load in [`Self::sample`] and the store in [`Self::advance`] are
/// [`Ordering::Relaxed`]. Readers may observe a stale cursor for a short
/// while but never a torn one. There is no lock.
///
/// ## Caveats
/// Monotonicity is not enforced. It holds only because at most one inserter
/// advances the cursor, in file order. When the cursor is smaller than the
/// window, samples can be negative; they are returned as-is.
pub struct WindowCursor<R = ThreadRandom>
where
    R: RandSource,
{
    #[cfg(feature = "cache-padded")]
    cursor: crossbeam_utils::CachePadded<AtomicI64>,
    #[cfg(not(feature = "cache-padded"))]
    cursor: AtomicI64,
    window: NonZeroU32,
    rand: R,
}

impl WindowCursor<ThreadRandom> {
    /// Creates a cursor positioned at `starting_point` that samples with the
    /// thread-local RNG.
    ///
    /// # Example
    /// ```
    /// use core::num::NonZeroU32;
    /// use tpch_churn::WindowCursor;
    ///
    /// let window = WindowCursor::new(NonZeroU32::new(100).unwrap(), 1_000);
    /// let order = window.sample();
    /// assert!((900..1_000).contains(&order));
    /// ```
    pub fn new(window: NonZeroU32, starting_point: i64) -> Self {
        Self::with_rand(window, starting_point, ThreadRandom)
    }
}

impl<R> WindowCursor<R>
where
    R: RandSource,
{
    /// Creates a cursor with an explicit [`RandSource`].
    pub fn with_rand(window: NonZeroU32, starting_point: i64, rand: R) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            cursor: crossbeam_utils::CachePadded::new(AtomicI64::new(starting_point)),
            #[cfg(not(feature = "cache-padded"))]
            cursor: AtomicI64::new(starting_point),
            window,
            rand,
        }
    }

    /// Picks an order key uniformly at random inside the trailing window.
    ///
    /// Returns `rand[0, window) + (cursor - window)`, i.e. a value in
    /// `[cursor - window, cursor)` for the cursor observed by this call.
    ///
    /// The arithmetic wraps: a cursor within `window` of `i64::MIN` yields
    /// samples near `i64::MAX`, which match no order key.
    pub fn sample(&self) -> i64 {
        let cursor = self.cursor.load(Ordering::Relaxed);
        let window = i64::from(self.window.get());
        cursor
            .wrapping_sub(window)
            .wrapping_add(i64::from(self.rand.below(self.window)))
    }

    /// Moves the window so that it ends at `new_cursor`.
    pub fn advance(&self, new_cursor: i64) {
        self.cursor.store(new_cursor, Ordering::Relaxed);
    }

    /// Returns the cursor as currently visible to this thread.
    pub fn load(&self) -> i64 {
        self.cursor.load(Ordering::Relaxed)
    }

    pub const fn window(&self) -> NonZeroU32 {
        self.window
    }
}

impl<R> core::fmt::Debug for WindowCursor<R>
where
    R: RandSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowCursor")
            .field("cursor", &self.load())
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
