use std::fmt::Debug;

mod sha;

pub use sha::{STATE_SIZE, ShaRng, ShaState};

/// Deterministic generator whose states can be split per child.
///
/// Every function is a pure function of its arguments: no global counter,
/// thread identity or call order may leak into a derived state.
pub trait SplittableRng {
    type State: Copy + Eq + Debug + Send + Sync;

    const NAME: &'static str;

    fn init(seed: u32) -> Self::State;

    /// Draws a value in `0..=i32::MAX` and advances `state`.
    fn next(state: &mut Self::State) -> i32;

    fn spawn_child(parent: &Self::State, index: u32) -> Self::State;
}
