use crate::executor::TaskExecutor;

/// Runs `work(first + i, &mut slots[i])` exactly once for every slot.
///
/// The slice is bisected recursively; the upper half is handed to the
/// executor as a task while the lower half runs on the current context, and
/// the call returns only after both halves joined. Each invocation owns its
/// slot exclusively. No ordering between indices is guaranteed.
pub fn divide_conquer<E, T, F>(executor: &E, first: usize, slots: &mut [T], work: &F)
where
    E: TaskExecutor,
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    if slots.len() <= 1 {
        if let Some(slot) = slots.first_mut() {
            work(first, slot);
        }
        return;
    }
    let mid = slots.len() >> 1;
    let (lower, upper) = slots.split_at_mut(mid);
    executor.fork_join(
        || divide_conquer(executor, first, lower, work),
        || divide_conquer(executor, first + mid, upper, work),
    );
}
