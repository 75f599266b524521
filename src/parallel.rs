//! Bounded fan-out of independent jobs over scoped threads.

use std::{panic, thread};

/// Resolves a requested thread count: `0` means one thread per core, and the result
/// never exceeds the number of cores or the number of jobs (but is at least 1).
pub fn resolve_threads(num_threads: usize, num_jobs: usize) -> usize {
    let num_threads = if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    };
    num_threads.min(num_jobs).max(1)
}

/// Applies `f` to every item, splitting `items` into contiguous chunks with one
/// chunk per thread. Output order matches input order.
///
/// A panic in `f` is propagated to the caller once every thread has stopped.
pub fn parallel_map<I, O, F>(items: &[I], num_threads: usize, f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync,
{
    let num_threads = resolve_threads(num_threads, items.len());
    if num_threads == 1 {
        return items.iter().map(&f).collect();
    }

    let items_per_thread = items.len() / num_threads;
    let remainder = items.len() % num_threads; // for last thread

    thread::scope(|scope| {
        let f = &f;
        let mut handles = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let start = i * items_per_thread;
            let end = if i == num_threads - 1 {
                start + items_per_thread + remainder
            } else {
                start + items_per_thread
            };
            let chunk = &items[start..end];
            handles.push(scope.spawn(move || chunk.iter().map(f).collect::<Vec<O>>()));
        }

        let mut outputs = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk) => outputs.extend(chunk),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        outputs
    })
}
