// Copyright @yucwang 2021

use indicatif::{ProgressBar, ProgressStyle};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Resolves a requested worker count, `0` meaning one per available core.
pub fn resolve_thread_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Splits `[0, total)` into blocks of `block_size` items and runs `work` on
/// them from `thread_count` scoped workers. Blocks are claimed through a
/// shared counter; every result is handed to `collect` on the calling thread
/// together with the range it covers. Arrival order is unspecified.
pub fn for_each_block<T, F, C>(total: usize,
                               block_size: usize,
                               thread_count: usize,
                               label: &str,
                               work: F,
                               mut collect: C)
where
    T: Send,
    F: Fn(Range<usize>) -> T + Sync,
    C: FnMut(Range<usize>, T),
{
    if total == 0 {
        return;
    }

    let block_size = block_size.max(1);
    let total_blocks = (total + block_size - 1) / block_size;
    let thread_count = resolve_thread_count(thread_count).min(total_blocks);

    let progress = ProgressBar::new(total_blocks as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {msg} {bar:40.cyan/blue} {pos}/{len} blocks")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.set_message(label.to_string());

    let next_block = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(Range<usize>, T)>();

    thread::scope(|scope| {
        for _ in 0..thread_count {
            let next_block = &next_block;
            let work = &work;
            let tx = tx.clone();
            scope.spawn(move || {
                loop {
                    let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                    if block_index >= total_blocks {
                        break;
                    }

                    let start = block_index * block_size;
                    let range = start..(start + block_size).min(total);
                    let result = work(range.clone());
                    if tx.send((range, result)).is_err() {
                        break;
                    }
                }
            });
        }

        drop(tx);
        for (range, result) in rx.iter() {
            collect(range, result);
            progress.inc(1);
        }
    });
    progress.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_item_visited_once() {
        for &threads in &[1usize, 3, 8] {
            let mut seen = vec![0u32; 1000];
            for_each_block(1000, 64, threads, "test",
                |range| range.clone().map(|i| i * 2).collect::<Vec<_>>(),
                |range, values| {
                    for (i, v) in range.zip(values) {
                        assert_eq!(v, i * 2);
                        seen[i] += 1;
                    }
                });
            assert!(seen.iter().all(|c| *c == 1));
        }
    }

    #[test]
    fn test_empty_range_is_noop() {
        let mut calls = 0;
        for_each_block(0, 16, 4, "test", |_| (), |_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_resolve_thread_count() {
        assert_eq!(resolve_thread_count(3), 3);
        assert!(resolve_thread_count(0) >= 1);
    }
}
