use std::hint::black_box;

use criterion::{criterion_group, Criterion};
use handle_table::{Handle, HandleTable};
use rand::Rng;
use slotmap::{DefaultKey, DenseSlotMap};

#[derive(Debug, Clone, Copy)]
enum Action {
    Insert(char, usize),
    Remove(usize),
    Access(usize),
}

#[derive(Debug, Clone, Copy)]
enum ActionType {
    Insert,
    Remove,
    Access,
}

#[derive(Clone, Copy)]
struct WorkloadConfig {
    inserts: usize,
    removals: usize,
    accesses: usize,
}

// `slab::Slab` recycles keys most recently freed first, like `HandleTable`, so
// the keys it hands out here are exactly the handles the table will hand out
fn make_workload(rng: &mut impl Rng, config: WorkloadConfig) -> Vec<Action> {
    let mut workload = Vec::new();
    assert!(config.removals <= config.inserts);

    let mut pool = Vec::new();
    pool.extend(std::iter::repeat_n(ActionType::Insert, config.inserts));
    pool.extend(std::iter::repeat_n(ActionType::Remove, config.removals));
    pool.extend(std::iter::repeat_n(ActionType::Access, config.accesses));
    let mut pool_removed = Vec::new();
    let mut may_access = Vec::new();

    'shuffle: loop {
        let mut slab = slab::Slab::<char>::new();
        workload.clear();
        may_access.clear();
        pool.append(&mut pool_removed);
        let mut inserts_left = config.inserts;

        while !pool.is_empty() {
            let i = rng.random_range(0..pool.len());

            match pool[i] {
                ActionType::Insert => {
                    inserts_left -= 1;
                    let c = rng.random();
                    let key = slab.insert(c);
                    may_access.push(key);
                    pool_removed.push(pool.remove(i));
                    workload.push(Action::Insert(c, key));
                }
                ActionType::Remove => {
                    if may_access.is_empty() {
                        continue;
                    }

                    let x = rng.random_range(0..may_access.len());
                    let key = may_access.remove(x);
                    slab.remove(key);
                    workload.push(Action::Remove(key));
                    pool_removed.push(pool.remove(i));
                }
                ActionType::Access => {
                    if may_access.is_empty() {
                        if inserts_left == 0 {
                            continue 'shuffle;
                        }

                        continue;
                    }

                    let x = rng.random_range(0..may_access.len());
                    let key = may_access[x];
                    workload.push(Action::Access(key));
                    pool_removed.push(pool.remove(i));
                }
            }
        }
        break;
    }

    let actions = config.inserts + config.removals + config.accesses;

    assert_eq!(pool_removed.len(), actions);
    assert_eq!(workload.len(), actions);

    workload
}

fn run_workloads(c: &mut Criterion) {
    let mut bench_workload = move |name: &str, config: WorkloadConfig| {
        let workload = make_workload(&mut rand::rng(), config);

        c.benchmark_group(name)
            .throughput(criterion::Throughput::Elements(workload.len() as u64))
            .bench_function("slab", |b| {
                b.iter(|| run_workload_slab(&workload));
            })
            .bench_function("dense-slotmap", |b| {
                b.iter(|| run_workload_slotmap(&workload));
            })
            .bench_function("handle-table-usize", |b| {
                b.iter(|| run_workload_table::<usize>(&workload));
            })
            .bench_function("handle-table-u32", |b| {
                b.iter(|| run_workload_table::<u32>(&workload));
            })
            .bench_function("handle-table-unchecked", |b| {
                b.iter(|| run_workload_table_unchecked(&workload));
            });
    };

    bench_workload(
        "insert-removal",
        WorkloadConfig {
            inserts: 1024,
            removals: 1024,
            accesses: 0,
        },
    );

    bench_workload(
        "insert-heavy",
        WorkloadConfig {
            inserts: 1024,
            removals: 64,
            accesses: 64,
        },
    );

    bench_workload(
        "read-heavy-small",
        WorkloadConfig {
            inserts: 64,
            removals: 64,
            accesses: 1024,
        },
    );

    bench_workload(
        "read-heavy-large",
        WorkloadConfig {
            inserts: 1024,
            removals: 1024,
            accesses: 1024,
        },
    );
}

fn run_workload_table<H: Handle>(workload: &[Action]) {
    let mut table = HandleTable::<char, H>::new();
    for &action in workload {
        match action {
            Action::Insert(c, _) => {
                table.insert(c);
            }
            Action::Remove(key) => {
                table.erase(H::from_usize(key)).unwrap();
            }
            Action::Access(key) => {
                black_box(table[H::from_usize(key)]);
            }
        }
    }
}

fn run_workload_table_unchecked(workload: &[Action]) {
    let mut table = HandleTable::<char>::new();
    for &action in workload {
        match action {
            Action::Insert(c, _) => {
                table.insert(c);
            }
            Action::Remove(key) => {
                // SAFETY: the workload only removes live keys
                unsafe { table.erase_unchecked(key) };
            }
            Action::Access(key) => {
                // SAFETY: the workload only accesses live keys
                black_box(unsafe { *table.get_unchecked(key) });
            }
        }
    }
}

fn run_workload_slab(workload: &[Action]) {
    let mut slab = slab::Slab::new();
    for &action in workload {
        match action {
            Action::Insert(c, _) => {
                slab.insert(c);
            }
            Action::Remove(key) => {
                slab.remove(key);
            }
            Action::Access(key) => {
                black_box(slab[key]);
            }
        }
    }
}

fn run_workload_slotmap(workload: &[Action]) {
    let mut map = DenseSlotMap::new();
    let mut keys = Vec::<DefaultKey>::new();
    for &action in workload {
        match action {
            Action::Insert(c, key) => {
                let slot_key = map.insert(c);
                if key == keys.len() {
                    keys.push(slot_key);
                } else {
                    keys[key] = slot_key;
                }
            }
            Action::Remove(key) => {
                map.remove(keys[key]);
            }
            Action::Access(key) => {
                black_box(map[keys[key]]);
            }
        }
    }
}

criterion_group! {
    bench_workloads, run_workloads
}

criterion::criterion_main! { bench_workloads }
