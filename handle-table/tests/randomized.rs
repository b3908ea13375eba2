use handle_table::{Error, Handle, HandleTable};
use rand::{
    rngs::StdRng,
    seq::{IndexedRandom, IteratorRandom},
    Rng, SeedableRng,
};
use rustc_hash::{FxHashMap, FxHashSet};

fn test_table<H: Handle>() {
    let mut table = HandleTable::<char, H>::new();
    let mut map = FxHashMap::<H, char>::default();
    let mut dead_handles = FxHashSet::<H>::default();
    // freed handles are recycled most recent first
    let mut free_stack = Vec::<H>::new();
    let mut high_water_mark = 0usize;

    let seed = rand::random();
    let mut rng = StdRng::from_seed(seed);

    scopeguard::defer_on_unwind! {
        println!("SEED: {seed:?}");
    }

    for i in 0..1024 * 32 {
        scopeguard::defer_on_unwind! {
            println!("failed on iteration {i}")
        }
        match rng.random_range(0..=6) {
            0 | 1 => {
                let x = rng.random();
                let handle = table.insert(x);

                let expected = free_stack.pop().unwrap_or_else(|| {
                    high_water_mark += 1;
                    H::from_usize(high_water_mark - 1)
                });
                assert_eq!(handle, expected);
                assert!(!map.contains_key(&handle));

                dead_handles.remove(&handle);
                map.insert(handle, x);
            }
            2 => {
                let Some((&handle, &val)) = map.iter().choose(&mut rng) else {
                    continue;
                };

                assert_eq!(table[handle], val);
                assert_eq!(table.at(handle), Ok(&val));
            }
            3 => {
                let Some((&handle, val)) = map.iter_mut().choose(&mut rng) else {
                    continue;
                };

                assert_eq!(table[handle], *val);
                *val = rng.random();
                *table.at_mut(handle).unwrap() = *val;
            }
            4 => {
                let Some((&handle, &val)) = map.iter().choose(&mut rng) else {
                    continue;
                };
                map.remove(&handle);

                assert_eq!(table.erase(handle), Ok(val));
                free_stack.push(handle);
                dead_handles.insert(handle);
            }
            5 => {
                let dead: Vec<_> = dead_handles.iter().copied().collect();
                let Some(&handle) = dead.choose(&mut rng) else {
                    continue;
                };

                assert!(table.get(handle).is_none());
                assert!(table.get_mut(handle).is_none());
                assert_eq!(table.at(handle), Err(Error::OutOfRange { handle }));
                assert_eq!(table.erase(handle), Err(Error::OutOfRange { handle }));
            }
            6 => {
                let all = table.all_handles();
                assert_eq!(all.len(), map.len());
                assert_eq!(table.size(), H::from_count(map.len()));

                let unique: FxHashSet<_> = all.iter().copied().collect();
                assert_eq!(unique.len(), all.len());
                assert!(all.iter().all(|handle| map.contains_key(handle)));

                for (handle, value) in table.iter() {
                    assert_eq!(map[&handle], *value);
                }
            }
            _ => unreachable!(),
        }

        assert_eq!(table.len(), map.len());
        assert_eq!(table.high_water_mark(), high_water_mark);
    }

    for handle in dead_handles {
        assert!(table.get(handle).is_none());
        assert!(table.at(handle).is_err());
    }

    for (handle, value) in map {
        assert_eq!(table.erase(handle), Ok(value));
    }
    assert!(table.is_empty());
}

#[test]
fn test_u16_handles() {
    test_table::<u16>();
}

#[test]
fn test_u32_handles() {
    test_table::<u32>();
}

#[test]
fn test_usize_handles() {
    test_table::<usize>();
}
