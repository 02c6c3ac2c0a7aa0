use ai_brain::{MemoryKey, MemoryStore};
use proptest::prelude::*;

const SLOTS: [MemoryKey<u32>; 4] = [
    MemoryKey::new(1, "a"),
    MemoryKey::new(2, "b"),
    MemoryKey::new(3, "c"),
    MemoryKey::new(4, "d"),
];

#[derive(Debug, Clone)]
enum Op {
    Set { slot: usize, ttl: Option<u64> },
    Erase { slot: usize },
    Age,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SLOTS.len(), proptest::option::of(0u64..8))
            .prop_map(|(slot, ttl)| Op::Set { slot, ttl }),
        (0..SLOTS.len()).prop_map(|slot| Op::Erase { slot }),
        Just(Op::Age),
    ]
}

proptest! {
    // A model of remaining TTLs must agree with the store after every operation.
    #[test]
    fn present_entries_always_have_positive_ttl(ops in proptest::collection::vec(op(), 0..64)) {
        let mut memory = MemoryStore::with_keys(SLOTS.map(|key| key.erased())).unwrap();
        let mut model: [Option<Option<u64>>; 4] = [None; 4];

        for op in ops {
            match op {
                Op::Set { slot, ttl: Some(ttl) } => {
                    memory.set_with_expiry(SLOTS[slot], slot as u32, ttl);
                    model[slot] = (ttl > 0).then_some(Some(ttl));
                }
                Op::Set { slot, ttl: None } => {
                    memory.set(SLOTS[slot], slot as u32);
                    model[slot] = Some(None);
                }
                Op::Erase { slot } => {
                    memory.erase(SLOTS[slot]);
                    model[slot] = None;
                }
                Op::Age => {
                    memory.age_one_tick();
                    for entry in model.iter_mut() {
                        if let Some(Some(ttl)) = entry {
                            *ttl -= 1;
                            if *ttl == 0 {
                                *entry = None;
                            }
                        }
                    }
                }
            }

            for (slot, key) in SLOTS.iter().enumerate() {
                prop_assert_eq!(memory.has_value(*key), model[slot].is_some());
                match model[slot] {
                    Some(Some(ttl)) => {
                        prop_assert!(ttl > 0);
                        prop_assert_eq!(memory.time_until_expiry(*key), ttl);
                    }
                    _ => prop_assert_eq!(memory.time_until_expiry(*key), 0),
                }
            }
        }
    }
}
