use ai_brain::{BrainError, Expiry, MemoryError, MemoryKey, MemoryStatus, MemoryStore};

const HOME: MemoryKey<(i32, i32)> = MemoryKey::new(1, "home");
const VISIBLE: MemoryKey<Vec<u64>> = MemoryKey::new(2, "visible_entities");
const ANGRY_AT: MemoryKey<u64> = MemoryKey::new(3, "angry_at");
const NEVER_REGISTERED: MemoryKey<bool> = MemoryKey::new(99, "never_registered");

fn store() -> MemoryStore {
    MemoryStore::with_keys([HOME.erased(), VISIBLE.erased(), ANGRY_AT.erased()]).unwrap()
}

#[test]
fn set_get_erase_roundtrip() {
    let mut memory = store();
    assert_eq!(memory.get(HOME), None);

    memory.set(HOME, (3, -4));
    assert_eq!(memory.get(HOME), Some(&(3, -4)));
    assert!(memory.is_value(HOME, &(3, -4)));
    assert!(!memory.is_value(HOME, &(0, 0)));

    memory.erase(HOME);
    assert_eq!(memory.get(HOME), None);
    memory.erase(HOME);
    assert_eq!(memory.get(HOME), None);
}

#[test]
fn set_overwrites_value_and_expiry() {
    let mut memory = store();
    memory.set_with_expiry(ANGRY_AT, 7, 10);
    assert_eq!(memory.time_until_expiry(ANGRY_AT), 10);

    memory.set(ANGRY_AT, 8);
    assert_eq!(memory.get(ANGRY_AT), Some(&8));
    assert_eq!(memory.time_until_expiry(ANGRY_AT), 0);
    assert_eq!(memory.expiry_of(&ANGRY_AT.erased()), Some(Expiry::Never));
}

#[test]
fn empty_collection_is_never_present() {
    let mut memory = store();
    memory.set(VISIBLE, vec![1, 2]);
    assert!(memory.has_value(VISIBLE));

    memory.set(VISIBLE, Vec::new());
    assert!(!memory.has_value(VISIBLE));
    assert!(memory.has(VISIBLE, MemoryStatus::ValueAbsent));

    memory.set_with_expiry(VISIBLE, Vec::new(), 50);
    assert_eq!(memory.get(VISIBLE), None);
}

#[test]
fn set_optional_none_erases() {
    let mut memory = store();
    memory.set_optional(ANGRY_AT, Some(4));
    assert!(memory.has_value(ANGRY_AT));
    memory.set_optional(ANGRY_AT, None);
    assert!(!memory.has_value(ANGRY_AT));
}

#[test]
fn status_checks_are_consistent() {
    let mut memory = store();
    for present in [false, true] {
        if present {
            memory.set(HOME, (0, 0));
        }
        assert!(memory.has(HOME, MemoryStatus::Registered));
        assert_eq!(memory.has(HOME, MemoryStatus::ValuePresent), present);
        assert_eq!(memory.has(HOME, MemoryStatus::ValueAbsent), !present);
    }
    assert!(!memory.has(NEVER_REGISTERED, MemoryStatus::Registered));
}

#[test]
fn ttl_counts_down_and_erases_at_zero() {
    let mut memory = store();
    memory.set_with_expiry(ANGRY_AT, 12, 3);

    assert_eq!(memory.age_one_tick(), 0);
    assert_eq!(memory.time_until_expiry(ANGRY_AT), 2);
    assert_eq!(memory.age_one_tick(), 0);
    assert_eq!(memory.time_until_expiry(ANGRY_AT), 1);
    assert_eq!(memory.age_one_tick(), 1);
    assert_eq!(memory.get(ANGRY_AT), None);
    assert_eq!(memory.time_until_expiry(ANGRY_AT), 0);
}

#[test]
fn zero_ttl_erases_immediately() {
    let mut memory = store();
    memory.set(ANGRY_AT, 1);
    memory.set_with_expiry(ANGRY_AT, 2, 0);
    assert!(!memory.has_value(ANGRY_AT));
}

#[test]
fn never_expiring_values_survive_aging() {
    let mut memory = store();
    memory.set(HOME, (1, 1));
    for _ in 0..1000 {
        memory.age_one_tick();
    }
    assert_eq!(memory.get(HOME), Some(&(1, 1)));
}

#[test]
fn clear_keeps_registrations() {
    let mut memory = store();
    memory.set(HOME, (1, 2));
    memory.set(ANGRY_AT, 3);
    assert_eq!(memory.present_keys().count(), 2);

    memory.clear();
    assert_eq!(memory.present_keys().count(), 0);
    assert_eq!(memory.registered_keys().count(), 3);
    assert!(memory.is_registered(HOME));
}

#[test]
#[should_panic(expected = "memory key `never_registered` is not registered")]
fn reading_unregistered_key_panics() {
    let memory = store();
    let _ = memory.get(NEVER_REGISTERED);
}

#[test]
#[should_panic(expected = "not registered")]
fn present_query_on_unregistered_key_panics() {
    let memory = store();
    memory.has(NEVER_REGISTERED, MemoryStatus::ValuePresent);
}

#[test]
fn try_accessors_report_misuse() {
    let mut memory = store();
    assert_eq!(
        memory.try_set(NEVER_REGISTERED, true),
        Err(MemoryError::Unregistered {
            key: "never_registered"
        })
    );

    let same_id_other_type: MemoryKey<i64> = MemoryKey::new(3, "angry_at");
    assert!(matches!(
        memory.try_get(same_id_other_type),
        Err(MemoryError::TypeMismatch { key: "angry_at", .. })
    ));
    assert_eq!(memory.try_erase(ANGRY_AT), Ok(()));
}

#[test]
#[should_panic(expected = "holds `u64`, not `i64`")]
fn type_mismatch_panics() {
    let mut memory = store();
    memory.set(ANGRY_AT, 1);
    let _ = memory.get(MemoryKey::<i64>::new(3, "angry_at"));
}

#[test]
fn conflicting_registration_is_an_error() {
    let mut memory = store();
    assert!(memory.register(HOME.erased()).is_ok());

    let err = memory
        .register(MemoryKey::<String>::new(1, "home_name").erased())
        .unwrap_err();
    assert!(matches!(err, BrainError::ConflictingKey { id: 1, .. }));
}
