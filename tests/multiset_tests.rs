use runmap::{MultiSet, Phase, StoreError};
use tempfile::tempdir;

#[test]
fn digits_of_pi_aggregate_correctly() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ms = MultiSet::create(dir.path().join("digits.run")).unwrap();

    for value in [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5] {
        ms.append(value).unwrap();
    }
    ms.index().unwrap();

    let counts: Vec<(u64, u64)> = ms.value_counts().unwrap().collect();
    assert_eq!(
        counts,
        [(1, 2), (2, 1), (3, 2), (4, 1), (5, 3), (6, 1), (9, 1)]
    );

    let total: u64 = counts.iter().map(|&(_, count)| count).sum();
    let sum: u64 = counts.iter().map(|&(value, count)| value * count).sum();
    assert_eq!(total, 11);
    assert_eq!(sum, 44);

    let elements: Vec<u64> = ms.iter().unwrap().collect();
    assert_eq!(elements, [1, 1, 2, 3, 3, 4, 5, 5, 5, 6, 9]);
}

#[test]
fn counted_sum_matches_walked_sum() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ms = MultiSet::create(dir.path().join("sums.run")).unwrap();

    let mut writer = ms.writer().unwrap();
    for i in 0..5000u64 {
        writer.append(i.wrapping_mul(2654435761) % 300 + 1).unwrap();
    }
    drop(writer);
    ms.index().unwrap();

    let mut counted_sum = 0u64;
    let mut counted_total = 0u64;
    ms.for_each_value_count(|value, count| {
        counted_sum += value * count;
        counted_total += count;
    })
    .unwrap();

    let mut walked_sum = 0u64;
    let mut walked_total = 0u64;
    for value in ms.iter().unwrap() {
        walked_sum += value;
        walked_total += 1;
    }

    assert_eq!(counted_total, 5000);
    assert_eq!(walked_total, 5000);
    assert_eq!(counted_sum, walked_sum);
}

#[test]
fn counts_are_never_zero() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ms = MultiSet::create(dir.path().join("sparse.run")).unwrap();

    // Widely spaced values: aggregation must only report present ones.
    for value in [7, 7, 1_000_000, 42] {
        ms.append(value).unwrap();
    }
    ms.index().unwrap();

    let counts: Vec<(u64, u64)> = ms.value_counts().unwrap().collect();
    assert_eq!(counts, [(7, 2), (42, 1), (1_000_000, 1)]);
    assert!(counts.iter().all(|&(_, count)| count >= 1));
}

#[test]
fn empty_multiset_is_empty_everywhere() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ms = MultiSet::create(dir.path().join("empty.run")).unwrap();

    ms.index().unwrap();

    assert!(ms.is_empty());
    assert_eq!(ms.iter().unwrap().count(), 0);
    assert_eq!(ms.value_counts().unwrap().count(), 0);
}

#[test]
fn sentinel_element_and_wrong_phase_are_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ms = MultiSet::create(dir.path().join("errors.run")).unwrap();

    assert!(matches!(
        ms.append(u64::MAX).err(),
        Some(StoreError::ReservedKey(_))
    ));
    assert!(matches!(
        ms.value_counts().err(),
        Some(StoreError::Phase {
            required: Phase::Ready,
            actual: Phase::Writing,
        })
    ));

    ms.append(5).unwrap();
    ms.index().unwrap();
    assert!(matches!(ms.append(5).err(), Some(StoreError::Phase { .. })));
    assert_eq!(ms.at(0).unwrap(), 5);
    assert!(matches!(
        ms.at(1).err(),
        Some(StoreError::OutOfBounds { index: 1, len: 1 })
    ));
}
