use super::*;

#[test]
fn empty_input_is_empty_map() {
    let items: Vec<u32> = vec![];
    let out = parallel_merge(&items, 4, |_| BTreeMap::<u32, u32>::new()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn maps_every_item_once() {
    let items: Vec<u32> = (0..101).collect();
    let out = parallel_merge(&items, 3, |chunk| {
        chunk.iter().map(|i| (*i, i * 2)).collect::<BTreeMap<_, _>>()
    })
    .unwrap();
    assert_eq!(out.len(), 101);
    assert_eq!(out[&50], 100);
}

#[test]
fn chunks_are_contiguous_and_bounded_by_workers() {
    use std::sync::Mutex;

    let items: Vec<u32> = (0..10).collect();
    let seen = Mutex::new(Vec::new());
    parallel_merge(&items, 3, |chunk| {
        seen.lock().unwrap().push(chunk.to_vec());
        BTreeMap::<u32, ()>::new()
    })
    .unwrap();

    let mut chunks = seen.into_inner().unwrap();
    chunks.sort();
    // ceil(10 / 3) = 4
    assert_eq!(
        chunks,
        vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]
    );
}

#[test]
fn zero_workers_treated_as_one() {
    let items = vec!["a", "b"];
    let out = parallel_merge(&items, 0, |chunk| {
        chunk.iter().map(|s| (s.to_string(), 1)).collect::<BTreeMap<_, _>>()
    })
    .unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn overlapping_results_are_rejected() {
    let items: Vec<u32> = (0..4).collect();
    let err = parallel_merge(&items, 2, |_| {
        BTreeMap::from([("same".to_string(), 1)])
    })
    .unwrap_err();
    assert!(matches!(err, ResolveError::OverlappingPartitions(ref k) if k.contains("same")));
}

#[test]
fn merge_disjoint_unions() {
    let a = BTreeMap::from([(1, "a")]);
    let b = BTreeMap::from([(2, "b")]);
    let merged = merge_disjoint(vec![a, b]).unwrap();
    assert_eq!(merged.len(), 2);
}
