use super::*;

#[test]
fn newest_generation_is_current() {
    let gens = SweepGenerations::new();
    assert_eq!(gens.latest(), 0);
    assert!(!gens.is_current(0));

    let first = gens.begin();
    assert!(gens.is_current(first));

    let second = gens.begin();
    assert!(second > first);
    assert!(!gens.is_current(first));
    assert!(gens.is_current(second));
}

#[test]
fn concurrent_begins_hand_out_distinct_generations() {
    let gens = std::sync::Arc::new(SweepGenerations::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gens = gens.clone();
            std::thread::spawn(move || (0..100).map(|_| gens.begin()).collect::<Vec<_>>())
        })
        .collect();
    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 800);
    assert_eq!(gens.latest(), 800);
}
