//! Order-preserving set helpers over slices.
//!
//! Results keep the order of their first input; no helper sorts.

use std::collections::HashSet;
use std::hash::Hash;

/// Drop elements equal to their predecessor. Only removes all duplicates
/// when the input is sorted.
pub fn dedup_adjacent<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if out.last() != Some(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Keep the first occurrence of every element.
pub fn unique<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// `a` followed by the elements of `b` not already in `a`.
pub fn union<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut seen: HashSet<&T> = a.iter().collect();
    let mut out = a.to_vec();
    for item in b {
        if seen.insert(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Elements of `b` that also appear in `a`, each once, in `b`'s order.
pub fn intersect<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let in_a: HashSet<&T> = a.iter().collect();
    let mut emitted = HashSet::new();
    b.iter()
        .filter(|item| in_a.contains(item) && emitted.insert(*item))
        .cloned()
        .collect()
}

/// Elements of `a` that do not appear in `b`.
pub fn difference<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let in_b: HashSet<&T> = b.iter().collect();
    a.iter().filter(|item| !in_b.contains(item)).cloned().collect()
}
