//! Sorted small-vectors of region IDs, replacing the original's
//! address-sorted linked lists (spec §9 design notes).
//!
//! `Wall::regions`, `Waypoint::regions`/`antiregions`, and the transient
//! enter/leave lists built during an enclosure sweep are all represented
//! this way: a `Vec<RegionId>` kept sorted by index, with intersection,
//! membership, and symmetric-difference expressed as plain merge-style
//! passes over the sorted order rather than pointer-chasing.

use crate::ids::RegionId;

/// `region_listed(list, region)` from the original: is `region` present?
pub fn contains(list: &[RegionId], region: RegionId) -> bool {
    list.binary_search(&region).is_ok()
}

/// Insert `region` into a sorted list, no-op if already present.
pub fn insert_sorted(list: &mut Vec<RegionId>, region: RegionId) {
    match list.binary_search(&region) {
        Ok(_) => {}
        Err(pos) => list.insert(pos, region),
    }
}

/// Remove `region` from a sorted list, no-op if absent.
pub fn remove_sorted(list: &mut Vec<RegionId>, region: RegionId) -> bool {
    match list.binary_search(&region) {
        Ok(pos) => {
            list.remove(pos);
            true
        }
        Err(_) => false,
    }
}

/// Mutual-annihilation rule (spec §4.C): for every region in `enter`, if it
/// is already present in `antiregions`, it cancels (removed from both);
/// otherwise it is merged into `regions`. Symmetric for `leave` vs
/// `regions`. This is `clean_region_lists`, applied once per resolved cell
/// rather than batched at the very end, matching the original's per-cell
/// commit.
pub fn merge_enter_leave(
    regions: &mut Vec<RegionId>,
    antiregions: &mut Vec<RegionId>,
    enter: Vec<RegionId>,
    leave: Vec<RegionId>,
) {
    for r in enter {
        if !remove_sorted(antiregions, r) {
            insert_sorted(regions, r);
        }
    }
    for r in leave {
        if !remove_sorted(regions, r) {
            insert_sorted(antiregions, r);
        }
    }
}

/// Symmetric difference of two sorted region lists: `(only_in_a, only_in_b)`.
/// Used by the surface-to-surface move (spec §4.F) to turn "old wall's
/// regions" vs "new wall's regions" into entered/left sets in one pass.
pub fn symmetric_difference(a: &[RegionId], b: &[RegionId]) -> (Vec<RegionId>, Vec<RegionId>) {
    let mut only_a = Vec::new();
    let mut only_b = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].index().cmp(&b[j].index()) {
            std::cmp::Ordering::Less => {
                only_a.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                only_b.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    only_a.extend_from_slice(&a[i..]);
    only_b.extend_from_slice(&b[j..]);
    (only_a, only_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(i: usize) -> RegionId {
        RegionId(i)
    }

    #[test]
    fn merge_cancels_regions_crossed_both_ways() {
        let mut regions = vec![r(1)];
        let mut antiregions = vec![];
        merge_enter_leave(&mut regions, &mut antiregions, vec![r(2)], vec![r(1)]);
        // r(1) was entered? no: r(1) leaves -> not in regions anymore, moves to antiregions
        assert!(!contains(&regions, r(1)));
        assert!(contains(&antiregions, r(1)));
        assert!(contains(&regions, r(2)));
    }

    #[test]
    fn enter_cancels_existing_antiregion() {
        let mut regions = vec![];
        let mut antiregions = vec![r(5)];
        merge_enter_leave(&mut regions, &mut antiregions, vec![r(5)], vec![]);
        assert!(!contains(&regions, r(5)));
        assert!(!contains(&antiregions, r(5)));
    }

    #[test]
    fn symmetric_difference_finds_unique_members() {
        let a = vec![r(1), r(2), r(3)];
        let b = vec![r(2), r(3), r(4)];
        let (only_a, only_b) = symmetric_difference(&a, &b);
        assert_eq!(only_a, vec![r(1)]);
        assert_eq!(only_b, vec![r(4)]);
    }
}
