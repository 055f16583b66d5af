use std::cmp::Ordering;

/// Default comparator: returns `true` when `latest` is newer than `current`.
///
/// Both strings are split on `.` and compared segment by segment as integers.
/// Missing or non-numeric segments count as `0`, so `"1.2"` equals `"1.2.0"`
/// and malformed input never fails.
#[must_use]
pub fn compare_versions(current: &str, latest: &str) -> bool {
    let current: Vec<u64> = segments(current).collect();
    let latest: Vec<u64> = segments(latest).collect();
    let len = current.len().max(latest.len());

    for index in 0..len {
        let current_part = current.get(index).copied().unwrap_or(0);
        let latest_part = latest.get(index).copied().unwrap_or(0);

        match latest_part.cmp(&current_part) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }

    false
}

fn segments(version: &str) -> impl Iterator<Item = u64> + '_ {
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
}
