//! Set difference between desired and remote attribute values.

use std::collections::HashSet;

/// Returns the desired values absent from `remote`, in first-occurrence order.
///
/// Each value appears at most once in the result, however often it is repeated in `desired`.
#[must_use]
pub fn missing<'a, S>(desired: &'a [S], remote: &[String]) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    let present: HashSet<&str> = remote.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    desired
        .iter()
        .map(AsRef::as_ref)
        .filter(|value| !present.contains(value) && seen.insert(*value))
        .collect()
}
