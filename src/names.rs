//! Author-name query variants.
//!
//! The portal's author index stores names inconsistently ("Kwame A. Boateng",
//! "K Boateng", "KA Boateng", ...), so each awardee is searched under several
//! spellings to improve recall.

use itertools::Itertools;

fn initial(token: &str) -> String {
    token.chars().next().map(String::from).unwrap_or_default()
}

/// Build the ordered, de-duplicated list of search strings for `full_name`.
///
/// Order of preference:
/// 1. the full name as given
/// 2. first initial + last name (`K Boateng`)
/// 3. each middle initial + last name (`A Boateng`)
/// 4. concatenated first and middle initials + last name (`KA Boateng`)
/// 5. first name + concatenated middle and last initials (`Kwame AB`), only
///    when there are middle names
///
/// A name with no tokens yields just the input string. A single-token name
/// yields just that token: its initial-based forms would only repeat the same
/// token as its own surname.
pub fn query_variants(full_name: &str) -> Vec<String> {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    let (first, last) = match parts.as_slice() {
        [] => return vec![full_name.to_string()],
        [only] => return vec![only.to_string()],
        [first, .., last] => (first, last),
    };
    let middles = if parts.len() > 2 { &parts[1..parts.len() - 1] } else { &[][..] };

    let mut variants = vec![full_name.trim().to_string(), format!("{} {}", initial(first), last)];
    variants.extend(middles.iter().map(|m| format!("{} {}", initial(m), last)));

    let initials: String = std::iter::once(*first).chain(middles.iter().copied()).map(initial).collect();
    if !initials.is_empty() {
        variants.push(format!("{initials} {last}"));
    }

    if !middles.is_empty() {
        let tail: String = middles.iter().copied().chain(std::iter::once(*last)).map(initial).collect();
        variants.push(format!("{first} {tail}"));
    }

    variants.into_iter().filter(|v| !v.is_empty()).unique().collect()
}
