//! Natural ordering of file names

use std::cmp::Ordering;
use std::path::Path;

/// Compare two names the way a file browser orders them.
///
/// Comparison ignores case, and runs of digits compare by numeric value, so
/// `data2.rda` sorts before `data10.rda`. Equal numbers with different
/// leading zeros put the shorter run first. Everything else compares by
/// character.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let end_a = digit_run_end(&a, i);
            let end_b = digit_run_end(&b, j);
            let ordering = compare_numbers(&a[i..end_a], &b[j..end_b]);
            if ordering != Ordering::Equal {
                return ordering;
            }
            i = end_a;
            j = end_b;
        } else {
            let ordering = a[i].cmp(&b[j]);
            if ordering != Ordering::Equal {
                return ordering;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

/// Sort paths by file name in natural order
pub fn sort_container_paths<P: AsRef<Path>>(paths: &mut [P]) {
    paths.sort_by(|a, b| natural_cmp(&file_name(a.as_ref()), &file_name(b.as_ref())));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(chars.len(), |len| start + len)
}

fn compare_numbers(a: &[char], b: &[char]) -> Ordering {
    let trimmed_a = trim_leading_zeros(a);
    let trimmed_b = trim_leading_zeros(b);
    trimmed_a
        .len()
        .cmp(&trimmed_b.len())
        .then_with(|| trimmed_a.cmp(trimmed_b))
        .then_with(|| a.len().cmp(&b.len()))
}

fn trim_leading_zeros(digits: &[char]) -> &[char] {
    let start = digits.iter().position(|&c| c != '0').unwrap_or(digits.len());
    &digits[start..]
}
