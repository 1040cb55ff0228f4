use std::collections::HashSet;

/// Turns raw header cells into a valid, unique set of column names.
///
/// Blank headers become `column_<position>` (1-based). Repeated names keep
/// the first occurrence and get `.1`, `.2`, … appended to later ones.
pub fn normalise_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw.len());

    for (i, header) in raw.iter().enumerate() {
        let trimmed = header.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", i + 1)
        } else {
            trimmed.to_owned()
        };

        let mut name = base.clone();
        let mut count = 0;
        while seen.contains(&name) {
            count += 1;
            name = format!("{base}.{count}");
        }

        seen.insert(name.clone());
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_headers_get_positions() {
        assert_eq!(
            normalise_headers(&["a", "", " b "]),
            vec!["a", "column_2", "b"]
        );
    }

    #[test]
    fn test_duplicates_are_suffixed() {
        assert_eq!(
            normalise_headers(&["x", "x", "x", "x.1"]),
            vec!["x", "x.1", "x.2", "x.1.1"]
        );
    }
}
