/// Derive a stable event id from its title and start timestamp.
///
/// The result is `"<date>-<title>"`: the first ten characters of `start_date`
/// with `-` removed, then the title with every character outside
/// `[A-Za-z0-9]` replaced by `-` and lower-cased. Two titles that only
/// differ in punctuation or case therefore map to the same id.
pub fn derive_event_id(title: &str, start_date: &str) -> String {
    let date_prefix: String = start_date
        .chars()
        .take(10)
        .filter(|c| *c != '-')
        .collect();

    let sanitized_title: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    format!("{date_prefix}-{sanitized_title}")
}
