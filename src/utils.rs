use std::time::Duration;

/// Convert a whole-second setting into a wait duration
pub fn seconds(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Derive the on-disk name for a downloaded image.
///
/// Takes the final `/`-separated segment of the URL and cuts it at the first
/// `?`. Returns `None` when nothing is left.
pub fn image_filename(url: &str) -> Option<String> {
    let last = url.rsplit('/').next().unwrap_or(url);
    let name = last.split('?').next().unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Directory-safe form of an environment label, e.g. "chrome on Windows 11"
/// becomes "chrome_on_Windows_11"
pub fn dir_name(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Shorten text for single-line log output
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        text.chars().take(max_chars).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
