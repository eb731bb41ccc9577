/// Maps a quality label to the format expression passed to yt-dlp with `-f`.
///
/// Unknown labels (including "Best") fall back to the unconstrained `best`.
pub fn format_selector(label: &str) -> &'static str {
    match label {
        "360p" => "best[height<=360]",
        "480p" => "best[height<=480]",
        "720p" => "best[height<=720]",
        _ => "best",
    }
}

#[cfg(test)]
mod tests {
    use super::format_selector;

    #[test]
    fn height_capped_labels() {
        for n in [360, 480, 720] {
            assert_eq!(
                format_selector(&format!("{n}p")),
                format!("best[height<={n}]")
            );
        }
    }

    #[test]
    fn everything_else_is_best() {
        for label in ["Best", "best", "1080p", "Audio Only", "", " 360p"] {
            assert_eq!(format_selector(label), "best", "label {label:?}");
        }
    }
}
