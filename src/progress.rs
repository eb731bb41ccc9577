use std::path::PathBuf;

/// What yt-dlp reports on stdout while downloading
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Fraction in 0.0..=1.0
    Fraction(f32),
    /// File the current stream is written to
    Destination(PathBuf),
}

/// Parses one `[download]` line of yt-dlp's default output.
pub fn parse_progress_from_line(line: &str) -> Option<Progress> {
    let rest = line.trim().strip_prefix("[download]")?.trim();
    if let Some(path) = rest.strip_prefix("Destination:") {
        let path = path.trim();
        return (!path.is_empty()).then(|| Progress::Destination(PathBuf::from(path)));
    }
    let first = rest.split_whitespace().next()?;
    let number = first.strip_suffix('%')?;
    let v = number.trim().parse::<f32>().ok()?;
    Some(Progress::Fraction((v / 100.0).clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_line() {
        assert_eq!(
            parse_progress_from_line("[download]  42.5% of   10.00MiB at    1.00MiB/s ETA 00:05"),
            Some(Progress::Fraction(0.425))
        );
        assert_eq!(
            parse_progress_from_line("[download] 100% of 10.00MiB in 00:00:05"),
            Some(Progress::Fraction(1.0))
        );
    }

    #[test]
    fn destination_line() {
        assert_eq!(
            parse_progress_from_line("[download] Destination: /tmp/v/Some Title [abc].mp4"),
            Some(Progress::Destination(PathBuf::from("/tmp/v/Some Title [abc].mp4")))
        );
    }

    #[test]
    fn unrelated_lines_ignored() {
        for line in [
            "[youtube] abc: Downloading webpage",
            "[download] /tmp/v/x.mp4 has already been downloaded",
            "[download] Destination:",
            "",
            "42%",
        ] {
            assert_eq!(parse_progress_from_line(line), None, "line {line:?}");
        }
    }
}
