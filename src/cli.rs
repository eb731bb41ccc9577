use std::path::PathBuf;

use clap::Parser;

use crate::model::Quality;

/// Desktop front-end for yt-dlp with title and thumbnail preview.
#[derive(Parser, Debug)]
#[command(name = "yt-preview-downloader", version, about)]
pub struct Args {
    /// yt-dlp executable; defaults to a bundled copy, then `yt-dlp` on PATH
    #[arg(long)]
    pub tool: Option<PathBuf>,

    /// Argument placed before every yt-dlp invocation (repeatable),
    /// e.g. `--tool python3 --tool-arg=-m --tool-arg=yt_dlp`
    #[arg(long = "tool-arg", allow_hyphen_values = true)]
    pub tool_args: Vec<String>,

    /// Folder pre-filled as the download destination
    #[arg(long, short = 'o')]
    pub download_dir: Option<String>,

    /// Initially selected quality: 360p, 480p, 720p or Best
    #[arg(long, short = 'q', default_value_t = Quality::default())]
    pub quality: Quality,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["yt-preview-downloader"]).unwrap();
        assert_eq!(args.tool, None);
        assert!(args.tool_args.is_empty());
        assert_eq!(args.download_dir, None);
        assert_eq!(args.quality, Quality::P480);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn launcher_style_tool() {
        let args = Args::try_parse_from([
            "yt-preview-downloader",
            "--tool",
            "python3",
            "--tool-arg",
            "-m",
            "--tool-arg",
            "yt_dlp",
            "-q",
            "720p",
            "-o",
            "/home/me/Videos",
        ])
        .unwrap();
        assert_eq!(args.tool, Some(PathBuf::from("python3")));
        assert_eq!(args.tool_args, ["-m", "yt_dlp"]);
        assert_eq!(args.quality, Quality::P720);
        assert_eq!(args.download_dir.as_deref(), Some("/home/me/Videos"));
    }

    #[test]
    fn rejects_unknown_quality() {
        assert!(Args::try_parse_from(["yt-preview-downloader", "-q", "4k"]).is_err());
    }
}
