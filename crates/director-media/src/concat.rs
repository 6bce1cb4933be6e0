//! Stream-copy concatenation through the concat demuxer.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::command::{FfmpegCommand, FfmpegInput};
use crate::error::MediaResult;

/// Quote a path for a concat list `file` directive.
///
/// The demuxer uses shell-like single quoting: `'` becomes `'\''`.
pub fn escape_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Render the list file body, one `file` line per clip, in the given order.
pub fn render_concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file {}\n", escape_concat_path(clip)))
        .collect()
}

/// Write the list file for `clips`.
pub async fn write_concat_list(list_path: &Path, clips: &[PathBuf]) -> MediaResult<()> {
    if let Some(parent) = list_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(list_path, render_concat_list(clips)).await?;
    Ok(())
}

/// `ffmpeg -f concat -safe 0 -i <list> -c copy <output>`
pub fn concat_command(list_path: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(FfmpegInput::file(list_path).args(["-f", "concat", "-safe", "0"]))
        .output_args(["-map", "0", "-c", "copy", "-movflags", "+faststart"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_escape_concat_path() {
        assert_eq!(escape_concat_path(Path::new("/w/clips/a.mp4")), "'/w/clips/a.mp4'");
        assert_eq!(
            escape_concat_path(Path::new("/w/Napoleon's Army/a.mp4")),
            r"'/w/Napoleon'\''s Army/a.mp4'"
        );
    }

    #[test]
    fn test_list_preserves_order() {
        let list = render_concat_list(&["/c/scene_5.mp4".into(), "/c/scene_2.mp4".into()]);
        assert_eq!(list, "file '/c/scene_5.mp4'\nfile '/c/scene_2.mp4'\n");
    }

    #[tokio::test]
    async fn test_write_concat_list() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("nested").join("concat.txt");
        write_concat_list(&list, &["/c/a.mp4".into()]).await.unwrap();
        assert_eq!(fs::read_to_string(&list).await.unwrap(), "file '/c/a.mp4'\n");
    }

    #[test]
    fn test_concat_command_copies_streams() {
        let cmd = concat_command(Path::new("/w/concat.txt"), Path::new("/w/final.partial.mp4"));
        let args = cmd.build_args();
        assert!(args.windows(4).any(|w| w == ["-f", "concat", "-safe", "0"]));
        assert_eq!(cmd.output_value("-c"), Some("copy"));
        assert_eq!(cmd.inputs()[0].source, "/w/concat.txt");
    }
}
