//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_key, parse_progress_line, FfmpegProgress};

/// Stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 40;

/// One `-i` input together with the options that precede it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegInput {
    /// Input options (before -i)
    pub args: Vec<String>,
    /// File path or lavfi source expression
    pub source: String,
}

impl FfmpegInput {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            args: Vec::new(),
            source: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// A lavfi virtual source, e.g. `anullsrc=r=48000:cl=stereo`.
    pub fn lavfi(expr: impl Into<String>) -> Self {
        Self {
            args: vec!["-f".to_string(), "lavfi".to_string()],
            source: expr.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Limit how much of the input is read.
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.3}", seconds))
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs, in `-i` order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input.
    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add a plain file input.
    pub fn input_file(self, path: impl AsRef<Path>) -> Self {
        self.input(FfmpegInput::file(path))
    }

    /// Add output arguments.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Cut the output to an exact duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn inputs(&self) -> &[FfmpegInput] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The `-filter_complex` graph, if one was set.
    pub fn filter_graph(&self) -> Option<&str> {
        self.output_value("-filter_complex")
    }

    /// Value following `flag` among the output arguments.
    pub fn output_value(&self, flag: &str) -> Option<&str> {
        self.output_args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.output_args.get(i + 1))
            .map(String::as_str)
    }

    /// Output length set with [`Self::duration`], in milliseconds.
    pub fn output_duration_ms(&self) -> Option<i64> {
        self.output_value("-t")
            .and_then(|secs| secs.parse::<f64>().ok())
            .map(|secs| (secs * 1000.0).round() as i64)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());
        args.push("-nostats".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command, logging its progress at debug level.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let total_ms = cmd.output_duration_ms().unwrap_or(0);
        let output = cmd.output().display().to_string();
        self.run_with_progress(cmd, move |progress| {
            debug!(
                output = %output,
                out_time_ms = progress.out_time_ms,
                percent = progress.percentage(total_ms),
                speed = progress.speed,
                "FFmpeg progress"
            );
        })
        .await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        // Progress lines feed the callback; everything else is kept for diagnostics.
        let stderr_handle = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if is_progress_key(&line) {
                    if let Some(progress) = parse_progress_line(&line, &mut current) {
                        progress_callback(progress);
                    }
                } else {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }

            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr_tail = stderr_handle.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr_tail).filter(|s| !s.is_empty()),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with timeout.
    async fn wait_for_completion(
        &self,
        child: &mut Child,
    ) -> MediaResult<std::process::ExitStatus> {
        match self.timeout_secs {
            Some(timeout_secs) => {
                match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(status) => Ok(status?),
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(timeout_secs))
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input(FfmpegInput::file("image.png").args(["-loop", "1"]).duration(6.0))
            .input(FfmpegInput::lavfi("anullsrc=r=48000:cl=stereo"))
            .filter_complex("[0:v]null[v]")
            .map("[v]")
            .map("1:a")
            .duration(6.0);

        let args = cmd.build_args();
        assert_eq!(&args[..2], &["-y", "-v"]);

        let first_input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(&args[first_input - 4..first_input], &["-loop", "1", "-t", "6.000"]);
        assert_eq!(args[first_input + 1], "image.png");
        assert!(args.windows(2).any(|w| w == ["lavfi", "-i"]));
        assert_eq!(args.last().unwrap(), "out.mp4");

        assert_eq!(cmd.filter_graph(), Some("[0:v]null[v]"));
        assert_eq!(cmd.output_value("-t"), Some("6.000"));
        assert_eq!(cmd.inputs().len(), 2);
    }

    #[test]
    fn test_outputs_follow_inputs() {
        let cmd = FfmpegCommand::new("o.mp4")
            .output_arg("-c")
            .output_arg("copy")
            .input_file("a.mp4");
        let args = cmd.build_args();
        let input = args.iter().position(|a| a == "a.mp4").unwrap();
        let codec = args.iter().position(|a| a == "copy").unwrap();
        assert!(codec > input);
    }

    #[test]
    fn test_output_duration_feeds_progress_percentage() {
        let cmd = FfmpegCommand::new("clip.mp4").input_file("a.mp4").duration(4.0);
        assert_eq!(cmd.output_duration_ms(), Some(4000));

        let mut progress = FfmpegProgress::default();
        parse_progress_line("out_time_us=1000000", &mut progress);
        let snapshot = parse_progress_line("progress=continue", &mut progress).unwrap();
        assert!((snapshot.percentage(4000) - 25.0).abs() < 0.01);

        let uncut = FfmpegCommand::new("joined.mp4").input_file("list.txt");
        assert_eq!(uncut.output_duration_ms(), None);
    }
}
