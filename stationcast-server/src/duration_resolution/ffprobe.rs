use crate::duration_resolution::{DurationProbe, ProbeError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Measures media durations with `ffprobe`, which reads just the container metadata of local
/// files and remote URLs alike.
pub struct FfprobeDurationProbe {
	program: String,
}

impl FfprobeDurationProbe {
	pub fn new(program: impl Into<String>) -> Self {
		Self { program: program.into() }
	}
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
	async fn probe_seconds(&self, url: &str) -> Result<f64, ProbeError> {
		let output = Command::new(&self.program)
			.args(["-v", "error"])
			.args(["-show_entries", "format=duration"])
			.args(["-of", "default=noprint_wrappers=1:nokey=1"])
			.arg(url)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			// a timed out probe must not leave ffprobe running
			.kill_on_drop(true)
			.output()
			.await
			.map_err(ProbeError::Spawn)?;

		if !output.status.success() {
			return Err(ProbeError::Failed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
		}

		parse_duration_output(&String::from_utf8_lossy(&output.stdout))
	}
}

fn parse_duration_output(output: &str) -> Result<f64, ProbeError> {
	let output = output.trim();
	output
		.parse::<f64>()
		.map_err(|_| ProbeError::InvalidDuration(output.to_string()))
}
