use std::fs;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::artifact::ArtifactPattern;
use crate::config::Configuration;
use crate::error::{Result, UpdaterError};
use crate::networking::Transport;
use crate::updater::UpdateDescriptor;

const BAR_TEMPLATE: &str =
    "[{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched { replacements: usize },
    ScriptMissing,
}

/// Fetch the new build to `descriptor.target_path`, replacing any file there.
pub async fn download<T: Transport>(transport: &T, descriptor: &UpdateDescriptor) -> Result<u64> {
    let bar = ProgressBar::new(descriptor.size);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    bar.set_message(format!("build {}", descriptor.build));

    let result = transport
        .download_to_path(
            &descriptor.download_url,
            &descriptor.target_path,
            Some(descriptor.size),
            |downloaded, total| {
                if let Some(total) = total {
                    bar.set_length(total);
                }
                bar.set_position(downloaded);
            },
        )
        .await;

    match &result {
        Ok(bytes) => {
            bar.finish_and_clear();
            info!(
                "installer: wrote {bytes} bytes to {}",
                descriptor.target_path.display()
            );
        }
        Err(err) => {
            bar.abandon();
            warn!("installer: download of build {} failed: {err}", descriptor.build);
        }
    }
    result
}

/// Rewrite the launch script so it starts the downloaded build.
/// A missing script is reported through the outcome, not as an error.
pub fn patch_launch_script(
    pattern: &ArtifactPattern,
    config: &Configuration,
    descriptor: &UpdateDescriptor,
) -> Result<PatchOutcome> {
    let script = &config.script_path;
    if !script.is_file() {
        warn!("installer: start script {} not found", script.display());
        return Ok(PatchOutcome::ScriptMissing);
    }
    let text = fs::read_to_string(script)
        .map_err(|e| UpdaterError::io(format!("unable to read {}", script.display()), e))?;

    let filename = descriptor.file_name();
    let (patched, replacements) = pattern.retarget_references(&text, &filename);
    fs::write(script, patched)
        .map_err(|e| UpdaterError::io(format!("unable to write {}", script.display()), e))?;

    info!(
        "installer: {replacements} reference(s) in {} now point at {filename}",
        script.display()
    );
    Ok(PatchOutcome::Patched { replacements })
}
