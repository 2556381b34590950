use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::{debug, info};

use crate::artifact::ArtifactPattern;
use crate::config::Configuration;
use crate::error::Result;
use crate::installer::{self, PatchOutcome};
use crate::networking::{PaperApi, Transport};
use crate::prompt::Console;
use crate::util::format_size;

/// A newer build that the user agreed to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDescriptor {
    pub target_path: PathBuf,
    pub download_url: String,
    pub build: u64,
    pub size: u64,
}

impl UpdateDescriptor {
    pub fn file_name(&self) -> String {
        self.target_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Compares the API's latest build against the builds sitting in the
/// server directory and installs newer ones.
pub struct Updater<T> {
    api: PaperApi<T>,
    pattern: ArtifactPattern,
    server_dir: PathBuf,
}

impl<T: Transport> Updater<T> {
    pub fn new(api: PaperApi<T>, pattern: ArtifactPattern, server_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            pattern,
            server_dir: server_dir.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &PaperApi<T> {
        &self.api
    }

    pub async fn check_for_update<R, W>(
        &self,
        config: &Configuration,
        console: &mut Console<R, W>,
        interactive_confirm: bool,
    ) -> Result<Option<UpdateDescriptor>>
    where
        R: BufRead,
        W: Write,
    {
        console.say("Checking for updates ...")?;

        let latest = self.api.latest_download(&config.version).await?;
        let latest_build = self.pattern.parse_build_number(&latest.filename)?;
        let installed = self.pattern.installed_build(&self.server_dir)?;
        debug!("updater: latest build {latest_build}, installed {installed:?}");

        if let Some(current) = installed
            && latest_build <= current
        {
            console.say(format!("No updates are available (current build: {current})"))?;
            return Ok(None);
        }

        console.say("An update is available!\n")?;
        console.say(format!("New Build:         {latest_build}"))?;
        match installed {
            Some(current) => console.say(format!("Installed Build:   {current}"))?,
            None => console.say("Installed Build:   No installed build was found")?,
        }
        console.say(format!("Download Size:     {}", format_size(latest.size)))?;
        console.say("\n")?;

        if interactive_confirm && !console.confirm("Download and Install Update? (y/n) ")? {
            info!("updater: build {latest_build} declined");
            return Ok(None);
        }

        Ok(Some(UpdateDescriptor {
            target_path: self.server_dir.join(&latest.filename),
            download_url: latest.url,
            build: latest_build,
            size: latest.size,
        }))
    }

    /// Download the build and point the launch script at it.
    pub async fn install<R, W>(
        &self,
        config: &Configuration,
        descriptor: &UpdateDescriptor,
        console: &mut Console<R, W>,
    ) -> Result<PatchOutcome>
    where
        R: BufRead,
        W: Write,
    {
        console.say("\n\nDownloading update...")?;
        installer::download(self.api.transport(), descriptor).await?;

        console.say("Updating server script...")?;
        let outcome = installer::patch_launch_script(&self.pattern, config, descriptor)?;
        match outcome {
            PatchOutcome::Patched { replacements } => {
                debug!("updater: patched {replacements} reference(s) in the start script");
            }
            PatchOutcome::ScriptMissing => console.say(format!(
                "ERROR: Start script path '{}' cannot be found. \
                 Please update your server script manually.",
                config.script_path.display()
            ))?,
        }
        Ok(outcome)
    }

    /// One full pass: detect, then install if there is something to install.
    pub async fn run<R, W>(
        &self,
        config: &Configuration,
        console: &mut Console<R, W>,
        interactive_confirm: bool,
    ) -> Result<Option<UpdateDescriptor>>
    where
        R: BufRead,
        W: Write,
    {
        let Some(descriptor) = self
            .check_for_update(config, console, interactive_confirm)
            .await?
        else {
            return Ok(None);
        };

        self.install(config, &descriptor, console).await?;
        console.say("\nDone!\n------------------\n\n")?;
        info!("updater: build {} installed", descriptor.build);
        Ok(Some(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networking::ResponseHead;
    use crate::networking::tests::FakeTransport;
    use crate::prompt::tests::{scripted, transcript};
    use std::fs;
    use std::path::Path;

    const DOWNLOAD_URL: &str = "https://api.test/paper/1.16.5/latest/download";

    fn updater(server_dir: &Path, latest: &str, body: &[u8]) -> Updater<FakeTransport> {
        let mut transport = FakeTransport::default();
        transport.heads.insert(
            DOWNLOAD_URL.into(),
            ResponseHead {
                status: 200,
                content_length: Some(body.len() as u64),
                content_disposition: Some(format!("attachment; filename={latest}")),
            },
        );
        transport.bodies.insert(DOWNLOAD_URL.into(), body.to_vec());
        Updater::new(
            PaperApi::new(transport, "https://api.test/paper"),
            ArtifactPattern::new("server", "jar"),
            server_dir,
        )
    }

    fn config(script_path: PathBuf) -> Configuration {
        Configuration {
            version: "1.16.5".into(),
            script_path,
        }
    }

    #[tokio::test]
    async fn same_build_means_no_update() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("server-100.jar"), b"old").unwrap();
        let updater = updater(tmp.path(), "server-100.jar", b"new");

        let mut console = scripted(&[]);
        let cfg = config(tmp.path().join("start.sh"));
        let outcome = updater.run(&cfg, &mut console, false).await.unwrap();

        assert_eq!(outcome, None);
        assert!(updater.api().transport().downloads().is_empty());
        assert!(transcript(&console).contains("No updates are available (current build: 100)"));
    }

    #[tokio::test]
    async fn older_remote_build_means_no_update() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("server-300.jar"), b"").unwrap();
        let updater = updater(tmp.path(), "server-205.jar", b"new");

        let mut console = scripted(&[]);
        let cfg = config(tmp.path().join("start.sh"));
        assert_eq!(
            updater.check_for_update(&cfg, &mut console, true).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn fresh_install_downloads_and_patches() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("start.sh");
        fs::write(&script, "java -jar \"./server-100.jar\" nogui\n").unwrap();
        let updater = updater(tmp.path(), "server-205.jar", b"jar bytes");

        let mut console = scripted(&[]);
        let outcome = updater
            .run(&config(script.clone()), &mut console, false)
            .await
            .unwrap();

        let expected = UpdateDescriptor {
            target_path: tmp.path().join("server-205.jar"),
            download_url: DOWNLOAD_URL.into(),
            build: 205,
            size: 9,
        };
        assert_eq!(outcome, Some(expected));
        assert_eq!(updater.api().transport().downloads(), vec![DOWNLOAD_URL]);
        assert_eq!(
            fs::read(tmp.path().join("server-205.jar")).unwrap(),
            b"jar bytes"
        );
        assert_eq!(
            fs::read_to_string(&script).unwrap(),
            "java -jar \"./server-205.jar\" nogui\n"
        );

        let out = transcript(&console);
        assert!(out.contains("New Build:         205"));
        assert!(out.contains("Installed Build:   No installed build was found"));
        assert!(out.contains("Download Size:     9.0 B"));
        assert!(out.contains("Done!"));
    }

    #[tokio::test]
    async fn confirmation_gates_the_download() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("server-100.jar"), b"").unwrap();
        let updater = updater(tmp.path(), "server-205.jar", b"jar");
        let cfg = config(tmp.path().join("start.sh"));

        let mut declined = scripted(&["n"]);
        assert_eq!(updater.run(&cfg, &mut declined, true).await.unwrap(), None);
        assert!(updater.api().transport().downloads().is_empty());
        assert!(transcript(&declined).contains("Installed Build:   100"));

        let mut accepted = scripted(&["Y"]);
        let outcome = updater.run(&cfg, &mut accepted, true).await.unwrap();
        assert_eq!(outcome.map(|d| d.build), Some(205));
        assert_eq!(updater.api().transport().downloads().len(), 1);
    }

    #[tokio::test]
    async fn missing_script_still_completes() {
        let tmp = tempfile::tempdir().unwrap();
        let updater = updater(tmp.path(), "server-205.jar", b"jar");
        let cfg = config(tmp.path().join("missing.sh"));

        let mut console = scripted(&[]);
        let outcome = updater.run(&cfg, &mut console, false).await.unwrap();

        assert!(outcome.is_some());
        assert!(tmp.path().join("server-205.jar").exists());
        let out = transcript(&console);
        assert!(out.contains("cannot be found. Please update your server script manually."));
        assert!(out.contains("Done!"));
    }

    #[tokio::test]
    async fn unrecognised_remote_filename_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let updater = updater(tmp.path(), "server-latest.jar", b"jar");
        let cfg = config(tmp.path().join("start.sh"));

        let mut console = scripted(&[]);
        assert!(matches!(
            updater.run(&cfg, &mut console, false).await,
            Err(crate::error::UpdaterError::UnrecognizedArtifact(_))
        ));
    }
}
