use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::Configuration;
use crate::error::Result;
use crate::networking::{PaperApi, Transport};
use crate::prompt::{Answer, Console};

const MENU_TITLE: &str = "Paper Updater Configuration";
const EXIT_HINT: &str = "You can exit at any time by answering EXIT at any question.\n";
const RETRY: &str = "\nPress ENTER to retry ...";

/// Ask for a Paper version until the API recognises one or the user backs out.
/// With `current` set the question reads as a change from that value.
pub(super) async fn prompt_version<T, R, W>(
    console: &mut Console<R, W>,
    api: &PaperApi<T>,
    title: &str,
    current: Option<&str>,
) -> Result<Answer<String>>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    let question = match current {
        Some(current) => format!("Change from '{current}' --> "),
        None => "Enter the version you want to use (eg. '1.15.2'):   ".to_owned(),
    };

    loop {
        console.title(title)?;
        console.say(EXIT_HINT)?;

        let version = match console.ask(&question)? {
            Answer::Value(version) => version,
            Answer::Cancelled => return Ok(Answer::Cancelled),
        };

        if api.version_exists(&version).await? {
            console.clear()?;
            return Ok(Answer::Value(version));
        }

        debug!("config: rejected unknown version '{version}'");
        console.say(
            "\n\nERROR: The Paper version you specified does not exist. \
             Make sure the version is available here: https://papermc.io/downloads",
        )?;
        console.pause(RETRY)?;
    }
}

/// Ask for a launch script path until an existing file is named or the user
/// backs out.
pub(super) fn prompt_script_path<R, W>(
    console: &mut Console<R, W>,
    current: &Path,
) -> Result<Answer<PathBuf>>
where
    R: BufRead,
    W: Write,
{
    loop {
        console.title("Change start script path")?;
        console.say(EXIT_HINT)?;

        let question = format!("Change from '{}' --> ", current.display());
        let path = match console.ask(&question)? {
            Answer::Value(path) => PathBuf::from(path),
            Answer::Cancelled => return Ok(Answer::Cancelled),
        };

        if path.is_file() {
            return Ok(Answer::Value(path));
        }

        console.say("\n\nERROR: The path you specified does not exist.")?;
        console.pause(RETRY)?;
    }
}

/// Menu-driven editor. Changes are applied to `config` as they are accepted;
/// the return value says whether the caller should persist them.
pub async fn edit_interactive<T, R, W>(
    console: &mut Console<R, W>,
    api: &PaperApi<T>,
    config: &mut Configuration,
) -> Result<bool>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    loop {
        console.title(MENU_TITLE)?;
        console.say("Select an option:\n\n")?;
        console.say("(1) Change Paper version")?;
        console.say("(2) Change start script path")?;
        console.say("")?;
        console.say("(8) Exit without Saving")?;
        console.say("(9) Save and Exit")?;
        console.say("\n\n")?;

        let Some(selection) = console.read_line("> ")? else {
            debug!("config: input closed at the menu, discarding changes");
            return Ok(false);
        };

        match selection.trim().parse::<u8>() {
            Ok(1) => {
                let current = config.version.clone();
                if let Answer::Value(version) =
                    prompt_version(console, api, "Change Paper version", Some(&current)).await?
                {
                    info!("config: version changed from {current} to {version}");
                    config.version = version;
                }
            }
            Ok(2) => {
                if let Answer::Value(path) = prompt_script_path(console, &config.script_path)? {
                    info!("config: start script set to {}", path.display());
                    config.script_path = path;
                }
            }
            Ok(8) => {
                console.title(MENU_TITLE)?;
                if console.confirm("Are you sure you want to exit WITHOUT saving? (y/n) ")? {
                    return Ok(false);
                }
            }
            Ok(9) => return Ok(true),
            _ => {}
        }
    }
}
