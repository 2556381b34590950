use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::debug;
use reqwest::{Client, Response, Url};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, UpdaterError};

pub const DEFAULT_API_BASE: &str = "https://papermc.io/api/v1/paper";

/// Status and the headers the updater cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
}

/// The HTTP operations the updater performs. Swappable so the update flow
/// can run against canned responses.
pub trait Transport {
    /// GET `url`, discard the body and report the status code.
    async fn get_status(&self, url: &str) -> Result<u16>;

    async fn head(&self, url: &str) -> Result<ResponseHead>;

    /// Download `url` into `dest`, calling `progress` with (downloaded, total).
    /// Returns the number of bytes written. `dest` is left untouched when the
    /// download fails.
    async fn download_to_path<F>(
        &self,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
        progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64, Option<u64>);
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("paper-updater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| UpdaterError::ClientUnavailable(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get_status(&self, url: &str) -> Result<u16> {
        debug!("network: GET {url}");
        let resp = self.client.get(url).send().await.map_err(http_error(url))?;
        Ok(resp.status().as_u16())
    }

    async fn head(&self, url: &str) -> Result<ResponseHead> {
        debug!("network: HEAD {url}");
        let resp = self.client.head(url).send().await.map_err(http_error(url))?;
        let headers = resp.headers();
        Ok(ResponseHead {
            status: resp.status().as_u16(),
            content_length: header_str(headers, CONTENT_LENGTH.as_str())
                .and_then(|value| value.trim().parse().ok()),
            content_disposition: header_str(headers, CONTENT_DISPOSITION.as_str())
                .map(str::to_owned),
        })
    }

    async fn download_to_path<F>(
        &self,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64, Option<u64>),
    {
        debug!("network: downloading {url} to {}", dest.display());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(http_error(url))?
            .error_for_status()
            .map_err(http_error(url))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| UpdaterError::io("failed to create download dir", e))?;
        }

        // Only a complete body ever appears under the build's own name.
        let partial = partial_path(dest);
        match stream_to_file(response, &partial, expected_size, &mut progress).await {
            Ok(downloaded) => {
                tokio::fs::rename(&partial, dest).await.map_err(|e| {
                    UpdaterError::io(format!("failed to move download to {}", dest.display()), e)
                })?;
                Ok(downloaded)
            }
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    debug!("network: could not remove {}: {cleanup}", partial.display());
                }
                Err(err)
            }
        }
    }
}

async fn stream_to_file<F>(
    response: Response,
    path: &Path,
    expected_size: Option<u64>,
    progress: &mut F,
) -> Result<u64>
where
    F: FnMut(u64, Option<u64>),
{
    let mut file = File::create(path)
        .await
        .map_err(|e| UpdaterError::io(format!("failed to create {}", path.display()), e))?;

    let total = response.content_length().or(expected_size);
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| UpdaterError::DownloadFailed(format!("stream error: {e}")))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| UpdaterError::io(format!("write error on {}", path.display()), e))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total);
    }

    file.flush()
        .await
        .map_err(|e| UpdaterError::io(format!("flush error on {}", path.display()), e))?;

    if let Some(total) = total
        && downloaded < total
    {
        return Err(UpdaterError::DownloadFailed(format!(
            "received {downloaded} of {total} bytes"
        )));
    }

    Ok(downloaded)
}

/// `paper-205.jar` -> `paper-205.jar.part`, which no build scan matches.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn http_error(url: &str) -> impl FnOnce(reqwest::Error) -> UpdaterError + '_ {
    move |source| UpdaterError::Http {
        url: url.to_owned(),
        source,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// The newest build the download endpoint currently advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestDownload {
    pub url: String,
    pub filename: String,
    pub size: u64,
}

/// PaperMC v1 endpoints on top of a [`Transport`].
pub struct PaperApi<T> {
    transport: T,
    api_base: String,
}

impl<T: Transport> PaperApi<T> {
    pub fn new(transport: T, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_owned();
        Self {
            transport,
            api_base,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn version_url(&self, version: &str) -> Result<String> {
        self.endpoint(&[version])
    }

    pub fn latest_download_url(&self, version: &str) -> Result<String> {
        self.endpoint(&[version, "latest", "download"])
    }

    /// Append path segments to the API base. Each segment is percent-encoded,
    /// so a `/` typed into a version cannot reach a different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let invalid = |reason: String| UpdaterError::InvalidApiUrl {
            url: self.api_base.clone(),
            reason,
        };
        let mut url = Url::parse(&self.api_base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("it cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Whether the API knows `version`. Only a 404 counts as unknown.
    pub async fn version_exists(&self, version: &str) -> Result<bool> {
        if version.trim().is_empty() {
            return Ok(false);
        }
        let status = self.transport.get_status(&self.version_url(version)?).await?;
        debug!("network: version {version} answered {status}");
        Ok(status != 404)
    }

    /// Ask the download endpoint which file it would serve, without fetching it.
    pub async fn latest_download(&self, version: &str) -> Result<LatestDownload> {
        let url = self.latest_download_url(version)?;
        let head = self.transport.head(&url).await?;
        if !(200..300).contains(&head.status) {
            return Err(UpdaterError::UnexpectedStatus {
                url,
                status: head.status,
            });
        }

        let Some(filename) = head
            .content_disposition
            .as_deref()
            .and_then(attachment_filename)
        else {
            return Err(UpdaterError::MissingHeader {
                url,
                header: "Content-Disposition",
            });
        };
        let Some(size) = head.content_length else {
            return Err(UpdaterError::MissingHeader {
                url,
                header: "Content-Length",
            });
        };

        Ok(LatestDownload {
            url,
            filename,
            size,
        })
    }
}

/// Pull the bare filename out of a `Content-Disposition` value.
fn attachment_filename(disposition: &str) -> Option<String> {
    let start = disposition.to_ascii_lowercase().find("filename=")? + "filename=".len();
    let raw = disposition[start..].split(';').next()?.trim().trim_matches('"');
    // Never let the server pick a directory.
    let name = Path::new(raw).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_owned())
}
