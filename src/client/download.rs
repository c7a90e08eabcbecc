//! Completed-export file download

use super::ExportClient;
use crate::classify::ErrorKind;
use crate::error::{Error, Result};
use crate::types::{FileHandle, JobHandle};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, info};

/// An open download of a completed export's output file
///
/// The body is not buffered; consume it either chunk by chunk through
/// [`bytes_stream`](DownloadStream::bytes_stream) or all at once through
/// [`collect`](DownloadStream::collect). Dropping the stream abandons the
/// transfer.
pub struct DownloadStream {
    response: reqwest::Response,
}

/// Upper bound on the buffer reserved up front in [`DownloadStream::collect`]
///
/// The declared content length comes from the server and is untrusted; the
/// buffer still grows past this as real bytes arrive.
const COLLECT_PREALLOC_CAP: u64 = 16 * 1024 * 1024;

fn prealloc_size(declared: Option<u64>) -> usize {
    declared.unwrap_or(0).min(COLLECT_PREALLOC_CAP) as usize
}

impl DownloadStream {
    /// Total size in bytes, when the server declares one
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Consume the download as a stream of byte chunks
    ///
    /// Mid-transfer network failures surface as [`Error::Transport`] items;
    /// the download is not retried.
    pub fn bytes_stream(self) -> impl Stream<Item = Result<Bytes>> {
        self.response.bytes_stream().map(|chunk| chunk.map_err(Error::Transport))
    }

    /// Drain the download into memory
    ///
    /// Convenience for callers handing the whole archive to a decompression
    /// or deserialization step. Prefer [`bytes_stream`](Self::bytes_stream)
    /// for large exports.
    pub async fn collect(self) -> Result<Vec<u8>> {
        let expected = self.content_length();
        let mut stream = self.bytes_stream();
        let mut buf = Vec::with_capacity(prealloc_size(expected));
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("url", &self.response.url().as_str())
            .field("content_length", &self.content_length())
            .finish()
    }
}

impl ExportClient {
    /// Open a download of a completed export's output file
    ///
    /// Issues a single GET against the file resource and returns once
    /// response headers arrive; the body transfers as the returned
    /// [`DownloadStream`] is consumed. No retry is attempted here; callers
    /// re-run the submit-poll-download sequence when they want one.
    ///
    /// # Errors
    ///
    /// - [`Error::RemoteJob`] when the server refuses the file request
    /// - [`Error::Transport`] on network-level failure
    pub async fn download(
        &self,
        handle: &JobHandle,
        file: &FileHandle,
    ) -> Result<DownloadStream> {
        let url = handle.download_url(file);
        debug!(survey = %handle.survey, url = %url, "opening export download");

        let response = self
            .http
            .get(&url)
            .headers(handle.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::remote(
                ErrorKind::from_transport_status(status),
                status.to_string(),
            ));
        }

        info!(
            survey = %handle.survey,
            file_id = %file.file_id,
            content_length = response.content_length().unwrap_or(0),
            "export download started"
        );
        Ok(DownloadStream { response })
    }
}
