use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tokio::{fs, fs::File, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::UploadError,
    models::UploadResponse,
    storage::{self, extension_of, NameTemplate, StoredFile},
};

pub const AUDIO_FIELD: &str = "soundtrack";
pub const COVER_FIELD: &str = "cover";

/// Files written so far by one request.
///
/// `cover` is recorded as soon as its file exists; `audio` only once it
/// has been fully written.
#[derive(Default)]
struct Upload {
    audio: Option<StoredFile>,
    cover: Option<StoredFile>,
}

impl Upload {
    async fn receive(
        &mut self,
        config: &Config,
        multipart: &mut Multipart,
    ) -> Result<(), UploadError> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            // parts without a filename are form values, not files
            let Some(file_name) = field
                .file_name()
                .filter(|file_name| !file_name.is_empty())
                .map(str::to_owned)
            else {
                continue;
            };

            match name.as_deref() {
                Some(AUDIO_FIELD) if self.audio.is_none() => {
                    let template = NameTemplate::audio(config.mode);
                    let (file, stored) =
                        storage::create_unique(&config.audio_dir, &template).await?;
                    let written = copy_field(field, file).await?;
                    info!(
                        original = %file_name,
                        stored = %stored.name,
                        bytes = written,
                        "stored soundtrack"
                    );
                    self.audio = Some(stored);
                }
                Some(COVER_FIELD) if self.cover.is_none() => {
                    let template = NameTemplate::cover(config.mode, extension_of(&file_name));
                    let (file, stored) =
                        storage::create_unique(&config.cover_dir, &template).await?;
                    let stored_name = stored.name.clone();
                    self.cover = Some(stored);
                    let written = copy_field(field, file).await?;
                    info!(
                        original = %file_name,
                        stored = %stored_name,
                        bytes = written,
                        "stored cover"
                    );
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// A cover that arrived ahead of a soundtrack that was never stored is
    /// removed; once the soundtrack exists nothing is rolled back.
    async fn discard_orphaned_cover(&mut self) {
        if self.audio.is_some() {
            return;
        }
        if let Some(cover) = self.cover.take() {
            if let Err(err) = fs::remove_file(&cover.path).await {
                warn!(path = %cover.path.display(), error = %err, "failed to remove staged cover");
            }
        }
    }
}

/// Streams every chunk of `field` into `file`. A failed copy leaves the
/// partial file in place.
async fn copy_field(mut field: Field<'_>, mut file: File) -> Result<u64, UploadError> {
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Handler for `POST /createTrack`.
pub async fn create_track(
    State(config): State<Arc<Config>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, UploadError> {
    let mut multipart = multipart?;
    let mut upload = Upload::default();

    if let Err(err) = upload.receive(&config, &mut multipart).await {
        upload.discard_orphaned_cover().await;
        return Err(err);
    }

    let Some(audio) = upload.audio.take() else {
        upload.discard_orphaned_cover().await;
        return Err(UploadError::MissingField(AUDIO_FIELD));
    };

    let body = serde_json::to_vec(&UploadResponse {
        audio_path: audio.name,
        cover_path: upload.cover.take().map(|cover| cover.name),
    })?;

    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}
