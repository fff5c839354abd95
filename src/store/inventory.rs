//! Inventory Store
//!
//! The generic entity store plus the inventory extras: options, pending
//! uploads and media buckets with their resolved images.

use std::sync::{Mutex, MutexGuard};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::watch;

use super::entity::{EntityStore, Ticket};
use super::{Clearable, StoreState, StoreStatus};
use crate::api::{self, cancellable, ApiClient};
use crate::error::{ApiError, ApiResult, Outcome};
use crate::models::{
    FieldTarget, ImageItem, Inventory, MediaBuckets, MediaItemRef, Record, UploadFile,
};

const OPTIONS_FIELD: &str = "options_info";

/// What the media side of the store is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaState {
    #[default]
    Idle,
    Fetching,
    Uploading,
    Removing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

/// Per-file result of a media upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub outcome: Outcome,
    /// Media ids paired with the item, in file order
    pub uploaded: Vec<String>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    fn rejected(outcome: Outcome) -> Self {
        Self {
            outcome,
            uploaded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_ok() && self.failed.is_empty()
    }
}

#[derive(Default)]
struct MediaInner {
    state: MediaState,
    pending: Vec<UploadFile>,
    buckets: MediaBuckets,
    images: Vec<ImageItem>,
}

pub struct InventoryStore {
    entity: EntityStore<Inventory>,
    media: Mutex<MediaInner>,
}

impl InventoryStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            entity: EntityStore::new(api),
            media: Mutex::new(MediaInner::default()),
        }
    }

    pub fn entity(&self) -> &EntityStore<Inventory> {
        &self.entity
    }

    fn api(&self) -> &ApiClient {
        self.entity.api()
    }

    fn media(&self) -> MutexGuard<'_, MediaInner> {
        self.media.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_media_state(&self, state: MediaState) {
        self.media().state = state;
        self.entity.touch();
    }

    // ========================
    // Entity delegation
    // ========================

    pub fn subscribe(&self) -> watch::Receiver<StoreStatus> {
        self.entity.subscribe()
    }

    pub fn status(&self) -> StoreStatus {
        self.entity.status()
    }

    pub fn state(&self) -> StoreState {
        self.entity.state()
    }

    pub fn is_changed(&self) -> bool {
        self.entity.is_changed()
    }

    pub fn id(&self) -> Option<String> {
        self.entity.id()
    }

    pub fn record(&self) -> Record {
        self.entity.record()
    }

    pub fn extdata(&self) -> Record {
        self.entity.extdata()
    }

    /// Load an item; media held for the previous item is dropped on success
    pub async fn load(&self, itemuid: &str) -> Outcome {
        let outcome = self.entity.load(itemuid).await;
        if outcome.is_ok() {
            *self.media() = MediaInner::default();
        }
        outcome
    }

    pub fn begin_new(&self) {
        self.entity.begin_new();
        *self.media() = MediaInner::default();
    }

    pub fn mutate_field(&self, target: FieldTarget, key: &str, value: impl Into<Value>) -> bool {
        self.entity.mutate_field(target, key, value)
    }

    /// Save the item together with its extension data and options
    pub async fn save(&self) -> Outcome {
        self.entity.save().await
    }

    pub fn clear(&self) {
        self.entity.clear();
        *self.media() = MediaInner::default();
    }

    // ========================
    // Options
    // ========================

    pub fn options(&self) -> Vec<String> {
        self.entity.side_strings(OPTIONS_FIELD)
    }

    /// Add the option if missing, remove it otherwise
    pub fn toggle_option(&self, name: &str) -> bool {
        self.entity.update_side(OPTIONS_FIELD, |options| {
            match options.iter().position(|o| o.as_str() == Some(name)) {
                Some(index) => {
                    options.remove(index);
                }
                None => options.push(Value::from(name)),
            }
            true
        })
    }

    // ========================
    // Media
    // ========================

    pub fn media_state(&self) -> MediaState {
        self.media().state
    }

    pub fn buckets(&self) -> MediaBuckets {
        self.media().buckets.clone()
    }

    pub fn images(&self) -> Vec<ImageItem> {
        self.media().images.clone()
    }

    pub fn set_upload_files(&self, files: Vec<UploadFile>) {
        self.media().pending = files;
        self.entity.touch();
    }

    pub fn pending_uploads(&self) -> Vec<String> {
        self.media()
            .pending
            .iter()
            .map(|f| f.file_name.clone())
            .collect()
    }

    fn require_id(&self) -> Result<String, Outcome> {
        self.entity.id().ok_or_else(|| {
            ApiError::Validation("inventory item has no id yet; save it first".to_string()).into()
        })
    }

    /// Refresh the media buckets and download photo previews
    pub async fn fetch_media(&self) -> Outcome {
        let itemuid = match self.require_id() {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let ticket = self.entity.ticket();
        self.set_media_state(MediaState::Fetching);
        let result = self.download_media(&ticket, &itemuid).await;
        self.finish_media(&ticket, result)
    }

    /// List media and resolve photos; failed downloads are skipped
    async fn download_media(
        &self,
        ticket: &Ticket,
        itemuid: &str,
    ) -> ApiResult<(MediaBuckets, Vec<ImageItem>)> {
        let api = self.api();
        let list = cancellable(&ticket.cancel, api::get_inventory_media_list(api, itemuid)).await?;
        let buckets = MediaBuckets::sort(list);

        let downloads = buckets.photos.iter().map(|photo: &MediaItemRef| async move {
            let src = cancellable(&ticket.cancel, api::get_media_item(api, &photo.mediauid)).await;
            (photo, src)
        });

        let mut images = Vec::new();
        for (photo, src) in join_all(downloads).await {
            match src {
                Ok(src) => images.push(ImageItem {
                    itemuid: photo.itemuid.clone(),
                    src,
                }),
                Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
                Err(e) => log::warn!("Skipping media {}: {}", photo.mediauid, e),
            }
        }
        Ok((buckets, images))
    }

    fn finish_media(
        &self,
        ticket: &Ticket,
        result: ApiResult<(MediaBuckets, Vec<ImageItem>)>,
    ) -> Outcome {
        if !self.entity.is_current(ticket) {
            return Outcome::Cancelled;
        }
        let outcome = {
            let mut media = self.media();
            media.state = MediaState::Idle;
            match result {
                Ok((buckets, images)) => {
                    media.buckets = buckets;
                    media.images = images;
                    Outcome::Ok
                }
                Err(e) => {
                    log::warn!("Failed to fetch inventory media: {}", e);
                    e.into()
                }
            }
        };
        self.entity.touch();
        outcome
    }

    /// Upload the files queued with `set_upload_files`. Files that failed
    /// stay queued for the next attempt.
    pub async fn upload_pending_media(&self) -> UploadReport {
        if let Err(outcome) = self.require_id() {
            return UploadReport::rejected(outcome);
        }
        let files = std::mem::take(&mut self.media().pending);
        let kept = files.clone();
        let report = self.upload_media(files).await;

        if report.outcome != Outcome::Cancelled && !report.failed.is_empty() {
            let retry: Vec<UploadFile> = kept
                .into_iter()
                .filter(|file| report.failed.iter().any(|f| f.file_name == file.file_name))
                .collect();
            let mut media = self.media();
            let queued = std::mem::take(&mut media.pending);
            media.pending = retry.into_iter().chain(queued).collect();
        }
        report
    }

    /// Upload every file concurrently, then refresh the media list.
    /// A failing file does not undo the others.
    pub async fn upload_media(&self, files: Vec<UploadFile>) -> UploadReport {
        let itemuid = match self.require_id() {
            Ok(id) => id,
            Err(outcome) => return UploadReport::rejected(outcome),
        };
        if files.is_empty() {
            return UploadReport::rejected(Outcome::Ok);
        }
        let ticket = self.entity.ticket();
        self.set_media_state(MediaState::Uploading);

        let uploads = files.into_iter().map(|file| {
            let ticket = &ticket;
            let itemuid = itemuid.as_str();
            async move {
                let file_name = file.file_name.clone();
                let result = cancellable(&ticket.cancel, self.upload_one(itemuid, file)).await;
                (file_name, result)
            }
        });
        let results = join_all(uploads).await;

        let mut uploaded = Vec::new();
        let mut failed = Vec::new();
        let mut cancelled = false;
        for (file_name, result) in results {
            match result {
                Ok(mediauid) => uploaded.push(mediauid),
                Err(ApiError::Cancelled) => cancelled = true,
                Err(e) => {
                    log::warn!("Upload of {} failed: {}", file_name, e);
                    failed.push(UploadFailure {
                        file_name,
                        error: e.to_string(),
                    });
                }
            }
        }
        log::info!(
            "Uploaded {} of {} files to {}",
            uploaded.len(),
            uploaded.len() + failed.len(),
            itemuid
        );

        if cancelled || !self.entity.is_current(&ticket) {
            return UploadReport {
                outcome: Outcome::Cancelled,
                uploaded,
                failed,
            };
        }

        let refresh = self.download_media(&ticket, &itemuid).await;
        let refreshed = self.finish_media(&ticket, refresh);
        let outcome = if !refreshed.is_ok() {
            refreshed
        } else if failed.is_empty() {
            Outcome::Ok
        } else {
            Outcome::Error(format!("{} of the files failed to upload", failed.len()))
        };
        UploadReport {
            outcome,
            uploaded,
            failed,
        }
    }

    /// Create a media record, fill it, pair it with the item
    async fn upload_one(&self, itemuid: &str, file: UploadFile) -> ApiResult<String> {
        let api = self.api();
        let record = api::create_media_item_record(api, file.media_type()).await?;
        let mediauid = api::upload_media(api, &record, file).await?;
        api::pair_media_with_inventory(api, itemuid, &mediauid).await?;
        Ok(mediauid)
    }

    /// Delete a media pairing by its item id and refresh the list
    pub async fn remove_media(&self, itemuid: &str) -> Outcome {
        let inventoryuid = match self.require_id() {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let ticket = self.entity.ticket();
        self.set_media_state(MediaState::Removing);

        let api = self.api();
        if let Err(e) = cancellable(&ticket.cancel, api::delete_media_item(api, itemuid)).await {
            if self.entity.is_current(&ticket) {
                self.set_media_state(MediaState::Idle);
            }
            log::warn!("Failed to delete media {}: {}", itemuid, e);
            return e.into();
        }

        let refresh = self.download_media(&ticket, &inventoryuid).await;
        self.finish_media(&ticket, refresh)
    }
}

impl Clearable for InventoryStore {
    fn clear(&self) {
        InventoryStore::clear(self);
    }
}
