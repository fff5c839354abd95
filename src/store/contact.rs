//! Contact Store
//!
//! Contacts carry prospects as a side collection and two driver licence
//! images stored as media records referenced from the contact itself.

use std::sync::{Mutex, MutexGuard};

use futures::future::join_all;
use serde_json::{json, Value};
use tokio::sync::watch;

use super::entity::EntityStore;
use super::{Clearable, StoreState, StoreStatus};
use crate::api::{self, cancellable, ApiClient};
use crate::error::{ApiError, ApiResult, Outcome};
use crate::models::{Contact, DlSide, FieldTarget, MediaType, Record, UploadFile};

const PROSPECT_FIELD: &str = "prospect";
const PROSPECT_ID_FIELDS: [&str; 2] = ["PROSPECT1_ID", "PROSPECT2_ID"];

/// Resolved licence images as data URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DlImages {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl DlImages {
    pub fn get(&self, side: DlSide) -> Option<&str> {
        match side {
            DlSide::Front => self.front.as_deref(),
            DlSide::Back => self.back.as_deref(),
        }
    }

    fn slot(&mut self, side: DlSide) -> &mut Option<String> {
        match side {
            DlSide::Front => &mut self.front,
            DlSide::Back => &mut self.back,
        }
    }
}

#[derive(Default)]
struct ContactExtras {
    contact_type: i64,
    ofac: Record,
    delete_reason: String,
    pending_front: Option<UploadFile>,
    pending_back: Option<UploadFile>,
    images: DlImages,
}

impl ContactExtras {
    fn pending(&mut self, side: DlSide) -> &mut Option<UploadFile> {
        match side {
            DlSide::Front => &mut self.pending_front,
            DlSide::Back => &mut self.pending_back,
        }
    }
}

pub struct ContactStore {
    entity: EntityStore<Contact>,
    extras: Mutex<ContactExtras>,
}

impl ContactStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            entity: EntityStore::new(api),
            extras: Mutex::new(ContactExtras::default()),
        }
    }

    pub fn entity(&self) -> &EntityStore<Contact> {
        &self.entity
    }

    fn extras(&self) -> MutexGuard<'_, ContactExtras> {
        self.extras.lock().unwrap_or_else(|p| p.into_inner())
    }

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

    pub fn prospects(&self) -> Vec<Record> {
        self.entity.side_records(PROSPECT_FIELD)
    }

    pub async fn load(&self, contactuid: &str) -> Outcome {
        let outcome = self.entity.load(contactuid).await;
        if outcome.is_ok() {
            let mut extras = self.extras();
            extras.images = DlImages::default();
            extras.pending_front = None;
            extras.pending_back = None;
            extras.contact_type = self.entity.record().get_i64("type").unwrap_or_default();
        }
        outcome
    }

    pub fn begin_new(&self) {
        self.entity.begin_new();
        *self.extras() = ContactExtras::default();
    }

    pub fn mutate_field(&self, target: FieldTarget, key: &str, value: impl Into<Value>) -> bool {
        self.entity.mutate_field(target, key, value)
    }

    pub fn clear(&self) {
        self.entity.clear();
        *self.extras() = ContactExtras::default();
    }

    // ========================
    // Plain fields
    // ========================

    pub fn contact_type(&self) -> i64 {
        self.extras().contact_type
    }

    pub fn set_contact_type(&self, contact_type: i64) {
        self.extras().contact_type = contact_type;
        self.entity.touch();
    }

    pub fn ofac(&self) -> Record {
        self.extras().ofac.clone()
    }

    pub fn set_ofac(&self, ofac: Record) {
        self.extras().ofac = ofac;
        self.entity.touch();
    }

    pub fn delete_reason(&self) -> String {
        self.extras().delete_reason.clone()
    }

    pub fn set_delete_reason(&self, reason: impl Into<String>) {
        self.extras().delete_reason = reason.into();
        self.entity.touch();
    }

    // ========================
    // Save
    // ========================

    /// Add a prospect row for each prospect id in the extension data that
    /// has none yet
    fn merge_prospects(&self) {
        let extdata = self.entity.extdata();
        let ids: Vec<String> = PROSPECT_ID_FIELDS
            .iter()
            .filter_map(|field| extdata.non_empty_str(field).map(str::to_string))
            .collect();
        if ids.is_empty() {
            return;
        }
        self.entity.update_side(PROSPECT_FIELD, |prospects| {
            let mut added = false;
            for id in &ids {
                let present = prospects
                    .iter()
                    .any(|p| p.get("notes").and_then(Value::as_str) == Some(id.as_str()));
                if !present {
                    prospects.push(json!({ "notes": id }));
                    added = true;
                }
            }
            added
        });
    }

    /// Save the contact, then upload any pending licence images against
    /// the saved id
    pub async fn save(&self) -> Outcome {
        if self.entity.state().is_busy() {
            return Outcome::Busy;
        }
        self.merge_prospects();
        let (contactuid, ticket) = match self.entity.persist().await {
            Ok(saved) => saved,
            Err(outcome) => return outcome,
        };

        let pending: Vec<(DlSide, UploadFile)> = {
            let mut extras = self.extras();
            DlSide::BOTH
                .into_iter()
                .filter_map(|side| extras.pending(side).take().map(|file| (side, file)))
                .collect()
        };
        if pending.is_empty() {
            return Outcome::Ok;
        }

        let uploads = pending.into_iter().map(|(side, file)| {
            let ticket = &ticket;
            let contactuid = contactuid.as_str();
            async move {
                let kept = file.clone();
                let result = cancellable(&ticket.cancel, self.upload_dl(contactuid, side, file)).await;
                (side, kept, result)
            }
        });

        let mut failures = Vec::new();
        for (side, file, result) in join_all(uploads).await {
            match result {
                Ok(mediauid) => self.entity.apply_server_field(&ticket, side.field(), mediauid),
                Err(ApiError::Cancelled) => return Outcome::Cancelled,
                Err(e) => {
                    log::warn!("Licence {:?} upload for {} failed: {}", side, contactuid, e);
                    if self.entity.is_current(&ticket) {
                        *self.extras().pending(side) = Some(file);
                    }
                    failures.push(format!("{:?}: {}", side, e));
                }
            }
        }

        if !self.entity.is_current(&ticket) {
            return Outcome::Cancelled;
        }
        if failures.is_empty() {
            Outcome::Ok
        } else {
            Outcome::Error(format!("licence upload failed ({})", failures.join("; ")))
        }
    }

    async fn upload_dl(&self, contactuid: &str, side: DlSide, file: UploadFile) -> ApiResult<String> {
        let api = self.entity.api();
        let record = api::create_media_item_record(api, MediaType::Photo).await?;
        let mediauid = api::upload_media(api, &record, file).await?;
        api::set_contact_dl(api, contactuid, side, &mediauid).await?;
        Ok(mediauid)
    }

    // ========================
    // Licence images
    // ========================

    /// Queue a licence image for the next save; `None` drops the queued one
    pub fn set_dl_file(&self, side: DlSide, file: Option<UploadFile>) {
        *self.extras().pending(side) = file;
        self.entity.touch();
    }

    pub fn pending_dl_file(&self, side: DlSide) -> Option<String> {
        self.extras()
            .pending(side)
            .as_ref()
            .map(|f| f.file_name.clone())
    }

    pub fn dl_images(&self) -> DlImages {
        self.extras().images.clone()
    }

    /// Download both licence sides referenced by the contact
    pub async fn fetch_dl_images(&self) -> Outcome {
        let record = self.entity.record();
        let ticket = self.entity.ticket();
        let api = self.entity.api();

        let downloads = DlSide::BOTH.into_iter().filter_map(|side| {
            let mediauid = record.non_empty_str(side.field())?.to_string();
            let ticket = &ticket;
            Some(async move {
                let url = cancellable(&ticket.cancel, api::get_media_item(api, &mediauid)).await;
                (side, url)
            })
        });
        let results = join_all(downloads).await;

        if !self.entity.is_current(&ticket) {
            return Outcome::Cancelled;
        }
        let mut outcome = Outcome::Ok;
        {
            let mut extras = self.extras();
            for (side, url) in results {
                match url {
                    Ok(url) => *extras.images.slot(side) = Some(url),
                    Err(e) => {
                        log::warn!("Failed to fetch licence {:?}: {}", side, e);
                        if outcome.is_ok() {
                            outcome = e.into();
                        }
                    }
                }
            }
        }
        self.entity.touch();
        outcome
    }

    /// Unlink one licence side from the contact
    pub async fn remove_dl_image(&self, side: DlSide) -> Outcome {
        let Some(contactuid) = self.entity.id() else {
            return ApiError::Validation("contact has no id yet".to_string()).into();
        };
        let ticket = self.entity.ticket();
        let api = self.entity.api();
        let result =
            cancellable(&ticket.cancel, api::delete_contact_dl(api, &contactuid, side)).await;

        if !self.entity.is_current(&ticket) {
            return Outcome::Cancelled;
        }
        match result {
            Ok(_) => {
                *self.extras().images.slot(side) = None;
                self.entity.apply_server_field(&ticket, side.field(), "");
                Outcome::Ok
            }
            Err(e) => {
                log::warn!("Failed to remove licence {:?} of {}: {}", side, contactuid, e);
                e.into()
            }
        }
    }
}

impl Clearable for ContactStore {
    fn clear(&self) {
        ContactStore::clear(self);
    }
}
