//! Ordered media list with an exclusive cover.

use std::sync::Arc;

use adwizard_core::config::Dimensions;
use adwizard_core::draft::MediaId;
use adwizard_core::remote::{ServerMedia, UploadFile, UploadedMedia};
use thiserror::Error;
use uuid::Uuid;

use crate::privacy::PreparedFile;

/// Errors from local media list operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// The requested order is not a permutation of the current indices.
    #[error("order {0:?} is not a permutation of the media list")]
    NotAPermutation(Vec<usize>),

    /// No item has this local id.
    #[error("no media item with local id {0}")]
    UnknownItem(Uuid),

    /// Some items have not been uploaded yet.
    #[error("{0} media item(s) have no server id yet")]
    NotUploaded(usize),

    /// The upload response does not line up with the request.
    #[error("upload returned {returned} result(s) for {sent} file(s)")]
    UploadMismatch {
        /// Files sent.
        sent: usize,
        /// Results received.
        returned: usize,
    },
}

/// What the UI shows for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewHandle {
    /// Local bytes, before upload.
    Local(Arc<[u8]>),
    /// Server URL, after upload.
    Remote(String),
}

/// One photo (or other file) in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Client-side identity, stable across reorders.
    pub local_id: Uuid,
    /// Server id, `None` until uploaded.
    pub media_id: Option<MediaId>,
    /// Preview source.
    pub preview: PreviewHandle,
    /// Position in the list.
    pub order: usize,
    /// Whether this is the cover.
    pub is_cover: bool,
    /// Pixel size, when known.
    pub dimensions: Option<Dimensions>,
    /// Contents awaiting upload; cleared once uploaded.
    pub file: Option<PreparedFile>,
}

/// Ordered media list. Whenever it is non-empty exactly one item is cover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaList {
    items: Vec<MediaItem>,
}

impl MediaList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The cover item.
    #[must_use]
    pub fn cover(&self) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.is_cover)
    }

    /// Appends prepared files. When the list was empty, the first added item
    /// becomes the cover.
    pub fn add(&mut self, files: Vec<PreparedFile>) -> Vec<Uuid> {
        let mut added = Vec::with_capacity(files.len());
        for file in files {
            let local_id = Uuid::new_v4();
            self.items.push(MediaItem {
                local_id,
                media_id: None,
                preview: PreviewHandle::Local(Arc::clone(&file.bytes)),
                order: self.items.len(),
                is_cover: false,
                dimensions: file.dimensions,
                file: Some(file),
            });
            added.push(local_id);
        }
        self.repair_cover();
        added
    }

    /// Appends items that already exist elsewhere (keeping their local ids),
    /// for example those picked while an upload was in flight.
    pub fn adopt(&mut self, items: Vec<MediaItem>) {
        for mut item in items {
            item.is_cover = false;
            self.items.push(item);
        }
        self.renumber();
        self.repair_cover();
    }

    /// Removes an item; the first remaining item takes over as cover when
    /// the cover is removed.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnknownItem` if no item has `local_id`.
    pub fn remove(&mut self, local_id: Uuid) -> Result<MediaItem, MediaError> {
        let idx = self.index_of(local_id)?;
        let removed = self.items.remove(idx);
        self.renumber();
        self.repair_cover();
        Ok(removed)
    }

    /// Makes `local_id` the only cover.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnknownItem` if no item has `local_id`.
    pub fn set_cover(&mut self, local_id: Uuid) -> Result<(), MediaError> {
        let idx = self.index_of(local_id)?;
        for (i, item) in self.items.iter_mut().enumerate() {
            item.is_cover = i == idx;
        }
        Ok(())
    }

    /// Applies a permutation: `new_order[i]` is the current index of the item
    /// that moves to position `i`. Local only; nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotAPermutation` unless `new_order` contains every
    /// current index exactly once.
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), MediaError> {
        let mut seen = vec![false; self.items.len()];
        let valid = new_order.len() == self.items.len()
            && new_order.iter().all(|&idx| {
                idx < seen.len() && !std::mem::replace(&mut seen[idx], true)
            });
        if !valid {
            return Err(MediaError::NotAPermutation(new_order.to_vec()));
        }
        let mut slots: Vec<Option<MediaItem>> = self.items.drain(..).map(Some).collect();
        self.items = new_order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        self.renumber();
        Ok(())
    }

    /// Items still lacking a server id.
    pub fn pending(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(|item| item.media_id.is_none())
    }

    /// Upload DTOs for every pending item, paired with its local id.
    #[must_use]
    pub fn pending_uploads(&self) -> Vec<(Uuid, UploadFile)> {
        self.pending()
            .filter_map(|item| item.file.as_ref().map(|file| (item.local_id, file.to_upload())))
            .collect()
    }

    /// Records the server ids of a completed batch. Either every item of the
    /// batch is updated or none is.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UploadMismatch` when the counts differ and
    /// `MediaError::UnknownItem` when a local id vanished meanwhile.
    pub fn assign_server_ids(
        &mut self,
        local_ids: &[Uuid],
        uploaded: &[UploadedMedia],
    ) -> Result<(), MediaError> {
        if local_ids.len() != uploaded.len() {
            return Err(MediaError::UploadMismatch {
                sent: local_ids.len(),
                returned: uploaded.len(),
            });
        }
        let indices = local_ids
            .iter()
            .map(|id| self.index_of(*id))
            .collect::<Result<Vec<_>, _>>()?;
        for (idx, media) in indices.into_iter().zip(uploaded) {
            let item = &mut self.items[idx];
            item.media_id = Some(media.media_id.clone());
            item.preview = PreviewHandle::Remote(media.url.clone());
            item.file = None;
        }
        Ok(())
    }

    /// Server ids in display order plus the cover's server id.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotUploaded` while any item lacks a server id.
    pub fn server_order(&self) -> Result<(Vec<MediaId>, Option<MediaId>), MediaError> {
        let missing = self.pending().count();
        if missing > 0 {
            return Err(MediaError::NotUploaded(missing));
        }
        let order = self
            .items
            .iter()
            .filter_map(|item| item.media_id.clone())
            .collect();
        let cover = self.cover().and_then(|item| item.media_id.clone());
        Ok((order, cover))
    }

    /// Replaces the list with the server's canonical one, keeping local ids
    /// (and dimensions) of items the server still knows.
    pub fn reconcile(&mut self, canonical: &[ServerMedia]) {
        let previous = std::mem::take(&mut self.items);
        self.items = canonical
            .iter()
            .enumerate()
            .map(|(order, entry)| {
                let known = previous
                    .iter()
                    .find(|item| item.media_id.as_ref() == Some(&entry.media_id));
                MediaItem {
                    local_id: known.map_or_else(Uuid::new_v4, |item| item.local_id),
                    media_id: Some(entry.media_id.clone()),
                    preview: PreviewHandle::Remote(entry.url.clone()),
                    order,
                    is_cover: false,
                    dimensions: known.and_then(|item| item.dimensions),
                    file: None,
                }
            })
            .collect();
        let cover = canonical.iter().position(|entry| entry.is_cover).unwrap_or(0);
        if let Some(item) = self.items.get_mut(cover) {
            item.is_cover = true;
        }
    }

    fn index_of(&self, local_id: Uuid) -> Result<usize, MediaError> {
        self.items
            .iter()
            .position(|item| item.local_id == local_id)
            .ok_or(MediaError::UnknownItem(local_id))
    }

    fn renumber(&mut self) {
        for (order, item) in self.items.iter_mut().enumerate() {
            item.order = order;
        }
    }

    fn repair_cover(&mut self) {
        let covers = self.items.iter().filter(|item| item.is_cover).count();
        if covers == 1 {
            return;
        }
        let keep = self.items.iter().position(|item| item.is_cover).unwrap_or(0);
        for (i, item) in self.items.iter_mut().enumerate() {
            item.is_cover = i == keep;
        }
    }
}
