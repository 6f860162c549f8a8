//! Ordered, user-arranged list of images.
//!
//! This is the list a UI edits (add, remove, drag to reorder). Generation
//! never reads it directly: callers take a [`ImageSequence::snapshot`] and hand
//! that to the assembler, so edits made while a document is being built do
//! not affect it.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::record::ImageRecord;

#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    images: Vec<ImageRecord>,
}

impl ImageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image to the end of the sequence. Returns its id.
    pub fn push(&mut self, record: ImageRecord) -> Uuid {
        let id = record.id();
        self.images.push(record);
        id
    }

    /// Create a record from encoded bytes and append it.
    ///
    /// Non-JPEG/PNG content is rejected with [`Error::UnsupportedFormat`].
    pub fn add(&mut self, name: impl Into<String>, bytes: impl Into<bytes::Bytes>) -> Result<Uuid> {
        let record = ImageRecord::new(name, bytes)?;
        Ok(self.push(record))
    }

    /// Insert an image at `index`, shifting later images back.
    pub fn insert(&mut self, index: usize, record: ImageRecord) -> Result<Uuid> {
        if index > self.images.len() {
            return Err(Error::InvalidPosition {
                index,
                len: self.images.len(),
            });
        }
        let id = record.id();
        self.images.insert(index, record);
        Ok(id)
    }

    /// Remove an image by id and return it.
    pub fn remove(&mut self, id: Uuid) -> Result<ImageRecord> {
        let index = self.position(id).ok_or(Error::ImageNotFound(id))?;
        Ok(self.images.remove(index))
    }

    /// Move an image so that it ends up at `to`.
    ///
    /// `to` is the final index after the move, the way a drop target in a
    /// list is reported.
    pub fn move_to(&mut self, id: Uuid, to: usize) -> Result<()> {
        let from = self.position(id).ok_or(Error::ImageNotFound(id))?;
        if to >= self.images.len() {
            return Err(Error::InvalidPosition {
                index: to,
                len: self.images.len(),
            });
        }
        if from == to {
            return Ok(());
        }

        let record = self.images.remove(from);
        self.images.insert(to, record);
        Ok(())
    }

    /// Swap an image with its predecessor. No-op at the front.
    pub fn move_up(&mut self, id: Uuid) -> Result<()> {
        let from = self.position(id).ok_or(Error::ImageNotFound(id))?;
        if from > 0 {
            self.images.swap(from, from - 1);
        }
        Ok(())
    }

    /// Swap an image with its successor. No-op at the back.
    pub fn move_down(&mut self, id: Uuid) -> Result<()> {
        let from = self.position(id).ok_or(Error::ImageNotFound(id))?;
        if from + 1 < self.images.len() {
            self.images.swap(from, from + 1);
        }
        Ok(())
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.images.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&ImageRecord> {
        self.images.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.iter()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Current order as an independent list, for one generation.
    ///
    /// O(n) in the number of images; encoded bytes are shared, not copied.
    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.images.clone()
    }
}

impl FromIterator<ImageRecord> for ImageSequence {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}
