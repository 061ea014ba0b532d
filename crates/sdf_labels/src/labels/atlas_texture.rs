//! Shared atlas texture state
//!
//! Tracks what the host renderer has to upload. The pixel data itself stays in the atlas
//! bitmap; the host reads it from there.

/// Upload state of the shared atlas texture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtlasTexture {
    width: u32,
    height: u32,
    version: u64,
    needs_upload: bool,
    disposed: bool,
}

impl AtlasTexture {
    /// Create texture state for an atlas of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            version: 1,
            needs_upload: true,
            disposed: false,
        }
    }

    /// Record that the atlas contents changed
    pub fn update(&mut self) {
        if self.disposed {
            return;
        }
        self.version += 1;
        self.needs_upload = true;
    }

    /// Record that the host uploaded the current contents
    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }

    /// Release the texture
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.needs_upload = false;
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Incremented on every content change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Contents changed since the last upload
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// [`Self::dispose`] was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
