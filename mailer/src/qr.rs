//! QR image links for acceptance mail.

use eventdesk_core::ParticipantId;

/// Public QR image generator used when no other base URL is configured.
pub const DEFAULT_QR_BASE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Default edge length of the QR image, in pixels.
pub const DEFAULT_QR_SIZE: u32 = 520;

/// Builds QR image URLs encoding a participant id.
///
/// The door scanner reads the id back out of the code, so the id is the
/// only payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrImageLinks {
    base_url: String,
    size: u32,
}

impl QrImageLinks {
    /// Links against `base_url`, rendering `size` x `size` images.
    #[must_use]
    pub fn new(base_url: impl Into<String>, size: u32) -> Self {
        Self {
            base_url: base_url.into(),
            size,
        }
    }

    /// URL of the QR image for `id`.
    #[must_use]
    pub fn url_for(&self, id: &ParticipantId) -> String {
        format!(
            "{}?data={}&size={size}x{size}",
            self.base_url,
            urlencoding::encode(id.as_str()),
            size = self.size
        )
    }
}

impl Default for QrImageLinks {
    fn default() -> Self {
        Self::new(DEFAULT_QR_BASE_URL, DEFAULT_QR_SIZE)
    }
}
