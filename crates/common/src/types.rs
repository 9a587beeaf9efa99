use serde::{Deserialize, Serialize};

/// A media attachment, already read into memory by the transport layer.
///
/// The core never touches filesystem paths; uploads arrive here as bytes
/// plus the metadata the messaging network needs to deliver them.
#[derive(Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    pub mime_type: String,
    pub filename: String,
    #[serde(with = "bytes_b64")]
    pub data: Vec<u8>,
}

impl MediaPayload {
    pub fn new(mime_type: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            filename: filename.into(),
            data,
        }
    }

    /// True when every field a delivery needs is present.
    pub fn is_complete(&self) -> bool {
        !self.mime_type.is_empty() && !self.filename.is_empty() && !self.data.is_empty()
    }
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("mime_type", &self.mime_type)
            .field("filename", &self.filename)
            .field("data", &format!("{} bytes", self.data.len()))
            .finish()
    }
}

/// Attachment bytes cross JSON boundaries as base64 strings.
mod bytes_b64 {
    use {
        base64::{Engine as _, engine::general_purpose::STANDARD},
        serde::{Deserialize, Deserializer, Serializer, de::Error},
    };

    pub fn serialize<S: Serializer>(data: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(de)?;
        STANDARD.decode(raw).map_err(D::Error::custom)
    }
}
