use std::{fmt, path::Path, sync::Arc};

/// Text the device answers with once an image has been stored.
///
/// The device signals completion only through this sentence in a 200 body,
/// so the check is a compatibility shim rather than a structured status.
pub const UPLOAD_SUCCESS_SENTINEL: &str = "File has been uploaded successfully.";

/// Image kind selected by the operator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UploadTarget {
    #[default]
    Firmware,
    Filesystem,
}

/// Whether the image is sent compressed, derived from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Raw,
    Compressed,
}

impl Compression {
    const COMPRESSED_EXTENSION: &str = "zz";

    pub fn from_file_name(file_name: &str) -> Self {
        match Path::new(file_name).extension() {
            Some(ext) if ext == Self::COMPRESSED_EXTENSION => Self::Compressed,
            _ => Self::Raw,
        }
    }
}

/// One of the four upload endpoints of the device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadEndpoint {
    pub target: UploadTarget,
    pub compression: Compression,
}

impl UploadEndpoint {
    /// Select the endpoint for a target and the name of the file to send
    pub fn select(target: UploadTarget, file_name: &str) -> Self {
        Self {
            target,
            compression: Compression::from_file_name(file_name),
        }
    }

    pub fn path(&self) -> &'static str {
        match (self.target, self.compression) {
            (UploadTarget::Firmware, Compression::Raw) => "/api/update-firmware",
            (UploadTarget::Firmware, Compression::Compressed) => "/api/update-compressed-firmware",
            (UploadTarget::Filesystem, Compression::Raw) => "/api/update-filesystem",
            (UploadTarget::Filesystem, Compression::Compressed) => {
                "/api/update-compressed-filesystem"
            }
        }
    }
}

/// Image file selected for upload
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Raw answer of an upload endpoint, interpreted by the upload controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub status: u16,
    pub body: String,
}

/// Progress callback invoked with `(bytes_sent, total_bytes)`
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// State of the firmware upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Completed,
    Failed(String),
}

impl UploadState {
    /// Convert a terminal state into a result, `Failed` becoming `UploadFailed`
    pub fn into_result(self) -> crate::error::Result<()> {
        match self {
            Self::Failed(reason) => Err(crate::error::ClientError::UploadFailed { reason }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod endpoint_selection {
        use super::*;

        #[test]
        fn compressed_filesystem_for_zz_extension() {
            let endpoint = UploadEndpoint::select(UploadTarget::Filesystem, "littlefs.bin.zz");
            assert_eq!(endpoint.compression, Compression::Compressed);
            assert_eq!(endpoint.path(), "/api/update-compressed-filesystem");
        }

        #[test]
        fn raw_firmware_for_bin_extension() {
            let endpoint = UploadEndpoint::select(UploadTarget::Firmware, "firmware.bin");
            assert_eq!(endpoint.compression, Compression::Raw);
            assert_eq!(endpoint.path(), "/api/update-firmware");
        }

        #[test]
        fn compressed_firmware_for_zz_extension() {
            let endpoint = UploadEndpoint::select(UploadTarget::Firmware, "firmware.zz");
            assert_eq!(endpoint.path(), "/api/update-compressed-firmware");
        }

        #[test]
        fn raw_filesystem_without_extension() {
            let endpoint = UploadEndpoint::select(UploadTarget::Filesystem, "spiffs");
            assert_eq!(endpoint.path(), "/api/update-filesystem");
        }

        #[test]
        fn extension_match_is_exact() {
            assert_eq!(Compression::from_file_name("image.ZZ"), Compression::Raw);
            assert_eq!(Compression::from_file_name("image.zzz"), Compression::Raw);
            assert_eq!(Compression::from_file_name("zz"), Compression::Raw);
        }
    }

    #[test]
    fn failed_state_converts_to_upload_failed() {
        let err = UploadState::Failed("upload failed".to_string())
            .into_result()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ClientError::UploadFailed { ref reason } if reason == "upload failed"
        ));
        assert!(UploadState::Completed.into_result().is_ok());
    }
}
