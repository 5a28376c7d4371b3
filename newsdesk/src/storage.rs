//! Storage for uploaded article images.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use serde::Serialize;

use crate::{Error, Result};

/// Bucket holding article images.
pub const POST_IMAGES_BUCKET: &str = "post-images";

/// Accepted image file extensions, lower-case.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A bucket of objects addressed by key and published at a URL.
pub trait ObjectStore: Debug + Send + Sync {
    /// Name of the bucket.
    fn bucket(&self) -> &str;
    /// Store `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// URL the object with `key` is served from.
    fn public_url(&self, key: &str) -> String;
    /// Whether an object is stored under `key`.
    fn exists(&self, key: &str) -> Result<bool>;
}

/// An [`ObjectStore`] keeping objects as files in `<root>/<bucket>/`.
#[derive(Clone, Debug)]
pub struct LocalBucket {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalBucket {
    /// Objects are stored under `root` and served below
    /// `public_base_url`, e.g. `/storage`.
    pub fn new(root: impl Into<PathBuf>, bucket: &str, public_base_url: &str) -> Self {
        LocalBucket {
            root: root.into(),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding the bucket's objects.
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::invalid("key", format!("invalid object key {key:?}")));
        }
        Ok(self.dir().join(key))
    }
}

impl ObjectStore for LocalBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        fs::create_dir_all(self.dir())?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path(key)?.is_file())
    }
}

/// Where an uploaded image ended up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

fn image_extension(original_name: &str) -> Result<String> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(Error::UnsupportedImageType(original_name.to_string()))
    }
}

/// A fresh object key: `<unix-millis>-<7 random base36 chars>.<ext>`.
pub fn image_key(ext: &str) -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..7)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{suffix}.{ext}", Utc::now().timestamp_millis())
}

/// Store an uploaded image under a fresh key. The file type is taken
/// from the extension of `original_name`.
pub fn upload_image(
    store: &dyn ObjectStore,
    original_name: &str,
    bytes: &[u8],
    max_bytes: u64,
) -> Result<StoredImage> {
    let ext = image_extension(original_name)?;
    let size = bytes.len() as u64;
    if size == 0 {
        return Err(Error::EmptyUpload);
    }
    if size > max_bytes {
        warn!("Refused upload of {original_name}, {size} bytes");
        return Err(Error::UploadTooLarge {
            size,
            max: max_bytes,
        });
    }
    let key = image_key(&ext);
    store.put(&key, bytes)?;
    let url = store.public_url(&key);
    info!("Stored {original_name} as {}/{key}", store.bucket());
    Ok(StoredImage { key, url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(image_extension("Photo.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("a.b.webp").unwrap(), "webp");
        assert!(matches!(
            image_extension("notes.pdf"),
            Err(Error::UnsupportedImageType(_))
        ));
        assert!(image_extension("no-extension").is_err());
    }

    #[test]
    fn keys_are_timestamped() {
        let key = image_key("png");
        let (millis, rest) = key.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        let (suffix, ext) = rest.split_once('.').unwrap();
        assert_eq!(suffix.len(), 7);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn local_keys_stay_in_bucket() {
        let bucket = LocalBucket::new("/tmp/unused", POST_IMAGES_BUCKET, "/storage/");
        assert!(bucket.path("../etc/passwd").is_err());
        assert!(bucket.path(".hidden").is_err());
        assert!(bucket.path("a/b.png").is_err());
        assert_eq!(
            bucket.public_url("1-abc.png"),
            "/storage/post-images/1-abc.png"
        );
    }
}
