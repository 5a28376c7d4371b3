use newsdesk::config::NewsdeskConfig;
use newsdesk::storage::{self, LocalBucket, ObjectStore, POST_IMAGES_BUCKET};
use newsdesk::Error;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[test]
fn upload_lands_in_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let bucket = LocalBucket::new(dir.path(), POST_IMAGES_BUCKET, "https://cdn.example.com/");
    let stored = storage::upload_image(&bucket, "Front Page.PNG", PNG_MAGIC, 1024).unwrap();
    assert!(stored.key.ends_with(".png"));
    assert_eq!(
        stored.url,
        format!("https://cdn.example.com/post-images/{}", stored.key)
    );
    assert!(bucket.exists(&stored.key).unwrap());
    let on_disk = std::fs::read(dir.path().join(POST_IMAGES_BUCKET).join(&stored.key)).unwrap();
    assert_eq!(on_disk, PNG_MAGIC);
}

#[test]
fn refused_uploads_store_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let bucket = LocalBucket::new(dir.path(), POST_IMAGES_BUCKET, "/storage");
    assert!(matches!(
        storage::upload_image(&bucket, "report.pdf", PNG_MAGIC, 1024),
        Err(Error::UnsupportedImageType(_))
    ));
    assert!(matches!(
        storage::upload_image(&bucket, "empty.png", &[], 1024),
        Err(Error::EmptyUpload)
    ));
    assert!(matches!(
        storage::upload_image(&bucket, "huge.jpg", &[0u8; 64], 32),
        Err(Error::UploadTooLarge { size: 64, max: 32 })
    ));
    assert!(!bucket.dir().exists());
}

#[test]
fn config_round_trips_through_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = NewsdeskConfig::default();
    config.storage.root = dir.path().join("files");
    config.pool_size = 3;
    config.save(dir.path().join("config.json")).unwrap();

    let loaded = NewsdeskConfig::load(dir.path()).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.bucket().dir(), dir.path().join("files").join(POST_IMAGES_BUCKET));

    let missing = NewsdeskConfig::load_or_default(dir.path().join("nope.json")).unwrap();
    assert_eq!(missing, NewsdeskConfig::default());
    assert!(NewsdeskConfig::load(dir.path().join("nope.json")).is_err());
}
