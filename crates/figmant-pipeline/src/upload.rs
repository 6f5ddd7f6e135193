use bytes::Bytes;
use figmant_store::{attachment_key, new_upload_id, ObjectStore, StoreError};

/// Where an uploaded attachment landed.
#[derive(Debug, Clone)]
pub struct UploadedObject {
    /// The remote object key.
    pub key: String,
    /// A resolvable URL for the object.
    pub url: String,
}

/// Push one payload to the object store under a collision-resistant key and
/// resolve its public URL. Every attempt (including retries) gets a fresh
/// random key component.
pub async fn upload_attachment(
    store: &dyn ObjectStore,
    filename: &str,
    data: Bytes,
) -> Result<UploadedObject, StoreError> {
    let key = attachment_key(&new_upload_id(), filename);
    store.put(&key, data).await?;
    let url = store.public_url(&key);
    Ok(UploadedObject { key, url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figmant_store::{LocalStore, StoreConfig};

    fn local_store(dir: &std::path::Path) -> LocalStore {
        LocalStore::new(&StoreConfig {
            endpoint_url: None,
            region: None,
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            public_base_url: None,
            local_data_dir: Some(dir.to_string_lossy().to_string()),
        })
    }

    #[tokio::test]
    async fn upload_stores_payload_under_derived_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = local_store(tmp.path());

        let uploaded = upload_attachment(&store, "hero image.png", Bytes::from("png"))
            .await
            .unwrap();
        assert!(uploaded.key.starts_with("uploads/"));
        assert!(uploaded.key.ends_with("/hero_image.png"));
        assert!(uploaded.url.ends_with("/hero_image.png"));

        let data = store.get(&uploaded.key).await.unwrap();
        assert_eq!(data.as_ref(), b"png");
    }

    #[tokio::test]
    async fn same_filename_twice_never_collides() {
        let tmp = tempfile::tempdir().unwrap();
        let store = local_store(tmp.path());

        let first = upload_attachment(&store, "mockup.png", Bytes::from("one"))
            .await
            .unwrap();
        let second = upload_attachment(&store, "mockup.png", Bytes::from("two"))
            .await
            .unwrap();
        assert_ne!(first.key, second.key);
        assert_eq!(store.get(&first.key).await.unwrap().as_ref(), b"one");
        assert_eq!(store.get(&second.key).await.unwrap().as_ref(), b"two");
    }
}
