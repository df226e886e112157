use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

/// Prefix of image URLs served through `GET /images/*key`.
pub const IMAGE_ROUTE_PREFIX: &str = "/images/";
pub const PRESIGN_TTL_SECS: u64 = 30 * 60;

/// An image inlined as `data:<mime>;base64,<payload>`.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

pub fn parse_data_url(raw: &str) -> Option<DataUrl<'_>> {
    let rest = raw.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    if !mime.starts_with("image/") {
        return None;
    }
    Some(DataUrl {
        mime,
        payload: payload.trim(),
    })
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Storage key behind an `/images/...` URL.
pub fn stored_key(image: &str) -> Option<&str> {
    image
        .strip_prefix(IMAGE_ROUTE_PREFIX)
        .filter(|k| !k.is_empty())
}

fn recipe_prefix(recipe_id: Uuid) -> String {
    format!("recipes/{recipe_id}/")
}

/// Storage key behind `image`, only when it lives under this recipe's prefix.
pub fn stored_key_for(recipe_id: Uuid, image: &str) -> Option<&str> {
    let key = stored_key(image)?;
    let name = key.strip_prefix(recipe_prefix(recipe_id).as_str())?;
    let clean = name
        .split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    clean.then_some(key)
}

/// An `/images/...` URL may only point at an object stored for this recipe.
pub fn check_owned(recipe_id: Uuid, image: &str) -> anyhow::Result<()> {
    if stored_key(image).is_some() && stored_key_for(recipe_id, image).is_none() {
        anyhow::bail!("image {image} belongs to another recipe");
    }
    Ok(())
}

/// Uploads an inline image and returns the URL to store in its place.
/// Anything that is not a data URL comes back untouched.
pub async fn store_embedded(
    storage: &dyn StorageClient,
    recipe_id: Uuid,
    image: &str,
) -> anyhow::Result<String> {
    let Some(data) = parse_data_url(image) else {
        return Ok(image.to_string());
    };
    let ext = ext_from_mime(data.mime)
        .with_context(|| format!("unsupported image type {}", data.mime))?;
    let body = Base64::decode_vec(data.payload)
        .map_err(|e| anyhow::anyhow!("invalid base64 image payload: {e}"))?;

    let key = format!("{}{}.{ext}", recipe_prefix(recipe_id), Uuid::new_v4());
    storage
        .put_object(&key, Bytes::from(body), data.mime)
        .await
        .with_context(|| format!("put_object {key}"))?;
    debug!(%recipe_id, %key, "embedded image uploaded");
    Ok(format!("{IMAGE_ROUTE_PREFIX}{key}"))
}

/// Best effort: a failed delete only leaves an orphaned object behind.
/// Keys outside the recipe's own prefix are never touched.
pub async fn discard(storage: &dyn StorageClient, recipe_id: Uuid, image: &str) {
    if let Some(key) = stored_key_for(recipe_id, image) {
        if let Err(e) = storage.delete_object(key).await {
            warn!(error = %e, %key, "failed to delete stored image");
        }
    }
}

pub async fn presign(storage: &dyn StorageClient, key: &str) -> anyhow::Result<String> {
    storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeStorage;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn png_payload() -> String {
        Base64::encode_string(PNG_MAGIC)
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn data_urls_are_recognized() {
        let payload = png_payload();
        let raw = format!("data:image/png;base64,{payload}");
        let parsed = parse_data_url(&raw).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.payload, payload);

        assert!(parse_data_url("https://images.example.com/a.jpg").is_none());
        assert!(parse_data_url("data:text/plain;base64,aGk=").is_none());
        assert!(parse_data_url("data:image/png,rawbytes").is_none());
    }

    #[test]
    fn only_image_route_urls_have_keys() {
        assert_eq!(stored_key("/images/recipes/a/b.png"), Some("recipes/a/b.png"));
        assert_eq!(stored_key("/images/"), None);
        assert_eq!(stored_key("https://cdn.example.com/images/x.png"), None);
    }

    #[tokio::test]
    async fn embedded_image_is_uploaded_and_replaced() {
        let storage = FakeStorage::default();
        let recipe_id = Uuid::new_v4();

        let url = store_embedded(&storage, recipe_id, &format!("data:image/png;base64,{}", png_payload()))
            .await
            .unwrap();
        let key = stored_key(&url).unwrap().to_string();
        assert!(key.starts_with(&format!("recipes/{recipe_id}/")));
        assert!(key.ends_with(".png"));

        let (bytes, content_type) = storage.get(&key).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(&bytes[..], PNG_MAGIC);

        discard(&storage, Uuid::new_v4(), &url).await;
        assert!(storage.get(&key).is_some());

        discard(&storage, recipe_id, &url).await;
        assert!(storage.get(&key).is_none());
    }

    #[test]
    fn keys_are_scoped_to_their_recipe() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let own = format!("/images/recipes/{mine}/a.png");
        let foreign = format!("/images/recipes/{theirs}/a.png");

        assert_eq!(stored_key_for(mine, &own), Some(&own["/images/".len()..]));
        assert_eq!(stored_key_for(mine, &foreign), None);
        assert_eq!(stored_key_for(mine, &format!("/images/recipes/{mine}/../{theirs}/a.png")), None);
        assert_eq!(stored_key_for(mine, &format!("/images/recipes/{mine}/")), None);
        assert_eq!(stored_key_for(mine, "/images/avatars/x.png"), None);

        assert!(check_owned(mine, &own).is_ok());
        assert!(check_owned(mine, "https://images.example.com/dish.jpg").is_ok());
        assert!(check_owned(mine, &foreign).is_err());
    }

    #[tokio::test]
    async fn plain_urls_pass_through() {
        let storage = FakeStorage::default();
        let url = "https://images.example.com/dish.jpg";
        assert_eq!(store_embedded(&storage, Uuid::new_v4(), url).await.unwrap(), url);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn broken_payloads_are_errors() {
        let storage = FakeStorage::default();
        let id = Uuid::new_v4();
        assert!(store_embedded(&storage, id, "data:image/png;base64,@@@").await.is_err());
        assert!(store_embedded(&storage, id, "data:image/tiff;base64,aGk=").await.is_err());
    }

    #[tokio::test]
    async fn presign_mentions_the_key() {
        let url = presign(&FakeStorage::default(), "q/w/e.webp").await.unwrap();
        assert!(url.contains("q/w/e.webp"));
    }
}
