use chrono::Utc;
use std::path::Path;
use tokio::fs;
use tracing::info;

use super::StoreError;
use crate::http::RateLimitedHttpClient;

/// Evidence image uploads into a public storage bucket
#[derive(Debug)]
pub struct ImageStorage {
    http: RateLimitedHttpClient,
    bucket: String,
}

impl ImageStorage {
    pub fn new(http: RateLimitedHttpClient, bucket: impl Into<String>) -> Self {
        Self {
            http,
            bucket: bucket.into(),
        }
    }

    /// Upload a local file and return its public URL.
    ///
    /// Objects are named `<unix-millis>-<file name>` so repeated uploads of
    /// the same file never collide.
    pub async fn upload(&self, path: &Path) -> Result<String, StoreError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Config(format!("not a file: {}", path.display())))?;

        let bytes = fs::read(path).await?;
        let object_name = object_name(Utc::now().timestamp_millis(), file_name);

        self.http
            .send_bytes(
                &["storage", "v1", "object", &self.bucket, &object_name],
                bytes,
                content_type(path),
            )
            .await?;

        let url = self.public_url(&object_name)?;
        info!(bucket = %self.bucket, object = %object_name, "Image uploaded");
        Ok(url)
    }

    /// Characters such as `#` or `?` in the object name are percent-encoded
    pub fn public_url(&self, object_name: &str) -> Result<String, StoreError> {
        let url = self.http.url(&[
            "storage",
            "v1",
            "object",
            "public",
            &self.bucket,
            object_name,
        ])?;
        Ok(url.into())
    }
}

fn object_name(millis: i64, file_name: &str) -> String {
    // Spaces in names break the public URL
    format!("{}-{}", millis, file_name.replace(' ', "_"))
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use std::time::Duration;

    #[test]
    fn test_object_name_and_content_type() {
        assert_eq!(object_name(1700000000000, "leak photo.JPG"), "1700000000000-leak_photo.JPG");
        assert_eq!(content_type(Path::new("leak photo.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn test_public_url() {
        let http = RateLimitedHttpClient::new(
            "https://project.supabase.co",
            "anon",
            &RateLimitConfig {
                requests_per_second: 1,
                burst_capacity: 1,
            },
            Duration::from_secs(1),
        )
        .unwrap();
        let storage = ImageStorage::new(http, "complaint-images");
        assert_eq!(
            storage.public_url("1-a.png").unwrap(),
            "https://project.supabase.co/storage/v1/object/public/complaint-images/1-a.png"
        );
        assert_eq!(
            storage.public_url("1-receipt#2?.png").unwrap(),
            "https://project.supabase.co/storage/v1/object/public/complaint-images/1-receipt%232%3F.png"
        );
    }
}
