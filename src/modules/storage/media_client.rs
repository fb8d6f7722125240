use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// MinIO/S3-compatible client for uploaded media.
///
/// All objects in the media bucket are publicly readable; stored incident
/// photos and profile images are referenced by their public URL.
pub struct StorageClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    /// Access key for AWS Signature v4 signing
    access_key: String,
    /// Secret key for AWS Signature v4 signing
    secret_key: String,
    /// Region name for AWS Signature v4 signing
    region_name: String,
    /// HTTP client for bucket policy operations
    http_client: Client,
}

impl StorageClient {
    /// Create a client from configuration. Does not touch the network;
    /// call [`bootstrap`](Self::bootstrap) once at startup.
    pub fn new(config: StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create storage bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        })
    }

    /// Ensure the bucket exists and carries a public-read policy.
    pub async fn bootstrap(&self) -> Result<(), AppError> {
        self.ensure_bucket_exists().await?;
        self.set_public_read_policy().await?;

        info!(
            "Storage client initialized for endpoint: {}, bucket: {}",
            self.endpoint,
            self.bucket.name()
        );
        Ok(())
    }

    /// Create the media bucket if it is missing. An already-existing
    /// bucket, whether reported or not, is treated as success.
    async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let name = self.bucket.name();
        let created = Bucket::create_with_path_style(
            &name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Created media bucket '{}'", name),
            Err(e) => {
                let detail = e.to_string();
                if detail.contains("BucketAlreadyOwnedByYou")
                    || detail.contains("BucketAlreadyExists")
                    || detail.contains("already own it")
                {
                    debug!("Media bucket '{}' already exists", name);
                } else {
                    warn!("Could not create media bucket '{}': {}. Assuming it exists.", name, e);
                }
            }
        }
        Ok(())
    }

    /// Attach an anonymous-read policy covering every object in the
    /// bucket. Failure is logged but does not abort startup; the policy
    /// can be applied out of band.
    async fn set_public_read_policy(&self) -> Result<(), AppError> {
        let name = self.bucket.name();
        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": {"AWS": "*"},
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{name}/*")]
            }]
        })
        .to_string();

        if let Err(e) = self.put_bucket_policy(&name, &policy).await {
            warn!(
                "Could not install public-read policy on '{}': {}. \
                 Apply it manually with: mc anonymous set download minio/{}",
                name, e, name
            );
        } else {
            info!("Public-read policy installed on {}/*", name);
        }
        Ok(())
    }

    /// PUT ?policy with an AWS Signature v4 Authorization header.
    ///
    /// rust-s3 has no bucket-policy call, so the request is signed and
    /// sent by hand.
    async fn put_bucket_policy(&self, bucket_name: &str, policy: &str) -> Result<(), AppError> {
        let now = Utc::now();
        let date = now.format("%Y%m%d").to_string();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();

        let parsed = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid storage endpoint URL: {}", e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| AppError::Internal("Storage endpoint URL has no host".to_string()))?;
        let host_header = match parsed.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        let body_hash = hex::encode(Sha256::digest(policy.as_bytes()));
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n/{bucket_name}\npolicy=\nhost:{host_header}\n\
             x-amz-content-sha256:{body_hash}\nx-amz-date:{timestamp}\n\n\
             {signed_headers}\n{body_hash}"
        );

        let scope = format!("{}/{}/s3/aws4_request", date, self.region_name);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            timestamp,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = self.sign_v4(&date, &string_to_sign)?;
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(format!("{}/{}?policy", self.endpoint, bucket_name))
            .header("Host", &host_header)
            .header("x-amz-date", &timestamp)
            .header("x-amz-content-sha256", &body_hash)
            .header("Authorization", &authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Policy request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::Internal(format!(
                "Policy request rejected: {} - {}",
                status, body
            )))
        }
    }

    /// Derive the SigV4 signing key and sign the string-to-sign.
    fn sign_v4(&self, date: &str, string_to_sign: &str) -> Result<String, AppError> {
        let mut key = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date.as_bytes(),
        )?;
        for step in [self.region_name.as_bytes(), b"s3", b"aws4_request"] {
            key = hmac_sha256(&key, step)?;
        }
        Ok(hex::encode(hmac_sha256(
            &key,
            string_to_sign.as_bytes(),
        )?))
    }

    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Upload of '{}' failed: {}", key, e)))?;

        debug!("Stored '{}' in bucket '{}'", key, self.bucket.name());
        Ok(self.public_url(key))
    }

    /// Delete an object.
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Delete of '{}' failed: {}", key, e)))?;

        debug!("Removed '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    /// The public URL of a stored object.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Recover the object key from a stored URL.
    ///
    /// Accepts both the public and the internal endpoint form. Returns
    /// None for URLs that don't belong to this bucket.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let public_prefix = format!("{}/{}/", self.public_endpoint, self.bucket.name());
        if let Some(key) = url.strip_prefix(&public_prefix) {
            return Some(key.to_string());
        }

        let internal_prefix = format!("{}/{}/", self.endpoint, self.bucket.name());
        url.strip_prefix(&internal_prefix).map(|k| k.to_string())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Rewrite a shareable link so it renders the image inline instead of
/// prompting a download (`dl=0` becomes `raw=1`). URLs without the
/// download marker pass through unchanged.
pub fn direct_view_url(url: &str) -> String {
    url.replace("dl=0", "raw=1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;

    fn test_client() -> StorageClient {
        StorageClient::new(StorageConfig {
            endpoint: "http://minio:9000".to_string(),
            public_endpoint: "http://localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: "civicwatch-media".to_string(),
            region: "us-east-1".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_public_url() {
        let client = test_client();
        assert_eq!(
            client.public_url("incidents/abc/photo.jpg"),
            "http://localhost:9000/civicwatch-media/incidents/abc/photo.jpg"
        );
    }

    #[test]
    fn test_key_from_url_public_and_internal() {
        let client = test_client();
        assert_eq!(
            client
                .key_from_url("http://localhost:9000/civicwatch-media/incidents/abc/photo.jpg")
                .as_deref(),
            Some("incidents/abc/photo.jpg")
        );
        assert_eq!(
            client
                .key_from_url("http://minio:9000/civicwatch-media/profiles/u1/me.png")
                .as_deref(),
            Some("profiles/u1/me.png")
        );
        assert_eq!(
            client.key_from_url("http://elsewhere.example/other-bucket/x.jpg"),
            None
        );
    }

    #[test]
    fn test_direct_view_url() {
        assert_eq!(
            direct_view_url("https://share.example/s/abc?dl=0"),
            "https://share.example/s/abc?raw=1"
        );
        // No marker, unchanged
        assert_eq!(
            direct_view_url("http://localhost:9000/civicwatch-media/x.jpg"),
            "http://localhost:9000/civicwatch-media/x.jpg"
        );
    }
}
