use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs;
use tracing::info;

use datasim_core::{FileKind, GenerationResult};

use crate::client::ApiClient;
use crate::error::ClientError;

/// Fetches the generated artifacts referenced by a completed job's result.
///
/// One download per file kind may be in flight at a time; downloads of
/// different kinds run independently and never block each other.
pub struct Downloader<'a> {
    client: &'a ApiClient,
    out_dir: PathBuf,
    in_flight: InFlightFlags,
}

#[derive(Default)]
struct InFlightFlags {
    csv: AtomicBool,
    json: AtomicBool,
}

impl InFlightFlags {
    fn slot(&self, kind: FileKind) -> &AtomicBool {
        match kind {
            FileKind::Csv => &self.csv,
            FileKind::Json => &self.json,
        }
    }
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<'a> Downloader<'a> {
    pub fn new(client: &'a ApiClient, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            out_dir: out_dir.into(),
            in_flight: InFlightFlags::default(),
        }
    }

    pub fn is_in_flight(&self, kind: FileKind) -> bool {
        self.in_flight.slot(kind).load(Ordering::Acquire)
    }

    /// Download the artifact of `kind` referenced by `result` into the
    /// output directory and return its local path.
    pub async fn download(
        &self,
        result: &GenerationResult,
        kind: FileKind,
    ) -> Result<PathBuf, ClientError> {
        let reference = result.files.reference(kind).ok_or_else(|| {
            ClientError::Download(format!("no {} file in this result", kind.as_str()))
        })?;
        let filename = filename_of(reference);

        let _guard = self.begin(kind)?;
        info!(%filename, kind = kind.as_str(), "downloading artifact");
        let bytes = self.client.download(filename).await.map_err(|err| match err {
            ClientError::Server { status, detail } => ClientError::Download(format!(
                "server rejected {filename} ({status}): {detail}"
            )),
            other => other,
        })?;

        fs::create_dir_all(&self.out_dir).await?;
        let path = self.out_dir.join(filename);
        fs::write(&path, &bytes).await?;
        Ok(path)
    }

    fn begin(&self, kind: FileKind) -> Result<InFlightGuard<'_>, ClientError> {
        let slot = self.in_flight.slot(kind);
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                ClientError::Download(format!(
                    "a {} download is already in progress",
                    kind.as_str()
                ))
            })?;
        Ok(InFlightGuard(slot))
    }
}

/// Final path segment of a backend file reference. Keeps saved files inside
/// the output directory whatever the reference contains.
pub fn filename_of(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use datasim_core::{GeneratedFiles, Previews};

    fn csv_only_result() -> GenerationResult {
        GenerationResult {
            records_generated: 10,
            files: GeneratedFiles {
                csv: Some("generated_data/users_20260831.csv".to_string()),
                json: None,
            },
            sample_record: serde_json::Value::Null,
            previews: Previews {
                schema_json: "{}".to_string(),
                sample_csv: "id\n1".to_string(),
            },
            schema: None,
        }
    }

    #[test]
    fn filename_is_the_final_path_segment() {
        assert_eq!(
            filename_of("generated_data/users_20260831.csv"),
            "users_20260831.csv"
        );
        assert_eq!(filename_of("users.csv"), "users.csv");
    }

    #[test]
    fn filename_drops_directory_traversal() {
        assert_eq!(filename_of("../../etc/passwd"), "passwd");
        assert_eq!(filename_of("/etc/passwd"), "passwd");
    }

    #[tokio::test]
    async fn absent_kind_fails_without_touching_flags() {
        let client = ApiClient::new(ClientConfig::default()).expect("client");
        let downloader = Downloader::new(&client, "artifacts");

        let err = downloader
            .download(&csv_only_result(), FileKind::Json)
            .await
            .expect_err("json was not produced");
        assert!(matches!(err, ClientError::Download(_)));
        assert!(!downloader.is_in_flight(FileKind::Json));
        assert!(!downloader.is_in_flight(FileKind::Csv));
    }

    #[test]
    fn a_kind_admits_one_download_at_a_time() {
        let client = ApiClient::new(ClientConfig::default()).expect("client");
        let downloader = Downloader::new(&client, "artifacts");

        let guard = downloader.begin(FileKind::Csv).expect("first begin");
        assert!(downloader.is_in_flight(FileKind::Csv));
        assert!(downloader.begin(FileKind::Csv).is_err());
        // the other kind is unaffected
        let json_guard = downloader.begin(FileKind::Json).expect("json begin");
        drop(json_guard);
        drop(guard);
        assert!(!downloader.is_in_flight(FileKind::Csv));
        assert!(downloader.begin(FileKind::Csv).is_ok());
    }
}
