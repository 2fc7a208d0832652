use std::path::Path;
use std::sync::Arc;

use datasim_client::{ApiClient, Downloader, JobTracker, PollEvent, PollOptions, Session};
use datasim_core::{
    validate_schema, GenerationRequest, GenerationResult, JobId, JobStatus,
};
use tracing::{info, warn};

use crate::schema;
use crate::settings::{self, Settings};
use crate::{CliError, GenerateArgs};

fn client(settings: &Settings) -> Result<ApiClient, CliError> {
    let mut client = ApiClient::new(settings.client.clone())?;
    match settings::load_token()? {
        Some(token) => client.set_session(Session::new(token)),
        None => warn!("no stored session; run `datasim login` if the backend requires one"),
    }
    Ok(client)
}

pub async fn run(settings: &Settings, args: GenerateArgs) -> Result<(), CliError> {
    let schema = schema::load(&args.schema)?;
    validate_schema(&schema)?;
    let request = GenerationRequest::new(schema, args.count, args.format);
    let client = Arc::new(client(settings)?);

    let result = if args.detach {
        let job_id = client.generate_async(&request).await?;
        println!("Submitted job {job_id}");
        poll_to_completion(
            Arc::clone(&client),
            job_id,
            PollOptions::from_config(&settings.client),
        )
        .await?
    } else {
        client.generate(&request).await?
    };

    println!("Generated {} records", result.records_generated);
    println!("{}", result.previews.sample_csv);

    let downloader = Downloader::new(client.as_ref(), &args.out);
    for kind in result.files.kinds() {
        let path = downloader.download(&result, kind).await?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

async fn poll_to_completion(
    client: Arc<ApiClient>,
    job_id: JobId,
    options: PollOptions,
) -> Result<GenerationResult, CliError> {
    let mut tracker = JobTracker::new();
    let mut events = tracker.start(client, job_id, options);

    while let Some(event) = events.recv().await {
        match event {
            PollEvent::Update(job) => match job.status {
                JobStatus::Pending => info!("job pending"),
                JobStatus::Progress => {
                    if let Some(progress) = job.progress {
                        info!(
                            "progress: {}/{} ({:.0}%)",
                            progress.current,
                            progress.total,
                            progress.ratio() * 100.0
                        );
                    }
                }
                JobStatus::Success => {
                    return job.result.ok_or_else(|| {
                        CliError::Generation("job succeeded without a result payload".to_string())
                    });
                }
                JobStatus::Failure => {
                    return Err(CliError::Generation(
                        job.error.unwrap_or_else(|| "unknown failure".to_string()),
                    ));
                }
            },
            PollEvent::Lost { attempts, error } => {
                return Err(CliError::Generation(format!(
                    "lost contact with the job after {attempts} status fetches: {error}"
                )));
            }
        }
    }
    Err(CliError::Generation(
        "status stream ended unexpectedly".to_string(),
    ))
}

pub async fn status(settings: &Settings, task_id: &str) -> Result<(), CliError> {
    let client = client(settings)?;
    let job = client.job_status(&JobId::new(task_id)).await?;
    let json =
        serde_json::to_string_pretty(&job).map_err(|err| CliError::Generation(err.to_string()))?;
    println!("{json}");
    Ok(())
}

pub async fn download(settings: &Settings, filename: &str, out: &Path) -> Result<(), CliError> {
    // keep the saved file inside the output directory
    let filename = datasim_client::filename_of(filename);
    let client = client(settings)?;
    let bytes = client.download(filename).await?;
    tokio::fs::create_dir_all(out).await?;
    let path = out.join(filename);
    tokio::fs::write(&path, &bytes).await?;
    println!("Saved {}", path.display());
    Ok(())
}
