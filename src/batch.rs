//! Running many operations at once.
//!
//! Items run concurrently, bounded by [`ClientConfig::concurrency`], and
//! share the client's connection pool. [`run_batch`] collects everything and
//! returns results in item order; [`run_batch_stream`] yields each item as it
//! finishes (completion order, sort by `index` if order matters).
//!
//! [`ClientConfig::concurrency`]: crate::config::ClientConfig::concurrency

use crate::client::Pdf4meClient;
use crate::error::Pdf4meError;
use crate::execute::{run_operation_with_cancel, OperationOutput};
use crate::operations::Operation;
use futures::future;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of one batch item.
#[derive(Debug)]
pub struct BatchItemResult {
    /// Position of the item in the input.
    pub index: usize,
    pub result: Result<OperationOutput, Pdf4meError>,
}

/// A boxed stream of batch results, in completion order.
pub type BatchStream = Pin<Box<dyn Stream<Item = BatchItemResult> + Send>>;

/// Run every operation and collect the results, sorted by item index.
///
/// With `continue_on_fail = false` the first failure cancels the items still
/// in flight and is returned as the error. With `continue_on_fail = true`
/// failures are recorded per item and the batch always completes.
pub async fn run_batch(
    client: &Pdf4meClient,
    operations: &[Operation],
    continue_on_fail: bool,
    cancel: &CancellationToken,
) -> Result<Vec<BatchItemResult>, Pdf4meError> {
    let total = operations.len();
    let progress = client.progress();
    info!(
        "Starting batch of {} item(s), concurrency {}",
        total,
        client.config().concurrency
    );
    progress.on_batch_start(total);

    let batch_cancel = cancel.child_token();
    let mut pending = stream::iter(operations.iter().enumerate().map(|(index, op)| {
        let cancel = batch_cancel.clone();
        async move {
            let result = run_operation_with_cancel(client, op, &cancel).await;
            BatchItemResult { index, result }
        }
    }))
    .buffer_unordered(client.config().concurrency);

    let mut results = Vec::with_capacity(total);
    let mut succeeded = 0;
    while let Some(item) = pending.next().await {
        match item.result {
            Ok(output) => {
                succeeded += 1;
                results.push(BatchItemResult {
                    index: item.index,
                    result: Ok(output),
                });
            }
            Err(e) if !continue_on_fail => {
                warn!("Batch item {} failed, stopping batch: {}", item.index, e);
                batch_cancel.cancel();
                progress.on_batch_complete(total, succeeded);
                return Err(e);
            }
            Err(e) => {
                warn!("Batch item {} failed: {}", item.index, e);
                results.push(BatchItemResult {
                    index: item.index,
                    result: Err(e),
                });
            }
        }
    }

    results.sort_by_key(|r| r.index);
    info!("Batch finished: {}/{} succeeded", succeeded, total);
    progress.on_batch_complete(total, succeeded);
    Ok(results)
}

/// Run every operation, streaming results as they complete.
///
/// Failures never end the stream; each item carries its own result.
/// Dropping the stream or firing `cancel` abandons the remaining items.
///
/// `on_batch_start` fires when this is called; `on_batch_complete` fires
/// once the last item has been yielded, not if the stream is dropped early.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use pdf4me_word::{run_batch_stream, ClientConfig, DocumentSource, ExtractMetadata, Pdf4meClient};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Pdf4meClient::new(ClientConfig::from_env()?)?;
/// let ops = vec![
///     ExtractMetadata::new(DocumentSource::from_arg("a.docx")).into(),
///     ExtractMetadata::new(DocumentSource::from_arg("b.docx")).into(),
/// ];
/// let mut results = run_batch_stream(client, ops, CancellationToken::new());
/// while let Some(item) = results.next().await {
///     match item.result {
///         Ok(out) => println!("#{}: {}", item.index, out.json),
///         Err(e) => eprintln!("#{}: {e}", item.index),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn run_batch_stream(
    client: Pdf4meClient,
    operations: Vec<Operation>,
    cancel: CancellationToken,
) -> BatchStream {
    let concurrency = client.config().concurrency;
    let total = operations.len();
    client.progress().on_batch_start(total);

    let succeeded = Arc::new(AtomicUsize::new(0));
    let counter = succeeded.clone();
    let finisher = client.clone();
    let items = stream::iter(operations.into_iter().enumerate().map(move |(index, op)| {
        let client = client.clone();
        let cancel = cancel.clone();
        async move {
            let result = run_operation_with_cancel(&client, &op, &cancel).await;
            BatchItemResult { index, result }
        }
    }))
    .buffer_unordered(concurrency)
    .inspect(move |item| {
        if item.result.is_ok() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });

    let done = stream::once(async move {
        let succeeded = succeeded.load(Ordering::Relaxed);
        info!("Batch stream finished: {}/{} succeeded", succeeded, total);
        finisher.progress().on_batch_complete(total, succeeded);
    })
    .filter_map(|()| future::ready(None::<BatchItemResult>));

    Box::pin(items.chain(done))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::document::DocumentSource;
    use crate::error::TransportFailure;
    use crate::operations::ExtractMetadata;
    use crate::progress::JobProgressCallback;
    use crate::protocol::delay::LocalDelayWaiter;
    use crate::protocol::transport::{JobRequest, JobResponse, ResponseBody, Transport};
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// 500 for documents named `bad*.docx`, metadata JSON for the rest.
    /// Answers slower for lower-numbered documents so completion order is
    /// the reverse of input order.
    struct MetadataService;

    #[async_trait]
    impl Transport for MetadataService {
        async fn send(&self, request: &JobRequest) -> Result<JobResponse, TransportFailure> {
            let name = request
                .body
                .as_ref()
                .and_then(|b| b["document"]["name"].as_str())
                .unwrap_or_default()
                .to_string();
            let delay = name
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .trim_end_matches(".docx")
                .parse::<u64>()
                .map(|n| 50u64.saturating_sub(n * 10))
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let (status, body) = if name.starts_with("bad") {
                (500, json!({ "message": format!("cannot read {name}") }))
            } else {
                (200, json!({ "Title": name }))
            };
            Ok(JobResponse {
                status,
                headers: HeaderMap::new(),
                body: ResponseBody::Json(body),
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl JobProgressCallback for Recorder {
        fn on_batch_start(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }
        fn on_batch_complete(&self, total: usize, success: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {success}/{total}"));
        }
    }

    fn client(progress: Option<Arc<Recorder>>) -> Pdf4meClient {
        let mut builder = ClientConfig::builder().api_key("k").concurrency(3);
        if let Some(p) = progress {
            builder = builder.progress_callback(p);
        }
        Pdf4meClient::with_transport(
            builder.build().unwrap(),
            Arc::new(MetadataService),
            Arc::new(LocalDelayWaiter::new(Duration::ZERO)),
        )
    }

    fn metadata_op(name: &str) -> Operation {
        ExtractMetadata::new(DocumentSource::Base64 {
            content: "UEsDBA==".into(),
            file_name: Some(name.into()),
        })
        .into()
    }

    #[tokio::test]
    async fn results_are_sorted_by_index() {
        let ops: Vec<Operation> = (1..=4).map(|i| metadata_op(&format!("doc{i}.docx"))).collect();
        let results = run_batch(&client(None), &ops, false, &CancellationToken::new())
            .await
            .unwrap();
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let title = &results[2].result.as_ref().unwrap().json["metadata"]["Title"];
        assert_eq!(title, "doc3.docx");
    }

    #[tokio::test]
    async fn continue_on_fail_records_errors() {
        let recorder = Arc::new(Recorder::default());
        let ops = vec![
            metadata_op("doc1.docx"),
            metadata_op("bad2.docx"),
            metadata_op("doc3.docx"),
        ];
        let results = run_batch(&client(Some(recorder.clone())), &ops, true, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        let err = results[1].result.as_ref().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Extract Word metadata failed: cannot read bad2.docx"
        );
        assert!(results[0].result.is_ok() && results[2].result.is_ok());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start 3".to_string(), "done 2/3".to_string()]
        );
    }

    #[tokio::test]
    async fn first_failure_stops_batch() {
        let ops = vec![metadata_op("doc1.docx"), metadata_op("bad2.docx")];
        let err = run_batch(&client(None), &ops, false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err.root(), Pdf4meError::RemoteProcessing { status: 500, .. }));
    }

    #[tokio::test]
    async fn stream_yields_every_item() {
        let ops: Vec<Operation> = (1..=3).map(|i| metadata_op(&format!("doc{i}.docx"))).collect();
        let mut stream = run_batch_stream(client(None), ops, CancellationToken::new());
        let mut indices = Vec::new();
        while let Some(item) = stream.next().await {
            assert!(item.result.is_ok());
            indices.push(item.index);
        }
        // doc3 answers first
        assert_eq!(indices[0], 2);
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stream_reports_batch_start_and_completion() {
        let recorder = Arc::new(Recorder::default());
        let ops = vec![metadata_op("doc1.docx"), metadata_op("bad2.docx")];
        let mut stream = run_batch_stream(client(Some(recorder.clone())), ops, CancellationToken::new());
        assert_eq!(*recorder.events.lock().unwrap(), vec!["start 2".to_string()]);

        let mut yielded = 0;
        while stream.next().await.is_some() {
            yielded += 1;
        }
        assert_eq!(yielded, 2);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start 2".to_string(), "done 1/2".to_string()]
        );
    }

    #[tokio::test]
    async fn cancelled_batch_reports_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ops = vec![metadata_op("doc1.docx")];
        let results = run_batch(&client(None), &ops, true, &cancel).await.unwrap();
        assert!(matches!(
            results[0].result.as_ref().unwrap_err().root(),
            Pdf4meError::Cancelled { .. }
        ));
    }
}
