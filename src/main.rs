use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use paynotify::application::dispatcher::NotificationDispatcher;
use paynotify::application::recorder::PaymentRecorder;
use paynotify::application::workflow::PaymentWorkflow;
use paynotify::config::{AppConfig, ConfigOverrides, LogFormat};
use paynotify::domain::outcome::{ResultAggregator, WorkflowError};
use paynotify::domain::payment::PaymentView;
use paynotify::domain::ports::PaymentStoreRef;
use paynotify::infrastructure::http::HttpTransport;
use paynotify::infrastructure::in_memory::InMemoryPaymentStore;
use paynotify::interfaces::csv::request_reader::PaymentRequestReader;
use paynotify::interfaces::json::result_writer::ResultWriter;
use paynotify::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment requests CSV file (user_id,item_id,amount,quantity)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Notification endpoint URL. Overrides PAYMENT_NOTIFY_URL.
    #[arg(long)]
    notify_url: Option<String>,

    /// Notification timeout in milliseconds. Overrides PAYMENT_NOTIFY_TIMEOUT_MS.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log output format. Overrides LOG_FORMAT.
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,
}

fn open_store(db_path: Option<PathBuf>) -> Result<PaymentStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                paynotify::infrastructure::rocksdb::RocksDBPaymentStore::open(&path).into_diagnostic()?;
            tracing::info!(path = %path.display(), "using RocksDB payment store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
            );
            Ok(Arc::new(InMemoryPaymentStore::new()))
        }
        None => Ok(Arc::new(InMemoryPaymentStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(ConfigOverrides {
        notify_url: cli.notify_url,
        timeout_ms: cli.timeout_ms,
        log_format: cli.log_format.map(LogFormat::from),
    })
    .into_diagnostic()?;
    telemetry::init_tracing(config.log_format).into_diagnostic()?;

    let store = open_store(cli.db_path)?;
    let transport = HttpTransport::new(config.notify_timeout).into_diagnostic()?;
    let workflow = PaymentWorkflow::new(
        PaymentRecorder::new(store.clone()),
        NotificationDispatcher::new(store, Arc::new(transport), config.notify_url.clone())
            .with_timeout(config.notify_timeout),
    );

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = PaymentRequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = ResultWriter::new(stdout.lock());

    for request in reader.requests() {
        match request {
            Ok(request) => {
                let result = workflow.complete(request).await;
                writer.write_result(&result).into_diagnostic()?;
            }
            Err(e) => {
                error!(error = %e, "Error reading payment request");
                let mut rejected = ResultAggregator::<PaymentView>::new();
                rejected.record_failure(WorkflowError::Validation(e.to_string()));
                writer.write_result(&rejected.build()).into_diagnostic()?;
            }
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
