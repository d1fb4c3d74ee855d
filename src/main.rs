use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use pdf_chat_lib::{
    logging, ApiConfig, ChatError, DocumentBackend, DocumentChat, HttpBackend, PdfFile,
    SessionStore, SqliteStore,
};

/// Ask questions about a PDF from the terminal.
#[derive(Parser, Debug)]
#[command(name = "pdf-chat", version)]
struct Args {
    /// PDF to upload. Without it the previously uploaded document is reused.
    file: Option<PathBuf>,

    /// Forget the stored document before doing anything else.
    #[arg(long)]
    new: bool,

    /// Service base URL (overrides PDF_CHAT_API_BASE_URL).
    #[arg(long)]
    api_url: Option<String>,

    /// Seconds to wait for one upload or answer; 0 waits forever.
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory holding the session database.
    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("{e}");
    }
    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ChatError> {
    let mut config = ApiConfig::from_env()?;
    if let Some(url) = args.api_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = args.timeout {
        config = config.with_request_timeout_secs(secs);
    }

    let db_dir = match args.db {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or_else(|| ChatError::Config("no data directory on this platform".into()))?
            .join("pdf-chat"),
    };
    let store: Arc<dyn SessionStore> = Arc::new(SqliteStore::open(&db_dir)?);

    let http = HttpBackend::new(config.clone())?;
    match http.health().await {
        Ok(message) => tracing::debug!(%message, "Service reachable"),
        Err(e) => tracing::warn!(error = %e, url = %config.base_url, "Service health check failed"),
    }
    let backend: Arc<dyn DocumentBackend> = Arc::new(http);

    let mut chat = DocumentChat::new(backend, store).with_timeout(config.request_timeout);
    if args.new {
        chat.new_chat()?;
    }

    let handle = match args.file {
        Some(path) => {
            let file = PdfFile::from_path(&path)?;
            println!("Uploading and processing {}...", file.name);
            chat.open(&file).await?.clone()
        }
        None => chat.resume()?.cloned().ok_or_else(|| {
            ChatError::Config("no document loaded; pass the path of a PDF".into())
        })?,
    };

    println!("Chatting about {}. /retry re-sends an unanswered question, /new forgets the document, /quit exits.", handle.display_name);
    repl(&mut chat).await
}

async fn repl(chat: &mut DocumentChat) -> Result<(), ChatError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let outcome = match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                chat.new_chat()?;
                println!("Document forgotten. Run again with a PDF to start over.");
                break;
            }
            "/retry" => chat.retry().await,
            question => chat.ask(question).await,
        };

        match outcome {
            Ok(reply) => println!("\n{}\n", reply.text),
            Err(e) => println!("Failed to get response: {e}"),
        }
    }
    Ok(())
}
