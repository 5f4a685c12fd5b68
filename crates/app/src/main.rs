use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use paperlens_core::{
    parse_topics, render_image_hits, render_paper_hits, AddPaper, EmbeddingProvider,
    FastEmbedProvider, HashingEmbedder, Library, LibraryOptions, LocalStore, Placement,
    QdrantStore, VectorIndex, IMAGES_COLLECTION, PAPERS_COLLECTION,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "paperlens", version, about = "File PDFs by topic and search papers and images")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root directory papers are filed under, one folder per topic
    #[arg(long, env = "PAPERLENS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory of the on-disk vector store
    #[arg(long, env = "PAPERLENS_DB_PATH", default_value = "db")]
    db_path: PathBuf,

    /// Directory holding the all-MiniLM-L6-v2 and clip-ViT-B-32 models
    #[arg(long, env = "PAPERLENS_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    /// Vector store backend
    #[arg(long, env = "PAPERLENS_STORE", value_enum, default_value_t = StoreKind::Local)]
    store: StoreKind,

    /// Qdrant base URL, used with --store qdrant
    #[arg(long, env = "PAPERLENS_QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Embedding backend; `hashing` needs no model files but is not semantic
    #[arg(long, env = "PAPERLENS_EMBEDDER", value_enum, default_value_t = EmbedderKind::Pretrained)]
    embedder: EmbedderKind,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    Local,
    Qdrant,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    Pretrained,
    Hashing,
}

#[derive(Subcommand)]
#[command(rename_all = "snake_case")]
enum Command {
    /// Classify a PDF, file it under its topic, and index its pages.
    AddPaper {
        /// Path to the PDF file
        path: PathBuf,
        /// Comma separated candidate topics
        #[arg(long)]
        topics: Option<String>,
        /// Copy the file instead of moving it
        #[arg(long, default_value_t = false)]
        copy: bool,
        /// File name to store the paper under
        #[arg(long)]
        name: Option<String>,
    },
    /// Semantic search over indexed paper pages.
    SearchPaper {
        query: String,
        /// Number of results to return
        #[arg(long, default_value = "3")]
        top_k: usize,
    },
    /// Index every jpg/jpeg/png below a folder.
    IndexImages {
        /// Folder containing images
        path: PathBuf,
    },
    /// Text-to-image search.
    SearchImage {
        /// Description of the image
        query: String,
        /// Number of results to return
        #[arg(long, default_value = "3")]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "paperlens boot"
    );

    let embedder: Box<dyn EmbeddingProvider + Send + Sync> = match cli.embedder {
        EmbedderKind::Pretrained => Box::new(FastEmbedProvider::load(&cli.models_dir)?),
        EmbedderKind::Hashing => Box::new(HashingEmbedder::default()),
    };
    let options = LibraryOptions {
        data_root: cli.data_dir.clone(),
    };

    match cli.store {
        StoreKind::Local => {
            let store = LocalStore::open(&cli.db_path).await?;
            let papers = store
                .collection(PAPERS_COLLECTION, embedder.text_dimensions())
                .await?;
            let images = store
                .collection(IMAGES_COLLECTION, embedder.joint_dimensions())
                .await?;
            run(Library::new(embedder, papers, images, options), cli.command).await;
        }
        StoreKind::Qdrant => {
            let papers =
                QdrantStore::new(&cli.qdrant_url, PAPERS_COLLECTION, embedder.text_dimensions())?;
            let images =
                QdrantStore::new(&cli.qdrant_url, IMAGES_COLLECTION, embedder.joint_dimensions())?;
            papers.ensure_collection().await?;
            images.ensure_collection().await?;
            run(Library::new(embedder, papers, images, options), cli.command).await;
        }
    }

    Ok(())
}

/// Runs one command. Failures are printed rather than returned so the exit
/// status only reflects startup problems.
async fn run<E, P, I>(library: Library<E, P, I>, command: Command)
where
    E: EmbeddingProvider + Send + Sync,
    P: VectorIndex + Send + Sync,
    I: VectorIndex + Send + Sync,
{
    match command {
        Command::AddPaper {
            path,
            topics,
            copy,
            name,
        } => {
            let topics = match parse_topics(topics.as_deref().unwrap_or_default()) {
                Ok(topics) => topics,
                Err(error) => {
                    println!("{error}");
                    return;
                }
            };

            let mut request = AddPaper::new(&path).with_topics(topics);
            if copy {
                request = request.with_placement(Placement::Copy);
            }
            if let Some(name) = name {
                request = request.with_file_name(name);
            }

            println!("Processing {}...", path.display());
            match library.add_paper(request).await {
                Ok(report) => {
                    println!("Detected Topic: {}", report.topic);
                    println!(
                        "Indexed {} pages -> {} at {}",
                        report.pages_indexed,
                        report.stored_path.display(),
                        report.ingested_at.to_rfc3339()
                    );
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "add_paper failed");
                    println!("{error}");
                }
            }
        }
        Command::SearchPaper { query, top_k } => {
            println!("Searching for: {query}");
            match library.search_papers(&query, top_k).await {
                Ok(hits) => print!("{}", render_paper_hits(&query, &hits)),
                Err(error) => println!("{error}"),
            }
        }
        Command::IndexImages { path } => match library.index_images(&path).await {
            Ok(report) => {
                println!("Indexed {} images", report.indexed);
                if report.skipped > 0 {
                    println!("Skipped {} unreadable files", report.skipped);
                }
            }
            Err(error) => println!("{error}"),
        },
        Command::SearchImage { query, top_k } => {
            println!("Searching image for: {query}");
            match library.search_images(&query, top_k).await {
                Ok(hits) => print!("{}", render_image_hits(&hits)),
                Err(error) => println!("{error}"),
            }
        }
    }
}
