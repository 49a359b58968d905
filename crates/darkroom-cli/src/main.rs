//! darkroom: photo-product asset pipeline CLI
//!
//! Commands:
//!   upload-photo <owner> <path>            - upload a photo with derivatives
//!   upload-file <owner> <path>             - upload a raw file attachment
//!   save-doc <scope> <path>                - encrypt and store a project document
//!   read-doc <scope>                       - fetch and decrypt a project document
//!   save-template <owner> <content> <img>  - save a design template
//!   health                                 - probe the storage endpoint
//!
//! S3 credentials come from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY, the
//! document encryption salt from DARKROOM_KDF_SALT. Neither is ever read
//! from the config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;

use darkroom_core::DarkroomConfig;
use darkroom_meta::JsonMetadataStore;
use darkroom_pipeline::{
    decode_base64_payload, CryptoPolicy, FileUpload, PhotoUpload, Pipeline, PipelineError,
    TemplateSave,
};
use darkroom_store::{build_from_config, check_health, ObjectStore};

// ── CLI structure ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "darkroom",
    version,
    about = "darkroom asset pipeline client",
    long_about = "darkroom: upload photos, files, and templates; save and read encrypted project documents"
)]
struct Cli {
    /// Path to darkroom.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "DARKROOM_CONFIG",
        default_value = "/etc/darkroom/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DARKROOM_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "DARKROOM_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a photo: original plus 200/500 derivatives, then the asset row
    UploadPhoto {
        /// Owning user id
        owner: String,
        /// Image file to upload
        path: PathBuf,
        /// Treat the file content as base64 text (data URLs accepted)
        #[arg(long)]
        base64: bool,
        /// Client-defined property stored on the asset row
        #[arg(long)]
        property: Option<String>,
    },

    /// Upload a raw file attachment (single object, no derivatives)
    UploadFile {
        /// Owning user id
        owner: String,
        /// File to upload
        path: PathBuf,
        /// Stored file name (default: the local file name)
        #[arg(long)]
        name: Option<String>,
        /// Content type recorded on the object
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Encrypt and store a project document, replacing any previous version
    SaveDoc {
        /// Project scope id
        scope: String,
        /// JSON document file
        path: PathBuf,
    },

    /// Fetch and decrypt a project document
    ReadDoc {
        /// Project scope id
        scope: String,
        /// Write the document here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Save a design template: rendered image objects plus a catalog row
    SaveTemplate {
        /// Owning user id
        owner: String,
        /// Template body JSON file
        content: PathBuf,
        /// Rendered template image file
        image: PathBuf,
        /// Existing template row id to update (omit to insert)
        #[arg(long)]
        id: Option<i64>,
        /// Product code
        #[arg(long)]
        product: String,
        /// Group code
        #[arg(long)]
        group: String,
        /// Theme code
        #[arg(long)]
        theme: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Probe the storage endpoint
    Health,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    if let Err(err) = run(cli).await {
        let caller_fault = err
            .downcast_ref::<PipelineError>()
            .map(PipelineError::is_caller_fault)
            .unwrap_or(false);
        eprintln!("error: {err:#}");
        // Exit 2 for bad requests, 1 for system failures.
        std::process::exit(if caller_fault { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config).await?;

    match cli.command {
        Commands::UploadPhoto {
            owner,
            path,
            base64,
            property,
        } => cmd_upload_photo(&config, &owner, &path, base64, property).await,
        Commands::UploadFile {
            owner,
            path,
            name,
            content_type,
        } => cmd_upload_file(&config, &owner, &path, name, content_type).await,
        Commands::SaveDoc { scope, path } => cmd_save_doc(&config, &scope, &path).await,
        Commands::ReadDoc { scope, output } => {
            cmd_read_doc(&config, &scope, output.as_deref()).await
        }
        Commands::SaveTemplate {
            owner,
            content,
            image,
            id,
            product,
            group,
            theme,
            tags,
        } => cmd_save_template(&config, &owner, &content, &image, id, product, group, theme, tags).await,
        Commands::Health => cmd_health(&config).await,
    }
}

// ── Config and environment loading ────────────────────────────────────────────

async fn load_config(path: &Path) -> Result<DarkroomConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    } else {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
        Ok(DarkroomConfig::default())
    }
}

/// Read S3 credentials from environment variables. These are never read
/// from the config file.
fn load_credentials() -> Result<(String, String)> {
    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("DARKROOM_ACCESS_KEY_ID"))
        .context(
            "S3 credentials not set\n\
             Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables.\n\
             Example:\n\
             \texport AWS_ACCESS_KEY_ID=your-key\n\
             \texport AWS_SECRET_ACCESS_KEY=your-secret",
        )?;
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("DARKROOM_SECRET_ACCESS_KEY"))
        .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;
    Ok((access_key, secret_key))
}

/// Read the process-wide document encryption salt. Required for any
/// document command; deliberately environment-only so it never lands in a
/// config file or shell history of flags.
fn load_kdf_salt() -> Result<SecretString> {
    std::env::var("DARKROOM_KDF_SALT")
        .map(SecretString::from)
        .context(
            "document encryption salt not set\n\
             Set the DARKROOM_KDF_SALT environment variable to the deployment's\n\
             secret salt. All documents written under one salt must be read\n\
             back under the same salt.",
        )
}

/// Expand `~` in a path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{}/{}", home, &s[2..]))
    } else {
        path.to_path_buf()
    }
}

/// Assemble the full pipeline: S3 gateway, JSON metadata store, crypto policy.
async fn build_pipeline(config: &DarkroomConfig) -> Result<Pipeline> {
    let (access_key, secret_key) = load_credentials()?;
    let op = build_from_config(&config.storage, &access_key, &secret_key)
        .context("building storage operator")?;

    let meta_path = expand_tilde(&config.metadata.path);
    let meta = JsonMetadataStore::open(&meta_path)
        .await
        .with_context(|| format!("opening metadata store: {}", meta_path.display()))?;

    let crypto = CryptoPolicy::from_config(&config.crypto, load_kdf_salt()?);

    Ok(
        Pipeline::new(Arc::new(ObjectStore::new(op)), Arc::new(meta), crypto)
            .with_upload_timeout(Duration::from_secs(config.pipeline.upload_timeout_secs)),
    )
}

// ── `darkroom upload-photo` ───────────────────────────────────────────────────

async fn cmd_upload_photo(
    config: &DarkroomConfig,
    owner: &str,
    path: &Path,
    base64: bool,
    property: Option<String>,
) -> Result<()> {
    let bytes = read_payload(path, base64).await?;
    let pipeline = build_pipeline(config).await?;

    let uploaded = pipeline
        .upload_photo(PhotoUpload {
            owner_id: owner.to_string(),
            bytes,
            property,
        })
        .await?;

    println!("Uploaded photo:");
    println!("  asset id:  {}", uploaded.asset_id);
    println!("  original:  {}", uploaded.object_key);
    println!("  thumbnail: {}", uploaded.thumbnail_key);
    println!("  preview:   {}", uploaded.preview_key);
    Ok(())
}

async fn read_payload(path: &Path, base64: bool) -> Result<Vec<u8>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if base64 {
        let text = String::from_utf8(raw)
            .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
        Ok(decode_base64_payload(&text)?)
    } else {
        Ok(raw)
    }
}

// ── `darkroom upload-file` ────────────────────────────────────────────────────

async fn cmd_upload_file(
    config: &DarkroomConfig,
    owner: &str,
    path: &Path,
    name: Option<String>,
    content_type: Option<String>,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = name.or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()));

    let pipeline = build_pipeline(config).await?;
    let uploaded = pipeline
        .upload_file(FileUpload {
            owner_id: owner.to_string(),
            bytes,
            file_name,
            content_type,
        })
        .await?;

    println!("Uploaded file:");
    println!("  asset id: {}", uploaded.asset_id);
    println!("  object:   {}", uploaded.object_key);
    Ok(())
}

// ── `darkroom save-doc` / `read-doc` ──────────────────────────────────────────

async fn cmd_save_doc(config: &DarkroomConfig, scope: &str, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing document: {}", path.display()))?;

    let pipeline = build_pipeline(config).await?;
    let object_key = pipeline.save_document(scope, &document).await?;

    println!("Saved document:");
    println!("  scope:  {scope}");
    println!("  object: {object_key}");
    Ok(())
}

async fn cmd_read_doc(config: &DarkroomConfig, scope: &str, output: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config).await?;
    let document = pipeline.read_document(scope).await?;
    let pretty = serde_json::to_string_pretty(&document).context("rendering document")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &pretty)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{pretty}"),
    }
    Ok(())
}

// ── `darkroom save-template` ──────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn cmd_save_template(
    config: &DarkroomConfig,
    owner: &str,
    content_path: &Path,
    image_path: &Path,
    id: Option<i64>,
    product: String,
    group: String,
    theme: String,
    tags: Option<String>,
) -> Result<()> {
    let content = tokio::fs::read_to_string(content_path)
        .await
        .with_context(|| format!("reading {}", content_path.display()))?;
    let image = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("reading {}", image_path.display()))?;

    let pipeline = build_pipeline(config).await?;
    let saved = pipeline
        .save_template(TemplateSave {
            template_id: id,
            owner_id: owner.to_string(),
            content,
            product_code: product,
            group_code: group,
            theme_code: theme,
            tags,
            image,
        })
        .await?;

    println!("Saved template:");
    println!("  template id: {}", saved.template_id);
    println!("  image:       {}", saved.object_key);
    println!("  thumbnail:   {}", saved.thumbnail_key);
    Ok(())
}

// ── `darkroom health` ─────────────────────────────────────────────────────────

async fn cmd_health(config: &DarkroomConfig) -> Result<()> {
    let (access_key, secret_key) = load_credentials()?;
    let op = build_from_config(&config.storage, &access_key, &secret_key)
        .context("building storage operator")?;

    let latency = check_health(&op).await?;
    println!(
        "storage ok: {} (bucket {}, {:?})",
        config.storage.endpoint, config.storage.bucket, latency
    );
    Ok(())
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
