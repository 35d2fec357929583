use clap::Parser;
use promptcanvas::{
    download, logger, Config, DownloadVariant, GenerationOptions, HistoryEntry, ImageClient,
    ImageGenError, ImageSize, OutputFormat, PromptFields, Quality, Session,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Describe an image field by field, generate it, refine it and save it", long_about = None)]
struct Args {
    /// Main subject, e.g. "a young woman on a bicycle"
    #[arg(long)]
    subject: Option<String>,

    /// Detailed attributes, e.g. "short hair, red coat, smiling"
    #[arg(long)]
    attributes: Option<String>,

    /// Artistic style / aesthetics, e.g. "film noir photography"
    #[arg(long)]
    style: Option<String>,

    /// Environment / setting, e.g. "cobbled street in the fog"
    #[arg(long)]
    environment: Option<String>,

    /// Composition / camera setup, e.g. "3/4 close-up, wide angle"
    #[arg(long)]
    composition: Option<String>,

    /// Extra details / atmosphere, e.g. "golden hour light, soft bokeh"
    #[arg(long)]
    extra: Option<String>,

    /// What to avoid, e.g. "distortions, artifacts, watermark"
    #[arg(long)]
    negative: Option<String>,

    /// square (1024x1024), landscape (1792x1024) or portrait (1024x1792)
    #[arg(long, default_value = "square")]
    size: ImageSize,

    /// standard or high
    #[arg(long, default_value = "standard")]
    quality: Quality,

    /// Number of variants to request (1-4)
    #[arg(short = 'n', long, default_value_t = 1)]
    variants: u8,

    /// Download format: png or jpg
    #[arg(short, long, default_value = "png")]
    format: OutputFormat,

    /// Directory for saved images (overrides PROMPTCANVAS_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File name prefix (overrides PROMPTCANVAS_FILE_PREFIX)
    #[arg(long)]
    prefix: Option<String>,

    /// Generate and save once, without the refinement loop
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn fields(&self) -> PromptFields {
        PromptFields {
            subject: self.subject.clone(),
            attributes: self.attributes.clone(),
            style: self.style.clone(),
            environment: self.environment.clone(),
            composition: self.composition.clone(),
            extra: self.extra.clone(),
            negative: self.negative.clone(),
        }
    }

    fn options(&self) -> GenerationOptions {
        GenerationOptions::new()
            .with_size(self.size)
            .with_quality(self.quality)
            .with_variants(self.variants)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let logger_config = if args.verbose {
        logger::LoggerConfig::development()
    } else {
        logger::LoggerConfig::default()
    };
    logger::init_with_config(logger_config)?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };
    if let Some(dir) = &args.output_dir {
        config.download.output_dir = Some(dir.clone());
    }
    if let Some(prefix) = &args.prefix {
        config.download.file_prefix = Some(prefix.clone());
    }
    logger::log_config_info(&config);

    let client = ImageClient::new(&config.openai)?;
    let mut session = Session::new();
    let options = args.options();

    log::info!("Sending request to the images API...");
    let first = session
        .generate(&client, &args.fields(), &options)
        .await
        .map(print_entry);
    match first {
        Ok(()) => save_current(&session, &config, args.format, DownloadVariant::Standard),
        Err(e) => {
            // Nothing to refine without a first image.
            report(&e);
            std::process::exit(1);
        }
    }

    if args.once {
        return Ok(());
    }

    println!();
    println!("Type changes for the next version, or a command:");
    println!("  :history  :select N  :save [hd]  :prompt  :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            (":quit", _) | (":q", _) => break,
            (":history", _) => print_history(&session, config.history_display_limit),
            (":prompt", _) => match session.last_prompt() {
                Some(prompt) => println!("{}", prompt),
                None => println!("(no prompt yet)"),
            },
            (":select", rank) => match rank.parse::<usize>() {
                Ok(rank) if rank >= 1 => {
                    if let Err(e) = session.select(rank - 1).map(print_entry) {
                        report(&e);
                    }
                }
                _ => println!("usage: :select N (1 = most recent)"),
            },
            (":save", variant) => match parse_save_variant(variant) {
                Some(variant) => save_current(&session, &config, args.format, variant),
                None => println!("usage: :save [hd]"),
            },
            (command, _) if command.starts_with(':') => {
                println!("unknown command {}", command)
            }
            _ => {
                log::info!("Sending the revised prompt...");
                let refined = session
                    .refine(&client, line, &options)
                    .await
                    .map(print_entry);
                match refined {
                    Ok(()) => {
                        save_current(&session, &config, args.format, DownloadVariant::Standard)
                    }
                    Err(e) => report(&e),
                }
            }
        }
    }

    session.clear();
    Ok(())
}

fn print_entry(entry: &HistoryEntry) {
    println!();
    println!("Image ({} bytes, {})", entry.image.len(), entry.source.tag());
    if let Some(url) = entry.url() {
        println!("Source URL: {}", url);
    }
    println!("Prompt:\n{}", entry.prompt);
    if let Some(revised) = &entry.revised_prompt {
        println!("Revised by the service:\n{}", revised);
    }
}

fn print_history(session: &Session, limit: usize) {
    if session.is_empty() {
        println!("(history is empty)");
        return;
    }
    let current_id = session.current().map(|e| e.id.as_str());
    for (rank, entry) in session.recent(limit).enumerate() {
        let marker = if Some(entry.id.as_str()) == current_id { "*" } else { " " };
        let first_line = entry.prompt.lines().next().unwrap_or_default();
        println!(
            "{}{}. [{}] {} ({})",
            marker,
            rank + 1,
            entry.created_at.format("%H:%M:%S"),
            first_line,
            entry.source.tag()
        );
    }
}

fn save_current(session: &Session, config: &Config, format: OutputFormat, variant: DownloadVariant) {
    let Some(entry) = session.current() else {
        println!("(nothing to save yet)");
        return;
    };
    match download::save(
        config.download.output_dir(),
        config.download.file_prefix(),
        &entry.image,
        format,
        variant,
    ) {
        Ok(saved) => println!("Saved {} ({})", saved.path.display(), saved.content_type),
        Err(e) => report(&e),
    }
}

/// `:save` takes no argument or `hd`; anything else is a typo.
fn parse_save_variant(arg: &str) -> Option<DownloadVariant> {
    match arg.to_ascii_lowercase().as_str() {
        "" => Some(DownloadVariant::Standard),
        "hd" => Some(DownloadVariant::Hd),
        _ => None,
    }
}

fn report(error: &ImageGenError) {
    match error {
        ImageGenError::ValidationError(msg) => log::warn!("{}", msg),
        ImageGenError::UnrecognizedResponseFormat(_) => {
            log::error!("{} (the API response shape may have changed)", error)
        }
        _ => log::error!("Image generation error [{}]: {}", error.kind(), error),
    }
}
