use std::io::{self, BufRead};
use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::Cli;
use ytnotes::captions::CaptionSource;
use ytnotes::config::{Config, Credentials, GOOGLE_API_KEY_VAR};
use ytnotes::output::{self, OutputFormat};
use ytnotes::pipeline::{self, NotesRequest};
use ytnotes::retry::Retrying;
use ytnotes::summarize::{DEFAULT_WORDS, GeminiClient, MAX_WORDS, MIN_WORDS};
use ytnotes::youtube::YouTubeCaptions;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytnotes.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytnotes")
        .join("logs")
}

fn build_after_help(credentials: &Credentials) -> String {
    let key_line = match credentials.google_api_key {
        Some(_) => format!("  \x1b[32m✅\x1b[0m {GOOGLE_API_KEY_VAR}"),
        None => format!("  \x1b[31m❌\x1b[0m {GOOGLE_API_KEY_VAR} (not set, needed to generate notes)"),
    };
    let proxy_line = match credentials.proxy {
        Some(_) => "  \x1b[32m✅\x1b[0m Webshare proxy".to_string(),
        None => "  \x1b[33m–\x1b[0m Webshare proxy (not configured, YouTube may block requests)".to_string(),
    };

    let log_path = log_dir().join("ytnotes.log");

    format!(
        "\nCREDENTIALS:\n{key_line}\n{proxy_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        ytnotes::config::config_path().display(),
        log_path.display()
    )
}

fn read_url(cli: &Cli) -> Result<String> {
    if let Some(ref url) = cli.url {
        return Ok(url.trim().to_string());
    }
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(line.trim().to_string());
        }
    }
    bail!("no URL provided\n\nUsage: ytnotes <URL>\n       echo <URL> | ytnotes");
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    setup_logging()?;
    let credentials = Credentials::from_env();

    let after_help = build_after_help(&credentials);
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config file: {e}");
        Config::default()
    });

    // CLI flags take priority over config defaults
    let model = cli.model.or(config.default_model).unwrap_or_default();
    let language = cli.summary_language.or(config.default_summary_language).unwrap_or_default();
    let format = cli.format.or(config.default_format).unwrap_or(OutputFormat::Text);
    let words = cli.words.or(config.default_words).unwrap_or(DEFAULT_WORDS);
    if !(MIN_WORDS..=MAX_WORDS).contains(&words) {
        bail!("word target {words} is outside {MIN_WORDS}..={MAX_WORDS}");
    }
    let caption_lang = cli.lang.clone().or(config.default_caption_lang.clone());

    if cli.verbose {
        let config_path = ytnotes::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let url = read_url(&cli)?;
    let video_id = ytnotes::extract_video_id(&url).ok_or_else(|| {
        eyre::eyre!(
            "could not extract video ID from: {url}\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  https://www.youtube.com/embed/ID\n  https://www.youtube.com/shorts/ID"
        )
    })?;

    if cli.verbose || cli.list {
        eprintln!(
            "Video: {}\nThumbnail: {}",
            ytnotes::watch_url(&video_id),
            ytnotes::thumbnail_url(&video_id)
        );
    }

    let mut source = Retrying::new(YouTubeCaptions::new(credentials.proxy.as_ref())?, config.retry_policy());
    if cli.verbose {
        source = source.on_retry(|notice| eprintln!("{notice}"));
    }

    if cli.list {
        let tracks = source.list_tracks(&video_id).await?;
        let rendered = match format {
            OutputFormat::Json => output::render_track_list_json(&tracks)?,
            _ => output::render_track_list(&tracks),
        };
        println!("{rendered}");
        return Ok(());
    }

    let summarizer = GeminiClient::new(credentials.google_api_key()?);

    let request = NotesRequest {
        url,
        caption_lang,
        model,
        words,
        language,
    };

    let notes = pipeline::run(&source, &summarizer, &request).await?;

    if cli.verbose {
        let transcript = &notes.transcript;
        match transcript.translated_from {
            Some(ref from) => eprintln!("Captions: {} (translated from {from})", transcript.language_code),
            None => eprintln!("Captions: {}", transcript.language_code),
        }
        eprintln!("Transcript length: {} chars", transcript.text.len());
        eprintln!("Model: {model}");
    }
    eprintln!("Notes generated in {:.2}s", notes.elapsed.as_secs_f64());

    println!("{}", output::render_notes(&notes, format)?);

    let save_path = cli
        .output
        .clone()
        .or_else(|| cli.save.then(|| PathBuf::from(output::notes_file_name(&notes.video_id))));

    if let Some(path) = save_path {
        std::fs::write(&path, &notes.summary)?;
        eprintln!("Notes written to: {}", path.display());
    }

    Ok(())
}
