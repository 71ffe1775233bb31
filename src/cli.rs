use clap::Parser;
use std::path::PathBuf;

use ytnotes::output::OutputFormat;
use ytnotes::summarize::{MAX_WORDS, MIN_WORDS, Model, SummaryLanguage};

#[derive(Parser)]
#[command(
    name = "ytnotes",
    about = "Turn a YouTube video's captions into detailed notes",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (reads the first line of stdin if omitted)
    pub url: Option<String>,

    /// Caption language code; translated from another track if not published
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Gemini model used to write the notes
    #[arg(short, long, value_enum)]
    pub model: Option<Model>,

    /// Target length of the notes in words
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(MIN_WORDS as i64..=MAX_WORDS as i64))]
    pub words: Option<u32>,

    /// Language the notes are written in
    #[arg(short, long, value_enum)]
    pub summary_language: Option<SummaryLanguage>,

    /// Output format: text (default), markdown, json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// List available caption tracks and exit
    #[arg(long)]
    pub list: bool,

    /// Save the notes to youtube_notes_<ID>.txt in the current directory
    #[arg(long)]
    pub save: bool,

    /// Write the notes to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show video links, the caption track used and timing
    #[arg(short, long)]
    pub verbose: bool,
}
