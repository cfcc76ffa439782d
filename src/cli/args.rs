use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "beatscribe")]
#[command(about = "Record a drum take and transcribe it to beats", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Record a single take from the terminal and print the transcription
    Record(RecordCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Default)]
pub struct RecordCliArgs {
    /// Tempo in BPM (40-220)
    #[arg(short, long)]
    pub tempo: Option<u32>,
    /// Time signature label, e.g. "4/4" or "7/8"
    #[arg(short, long)]
    pub meter: Option<String>,
    /// Genre tag (rock, jazz, funk, hiphop, ballad)
    #[arg(short, long)]
    pub genre: Option<String>,
    /// Record at a relaxed pace
    #[arg(long)]
    pub slow_mode: bool,
    /// Accompaniment type (metronome, backing, upload)
    #[arg(long)]
    pub mr_type: Option<String>,
    /// Maximum take length in seconds before the recorder stops itself
    #[arg(short, long)]
    pub duration: Option<u64>,
}
