use chordscore::chord::{chord_from_keys, step_chord, BAND_STEP_12};
use chordscore::config::parse_key;
use chordscore::{Head, ScoreConfig, ScoreError};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Chord names and score text for the text-driven MIDI player
#[derive(Parser)]
#[command(name = "chordscore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// YAML file with processing options
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalise a chord name, optionally transposed
    Chord {
        text: String,

        /// Semitones to transpose by
        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        transpose: i32,

        /// Spell with sharps
        #[arg(long)]
        sharp: bool,
    },
    /// Name the chord formed by notes such as `E4 C5 G5`
    Decode {
        #[arg(required = true)]
        keys: Vec<String>,

        /// Spell with sharps
        #[arg(long)]
        sharp: bool,
    },
    /// Print the lyrics of a score
    Lyrics {
        input: PathBuf,

        /// Leave out the chord lines
        #[arg(long)]
        no_chords: bool,
    },
    /// Transpose a score, notes and chords alike
    Transpose {
        input: PathBuf,

        #[arg(allow_hyphen_values = true)]
        steps: i32,

        /// Spell with sharps
        #[arg(long)]
        sharp: bool,
    },
    /// Remove redundant setters and spaces from a score
    Optimise { input: PathBuf },
    /// Print the elements of a score as JSON
    Dump { input: PathBuf },
    /// Print the notes played for the first lines of a score as JSON
    Play {
        input: PathBuf,

        /// Number of lines to step through
        #[arg(short, long, default_value_t = 16)]
        lines: usize,
    },
}

fn read_score(path: &Path) -> Result<String, ScoreError> {
    fs::read_to_string(path).map_err(|source| ScoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<ScoreConfig, ScoreError> {
    match path {
        Some(path) => {
            let config = ScoreConfig::load(path)?;
            debug!("loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(ScoreConfig::default()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ScoreError> {
    serde_json::to_string_pretty(value).map_err(|e| ScoreError::InvalidArgument {
        arg: "output".to_string(),
        message: e.to_string(),
    })
}

fn run(cli: Cli) -> Result<String, ScoreError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chord { text, transpose, sharp } => {
            let sharp = if sharp { Some(true) } else { config.sharp };
            let stepped = step_chord(&text, (transpose + config.transpose) * BAND_STEP_12 as i32, sharp);
            Ok(stepped)
        }
        Commands::Decode { keys, sharp } => {
            let keys = keys.iter().map(|key| parse_key(key, "key")).collect::<Result<Vec<_>, _>>()?;
            let spec = chord_from_keys(&keys).ok_or_else(|| ScoreError::InvalidArgument {
                arg: "keys".to_string(),
                message: "no chord is known for these notes".to_string(),
            })?;
            Ok(spec.to_text(sharp || config.sharp == Some(true)))
        }
        Commands::Lyrics { input, no_chords } => {
            let head = chordscore::process(&read_score(&input)?, &config);
            Ok(head.to_lyrics(no_chords || config.no_chords))
        }
        Commands::Transpose { input, steps, sharp } => {
            let config = ScoreConfig {
                transpose: config.transpose + steps,
                sharp: if sharp { Some(true) } else { config.sharp },
                ..config
            };
            Ok(chordscore::process(&read_score(&input)?, &config).to_text())
        }
        Commands::Optimise { input } => {
            let mut head = chordscore::process(&read_score(&input)?, &config);
            let removed = head.optimise();
            info!("removed {} elements", removed);
            Ok(head.to_text())
        }
        Commands::Dump { input } => {
            let head = chordscore::process(&read_score(&input)?, &config);
            to_json(&head.elements())
        }
        Commands::Play { input, lines } => {
            let mut head: Head = chordscore::process(&read_score(&input)?, &config);
            let mut events = Vec::new();
            for _ in 0..lines {
                let Some(span) = head.step_line() else {
                    break;
                };
                events.push(head.line_events(span));
            }
            to_json(&events)
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{}", output.trim_end_matches('\n')),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
