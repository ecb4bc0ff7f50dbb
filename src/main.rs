use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uacmix::gadget::{Controller, Phase};
use uacmix::profile::Profile;
use uacmix::service::Systemctl;
use uacmix::sink::probe::CardSummary;
use uacmix::sink::{asound, probe, resolve};

#[derive(Parser)]
#[command(name = "uacmix", version, about = "UAC2 capture gadget lifecycle and dual-DAC combined sink generation")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Profile overrides (default: /etc/uacmix/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring the capture gadget up, or run a single lifecycle phase
    Gadget {
        /// Run only this phase instead of the full stop/unbind/reconfigure/start sequence
        #[arg(long, value_enum)]
        phase: Option<PhaseArg>,
    },
    /// Probe two playback cards and write the combined-sink configuration
    Sink {
        /// First card number (owns the low channel range); prompted for if omitted
        first: Option<i32>,
        /// Second card number (owns the high channel range); prompted for if omitted
        second: Option<i32>,
        /// Where to write the generated configuration
        #[arg(short, long, default_value = "asound.conf.generated")]
        output: PathBuf,
    },
    /// List detected playback cards
    Cards,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PhaseArg {
    StopConsumer,
    Unbind,
    Reconfigure,
    StartConsumer,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::StopConsumer => Phase::StopConsumer,
            PhaseArg::Unbind => Phase::Unbind,
            PhaseArg::Reconfigure => Phase::Reconfigure,
            PhaseArg::StartConsumer => Phase::StartConsumer,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    uacmix::logging::init(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(c) = cause {
                eprintln!("  caused by: {c}");
                cause = c.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let profile = Profile::load(cli.config.as_deref())?;
    match cli.command {
        Command::Gadget { phase } => {
            let controller = Controller::new(&profile, Systemctl);
            match phase {
                Some(p) => controller.run(p.into())?,
                None => controller.run_default_sequence()?,
            }
            Ok(())
        }
        Command::Sink {
            first,
            second,
            output,
        } => run_sink(first, second, &output),
        Command::Cards => {
            let cards = probe::playback_cards();
            if cards.is_empty() {
                println!("No playback cards detected.");
            } else {
                print_cards(&cards);
            }
            Ok(())
        }
    }
}

fn run_sink(
    first: Option<i32>,
    second: Option<i32>,
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let cards = probe::playback_cards();
    if cards.len() < 2 {
        return Err("need at least two playback cards to combine".into());
    }
    print_cards(&cards);

    let n1 = match first {
        Some(n) => n,
        None => ask("\nEnter the FIRST card number to combine: ")?,
    };
    let n2 = match second {
        Some(n) => n,
        None => ask("Enter the SECOND card number to combine: ")?,
    };
    if n1 == n2 {
        return Err("the two cards must be different".into());
    }
    let first = find_card(&cards, n1)?;
    let second = find_card(&cards, n2)?;

    println!("\nProbing hardware capabilities...");
    let a = probe::probe(first, 0)?;
    let b = probe::probe(second, 0)?;

    println!("\n=== Hardware summary ===");
    println!("Card {} ({}): {}", a.card_index, a.id, a.caps_summary());
    println!("Card {} ({}): {}", b.card_index, b.id, b.caps_summary());

    let picked = resolve::resolve(&a, &b)?;
    println!("\n=== Selected common params ===");
    println!("Rate:   {}", picked.rate);
    println!("Format: {}", picked.format);

    let description = asound::synthesize(a, b, picked);
    let device = description.plug_name();
    fs::write(output, description.render())?;

    println!("\nGenerated config written to: {}", output.display());
    println!("To install it system-wide, run:");
    println!("  sudo cp {} /etc/asound.conf", output.display());
    println!("Then test with:");
    println!(
        "  speaker-test -D {device} -c {} -r {} -f {} -t sine",
        description.total_channels(),
        picked.rate,
        picked.format
    );
    Ok(())
}

fn find_card(cards: &[CardSummary], n: i32) -> Result<&CardSummary, Box<dyn Error>> {
    cards
        .iter()
        .find(|c| c.index == n)
        .ok_or_else(|| format!("card {n} is not in the detected list").into())
}

fn print_cards(cards: &[CardSummary]) {
    println!("Detected ALSA playback cards:");
    for c in cards {
        println!("  [{}] id='{}'  {}", c.index, c.id, c.name);
    }
}

/// Re-prompts until a number is entered; only a closed stdin is an error.
fn ask(prompt: &str) -> Result<i32, Box<dyn Error>> {
    let mut line = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;
        line.clear();
        if io::stdin().read_line(&mut line)? == 0 {
            return Err("stdin closed before a card number was entered".into());
        }
        match line.trim().parse::<i32>() {
            Ok(n) => return Ok(n),
            Err(_) => println!("Please enter a numeric card number."),
        }
    }
}
