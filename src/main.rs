use anyhow::Result;
use clap::{Parser, Subcommand};
use pod_host::input::LogicalKey;
use pod_host::network::{ActionKind, KeyAction};
use pod_host::{core, ActionClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pod-Mirror: remote pod screen mirroring and control")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 8870)]
    port: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Mirror {
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Enable debug logging
        #[arg(long)]
        debug: bool,

        /// Disable audio playback
        #[arg(long)]
        no_audio: bool,
    },
    /// Inject a single key press+release
    Press {
        key: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Commands::Mirror {
        verbose: false,
        debug: false,
        no_audio: false,
    });

    let default_filter = match &command {
        Commands::Mirror { debug: true, .. } => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match command {
        Commands::Press { key } => {
            let key: LogicalKey = key.parse().map_err(anyhow::Error::msg)?;
            let mut client = ActionClient::connect(&args.host, args.port + 1)?;
            client.send(&KeyAction {
                kind: ActionKind::Press,
                key,
                pressed_keys: vec![key],
            })?;
            client.send(&KeyAction {
                kind: ActionKind::Release,
                key,
                pressed_keys: vec![],
            })?;
            println!("Sent press+release for {:?}", key);
        }
        Commands::Mirror {
            verbose,
            debug,
            no_audio,
        } => {
            core::VERBOSE.store(verbose, std::sync::atomic::Ordering::SeqCst);
            core::DEBUG.store(debug, std::sync::atomic::Ordering::SeqCst);

            core::run(args.host, args.port, !no_audio)?;
        }
    }
    Ok(())
}
