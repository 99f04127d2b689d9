use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rfm69_radio::radio::config::frf_bytes;
use rfm69_radio::radio::hal::SpiTransaction;
use rfm69_radio::radio::registers::REG_FIFO;
use rfm69_radio::radio::{frequency_to_frf, pa_settings};
use rfm69_radio::{init_logger, InterruptOutcome, IrqFlags2, Rfm69, Rfm69Config, SimulatedRfm69};

#[derive(Parser)]
#[command(name = "rfm69-tool")]
#[command(about = "Inspect RFM69 driver configurations without hardware")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register writes `init` performs for a configuration
    Profile {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Carrier frequency register encoding
    Frf { mhz: f32 },
    /// PA register encoding for an output power
    Power {
        dbm: i8,
        #[arg(long)]
        high_power: bool,
    },
    /// FIFO writes used to transmit a hex payload
    Fragments {
        payload: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<Rfm69Config> {
    let mut config = match path {
        Some(path) => Rfm69Config::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Rfm69Config::default(),
    };
    config.reset_on_init = false;
    Ok(config)
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile { config } => {
            let chip = SimulatedRfm69::new();
            let radio = Rfm69::new(chip.clone(), load_config(config)?)?;
            chip.clear_transactions();
            radio.init()?;

            for transaction in chip.transactions() {
                if let SpiTransaction::Write { address, data } = transaction {
                    let bytes: Vec<String> = data.iter().map(|b| format!("0x{b:02X}")).collect();
                    println!("0x{address:02X} <- {}", bytes.join(" "));
                }
            }
        }
        Commands::Frf { mhz } => {
            let frf = frequency_to_frf(mhz)?;
            let [msb, mid, lsb] = frf_bytes(frf);
            println!("{mhz} MHz -> FRF 0x{frf:06X} (0x{msb:02X} 0x{mid:02X} 0x{lsb:02X})");
        }
        Commands::Power { dbm, high_power } => {
            let pa = pa_settings(dbm, high_power);
            println!(
                "{} dBm -> RegPaLevel 0x{:02X}, RegOcp 0x{:02X}, boost {}",
                pa.dbm, pa.pa_level, pa.ocp, pa.boost
            );
        }
        Commands::Fragments { payload, config } => {
            let payload = hex::decode(payload.trim()).context("payload must be hex")?;
            let chip = SimulatedRfm69::new();
            let radio = Rfm69::new(chip.clone(), load_config(config)?)?;
            radio.init()?;
            chip.clear_transactions();

            radio.send(&payload)?;
            // The FIFO drains below the threshold after every chunk
            loop {
                chip.set_irq_flags2(IrqFlags2::empty());
                match radio.handle_interrupt() {
                    InterruptOutcome::FragmentSent { .. } => continue,
                    InterruptOutcome::Spurious => break,
                    other => bail!("unexpected interrupt outcome {other:?}"),
                }
            }
            chip.set_irq_flags2(IrqFlags2::PACKET_SENT);
            radio.handle_interrupt();

            for (index, transaction) in chip.transactions().iter().enumerate() {
                if let SpiTransaction::Write { address: REG_FIFO, data } = transaction {
                    println!("#{index:03} FIFO <- {} bytes: {}", data.len(), hex::encode(data));
                }
            }
            info!("{:?}", radio.stats());
        }
    }

    Ok(())
}
