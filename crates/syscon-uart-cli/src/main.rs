//! Syscon EEPROM patcher
//!
//! Authenticates to the syscon over UART and writes a patch image to its
//! EEPROM.
//!
//! Usage:
//!   syscon-patch [OPTIONS] <PORT> <PATCH_FILE>
//!
//! Options:
//!   --variant NAME    Wire variant: cxr, sw or cxrf (default: cxr)
//!   --target NAME     EEPROM layout: cxr713 or cxr714 (default: cxr714)
//!   --wait MS         Wait after each command in ms (default: 1000)
//!   --config FILE     JSON session config; options above override it
//!   --list            List serial ports and exit

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use syscon_uart_core::patch::{PatchPlan, PatchTarget};
use syscon_uart_core::protocol::{list_ports, Session, SessionConfig, WireVariant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    port: Option<String>,
    patch_file: Option<PathBuf>,
    variant: Option<WireVariant>,
    target: Option<PatchTarget>,
    wait_ms: Option<u64>,
    config: Option<PathBuf>,
    list: bool,
}

fn usage() -> String {
    "usage: syscon-patch [--variant cxr|sw|cxrf] [--target cxr713|cxr714] [--wait MS] \
     [--config FILE] [--list] <PORT> <PATCH_FILE>"
        .to_string()
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut positional = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .with_context(|| format!("{} needs a value\n{}", name, usage()))
        };
        match arg.as_str() {
            "--variant" | "-v" => {
                args.variant = Some(value("--variant")?.parse().map_err(anyhow::Error::msg)?)
            }
            "--target" | "-t" => {
                args.target = Some(value("--target")?.parse().map_err(anyhow::Error::msg)?)
            }
            "--wait" | "-w" => {
                args.wait_ms = Some(value("--wait")?.parse().context("--wait expects milliseconds")?)
            }
            "--config" | "-c" => args.config = Some(PathBuf::from(value("--config")?)),
            "--list" | "-l" => args.list = true,
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown option {}\n{}", flag, usage()),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    args.port = positional.next();
    args.patch_file = positional.next().map(PathBuf::from);
    Ok(args)
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(port) = &args.port {
        config.port_name = port.clone();
    }
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(wait_ms) = args.wait_ms {
        config.command_wait_ms = wait_ms;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    if args.list {
        for port in list_ports() {
            println!(
                "{}\t{}",
                port.name,
                port.product.as_deref().unwrap_or("(unknown)")
            );
        }
        return Ok(());
    }

    let config = session_config(&args)?;
    let Some(patch_file) = &args.patch_file else {
        bail!("missing patch file\n{}", usage());
    };
    let image = std::fs::read(patch_file)
        .with_context(|| format!("reading patch {}", patch_file.display()))?;
    let plan = PatchPlan::for_target(args.target.unwrap_or(PatchTarget::Cxr714));
    plan.blocks(&image)?;

    let mut session = Session::open(&config)
        .with_context(|| format!("opening {}", config.port_name))?;
    let wait = config.command_wait();
    info!(port = %config.port_name, variant = %config.variant, "session opened");

    let version = session.command("VER", wait)?;
    println!("Version: {}", version.first_token().unwrap_or("(none)"));

    match session.auth() {
        Ok(()) => println!("Auth successful"),
        Err(err) => {
            println!("{}", err);
            bail!("authentication failed");
        }
    }

    let reports = plan.apply(&mut session, &image, wait)?;
    let mut current_region = None;
    for report in &reports {
        if current_region != Some(report.region) {
            if current_region.is_some() {
                println!();
            }
            println!("{}", plan.regions[report.region].name);
            current_region = Some(report.region);
        }
        println!("{}", report);
    }

    let failed = reports.iter().filter(|r| r.status != 0).count();
    if failed > 0 {
        bail!("{} of {} blocks were rejected", failed, reports.len());
    }
    Ok(())
}
