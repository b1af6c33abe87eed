mod cli;
mod control;
mod logging;

use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use courier_core::{normalize, parse_contacts, Contact, RegionDefaults};
use courier_engine::{
    ContactScript, DispatchHandle, DispatchPlan, EngineEvent, SimulatedSurface, Surface,
    SurfaceProfile,
};
use courier_logging::courier_info;

use crate::control::ControlCommand;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::initialize(args.verbose);

    let contacts = load_contacts(&args.contacts)?;
    let template = load_template(&args)?;
    let region = args.region();
    let profile = load_profile(args.profile.as_deref())?;

    print_preview(&contacts, &region);

    if !args.rehearse {
        bail!(
            "no automation adapter is bundled with this binary; plug a \
             WebDriver-backed Surface in at the session seam, or run with \
             --rehearse to exercise the workflow against the simulated surface"
        );
    }
    courier_info!("rehearsal run: simulated surface, compressed pacing");

    let plan = DispatchPlan {
        contacts,
        template,
        region,
    };
    let surface = rehearsal_surface(&plan, &profile);
    let handle = DispatchHandle::start(
        move || Ok(Box::new(surface) as Box<dyn Surface>),
        plan,
        args.pacing(),
        profile,
        args.report_dir.clone(),
    );

    println!("commands while running: pause / resume / stop");
    let control_rx = control::spawn_stdin_reader();
    drive(handle, control_rx);
    Ok(())
}

fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read contact list {}", path.display()))?;
    let contacts = parse_contacts(&text);
    if contacts.is_empty() {
        bail!("contact list {} holds no contacts", path.display());
    }
    Ok(contacts)
}

fn load_template(args: &cli::Args) -> Result<String> {
    let template = match (&args.message, &args.message_file) {
        (Some(message), _) => message.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("could not read message file {}", path.display()))?,
        (None, None) => bail!("either --message or --message-file is required"),
    };
    if template.trim().is_empty() {
        bail!("the message template is empty");
    }
    Ok(template)
}

fn load_profile(path: Option<&Path>) -> Result<SurfaceProfile> {
    let Some(path) = path else {
        return Ok(SurfaceProfile::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read surface profile {}", path.display()))?;
    ron::from_str(&text)
        .with_context(|| format!("surface profile {} did not parse", path.display()))
}

/// Show how every address will be completed before anything is sent.
fn print_preview(contacts: &[Contact], region: &RegionDefaults) {
    println!("{} contact(s) loaded:", contacts.len());
    for contact in contacts {
        let shown = if contact.display_name.is_empty() {
            "-"
        } else {
            &contact.display_name
        };
        match normalize(&contact.raw_address, region) {
            Ok(address) => println!("  {:<20} {:<16} -> {address}", contact.raw_address, shown),
            Err(err) => println!(
                "  {:<20} {:<16} -> will be reported as failed ({err})",
                contact.raw_address, shown
            ),
        }
    }
}

/// Every reachable contact delivers on the first attempt; the run exercises
/// the full workflow without touching a real surface.
fn rehearsal_surface(plan: &DispatchPlan, profile: &SurfaceProfile) -> SimulatedSurface {
    let mut surface = SimulatedSurface::new(profile.clone());
    for contact in &plan.contacts {
        if let Ok(address) = normalize(&contact.raw_address, &plan.region) {
            surface.script(address.as_str(), ContactScript::default());
        }
    }
    surface
}

fn drive(handle: DispatchHandle, control: mpsc::Receiver<ControlCommand>) {
    loop {
        while let Ok(command) = control.try_recv() {
            match command {
                ControlCommand::Pause => {
                    courier_info!("pausing after the current contact");
                    handle.pause();
                }
                ControlCommand::Resume => {
                    courier_info!("resuming");
                    handle.resume();
                }
                ControlCommand::Stop => {
                    courier_info!("stop requested");
                    handle.stop();
                }
            }
        }
        match handle.recv_timeout(Duration::from_millis(100)) {
            Some(EngineEvent::Log(line)) => courier_info!("{line}"),
            Some(EngineEvent::Progress(update)) => {
                println!("[{}/{}] {}", update.processed, update.total, update.status);
            }
            Some(EngineEvent::ContactCompleted { record, .. }) => {
                println!(
                    "  {} ({}) -> {}: {}",
                    record.address, record.name, record.outcome, record.detail
                );
            }
            Some(EngineEvent::Finished { summary }) => {
                let note = if summary.stopped_early {
                    " (stopped early)"
                } else {
                    ""
                };
                println!(
                    "finished: {} sent, {} failed of {}{note}",
                    summary.sent, summary.failed, summary.total
                );
                break;
            }
            None => {}
        }
    }
    handle.join();
}
