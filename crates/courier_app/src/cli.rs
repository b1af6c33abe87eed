use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use courier_core::RegionDefaults;
use courier_engine::PacingSettings;

/// Bulk message dispatch over a rendered, session-authenticated messaging
/// surface.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
pub struct Args {
    /// Contact list (csv-like; delimiter is sniffed, header optional).
    #[arg(long, value_name = "FILE")]
    pub contacts: PathBuf,

    /// Message template. Supports `{nome}` and spintax like `{oi|olá}`.
    #[arg(long, conflicts_with = "message_file")]
    pub message: Option<String>,

    /// Read the message template from a file instead.
    #[arg(long, value_name = "FILE")]
    pub message_file: Option<PathBuf>,

    /// Area code prepended to 8/9-digit local numbers.
    #[arg(long, default_value = "62")]
    pub area_code: String,

    /// Country code prepended to 10/11-digit numbers.
    #[arg(long, default_value = "55")]
    pub country_code: String,

    /// Extra send attempts per contact after the first.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Take an extended cooldown after every Nth contact (0 disables).
    #[arg(long)]
    pub cooldown_every: Option<usize>,

    /// Lower bound of the randomized delay between contacts, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub min_delay: Option<u64>,

    /// Upper bound of the randomized delay between contacts, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub max_delay: Option<u64>,

    /// RON file overriding the surface profile (selectors, URLs, notices).
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Directory for the per-run report file.
    #[arg(long, value_name = "DIR", default_value = "reports")]
    pub report_dir: PathBuf,

    /// Run against the built-in simulated surface with compressed pacing.
    #[arg(long)]
    pub rehearse: bool,

    /// Debug-level logging.
    #[arg(long)]
    pub verbose: bool,
}

impl Args {
    pub fn region(&self) -> RegionDefaults {
        RegionDefaults {
            area_code: self.area_code.clone(),
            country_code: self.country_code.clone(),
            ..RegionDefaults::default()
        }
    }

    pub fn pacing(&self) -> PacingSettings {
        let mut pacing = if self.rehearse {
            PacingSettings::immediate()
        } else {
            PacingSettings::default()
        };
        if let Some(retries) = self.retries {
            pacing.retries = retries;
        }
        if let Some(every) = self.cooldown_every {
            pacing.cooldown_every = every;
        }
        if let Some(min) = self.min_delay {
            pacing.contact_delay.0 = Duration::from_secs(min);
        }
        if let Some(max) = self.max_delay {
            pacing.contact_delay.1 = Duration::from_secs(max);
        }
        pacing
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn delay_overrides_land_in_the_pacing() {
        let args = Args::parse_from([
            "courier",
            "--contacts",
            "list.csv",
            "--message",
            "oi",
            "--min-delay",
            "1",
            "--max-delay",
            "2",
            "--retries",
            "0",
        ]);
        let pacing = args.pacing();
        assert_eq!(pacing.contact_delay.0.as_secs(), 1);
        assert_eq!(pacing.contact_delay.1.as_secs(), 2);
        assert_eq!(pacing.retries, 0);
    }

    #[test]
    fn region_flags_override_the_defaults() {
        let args = Args::parse_from([
            "courier",
            "--contacts",
            "list.csv",
            "--area-code",
            "11",
            "--country-code",
            "54",
        ]);
        let region = args.region();
        assert_eq!(region.area_code, "11");
        assert_eq!(region.country_code, "54");
    }
}
