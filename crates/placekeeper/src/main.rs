//! Binary entrypoint for placekeeper.
use std::{process, sync::Arc, time::Duration};

use clap::Parser;
use logging::{
    self as logshared,
    diag::{self, DEFAULT_CAPACITY, DiagLog},
};
use placekeeper_engine::{
    Coordinator, DISPLAY_DELAY_MS, EVICTION_THRESHOLD, KeeperCfg, MAX_MONITORS, MIN_MONITORS,
    MonitorRange, SCAN_DELAY_MS, STALE_THRESHOLD, StoreCfg,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*};
use win_winops::ops::{RealWinOps, WinOps};

/// Application state and event wiring.
#[cfg(windows)]
mod app;
/// Console mode without tray or window.
mod headless;
/// Diagnostics log window.
#[cfg(windows)]
mod log_view;
#[cfg(windows)]
mod tray;

#[derive(Parser, Debug)]
#[command(
    name = "placekeeper",
    about = "Keeps window placements across monitor-count changes",
    version
)]
/// Command-line interface for the `placekeeper` binary.
struct Cli {
    /// Logging controls
    #[command(flatten)]
    log: logshared::LogArgs,

    /// Debounce between a window moving and the rescan
    #[arg(long, value_name = "MS", default_value_t = SCAN_DELAY_MS)]
    scan_delay_ms: u64,

    /// Delay between a display change and the restore pass
    #[arg(long, value_name = "MS", default_value_t = DISPLAY_DELAY_MS)]
    display_delay_ms: u64,

    /// Skip restoring windows missing from more than this many scans
    #[arg(long, value_name = "SCANS", default_value_t = STALE_THRESHOLD)]
    stale_threshold: u32,

    /// Forget windows missing from this many scans
    #[arg(long, value_name = "SCANS", default_value_t = EVICTION_THRESHOLD)]
    eviction_threshold: u32,

    /// Fewest monitors to keep placements for
    #[arg(long, value_name = "N", default_value_t = MIN_MONITORS)]
    min_monitors: u32,

    /// Most monitors to keep placements for
    #[arg(long, value_name = "N", default_value_t = MAX_MONITORS)]
    max_monitors: u32,

    /// Diagnostics buffer size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CAPACITY)]
    diag_capacity: usize,

    /// Start with diagnostics recording enabled
    #[arg(long)]
    diagnostics: bool,

    /// Run without tray icon or log window; exit on Ctrl-C
    #[arg(long)]
    headless: bool,
}

impl Cli {
    /// Validate flag combinations and build the engine configuration.
    fn keeper_cfg(&self) -> Result<KeeperCfg, String> {
        // A one-monitor layout is never restored.
        if self.min_monitors < 2 {
            return Err("--min-monitors must be at least 2".into());
        }
        if self.min_monitors > self.max_monitors {
            return Err(format!(
                "--min-monitors ({}) exceeds --max-monitors ({})",
                self.min_monitors, self.max_monitors
            ));
        }
        if self.eviction_threshold == 0 {
            return Err("--eviction-threshold must be at least 1".into());
        }
        Ok(KeeperCfg {
            scan_delay: Duration::from_millis(self.scan_delay_ms),
            display_delay: Duration::from_millis(self.display_delay_ms),
            store: StoreCfg {
                monitors: MonitorRange {
                    min: self.min_monitors,
                    max: self.max_monitors,
                },
                stale_threshold: self.stale_threshold,
                eviction_threshold: self.eviction_threshold,
            },
        })
    }
}

fn main() {
    let cli = Cli::parse();

    let final_spec: String = logshared::compute_spec(
        cli.log.trace,
        cli.log.debug,
        cli.log.log_level.as_deref(),
        cli.log.log_filter.as_deref(),
    );
    let env_filter = logshared::env_filter_from_spec(&final_spec);

    let diag_log = Arc::new(DiagLog::new(cli.diag_capacity));
    diag_log.set_enabled(cli.diagnostics);

    // Single subscriber: env filter, compact fmt output (no time), and the
    // diagnostics mirror for warnings and errors.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().without_time())
        .with(diag::layer(diag_log.clone()))
        .try_init()
        .ok();

    let cfg = match cli.keeper_cfg() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };
    info!(
        monitors = %format_args!("{}..={}", cfg.store.monitors.min, cfg.store.monitors.max),
        scan_ms = cfg.scan_delay.as_millis(),
        display_ms = cfg.display_delay.as_millis(),
        "starting"
    );
    let coord = Coordinator::new(Arc::new(RealWinOps) as Arc<dyn WinOps>, diag_log, cfg);

    let res = if cli.headless {
        headless::run(coord).map_err(|e| e.to_string())
    } else {
        run_ui(coord)
    };
    if let Err(e) = res {
        error!("{}", e);
        process::exit(1);
    }
}

/// Tray icon plus log window.
#[cfg(windows)]
fn run_ui(coord: Coordinator) -> Result<(), String> {
    app::run(coord).map_err(|e| e.to_string())
}

/// No tray on this platform; fall back to console mode.
#[cfg(not(windows))]
fn run_ui(coord: Coordinator) -> Result<(), String> {
    info!("no tray support on this platform; running headless");
    headless::run(coord).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use placekeeper_engine::KeeperCfg;

    use super::Cli;

    #[test]
    fn defaults_match_engine_defaults() {
        let cli = Cli::try_parse_from(["placekeeper"]).unwrap();
        let cfg = cli.keeper_cfg().unwrap();
        assert_eq!(cfg, KeeperCfg::default());
        assert!(!cli.headless);
        assert!(!cli.diagnostics);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "placekeeper",
            "--scan-delay-ms",
            "50",
            "--display-delay-ms",
            "1000",
            "--stale-threshold",
            "4",
            "--eviction-threshold",
            "10",
            "--min-monitors",
            "2",
            "--max-monitors",
            "3",
            "--debug",
        ])
        .unwrap();
        let cfg = cli.keeper_cfg().unwrap();
        assert_eq!(cfg.scan_delay, Duration::from_millis(50));
        assert_eq!(cfg.display_delay, Duration::from_millis(1000));
        assert_eq!(cfg.store.stale_threshold, 4);
        assert_eq!(cfg.store.eviction_threshold, 10);
        assert_eq!((cfg.store.monitors.min, cfg.store.monitors.max), (2, 3));
        assert!(cli.log.debug);
    }

    #[test]
    fn inverted_monitor_range_is_rejected() {
        let cli =
            Cli::try_parse_from(["placekeeper", "--min-monitors", "4", "--max-monitors", "3"])
                .unwrap();
        assert!(cli.keeper_cfg().is_err());
    }

    #[test]
    fn single_monitor_slot_is_rejected() {
        let cli = Cli::try_parse_from(["placekeeper", "--min-monitors", "1"]).unwrap();
        let err = cli.keeper_cfg().unwrap_err();
        assert!(err.contains("--min-monitors"), "{err}");
    }

    #[test]
    fn zero_eviction_threshold_is_rejected() {
        let cli = Cli::try_parse_from(["placekeeper", "--eviction-threshold", "0"]).unwrap();
        assert!(cli.keeper_cfg().is_err());
    }
}
