//! Output formatting for session results

use colorful::Colorful;
use serde::Serialize;

/// Summary of one scope session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub source: String,
    pub mode: String,
    pub duration_secs: f64,
    pub ticks: u64,
    pub frames_ingested: u64,
    pub pull_failures: u64,
    pub overruns: u64,
    pub mean_tick_us: f64,
    pub max_tick_us: f64,
    pub tick_budget_us: f64,
    pub over_budget_ticks: u64,
    /// Mean over the final display window, null when it was empty
    pub correlation: Option<f32>,
    pub pan: Option<f32>,
    pub gain_label: String,
    pub gain_db: f64,
}

/// Format report as JSON
pub fn format_json(report: &SessionReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

pub fn print_json(report: &SessionReport) {
    println!("{}", format_json(report));
}

/// Meter reading as text, "--" for no data
pub fn format_meter(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{:+.3}", v),
        None => "--".to_string(),
    }
}

/// Human reading of a correlation value
pub fn describe_correlation(value: Option<f32>) -> &'static str {
    match value {
        None => "no signal",
        Some(c) if c > 0.9 => "mono",
        Some(c) if c > 0.3 => "wide, in phase",
        Some(c) if c > -0.3 => "decorrelated",
        Some(_) => "out of phase",
    }
}

/// Human reading of a pan value
pub fn describe_pan(value: Option<f32>) -> &'static str {
    match value {
        None => "no signal",
        Some(p) if p < -0.9 => "hard left",
        Some(p) if p < -0.1 => "left",
        Some(p) if p <= 0.1 => "centre",
        Some(p) if p <= 0.9 => "right",
        Some(_) => "hard right",
    }
}

/// Print a coloured summary to the terminal
pub fn print_summary(report: &SessionReport, verbose: bool) {
    println!(
        "Scope session: {} ({})",
        report.source.clone().cyan(),
        report.mode
    );
    println!("  Duration: {:.2}s", report.duration_secs);
    println!(
        "  Ticks: {} | Frames: {}",
        report.ticks, report.frames_ingested
    );

    let correlation = format!(
        "{} ({})",
        format_meter(report.correlation),
        describe_correlation(report.correlation)
    );
    let correlation = match report.correlation {
        Some(c) if c < 0.0 => correlation.red(),
        Some(c) if c < 0.5 => correlation.yellow(),
        Some(_) => correlation.green(),
        None => correlation.dim(),
    };
    println!("  Correlation: {}", correlation);
    println!(
        "  Pan: {} ({})",
        format_meter(report.pan),
        describe_pan(report.pan)
    );
    println!("  Gain: {}", report.gain_label);

    let timing = format!(
        "mean {:.1} us, max {:.1} us",
        report.mean_tick_us, report.max_tick_us
    );
    if report.over_budget_ticks > 0 {
        println!(
            "  Tick time: {} ({} over {:.0} us budget)",
            timing.yellow(),
            report.over_budget_ticks,
            report.tick_budget_us
        );
    } else {
        println!("  Tick time: {}", timing.green());
    }

    if report.overruns > 0 {
        println!(
            "  {}",
            format!("Hand-off overruns: {} frames dropped", report.overruns).yellow()
        );
    }
    if report.pull_failures > 0 {
        println!(
            "  {}",
            format!("Source failures: {} ticks", report.pull_failures).red()
        );
    }

    if verbose {
        println!("\n  Technical Details:");
        println!("    Gain: {:.3} dB", report.gain_db);
        println!("    Tick budget: {:.0} us", report.tick_budget_us);
    }
}
