// src/core/registry.rs

//! The fixed battery of probes run against the target.
//!
//! Building the registry happens in two phases. Capability detection runs
//! first and to completion, turning the installed `mtr`'s advertised options
//! into zero or two derived tasks. Those are then appended to the static
//! list, and only the merged list is handed to the scheduler.

use color_eyre::eyre::{Report, Result, eyre};
use tracing::{debug, info};

use crate::core::collector::Collector;
use crate::core::models::DisplayMode;
use crate::core::probes::command_probe::combined_output;
use crate::core::probes::{CommandProbe, DnsProbe, FileProbe, HttpProbe, Task};
use crate::settings::Settings;

/// Local resolver configuration copied into the archive.
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Endpoint that echoes back the caller's public address.
pub const IP_ADDRESS_PATH: &str = "/app/update_getipaddr";

/// Builds every task for this run, probing `mtr` along the way.
///
/// A failed capability probe is recorded in `collector` and only drops the
/// mtr family; the rest of the registry is unaffected.
pub async fn build_tasks(settings: &Settings, collector: &Collector) -> Vec<Box<dyn Task>> {
    let mut tasks = static_tasks(settings);
    let derived = mtr_tasks(settings, collector).await;
    debug!(derived = derived.len(), "Capability detection finished.");
    tasks.extend(derived);
    info!(count = tasks.len(), "Task registry built.");
    tasks
}

fn boxed(probe: impl Task + 'static) -> Box<dyn Task> {
    Box::new(probe)
}

fn family_flag(family: &str) -> &'static str {
    if family == "ipv4" { "-4" } else { "-6" }
}

fn curl(host: &str, ua: &str, scheme: &str, family: &str, path: &str, tag: &str) -> Box<dyn Task> {
    let url = format!("{scheme}://{host}{path}");
    boxed(CommandProbe::new(
        format!("{scheme}-{host}-{tag}-{family}.txt"),
        "curl",
        [
            family_flag(family),
            "--trace-time",
            "--trace-ascii",
            "-",
            "--user-agent",
            ua,
            url.as_str(),
        ],
    ))
}

fn dig(name: String, args: &[&str]) -> Box<dyn Task> {
    boxed(CommandProbe::new(
        name,
        "dig",
        std::iter::once("-4").chain(args.iter().copied()),
    ))
}

/// The tasks whose invocation never depends on the environment.
pub fn static_tasks(settings: &Settings) -> Vec<Box<dyn Task>> {
    let host = settings.target.as_str();
    let ua = settings.user_agent.as_str();

    let mut tasks = Vec::new();

    // HTTP(S) traces against the target and its edge trace page.
    for (path, tag) in [("", "curl"), ("/cdn-cgi/trace", "cdn-cgi-trace")] {
        for family in ["ipv4", "ipv6"] {
            for scheme in ["https", "http"] {
                tasks.push(curl(host, ua, scheme, family, path, tag));
            }
        }
    }

    // Resolution through the default, public and authoritative servers.
    tasks.push(dig(format!("{host}-dig.txt"), &["+all", host, "A", host, "AAAA"]));
    tasks.push(dig(
        format!("{host}-dig-google.txt"),
        &["+all", "@8.8.8.8", host, "A", host, "AAAA"],
    ));
    tasks.push(dig(
        format!("{host}-dig-google-trace.txt"),
        &["+all", "+trace", "@8.8.8.8", host, "A", host, "AAAA"],
    ));
    for ns in ["josh", "kim"] {
        let server = format!("@{ns}.ns.cloudflare.com");
        tasks.push(dig(
            format!("{host}-dig-cloudflare-{ns}.txt"),
            &[host, server.as_str(), "+nsid"],
        ));
        // RFC 4892 identifies which site of the anycast pool answered.
        tasks.push(dig(
            format!("dig-cloudflare-{ns}-rfc4892.txt"),
            &["CH", "TXT", "id.server", server.as_str(), "+nsid"],
        ));
    }
    tasks.push(dig(
        "dig-cloudflare.txt".to_string(),
        &["@1.1.1.1", "CH", "TXT", "hostname.cloudflare", "+short"],
    ));
    tasks.push(boxed(DnsProbe::new(format!("{host}-resolver-lookup.txt"), host)));

    // Local interfaces and routing table.
    tasks.push(boxed(CommandProbe::new("ip-addr.txt", "ip", ["addr"])));
    tasks.push(boxed(CommandProbe::new("ip-route.txt", "ip", ["route"])));

    // Reachability and path.
    tasks.push(boxed(CommandProbe::new(
        format!("{host}-ping-ipv4.txt"),
        "ping",
        ["-4", "-c", "30", host],
    )));
    tasks.push(boxed(CommandProbe::new(
        format!("{host}-ping-ipv6.txt"),
        "ping",
        ["-6", "-c", "30", host],
    )));
    tasks.push(boxed(CommandProbe::new(
        format!("{host}-tracepath.txt"),
        "tracepath",
        [host],
    )));

    tasks.push(boxed(HttpProbe::new(
        "ip-address.txt",
        format!("http://{host}{IP_ADDRESS_PATH}"),
        ua,
    )));
    tasks.push(boxed(FileProbe::new("resolv.conf", RESOLV_CONF)));

    tasks
}

/// Picks the richest display mode the advertised options allow.
///
/// Markers are checked in order of preference, so exactly one mode comes
/// back for any input.
pub fn select_display_mode(help: &[u8]) -> DisplayMode {
    let advertises = |marker: &[u8]| help.windows(marker.len()).any(|w| w == marker);
    if advertises(b"--json") {
        DisplayMode::Json
    } else if advertises(b"--report-wide") {
        DisplayMode::ReportWide
    } else {
        DisplayMode::Report
    }
}

/// Runs `<mtr> --help` and returns the display mode it supports.
pub async fn detect_display_mode(program: &str) -> Result<DisplayMode> {
    let help_arg = ["--help".to_string()];
    let (status, combined) = combined_output(program, &help_arg)
        .await
        .map_err(|e| Report::new(e).wrap_err("determining mtr command"))?;
    if !status.success() {
        return Err(eyre!("{}", status).wrap_err(format!(
            "determining mtr command: {}",
            String::from_utf8_lossy(&combined).trim_end()
        )));
    }
    Ok(select_display_mode(&combined))
}

/// The IPv4 and IPv6 route reports, or nothing if detection failed.
pub async fn mtr_tasks(settings: &Settings, collector: &Collector) -> Vec<Box<dyn Task>> {
    let mode = match detect_display_mode(&settings.mtr_program).await {
        Ok(mode) => mode,
        Err(e) => {
            collector.record_error(e);
            return Vec::new();
        }
    };
    info!(mode = %mode, "Selected mtr display mode.");
    mtr_probes(settings, mode)
        .into_iter()
        .map(boxed)
        .collect()
}

/// The route report probes for an already-chosen display mode.
pub fn mtr_probes(settings: &Settings, mode: DisplayMode) -> Vec<CommandProbe> {
    let host = settings.target.as_str();
    ["ipv4", "ipv6"]
        .into_iter()
        .map(|family| {
            let mut args: Vec<&str> = mode.args().to_vec();
            args.extend([family_flag(family), host]);
            CommandProbe::new(
                format!("{host}-mtr-{family}.{}", mode.extension()),
                settings.mtr_program.as_str(),
                args,
            )
        })
        .collect()
}
