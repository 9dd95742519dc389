use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::Stylize;
use std::collections::BTreeMap;
use std::time::Duration;

mod table_display;

use atlona::config::{Config, DeviceKind};
use atlona::http::DEFAULT_TIMEOUT;
use atlona::{Amp60, VideoSwitcher2x1};
use table_display::{display_blocks, display_status, display_switcher_state, on_off};

const DEFAULT_OUTPUT: &str = "1";
const DEFAULT_BLOCK: &str = "main";

#[derive(Debug, Default, PartialEq)]
struct Options {
    help: bool,
    generate_config: bool,
    verbose: bool,
    timeout: Option<Duration>,
    positional: Vec<String>,
}

#[derive(Debug)]
enum Target {
    Switcher(VideoSwitcher2x1),
    Amp(Amp60),
}

fn print_help() {
    println!("{}", "atlona-ctl - control Atlona switchers and amplifiers".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  atlona-ctl [OPTIONS] switcher <address> <command> [args]");
    println!("  atlona-ctl [OPTIONS] amp <address> <command> [args]");
    println!("  atlona-ctl [OPTIONS] device <name> <command> [args]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}        - Log request details to stderr", "--verbose".green());
    println!("  {} - Request deadline (default from config)", "--timeout <secs>".green());
    println!("                     (default 5s, or [http] timeout_secs for named devices)");
    println!("  {} - Write a commented config file", "--generate-config".green());
    println!("  {}           - Show this help", "--help".green());
    println!();
    println!("{}", "Switcher commands:".yellow());
    println!("  {}                    - Show everything the switcher reports", "state".green());
    println!("  {}       - Input routed to an output", "get-input [output]".green());
    println!("  {} - Route input 1 or 2", "set-input <input> [output]".green());
    println!();
    println!("{}", "Amplifier commands:".yellow());
    println!("  {}                     - Model, firmware, MAC, serial, uptime", "info".green());
    println!("  {}        - Current volume", "volume [block...]".green());
    println!("  {}          - Current mute state", "mute [block...]".green());
    println!("  {}  - Set volume", "set-volume <level> [block]".green());
    println!("  {} - Mute or unmute", "set-mute <on|off> [block]".green());
    println!();
    println!("Devices for `device <name>` are read from {}", "~/.config/atlona/config.toml".cyan());
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => options.help = true,
            "--generate-config" => options.generate_config = true,
            "--verbose" | "-v" => options.verbose = true,
            "--timeout" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--timeout needs a number of seconds"))?;
                let secs: f64 = value
                    .parse()
                    .with_context(|| format!("invalid --timeout value {:?}", value))?;
                if !secs.is_finite() || secs <= 0.0 {
                    bail!("--timeout must be a positive number of seconds");
                }
                options.timeout = Some(Duration::from_secs_f64(secs));
            }
            // Volumes can be negative, so only reject unknown long options
            other if other.starts_with("--") => bail!("unknown option {}", other),
            other => options.positional.push(other.to_string()),
        }
    }

    Ok(options)
}

fn parse_on_off(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on or off, got {:?}", other),
    }
}

/// Build the driver for a target. The config file is only read for named
/// devices, so a broken file never gets in the way of a direct address.
fn resolve_target<F>(
    kind: &str,
    id: &str,
    timeout: Option<Duration>,
    load_config: F,
) -> Result<Target>
where
    F: FnOnce() -> Result<Config>,
{
    match kind {
        "switcher" => Ok(Target::Switcher(
            VideoSwitcher2x1::new(id, "", "").with_timeout(timeout.unwrap_or(DEFAULT_TIMEOUT)),
        )),
        "amp" => Ok(Target::Amp(
            Amp60::new(id).with_timeout(timeout.unwrap_or(DEFAULT_TIMEOUT)),
        )),
        "device" => {
            let config = load_config()?;
            let timeout = timeout.unwrap_or_else(|| config.http.timeout());
            let device = config
                .find_device(id)
                .ok_or_else(|| anyhow!("no device named {:?} in the config file", id))?;
            Ok(match device.kind {
                DeviceKind::Switcher => Target::Switcher(device.switcher(timeout)),
                DeviceKind::Amp => Target::Amp(device.amp(timeout)),
            })
        }
        other => bail!("unknown target {:?}, expected switcher, amp or device", other),
    }
}

fn blocks_or_default(args: &[String]) -> Vec<String> {
    if args.is_empty() {
        vec![DEFAULT_BLOCK.to_string()]
    } else {
        args.to_vec()
    }
}

fn run_switcher(switcher: &VideoSwitcher2x1, command: &str, args: &[String]) -> Result<()> {
    match command {
        "state" => {
            let state = switcher.get_state()?;
            display_switcher_state(switcher.address(), &state);
        }
        "get-input" => {
            let output = args.first().map(String::as_str).unwrap_or(DEFAULT_OUTPUT);
            let input = switcher.get_input_by_output(output)?;
            println!("Output {} is showing input {}", output, input.green());
        }
        "set-input" => {
            let input = args
                .first()
                .ok_or_else(|| anyhow!("set-input needs an input (1 or 2)"))?;
            let output = args.get(1).map(String::as_str).unwrap_or(DEFAULT_OUTPUT);
            switcher.set_input_by_output(output, input)?;
            println!("{}", format!("Output {} switched to input {}", output, input).green());
        }
        other => bail!("unknown switcher command {:?}", other),
    }
    Ok(())
}

fn run_amp(amp: &Amp60, command: &str, args: &[String]) -> Result<()> {
    match command {
        "info" => {
            let status = amp.get_info()?;
            display_status(amp.address(), &status);
        }
        "volume" => {
            let volumes = amp.get_volumes(&blocks_or_default(args))?;
            display_blocks("Volume", &volumes);
        }
        "mute" => {
            let mutes = amp.get_mutes(&blocks_or_default(args))?;
            let mutes: BTreeMap<String, String> =
                mutes.into_iter().map(|(b, m)| (b, on_off(m))).collect();
            display_blocks("Muted", &mutes);
        }
        "set-volume" => {
            let level = args
                .first()
                .ok_or_else(|| anyhow!("set-volume needs a level"))?;
            let level: i32 = level
                .parse()
                .with_context(|| format!("invalid volume {:?}", level))?;
            let block = args.get(1).map(String::as_str).unwrap_or(DEFAULT_BLOCK);
            amp.set_volume(block, level)?;
            println!("{}", format!("Volume on {} set to {}", block, level).green());
        }
        "set-mute" => {
            let value = args
                .first()
                .ok_or_else(|| anyhow!("set-mute needs on or off"))?;
            let muted = parse_on_off(value)?;
            let block = args.get(1).map(String::as_str).unwrap_or(DEFAULT_BLOCK);
            amp.set_mute(block, muted)?;
            println!("{}", format!("Mute on {} set to {}", block, on_off(muted)).green());
        }
        other => bail!("unknown amp command {:?}", other),
    }
    Ok(())
}

fn run(options: &Options) -> Result<()> {
    let (kind, id, command, args) = match options.positional.as_slice() {
        [kind, id, command, args @ ..] => (kind, id, command, args),
        _ => bail!("expected <target> <address|name> <command>, see --help"),
    };

    match resolve_target(kind, id, options.timeout, Config::load)? {
        Target::Switcher(switcher) => run_switcher(&switcher, command, args),
        Target::Amp(amp) => run_amp(&amp, command, args),
    }
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if path.exists() {
        bail!("config file already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            std::process::exit(1);
        }
    };

    if options.help || (options.positional.is_empty() && !options.generate_config) {
        print_help();
        return;
    }

    if options.generate_config {
        if let Err(e) = generate_config() {
            eprintln!("{}", format!("Error: {:#}", e).red());
            std::process::exit(1);
        }
        return;
    }

    match atlona::utils::logging::init_tracing(options.verbose) {
        Ok(path) if options.verbose => eprintln!("Debug logs will be written to {}", path.display()),
        Ok(_) => {}
        Err(e) => eprintln!("{}", format!("Warning: logging disabled: {:#}", e).yellow()),
    }

    if let Err(e) = run(&options) {
        tracing::error!(target: "atlona::cli", "{:#}", e);
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options =
            parse_options(&args(&["--verbose", "--timeout", "2.5", "amp", "10.0.0.2", "info"]))
                .unwrap();
        assert!(options.verbose);
        assert_eq!(options.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(options.positional, args(&["amp", "10.0.0.2", "info"]));
    }

    #[test]
    fn test_negative_volume_is_positional() {
        let options = parse_options(&args(&["amp", "10.0.0.2", "set-volume", "-20"])).unwrap();
        assert_eq!(options.positional.last().unwrap(), "-20");
    }

    #[test]
    fn test_bad_options() {
        assert!(parse_options(&args(&["--timeout"])).is_err());
        assert!(parse_options(&args(&["--timeout", "0"])).is_err());
        assert!(parse_options(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn test_parse_on_off() {
        assert!(parse_on_off("ON").unwrap());
        assert!(!parse_on_off("off").unwrap());
        assert!(parse_on_off("1").unwrap());
        assert!(parse_on_off("maybe").is_err());
    }

    #[test]
    fn test_resolve_named_device() {
        let config: Config = toml::from_str(
            r#"
[[devices]]
name = "lectern"
kind = "switcher"
address = "10.5.34.12"
"#,
        )
        .unwrap();
        let timeout = Some(Duration::from_secs(1));
        match resolve_target("device", "lectern", timeout, || Ok(config.clone())).unwrap() {
            Target::Switcher(s) => assert_eq!(s.address(), "10.5.34.12"),
            Target::Amp(_) => panic!("expected a switcher"),
        }
        assert!(resolve_target("device", "nope", timeout, || Ok(config.clone())).is_err());
        assert!(resolve_target("projector", "x", timeout, || Ok(config.clone())).is_err());
    }

    #[test]
    fn test_direct_targets_skip_config() {
        let broken = || -> Result<Config> { bail!("config file is not valid TOML") };
        match resolve_target("amp", "10.0.0.2", None, broken).unwrap() {
            Target::Amp(amp) => assert_eq!(amp.address(), "10.0.0.2"),
            Target::Switcher(_) => panic!("expected an amp"),
        }
        assert!(resolve_target("switcher", "10.0.0.3", None, broken).is_ok());

        let err = resolve_target("device", "lectern", None, broken).unwrap_err();
        assert!(err.to_string().contains("not valid TOML"));
    }

    #[test]
    fn test_blocks_or_default() {
        assert_eq!(blocks_or_default(&[]), vec![DEFAULT_BLOCK.to_string()]);
        assert_eq!(blocks_or_default(&args(&["a", "b"])), args(&["a", "b"]));
    }
}
