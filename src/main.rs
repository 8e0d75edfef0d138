//! Entry point for the **xpager** applet.
//!
//! Parses the command line, loads the configuration and runs the pager on
//! the X11 backend. Without the `x11` feature there is no display backend
//! and the binary only supports `-v`, `-h` and `-sr`.

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use xpager::cli::{self, CliAction, Options};
use xpager::config::Config;

/// Resolve the config directory (`$XDG_CONFIG_HOME/xpager`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("xpager")
}

/// Load the config from `explicit` or `$XDG_CONFIG_HOME/xpager/config.json`,
/// falling back to compiled-in defaults.
fn load_config(explicit: Option<&Path>) -> Config {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir().join("config.json"));
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) if explicit.is_some() => {
            warn!("{}, using defaults", e);
            Config::default()
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "xpager".into());
    let options = match cli::parse(args) {
        CliAction::Run(options) => options,
        CliAction::Version => {
            println!("xpager {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        CliAction::Usage => {
            print!("{}", cli::usage(&program));
            return;
        }
    };

    let mut config = load_config(options.config_file.as_deref());
    if let Some(layer) = options.layer {
        config.layer = layer;
    }

    if options.show_settings {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    start_event_loop(options, config);
}

//  Event loops

#[cfg(feature = "x11")]
fn start_event_loop(options: Options, config: Config) {
    use xpager::pager::PagerController;
    use xpager::x11::{self, X11Display};

    let display = match X11Display::connect(options.display.as_deref(), options.screen) {
        Ok(display) => display,
        Err(e) => {
            eprintln!("xpager: {}", e);
            std::process::exit(1);
        }
    };

    let adapters = xpager::protocol::enabled(&display, &config.protocols);
    if adapters.is_empty() {
        error!("no window-manager protocol enabled");
        std::process::exit(1);
    }

    let mut pager = match PagerController::new(display, config, adapters, options.withdrawn) {
        Ok(pager) => pager,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = x11::run(&mut pager) {
        error!("display connection lost: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "x11"))]
fn start_event_loop(_options: Options, _config: Config) {
    error!("xpager was built without the `x11` feature; no display backend available");
    std::process::exit(1);
}
