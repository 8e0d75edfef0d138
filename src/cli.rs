//! Command-line parsing.
//!
//! Flags use the traditional X11 single-dash style; `--flag` is accepted as
//! a synonym for `-flag`.
//!
//! | flag                | effect                                         |
//! |---------------------|------------------------------------------------|
//! | `-display <name>`   | X display to connect to                        |
//! | `-s <screen>`       | screen number on that display                  |
//! | `-rc <file>`        | configuration file                             |
//! | `-sr`               | print the effective settings as JSON and exit  |
//! | `-w`                | start withdrawn (for docks)                    |
//! | `-l <layer>`        | `top`, `normal` or `bottom`                    |
//! | `-v`                | print the version and exit                     |
//! | `-h`                | print usage and exit                           |

use crate::config::Layer;
use std::path::PathBuf;

/// Settings taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub display: Option<String>,
    pub screen: Option<usize>,
    pub config_file: Option<PathBuf>,
    pub show_settings: bool,
    pub withdrawn: bool,
    pub layer: Option<Layer>,
}

/// What `main` should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(Options),
    Version,
    /// Print usage. Also the answer to unknown or incomplete flags.
    Usage,
}

/// Parse the arguments after the program name.
pub fn parse<I>(args: I) -> CliAction
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let flag = arg.strip_prefix('-').unwrap_or(&arg);
        let flag = flag.strip_prefix('-').unwrap_or(flag);
        match flag {
            "display" => match args.next() {
                Some(name) => options.display = Some(name),
                None => return CliAction::Usage,
            },
            "s" => match args.next().and_then(|s| s.parse().ok()) {
                Some(screen) => options.screen = Some(screen),
                None => return CliAction::Usage,
            },
            "rc" => match args.next() {
                Some(path) => options.config_file = Some(PathBuf::from(path)),
                None => return CliAction::Usage,
            },
            "l" => match args.next().and_then(|l| l.parse().ok()) {
                Some(layer) => options.layer = Some(layer),
                None => return CliAction::Usage,
            },
            "sr" => options.show_settings = true,
            "w" => options.withdrawn = true,
            "v" => return CliAction::Version,
            _ => return CliAction::Usage,
        }
    }

    CliAction::Run(options)
}

/// Usage text for `program`.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [options]\n\
         \n\
         Options:\n\
         \x20 -display <name>   X display to connect to\n\
         \x20 -s <screen>       screen number\n\
         \x20 -rc <file>        configuration file\n\
         \x20 -sr               print the effective settings and exit\n\
         \x20 -w                start withdrawn\n\
         \x20 -l <layer>        top, normal or bottom\n\
         \x20 -v                print version and exit\n\
         \x20 -h                print this help and exit\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_with_defaults() {
        assert_eq!(parse(args(&[])), CliAction::Run(Options::default()));
    }

    #[test]
    fn every_flag() {
        let action = parse(args(&[
            "-display", ":1", "-s", "2", "-rc", "/tmp/pager.json", "-sr", "-w", "-l", "top",
        ]));
        assert_eq!(
            action,
            CliAction::Run(Options {
                display: Some(":1".into()),
                screen: Some(2),
                config_file: Some(PathBuf::from("/tmp/pager.json")),
                show_settings: true,
                withdrawn: true,
                layer: Some(Layer::Top),
            })
        );
    }

    #[test]
    fn double_dash_is_accepted() {
        let CliAction::Run(options) = parse(args(&["--w", "--display", ":0"])) else {
            panic!("expected run");
        };
        assert!(options.withdrawn);
        assert_eq!(options.display.as_deref(), Some(":0"));
    }

    #[test]
    fn version_and_help() {
        assert_eq!(parse(args(&["-v"])), CliAction::Version);
        assert_eq!(parse(args(&["-h"])), CliAction::Usage);
        assert_eq!(parse(args(&["--help"])), CliAction::Usage);
    }

    #[test]
    fn bad_input_prints_usage() {
        assert_eq!(parse(args(&["-frobnicate"])), CliAction::Usage);
        assert_eq!(parse(args(&["-rc"])), CliAction::Usage);
        assert_eq!(parse(args(&["-s", "two"])), CliAction::Usage);
        assert_eq!(parse(args(&["-l", "sideways"])), CliAction::Usage);
    }

    #[test]
    fn usage_lists_flags() {
        let text = usage("xpager");
        assert!(text.starts_with("Usage: xpager"));
        assert!(text.contains("-rc <file>"));
    }
}
