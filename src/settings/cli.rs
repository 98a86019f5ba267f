// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;

use std::path::PathBuf;

/// Show the output of a thermal camera in a window.
#[derive(Debug, StructOpt)]
#[structopt()]
pub(crate) struct Args {
    /// Path to a configuration file. If it doesn't exist, the defaults are used.
    #[structopt(short, long, parse(from_os_str), default_value = "config.toml")]
    pub(crate) config_path: PathBuf,
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use structopt::StructOpt;

    use super::Args;

    #[test]
    fn default_config_path() {
        let args = Args::from_iter(&["thermal-viewer"]);
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
    }

    #[test]
    fn short_config_path() {
        let args = Args::from_iter(&["thermal-viewer", "-c", "/etc/thermal.toml"]);
        assert_eq!(args.config_path, PathBuf::from("/etc/thermal.toml"));
    }
}
