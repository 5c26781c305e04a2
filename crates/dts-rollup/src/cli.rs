//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::Parser;

/// Rolls a multi-file TypeScript declaration tree into one redacted file.
#[derive(Debug, Parser)]
#[command(name = "dts-rollup")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration document (JSON); all paths inside it are resolved
    /// relative to its directory
    #[arg(short = 'c', long = "config")]
    pub config: Utf8PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_short_and_long() {
        let args = Args::parse_from(["dts-rollup", "-c", "rollup.json"]);
        assert_eq!(args.config, "rollup.json");
        let args = Args::parse_from(["dts-rollup", "--config", "conf/rollup.json"]);
        assert_eq!(args.config, "conf/rollup.json");
    }
}
