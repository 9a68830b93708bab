use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Language server for LS-PrePost command files")]
pub(crate) struct Cli {
    /// Command table to load instead of the packaged data/commands.tsv
    #[arg(long, value_name = "PATH")]
    pub commands: Option<PathBuf>,

    /// Listen for a single TCP connection instead of using stdio
    #[arg(long)]
    pub listen: bool,

    /// Address to listen on (with --listen) or connect to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (with --listen) or connect to
    #[arg(long)]
    pub port: Option<u16>,

    /// Print the command matched on every line of the given files and exit
    #[arg(long, value_name = "FILE", num_args = 1..)]
    pub inspect: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transport_flags() {
        let cli = Cli::parse_from(["cfilelsp", "--listen", "--port", "9300"]);
        assert!(cli.listen);
        assert_eq!(cli.port, Some(9300));
        assert!(cli.host.is_none());
        assert!(cli.inspect.is_empty());
    }

    #[test]
    fn parses_inspect_files() {
        let cli = Cli::parse_from([
            "cfilelsp",
            "--commands",
            "table.tsv",
            "--inspect",
            "a.cfile",
            "b.cfile",
        ]);
        assert_eq!(cli.commands, Some(PathBuf::from("table.tsv")));
        assert_eq!(cli.inspect, vec![PathBuf::from("a.cfile"), PathBuf::from("b.cfile")]);
    }
}
