use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bugscan")]
#[command(version = "0.1.0")]
#[command(about = "Probe hosts over HTTP and report servers that answer without redirecting", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).multiple(true).args(["filename", "cdir"])))]
pub struct Cli {
    /// File with one host per line
    #[arg(short = 'f', long)]
    pub filename: Option<PathBuf>,

    /// IPv4 CIDR block to expand. Example: 10.20.0.0/24
    #[arg(short = 'c', long)]
    pub cdir: Option<String>,

    /// Scan mode
    #[arg(short = 'm', long, default_value = "direct", value_parser = ["direct"])]
    pub mode: String,

    /// HTTP methods, comma separated. Example: head,get
    #[arg(short = 'M', long, default_value = "head")]
    pub methods: String,

    /// Ports to probe. Examples: 80,443 or 8080-8090
    #[arg(short = 'p', long, default_value = "80")]
    pub ports: String,

    /// Route probes through this proxy (host:port or URL)
    #[arg(short = 'P', long)]
    pub proxy: Option<String>,

    /// Also write reported results to this file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Format of the output file
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Max concurrent probes
    #[arg(short = 'T', long, default_value = "25")]
    pub threads: usize,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value = "3000")]
    pub timeout: u64,

    /// Optional request path, appended as /<uri>
    #[arg(long)]
    pub uri: Option<String>,

    /// Extra carrier redirect location to ignore (repeatable)
    #[arg(long = "isp-redirect")]
    pub isp_redirects: Vec<String>,

    /// File with one carrier redirect location per line
    #[arg(long)]
    pub isp_redirects_file: Option<PathBuf>,

    /// Do not include the built-in carrier redirect list
    #[arg(long)]
    pub no_default_isp_redirects: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Jsonl,
}
