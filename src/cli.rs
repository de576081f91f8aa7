use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "redisio")]
#[command(about = "A tiny pipelining Redis client")]
#[command(long_about = "redisio sends Redis commands over RESP. Give a command on the command line to run it once, or feed command lines on stdin (--pipe) for pipelined mass insertion.")]
#[command(version)]
pub struct Cli {
    /// Server host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Unix socket path (overrides host and port)
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Database number selected on connect
    #[arg(short = 'n', long)]
    pub db: Option<u32>,

    /// Password sent with AUTH on connect
    #[arg(short = 'a', long)]
    pub password: Option<String>,

    /// Configuration file path (JSON format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Send empty arguments instead of dropping them
    #[arg(long)]
    pub strict: bool,

    /// Pending replies above which convenience calls drop the connection
    #[arg(long)]
    pub max_pending: Option<usize>,

    /// Read command lines from stdin and pipeline them
    #[arg(long)]
    pub pipe: bool,

    /// Commands per pipelined batch in --pipe mode
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Install the OpenTelemetry meter provider
    #[arg(long)]
    pub metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Print usage examples and exit
    #[arg(long)]
    pub examples: bool,

    /// Command to run, e.g. `SET greeting hello`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// True when commands come from stdin rather than the command line.
    pub fn reads_stdin(&self) -> bool {
        self.pipe || self.command.is_empty()
    }

    /// Print example usage
    pub fn print_examples() {
        println!("Examples:");
        println!("  # Run one command");
        println!("  {} SET greeting hello", env!("CARGO_PKG_NAME"));
        println!();

        println!("  # Mass insertion from a file of command lines");
        println!("  {} --pipe --batch-size 5000 < commands.txt", env!("CARGO_PKG_NAME"));
        println!();

        println!("  # Unix socket, database 2, with a password");
        println!(
            "  {} --socket /tmp/redis.sock -n 2 -a secret PING",
            env!("CARGO_PKG_NAME")
        );
    }
}
