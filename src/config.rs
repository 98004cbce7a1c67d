use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "rowcast")]
#[command(about = "rowcast - run one SQL statement against SQLite and print typed rows as JSON", long_about = None)]
pub struct Config {
    #[arg(short, long, default_value = "sqlite.db", env = "ROWCAST_DATABASE")]
    pub database: String,

    #[arg(long, env = "ROWCAST_IN_MEMORY", help = "Use an in-memory SQLite database")]
    pub in_memory: bool,

    #[arg(long, default_value = "info", env = "ROWCAST_LOG_LEVEL")]
    pub log_level: String,

    #[arg(short, long, env = "ROWCAST_SINGLE_RESULT", help = "Return only the first row, or null when nothing matched")]
    pub single_result: bool,

    #[arg(long, env = "ROWCAST_PANIC", help = "Abort with a panic instead of reporting the error")]
    pub panic: bool,

    #[arg(long, env = "ROWCAST_STRICT", help = "Fail on cells that do not parse for their column type")]
    pub strict: bool,

    #[arg(long, env = "ROWCAST_TIMEOUT_MS", help = "Statement timeout in milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long = "init", value_name = "SQL", help = "Statements to run before the query (repeatable)")]
    pub init: Vec<String>,

    /// Statement to run
    pub query: String,

    /// Positional arguments: `null`, integers and floats are typed, anything else is text
    pub args: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Config::parse()
    }

    pub fn db_path(&self) -> &str {
        if self.in_memory { ":memory:" } else { &self.database }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
