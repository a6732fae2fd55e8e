use clap::{Parser, Subcommand};

/// Command-line interface definition for studyhall
/// CLI application to track study room attendance with SQLite
#[derive(Parser)]
#[command(
    name = "studyhall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Study room attendance: check-ins, check-outs, achievements and guardian notifications over SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration, then run the
    /// forgotten-checkout sweep
    Init,

    /// Manage the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,
    },

    /// Roster administration (bulk spreadsheet import stays external)
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },

    /// Check a student in
    In {
        /// Student system id
        system_id: i64,

        #[arg(long, help = "Seat number")]
        seat: Option<i64>,

        /// Claimed entry time for offline-captured events
        /// (RFC 3339 or "YYYY-MM-DD HH:MM[:SS]" local)
        #[arg(long = "at")]
        at: Option<String>,
    },

    /// Check a student out
    Out {
        /// Student system id (omit when using --log)
        system_id: Option<i64>,

        #[arg(long = "log", help = "Target a specific attendance log id")]
        log_id: Option<i64>,

        /// Claimed exit time for offline-captured events
        #[arg(long = "at")]
        at: Option<String>,
    },

    /// QR flow: check in or out depending on current state
    Toggle {
        /// Student system id
        system_id: i64,

        #[arg(long = "at")]
        at: Option<String>,
    },

    /// Check out every student currently present
    ExitAll,

    /// Close forgotten open logs from previous days
    Sweep,

    /// Presence board: who is in the room, today's visits
    List {
        #[arg(long, help = "Show the board for a specific date (YYYY-MM-DD)")]
        date: Option<String>,

        #[arg(long, help = "Emit the board as JSON instead of a table")]
        json: bool,
    },

    /// Inspect or retry the pending guardian-mail queue
    Queue {
        #[arg(long = "print", help = "Print queued messages")]
        print: bool,

        #[arg(long = "retry", help = "Run one retry sweep")]
        retry: bool,
    },

    /// Follow state-change notices (keep-alives while idle)
    Watch {
        #[arg(long, default_value_t = 2, help = "Poll interval in seconds")]
        interval: u64,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum StudentAction {
    /// Register one student
    Add {
        /// Student system id (unique, stable)
        system_id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        grade: Option<i64>,

        #[arg(long = "class")]
        class_number: Option<i64>,

        #[arg(long = "number")]
        student_number: Option<i64>,

        #[arg(long = "year")]
        enrollment_year: Option<i64>,

        #[arg(long = "email", help = "Guardian e-mail address")]
        email: Option<String>,
    },

    /// List the roster
    List,
}
