use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "atlas",
    about = "Atlas: covering and glueing diagnostics over toric toy charts",
    version
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump a covering: charts, glueings, glueing-graph arcs, connectivity
    Inspect {
        /// Covering description (.json or .toml)
        file: String,

        /// Treat every glueing domain as dense for arcs and connectivity
        #[arg(long)]
        all_dense: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Infer every glueing reachable through dense two-step chains
    Fill {
        /// Covering description (.json or .toml)
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the transition graph (composable pairs of glueings)
    Transitions {
        /// Covering description (.json or .toml)
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Base change every chart to another field
    BaseChange {
        /// Covering description (.json or .toml)
        file: String,

        /// Target field label, e.g. `QQ(i)`
        #[arg(long)]
        field: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
