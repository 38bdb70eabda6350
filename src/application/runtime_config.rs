use crate::cli::Cli;

/// The single action performed by this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add { key: String, raw_path: String },
    Remove { key: String },
    List,
    Resolve { key: String },
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub operation: Operation,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        let operation = if let Some(pair) = cli.add {
            // clap enforces exactly two values for --add
            let mut pair = pair.into_iter();
            Operation::Add {
                key: pair.next().unwrap_or_default(),
                raw_path: pair.next().unwrap_or_default(),
            }
        } else if let Some(key) = cli.remove {
            Operation::Remove { key }
        } else if let Some(key) = cli.key {
            Operation::Resolve { key }
        } else {
            Operation::List
        };

        Self { operation }
    }
}
