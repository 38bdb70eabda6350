use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;

use crate::application::{Operation, RuntimeConfig};
use crate::store::AddError;
use crate::store::PathStore;
use crate::store::RemoveError;
use crate::store::ResolveError;
use crate::store::StoreLoadError;
use crate::store::StoreLocation;
use crate::store::StoreLocationError;
use crate::store::StorePersistError;

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let location = StoreLocation::from_env().context(LocationSnafu)?;
        let mut store = PathStore::load_or_init(&location)
            .await
            .context(LoadSnafu)?;
        debug!("Loaded store: {:?}", store);

        match app_config.operation {
            Operation::Add { key, raw_path } => {
                let abs_path = store.add(&key, &raw_path).context(AddSnafu)?;
                store.write(&location).await.context(PersistSnafu)?;
                println!("Added: {key} → {}", abs_path.display());
            }
            Operation::Remove { key } => {
                store.remove(&key).context(RemoveSnafu)?;
                store.write(&location).await.context(PersistSnafu)?;
                println!("Deleted key: {key}");
            }
            Operation::List => {
                if store.is_empty() {
                    println!("No paths defined.");
                } else {
                    for (key, path) in store.sorted_entries() {
                        println!("{key:<10} → {path}");
                    }
                }
            }
            Operation::Resolve { key } => {
                let path = store.resolve(&key).await.context(ResolveSnafu)?;
                println!("{path}");
            }
        }

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Could not determine the config file location"))]
    LocationError { source: StoreLocationError },
    #[snafu(display("Error loading config"))]
    LoadError { source: StoreLoadError },
    #[snafu(display("Could not add the path"))]
    AddError { source: AddError },
    #[snafu(display("Could not remove the key"))]
    RemoveError { source: RemoveError },
    #[snafu(display("Could not resolve the key"))]
    ResolveError { source: ResolveError },
    #[snafu(display("Failed to save the config file"))]
    PersistError { source: StorePersistError },
}
