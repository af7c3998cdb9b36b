use std::error::Error;
use std::path::Path;

use crate::cli::commands::{ConfigAction, ConfigCmd};
use crate::io::config_io;
use crate::io::lock::DeckLock;

pub fn cmd_config(data_dir: &Path, args: ConfigCmd) -> Result<(), Box<dyn Error>> {
    match args.action {
        ConfigAction::Get { key } => {
            let (config, _doc) = config_io::read_config(data_dir)?;
            println!("{}", config_io::get_value(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let _lock = DeckLock::acquire_default(data_dir)?;
            let (_config, mut doc) = config_io::read_config(data_dir)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config(data_dir, &doc)?;
            tracing::info!(%key, "config updated");
            let (config, _doc) = config_io::read_config(data_dir)?;
            println!("{} = {}", key, config_io::get_value(&config, &key)?);
        }
    }
    Ok(())
}
