// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic

//! Install, remove and inspect W4all class registrations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use w4all::registration::{self, RecordStore};
use w4all::{ClassId, InterfaceId, Module, RegistrationConfig, ThreadingModel, IID_UNKNOWN};
use w4all_c::W4allError;

#[derive(Parser)]
#[command(name = "w4all-regsvr")]
#[command(about = "Register the W4all media classes with the host record store")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a record for every class
    Register {
        /// Module file recorded under InProcServer32
        #[arg(long, value_name = "PATH")]
        module: PathBuf,

        /// Record store file (default: W4ALL_REGISTRY_PATH or the user config dir)
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,

        /// Threading model written for every class
        #[arg(long, value_name = "MODEL")]
        threading_model: Option<ThreadingModel>,
    },

    /// Delete the record of every class
    Unregister {
        /// Record store file
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },

    /// Print registered class records
    List {
        /// Record store file
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },

    /// Activate a class in-process and report the outcome
    Activate {
        /// Class identifier, e.g. {0F2C5C4D-3B12-4E8A-9A3F-5D7E1C2B4A60}
        clsid: ClassId,

        /// Interface to request from the new instance
        #[arg(long, default_value_t = IID_UNKNOWN)]
        iid: InterfaceId,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[FAIL] {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Numeric `W4allError` code of the underlying failure, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<w4all::Error>())
        .map_or(1, |e| W4allError::from(e) as u8)
}

fn run(command: Commands) -> anyhow::Result<()> {
    let module = Module::builtin();
    match command {
        Commands::Register {
            module: module_path,
            store,
            threading_model,
        } => cmd_register(&module, &module_path, store, threading_model),
        Commands::Unregister { store } => cmd_unregister(&module, store),
        Commands::List { store } => cmd_list(&module, store),
        Commands::Activate { clsid, iid } => cmd_activate(&module, clsid, iid),
    }
}

fn config_for(store: Option<PathBuf>) -> RegistrationConfig {
    let config = RegistrationConfig::from_env();
    match store {
        Some(path) => config.with_registry_path(path),
        None => config,
    }
}

fn open_store(config: &RegistrationConfig) -> anyhow::Result<registration::FileStore> {
    config
        .open_store()
        .map_err(w4all::Error::from)
        .with_context(|| format!("opening {}", config.registry_path.display()))
}

fn cmd_register(
    module: &Module,
    module_path: &Path,
    store: Option<PathBuf>,
    threading_model: Option<ThreadingModel>,
) -> anyhow::Result<()> {
    let mut config = config_for(store);
    if let Some(model) = threading_model {
        config = config.with_threading_model(model);
    }
    if !module_path.exists() {
        log::warn!("module {} does not exist yet", module_path.display());
    }

    let mut records = open_store(&config)?;
    module
        .register_server(&mut records, module_path, config.threading_model)
        .with_context(|| format!("registering into {}", config.registry_path.display()))?;

    println!(
        "[OK] Registered {} classes -> {}",
        module.classes().len(),
        config.registry_path.display()
    );
    Ok(())
}

fn cmd_unregister(module: &Module, store: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_for(store);
    let mut records = open_store(&config)?;
    module
        .unregister_server(&mut records)
        .with_context(|| format!("unregistering from {}", config.registry_path.display()))?;

    println!("[OK] Unregistered from {}", config.registry_path.display());
    Ok(())
}

fn cmd_list(module: &Module, store: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_for(store);
    let records = open_store(&config)?;
    print!("{}", format_listing(module, &records));
    Ok(())
}

fn format_listing(module: &Module, records: &dyn RecordStore) -> String {
    let registered = registration::registered_classes(records, module.classes());
    let mut out = String::new();
    for init in module.classes().iter() {
        match registered.iter().find(|r| r.clsid == init.clsid) {
            Some(record) => {
                out.push_str(&format!(
                    "{}  {}\n    module:    {}\n    threading: {}\n",
                    init.clsid,
                    record.description.as_deref().unwrap_or("-"),
                    record.module_path.as_deref().unwrap_or("-"),
                    record.threading_model.as_deref().unwrap_or("-"),
                ));
            }
            None => {
                out.push_str(&format!("{}  {} (not registered)\n", init.clsid, init.description));
            }
        }
    }
    out
}

fn cmd_activate(module: &Module, clsid: ClassId, iid: InterfaceId) -> anyhow::Result<()> {
    println!("liveness before: {}", module.liveness().count());

    let object = module
        .create_instance(clsid, iid)
        .with_context(|| format!("activating {} as {}", clsid, iid))?;
    println!("[OK] {} -> {}", clsid, iid);
    println!("liveness while held: {}", module.liveness().count());

    drop(object);
    println!(
        "liveness after release: {} (can unload: {})",
        module.liveness().count(),
        module.can_unload_now()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use w4all::{CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM};

    #[test]
    fn test_cli_parses_activate() {
        let cli = Cli::try_parse_from([
            "w4all-regsvr",
            "activate",
            "0F2C5C4D-3B12-4E8A-9A3F-5D7E1C2B4A60",
        ])
        .unwrap();
        match cli.command {
            Commands::Activate { clsid, iid } => {
                assert_eq!(clsid, CLSID_W4ALL_SOURCE);
                assert_eq!(iid, IID_UNKNOWN);
            }
            _ => panic!("expected activate"),
        }
    }

    #[test]
    fn test_register_list_unregister() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("registry.json");
        let module = Module::builtin();

        cmd_register(
            &module,
            Path::new("/usr/lib/libw4all_c.so"),
            Some(store.clone()),
            Some(ThreadingModel::Apartment),
        )
        .unwrap();

        let records = registration::FileStore::open(&store).unwrap();
        let listing = format_listing(&module, &records);
        assert!(listing.contains("/usr/lib/libw4all_c.so"));
        assert!(listing.contains("Apartment"));
        assert!(!listing.contains("not registered"));

        cmd_unregister(&module, Some(store.clone())).unwrap();
        let records = registration::FileStore::open(&store).unwrap();
        assert_eq!(format_listing(&module, &records).matches("not registered").count(), 2);
    }

    #[test]
    fn test_exit_code_from_activation_failure() {
        let module = Module::builtin();
        let err = cmd_activate(&module, ClassId::from_u128(0x42), IID_UNKNOWN).unwrap_err();
        assert_eq!(exit_code(&err), W4allError::W4allUnsupportedType as u8);

        assert!(cmd_activate(&module, CLSID_W4ALL_SOURCE, IID_MF_TRANSFORM).is_ok());
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
