use clap::{Parser, Subcommand};
use tracing::{debug, info};

use vkl_core::config::{default_config_path, LoaderConfig};
use vkl_loader::{Command, CommandScope, ExtensionOrigin, Loader};

#[derive(Parser)]
#[command(name = "vkl")]
#[command(about = "VKL - inspect the loader's extension and entry-point tables")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to $VKL_CONFIG, /etc/vkl/vkl.toml, then ./vkl.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the instance extensions the loader advertises
    Extensions,

    /// Show how an entry point name resolves
    Resolve {
        /// Entry point name, e.g. vkCreateSwapChainWSI
        name: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        // An explicitly requested file must load.
        Some(ref path) => LoaderConfig::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {}", path, e))?,
        None => LoaderConfig::load_or_default(&default_config_path()),
    };

    vkl_common::init_logging_with_default(&config.loader.log_filter);
    debug!("effective config: {:?}", config);

    let loader = Loader::new(config);

    match cli.command {
        Commands::Extensions => {
            let extensions = loader.enumerate_instance_extension_properties();
            info!("{} instance extension(s) available", extensions.len());
            for ext in extensions {
                let origin = match ext.origin {
                    ExtensionOrigin::Loader => "loader",
                    ExtensionOrigin::Icd => "icd",
                };
                println!(
                    "{:<32} rev {:<4} {:<7} {}",
                    ext.name, ext.spec_version, origin, ext.description
                );
            }
        }

        Commands::Resolve { name } => {
            let Some(command) = Command::from_name(&name) else {
                println!("{}: not a loader entry point, resolves to null", name);
                return Ok(());
            };

            let scope = match command.scope() {
                CommandScope::Instance => "instance",
                CommandScope::Device => "instance, device",
            };
            println!("{}", command.name());
            println!("  resolvable from: {}", scope);
            println!("  extension:       {}", command.extension());

            let extensions = loader.enumerate_instance_extension_properties();
            match extensions.iter().find(|e| e.name == command.extension()) {
                Some(ext) if ext.is_loader_terminated() => {
                    println!("  handled by:      loader (rev {})", ext.spec_version);
                }
                Some(ext) => {
                    println!("  handled by:      driver (rev {})", ext.spec_version);
                }
                None => {
                    println!("  handled by:      nobody, extension disabled by configuration");
                }
            }
        }

        Commands::Config => {
            print!("{}", loader.config().to_toml()?);
        }
    }

    Ok(())
}
