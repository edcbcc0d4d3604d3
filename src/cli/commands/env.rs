use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::args::EnvCommands;
use crate::cli::services::Services;
use crate::command::Command;
use crate::environment::RunOptions;
use crate::error::LabflowError;
use crate::subprocess::{ConsoleLogger, OutputLogger};

pub async fn run_env_command(command: EnvCommands, services: &Services) -> Result<()> {
    let environments = &services.environments;
    match command {
        EnvCommands::List { json } => {
            let names = environments.environments().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        EnvCommands::Create { name } => {
            environments.create(&name).await?;
            println!("Environment '{name}' is ready");
        }
        EnvCommands::Remove { name } => {
            environments.environment(&name).await?.remove().await?;
            println!("Removed environment '{name}'");
        }
        EnvCommands::Packages { name, json } => {
            let packages = environments.environment(&name).await?.packages().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            } else {
                for package in packages {
                    match package.channel {
                        Some(channel) => println!("{} {} ({})", package.name, package.version, channel),
                        None => println!("{} {}", package.name, package.version),
                    }
                }
            }
        }
        EnvCommands::Install {
            name,
            packages,
            channels,
        } => {
            let environment = environments.environment(&name).await?;
            let packages: Vec<&str> = packages.iter().map(String::as_str).collect();
            let channels: Vec<&str> = channels.iter().map(String::as_str).collect();
            environment
                .install(&packages, &channels)
                .await?
                .wait()
                .await
                .map_err(LabflowError::from)?;
            println!("Installed {} into '{}'", packages.join(" "), name);
        }
        EnvCommands::Run {
            name,
            cwd,
            live,
            timeout,
            command,
        } => {
            let environment = environments.environment(&name).await?;
            let logger: Arc<dyn OutputLogger> = Arc::new(ConsoleLogger);
            let mut options = RunOptions::new()
                .output(logger)
                .live(live)
                .timeout(
                    timeout
                        .map(Duration::from_secs)
                        .or_else(|| services.config.run_timeout()),
                );
            if let Some(cwd) = cwd {
                options = options.cwd(cwd);
            }
            environment.run(&Command::new(command), options).await?;
        }
    }
    Ok(())
}
