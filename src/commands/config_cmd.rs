use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::{Config, ConfigValue};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_value("database_path", &config.database_path, |p| {
                            p.display().to_string()
                        });
                        print_value("documents_dir", &config.documents_dir, |p| {
                            p.display().to_string()
                        });
                        print_value("user_id", &config.user_id, |u| u.clone());
                        print_value("active_backend", &config.active_backend, |b| b.to_string());
                        print_value("max_active_sleep_minutes", &config.max_active_sleep_minutes, |m| {
                            m.to_string()
                        });

                        println!(
                            "retry: {} attempt(s), {}ms initial delay",
                            config.retry.max_retries, config.retry.initial_delay_ms
                        );
                        println!();

                        println!("write_policy:");
                        println!("  babies: {}", config.write_policy.babies);
                        println!("  sleep: {}", config.write_policy.sleep);
                        println!("  questions: {}", config.write_policy.questions);
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_value<T>(key: &str, value: &ConfigValue<T>, show: impl Fn(&T) -> String) {
    println!("{}: {}", key, show(&value.value));
    println!("  source: {}", value.source);
    println!();
}
