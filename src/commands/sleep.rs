use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use nestling_core::{with_retry, NewSleepEntry, RecordId, SleepEntry, SleepPatch};

use super::{parse_time, primary_outcome, read_data, written, OutputFormat};
use crate::config::Config;
use crate::services::Services;

#[derive(Args)]
pub struct SleepCommand {
    #[command(subcommand)]
    pub command: SleepSubcommand,
}

#[derive(Subcommand)]
pub enum SleepSubcommand {
    /// Start a sleep for a baby
    Start {
        /// Baby ID
        baby_id: String,

        /// Start time (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_time)]
        at: Option<DateTime<Utc>>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Stop the baby's running sleep
    Stop {
        /// Baby ID
        baby_id: String,

        /// End time (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_time)]
        at: Option<DateTime<Utc>>,
    },

    /// Log a sleep that already ended
    Log {
        /// Baby ID
        baby_id: String,

        /// Start time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,

        /// End time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        end: DateTime<Utc>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List a baby's sleep entries, most recent first
    List {
        /// Baby ID
        baby_id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show whether the baby is sleeping
    Status {
        /// Baby ID
        baby_id: String,
    },

    /// Edit a sleep entry
    Update {
        /// Sleep entry ID
        id: String,

        /// New start time (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,

        /// New end time (RFC 3339); the duration is recomputed from the stored start
        #[arg(long, value_parser = parse_time)]
        end: Option<DateTime<Utc>>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a sleep entry
    Delete {
        /// Sleep entry ID
        id: String,
    },
}

impl SleepCommand {
    pub async fn run(
        &self,
        services: &Services,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let sleep = &services.sleep;

        match &self.command {
            SleepSubcommand::Start { baby_id, at, notes } => {
                let baby_id = RecordId::new(baby_id.as_str());
                if let Some(running) = read_data(sleep.get_active_entry(&baby_id).await)? {
                    return Err(format!(
                        "Baby is already sleeping (entry {} started {})",
                        running.id,
                        running.start_time.format("%Y-%m-%d %H:%M")
                    )
                    .into());
                }

                let mut entry =
                    NewSleepEntry::new(baby_id, &config.user_id.value, at.unwrap_or_else(Utc::now));
                if let Some(notes) = notes {
                    entry = entry.with_notes(notes);
                }

                let started = written(sleep.start_sleep(&entry).await)?;
                println!("Started sleep: {}", started);
                Ok(())
            }

            SleepSubcommand::Stop { baby_id, at } => {
                let running = read_data(
                    sleep
                        .get_active_entry(&RecordId::new(baby_id.as_str()))
                        .await,
                )?
                .ok_or("Baby is not sleeping")?;

                let stopped =
                    written(sleep.stop_sleep(&running.id, at.unwrap_or_else(Utc::now)).await)?;
                println!("Stopped sleep: {}", stopped);
                Ok(())
            }

            SleepSubcommand::Log {
                baby_id,
                start,
                end,
                notes,
            } => {
                if end < start {
                    return Err("End time must be after start time".into());
                }

                let mut entry =
                    NewSleepEntry::new(RecordId::new(baby_id.as_str()), &config.user_id.value, *start)
                        .with_end_time(*end);
                if let Some(notes) = notes {
                    entry = entry.with_notes(notes);
                }

                let logged = written(sleep.start_sleep(&entry).await)?;
                println!("Logged sleep: {}", logged);
                Ok(())
            }

            SleepSubcommand::List { baby_id, format } => {
                let baby_id = RecordId::new(baby_id.as_str());
                let baby_id = &baby_id;
                let entries = with_retry(config.retry.policy(), || async move {
                    sleep.get_entries(baby_id).await.into_result()
                })
                .await
                .into_result()?
                .flatten()
                .unwrap_or_default();

                if entries.is_empty() {
                    println!("No sleep entries found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        for entry in &entries {
                            println!("{}", entry);
                        }
                        println!("\nTotal: {} entry(ies), {}", entries.len(), total(&entries));
                    }
                }
                Ok(())
            }

            SleepSubcommand::Status { baby_id } => {
                let active = read_data(
                    sleep
                        .get_active_entry(&RecordId::new(baby_id.as_str()))
                        .await,
                )?;

                match active {
                    Some(entry) => {
                        let minutes = entry.elapsed(Utc::now()).num_minutes();
                        println!(
                            "Sleeping since {} ({}h{:02}m)",
                            entry.start_time.format("%Y-%m-%d %H:%M"),
                            minutes / 60,
                            minutes % 60
                        );
                    }
                    None => println!("Awake"),
                }
                Ok(())
            }

            SleepSubcommand::Update {
                id,
                start,
                end,
                notes,
            } => {
                if start.is_none() && end.is_none() && notes.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let patch = SleepPatch {
                    start_time: *start,
                    end_time: *end,
                    notes: notes.clone(),
                    ..Default::default()
                };

                let updated = written(
                    sleep
                        .update_entry(&RecordId::new(id.as_str()), &patch)
                        .await,
                )?;
                println!("Updated sleep: {}", updated);
                Ok(())
            }

            SleepSubcommand::Delete { id } => {
                primary_outcome(sleep.delete_entry(&RecordId::new(id.as_str())).await)?;
                println!("Deleted sleep entry: {}", id);
                Ok(())
            }
        }
    }
}

/// Total recorded sleep across closed entries, as `XhYYm`.
fn total(entries: &[SleepEntry]) -> String {
    let minutes: i64 = entries.iter().filter_map(|e| e.duration_minutes).sum();
    format!("{}h{:02}m asleep", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_total_skips_running_entries() {
        let start = Utc::now() - Duration::hours(3);
        let entry = |minutes: Option<i64>| SleepEntry {
            id: RecordId::new("s"),
            baby_id: RecordId::new("b"),
            user_id: "mum".to_string(),
            start_time: start,
            end_time: minutes.map(|m| start + Duration::minutes(m)),
            duration_minutes: minutes,
            notes: None,
            created_at: start,
        };

        let entries = vec![entry(Some(90)), entry(Some(45)), entry(None)];
        assert_eq!(total(&entries), "2h15m asleep");
    }
}
