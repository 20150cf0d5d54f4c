use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use nestling_core::pregnancy::{self, gestational_age, trimester};
use nestling_core::{with_retry, Baby, BabyPatch, NewBaby, RecordId, Sex};

use super::{primary_outcome, read_data, written, OutputFormat};
use crate::config::Config;
use crate::services::Services;

#[derive(Args)]
pub struct BabyCommand {
    #[command(subcommand)]
    pub command: BabySubcommand,
}

#[derive(Subcommand)]
pub enum BabySubcommand {
    /// Add a baby profile
    Add {
        /// Baby's name
        name: String,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "lmp")]
        due_date: Option<NaiveDate>,

        /// First day of the last period; the due date is derived from it
        #[arg(long)]
        lmp: Option<NaiveDate>,

        /// female, male or unknown
        #[arg(long)]
        sex: Option<Sex>,

        /// Photo URL
        #[arg(long)]
        photo_url: Option<String>,
    },

    /// List babies you own or that were shared with you
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a baby's details
    Show {
        /// Baby ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update a baby profile
    Update {
        /// Baby ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: Option<NaiveDate>,

        /// female, male or unknown
        #[arg(long)]
        sex: Option<Sex>,

        /// Photo URL
        #[arg(long)]
        photo_url: Option<String>,
    },

    /// Delete a baby profile
    Delete {
        /// Baby ID
        id: String,
    },

    /// Share a baby profile with another user
    Share {
        /// Baby ID
        id: String,

        /// User to share with
        user_id: String,
    },
}

impl BabyCommand {
    pub async fn run(
        &self,
        services: &Services,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let babies = &services.babies;

        match &self.command {
            BabySubcommand::Add {
                name,
                birth_date,
                due_date,
                lmp,
                sex,
                photo_url,
            } => {
                if name.trim().is_empty() {
                    return Err("Baby name cannot be empty".into());
                }

                let mut baby = NewBaby::new(name.trim(), &config.user_id.value);
                if let Some(date) = birth_date {
                    baby = baby.with_birth_date(*date);
                }
                if let Some(date) = due_date {
                    baby = baby.with_due_date(*date);
                }
                if let Some(date) = lmp {
                    baby = baby.with_due_date(pregnancy::due_date_from_lmp(*date));
                }
                if let Some(sex) = sex {
                    baby = baby.with_sex(*sex);
                }
                baby.photo_url = photo_url.clone();

                let created = written(babies.create_baby(&baby).await)?;
                println!("Created baby:");
                print!("{}", created);
                Ok(())
            }

            BabySubcommand::List { format } => {
                let user_id = config.user_id.value.as_str();
                let listed = with_retry(config.retry.policy(), || async move {
                    babies.list_babies(user_id).await.into_result()
                })
                .await
                .into_result()?
                .flatten()
                .unwrap_or_default();

                if listed.is_empty() {
                    println!("No babies found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&listed)?);
                    }
                    OutputFormat::Text => {
                        let today = Local::now().date_naive();
                        println!("{:<36}  {:<20}  STATUS", "ID", "NAME");
                        println!("{}", "-".repeat(80));
                        for baby in &listed {
                            println!("{:<36}  {:<20}  {}", baby.id, baby.name, status(baby, today));
                        }
                        println!("\nTotal: {} baby(ies)", listed.len());
                    }
                }
                Ok(())
            }

            BabySubcommand::Show { id, format } => {
                let baby = read_data(babies.get_baby(&RecordId::new(id.as_str())).await)?
                    .ok_or_else(|| format!("Baby not found: {}", id))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&baby)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", baby);
                        if let (None, Some(due)) = (baby.birth_date, baby.due_date) {
                            let today = Local::now().date_naive();
                            let week = pregnancy::pregnancy_week(due, today);
                            println!(
                                "Pregnancy: {} (week {}, {} trimester)",
                                gestational_age(due, today),
                                week,
                                trimester(week)
                            );
                            println!("Days until due: {}", pregnancy::days_until_due(due, today));
                            println!("Estimated conception: {}", pregnancy::conception_date(due));
                        }
                    }
                }
                Ok(())
            }

            BabySubcommand::Update {
                id,
                name,
                birth_date,
                due_date,
                sex,
                photo_url,
            } => {
                let patch = BabyPatch {
                    name: name.clone(),
                    birth_date: *birth_date,
                    due_date: *due_date,
                    sex: *sex,
                    photo_url: photo_url.clone(),
                };
                if patch.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let updated = written(babies.update_baby(&RecordId::new(id.as_str()), &patch).await)?;
                println!("Updated baby:");
                print!("{}", updated);
                Ok(())
            }

            BabySubcommand::Delete { id } => {
                primary_outcome(babies.delete_baby(&RecordId::new(id.as_str())).await)?;
                println!("Deleted baby: {}", id);
                Ok(())
            }

            BabySubcommand::Share { id, user_id } => {
                let shared = written(babies.share_baby(&RecordId::new(id.as_str()), user_id).await)?;
                println!("Shared {} with {}", shared.name, user_id);
                Ok(())
            }
        }
    }
}

fn status(baby: &Baby, today: NaiveDate) -> String {
    match (baby.birth_date, baby.pregnancy_week(today)) {
        (Some(born), _) => format!("born {}", born),
        (None, Some(week)) => format!("week {}", week),
        (None, None) => String::new(),
    }
}
