use clap::{Args, Subcommand};
use nestling_core::{with_retry, NewDoctorQuestion};
use uuid::Uuid;

use super::{primary_outcome, written, OutputFormat};
use crate::config::Config;
use crate::services::Services;

#[derive(Args)]
pub struct QuestionCommand {
    #[command(subcommand)]
    pub command: QuestionSubcommand,
}

#[derive(Subcommand)]
pub enum QuestionSubcommand {
    /// Save a question for the next appointment
    Ask {
        /// The question
        question: String,

        /// Category, e.g. feeding or sleep
        #[arg(long)]
        category: Option<String>,
    },

    /// List your questions
    List {
        /// Only show questions without an answer
        #[arg(long)]
        unanswered: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record the doctor's answer
    Answer {
        /// Question reference (UUID)
        client_ref: Uuid,

        /// The answer
        answer: String,
    },

    /// Delete a question
    Delete {
        /// Question reference (UUID)
        client_ref: Uuid,
    },
}

impl QuestionCommand {
    pub async fn run(
        &self,
        services: &Services,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let questions = &services.questions;

        match &self.command {
            QuestionSubcommand::Ask { question, category } => {
                if question.trim().is_empty() {
                    return Err("Question cannot be empty".into());
                }

                let mut new = NewDoctorQuestion::new(&config.user_id.value, question.trim());
                if let Some(category) = category {
                    new = new.with_category(category);
                }

                let asked = written(questions.ask_question(&new).await)?;
                println!("Saved question:");
                println!("{}", asked);
                Ok(())
            }

            QuestionSubcommand::List { unanswered, format } => {
                let user_id = config.user_id.value.as_str();
                let listed = with_retry(config.retry.policy(), || async move {
                    questions.list_questions(user_id).await.into_result()
                })
                .await
                .into_result()?
                .flatten()
                .unwrap_or_default();

                let listed: Vec<_> = if *unanswered {
                    listed.into_iter().filter(|q| !q.is_answered()).collect()
                } else {
                    listed
                };

                if listed.is_empty() {
                    println!("No questions found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&listed)?);
                    }
                    OutputFormat::Text => {
                        for question in &listed {
                            println!("{}", question);
                        }
                        println!("\nTotal: {} question(s)", listed.len());
                    }
                }
                Ok(())
            }

            QuestionSubcommand::Answer { client_ref, answer } => {
                let answered = written(questions.answer_question(*client_ref, answer).await)?;
                println!("Answered:");
                println!("{}", answered);
                Ok(())
            }

            QuestionSubcommand::Delete { client_ref } => {
                primary_outcome(questions.delete_question(*client_ref).await)?;
                println!("Deleted question: {}", client_ref);
                Ok(())
            }
        }
    }
}
