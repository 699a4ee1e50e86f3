use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::{NewCompletionRecord, NewGroupRecord, NewParticipantRecord, Storage};
use tracker_core::model::{CompletionKey, Round, Unit};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    slug: String,
    name: String,
    participants: Vec<String>,
    units: u8,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUnits { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
    NoParticipants,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUnits { raw } => {
                write!(f, "invalid --units value (expected 0-30): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::NoParticipants => write!(f, "--participants requires at least one name"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TRACKER_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut slug = std::env::var("TRACKER_GROUP_SLUG").unwrap_or_else(|_| "demo".into());
        let mut name =
            std::env::var("TRACKER_GROUP_NAME").unwrap_or_else(|_| "Demo Family".into());
        let mut participants: Vec<String> = vec!["Demo User 1".into(), "Demo User 2".into()];
        let mut units: u8 = 5;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--slug" => slug = require_value(&mut args, "--slug")?,
                "--name" => name = require_value(&mut args, "--name")?,
                "--participants" => {
                    let value = require_value(&mut args, "--participants")?;
                    participants = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToOwned::to_owned)
                        .collect();
                    if participants.is_empty() {
                        return Err(ArgsError::NoParticipants);
                    }
                }
                "--units" => {
                    let value = require_value(&mut args, "--units")?;
                    units = value
                        .parse::<u8>()
                        .ok()
                        .filter(|n| *n <= 30)
                        .ok_or(ArgsError::InvalidUnits { raw: value })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    now = Some(
                        value
                            .parse::<DateTime<Utc>>()
                            .map_err(|_| ArgsError::InvalidNow { raw: value })?,
                    );
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            slug,
            name,
            participants,
            units,
            now,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;
    let now = args.now.unwrap_or_else(Utc::now);

    let storage = Storage::sqlite(&args.db_url).await?;

    let group_id = match storage.groups.get_group_by_slug(&args.slug).await? {
        Some(existing) => existing.id(),
        None => {
            storage
                .groups
                .insert_new_group(NewGroupRecord {
                    slug: args.slug.clone(),
                    name: args.name.clone(),
                    created_at: now,
                })
                .await?
        }
    };

    let mut first_participant = None;
    for (index, participant_name) in args.participants.iter().enumerate() {
        let id = storage
            .participants
            .insert_new_participant(NewParticipantRecord {
                group_id,
                name: participant_name.clone(),
                order_index: u32::try_from(index)?,
                streak: 0,
                created_at: now,
            })
            .await?;
        first_participant.get_or_insert(id);
    }

    if let Some(participant_id) = first_participant {
        for n in 1..=args.units {
            storage
                .completions
                .insert_completion(NewCompletionRecord {
                    participant_id,
                    key: CompletionKey::new(Unit::new(n)?, Round::FIRST),
                    completed_at: now,
                })
                .await?;
        }
    }

    println!(
        "Seeded group '{}' with {} participants ({} units marked) into {}",
        args.slug,
        args.participants.len(),
        args.units,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
