use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenvy::dotenv;
use log::debug;
use serde::Serialize;

use setlog::db::models::UpdateExercise;
use setlog::logging::{init_logger, parse_level};
use setlog::session::{PerformedExerciseInput, SessionInput, SessionPatch, SetInput, SetPatch};
use setlog::{
    Database, DatabaseConfig, ExerciseInput, ExerciseStore, ProgressInput, ProgressRecordStore,
    SessionStore, UserStore, WorkoutPlanStore,
};

#[derive(Parser, Debug)]
#[command(version, about = "Setlog - Workout Log CLI", long_about = None)]
struct Args {
    /// SQLite database path
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "SETLOG_LOG_LEVEL", default_value = "warn", value_parser = parse_log_level)]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Delete every row from every table
    Reset,
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Exercise(ExerciseCommand),
    #[command(subcommand)]
    Plan(PlanCommand),
    #[command(subcommand)]
    Progress(ProgressCommand),
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Add {
        username: String,
        #[arg(long)]
        email: Option<String>,
        /// Subject issued by the identity provider
        #[arg(long)]
        auth_subject: Option<String>,
    },
    List,
    Delete {
        id: i32,
    },
}

#[derive(Subcommand, Debug)]
enum ExerciseCommand {
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        muscle_group: Option<String>,
        #[arg(long)]
        equipment: Option<String>,
    },
    List,
    Rename {
        id: i32,
        name: String,
    },
    Delete {
        id: i32,
    },
}

#[derive(Subcommand, Debug)]
enum PlanCommand {
    Add {
        user_id: i32,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List {
        user_id: i32,
    },
    Delete {
        id: i32,
    },
}

#[derive(Subcommand, Debug)]
enum ProgressCommand {
    Add {
        user_id: i32,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDateTime>,
        #[arg(long)]
        body_weight: Option<f64>,
        #[arg(long)]
        body_fat: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        user_id: i32,
    },
    Delete {
        id: i32,
    },
}

#[derive(ClapArgs, Debug)]
struct SetTarget {
    session_id: i32,
    performed_exercise_id: i32,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a session, e.g. `--exercise 3:5x100,5x105 --exercise 7`
    Start {
        user_id: i32,
        #[arg(long)]
        plan: Option<i32>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDateTime>,
        #[arg(long)]
        notes: Option<String>,
        /// Exercise written as ID[:SET,SET...], in performed order
        #[arg(long = "exercise", value_parser = parse_exercise)]
        exercises: Vec<PerformedExerciseInput>,
    },
    Show {
        id: i32,
    },
    List {
        #[arg(long)]
        user: Option<i32>,
    },
    Complete {
        id: i32,
    },
    Notes {
        id: i32,
        text: String,
    },
    Delete {
        id: i32,
    },
    /// Append an exercise, e.g. `--set 5x100 --set 5x105@120`
    AddExercise {
        session_id: i32,
        exercise_id: i32,
        #[arg(long = "set", value_parser = parse_set)]
        sets: Vec<SetInput>,
    },
    RemoveExercise {
        session_id: i32,
        performed_exercise_id: i32,
    },
    /// Append a set written as REPSxWEIGHT[@REST]
    AddSet {
        #[command(flatten)]
        target: SetTarget,
        #[arg(value_parser = parse_set)]
        set: SetInput,
    },
    UpdateSet {
        #[command(flatten)]
        target: SetTarget,
        set_id: i32,
        #[arg(long)]
        reps: Option<i32>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        rest: Option<i32>,
    },
    RemoveSet {
        #[command(flatten)]
        target: SetTarget,
        set_id: i32,
    },
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    parse_level(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

/// Parses `REPSxWEIGHT` with an optional `@REST` suffix in seconds.
fn parse_set(s: &str) -> Result<SetInput, String> {
    let (body, rest) = match s.split_once('@') {
        Some((body, rest)) => (body, Some(rest)),
        None => (s, None),
    };
    let (reps, weight) = body
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected REPSxWEIGHT, got '{}'", s))?;

    let reps = reps
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid reps '{}': {}", reps, e))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid weight '{}': {}", weight, e))?;
    let mut set = SetInput::new(reps, weight);
    if let Some(rest) = rest {
        let seconds = rest
            .trim()
            .trim_end_matches('s')
            .parse::<i32>()
            .map_err(|e| format!("invalid rest '{}': {}", rest, e))?;
        set = set.with_rest(seconds);
    }
    Ok(set)
}

/// Parses `ID` or `ID:SET,SET,...` where each set is `REPSxWEIGHT[@REST]`.
fn parse_exercise(s: &str) -> Result<PerformedExerciseInput, String> {
    let (id, sets) = match s.split_once(':') {
        Some((id, sets)) => (id, Some(sets)),
        None => (s, None),
    };
    let exercise_id = id
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid exercise id '{}': {}", id, e))?;
    let sets = match sets {
        Some(sets) => sets
            .split(',')
            .map(|set| parse_set(set.trim()))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok(PerformedExerciseInput { exercise_id, sets })
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, got '{}'", s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_user(db: Database, command: UserCommand) -> Result<()> {
    let users = UserStore::new(db);
    match command {
        UserCommand::Add {
            username,
            email,
            auth_subject,
        } => print_json(&users.create_user(&username, email, auth_subject).await?),
        UserCommand::List => print_json(&users.list_users().await?),
        UserCommand::Delete { id } => {
            users.delete_user(id).await?;
            println!("Deleted user {}", id);
            Ok(())
        }
    }
}

async fn run_exercise(db: Database, command: ExerciseCommand) -> Result<()> {
    let exercises = ExerciseStore::new(db);
    match command {
        ExerciseCommand::Add {
            name,
            description,
            muscle_group,
            equipment,
        } => {
            let input = ExerciseInput {
                name,
                description,
                muscle_group,
                equipment,
            };
            print_json(&exercises.create_exercise(input).await?)
        }
        ExerciseCommand::List => {
            for exercise in exercises.list_exercises().await? {
                println!("{}", exercise);
            }
            Ok(())
        }
        ExerciseCommand::Rename { id, name } => {
            let update = UpdateExercise {
                name: Some(name),
                ..Default::default()
            };
            print_json(&exercises.update_exercise(id, update).await?)
        }
        ExerciseCommand::Delete { id } => {
            exercises.delete_exercise(id).await?;
            println!("Deleted exercise {}", id);
            Ok(())
        }
    }
}

async fn run_plan(db: Database, command: PlanCommand) -> Result<()> {
    let plans = WorkoutPlanStore::new(db);
    match command {
        PlanCommand::Add {
            user_id,
            name,
            description,
        } => print_json(&plans.create_plan(user_id, &name, description).await?),
        PlanCommand::List { user_id } => print_json(&plans.list_plans_for_user(user_id).await?),
        PlanCommand::Delete { id } => {
            plans.delete_plan(id).await?;
            println!("Deleted workout plan {}", id);
            Ok(())
        }
    }
}

async fn run_progress(db: Database, command: ProgressCommand) -> Result<()> {
    let records = ProgressRecordStore::new(db);
    match command {
        ProgressCommand::Add {
            user_id,
            date,
            body_weight,
            body_fat,
            notes,
        } => {
            let input = ProgressInput {
                user_id,
                date,
                body_weight,
                body_fat,
                notes,
            };
            print_json(&records.create_record(input).await?)
        }
        ProgressCommand::List { user_id } => {
            print_json(&records.list_records_for_user(user_id).await?)
        }
        ProgressCommand::Delete { id } => {
            records.delete_record(id).await?;
            println!("Deleted progress record {}", id);
            Ok(())
        }
    }
}

async fn run_session(db: Database, command: SessionCommand) -> Result<()> {
    let sessions = SessionStore::new(db);
    let session = match command {
        SessionCommand::Start {
            user_id,
            plan,
            date,
            notes,
            exercises,
        } => {
            let input = SessionInput {
                workout_plan_id: plan,
                date,
                notes,
                performed_exercises: exercises,
                ..SessionInput::new(user_id)
            };
            sessions.create_session(input).await?
        }
        SessionCommand::Show { id } => sessions.get_session(id).await?,
        SessionCommand::List { user } => {
            let all = match user {
                Some(user_id) => sessions.list_sessions_for_user(user_id).await?,
                None => sessions.list_sessions().await?,
            };
            return print_json(&all);
        }
        SessionCommand::Complete { id } => {
            sessions
                .update_session_fields(id, SessionPatch::complete())
                .await?
        }
        SessionCommand::Notes { id, text } => {
            let patch = SessionPatch {
                notes: Some(Some(text)),
                ..Default::default()
            };
            sessions.update_session_fields(id, patch).await?
        }
        SessionCommand::Delete { id } => {
            sessions.delete_session(id).await?;
            println!("Deleted workout session {}", id);
            return Ok(());
        }
        SessionCommand::AddExercise {
            session_id,
            exercise_id,
            sets,
        } => sessions.add_exercise(session_id, exercise_id, sets).await?,
        SessionCommand::RemoveExercise {
            session_id,
            performed_exercise_id,
        } => {
            sessions
                .remove_exercise(session_id, performed_exercise_id)
                .await?
        }
        SessionCommand::AddSet { target, set } => {
            sessions
                .add_set(target.session_id, target.performed_exercise_id, set)
                .await?
        }
        SessionCommand::UpdateSet {
            target,
            set_id,
            reps,
            weight,
            rest,
        } => {
            let patch = SetPatch {
                reps,
                weight,
                rest_time: rest.map(Some),
            };
            sessions
                .update_set(target.session_id, target.performed_exercise_id, set_id, patch)
                .await?
        }
        SessionCommand::RemoveSet { target, set_id } => {
            sessions
                .remove_set(target.session_id, target.performed_exercise_id, set_id)
                .await?
        }
    };
    print_json(&session)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    init_logger(args.log_level);

    let database_url = args.database_url.clone();
    let config = DatabaseConfig::from_lookup(|name| match name {
        "DATABASE_URL" => Some(database_url.clone()),
        other => std::env::var(other).ok(),
    })?;
    debug!("Using database {}", config.database_url);

    let db = Database::connect(&config)
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    db.run_migrations().await?;

    match args.command {
        Commands::Migrate => {
            println!("Database is up to date");
            Ok(())
        }
        Commands::Reset => {
            db.clear_all_tables().await?;
            println!("All tables cleared");
            Ok(())
        }
        Commands::User(command) => run_user(db, command).await,
        Commands::Exercise(command) => run_exercise(db, command).await,
        Commands::Plan(command) => run_plan(db, command).await,
        Commands::Progress(command) => run_progress(db, command).await,
        Commands::Session(command) => run_session(db, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sets() {
        assert_eq!(parse_set("5x100").unwrap(), SetInput::new(5, 100.0));
        assert_eq!(
            parse_set("8X62.5@90s").unwrap(),
            SetInput::new(8, 62.5).with_rest(90)
        );
        assert!(parse_set("5").is_err());
        assert!(parse_set("fivex100").is_err());
        assert!(parse_set("5x100@soon").is_err());
    }

    #[test]
    fn parses_dates() {
        let day = parse_date("2025-06-01").unwrap();
        assert_eq!(day.to_string(), "2025-06-01 00:00:00");
        let precise = parse_date("2025-06-01T18:30:00").unwrap();
        assert_eq!(precise.to_string(), "2025-06-01 18:30:00");
        assert!(parse_date("June 1st").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_add_exercise_with_repeated_sets() {
        let args = Args::try_parse_from([
            "setlog",
            "--database-url",
            "gym.db",
            "session",
            "add-exercise",
            "3",
            "7",
            "--set",
            "5x100",
            "--set",
            "5x105@120",
        ])
        .unwrap();
        match args.command {
            Commands::Session(SessionCommand::AddExercise {
                session_id,
                exercise_id,
                sets,
            }) => {
                assert_eq!((session_id, exercise_id), (3, 7));
                assert_eq!(sets.len(), 2);
                assert_eq!(sets[1].rest_time, Some(120));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_exercises_with_inline_sets() {
        let bench = parse_exercise("4:5x100, 5x105@120").unwrap();
        assert_eq!(bench.exercise_id, 4);
        assert_eq!(
            bench.sets,
            vec![SetInput::new(5, 100.0), SetInput::new(5, 105.0).with_rest(120)]
        );
        assert!(parse_exercise("9").unwrap().sets.is_empty());
        assert!(parse_exercise("squat:5x100").is_err());
        assert!(parse_exercise("4:5x100,").is_err());
    }

    #[test]
    fn parses_start_with_repeated_exercises() {
        let args = Args::try_parse_from([
            "setlog",
            "--database-url",
            "gym.db",
            "session",
            "start",
            "1",
            "--exercise",
            "3:5x100,5x105",
            "--exercise",
            "7",
        ])
        .unwrap();
        match args.command {
            Commands::Session(SessionCommand::Start { exercises, .. }) => {
                let ids: Vec<i32> = exercises.iter().map(|e| e.exercise_id).collect();
                assert_eq!(ids, vec![3, 7]);
                assert_eq!(exercises[0].sets.len(), 2);
                assert!(exercises[1].sets.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
