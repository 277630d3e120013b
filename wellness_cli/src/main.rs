use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;
use wellness_core::*;

#[derive(Parser)]
#[command(name = "wellness")]
#[command(about = "Student health log and advisory assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, show or list profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Record (or redo) a daily check-in
    Log(LogArgs),

    /// Show the recent-days digest for a profile
    Digest {
        profile: Uuid,
    },

    /// Ask an advisor for guidance
    Advise {
        profile: Uuid,

        /// Request kind (see `wellness kinds`)
        kind: String,

        /// Mood description or what-if scenario
        #[arg(long)]
        note: Option<String>,

        /// Print the instruction that would be sent, without sending it
        #[arg(long)]
        dry_run: bool,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available request kinds
    Kinds,

    /// Drop superseded check-in lines from a profile's journal
    Compact {
        profile: Uuid,
    },

    /// Export a profile's check-ins to CSV
    Export {
        profile: Uuid,

        /// Output path (defaults to <data-dir>/exports/<profile>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Create a profile and print its id
    Create(ProfileArgs),

    /// Show a profile with its derived metrics
    Show { profile: Uuid },

    /// List all profiles
    List,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    age: u32,

    /// Height in centimetres
    #[arg(long)]
    height: f64,

    /// Weight in kilograms
    #[arg(long)]
    weight: f64,

    /// Weekly food budget: <200, 200-400, 400-600, >600 (or 1-4)
    #[arg(long)]
    budget: String,

    #[arg(long)]
    academic_year: Option<String>,

    /// Whether a mess facility is available
    #[arg(long)]
    mess: Option<bool>,

    /// Whether mess timings are often missed
    #[arg(long)]
    misses_mess_timing: Option<bool>,

    #[arg(long)]
    college: Option<String>,

    #[arg(long)]
    hostel: Option<String>,

    /// Fitness goal (e.g. "Muscle Gain", "Weight Loss", "Endurance")
    #[arg(long)]
    goal: Option<String>,

    #[arg(long)]
    activity: Option<String>,

    #[arg(long)]
    diet: Option<String>,
}

#[derive(Args)]
struct LogArgs {
    profile: Uuid,

    /// YYYY-MM-DD or DD/MM/YYYY (defaults to today)
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    sleep_hours: f32,

    /// 1 (poor) to 5 (excellent)
    #[arg(long)]
    sleep_quality: u8,

    #[arg(long)]
    bed_time: Option<String>,

    /// What was eaten, or "skipped"
    #[arg(long, default_value = "")]
    breakfast: String,

    #[arg(long, default_value = "")]
    lunch: String,

    #[arg(long, default_value = "")]
    dinner: String,

    /// Junk food eaten (implies junk food was eaten)
    #[arg(long)]
    junk: Option<String>,

    #[arg(long)]
    fruits: bool,

    #[arg(long)]
    water: u32,

    /// 1 (low) to 5 (high)
    #[arg(long)]
    energy: u8,

    /// 1 (poor) to 5 (good)
    #[arg(long)]
    focus: u8,

    /// Symptom code or free text; repeatable
    #[arg(long = "symptom")]
    symptoms: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        wellness_core::logging::init_with_level("debug");
    } else {
        wellness_core::logging::init();
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Kinds => cmd_kinds(),
        Commands::Profile(ProfileCommand::Create(args)) => cmd_profile_create(&data_dir, args),
        Commands::Profile(ProfileCommand::Show { profile }) => cmd_profile_show(&data_dir, profile),
        Commands::Profile(ProfileCommand::List) => cmd_profile_list(&data_dir),
        Commands::Log(args) => cmd_log(&data_dir, args),
        Commands::Digest { profile } => cmd_digest(&data_dir, &config, profile),
        Commands::Advise {
            profile,
            kind,
            note,
            dry_run,
            json,
        } => cmd_advise(&data_dir, &config, profile, &kind, note.as_deref(), dry_run, json),
        Commands::Compact { profile } => cmd_compact(&data_dir, profile),
        Commands::Export { profile, out } => cmd_export(&data_dir, profile, out),
    }
}

fn cmd_kinds() -> Result<ExitCode> {
    for descriptor in default_registry().iter() {
        let history = match descriptor.history {
            HistoryRequirement::Required => "needs 2+ days of logs",
            HistoryRequirement::Optional => "uses logs if present",
            HistoryRequirement::None => "profile only",
        };
        println!(
            "{:<16} {:<38} {}",
            descriptor.kind.name(), descriptor.title, history
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_profile_create(data_dir: &Path, args: ProfileArgs) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let draft = ProfileDraft {
        name: args.name,
        age: args.age,
        height_cm: args.height,
        weight_kg: args.weight,
        weekly_budget: args.budget.parse()?,
        academic_year: args.academic_year,
        has_mess: args.mess,
        misses_mess_timing: args.misses_mess_timing,
        college: args.college,
        hostel_type: args.hostel,
        goal: args.goal,
        activity_level: args.activity,
        diet_type: args.diet,
    };

    let id = store.create_profile(draft)?;
    println!("✓ Created profile {}", id);
    Ok(ExitCode::SUCCESS)
}

fn cmd_profile_show(data_dir: &Path, id: Uuid) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let profile = store.get_profile(id)?;
    let bmi = profile.bmi()?;
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    let yes_no = |v: Option<bool>| match v {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };

    println!("Profile {}", profile.id);
    println!("  Name:            {}", profile.display_name());
    println!("  Age:             {}", profile.age);
    println!("  Height:          {} cm", profile.height_cm);
    println!("  Weight:          {} kg", profile.weight_kg);
    println!("  BMI:             {:.2} ({})", bmi.value, bmi.category);
    println!("  Protein target:  {} g/day", profile.protein_target());
    println!("  Weekly budget:   {}", profile.weekly_budget);
    println!("  Academic year:   {}", or_dash(&profile.academic_year));
    println!("  College:         {}", or_dash(&profile.college));
    println!("  Hostel:          {}", or_dash(&profile.hostel_type));
    println!("  Mess facility:   {}", yes_no(profile.has_mess));
    println!("  Misses timings:  {}", yes_no(profile.misses_mess_timing));
    println!("  Goal:            {}", or_dash(&profile.goal));
    println!("  Activity level:  {}", or_dash(&profile.activity_level));
    println!("  Diet type:       {}", or_dash(&profile.diet_type));
    Ok(ExitCode::SUCCESS)
}

fn cmd_profile_list(data_dir: &Path) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let profiles = store.list_profiles()?;
    if profiles.is_empty() {
        println!("No profiles yet. Create one with `wellness profile create`.");
        return Ok(ExitCode::SUCCESS);
    }
    for profile in profiles {
        println!(
            "{}  {}  (created {})",
            profile.id,
            profile.display_name(),
            profile.created_at.format("%Y-%m-%d")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_log(data_dir: &Path, args: LogArgs) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive().to_string());

    let checkin = CheckIn {
        date,
        sleep_hours: args.sleep_hours,
        sleep_quality: args.sleep_quality,
        bed_time: args.bed_time,
        breakfast: MealSlot::from_input(&args.breakfast),
        lunch: MealSlot::from_input(&args.lunch),
        dinner: MealSlot::from_input(&args.dinner),
        ate_junk: args.junk.is_some(),
        junk_details: args.junk,
        ate_fruits: args.fruits,
        water_glasses: args.water,
        energy: args.energy,
        focus: args.focus,
        symptoms: args.symptoms,
    };
    let entry = checkin.validate()?;
    let date = entry.date;

    match store.append_or_replace_log(args.profile, entry)? {
        Upsert::Inserted => println!("✓ Logged check-in for {}", date),
        Upsert::Replaced => println!("✓ Replaced check-in for {}", date),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_digest(data_dir: &Path, config: &Config, id: Uuid) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let entries = store.list_recent_logs(id, config.analysis.digest_days)?;
    if entries.is_empty() {
        println!("No check-ins logged yet.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{}", summarize(&entries));
    Ok(ExitCode::SUCCESS)
}

fn cmd_advise(
    data_dir: &Path,
    config: &Config,
    id: Uuid,
    kind: &str,
    note: Option<&str>,
    dry_run: bool,
    json: bool,
) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;

    if dry_run {
        let service = AdvisoryService::new(store, Dispatcher::new(Bindings::new()), &config.analysis);
        println!("{}", service.preview(id, kind, note)?);
        println!("\n[Dry run - nothing sent]");
        return Ok(ExitCode::SUCCESS);
    }

    let bindings = Bindings::from_config(&config.generation)?;
    let service = AdvisoryService::new(store, Dispatcher::new(bindings), &config.analysis);
    let response = service.advise(id, kind, note);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        match &response {
            AdvisoryResponse::Success { result_text } => println!("{}", result_text),
            AdvisoryResponse::Failure { error } => eprintln!("{}", error.message),
        }
    }

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_compact(data_dir: &Path, id: Uuid) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let dropped = store.compact(id)?;
    println!("✓ Compacted journal ({} superseded lines dropped)", dropped);
    Ok(ExitCode::SUCCESS)
}

fn cmd_export(data_dir: &Path, id: Uuid, out: Option<PathBuf>) -> Result<ExitCode> {
    let store = FileStore::open(data_dir)?;
    let entries = store.load_logs(id)?;
    let out = out.unwrap_or_else(|| data_dir.join("exports").join(format!("{}.csv", id)));

    let rows = export_csv(&entries, &out)?;
    println!("✓ Exported {} check-ins", rows);
    println!("  CSV: {}", out.display());
    Ok(ExitCode::SUCCESS)
}
