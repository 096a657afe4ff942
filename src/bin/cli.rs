use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use lectern::cli::seeder::{self, SeedConfig};
use lectern::cli::{create_admin, set_role};
use lectern::modules::students::service::EnrollmentService;
use lectern_config::DatabaseConfig;
use lectern_db::{DocumentStore, PgStore, init_db_pool, run_migrations};
use lectern_models::UserRole;

#[derive(Parser)]
#[command(name = "lectern-cli")]
#[command(about = "Lectern CLI - Administrative tools for Lectern", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Change the role of an existing user
    SetRole {
        /// Email address of the user
        #[arg(short = 'e', long)]
        email: String,

        /// New role: student, teacher or admin
        #[arg(short = 'r', long)]
        role: UserRole,
    },
    /// Repair enrolled and created course lists for every user
    Reconcile,
    /// Seed the database with fake teachers, courses, lessons and students
    Seed {
        /// Number of teachers to create
        #[arg(short = 't', long, default_value = "3")]
        teachers: usize,

        /// Number of courses per teacher
        #[arg(long, default_value = "2")]
        courses: usize,

        /// Number of lessons per course
        #[arg(long, default_value = "4")]
        lessons: usize,

        /// Number of students to create
        #[arg(short = 's', long, default_value = "20")]
        students: usize,

        /// Number of courses each student enrolls in
        #[arg(long, default_value = "2")]
        enrollments: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let store = match connect().await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&store, name, email, password).await,
        Commands::SetRole { email, role } => handle_set_role(&store, &email, role).await,
        Commands::Reconcile => handle_reconcile(&store).await,
        Commands::Seed {
            teachers,
            courses,
            lessons,
            students,
            enrollments,
        } => {
            let config = SeedConfig {
                teachers,
                courses_per_teacher: courses,
                lessons_per_course: lessons,
                students,
                enrollments_per_student: enrollments,
            };
            handle_seed(&store, config).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("\n❌ {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn connect() -> anyhow::Result<PgStore> {
    let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
    run_migrations(&pool).await?;
    Ok(PgStore::new(pool))
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, String> {
    match value {
        Some(value) => Ok(value),
        None => Input::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| format!("Failed to read {}: {}", prompt.to_lowercase(), e)),
    }
}

async fn handle_create_admin(
    store: &dyn DocumentStore,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), String> {
    let name = prompt_or(name, "Name")?;
    let email = prompt_or(email, "Email address")?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .map_err(|e| format!("Failed to read password: {}", e))?,
    };

    let admin = create_admin(store, &name, &email, &password)
        .await
        .map_err(|e| format!("Error creating admin: {:#}", e.error))?;

    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", admin.email);
    println!("   Name: {}", admin.name);
    Ok(())
}

async fn handle_set_role(
    store: &dyn DocumentStore,
    email: &str,
    role: UserRole,
) -> Result<(), String> {
    let user = set_role(store, email, role)
        .await
        .map_err(|e| format!("Error changing role: {:#}", e.error))?;

    println!("✅ {} is now {}", user.email, user.role.as_str());
    Ok(())
}

async fn handle_reconcile(store: &dyn DocumentStore) -> Result<(), String> {
    println!("🔧 Reconciling course lists...");
    let report = EnrollmentService::reconcile_all(store)
        .await
        .map_err(|e| format!("Error reconciling: {:#}", e.error))?;

    println!("   Users checked:          {}", report.users_checked);
    println!("   Enrolled ids added:     {}", report.enrolled_added);
    println!("   Enrolled ids removed:   {}", report.enrolled_removed);
    println!("   Created ids added:      {}", report.created_added);
    println!("   Created ids removed:    {}", report.created_removed);
    println!("   Failures:               {}", report.failures);

    if report.failures > 0 {
        return Err(format!(
            "{} users could not be repaired, run reconcile again",
            report.failures
        ));
    }
    if report.is_clean() {
        println!("\n✅ Everything was already consistent");
    } else {
        println!("\n✅ Repairs applied");
    }
    Ok(())
}

async fn handle_seed(store: &dyn DocumentStore, config: SeedConfig) -> Result<(), String> {
    println!("🌱 Seeding database...");
    let summary = seeder::seed(store, config)
        .await
        .map_err(|e| format!("Error seeding database: {:#}", e.error))?;

    println!("   Teachers:     {}", summary.teachers);
    println!("   Students:     {}", summary.students);
    println!("   Courses:      {}", summary.courses);
    println!("   Lessons:      {}", summary.lessons);
    println!("   Enrollments:  {}", summary.enrollments);
    println!(
        "\n✅ Seeding complete. Every account uses the password '{}'",
        seeder::SEED_PASSWORD
    );
    Ok(())
}
