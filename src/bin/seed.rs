use aula::{
    domain::{CreateCourseRequest, CreateLessonRequest, CreateUserRequest, User, UserRole, VoucherDecision},
    repository::{
        CourseRepository, EnrollmentRepository, LessonRepository, UserRepository, VoucherRepository,
        SqliteCourseRepository, SqliteEnrollmentRepository, SqliteLessonRepository,
        SqliteUserRepository, SqliteVoucherRepository,
    },
};
use clap::Parser;
use fake::{
    faker::{lorem::en::Sentence, name::en::Name},
    Fake,
};
use sqlx::sqlite::SqlitePoolOptions;

/// Populates a database with demo teachers, students, courses and vouchers.
#[derive(Parser, Debug)]
#[command(name = "seed")]
struct Args {
    #[arg(long, env = "AULA__DATABASE__URL", default_value = "sqlite://aula.db?mode=rwc")]
    database_url: String,

    #[arg(long, default_value_t = 2)]
    teachers: usize,

    #[arg(long, default_value_t = 6)]
    students: usize,

    #[arg(long, default_value_t = 2)]
    courses_per_teacher: usize,

    #[arg(long, default_value_t = 4)]
    lessons_per_course: usize,

    /// Password shared by every seeded account
    #[arg(long, default_value = "password123")]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Seeding {}", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let course_repo = SqliteCourseRepository::new(db_pool.clone());
    let lesson_repo = SqliteLessonRepository::new(db_pool.clone());
    let enrollment_repo = SqliteEnrollmentRepository::new(db_pool.clone());
    let voucher_repo = SqliteVoucherRepository::new(db_pool.clone());

    println!("👩‍🏫 Creating teachers...");
    let mut teachers = Vec::new();
    for i in 0..args.teachers {
        let teacher = create_user(&user_repo, UserRole::Teacher, i, &args.password).await?;
        println!("  ✅ {} ({})", teacher.full_name, teacher.email);
        teachers.push(teacher);
    }

    println!("🎓 Creating students...");
    let mut students = Vec::new();
    for i in 0..args.students {
        let student = create_user(&user_repo, UserRole::Student, i, &args.password).await?;
        println!("  ✅ {} ({})", student.full_name, student.email);
        students.push(student);
    }

    println!("📚 Creating courses...");
    let mut courses = Vec::new();
    for teacher in &teachers {
        for n in 0..args.courses_per_teacher {
            // Alternate free and paid so both flows have data
            let is_paid = n % 2 == 1;
            let course = course_repo.create(teacher.id, CreateCourseRequest {
                title: format!("Curso {} de {}", n + 1, teacher.full_name),
                description: Sentence(8..16).fake(),
                thumbnail: None,
                is_paid,
                price_cents: if is_paid { 5000 } else { 0 },
                is_published: true,
            }).await?;

            for order in 0..args.lessons_per_course {
                lesson_repo.create(CreateLessonRequest {
                    course_id: course.id,
                    title: format!("Lección {}", order + 1),
                    description: Sentence(6..12).fake(),
                    order: order as i64,
                    youtube_video_id: None,
                    video_duration: 600,
                    pdf_files: Vec::new(),
                    docx_files: Vec::new(),
                    xlsx_files: Vec::new(),
                    pptx_files: Vec::new(),
                    audio_file: None,
                }).await?;
            }

            println!("  ✅ {} ({})", course.title, if is_paid { "paid" } else { "free" });
            courses.push(course);
        }
    }

    println!("🧾 Enrolling students and submitting vouchers...");
    for (i, student) in students.iter().enumerate() {
        for course in courses.iter().skip(i % 2).step_by(2) {
            enrollment_repo.create(student.id, course.id, !course.is_paid).await?;

            if !course.is_paid {
                continue;
            }

            let voucher = voucher_repo
                .create(student.id, course.id, "/uploads/images/demo-voucher.jpg")
                .await?;

            // Leave some pending so the review queue is not empty
            match i % 3 {
                0 => {
                    voucher_repo
                        .decide(voucher.id, course.teacher_id, VoucherDecision::Approve, "")
                        .await?;
                }
                1 => {
                    voucher_repo
                        .decide(voucher.id, course.teacher_id, VoucherDecision::Reject, "monto no coincide")
                        .await?;
                }
                _ => {}
            }
        }
    }

    println!("\n✨ Done. Every account uses the password '{}'.", args.password);

    Ok(())
}

async fn create_user(
    repo: &SqliteUserRepository,
    role: UserRole,
    index: usize,
    password: &str,
) -> anyhow::Result<User> {
    let full_name: String = Name().fake();
    let prefix = match role {
        UserRole::Teacher => "teacher",
        UserRole::Student => "student",
    };

    let user = repo.create(CreateUserRequest {
        email: format!("{}{}@aula.local", prefix, index + 1),
        username: format!("{}{}", prefix, index + 1),
        full_name,
        password: password.to_string(),
        role,
        phone: None,
    }).await?;

    Ok(user)
}
