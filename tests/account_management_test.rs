mod common;

use std::sync::Arc;

use aula::{
    auth::AuthService,
    domain::{ConfirmPasswordResetRequest, PasswordResetRequest, UpdateProfileRequest, UserRole},
    error::AppError,
    repository::UserRepository,
};
use common::{context_with, create_course, create_user, test_context, test_pool, RecordingMailer};

#[tokio::test]
async fn test_teacher_lists_users_by_role() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let teacher = create_user(&ctx, UserRole::Teacher, "teacher").await?;
    let ana = create_user(&ctx, UserRole::Student, "ana").await?;
    create_user(&ctx, UserRole::Student, "beto").await?;
    let course = create_course(&ctx, &teacher, "Libre", None).await?;
    ctx.enrollment_service.enroll(&ana, course.id).await?;

    let everyone = ctx.user_service.list(&teacher, None).await?;
    assert_eq!(everyone.len(), 3);

    let students = ctx.user_service.list(&teacher, Some(UserRole::Student)).await?;
    assert_eq!(students.len(), 2);
    assert!(students.iter().all(|s| s.user.role == UserRole::Student));

    let teachers = ctx.user_service.list(&teacher, Some(UserRole::Teacher)).await?;
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].user.id, teacher.id);

    let detail = ctx.user_service.get(&teacher, ana.id).await?;
    assert_eq!(detail.enrolled_courses_count, 1);

    let result = ctx.user_service.list(&ana, None).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    Ok(())
}

#[tokio::test]
async fn test_teacher_edits_and_deletes_students() -> anyhow::Result<()> {
    let ctx = test_context().await?;
    let teacher = create_user(&ctx, UserRole::Teacher, "teacher").await?;
    let student = create_user(&ctx, UserRole::Student, "ana").await?;

    let updated = ctx.user_service.update(&teacher, student.id, UpdateProfileRequest {
        full_name: Some("Ana María".to_string()),
        phone: Some("912345678".to_string()),
        ..Default::default()
    }).await?;
    assert_eq!(updated.user.full_name, "Ana María");
    assert_eq!(updated.user.phone.as_deref(), Some("912345678"));
    assert_eq!(updated.user.role, UserRole::Student);

    let result = ctx.user_service.delete(&student, teacher.id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let result = ctx.user_service.delete(&teacher, teacher.id).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(ctx.user_repo.find_by_id(teacher.id).await?.is_some());

    ctx.user_service.delete(&teacher, student.id).await?;
    assert!(ctx.user_repo.find_by_id(student.id).await?.is_none());

    let result = ctx.user_service.get(&teacher, student.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    Ok(())
}

fn code_from(body: &str) -> String {
    body.split_whitespace()
        .map(|word| word.trim_end_matches('.'))
        .find(|word| word.len() == 6 && word.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_password_reset_with_emailed_code() -> anyhow::Result<()> {
    let mailer = Arc::new(RecordingMailer::default());
    let ctx = context_with(test_pool().await?, mailer.clone()).await?;
    let student = create_user(&ctx, UserRole::Student, "ana").await?;
    let (_, token) = ctx.auth_service.create_session(student.id).await?;

    let result = ctx.password_reset_service
        .request(PasswordResetRequest { email: "nobody@example.com".to_string() })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(mailer.count(), 0);

    ctx.password_reset_service
        .request(PasswordResetRequest { email: "ANA@example.com".to_string() })
        .await?;

    let email = mailer.last().expect("reset email sent");
    assert_eq!(email.to, "ana@example.com");
    let code = code_from(&email.body);
    assert_eq!(code.len(), 6);

    let wrong = if code == "000000" { "111111" } else { "000000" };
    let result = ctx.password_reset_service
        .confirm(ConfirmPasswordResetRequest {
            email: "ana@example.com".to_string(),
            code: wrong.to_string(),
            new_password: "nueva-clave-1".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    ctx.password_reset_service
        .confirm(ConfirmPasswordResetRequest {
            email: "ana@example.com".to_string(),
            code: code.clone(),
            new_password: "nueva-clave-1".to_string(),
        })
        .await?;

    let hash = ctx.user_repo.password_hash("ana@example.com").await?.expect("hash");
    assert!(AuthService::verify_password("nueva-clave-1", &hash).await?);
    assert!(!AuthService::verify_password("password123", &hash).await?);

    // Old sessions end with the reset
    assert!(ctx.auth_service.validate_session(&token).await?.is_none());

    let result = ctx.password_reset_service
        .confirm(ConfirmPasswordResetRequest {
            email: "ana@example.com".to_string(),
            code,
            new_password: "otra-clave-2".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn test_password_reset_code_expires_and_is_replaced() -> anyhow::Result<()> {
    let mailer = Arc::new(RecordingMailer::default());
    let ctx = context_with(test_pool().await?, mailer.clone()).await?;
    create_user(&ctx, UserRole::Student, "ana").await?;

    let request = PasswordResetRequest { email: "ana@example.com".to_string() };

    ctx.password_reset_service.request(request.clone()).await?;
    let first = code_from(&mailer.last().expect("first email").body);

    ctx.password_reset_service.request(request.clone()).await?;
    let second = code_from(&mailer.last().expect("second email").body);

    if first != second {
        let result = ctx.password_reset_service
            .confirm(ConfirmPasswordResetRequest {
                email: "ana@example.com".to_string(),
                code: first,
                new_password: "nueva-clave-1".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    let stale = (chrono::Utc::now() - chrono::Duration::minutes(11)).naive_utc();
    sqlx::query("UPDATE password_resets SET created_at = ?")
        .bind(stale)
        .execute(&ctx.db_pool)
        .await?;

    let result = ctx.password_reset_service
        .confirm(ConfirmPasswordResetRequest {
            email: "ana@example.com".to_string(),
            code: second,
            new_password: "nueva-clave-1".to_string(),
        })
        .await;
    match result {
        Err(AppError::BadRequest(msg)) => assert!(msg.contains("expired")),
        other => panic!("expected expiry, got {:?}", other),
    }

    Ok(())
}
