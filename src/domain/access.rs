use crate::domain::{Course, Enrollment, User, UserRole};

/// Decides whether `user` may view lesson content of `course`.
///
/// Only the owning teacher bypasses enrollment. Other teachers are treated like
/// any viewer without an enrollment. Free courses need an enrollment row; paid
/// courses need an approved one.
pub fn can_access(user: &User, course: &Course, enrollment: Option<&Enrollment>) -> bool {
    if user.role == UserRole::Teacher && course.is_owned_by(user.id) {
        return true;
    }

    let Some(enrollment) = enrollment else {
        return false;
    };

    if enrollment.student_id != user.id || enrollment.course_id != course.id {
        return false;
    }

    if !course.is_paid {
        return true;
    }

    enrollment.is_approved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format_price;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: format!("{}@aula.test", Uuid::new_v4()),
            username: "user".to_string(),
            full_name: "Some User".to_string(),
            role,
            phone: None,
            avatar: None,
            yape_qr: None,
            plin_qr: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(teacher: &User, is_paid: bool) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            teacher_id: teacher.id,
            title: "Contabilidad".to_string(),
            description: String::new(),
            thumbnail: None,
            is_paid,
            price_cents: if is_paid { 5000 } else { 0 },
            price: format_price(if is_paid { 5000 } else { 0 }),
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn enrollment(student: &User, course: &Course, is_approved: bool) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student_id: student.id,
            course_id: course.id,
            is_approved,
            enrolled_at: Utc::now(),
            approved_at: None,
        }
    }

    #[test]
    fn test_owner_always_has_access() {
        let teacher = user(UserRole::Teacher);
        let paid = course(&teacher, true);
        assert!(can_access(&teacher, &paid, None));
    }

    #[test]
    fn test_other_teacher_has_no_access() {
        let owner = user(UserRole::Teacher);
        let other = user(UserRole::Teacher);
        let paid = course(&owner, true);
        let free = course(&owner, false);
        assert!(!can_access(&other, &paid, None));
        assert!(!can_access(&other, &free, None));
    }

    #[test]
    fn test_free_course_needs_enrollment() {
        let teacher = user(UserRole::Teacher);
        let student = user(UserRole::Student);
        let free = course(&teacher, false);
        assert!(!can_access(&student, &free, None));

        let e = enrollment(&student, &free, true);
        assert!(can_access(&student, &free, Some(&e)));
    }

    #[test]
    fn test_paid_course_needs_approval() {
        let teacher = user(UserRole::Teacher);
        let student = user(UserRole::Student);
        let paid = course(&teacher, true);

        let unapproved = enrollment(&student, &paid, false);
        assert!(!can_access(&student, &paid, Some(&unapproved)));

        let approved = enrollment(&student, &paid, true);
        assert!(can_access(&student, &paid, Some(&approved)));
    }

    #[test]
    fn test_foreign_enrollment_is_ignored() {
        let teacher = user(UserRole::Teacher);
        let student = user(UserRole::Student);
        let someone_else = user(UserRole::Student);
        let paid = course(&teacher, true);

        let theirs = enrollment(&someone_else, &paid, true);
        assert!(!can_access(&student, &paid, Some(&theirs)));
    }
}
