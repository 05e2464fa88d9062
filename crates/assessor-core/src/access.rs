//! Authorization for quiz operations.
//!
//! Every engine operation resolves the quiz's course first, then asks
//! [`authorize`] once before reading attempt data or writing anything.

use std::fmt;

use uuid::Uuid;

use crate::error::AssessmentError;
use crate::model::{Course, Lesson};
use crate::traits::EnrollmentGate;

/// Who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Student(Uuid),
    Instructor(Uuid),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Student(id) => write!(f, "student {id}"),
            Actor::Instructor(id) => write!(f, "instructor {id}"),
        }
    }
}

/// What the actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// View, submit, retake, or read results.
    TakeQuiz,
    /// Create, delete, or report on quizzes.
    ManageQuiz,
}

/// The course chain a quiz or lesson resolves to.
#[derive(Debug, Clone)]
pub struct CourseScope {
    pub lesson: Lesson,
    pub course: Course,
}

/// Decide whether `actor` may exercise `capability` on `scope`.
pub async fn authorize(
    gate: &dyn EnrollmentGate,
    actor: Actor,
    scope: &CourseScope,
    capability: Capability,
) -> Result<(), AssessmentError> {
    let allowed = match (actor, capability) {
        (Actor::Student(student_id), Capability::TakeQuiz) => {
            !student_id.is_nil() && gate.is_enrolled(student_id, scope.course.id).await?
        }
        (Actor::Instructor(instructor_id), Capability::ManageQuiz) => {
            !instructor_id.is_nil() && scope.course.instructor_id == instructor_id
        }
        _ => false,
    };

    if allowed {
        tracing::debug!(%actor, course = %scope.course.id, ?capability, "access granted");
        return Ok(());
    }

    tracing::warn!(%actor, course = %scope.course.id, ?capability, "access denied");
    let reason = match capability {
        Capability::TakeQuiz => "you are not enrolled in the course this quiz belongs to",
        Capability::ManageQuiz => "you do not own the course this quiz belongs to",
    };
    Err(AssessmentError::AccessDenied(reason.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;

    struct Enrolled(Vec<(Uuid, Uuid)>);

    #[async_trait]
    impl EnrollmentGate for Enrolled {
        async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StoreError> {
            Ok(self.0.contains(&(student_id, course_id)))
        }
    }

    fn scope(instructor_id: Uuid) -> CourseScope {
        let course = Course {
            id: Uuid::new_v4(),
            name: "Rust 101".into(),
            instructor_id,
        };
        CourseScope {
            lesson: Lesson {
                id: Uuid::new_v4(),
                name: "Ownership".into(),
                course_id: course.id,
            },
            course,
        }
    }

    #[tokio::test]
    async fn enrolled_student_may_take() {
        let scope = scope(Uuid::new_v4());
        let student = Uuid::new_v4();
        let gate = Enrolled(vec![(student, scope.course.id)]);

        authorize(&gate, Actor::Student(student), &scope, Capability::TakeQuiz)
            .await
            .unwrap();

        let err = authorize(&gate, Actor::Student(Uuid::new_v4()), &scope, Capability::TakeQuiz)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn students_cannot_manage() {
        let scope = scope(Uuid::new_v4());
        let student = Uuid::new_v4();
        let gate = Enrolled(vec![(student, scope.course.id)]);

        let err = authorize(&gate, Actor::Student(student), &scope, Capability::ManageQuiz)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn only_owner_may_manage() {
        let owner = Uuid::new_v4();
        let scope = scope(owner);
        let gate = Enrolled(vec![]);

        authorize(&gate, Actor::Instructor(owner), &scope, Capability::ManageQuiz)
            .await
            .unwrap();
        assert!(
            authorize(&gate, Actor::Instructor(Uuid::new_v4()), &scope, Capability::ManageQuiz)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn nil_ids_are_denied() {
        let scope = scope(Uuid::nil());
        let gate = Enrolled(vec![(Uuid::nil(), scope.course.id)]);

        assert!(
            authorize(&gate, Actor::Student(Uuid::nil()), &scope, Capability::TakeQuiz)
                .await
                .is_err()
        );
        assert!(
            authorize(&gate, Actor::Instructor(Uuid::nil()), &scope, Capability::ManageQuiz)
                .await
                .is_err()
        );
    }
}
