use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MentorFilter, RepoResult, Repository, RepositoryError, StudentFilter};
use crate::models::{
    AdminDashboard, BATCH_COMPLETED, Batch, Course, CreateBatchRequest, CreateHireRequest,
    Enrollment, Hire, MentorOut, MentorProfile, NewMentorProfile, NewStudentProfile, NewUser,
    Page, Role, StudentOut, StudentProfile, UpdateCourseRequest, User,
};

#[derive(Debug, Clone)]
struct ResetToken {
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Default)]
struct Store {
    users: Vec<User>,
    students: Vec<StudentProfile>,
    mentors: Vec<MentorProfile>,
    // Mentor profile id -> technology names.
    technologies: HashMap<Uuid, Vec<String>>,
    reset_tokens: Vec<ResetToken>,
    courses: Vec<Course>,
    enrollments: Vec<Enrollment>,
    batches: Vec<Batch>,
    hires: Vec<Hire>,
}

impl Store {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn insert_user(&mut self, user: NewUser) -> RepoResult<User> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "Email already registered".to_string(),
            ));
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            password_hash: user.password_hash,
            role: user.role.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.users.push(created.clone());
        Ok(created)
    }

    fn student_out(&self, profile: &StudentProfile) -> Option<StudentOut> {
        let user = self.user(profile.user_id)?;
        Some(StudentOut::new(profile.clone(), user))
    }

    fn mentor_out(&self, profile: &MentorProfile) -> Option<MentorOut> {
        let user = self.user(profile.user_id)?;
        let technologies = self
            .technologies
            .get(&profile.id)
            .cloned()
            .unwrap_or_default();
        Some(MentorOut::new(profile.clone(), user, technologies))
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

/// MemoryRepository
///
/// `Repository` kept entirely in memory. Mirrors the Postgres constraints (unique emails,
/// unique enrollments, cascading deletes) so the HTTP layer can be exercised without a
/// database.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `role` verbatim as the user's role tag, without parsing it into a `Role`.
    /// Rows written by other tools can carry tags this service does not know.
    pub async fn force_role_tag(&self, id: Uuid, role: &str) {
        let mut store = self.store.write().await;
        if let Some(user) = store.users.iter_mut().find(|u| u.id == id) {
            user.role = role.to_string();
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.store.write().await.insert_user(user)
    }

    async fn create_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> RepoResult<(User, StudentProfile)> {
        let mut store = self.store.write().await;
        let created = store.insert_user(user)?;
        let student = StudentProfile {
            id: Uuid::new_v4(),
            user_id: created.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone_number: profile.phone_number,
            whatsapp_number: profile.whatsapp_number,
            dob: profile.dob,
            gender: profile.gender.map(|g| g.as_str().to_string()),
            address: profile.address,
            photo_key: profile.photo_key,
            document_key: profile.document_key,
            course_interest: profile.course_interest,
            is_referred: profile.is_referred,
            referral_code: profile.referral_code,
            created_at: Utc::now(),
        };
        store.students.push(student.clone());
        Ok((created, student))
    }

    async fn create_mentor(
        &self,
        user: NewUser,
        profile: NewMentorProfile,
    ) -> RepoResult<(User, MentorProfile)> {
        let mut store = self.store.write().await;
        let created = store.insert_user(user)?;
        let mentor = MentorProfile {
            id: Uuid::new_v4(),
            user_id: created.id,
            name: profile.name,
            phone_number: profile.phone_number,
            dob: profile.dob,
            gender: profile.gender.map(|g| g.as_str().to_string()),
            address: profile.address,
            experience_summary: profile.experience_summary,
            total_experience_years: profile.total_experience_years,
            total_experience_months: profile.total_experience_months,
            resume_key: profile.resume_key,
            linkedin_url: profile.linkedin_url,
            portfolio_url: profile.portfolio_url,
            preferred_mode: profile.preferred_mode.map(|m| m.as_str().to_string()),
            availability_hours_per_week: profile.availability_hours_per_week,
            created_at: Utc::now(),
        };
        let mut technologies = profile.technologies;
        technologies.sort();
        store.technologies.insert(mentor.id, technologies);
        store.mentors.push(mentor.clone());
        Ok((created, mentor))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let mut store = self.store.write().await;
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.role = role.to_string();
            u.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>> {
        let mut store = self.store.write().await;
        Ok(store.users.iter_mut().find(|u| u.id == id).map(|u| {
            u.is_active = active;
            u.clone()
        }))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        match store.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        if store.users.len() == before {
            return Ok(false);
        }

        store.students.retain(|s| s.user_id != id);
        let removed_mentors: Vec<Uuid> = store
            .mentors
            .iter()
            .filter(|m| m.user_id == id)
            .map(|m| m.id)
            .collect();
        store.mentors.retain(|m| m.user_id != id);
        for mentor_id in removed_mentors {
            store.technologies.remove(&mentor_id);
        }
        store.reset_tokens.retain(|t| t.user_id != id);
        store.enrollments.retain(|e| e.student_id != id);

        let removed_courses: Vec<Uuid> = store
            .courses
            .iter()
            .filter(|c| c.mentor_id == id)
            .map(|c| c.id)
            .collect();
        store.courses.retain(|c| c.mentor_id != id);
        store
            .enrollments
            .retain(|e| !removed_courses.contains(&e.course_id));
        store.hires.retain(|h| h.user_id != id);
        for batch in store.batches.iter_mut().filter(|b| b.mentor_id == Some(id)) {
            batch.mentor_id = None;
        }
        Ok(true)
    }

    async fn student_by_user(&self, user_id: Uuid) -> RepoResult<Option<StudentOut>> {
        let store = self.store.read().await;
        Ok(store
            .students
            .iter()
            .find(|s| s.user_id == user_id)
            .and_then(|s| store.student_out(s)))
    }

    async fn mentor_by_user(&self, user_id: Uuid) -> RepoResult<Option<MentorOut>> {
        let store = self.store.read().await;
        Ok(store
            .mentors
            .iter()
            .find(|m| m.user_id == user_id)
            .and_then(|m| store.mentor_out(m)))
    }

    async fn get_student(&self, id: Uuid) -> RepoResult<Option<StudentOut>> {
        let store = self.store.read().await;
        Ok(store
            .students
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| store.student_out(s)))
    }

    async fn list_students(&self, filter: StudentFilter) -> RepoResult<Vec<StudentOut>> {
        let store = self.store.read().await;
        let needle = filter.search.map(|s| s.to_lowercase());
        let mut matches: Vec<StudentOut> = store
            .students
            .iter()
            .filter(|s| filter.user_id.is_none_or(|id| s.user_id == id))
            .filter_map(|s| store.student_out(s))
            .filter(|s| match &needle {
                None => true,
                Some(n) => {
                    contains(Some(&s.first_name), n)
                        || contains(Some(&s.last_name), n)
                        || contains(Some(&s.user.email), n)
                        || contains(s.phone_number.as_deref(), n)
                }
            })
            .collect();
        matches.reverse();
        Ok(window(matches, filter.page))
    }

    async fn get_mentor(&self, id: Uuid) -> RepoResult<Option<MentorOut>> {
        let store = self.store.read().await;
        Ok(store
            .mentors
            .iter()
            .find(|m| m.id == id)
            .and_then(|m| store.mentor_out(m)))
    }

    async fn list_mentors(&self, filter: MentorFilter) -> RepoResult<Vec<MentorOut>> {
        let store = self.store.read().await;
        let needle = filter.search.map(|s| s.to_lowercase());
        let mut matches: Vec<MentorOut> = store
            .mentors
            .iter()
            .filter_map(|m| store.mentor_out(m))
            .filter(|m| match &needle {
                None => true,
                Some(n) => {
                    contains(Some(&m.name), n)
                        || contains(Some(&m.user.email), n)
                        || contains(m.phone_number.as_deref(), n)
                }
            })
            .filter(|m| {
                filter
                    .min_years
                    .is_none_or(|min| m.total_experience_years.is_some_and(|y| y >= min))
            })
            .filter(|m| {
                filter.technology.as_ref().is_none_or(|tech| {
                    m.technologies.iter().any(|t| t.eq_ignore_ascii_case(tech))
                })
            })
            .collect();
        matches.reverse();
        Ok(window(matches, filter.page))
    }

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.store.write().await.reset_tokens.push(ResetToken {
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            used: false,
        });
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Uuid>> {
        let mut store = self.store.write().await;
        let Some(token) = store
            .reset_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash)
        else {
            return Ok(None);
        };
        if token.used || token.expires_at <= now {
            return Ok(None);
        }
        token.used = true;
        let user_id = token.user_id;

        if let Some(user) = store.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = new_password_hash.to_string();
        }
        Ok(Some(user_id))
    }

    async fn list_courses(&self, page: Page, mentor_id: Option<Uuid>) -> RepoResult<Vec<Course>> {
        let store = self.store.read().await;
        let mut courses: Vec<Course> = store
            .courses
            .iter()
            .filter(|c| mentor_id.is_none_or(|id| c.mentor_id == id))
            .cloned()
            .collect();
        courses.reverse();
        Ok(window(courses, page))
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        let store = self.store.read().await;
        Ok(store.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        mentor_id: Uuid,
    ) -> RepoResult<Course> {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.map(str::to_string),
            mentor_id,
            created_at: now,
            updated_at: now,
        };
        self.store.write().await.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> RepoResult<Option<Course>> {
        let mut store = self.store.write().await;
        Ok(store.courses.iter_mut().find(|c| c.id == id).map(|c| {
            if let Some(title) = req.title {
                c.title = title;
            }
            if let Some(description) = req.description {
                c.description = Some(description);
            }
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_course(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.courses.len();
        store.courses.retain(|c| c.id != id);
        let removed = store.courses.len() < before;
        if removed {
            store.enrollments.retain(|e| e.course_id != id);
        }
        Ok(removed)
    }

    async fn enroll(&self, course_id: Uuid, student_id: Uuid) -> RepoResult<Enrollment> {
        let mut store = self.store.write().await;
        if store
            .enrollments
            .iter()
            .any(|e| e.course_id == course_id && e.student_id == student_id)
        {
            return Err(RepositoryError::Conflict(
                "Already enrolled in this course".to_string(),
            ));
        }
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            enrolled_at: Utc::now(),
        };
        store.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(&self, id: Uuid) -> RepoResult<Option<Enrollment>> {
        let store = self.store.read().await;
        Ok(store.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn course_enrollments(&self, course_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let store = self.store.read().await;
        Ok(store
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn student_enrollments(&self, student_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let store = self.store.read().await;
        Ok(store
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn delete_enrollment(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        let before = store.enrollments.len();
        store.enrollments.retain(|e| e.id != id);
        Ok(store.enrollments.len() < before)
    }

    async fn create_batch(&self, req: CreateBatchRequest) -> RepoResult<Batch> {
        let batch = Batch {
            id: Uuid::new_v4(),
            batch_name: req.batch_name,
            no_of_students: req.no_of_students,
            start_date: req.start_date,
            completion_date: req.completion_date,
            status: req.status,
            mentor_id: req.mentor_id,
        };
        self.store.write().await.batches.push(batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, id: Uuid) -> RepoResult<Option<Batch>> {
        let store = self.store.read().await;
        Ok(store.batches.iter().find(|b| b.id == id).cloned())
    }

    async fn list_batches(&self, mentor_id: Option<Uuid>) -> RepoResult<Vec<Batch>> {
        let store = self.store.read().await;
        Ok(store
            .batches
            .iter()
            .filter(|b| mentor_id.is_none() || b.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    async fn set_batch_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Batch>> {
        let mut store = self.store.write().await;
        Ok(store.batches.iter_mut().find(|b| b.id == id).map(|b| {
            b.status = Some(status.to_string());
            b.clone()
        }))
    }

    async fn create_hire(&self, req: CreateHireRequest) -> RepoResult<Hire> {
        let mut store = self.store.write().await;
        let email = req.email.trim().to_lowercase();
        if store.hires.iter().any(|h| h.email == email) {
            return Err(RepositoryError::Conflict(
                "Hire already recorded for this email".to_string(),
            ));
        }
        let hire = Hire {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            fullname: req.fullname,
            email,
            hired_company: req.hired_company,
            hired_date: req.hired_date,
            batch_id: req.batch_id,
        };
        store.hires.push(hire.clone());
        Ok(hire)
    }

    async fn list_hires(&self) -> RepoResult<Vec<Hire>> {
        Ok(self.store.read().await.hires.clone())
    }

    async fn dashboard(&self) -> RepoResult<AdminDashboard> {
        let store = self.store.read().await;
        let count_role = |role: Role| {
            store
                .users
                .iter()
                .filter(|u| u.role == role.as_str())
                .count() as i64
        };
        let mut hired: Vec<Uuid> = store.hires.iter().map(|h| h.user_id).collect();
        hired.sort();
        hired.dedup();

        Ok(AdminDashboard {
            batches_completed_count: store
                .batches
                .iter()
                .filter(|b| b.status.as_deref() == Some(BATCH_COMPLETED))
                .count() as i64,
            students_hired: hired.len() as i64,
            no_of_students: count_role(Role::Student),
            no_of_mentors: count_role(Role::Mentor),
        })
    }
}
