use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction, query_builder::QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AdminDashboard, BATCH_COMPLETED, Batch, Course, CreateBatchRequest, CreateHireRequest,
    Enrollment, Hire, MentorOut, MentorProfile, NewMentorProfile, NewStudentProfile, NewUser,
    Page, Role, StudentOut, StudentProfile, UpdateCourseRequest, User,
};

pub mod memory;
pub use memory::MemoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// StudentFilter
///
/// Directory filter for students. `user_id` narrows the listing to one account (own scope).
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct MentorFilter {
    pub search: Option<String>,
    pub technology: Option<String>,
    pub min_years: Option<i32>,
    pub page: Page,
}

/// Repository Trait
///
/// Persistence contract used by handlers and the identity resolver. Implemented by
/// `PostgresRepository` and by the in-memory `MemoryRepository` used in tests.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    // Conflict on duplicate email.
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // User and profile in one transaction.
    async fn create_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> RepoResult<(User, StudentProfile)>;
    // User, profile and technology links in one transaction.
    async fn create_mentor(
        &self,
        user: NewUser,
        profile: NewMentorProfile,
    ) -> RepoResult<(User, MentorProfile)>;
    async fn set_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;
    async fn set_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool>;
    // Profiles, enrollments and reset tokens go with the user.
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Profiles ---
    async fn student_by_user(&self, user_id: Uuid) -> RepoResult<Option<StudentOut>>;
    async fn mentor_by_user(&self, user_id: Uuid) -> RepoResult<Option<MentorOut>>;
    async fn get_student(&self, id: Uuid) -> RepoResult<Option<StudentOut>>;
    async fn list_students(&self, filter: StudentFilter) -> RepoResult<Vec<StudentOut>>;
    async fn get_mentor(&self, id: Uuid) -> RepoResult<Option<MentorOut>>;
    async fn list_mentors(&self, filter: MentorFilter) -> RepoResult<Vec<MentorOut>>;

    // --- Password Reset ---
    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()>;
    /// Marks the token used and stores the new hash. `None` when the token is unknown,
    /// already used or expired at `now`.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Uuid>>;

    // --- Courses ---
    // `mentor_id` narrows to one mentor's courses.
    async fn list_courses(&self, page: Page, mentor_id: Option<Uuid>) -> RepoResult<Vec<Course>>;
    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>>;
    async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        mentor_id: Uuid,
    ) -> RepoResult<Course>;
    // COALESCE semantics: absent fields keep their value.
    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> RepoResult<Option<Course>>;
    async fn delete_course(&self, id: Uuid) -> RepoResult<bool>;

    // --- Enrollments ---
    // Conflict when the pair already exists.
    async fn enroll(&self, course_id: Uuid, student_id: Uuid) -> RepoResult<Enrollment>;
    async fn get_enrollment(&self, id: Uuid) -> RepoResult<Option<Enrollment>>;
    async fn course_enrollments(&self, course_id: Uuid) -> RepoResult<Vec<Enrollment>>;
    async fn student_enrollments(&self, student_id: Uuid) -> RepoResult<Vec<Enrollment>>;
    async fn delete_enrollment(&self, id: Uuid) -> RepoResult<bool>;

    // --- Batches & Hires ---
    async fn create_batch(&self, req: CreateBatchRequest) -> RepoResult<Batch>;
    async fn get_batch(&self, id: Uuid) -> RepoResult<Option<Batch>>;
    async fn list_batches(&self, mentor_id: Option<Uuid>) -> RepoResult<Vec<Batch>>;
    async fn set_batch_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Batch>>;
    // Conflict on duplicate email.
    async fn create_hire(&self, req: CreateHireRequest) -> RepoResult<Hire>;
    async fn list_hires(&self) -> RepoResult<Vec<Hire>>;

    async fn dashboard(&self) -> RepoResult<AdminDashboard>;
}

/// RepositoryState
///
/// The shared persistence handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// `%term%` for `ILIKE ... ESCAPE '\'`, with wildcards in the term matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Maps a unique violation to `Conflict`, everything else to `Database`.
fn unique_conflict(err: sqlx::Error, message: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(message.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

const USER_COLUMNS: &str =
    "id, email, full_name, phone_number, password_hash, role, is_active, created_at";

const STUDENT_COLUMNS: &str = "sp.id, sp.user_id, sp.first_name, sp.last_name, sp.phone_number, \
     sp.whatsapp_number, sp.dob, sp.gender, sp.address, sp.photo_key, sp.document_key, \
     sp.course_interest, sp.is_referred, sp.referral_code, sp.created_at";

const MENTOR_COLUMNS: &str = "mp.id, mp.user_id, mp.name, mp.phone_number, mp.dob, mp.gender, \
     mp.address, mp.experience_summary, mp.total_experience_years, mp.total_experience_months, \
     mp.resume_key, mp.linkedin_url, mp.portfolio_url, mp.preferred_mode, \
     mp.availability_hours_per_week, mp.created_at";

const COURSE_COLUMNS: &str = "id, title, description, mentor_id, created_at, updated_at";

const BATCH_COLUMNS: &str =
    "id, batch_name, no_of_students, start_date, completion_date, status, mentor_id";

const HIRE_COLUMNS: &str = "id, user_id, fullname, email, hired_company, hired_date, batch_id";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are built at runtime; the schema lives in
/// `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> RepoResult<HashMap<Uuid, User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn technologies_by_mentor(&self, ids: &[Uuid]) -> RepoResult<HashMap<Uuid, Vec<String>>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"SELECT mt.mentor_id, t.name
               FROM mentor_technologies mt
               JOIN technologies t ON t.id = mt.technology_id
               WHERE mt.mentor_id = ANY($1)
               ORDER BY t.name"#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (mentor_id, name) in rows {
            map.entry(mentor_id).or_default().push(name);
        }
        Ok(map)
    }

    /// Joins profile rows with their users. Profiles whose user vanished are dropped.
    async fn students_out(&self, profiles: Vec<StudentProfile>) -> RepoResult<Vec<StudentOut>> {
        let ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
        let users = self.users_by_ids(&ids).await?;
        Ok(profiles
            .into_iter()
            .filter_map(|p| {
                let user = users.get(&p.user_id)?;
                Some(StudentOut::new(p, user))
            })
            .collect())
    }

    async fn mentors_out(&self, profiles: Vec<MentorProfile>) -> RepoResult<Vec<MentorOut>> {
        let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
        let mentor_ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let users = self.users_by_ids(&user_ids).await?;
        let mut technologies = self.technologies_by_mentor(&mentor_ids).await?;
        Ok(profiles
            .into_iter()
            .filter_map(|p| {
                let user = users.get(&p.user_id)?;
                let techs = technologies.remove(&p.id).unwrap_or_default();
                Some(MentorOut::new(p, user, techs))
            })
            .collect())
    }

    async fn insert_user(tx: &mut Transaction<'_, Postgres>, user: &NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (id, email, full_name, phone_number, password_hash, role, is_active, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, true, NOW())
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| unique_conflict(e, "Email already registered"))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;
        let created = Self::insert_user(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn create_student(
        &self,
        user: NewUser,
        profile: NewStudentProfile,
    ) -> RepoResult<(User, StudentProfile)> {
        let mut tx = self.pool.begin().await?;
        let created = Self::insert_user(&mut tx, &user).await?;

        let student = sqlx::query_as::<_, StudentProfile>(
            r#"INSERT INTO student_profiles AS sp (
                   id, user_id, first_name, last_name, phone_number, whatsapp_number, dob,
                   gender, address, photo_key, document_key, course_interest, is_referred,
                   referral_code, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
               RETURNING sp.id, sp.user_id, sp.first_name, sp.last_name, sp.phone_number,
                   sp.whatsapp_number, sp.dob, sp.gender, sp.address, sp.photo_key,
                   sp.document_key, sp.course_interest, sp.is_referred, sp.referral_code,
                   sp.created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone_number)
        .bind(&profile.whatsapp_number)
        .bind(profile.dob)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(&profile.address)
        .bind(&profile.photo_key)
        .bind(&profile.document_key)
        .bind(&profile.course_interest)
        .bind(profile.is_referred)
        .bind(&profile.referral_code)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((created, student))
    }

    async fn create_mentor(
        &self,
        user: NewUser,
        profile: NewMentorProfile,
    ) -> RepoResult<(User, MentorProfile)> {
        let mut tx = self.pool.begin().await?;
        let created = Self::insert_user(&mut tx, &user).await?;

        let mentor = sqlx::query_as::<_, MentorProfile>(
            r#"INSERT INTO mentor_profiles AS mp (
                   id, user_id, name, phone_number, dob, gender, address, experience_summary,
                   total_experience_years, total_experience_months, resume_key, linkedin_url,
                   portfolio_url, preferred_mode, availability_hours_per_week, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
               RETURNING mp.id, mp.user_id, mp.name, mp.phone_number, mp.dob, mp.gender,
                   mp.address, mp.experience_summary, mp.total_experience_years,
                   mp.total_experience_months, mp.resume_key, mp.linkedin_url,
                   mp.portfolio_url, mp.preferred_mode, mp.availability_hours_per_week,
                   mp.created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(&profile.name)
        .bind(&profile.phone_number)
        .bind(profile.dob)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(&profile.address)
        .bind(&profile.experience_summary)
        .bind(profile.total_experience_years)
        .bind(profile.total_experience_months)
        .bind(&profile.resume_key)
        .bind(&profile.linkedin_url)
        .bind(&profile.portfolio_url)
        .bind(profile.preferred_mode.map(|m| m.as_str()))
        .bind(profile.availability_hours_per_week)
        .fetch_one(&mut *tx)
        .await?;

        for name in &profile.technologies {
            sqlx::query(
                "INSERT INTO technologies (id, name) VALUES ($1, $2) ON CONFLICT ((lower(name))) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&mut *tx)
            .await?;

            let technology_id: Uuid =
                sqlx::query_scalar("SELECT id FROM technologies WHERE lower(name) = lower($1)")
                    .bind(name)
                    .fetch_one(&mut *tx)
                    .await?;

            sqlx::query(
                "INSERT INTO mentor_technologies (mentor_id, technology_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(mentor.id)
            .bind(technology_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((created, mentor))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn student_by_user(&self, user_id: Uuid) -> RepoResult<Option<StudentOut>> {
        let profiles = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles sp WHERE sp.user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.students_out(profiles).await?.pop())
    }

    async fn mentor_by_user(&self, user_id: Uuid) -> RepoResult<Option<MentorOut>> {
        let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
            "SELECT {MENTOR_COLUMNS} FROM mentor_profiles mp WHERE mp.user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.mentors_out(profiles).await?.pop())
    }

    async fn get_student(&self, id: Uuid) -> RepoResult<Option<StudentOut>> {
        let profiles = sqlx::query_as::<_, StudentProfile>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles sp WHERE sp.id = $1"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.students_out(profiles).await?.pop())
    }

    /// list_students
    ///
    /// Search covers first/last name, email and phone, case-insensitively. Newest first.
    async fn list_students(&self, filter: StudentFilter) -> RepoResult<Vec<StudentOut>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles sp JOIN users u ON u.id = sp.user_id WHERE 1 = 1"
        ));

        if let Some(user_id) = filter.user_id {
            builder.push(" AND sp.user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(search) = filter.search {
            let pattern = contains_pattern(&search);
            builder.push(" AND (sp.first_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR sp.last_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR u.email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR sp.phone_number ILIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }

        builder.push(" ORDER BY sp.created_at DESC OFFSET ");
        builder.push_bind(filter.page.skip);
        builder.push(" LIMIT ");
        builder.push_bind(filter.page.limit);

        let profiles = builder
            .build_query_as::<StudentProfile>()
            .fetch_all(&self.pool)
            .await?;
        self.students_out(profiles).await
    }

    async fn get_mentor(&self, id: Uuid) -> RepoResult<Option<MentorOut>> {
        let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
            "SELECT {MENTOR_COLUMNS} FROM mentor_profiles mp WHERE mp.id = $1"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(self.mentors_out(profiles).await?.pop())
    }

    async fn list_mentors(&self, filter: MentorFilter) -> RepoResult<Vec<MentorOut>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {MENTOR_COLUMNS} FROM mentor_profiles mp JOIN users u ON u.id = mp.user_id WHERE 1 = 1"
        ));

        if let Some(search) = filter.search {
            let pattern = contains_pattern(&search);
            builder.push(" AND (mp.name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR u.email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR mp.phone_number ILIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }
        if let Some(min_years) = filter.min_years {
            builder.push(" AND mp.total_experience_years >= ");
            builder.push_bind(min_years);
        }
        if let Some(technology) = filter.technology {
            builder.push(
                " AND EXISTS (SELECT 1 FROM mentor_technologies mt \
                 JOIN technologies t ON t.id = mt.technology_id \
                 WHERE mt.mentor_id = mp.id AND lower(t.name) = lower(",
            );
            builder.push_bind(technology);
            builder.push("))");
        }

        builder.push(" ORDER BY mp.created_at DESC OFFSET ");
        builder.push_bind(filter.page.skip);
        builder.push(" LIMIT ");
        builder.push_bind(filter.page.limit);

        let profiles = builder
            .build_query_as::<MentorProfile>()
            .fetch_all(&self.pool)
            .await?;
        self.mentors_out(profiles).await
    }

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, used, created_at)
               VALUES ($1, $2, $3, $4, false, NOW())"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// consume_reset_token
    ///
    /// Row-locks the token so two concurrent resets cannot both succeed.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Uuid>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (Uuid, Uuid, bool, DateTime<Utc>)>(
            r#"SELECT id, user_id, used, expires_at FROM password_reset_tokens
               WHERE token_hash = $1 FOR UPDATE"#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((token_id, user_id, used, expires_at)) = row else {
            return Ok(None);
        };
        if used || expires_at <= now {
            return Ok(None);
        }

        sqlx::query("UPDATE password_reset_tokens SET used = true WHERE id = $1")
            .bind(token_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(new_password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(user_id))
    }

    async fn list_courses(&self, page: Page, mentor_id: Option<Uuid>) -> RepoResult<Vec<Course>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses"));
        if let Some(mentor_id) = mentor_id {
            builder.push(" WHERE mentor_id = ");
            builder.push_bind(mentor_id);
        }
        builder.push(" ORDER BY created_at DESC OFFSET ");
        builder.push_bind(page.skip);
        builder.push(" LIMIT ");
        builder.push_bind(page.limit);

        let courses = builder
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn get_course(&self, id: Uuid) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        mentor_id: Uuid,
    ) -> RepoResult<Course> {
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"INSERT INTO courses (id, title, description, mentor_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, NOW(), NOW())
               RETURNING {COURSE_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(mentor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> RepoResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"UPDATE courses
               SET title = COALESCE($1, title),
                   description = COALESCE($2, description),
                   updated_at = NOW()
               WHERE id = $3
               RETURNING {COURSE_COLUMNS}"#
        ))
        .bind(req.title)
        .bind(req.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn enroll(&self, course_id: Uuid, student_id: Uuid) -> RepoResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>(
            r#"INSERT INTO enrollments (id, course_id, student_id, enrolled_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, course_id, student_id, enrolled_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_conflict(e, "Already enrolled in this course"))
    }

    async fn get_enrollment(&self, id: Uuid) -> RepoResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, course_id, student_id, enrolled_at FROM enrollments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn course_enrollments(&self, course_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"SELECT id, course_id, student_id, enrolled_at FROM enrollments
               WHERE course_id = $1 ORDER BY enrolled_at"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(enrollments)
    }

    async fn student_enrollments(&self, student_id: Uuid) -> RepoResult<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"SELECT id, course_id, student_id, enrolled_at FROM enrollments
               WHERE student_id = $1 ORDER BY enrolled_at"#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(enrollments)
    }

    async fn delete_enrollment(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_batch(&self, req: CreateBatchRequest) -> RepoResult<Batch> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            r#"INSERT INTO batches (id, batch_name, no_of_students, start_date, completion_date, status, mentor_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {BATCH_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(&req.batch_name)
        .bind(req.no_of_students)
        .bind(req.start_date)
        .bind(req.completion_date)
        .bind(&req.status)
        .bind(req.mentor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn get_batch(&self, id: Uuid) -> RepoResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn list_batches(&self, mentor_id: Option<Uuid>) -> RepoResult<Vec<Batch>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {BATCH_COLUMNS} FROM batches"));
        if let Some(mentor_id) = mentor_id {
            builder.push(" WHERE mentor_id = ");
            builder.push_bind(mentor_id);
        }
        builder.push(" ORDER BY start_date DESC");

        let batches = builder
            .build_query_as::<Batch>()
            .fetch_all(&self.pool)
            .await?;
        Ok(batches)
    }

    async fn set_batch_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "UPDATE batches SET status = $1 WHERE id = $2 RETURNING {BATCH_COLUMNS}"
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn create_hire(&self, req: CreateHireRequest) -> RepoResult<Hire> {
        sqlx::query_as::<_, Hire>(&format!(
            r#"INSERT INTO hires (id, user_id, fullname, email, hired_company, hired_date, batch_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {HIRE_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(req.user_id)
        .bind(&req.fullname)
        .bind(req.email.trim().to_lowercase())
        .bind(&req.hired_company)
        .bind(req.hired_date)
        .bind(req.batch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_conflict(e, "Hire already recorded for this email"))
    }

    async fn list_hires(&self) -> RepoResult<Vec<Hire>> {
        let hires = sqlx::query_as::<_, Hire>(&format!(
            "SELECT {HIRE_COLUMNS} FROM hires ORDER BY hired_date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(hires)
    }

    /// dashboard
    ///
    /// Computed on every call; nothing is cached.
    async fn dashboard(&self) -> RepoResult<AdminDashboard> {
        let (batches_completed_count, students_hired, no_of_students, no_of_mentors) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"SELECT
                     (SELECT COUNT(*) FROM batches WHERE status = $1),
                     (SELECT COUNT(DISTINCT user_id) FROM hires),
                     (SELECT COUNT(*) FROM users WHERE role = 'student'),
                     (SELECT COUNT(*) FROM users WHERE role = 'mentor')"#,
            )
            .bind(BATCH_COMPLETED)
            .fetch_one(&self.pool)
            .await?;

        Ok(AdminDashboard {
            batches_completed_count,
            students_hired,
            no_of_students,
            no_of_mentors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(contains_pattern("ada"), "%ada%");
        assert_eq!(contains_pattern("_"), r"%\_%");
        assert_eq!(contains_pattern("100%"), r"%100\%%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
