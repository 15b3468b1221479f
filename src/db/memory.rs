//! In-memory store for tests. One mutex guards everything, which gives each
//! call the same all-or-nothing behaviour the Postgres transactions do.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::error::AppError;
use crate::exam_papers::{
    repo::ExamPaperRepo,
    repo_types::{ExamPaper, NewExamPaper},
};
use crate::questions::{
    repo::QuestionRepo,
    repo_types::{Question, QuestionFields},
};
use crate::reactions::{
    repo::ReactionRepo,
    repo_types::{ItemType, Polarity, ReactionCounts, ReactionState},
};
use crate::sheets::{
    repo::SheetRepo,
    repo_types::{NewSheet, Sheet},
};

#[derive(Default)]
struct Inner {
    seq: u64,
    users: HashMap<Uuid, User>,
    sheets: HashMap<Uuid, (u64, Sheet)>,
    questions: HashMap<Uuid, (u64, Question)>,
    reactions: HashMap<(Uuid, Uuid, ItemType), Polarity>,
    papers: HashMap<Uuid, (u64, ExamPaper)>,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn seed_user(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{}.{}@vitapstudent.ac.in", name.to_lowercase(), &id.simple().to_string()[..6]),
            name: name.to_string(),
            institution_name: "VIT-AP".to_string(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.lock().users.insert(id, user);
        id
    }

    pub fn seed_exam_paper(&self, uploader: Uuid, subject: &str, exam_type: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.lock();
        let seq = inner.next_seq();
        inner.papers.insert(
            id,
            (
                seq,
                ExamPaper {
                    id,
                    uploader_id: uploader,
                    subject: subject.to_string(),
                    exam_type: exam_type.to_string(),
                    slot: "A1".to_string(),
                    object_key: format!("exam-papers/{uploader}/{id}.png"),
                    created_at: OffsetDateTime::now_utc(),
                },
            ),
        );
        id
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn create_user(&self, new: NewUser<'_>) -> Result<User, AppError> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(AppError::EmailTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            name: new.name.to_string(),
            institution_name: new.institution_name.to_string(),
            password_hash: new.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SheetRepo for MemoryStore {
    async fn insert_sheet(&self, new: NewSheet<'_>, limit: i64) -> Result<Sheet, AppError> {
        let mut inner = self.lock();
        if !inner.users.contains_key(&new.owner_id) {
            return Err(AppError::Unauthorized);
        }
        let owned = inner
            .sheets
            .values()
            .filter(|(_, s)| s.owner_id == new.owner_id)
            .count() as i64;
        if owned >= limit {
            return Err(AppError::QuotaExceeded { limit });
        }
        if inner.sheets.values().any(|(_, s)| s.access_code == new.access_code) {
            return Err(AppError::CodeCollision);
        }
        let now = OffsetDateTime::now_utc();
        let sheet = Sheet {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            title: new.title.to_string(),
            description: new.description.map(str::to_string),
            access_code: new.access_code.to_string(),
            created_at: now,
            updated_at: now,
        };
        let seq = inner.next_seq();
        inner.sheets.insert(sheet.id, (seq, sheet.clone()));
        Ok(sheet)
    }

    async fn find_sheet(&self, id: Uuid) -> Result<Option<Sheet>, AppError> {
        Ok(self.lock().sheets.get(&id).map(|(_, s)| s.clone()))
    }

    async fn find_sheet_by_code(&self, code: &str) -> Result<Option<Sheet>, AppError> {
        Ok(self
            .lock()
            .sheets
            .values()
            .find(|(_, s)| s.access_code == code)
            .map(|(_, s)| s.clone()))
    }

    async fn list_sheets_by_owner(&self, owner_id: Uuid) -> Result<Vec<Sheet>, AppError> {
        let inner = self.lock();
        let mut rows: Vec<&(u64, Sheet)> = inner
            .sheets
            .values()
            .filter(|(_, s)| s.owner_id == owner_id)
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn count_sheets_by_owner(&self, owner_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .sheets
            .values()
            .filter(|(_, s)| s.owner_id == owner_id)
            .count() as i64)
    }

    async fn update_sheet(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Sheet, AppError> {
        let mut inner = self.lock();
        let (_, sheet) = inner.sheets.get_mut(&id).ok_or(AppError::NotFound)?;
        sheet.title = title.to_string();
        sheet.description = description.map(str::to_string);
        sheet.updated_at = OffsetDateTime::now_utc();
        Ok(sheet.clone())
    }

    async fn delete_sheet(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.lock();
        if inner.sheets.remove(&id).is_none() {
            return Ok(false);
        }
        inner.questions.retain(|_, (_, q)| q.sheet_id != id);
        inner
            .reactions
            .retain(|(_, target, kind), _| !(*target == id && *kind == ItemType::Sheet));
        Ok(true)
    }
}

#[async_trait]
impl QuestionRepo for MemoryStore {
    async fn insert_question(
        &self,
        sheet_id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError> {
        let mut inner = self.lock();
        if !inner.sheets.contains_key(&sheet_id) {
            return Err(AppError::NotFound);
        }
        let q = Question {
            id: Uuid::new_v4(),
            sheet_id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            difficulty: fields.difficulty,
            practice_url: fields.practice_url.clone(),
            video_url: fields.video_url.clone(),
            completed: false,
            visit_count: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        let seq = inner.next_seq();
        inner.questions.insert(q.id, (seq, q.clone()));
        Ok(q)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        Ok(self.lock().questions.get(&id).map(|(_, q)| q.clone()))
    }

    async fn list_questions(&self, sheet_id: Uuid) -> Result<Vec<Question>, AppError> {
        let inner = self.lock();
        let mut rows: Vec<&(u64, Question)> = inner
            .questions
            .values()
            .filter(|(_, q)| q.sheet_id == sheet_id)
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, q)| q.clone()).collect())
    }

    async fn update_question(
        &self,
        id: Uuid,
        fields: &QuestionFields,
    ) -> Result<Question, AppError> {
        let mut inner = self.lock();
        let (_, q) = inner.questions.get_mut(&id).ok_or(AppError::NotFound)?;
        q.title = fields.title.clone();
        q.description = fields.description.clone();
        q.difficulty = fields.difficulty;
        q.practice_url = fields.practice_url.clone();
        q.video_url = fields.video_url.clone();
        Ok(q.clone())
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.lock().questions.remove(&id).is_some())
    }

    async fn toggle_question(&self, id: Uuid) -> Result<Question, AppError> {
        let mut inner = self.lock();
        let (_, q) = inner.questions.get_mut(&id).ok_or(AppError::NotFound)?;
        q.completed = !q.completed;
        Ok(q.clone())
    }

    async fn increment_visits(&self, id: Uuid) -> Result<Question, AppError> {
        let mut inner = self.lock();
        let (_, q) = inner.questions.get_mut(&id).ok_or(AppError::NotFound)?;
        q.visit_count += 1;
        Ok(q.clone())
    }
}

#[async_trait]
impl ReactionRepo for MemoryStore {
    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
        polarity: Polarity,
    ) -> Result<ReactionState, AppError> {
        let mut inner = self.lock();
        let key = (user_id, target_id, item_type);
        if inner.reactions.get(&key) == Some(&polarity) {
            inner.reactions.remove(&key);
            Ok(ReactionState::None)
        } else {
            inner.reactions.insert(key, polarity);
            Ok(Some(polarity).into())
        }
    }

    async fn find_reaction(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<Option<Polarity>, AppError> {
        Ok(self
            .lock()
            .reactions
            .get(&(user_id, target_id, item_type))
            .copied())
    }

    async fn reaction_counts(
        &self,
        target_id: Uuid,
        item_type: ItemType,
    ) -> Result<ReactionCounts, AppError> {
        let inner = self.lock();
        let mut counts = ReactionCounts::default();
        for ((_, target, kind), polarity) in inner.reactions.iter() {
            if *target != target_id || *kind != item_type {
                continue;
            }
            match polarity {
                Polarity::Like => counts.likes += 1,
                Polarity::Dislike => counts.dislikes += 1,
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl ExamPaperRepo for MemoryStore {
    async fn insert_exam_paper(&self, new: NewExamPaper<'_>) -> Result<ExamPaper, AppError> {
        let mut inner = self.lock();
        let paper = ExamPaper {
            id: new.id,
            uploader_id: new.uploader_id,
            subject: new.subject.to_string(),
            exam_type: new.exam_type.to_string(),
            slot: new.slot.to_string(),
            object_key: new.object_key.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        let seq = inner.next_seq();
        inner.papers.insert(paper.id, (seq, paper.clone()));
        Ok(paper)
    }

    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError> {
        Ok(self.lock().papers.get(&id).map(|(_, p)| p.clone()))
    }

    async fn search_exam_papers(&self, query: &str, limit: i64) -> Result<Vec<ExamPaper>, AppError> {
        let needle = query.to_lowercase();
        let inner = self.lock();
        let mut rows: Vec<&(u64, ExamPaper)> = inner
            .papers
            .values()
            .filter(|(_, p)| {
                p.subject.to_lowercase().contains(&needle)
                    || p.exam_type.to_lowercase().contains(&needle)
            })
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }
}
