//! SQLite-backed QueueStore via libsql.
//!
//! Conditional transitions are a single `UPDATE ... WHERE id = ? AND status = ? ... RETURNING`
//! inside an IMMEDIATE transaction. A returned row means the precondition held; the
//! response insert (for answers) and the snapshot handed back run in that same transaction.
//! All timestamps are stored as Unix milliseconds.

use crate::domain::{
    AIFeedback, DomainError, LeaseCheck, Precondition, QueueItem, QueueStatus, Response,
    Transition,
};
use crate::ports::QueueStore;
use chrono::{DateTime, Utc};
use libsql::params::Params;
use libsql::{Connection, Database, Row, TransactionBehavior, Value, params};
use std::path::{Path, PathBuf};
use tracing::info;

const QUEUE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS queue_items (
    id TEXT PRIMARY KEY,
    requester_id TEXT NOT NULL,
    content TEXT NOT NULL,
    response_mode TEXT NOT NULL,
    status TEXT NOT NULL,
    priority TEXT NOT NULL,
    cultural_context TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    claimed_by TEXT,
    claimed_at INTEGER,
    response_deadline INTEGER,
    response_count INTEGER NOT NULL DEFAULT 0
)"#;
const QUEUE_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_queue_status_created ON queue_items (status, created_at, id)";
const QUEUE_REQUESTER_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_queue_requester_created ON queue_items (requester_id, created_at, id)";

const RESPONSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    id TEXT PRIMARY KEY,
    queue_item_id TEXT NOT NULL REFERENCES queue_items (id),
    responder_id TEXT NOT NULL,
    responder_type TEXT NOT NULL,
    content TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    feedback_json TEXT
)"#;
const RESPONSES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_responses_item ON responses (queue_item_id, timestamp, id)";

const ITEM_COLUMNS: &str = "id, requester_id, content, response_mode, status, priority, cultural_context, created_at, updated_at, claimed_by, claimed_at, response_deadline, response_count";
const RESPONSE_COLUMNS: &str =
    "id, queue_item_id, responder_id, responder_type, content, timestamp, feedback_json";

/// Lock wait before SQLITE_BUSY surfaces as an error.
const BUSY_TIMEOUT_MS: u32 = 5000;

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// SQLite queue store. One database file (queue.db) in the given base directory.
pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// The returned store is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("queue.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // WAL lets readers proceed while one writer commits.
        pragma(&conn, "PRAGMA journal_mode=WAL").await?;
        pragma(&conn, "PRAGMA synchronous=NORMAL").await?;

        for ddl in [
            QUEUE_ITEMS_TABLE,
            QUEUE_STATUS_INDEX,
            QUEUE_REQUESTER_INDEX,
            RESPONSES_TABLE,
            RESPONSES_INDEX,
        ] {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite queue store connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        pragma(&conn, &format!("PRAGMA busy_timeout={}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    async fn exists(&self, conn: &Connection, id: &str) -> Result<bool, DomainError> {
        let mut rows = conn
            .query("SELECT 1 FROM queue_items WHERE id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        Ok(rows.next().await.map_err(repo_err)?.is_some())
    }

    async fn query_items(
        &self,
        conn: &Connection,
        where_clause: &str,
        params: Params,
    ) -> Result<Vec<QueueItem>, DomainError> {
        let sql = format!(
            "SELECT {} FROM queue_items WHERE {} ORDER BY created_at ASC, id ASC",
            ITEM_COLUMNS, where_clause
        );
        let mut rows = conn.query(&sql, params).await.map_err(repo_err)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            items.push(item_from_row(&row)?);
        }
        for item in &mut items {
            item.responses = self.responses_for(conn, &item.id).await?;
        }
        Ok(items)
    }

    async fn responses_for(
        &self,
        conn: &Connection,
        item_id: &str,
    ) -> Result<Vec<Response>, DomainError> {
        let sql = format!(
            "SELECT {} FROM responses WHERE queue_item_id = ?1 ORDER BY timestamp ASC, id ASC",
            RESPONSE_COLUMNS
        );
        let mut rows = conn.query(&sql, params![item_id]).await.map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(response_from_row(&row)?);
        }
        Ok(out)
    }
}

/// PRAGMA returns a row; use query and consume rows (execute fails when rows are returned).
async fn pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::Repo(format!("{} failed: {}", sql, e)))?;
    while rows.next().await.map_err(repo_err)?.is_some() {}
    Ok(())
}

fn ms(t: DateTime<Utc>) -> Value {
    Value::Integer(t.timestamp_millis())
}

fn from_ms(v: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(v)
        .ok_or_else(|| DomainError::Repo(format!("timestamp out of range: {}", v)))
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Builds `UPDATE queue_items SET ... WHERE ... RETURNING ...` with positional parameters.
fn conditional_update(id: &str, pre: &Precondition, transition: &Transition) -> (String, Params) {
    let mut set = vec!["status = ?", "updated_at = ?"];
    let mut values = vec![text(transition.target().as_str()), ms(transition.at())];

    match transition {
        Transition::Claim {
            actor_id,
            at,
            deadline,
        } => {
            set.extend(["claimed_by = ?", "claimed_at = ?", "response_deadline = ?"]);
            values.extend([text(actor_id), ms(*at), ms(*deadline)]);
        }
        Transition::Release { .. } | Transition::Archive { .. } => {
            set.extend([
                "claimed_by = NULL",
                "claimed_at = NULL",
                "response_deadline = NULL",
            ]);
        }
        Transition::Answer { .. } => {
            set.extend([
                "claimed_by = NULL",
                "claimed_at = NULL",
                "response_deadline = NULL",
                "response_count = response_count + 1",
            ]);
        }
    }

    let mut conds = vec!["id = ?", "status = ?"];
    values.extend([text(id), text(pre.status.as_str())]);
    if let Some(actor) = &pre.claimed_by {
        conds.push("claimed_by = ?");
        values.push(text(actor));
    }
    if let Some(mode) = pre.response_mode {
        conds.push("response_mode = ?");
        values.push(text(mode.as_str()));
    }
    match pre.lease {
        LeaseCheck::Any => {}
        LeaseCheck::LiveAt(now) => {
            conds.push("response_deadline IS NOT NULL AND response_deadline > ?");
            values.push(ms(now));
        }
        LeaseCheck::LapsedAt(now) => {
            conds.push("response_deadline IS NOT NULL AND response_deadline <= ?");
            values.push(ms(now));
        }
    }
    if let Some(cutoff) = pre.updated_at_or_before {
        conds.push("updated_at <= ?");
        values.push(ms(cutoff));
    }

    let sql = format!(
        "UPDATE queue_items SET {} WHERE {} RETURNING {}",
        set.join(", "),
        conds.join(" AND "),
        ITEM_COLUMNS
    );
    (sql, Params::Positional(values))
}

fn opt_text(row: &Row, idx: i32) -> Result<Option<String>, DomainError> {
    match row.get_value(idx).map_err(repo_err)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(DomainError::Repo(format!(
            "column {} expected text, got {:?}",
            idx, other
        ))),
    }
}

fn opt_time(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>, DomainError> {
    match row.get_value(idx).map_err(repo_err)? {
        Value::Null => Ok(None),
        Value::Integer(v) => from_ms(v).map(Some),
        other => Err(DomainError::Repo(format!(
            "column {} expected integer, got {:?}",
            idx, other
        ))),
    }
}

fn item_from_row(row: &Row) -> Result<QueueItem, DomainError> {
    let response_mode: String = row.get(3).map_err(repo_err)?;
    let status: String = row.get(4).map_err(repo_err)?;
    let priority: String = row.get(5).map_err(repo_err)?;
    let response_count: i64 = row.get(12).map_err(repo_err)?;
    Ok(QueueItem {
        id: row.get(0).map_err(repo_err)?,
        requester_id: row.get(1).map_err(repo_err)?,
        content: row.get(2).map_err(repo_err)?,
        response_mode: response_mode.parse()?,
        status: status.parse()?,
        priority: priority.parse()?,
        cultural_context: row.get(6).map_err(repo_err)?,
        created_at: from_ms(row.get(7).map_err(repo_err)?)?,
        updated_at: from_ms(row.get(8).map_err(repo_err)?)?,
        claimed_by: opt_text(row, 9)?,
        claimed_at: opt_time(row, 10)?,
        response_deadline: opt_time(row, 11)?,
        response_count: u32::try_from(response_count).map_err(|_| {
            DomainError::Repo(format!("response_count out of range: {}", response_count))
        })?,
        responses: Vec::new(),
    })
}

fn response_from_row(row: &Row) -> Result<Response, DomainError> {
    let responder_type: String = row.get(3).map_err(repo_err)?;
    let feedback_json = opt_text(row, 6)?;
    Ok(Response {
        id: row.get(0).map_err(repo_err)?,
        queue_item_id: row.get(1).map_err(repo_err)?,
        responder_id: row.get(2).map_err(repo_err)?,
        responder_type: responder_type.parse()?,
        content: row.get(4).map_err(repo_err)?,
        timestamp: from_ms(row.get(5).map_err(repo_err)?)?,
        feedback: feedback_json
            .map(|s| serde_json::from_str::<AIFeedback>(&s))
            .transpose()
            .map_err(|e| DomainError::Repo(format!("corrupt feedback_json: {}", e)))?,
    })
}

#[async_trait::async_trait]
impl QueueStore for SqliteStore {
    async fn insert_item(&self, item: &QueueItem) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let values = vec![
            text(&item.id),
            text(&item.requester_id),
            text(&item.content),
            text(item.response_mode.as_str()),
            text(item.status.as_str()),
            text(item.priority.as_str()),
            text(&item.cultural_context),
            ms(item.created_at),
            ms(item.updated_at),
            item.claimed_by.as_deref().map(text).unwrap_or(Value::Null),
            item.claimed_at.map(ms).unwrap_or(Value::Null),
            item.response_deadline.map(ms).unwrap_or(Value::Null),
            Value::Integer(i64::from(item.response_count)),
        ];
        conn.execute(
            &format!(
                "INSERT INTO queue_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ITEM_COLUMNS
            ),
            Params::Positional(values),
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<QueueItem>, DomainError> {
        let conn = self.conn().await?;
        let mut items = self
            .query_items(&conn, "id = ?", Params::Positional(vec![text(id)]))
            .await?;
        Ok(items.pop())
    }

    async fn transition(
        &self,
        id: &str,
        pre: &Precondition,
        transition: &Transition,
    ) -> Result<Option<QueueItem>, DomainError> {
        transition.check_from(pre.status)?;
        let conn = self.conn().await?;
        let (sql, values) = conditional_update(id, pre, transition);

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;
        let updated = {
            let mut rows = tx.query(&sql, values).await.map_err(repo_err)?;
            match rows.next().await.map_err(repo_err)? {
                Some(row) => Some(item_from_row(&row)?),
                None => None,
            }
        };

        let Some(mut item) = updated else {
            let found = self.exists(&tx, id).await?;
            tx.rollback().await.map_err(repo_err)?;
            if !found {
                return Err(DomainError::NotFound(format!("queue item {}", id)));
            }
            return Ok(None);
        };

        if let Transition::Answer { response } = transition {
            tx.execute(
                &format!(
                    "INSERT INTO responses ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
                    RESPONSE_COLUMNS
                ),
                params![
                    response.id.as_str(),
                    response.queue_item_id.as_str(),
                    response.responder_id.as_str(),
                    response.responder_type.as_str(),
                    response.content.as_str(),
                    response.timestamp.timestamp_millis()
                ],
            )
            .await
            .map_err(repo_err)?;
        }
        item.responses = self.responses_for(&tx, id).await?;
        tx.commit().await.map_err(repo_err)?;
        Ok(Some(item))
    }

    async fn list_by_status(&self, status: QueueStatus) -> Result<Vec<QueueItem>, DomainError> {
        let conn = self.conn().await?;
        self.query_items(
            &conn,
            "status = ?",
            Params::Positional(vec![text(status.as_str())]),
        )
        .await
    }

    async fn list_lapsed_claims(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<QueueItem>, DomainError> {
        let conn = self.conn().await?;
        self.query_items(
            &conn,
            "status = 'claimed' AND response_deadline IS NOT NULL AND response_deadline <= ?",
            Params::Positional(vec![ms(now)]),
        )
        .await
    }

    async fn list_for_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<QueueItem>, DomainError> {
        let conn = self.conn().await?;
        self.query_items(
            &conn,
            "requester_id = ?",
            Params::Positional(vec![text(requester_id)]),
        )
        .await
    }

    async fn get_response(&self, response_id: &str) -> Result<Option<Response>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM responses WHERE id = ?1", RESPONSE_COLUMNS);
        let mut rows = conn
            .query(&sql, params![response_id])
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(response_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn attach_feedback(
        &self,
        response_id: &str,
        feedback: &AIFeedback,
    ) -> Result<(), DomainError> {
        let json = serde_json::to_string(feedback).map_err(repo_err)?;
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE responses SET feedback_json = ?1 WHERE id = ?2",
                params![json, response_id],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("response {}", response_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewRequest, Priority, ResponderType, ResponseMode};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    /// The directory guard must outlive the store; dropping it removes the database.
    async fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(dir.path()).await.unwrap();
        (dir, store)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn item(id: &str, created: DateTime<Utc>, priority: Priority) -> QueueItem {
        QueueItem::new(
            id.to_string(),
            NewRequest {
                requester_id: "req-1".into(),
                content: "I have been feeling isolated since moving abroad".into(),
                response_mode: ResponseMode::Human,
                priority,
                cultural_context: "south-asian".into(),
            },
            created,
        )
    }

    fn claim(actor: &str, at: DateTime<Utc>) -> Transition {
        Transition::Claim {
            actor_id: actor.into(),
            at,
            deadline: at + Duration::hours(2),
        }
    }

    fn feedback() -> AIFeedback {
        let fb = crate::domain::parser::fallback_analysis();
        AIFeedback {
            scores: fb.scores,
            cultural_analysis: fb.cultural_analysis,
            suggestions: fb.suggestions,
            flagged_for_review: true,
            training_data_quality: crate::domain::TrainingDataQuality::Low,
            analysis_succeeded: false,
            analyzed_at: t0(),
            model_id: "mock".into(),
            analysis_version: "test".into(),
        }
    }

    fn response(id: &str, item_id: &str, at: DateTime<Utc>) -> Response {
        Response {
            id: id.into(),
            queue_item_id: item_id.into(),
            responder_id: "alice".into(),
            responder_type: ResponderType::Human,
            content: "That sounds lonely. What has helped before?".into(),
            timestamp: at,
            feedback: None,
        }
    }

    /// Inserts `id` and answers it as alice, returning the snapshot from the answer.
    async fn answered(store: &SqliteStore, id: &str) -> QueueItem {
        store
            .insert_item(&item(id, t0(), Priority::Low))
            .await
            .unwrap();
        store
            .transition(id, &Precondition::pending(), &claim("alice", t0()))
            .await
            .unwrap()
            .unwrap();
        store
            .transition(
                id,
                &Precondition::held_by_live("alice", t0()),
                &Transition::Answer {
                    response: response(&format!("{id}-r"), id, t0() + Duration::minutes(5)),
                },
            )
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (_dir, store) = temp_store().await;
        let it = item("a", t0(), Priority::High);
        store.insert_item(&it).await.unwrap();
        let got = store.get_item("a").await.unwrap().unwrap();
        assert_eq!(got.status, QueueStatus::Pending);
        assert_eq!(got.priority, Priority::High);
        assert_eq!(got.created_at, t0());
        assert!(got.claimed_by.is_none());
        assert!(store.get_item("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_claims_single_winner() {
        let (_dir, store) = temp_store().await;
        let store = Arc::new(store);
        store
            .insert_item(&item("race", t0(), Priority::Low))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .transition(
                        "race",
                        &Precondition::pending(),
                        &claim(&format!("actor-{n}"), t0()),
                    )
                    .await
                    .unwrap()
            }));
        }
        let mut winners = Vec::new();
        for h in handles {
            if let Some(item) = h.await.unwrap() {
                winners.push(item);
            }
        }
        assert_eq!(winners.len(), 1);
        let stored = store.get_item("race").await.unwrap().unwrap();
        assert_eq!(stored.claimed_by, winners[0].claimed_by);
        assert_eq!(stored.response_deadline, Some(t0() + Duration::hours(2)));
    }

    #[tokio::test]
    async fn test_answer_persists_response_atomically() {
        let (_dir, store) = temp_store().await;
        store
            .insert_item(&item("a", t0(), Priority::Low))
            .await
            .unwrap();
        store
            .transition("a", &Precondition::pending(), &claim("alice", t0()))
            .await
            .unwrap()
            .unwrap();

        let response = Response {
            id: "r1".into(),
            queue_item_id: "a".into(),
            responder_id: "alice".into(),
            responder_type: ResponderType::Human,
            content: "That sounds lonely. What has helped before?".into(),
            timestamp: t0() + Duration::minutes(10),
            feedback: None,
        };
        let wrong_owner = store
            .transition(
                "a",
                &Precondition::held_by_live("bob", t0()),
                &Transition::Answer {
                    response: response.clone(),
                },
            )
            .await
            .unwrap();
        assert!(wrong_owner.is_none());
        assert!(store.get_response("r1").await.unwrap().is_none());

        let answered = store
            .transition(
                "a",
                &Precondition::held_by_live("alice", t0() + Duration::minutes(10)),
                &Transition::Answer { response },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(answered.status, QueueStatus::Answered);
        assert_eq!(answered.response_count, 1);
        assert_eq!(answered.responses.len(), 1);
        assert!(answered.response_deadline.is_none());
        assert!(answered.claimed_by.is_none());
    }

    #[tokio::test]
    async fn test_transition_returns_committed_snapshot() {
        let (_dir, store) = temp_store().await;
        store
            .insert_item(&item("a", t0(), Priority::Low))
            .await
            .unwrap();
        let claimed = store
            .transition("a", &Precondition::pending(), &claim("alice", t0()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed, store.get_item("a").await.unwrap().unwrap());

        let released = store
            .transition(
                "a",
                &Precondition::held_by("alice"),
                &Transition::Release {
                    at: t0() + Duration::minutes(1),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(released.status, QueueStatus::Pending);
        assert!(released.claimed_by.is_none());
        assert!(released.claimed_at.is_none());
        assert!(released.response_deadline.is_none());
        assert_eq!(released.updated_at, t0() + Duration::minutes(1));
        assert_eq!(released, store.get_item("a").await.unwrap().unwrap());

        let snapshot = answered(&store, "b").await;
        assert_eq!(snapshot.status, QueueStatus::Answered);
        assert_eq!(snapshot.response_count, 1);
        assert_eq!(snapshot.responses.len(), 1);
        assert_eq!(snapshot.responses[0].id, "b-r");
        assert_eq!(snapshot, store.get_item("b").await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_attached_feedback_reads_back() {
        let (_dir, store) = temp_store().await;
        let response_id = answered(&store, "a").await.responses[0].id.clone();
        assert_eq!(
            store.get_response(&response_id).await.unwrap().unwrap().feedback,
            None
        );

        let fb = feedback();
        store.attach_feedback(&response_id, &fb).await.unwrap();
        let got = store.get_response(&response_id).await.unwrap().unwrap();
        assert_eq!(got.feedback, Some(fb.clone()));
        let item = store.get_item("a").await.unwrap().unwrap();
        assert_eq!(item.responses[0].feedback, Some(fb));
    }

    #[tokio::test]
    async fn test_corrupt_rows_surface_as_repo_errors() {
        let (_dir, store) = temp_store().await;
        let response_id = answered(&store, "a").await.responses[0].id.clone();
        let conn = store.conn().await.unwrap();
        conn.execute(
            "UPDATE responses SET feedback_json = '{not json' WHERE id = ?1",
            params![response_id.as_str()],
        )
        .await
        .unwrap();
        assert!(matches!(
            store.get_response(&response_id).await,
            Err(DomainError::Repo(_))
        ));

        answered(&store, "b").await;
        conn.execute(
            "UPDATE queue_items SET response_count = -1 WHERE id = 'b'",
            (),
        )
        .await
        .unwrap();
        assert!(matches!(store.get_item("b").await, Err(DomainError::Repo(_))));

        store
            .insert_item(&item("c", t0(), Priority::Low))
            .await
            .unwrap();
        conn.execute(
            "UPDATE queue_items SET cultural_context = X'FF' WHERE id = 'c'",
            (),
        )
        .await
        .unwrap();
        assert!(matches!(store.get_item("c").await, Err(DomainError::Repo(_))));
    }

    #[tokio::test]
    async fn test_sweep_and_archive_cycle() {
        use crate::adapters::clock::ManualClock;
        use crate::usecases::ClaimManager;

        let (_dir, store) = temp_store().await;
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::new(t0()));
        let claims = ClaimManager::new(store.clone(), clock.clone());

        let req = || NewRequest {
            requester_id: "req-1".into(),
            content: "My parents want me to study medicine".into(),
            response_mode: ResponseMode::Human,
            priority: Priority::Medium,
            cultural_context: "east-asian".into(),
        };
        let lapsing = claims.enqueue(req()).await.unwrap();
        let answering = claims.enqueue(req()).await.unwrap();
        claims.claim(&lapsing.id, "alice").await.unwrap();
        claims.claim(&answering.id, "bob").await.unwrap();
        store
            .transition(
                &answering.id,
                &Precondition::held_by_live("bob", t0()),
                &Transition::Answer {
                    response: response("r-bob", &answering.id, t0()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(claims.sweep_expired().await.unwrap(), 1);
        assert_eq!(claims.sweep_expired().await.unwrap(), 0);
        let swept = store.get_item(&lapsing.id).await.unwrap().unwrap();
        assert_eq!(swept.status, QueueStatus::Pending);
        assert!(swept.claimed_by.is_none());

        assert_eq!(claims.archive_answered(Duration::days(1)).await.unwrap(), 0);
        clock.advance(Duration::days(1));
        assert_eq!(claims.archive_answered(Duration::days(1)).await.unwrap(), 1);
        let archived = store.get_item(&answering.id).await.unwrap().unwrap();
        assert_eq!(archived.status, QueueStatus::Archived);
        assert_eq!(archived.responses.len(), 1);
        assert_eq!(
            store.list_by_status(QueueStatus::Archived).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_lapsed_claims_and_fifo_listing() {
        let (_dir, store) = temp_store().await;
        store
            .insert_item(&item("late", t0() + Duration::seconds(5), Priority::Urgent))
            .await
            .unwrap();
        store
            .insert_item(&item("early", t0(), Priority::Low))
            .await
            .unwrap();
        let pending: Vec<String> = store
            .list_by_status(QueueStatus::Pending)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(pending, ["early", "late"]);

        store
            .transition("early", &Precondition::pending(), &claim("alice", t0()))
            .await
            .unwrap()
            .unwrap();
        assert!(
            store
                .list_lapsed_claims(t0() + Duration::minutes(119))
                .await
                .unwrap()
                .is_empty()
        );
        let lapsed = store
            .list_lapsed_claims(t0() + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(lapsed.len(), 1);
        assert_eq!(lapsed[0].id, "early");
    }

    #[tokio::test]
    async fn test_missing_item_and_response_not_found() {
        let (_dir, store) = temp_store().await;
        let err = store
            .transition("ghost", &Precondition::pending(), &claim("a", t0()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = store
            .attach_feedback("ghost", &feedback())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
