use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: String,
    pub session_id: String,
    pub codename: String,
    pub created_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub id: String,
    pub session_id: String,
    pub player_id: String,
    pub scenario_id: String,
    pub tool_id: String,
    pub presented_at_ms: u64,
    pub submitted_at_ms: u64,
    pub latency_ms: u64,
    pub accuracy: f64,
    pub time_score: f64,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct NewResponse {
    pub session_id: String,
    pub player_id: String,
    pub scenario_id: String,
    pub tool_id: String,
    pub presented_at_ms: u64,
    pub submitted_at_ms: u64,
    pub latency_ms: u64,
    pub accuracy: f64,
    pub time_score: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardRow {
    pub codename: String,
    pub avg_score: f64,
    pub picks: u64,
    pub avg_latency_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PlayerSummary {
    pub total_responses: u64,
    pub avg_score: f64,
    pub avg_latency_ms: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("codename already taken: {0}")]
    CodenameTaken(String),
}

pub trait GameStore: Send {
    fn create_player(&mut self, session_id: &str, codename: &str)
        -> Result<PlayerRecord, StoreError>;
    fn player_by_id(&self, id: &str) -> Option<PlayerRecord>;
    fn players(&self) -> Vec<PlayerRecord>;
    fn record_response(&mut self, new_response: NewResponse)
        -> Result<ResponseRecord, StoreError>;
    fn responses_for_player(&self, player_id: &str) -> Vec<ResponseRecord>;
    fn all_responses(&self) -> Vec<ResponseRecord>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    players: Vec<PlayerRecord>,
    responses: Vec<ResponseRecord>,
}

/// JSON-file-backed store. The whole state is rewritten on every mutation,
/// which is plenty for a room-sized game session.
pub struct JsonGameStore {
    path: PathBuf,
    players: Vec<PlayerRecord>,
    responses: Vec<ResponseRecord>,
    next_player_id: u64,
    next_response_id: u64,
}

impl JsonGameStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let persisted = Persisted::default();
            let bytes = serde_json::to_vec_pretty(&persisted)?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        let next_player_id = next_id(&persisted.players, "player-", |p| &p.id);
        let next_response_id = next_id(&persisted.responses, "resp-", |r| &r.id);

        Ok(Self {
            path,
            players: persisted.players,
            responses: persisted.responses,
            next_player_id,
            next_response_id,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let persisted = Persisted {
            players: self.players.clone(),
            responses: self.responses.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

fn next_id<T>(records: &[T], prefix: &str, id_of: impl Fn(&T) -> &String) -> u64 {
    records
        .iter()
        .filter_map(|record| id_of(record).strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

impl GameStore for JsonGameStore {
    fn create_player(
        &mut self,
        session_id: &str,
        codename: &str,
    ) -> Result<PlayerRecord, StoreError> {
        let codename = codename.trim();
        if codename.is_empty() || codename.len() > 50 {
            return Err(StoreError::InvalidInput(
                "codename must be 1-50 characters".to_string(),
            ));
        }
        let taken = self
            .players
            .iter()
            .any(|p| p.session_id == session_id && p.codename == codename);
        if taken {
            return Err(StoreError::CodenameTaken(codename.to_string()));
        }

        let player = PlayerRecord {
            id: format!("player-{}", self.next_player_id),
            session_id: session_id.to_string(),
            codename: codename.to_string(),
            created_ms: now_ms(),
        };
        self.next_player_id += 1;
        self.players.push(player.clone());
        self.persist()?;
        Ok(player)
    }

    fn player_by_id(&self, id: &str) -> Option<PlayerRecord> {
        self.players.iter().find(|p| p.id == id).cloned()
    }

    fn players(&self) -> Vec<PlayerRecord> {
        self.players.clone()
    }

    fn record_response(
        &mut self,
        new_response: NewResponse,
    ) -> Result<ResponseRecord, StoreError> {
        if self.player_by_id(&new_response.player_id).is_none() {
            return Err(StoreError::InvalidInput(format!(
                "unknown player: {}",
                new_response.player_id
            )));
        }

        let response = ResponseRecord {
            id: format!("resp-{}", self.next_response_id),
            session_id: new_response.session_id,
            player_id: new_response.player_id,
            scenario_id: new_response.scenario_id,
            tool_id: new_response.tool_id,
            presented_at_ms: new_response.presented_at_ms,
            submitted_at_ms: new_response.submitted_at_ms,
            latency_ms: new_response.latency_ms,
            accuracy: new_response.accuracy,
            time_score: new_response.time_score,
            score: new_response.score,
        };
        self.next_response_id += 1;
        self.responses.push(response.clone());
        self.persist()?;
        Ok(response)
    }

    fn responses_for_player(&self, player_id: &str) -> Vec<ResponseRecord> {
        self.responses
            .iter()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect()
    }

    fn all_responses(&self) -> Vec<ResponseRecord> {
        self.responses.clone()
    }

    fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "players": self.players.len(),
            "responses": self.responses.len(),
            "path": self.path,
        })
    }
}

/// Leaderboard in the shape of the materialized view the game UI reads:
/// per codename, average score (2 decimals), pick count, and average
/// latency (whole milliseconds), sorted by average score descending.
pub fn leaderboard_rows(
    players: &[PlayerRecord],
    responses: &[ResponseRecord],
    limit: usize,
) -> Vec<LeaderboardRow> {
    let mut per_player: HashMap<&str, (f64, u64, u64)> = HashMap::new();
    for response in responses {
        let entry = per_player.entry(&response.player_id).or_insert((0.0, 0, 0));
        entry.0 += response.score;
        entry.1 += response.latency_ms;
        entry.2 += 1;
    }

    let mut rows: Vec<LeaderboardRow> = players
        .iter()
        .filter_map(|player| {
            let (score_sum, latency_sum, picks) = per_player.get(player.id.as_str())?;
            Some(LeaderboardRow {
                codename: player.codename.clone(),
                avg_score: round2(score_sum / (*picks as f64)),
                picks: *picks,
                avg_latency_ms: ((*latency_sum as f64) / (*picks as f64)).round() as u64,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.avg_score
            .total_cmp(&a.avg_score)
            .then_with(|| a.codename.cmp(&b.codename))
    });
    rows.truncate(limit.max(1));
    rows
}

pub fn team_average(responses: &[ResponseRecord]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let sum: f64 = responses.iter().map(|r| r.score).sum();
    round2(sum / (responses.len() as f64))
}

/// Upper median of the sorted scores; 0 when there is no data.
pub fn median_score(responses: &[ResponseRecord]) -> f64 {
    let mut scores: Vec<f64> = responses.iter().map(|r| r.score).collect();
    scores.sort_by(f64::total_cmp);
    scores.get(scores.len() / 2).copied().unwrap_or(0.0)
}

pub fn median_latency_ms(responses: &[ResponseRecord]) -> u64 {
    let mut latencies: Vec<u64> = responses.iter().map(|r| r.latency_ms).collect();
    latencies.sort_unstable();
    latencies.get(latencies.len() / 2).copied().unwrap_or(0)
}

pub fn player_summary(responses: &[ResponseRecord]) -> PlayerSummary {
    let total = responses.len() as u64;
    if total == 0 {
        return PlayerSummary {
            total_responses: 0,
            avg_score: 0.0,
            avg_latency_ms: 0,
        };
    }
    let score_sum: f64 = responses.iter().map(|r| r.score).sum();
    let latency_sum: u64 = responses.iter().map(|r| r.latency_ms).sum();
    PlayerSummary {
        total_responses: total,
        avg_score: round2(score_sum / (total as f64)),
        avg_latency_ms: ((latency_sum as f64) / (total as f64)).round() as u64,
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("toolpick-store-{tag}-{}.json", now_ms()))
    }

    fn response(player_id: &str, score: f64, latency_ms: u64) -> NewResponse {
        NewResponse {
            session_id: "session-1".to_string(),
            player_id: player_id.to_string(),
            scenario_id: "volunteer-intake".to_string(),
            tool_id: "glide".to_string(),
            presented_at_ms: 1_000,
            submitted_at_ms: 1_000 + latency_ms,
            latency_ms,
            accuracy: score / 100.0,
            time_score: 0.5,
            score,
        }
    }

    #[test]
    fn create_record_and_reload_roundtrip() {
        let path = temp_store_path("roundtrip");
        let mut store = JsonGameStore::open(&path).expect("open store");

        let player = store
            .create_player("session-1", "nightowl")
            .expect("create player");
        assert_eq!(player.id, "player-1");

        let recorded = store
            .record_response(response(&player.id, 78.49, 12_500))
            .expect("record response");
        assert_eq!(recorded.id, "resp-1");

        drop(store);
        let reopened = JsonGameStore::open(&path).expect("reopen store");
        assert_eq!(reopened.player_by_id("player-1"), Some(player.clone()));
        assert_eq!(reopened.responses_for_player(&player.id), vec![recorded]);

        // Sequence numbers continue after reload.
        let mut reopened = reopened;
        let second = reopened
            .create_player("session-1", "lark")
            .expect("second player");
        assert_eq!(second.id, "player-2");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn duplicate_codename_in_session_is_rejected() {
        let path = temp_store_path("codename");
        let mut store = JsonGameStore::open(&path).expect("open store");
        store
            .create_player("session-1", "nightowl")
            .expect("create player");
        let duplicate = store.create_player("session-1", "nightowl");
        assert!(matches!(duplicate, Err(StoreError::CodenameTaken(_))));
        // Same codename in another session is fine.
        assert!(store.create_player("session-2", "nightowl").is_ok());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn response_for_unknown_player_is_rejected() {
        let path = temp_store_path("unknown");
        let mut store = JsonGameStore::open(&path).expect("open store");
        let result = store.record_response(response("player-99", 50.0, 1_000));
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn leaderboard_orders_by_average_score() {
        let path = temp_store_path("leaderboard");
        let mut store = JsonGameStore::open(&path).expect("open store");
        let a = store.create_player("session-1", "alpha").expect("alpha");
        let b = store.create_player("session-1", "beta").expect("beta");

        store.record_response(response(&a.id, 60.0, 4_000)).expect("a1");
        store.record_response(response(&a.id, 80.0, 2_000)).expect("a2");
        store.record_response(response(&b.id, 90.0, 1_000)).expect("b1");

        let rows = leaderboard_rows(&store.players(), &store.all_responses(), 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.first().map(|r| r.codename.as_str()), Some("beta"));
        let alpha = rows.iter().find(|r| r.codename == "alpha").expect("alpha row");
        assert_eq!(alpha.avg_score, 70.0);
        assert_eq!(alpha.picks, 2);
        assert_eq!(alpha.avg_latency_ms, 3_000);

        assert_eq!(team_average(&store.all_responses()), 76.67);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn medians_and_summaries_handle_empty_input() {
        assert_eq!(median_score(&[]), 0.0);
        assert_eq!(median_latency_ms(&[]), 0);
        assert_eq!(team_average(&[]), 0.0);
        let summary = player_summary(&[]);
        assert_eq!(summary.total_responses, 0);
        assert_eq!(summary.avg_score, 0.0);
        assert_eq!(summary.avg_latency_ms, 0);
    }
}
