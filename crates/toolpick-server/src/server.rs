use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;
use std::time::Instant;

use serde::Deserialize;
use serde_json::{json, Value};
use toolpick_content::ContentSet;
use toolpick_core::{calculate_attribute_heatmap, score_response, ScoreError};
use toolpick_store::{
    leaderboard_rows, median_latency_ms, median_score, now_ms, player_summary, team_average,
    GameStore, JsonGameStore, NewResponse, StoreError,
};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

const DEFAULT_SESSION_ID: &str = "session-default";

const CODE_INTERNAL: i64 = -32000;
const CODE_NOT_FOUND: i64 = -32001;
const CODE_CONFLICT: i64 = -32002;
const CODE_EXHAUSTED: i64 = -32003;
const CODE_INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Sprint,
    Rounds,
}

impl SessionMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sprint => "sprint",
            Self::Rounds => "rounds",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    pub session_id: String,
    pub mode: SessionMode,
    pub duration_seconds: u64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db_path =
            std::env::var("TOOLPICK_DB").unwrap_or_else(|_| "./data/game-db.json".to_string());
        let mode = match std::env::var("TOOLPICK_SESSION_MODE") {
            Ok(v) if v.trim().eq_ignore_ascii_case("rounds") => SessionMode::Rounds,
            _ => SessionMode::Sprint,
        };
        let duration_seconds = std::env::var("TOOLPICK_SESSION_DURATION_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(300);
        Self {
            db_path,
            session_id: DEFAULT_SESSION_ID.to_string(),
            mode,
            duration_seconds,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct MethodMetric {
    ok: u64,
    err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

#[derive(Debug, Default)]
struct MetricsRegistry {
    method: HashMap<String, MethodMetric>,
}

pub struct GameServer {
    content: ContentSet,
    store: Mutex<Box<dyn GameStore>>,
    config: ServerConfig,
    metrics: Mutex<MetricsRegistry>,
}

impl GameServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::from_env()).expect("initialize toolpick server")
    }

    pub fn with_db_path(db_path: impl Into<String>) -> Result<Self, String> {
        let mut config = ServerConfig::from_env();
        config.db_path = db_path.into();
        Self::with_config(config)
    }

    pub fn with_config(config: ServerConfig) -> Result<Self, String> {
        let content = ContentSet::builtin().map_err(|e| e.to_string())?;
        let store: Box<dyn GameStore> =
            Box::new(JsonGameStore::open(&config.db_path).map_err(|e| e.to_string())?);
        Ok(Self {
            content,
            store: Mutex::new(store),
            config,
            metrics: Mutex::new(MetricsRegistry::default()),
        })
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                -32600,
                "invalid jsonrpc version",
            ));
        }

        // Requests without an id are notifications; the game protocol has
        // nothing to say back.
        let id = request.id?;

        let start = Instant::now();
        let method = request.method.clone();
        let response = match request.method.as_str() {
            "ping" => JsonRpcResponse::success(id, json!({})),
            "server_info" => JsonRpcResponse::success(
                id,
                json!({
                    "name": "toolpick-server",
                    "version": env!("CARGO_PKG_VERSION"),
                    "session": {
                        "id": self.config.session_id,
                        "mode": self.config.mode.label(),
                        "duration_seconds": self.config.duration_seconds,
                    }
                }),
            ),
            "join" => self.exec_join(id, request.params),
            "scenario_next" => self.exec_scenario_next(id, request.params),
            "pick" => self.exec_pick(id, request.params),
            "tools_list" => self.exec_tools_list(id),
            "leaderboard" => self.exec_leaderboard(id, request.params),
            "me" => self.exec_me(id, request.params),
            "heatmap" => self.exec_heatmap(id),
            "admin_summary" => self.exec_admin_summary(id),
            _ => JsonRpcResponse::error(id, -32601, "method not found"),
        };
        self.record_method_metrics(
            &method,
            start.elapsed().as_secs_f64() * 1000.0,
            response.error.is_some(),
        );
        Some(response)
    }

    fn exec_join(&self, id: Value, params: Value) -> JsonRpcResponse {
        let args: JoinParams = match parse_params(params) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let mut locked = match self.store.lock() {
            Ok(v) => v,
            Err(_) => return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned"),
        };
        match locked.create_player(&self.config.session_id, &args.codename) {
            Ok(player) => JsonRpcResponse::success(
                id,
                json!({"player_id": player.id, "codename": player.codename}),
            ),
            Err(StoreError::CodenameTaken(name)) => JsonRpcResponse::error(
                id,
                CODE_CONFLICT,
                format!("codename already taken: {name}"),
            ),
            Err(StoreError::InvalidInput(msg)) => {
                JsonRpcResponse::error(id, CODE_INVALID_PARAMS, msg)
            }
            Err(err) => JsonRpcResponse::error(id, CODE_INTERNAL, err.to_string()),
        }
    }

    fn exec_scenario_next(&self, id: Value, params: Value) -> JsonRpcResponse {
        let args: PlayerParams = match parse_params(params) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        let answered: Vec<String> = {
            let locked = match self.store.lock() {
                Ok(v) => v,
                Err(_) => {
                    return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned")
                }
            };
            if locked.player_by_id(&args.player_id).is_none() {
                return JsonRpcResponse::error(id, CODE_NOT_FOUND, "player not found");
            }
            locked
                .responses_for_player(&args.player_id)
                .into_iter()
                .map(|r| r.scenario_id)
                .collect()
        };

        let Some(scenario) = self.content.random_scenario(&answered) else {
            return JsonRpcResponse::error(id, CODE_EXHAUSTED, "no more scenarios available");
        };
        let scenario_value = serde_json::to_value(scenario).unwrap_or_else(|_| json!({}));
        JsonRpcResponse::success(
            id,
            json!({"scenario": scenario_value, "started_ms": now_ms()}),
        )
    }

    fn exec_pick(&self, id: Value, params: Value) -> JsonRpcResponse {
        let args: PickParams = match parse_params(params) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        let Some(tool) = self.content.tool_by_id(&args.tool_id) else {
            return JsonRpcResponse::error(id, CODE_NOT_FOUND, "tool not found");
        };
        let Some(scenario) = self.content.scenario_by_id(&args.scenario_id) else {
            return JsonRpcResponse::error(id, CODE_NOT_FOUND, "scenario not found");
        };

        let scored = match score_response(
            tool,
            scenario,
            args.presented_at_ms,
            args.submitted_at_ms,
        ) {
            Ok(v) => v,
            Err(err) => return score_error_response(id, &err),
        };

        let mut locked = match self.store.lock() {
            Ok(v) => v,
            Err(_) => return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned"),
        };
        if locked.player_by_id(&args.player_id).is_none() {
            return JsonRpcResponse::error(id, CODE_NOT_FOUND, "player not found");
        }
        let recorded = locked.record_response(NewResponse {
            session_id: self.config.session_id.clone(),
            player_id: args.player_id,
            scenario_id: args.scenario_id,
            tool_id: args.tool_id,
            presented_at_ms: args.presented_at_ms,
            submitted_at_ms: args.submitted_at_ms,
            latency_ms: scored.latency_ms,
            accuracy: scored.accuracy,
            time_score: scored.time_score,
            score: scored.score,
        });
        match recorded {
            Ok(_) => JsonRpcResponse::success(
                id,
                json!({
                    "latency_ms": scored.latency_ms,
                    "accuracy": scored.accuracy,
                    "time_score": scored.time_score,
                    "score": scored.score,
                }),
            ),
            Err(err) => JsonRpcResponse::error(id, CODE_INTERNAL, err.to_string()),
        }
    }

    fn exec_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = serde_json::to_value(self.content.tools()).unwrap_or_else(|_| json!([]));
        JsonRpcResponse::success(
            id,
            json!({"tools": tools, "count": self.content.tools().len()}),
        )
    }

    fn exec_leaderboard(&self, id: Value, params: Value) -> JsonRpcResponse {
        let args: LeaderboardParams = match parse_params_optional(params) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let limit = args.limit.unwrap_or(10).clamp(1, 100);

        let locked = match self.store.lock() {
            Ok(v) => v,
            Err(_) => return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned"),
        };
        let players = locked.players();
        let responses = locked.all_responses();
        drop(locked);

        let rows = leaderboard_rows(&players, &responses, limit);
        let rows_value = serde_json::to_value(&rows).unwrap_or_else(|_| json!([]));
        let scored_players: HashSet<&str> =
            responses.iter().map(|r| r.player_id.as_str()).collect();
        JsonRpcResponse::success(
            id,
            json!({
                "leaderboard": rows_value,
                "team_average": team_average(&responses),
                "total_players": scored_players.len(),
                "total_responses": responses.len(),
            }),
        )
    }

    fn exec_me(&self, id: Value, params: Value) -> JsonRpcResponse {
        let args: PlayerParams = match parse_params(params) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let locked = match self.store.lock() {
            Ok(v) => v,
            Err(_) => return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned"),
        };
        let Some(player) = locked.player_by_id(&args.player_id) else {
            return JsonRpcResponse::error(id, CODE_NOT_FOUND, "player not found");
        };
        let mut responses = locked.responses_for_player(&args.player_id);
        drop(locked);
        responses.sort_by(|a, b| b.submitted_at_ms.cmp(&a.submitted_at_ms));

        let stats = player_summary(&responses);
        let responses_value = serde_json::to_value(&responses).unwrap_or_else(|_| json!([]));
        JsonRpcResponse::success(
            id,
            json!({
                "player": {
                    "id": player.id,
                    "codename": player.codename,
                    "created_ms": player.created_ms,
                },
                "stats": stats,
                "responses": responses_value,
            }),
        )
    }

    fn exec_heatmap(&self, id: Value) -> JsonRpcResponse {
        let picks: Vec<(String, String)> = {
            let locked = match self.store.lock() {
                Ok(v) => v,
                Err(_) => {
                    return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned")
                }
            };
            locked
                .all_responses()
                .into_iter()
                .map(|r| (r.tool_id, r.scenario_id))
                .collect()
        };

        // Picks whose tool or scenario left the deck since being recorded
        // are skipped rather than failing the whole aggregate.
        let resolved: Vec<_> = picks
            .iter()
            .filter_map(|(tool_id, scenario_id)| {
                Some((
                    self.content.tool_by_id(tool_id)?,
                    self.content.scenario_by_id(scenario_id)?,
                ))
            })
            .collect();

        let heatmap = calculate_attribute_heatmap(&resolved);
        let mut entries = serde_json::Map::new();
        for entry in &heatmap {
            entries.insert(
                entry.attribute.name().to_string(),
                json!({"avg_difference": entry.avg_difference, "count": entry.count}),
            );
        }
        JsonRpcResponse::success(
            id,
            json!({"heatmap": entries, "total_responses": resolved.len()}),
        )
    }

    fn exec_admin_summary(&self, id: Value) -> JsonRpcResponse {
        let locked = match self.store.lock() {
            Ok(v) => v,
            Err(_) => return JsonRpcResponse::error(id, CODE_INTERNAL, "store lock poisoned"),
        };
        let players = locked.players();
        let responses = locked.all_responses();
        drop(locked);

        let now = now_ms();
        let window_start = now.saturating_sub(5 * 60 * 1000);
        let recent = responses
            .iter()
            .filter(|r| r.submitted_at_ms >= window_start)
            .count();
        let active_players: HashSet<&str> =
            responses.iter().map(|r| r.player_id.as_str()).collect();
        let top = leaderboard_rows(&players, &responses, 5);
        let top_value = serde_json::to_value(&top).unwrap_or_else(|_| json!([]));

        JsonRpcResponse::success(
            id,
            json!({
                "session": {
                    "mode": self.config.mode.label(),
                    "duration_seconds": self.config.duration_seconds,
                },
                "metrics": {
                    "submissions_per_min": (recent as f64) / 5.0,
                    "active_players": active_players.len(),
                    "total_responses": responses.len(),
                    "median_score": median_score(&responses),
                    "median_latency_ms": median_latency_ms(&responses),
                },
                "top_players": top_value,
                "last_updated_ms": now,
            }),
        )
    }

    fn record_method_metrics(&self, method: &str, latency_ms: f64, is_error: bool) {
        let mut locked = match self.metrics.lock() {
            Ok(v) => v,
            Err(_) => return,
        };
        let metric = locked.method.entry(method.to_string()).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    fn render_metrics_text(&self) -> String {
        let mut lines = vec![
            "# TYPE toolpick_rpc_calls_total counter".to_string(),
            "# TYPE toolpick_rpc_latency_ms_sum counter".to_string(),
            "# TYPE toolpick_rpc_latency_ms_count counter".to_string(),
            "# TYPE toolpick_rpc_latency_ms_max gauge".to_string(),
            "# TYPE toolpick_players gauge".to_string(),
            "# TYPE toolpick_responses gauge".to_string(),
        ];

        if let Ok(locked) = self.metrics.lock() {
            let mut methods = locked.method.keys().cloned().collect::<Vec<_>>();
            methods.sort();
            for method in methods {
                let Some(m) = locked.method.get(&method) else {
                    continue;
                };
                lines.push(format!(
                    "toolpick_rpc_calls_total{{method=\"{method}\",status=\"ok\"}} {}",
                    m.ok
                ));
                lines.push(format!(
                    "toolpick_rpc_calls_total{{method=\"{method}\",status=\"error\"}} {}",
                    m.err
                ));
                lines.push(format!(
                    "toolpick_rpc_latency_ms_sum{{method=\"{method}\"}} {:.3}",
                    m.total_latency_ms
                ));
                lines.push(format!(
                    "toolpick_rpc_latency_ms_count{{method=\"{method}\"}} {}",
                    m.ok + m.err
                ));
                lines.push(format!(
                    "toolpick_rpc_latency_ms_max{{method=\"{method}\"}} {:.3}",
                    m.max_latency_ms
                ));
            }
        }

        let (players, responses) = self.store_counts();
        lines.push(format!("toolpick_players {players}"));
        lines.push(format!("toolpick_responses {responses}"));
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn render_metrics_summary(&self) -> Value {
        let mut methods = serde_json::Map::new();
        if let Ok(locked) = self.metrics.lock() {
            let mut names = locked.method.keys().cloned().collect::<Vec<_>>();
            names.sort();
            for name in names {
                let Some(m) = locked.method.get(&name) else {
                    continue;
                };
                let count = m.ok + m.err;
                let avg = if count > 0 {
                    m.total_latency_ms / (count as f64)
                } else {
                    0.0
                };
                methods.insert(
                    name,
                    json!({
                        "ok": m.ok,
                        "err": m.err,
                        "avg_latency_ms": avg,
                        "max_latency_ms": m.max_latency_ms,
                    }),
                );
            }
        }
        let (players, responses) = self.store_counts();
        json!({
            "status": "ok",
            "methods": methods,
            "players": players,
            "responses": responses,
        })
    }

    fn store_counts(&self) -> (u64, u64) {
        let Ok(locked) = self.store.lock() else {
            return (0, 0);
        };
        let stats = locked.stats();
        let players = stats.get("players").and_then(Value::as_u64).unwrap_or(0);
        let responses = stats.get("responses").and_then(Value::as_u64).unwrap_or(0);
        (players, responses)
    }

    pub fn serve_stdio(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = io::BufReader::new(stdin.lock());
        let mut stdout = io::stdout();
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(err) => {
                    let response =
                        JsonRpcResponse::error(Value::Null, -32700, format!("parse error: {err}"));
                    write_stdio_response(&mut stdout, &response)?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request) {
                write_stdio_response(&mut stdout, &response)?;
            }
        }

        Ok(())
    }

    pub fn serve_http(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        eprintln!("toolpick-server http listening on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = self.handle_http_connection(stream) {
                        eprintln!("toolpick-server http request error: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("toolpick-server http accept error: {err}");
                }
            }
        }
        Ok(())
    }

    fn handle_http_connection(&self, mut stream: TcpStream) -> io::Result<()> {
        let Some(req) = read_http_request(&stream)? else {
            return Ok(());
        };
        let response = self.dispatch_http_request(req);
        write_http_response(&mut stream, response)
    }

    fn dispatch_http_request(&self, req: HttpRequest) -> HttpResponse {
        if req.method == "GET" && req.path == "/health" {
            return HttpResponse::json(200, json!({"status":"ok"}));
        }

        if req.method == "GET" && req.path == "/metrics" {
            return HttpResponse::text(
                200,
                "text/plain; version=0.0.4; charset=utf-8",
                self.render_metrics_text(),
            );
        }

        if req.method == "GET" && req.path == "/metrics/summary" {
            return HttpResponse::json(200, self.render_metrics_summary());
        }

        if req.method != "POST" {
            return HttpResponse::json(
                405,
                json!({"error":"method_not_allowed","message":"supported endpoints: GET /health, GET /metrics, GET /metrics/summary, POST /rpc"}),
            );
        }

        if req.path != "/rpc" && req.path != "/" {
            return HttpResponse::json(404, json!({"error":"not_found","message":"use POST /rpc"}));
        }

        let rpc: JsonRpcRequest = match serde_json::from_slice(&req.body) {
            Ok(v) => v,
            Err(err) => {
                return HttpResponse::json(
                    400,
                    json!({"jsonrpc":"2.0","id": Value::Null, "error":{"code":-32700,"message": format!("parse error: {err}")}}),
                )
            }
        };
        match self.handle_request(rpc) {
            Some(v) => match serde_json::to_value(v) {
                Ok(payload) => HttpResponse::json(200, payload),
                Err(_) => HttpResponse::json(
                    500,
                    json!({"error":"internal_error","message":"failed to serialize rpc response"}),
                ),
            },
            None => HttpResponse::json(
                204,
                json!({"jsonrpc":"2.0","id": Value::Null, "result": null}),
            ),
        }
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}

fn with_id(mut response: JsonRpcResponse, id: Value) -> JsonRpcResponse {
    response.id = id;
    response
}

fn score_error_response(id: Value, err: &ScoreError) -> JsonRpcResponse {
    match err {
        ScoreError::Validation(_) | ScoreError::Input(_) => {
            JsonRpcResponse::error(id, CODE_INVALID_PARAMS, err.to_string())
        }
        ScoreError::Configuration(_) => {
            JsonRpcResponse::error(id, CODE_INTERNAL, err.to_string())
        }
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, JsonRpcResponse> {
    if params.is_null() {
        return Err(JsonRpcResponse::error(
            Value::Null,
            CODE_INVALID_PARAMS,
            "missing params",
        ));
    }
    serde_json::from_value(params).map_err(|err| {
        JsonRpcResponse::error(
            Value::Null,
            CODE_INVALID_PARAMS,
            format!("invalid params: {err}"),
        )
    })
}

fn parse_params_optional<T: for<'de> Deserialize<'de> + Default>(
    params: Value,
) -> Result<T, JsonRpcResponse> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|err| {
        JsonRpcResponse::error(
            Value::Null,
            CODE_INVALID_PARAMS,
            format!("invalid params: {err}"),
        )
    })
}

#[derive(Debug, Deserialize)]
struct JoinParams {
    codename: String,
}

#[derive(Debug, Deserialize)]
struct PlayerParams {
    player_id: String,
}

#[derive(Debug, Deserialize)]
struct PickParams {
    player_id: String,
    scenario_id: String,
    tool_id: String,
    presented_at_ms: u64,
    submitted_at_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct LeaderboardParams {
    limit: Option<usize>,
}

fn write_stdio_response(stdout: &mut io::Stdout, response: &JsonRpcResponse) -> io::Result<()> {
    let payload = serde_json::to_string(response).unwrap_or_else(|_| {
        "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\"message\":\"serialization failure\"}}".to_string()
    });
    stdout.write_all(payload.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

struct HttpResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    fn json(status: u16, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body: body.into_bytes(),
        }
    }
}

fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let first = line.trim_end_matches(['\r', '\n']);
    if first.is_empty() {
        return Ok(None);
    }

    let mut parts = first.split_whitespace();
    let Some(method) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing method)",
        ));
    };
    let Some(path_with_query) = parts.next() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid http request line (missing path)",
        ));
    };
    let path = path_with_query
        .split_once('?')
        .map_or(path_with_query, |(p, _)| p);

    let mut content_length = 0_usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            break;
        }
        let header = header.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0_u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(Some(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        body,
    }))
}

fn write_http_response(stream: &mut TcpStream, response: HttpResponse) -> io::Result<()> {
    let reason = http_reason_phrase(response.status);
    let headers = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason,
        response.content_type,
        response.body.len()
    );
    stream.write_all(headers.as_bytes())?;
    stream.write_all(&response.body)?;
    stream.flush()
}

fn http_reason_phrase(status: u16) -> &'static str {
    match status {
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_params_rejects_null_and_wrong_shape() {
        let missing = parse_params::<JoinParams>(Value::Null);
        assert!(missing.is_err());

        let wrong = parse_params::<JoinParams>(json!({"codenom": "x"}));
        assert!(wrong.is_err());

        let ok = parse_params::<JoinParams>(json!({"codename": "nightowl"}));
        assert!(ok.is_ok());
    }

    #[test]
    fn optional_params_default_on_null() {
        let parsed: LeaderboardParams = parse_params_optional(Value::Null).expect("default");
        assert_eq!(parsed.limit, None);
        let parsed: LeaderboardParams =
            parse_params_optional(json!({"limit": 3})).expect("explicit");
        assert_eq!(parsed.limit, Some(3));
    }

    #[test]
    fn session_mode_labels() {
        assert_eq!(SessionMode::Sprint.label(), "sprint");
        assert_eq!(SessionMode::Rounds.label(), "rounds");
    }

    #[test]
    fn reason_phrases_cover_used_codes() {
        assert_eq!(http_reason_phrase(200), "OK");
        assert_eq!(http_reason_phrase(404), "Not Found");
        assert_eq!(http_reason_phrase(405), "Method Not Allowed");
    }
}
