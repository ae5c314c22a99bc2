//! Reply parsers for the four-letter-word status protocol.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// A metric value: numeric-looking values coerce to integers, everything
/// else stays textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Text(String),
}

impl StatValue {
    fn coerce(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(value) => StatValue::Int(value),
            Err(_) => StatValue::Text(raw.to_string()),
        }
    }

    /// The numeric value, when this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StatValue::Int(value) => Some(*value),
            StatValue::Text(_) => None,
        }
    }
}

/// Parse the tab-separated `key\tvalue` stream of the `mntr` command.
///
/// Lines that are not exactly one key and one value, or whose key is empty,
/// are skipped.
pub fn parse_mntr(data: &str) -> BTreeMap<String, StatValue> {
    let mut stats = BTreeMap::new();
    for line in data.lines() {
        let mut fields = line.split('\t').map(str::trim);
        let (Some(key), Some(value), None) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        stats.insert(key.to_string(), StatValue::coerce(value));
    }
    stats
}

/// Parse the free-text `stat` reply into the metric names the `mntr`
/// command would report.
///
/// Layout: a version line, client-session lines terminated by a blank line,
/// then one metric per line matched against fixed labels. Unrecognized
/// lines are ignored.
pub fn parse_stat(data: &str) -> BTreeMap<String, StatValue> {
    let mut stats = BTreeMap::new();
    let mut lines = data.lines();

    if let Some(version_line) = lines.next() {
        if let Some((_, version)) = version_line.split_once(':') {
            stats.insert(
                "zk_version".to_string(),
                StatValue::Text(version.trim().to_string()),
            );
        }
    }

    // Skip the client-session header up to and including the blank line.
    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
    }

    for line in lines {
        if let Some(rest) = line.strip_prefix("Latency min/avg/max: ") {
            let mut parts = rest.trim().splitn(3, '/');
            if let (Some(min), Some(avg), Some(max)) = (parts.next(), parts.next(), parts.next()) {
                if let (Ok(min), Ok(avg), Ok(max)) =
                    (min.parse::<i64>(), avg.parse::<i64>(), max.parse::<i64>())
                {
                    stats.insert("zk_min_latency".to_string(), StatValue::Int(min));
                    stats.insert("zk_avg_latency".to_string(), StatValue::Int(avg));
                    stats.insert("zk_max_latency".to_string(), StatValue::Int(max));
                }
            }
        } else if let Some(value) = labeled_int(line, "Received: ") {
            stats.insert("zk_packets_received".to_string(), value);
        } else if let Some(value) = labeled_int(line, "Sent: ") {
            stats.insert("zk_packets_sent".to_string(), value);
        } else if let Some(value) = labeled_int(line, "Outstanding: ") {
            stats.insert("zk_outstanding_requests".to_string(), value);
        } else if let Some(mode) = line.strip_prefix("Mode: ") {
            stats.insert(
                "zk_server_state".to_string(),
                StatValue::Text(mode.trim().to_string()),
            );
        } else if let Some(value) = labeled_int(line, "Node count: ") {
            stats.insert("zk_znode_count".to_string(), value);
        }
    }

    stats
}

fn labeled_int(line: &str, label: &str) -> Option<StatValue> {
    line.strip_prefix(label)
        .and_then(|rest| rest.trim().parse::<i64>().ok())
        .map(StatValue::Int)
}

/// One connected client as reported by `stat`.
///
/// Session descriptor lines look like
/// `/10.0.0.1:50044[1](queued=0,recved=36,sent=36)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub host: String,
    pub port: u16,
    pub interest_ops: u32,
    /// The parenthesized `key=value` fields, untyped.
    pub details: BTreeMap<String, String>,
}

fn session_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(\d+\.\d+\.\d+\.\d+):(\d+)\[(\d+)\]\((.*)\)")
            .unwrap_or_else(|e| panic!("session regex: {e}"))
    })
}

impl FromStr for ClientSession {
    type Err = StatsError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let broken = || StatsError::Parse {
            line: line.to_string(),
        };
        let captures = session_regex().captures(line).ok_or_else(broken)?;

        let host = captures[1].to_string();
        let port = captures[2].parse::<u16>().map_err(|_| broken())?;
        let interest_ops = captures[3].parse::<u32>().map_err(|_| broken())?;

        let mut details = BTreeMap::new();
        for field in captures[4].split(',') {
            let (key, value) = field.split_once('=').ok_or_else(broken)?;
            details.insert(key.to_string(), value.to_string());
        }

        Ok(ClientSession {
            host,
            port,
            interest_ops,
            details,
        })
    }
}

/// Parse every well-formed session line of a `stat` reply.
///
/// The version line and the `Clients:` header are skipped, as is any
/// malformed session line; parsing stops at the blank line that terminates
/// the session list.
pub fn parse_sessions(data: &str) -> Vec<ClientSession> {
    let mut sessions = Vec::new();
    // Skip the version line and the "Clients:" header.
    for line in data.lines().skip(2) {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        match line.parse::<ClientSession>() {
            Ok(session) => sessions.push(session),
            Err(_) => continue,
        }
    }
    sessions
}
