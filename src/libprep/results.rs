use log::debug;
use std::fmt;

const DEFAULT_TOTAL: u32 = 5;
const CELEBRATION_PERCENTAGE: u32 = 70;

/// Final score of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Results {
    pub score: u32,
    pub total: u32,
}

/// Where a finished session sends its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    ExamResults { exam_id: String },
    BattleResults { room_id: String },
    Feed,
}

impl Results {
    pub fn new(score: u32, total: u32) -> Results {
        Results {
            score: score.min(total),
            total,
        }
    }

    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.score as f64 / self.total as f64 * 100.0).round() as u32
    }

    pub fn worth_celebrating(&self) -> bool {
        self.percentage() > CELEBRATION_PERCENTAGE
    }

    pub fn to_query(&self) -> String {
        format!("score={}&total={}", self.score, self.total)
    }

    /// Reads `score` and `total` from a query string. Missing or unreadable
    /// values become 0 and 5.
    pub fn from_query(query: &str) -> Results {
        let score = query_param(query, "score")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let total = query_param(query, "total")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOTAL);
        debug!("[Results] Parsed {:?} -> {}/{}", query, score, total);
        Results::new(score, total)
    }

    /// Splits a results route into its path and the results it carries.
    pub fn from_route(route: &str) -> (&str, Results) {
        match route.split_once('?') {
            Some((path, query)) => (path, Results::from_query(query)),
            None => (route, Results::from_query("")),
        }
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.score, self.total, self.percentage())
    }
}

impl Destination {
    pub fn route(&self, results: &Results) -> String {
        match self {
            Destination::ExamResults { exam_id } => {
                format!("/exams/{}/results?{}", exam_id, results.to_query())
            }
            Destination::BattleResults { room_id } => {
                format!("/battle/results?roomId={}&{}", room_id, results.to_query())
            }
            Destination::Feed => "/current-affairs".to_string(),
        }
    }
}

pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
