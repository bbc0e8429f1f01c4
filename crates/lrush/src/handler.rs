//! Command handler for the lrush shell

use std::fmt;

use lrucache::SharedLruCache;
use serde::Serialize;

use crate::command::Command;

/// Counters reported by `STATS`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
    pub hit_ratio: f64,
}

/// Result of one command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Reply {
    Ok,
    Pong,
    Value(String),
    Nil,
    Integer(usize),
    Keys(Vec<String>),
    Stats(StatsReport),
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Pong => write!(f, "PONG"),
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::Keys(keys) if keys.is_empty() => write!(f, "(empty)"),
            Reply::Keys(keys) => {
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, key)?;
                }
                Ok(())
            }
            Reply::Stats(stats) => write!(
                f,
                "len:{}\ncapacity:{}\nhits:{}\nmisses:{}\ninserts:{}\nupdates:{}\nevictions:{}\nhit_ratio:{:.2}",
                stats.len,
                stats.capacity,
                stats.hits,
                stats.misses,
                stats.inserts,
                stats.updates,
                stats.evictions,
                stats.hit_ratio,
            ),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

pub struct CommandHandler {
    cache: SharedLruCache<String, String>,
}

impl CommandHandler {
    pub fn new(cache: SharedLruCache<String, String>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &SharedLruCache<String, String> {
        &self.cache
    }

    pub fn handle(&self, cmd: Command) -> Reply {
        match cmd {
            Command::Get(key) => Self::value_or_nil(self.cache.get(key.as_str())),
            Command::Peek(key) => Self::value_or_nil(self.cache.peek(key.as_str())),
            Command::Set { key, value } => {
                self.cache.set(key, value);
                Reply::Ok
            }
            Command::Exists(key) => Reply::Integer(usize::from(self.cache.contains(key.as_str()))),
            Command::Len => Reply::Integer(self.cache.len()),
            Command::Keys => Reply::Keys(self.cache.keys()),
            Command::Stats => Reply::Stats(self.stats_report()),
            Command::Ping => Reply::Pong,
        }
    }

    pub fn stats_report(&self) -> StatsReport {
        let snap = self.cache.stats().snapshot();
        StatsReport {
            len: self.cache.len(),
            capacity: self.cache.capacity(),
            hits: snap.hits,
            misses: snap.misses,
            inserts: snap.inserts,
            updates: snap.updates,
            evictions: snap.evictions,
            hit_ratio: snap.hit_ratio,
        }
    }

    fn value_or_nil(value: Option<String>) -> Reply {
        match value {
            Some(v) => Reply::Value(v),
            None => Reply::Nil,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;

    fn handler(capacity: usize) -> CommandHandler {
        CommandHandler::new(SharedLruCache::new(capacity).unwrap())
    }

    fn run(handler: &CommandHandler, line: &str) -> Reply {
        match parse_command(line) {
            Ok(Some(cmd)) => handler.handle(cmd),
            Ok(None) => panic!("no command in {:?}", line),
            Err(e) => Reply::Error(e),
        }
    }

    #[test]
    fn test_ping() {
        let handler = handler(4);
        assert_eq!(run(&handler, "PING"), Reply::Pong);
    }

    #[test]
    fn test_set_and_get() {
        let handler = handler(4);

        assert_eq!(run(&handler, "SET mykey myvalue"), Reply::Ok);
        assert_eq!(run(&handler, "GET mykey"), Reply::Value("myvalue".to_string()));
        assert_eq!(run(&handler, "GET other"), Reply::Nil);
        assert_eq!(run(&handler, "EXISTS mykey"), Reply::Integer(1));
        assert_eq!(run(&handler, "EXISTS other"), Reply::Integer(0));
    }

    #[test]
    fn test_two_entry_scenario() {
        let handler = handler(2);

        run(&handler, "SET 1 a");
        run(&handler, "SET 2 b");
        assert_eq!(run(&handler, "GET 1"), Reply::Value("a".to_string()));

        run(&handler, "SET 3 c");
        assert_eq!(run(&handler, "GET 2"), Reply::Nil);
        assert_eq!(run(&handler, "GET 3"), Reply::Value("c".to_string()));
        assert_eq!(run(&handler, "GET 1"), Reply::Value("a".to_string()));

        run(&handler, "SET 1 z");
        assert_eq!(run(&handler, "GET 1"), Reply::Value("z".to_string()));
        assert_eq!(run(&handler, "LEN"), Reply::Integer(2));
        assert_eq!(
            run(&handler, "KEYS"),
            Reply::Keys(vec!["1".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_peek_keeps_order() {
        let handler = handler(2);

        run(&handler, "SET a 1");
        run(&handler, "SET b 2");
        assert_eq!(run(&handler, "PEEK a"), Reply::Value("1".to_string()));
        run(&handler, "SET c 3");

        assert_eq!(run(&handler, "PEEK a"), Reply::Nil);
    }

    #[test]
    fn test_stats() {
        let handler = handler(1);

        run(&handler, "SET a 1");
        run(&handler, "SET a 2");
        run(&handler, "SET b 3");
        run(&handler, "GET b");
        run(&handler, "GET a");

        let report = handler.stats_report();
        assert_eq!(report.len, 1);
        assert_eq!(report.capacity, 1);
        assert_eq!(report.inserts, 2);
        assert_eq!(report.updates, 1);
        assert_eq!(report.evictions, 1);
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 1);
        assert_eq!(report.hit_ratio, 0.5);
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::Nil.to_string(), "(nil)");
        assert_eq!(Reply::Keys(vec![]).to_string(), "(empty)");
        assert_eq!(
            Reply::Keys(vec!["x".to_string(), "y".to_string()]).to_string(),
            "1) x\n2) y"
        );
        assert_eq!(
            Reply::Error("unknown command 'NOPE'".to_string()).to_string(),
            "ERR unknown command 'NOPE'"
        );
    }

    #[test]
    fn test_reply_json() {
        assert_eq!(
            serde_json::to_string(&Reply::Value("a".to_string())).unwrap(),
            r#"{"type":"value","data":"a"}"#
        );
        assert_eq!(serde_json::to_string(&Reply::Nil).unwrap(), r#"{"type":"nil"}"#);
        assert_eq!(
            serde_json::to_string(&Reply::Keys(vec!["k".to_string()])).unwrap(),
            r#"{"type":"keys","data":["k"]}"#
        );
    }
}
