//! Replays stored exchanges as model context.

use escapebot_types::llm::Message;
use escapebot_types::session::HistoryRecord;
use tracing::warn;

/// Expand the `limit` most recent records into user/assistant message pairs.
///
/// `records` must be ordered oldest first, as the store returns them.
/// Records missing a message or a reply are skipped.
pub fn window(records: Vec<HistoryRecord>, limit: usize) -> impl Iterator<Item = Message> {
    let skip = records.len().saturating_sub(limit);

    records
        .into_iter()
        .skip(skip)
        .filter_map(|record| match (record.message, record.reply) {
            (Some(message), Some(reply)) => Some([Message::user(message), Message::assistant(reply)]),
            _ => {
                warn!(
                    timestamp = record.timestamp.as_deref().unwrap_or("unknown"),
                    "skipping incomplete history record"
                );
                None
            }
        })
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use escapebot_types::llm::MessageRole;

    fn record(n: usize) -> HistoryRecord {
        HistoryRecord {
            timestamp: Some(format!("2024-03-01T12:00:{n:02}+09:00")),
            message: Some(format!("q{n}")),
            reply: Some(format!("a{n}")),
        }
    }

    #[test]
    fn test_empty_history_yields_nothing() {
        assert_eq!(window(Vec::new(), 15).count(), 0);
    }

    #[test]
    fn test_pairs_in_chronological_order() {
        let messages: Vec<Message> = window(vec![record(1), record(2)], 15).collect();

        assert_eq!(
            messages,
            vec![
                Message::user("q1"),
                Message::assistant("a1"),
                Message::user("q2"),
                Message::assistant("a2"),
            ]
        );
    }

    #[test]
    fn test_length_is_bounded_by_limit() {
        for k in [0, 1, 14, 15, 16, 40] {
            let records: Vec<HistoryRecord> = (0..k).map(record).collect();
            let messages: Vec<Message> = window(records, 15).collect();
            assert_eq!(messages.len(), k.min(15) * 2);
        }
    }

    #[test]
    fn test_keeps_most_recent_records() {
        let records: Vec<HistoryRecord> = (0..20).map(record).collect();
        let messages: Vec<Message> = window(records, 15).collect();

        assert_eq!(messages.first().unwrap().content, "q5");
        assert_eq!(messages.last().unwrap().content, "a19");
    }

    #[test]
    fn test_incomplete_records_are_dropped_without_touching_neighbours() {
        let records = vec![
            record(1),
            HistoryRecord {
                message: Some("orphan".to_string()),
                ..HistoryRecord::default()
            },
            HistoryRecord {
                reply: Some("orphan".to_string()),
                ..HistoryRecord::default()
            },
            record(2),
        ];

        let messages: Vec<Message> = window(records, 15).collect();
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m.content != "orphan"));
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
    }
}
