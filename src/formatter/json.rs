use serde::{Deserialize, Serialize};

use crate::collector::SoamEvent;
use crate::mib::DmHistoryEntry;

/// JSON документ для каждого собранного события.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventJson {
    pub node_id: String,
    pub address: String,
    pub table: String,
    pub timestamp: String,
    pub summary: EventSummary,
    pub records: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub row_count: usize,
    pub partial: bool,
    /// Интервалы, помеченные агентом как ненадёжные.
    pub suspect_intervals: usize,
    /// Худшая двусторонняя задержка по всем интервалам, микросекунды.
    pub two_way_delay_max: Option<u32>,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_event(event: &SoamEvent) -> anyhow::Result<EventJson> {
        let records = event
            .records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EventJson {
            node_id: event.node_id.clone(),
            address: event.address.clone(),
            table: event.table.to_string(),
            timestamp: event.collected_at.to_rfc3339(),
            summary: Self::summarize(event.partial, &event.records),
            records,
        })
    }

    fn summarize(partial: bool, records: &[DmHistoryEntry]) -> EventSummary {
        EventSummary {
            row_count: records.len(),
            partial,
            suspect_intervals: records.iter().filter(|r| r.suspect).count(),
            two_way_delay_max: records.iter().map(|r| r.frame_delay_two_way_max).max(),
        }
    }

    /// Событие одной строкой, для логов.
    pub fn to_json_compact(event: &SoamEvent) -> anyhow::Result<String> {
        let json = Self::format_event(event)?;
        serde_json::to_string(&json).map_err(|e| anyhow::anyhow!("failed to serialize event: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry(history_index: u32, suspect: bool, max: u32) -> DmHistoryEntry {
        DmHistoryEntry {
            md_index: 1,
            ma_index: 1,
            mep_id: 1,
            cfg_index: 1,
            history_index,
            end_time: "2026-10-19T08:00:00+00:00".to_string(),
            elapsed_time: 90_000,
            suspect,
            frame_delay_two_way_min: 10,
            frame_delay_two_way_max: max,
            frame_delay_two_way_avg: 20,
            frame_delay_forward_min: None,
            frame_delay_forward_max: None,
            frame_delay_forward_avg: Some(12),
            frame_delay_backward_min: None,
            frame_delay_backward_max: None,
            frame_delay_backward_avg: None,
            ifdv_forward_min: None,
            ifdv_forward_max: None,
            ifdv_forward_avg: None,
            ifdv_backward_min: None,
            ifdv_backward_max: None,
            ifdv_backward_avg: None,
        }
    }

    fn event(records: Vec<DmHistoryEntry>) -> SoamEvent {
        SoamEvent {
            node_id: "n1".to_string(),
            address: "192.0.2.1:161".to_string(),
            table: "mefSoamDmHistoryStatsTable",
            collected_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 1, 0).unwrap(),
            partial: true,
            records,
        }
    }

    #[test]
    fn summary_counts_suspect_intervals_and_worst_delay() {
        let json =
            JsonFormatter::format_event(&event(vec![entry(1, false, 40), entry(2, true, 95)]))
                .unwrap();

        assert_eq!(
            json.summary,
            EventSummary {
                row_count: 2,
                partial: true,
                suspect_intervals: 1,
                two_way_delay_max: Some(95),
            }
        );
        assert_eq!(json.timestamp, "2026-10-19T08:01:00+00:00");
    }

    #[test]
    fn records_use_camel_case_and_skip_absent_columns() {
        let line = JsonFormatter::to_json_compact(&event(vec![entry(1, false, 40)])).unwrap();
        assert!(line.contains("\"frameDelayTwoWayMax\":40"));
        assert!(line.contains("\"frameDelayForwardAvg\":12"));
        assert!(!line.contains("frameDelayForwardMin"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn empty_event_has_no_worst_delay() {
        let json = JsonFormatter::format_event(&event(Vec::new())).unwrap();
        assert_eq!(json.summary.two_way_delay_max, None);
        assert_eq!(json.summary.row_count, 0);
    }
}
