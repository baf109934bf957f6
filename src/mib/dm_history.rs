//! `mefSoamDmHistoryStatsTable` из MEF-SOAM-PM-MIB: завершённые интервалы измерения задержки.
//!
//! Индекс строки: `dot1agCfmMdIndex`, `dot1agCfmMaIndex`,
//! `dot1agCfmMepIdentifier`, `mefSoamDmCfgIndex` и `mefSoamDmHistoryStatsIndex`.

use std::fmt;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;

use crate::error::FieldError;
use crate::snmp::{ObjectId, SnmpValue};
use crate::table::{Column, RowIndex, TableShape};

pub const TABLE_NAME: &str = "mefSoamDmHistoryStatsTable";

/// `mefSoamDmHistoryStatsEntry`.
pub fn default_entry_oid() -> ObjectId {
    crate::oid![1, 3, 6, 1, 4, 1, 15007, 1, 3, 1, 4, 4, 1]
}

pub type DmHistoryShape = TableShape<DmHistoryBuilder, DmHistoryEntry>;

/// Один завершённый интервал измерения. Задержки в микросекундах.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmHistoryEntry {
    pub md_index: u32,
    pub ma_index: u32,
    pub mep_id: u32,
    pub cfg_index: u32,
    pub history_index: u32,
    pub end_time: String,
    /// Сотые доли секунды.
    pub elapsed_time: u32,
    pub suspect: bool,
    pub frame_delay_two_way_min: u32,
    pub frame_delay_two_way_max: u32,
    pub frame_delay_two_way_avg: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_forward_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_forward_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_forward_avg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_backward_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_backward_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_delay_backward_avg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_forward_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_forward_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_forward_avg: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_backward_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_backward_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifdv_backward_avg: Option<u32>,
}

#[derive(Debug, Default)]
pub struct DmHistoryBuilder {
    history_index: Option<u32>,
    end_time: Option<String>,
    elapsed_time: Option<u32>,
    suspect: Option<bool>,
    two_way: [Option<u32>; 3],
    forward: [Option<u32>; 3],
    backward: [Option<u32>; 3],
    ifdv_forward: [Option<u32>; 3],
    ifdv_backward: [Option<u32>; 3],
}

macro_rules! delay_column {
    ($id:expr, $name:expr, $group:ident, $slot:expr, $required:expr) => {
        Column {
            id: $id,
            name: $name,
            required: $required,
            set: |b: &mut DmHistoryBuilder, v: &SnmpValue| {
                b.$group[$slot] = Some(v.as_u32()?);
                Ok(())
            },
        }
    };
}

fn columns() -> Vec<Column<DmHistoryBuilder>> {
    vec![
        // Индексные объекты обычно not-accessible, значение берётся из RowIndex
        Column::optional(
            1,
            "mefSoamDmHistoryStatsIndex",
            |b: &mut DmHistoryBuilder, v: &SnmpValue| {
                b.history_index = Some(v.as_u32()?);
                Ok(())
            },
        ),
        Column::required(
            2,
            "mefSoamDmHistoryStatsEndTime",
            |b: &mut DmHistoryBuilder, v: &SnmpValue| {
                b.end_time = Some(decode_date_and_time(v.as_bytes()?)?);
                Ok(())
            },
        ),
        Column::required(
            3,
            "mefSoamDmHistoryStatsElapsedTime",
            |b: &mut DmHistoryBuilder, v: &SnmpValue| {
                b.elapsed_time = Some(v.as_u32()?);
                Ok(())
            },
        ),
        Column::required(
            4,
            "mefSoamDmHistoryStatsSuspect",
            |b: &mut DmHistoryBuilder, v: &SnmpValue| {
                b.suspect = Some(v.as_truth_value()?);
                Ok(())
            },
        ),
        delay_column!(5, "mefSoamDmHistoryStatsFrameDelayTwoWayMin", two_way, 0, true),
        delay_column!(6, "mefSoamDmHistoryStatsFrameDelayTwoWayMax", two_way, 1, true),
        delay_column!(7, "mefSoamDmHistoryStatsFrameDelayTwoWayAvg", two_way, 2, true),
        delay_column!(8, "mefSoamDmHistoryStatsFrameDelayForwardMin", forward, 0, false),
        delay_column!(9, "mefSoamDmHistoryStatsFrameDelayForwardMax", forward, 1, false),
        delay_column!(10, "mefSoamDmHistoryStatsFrameDelayForwardAvg", forward, 2, false),
        delay_column!(11, "mefSoamDmHistoryStatsFrameDelayBackwardMin", backward, 0, false),
        delay_column!(12, "mefSoamDmHistoryStatsFrameDelayBackwardMax", backward, 1, false),
        delay_column!(13, "mefSoamDmHistoryStatsFrameDelayBackwardAvg", backward, 2, false),
        delay_column!(14, "mefSoamDmHistoryStatsIfdvForwardMin", ifdv_forward, 0, false),
        delay_column!(15, "mefSoamDmHistoryStatsIfdvForwardMax", ifdv_forward, 1, false),
        delay_column!(16, "mefSoamDmHistoryStatsIfdvForwardAvg", ifdv_forward, 2, false),
        delay_column!(17, "mefSoamDmHistoryStatsIfdvBackwardMin", ifdv_backward, 0, false),
        delay_column!(18, "mefSoamDmHistoryStatsIfdvBackwardMax", ifdv_backward, 1, false),
        delay_column!(19, "mefSoamDmHistoryStatsIfdvBackwardAvg", ifdv_backward, 2, false),
    ]
}

fn finish(index: RowIndex, b: DmHistoryBuilder) -> DmHistoryEntry {
    let part = |i: usize| index.parts().get(i).copied().unwrap_or_default();
    DmHistoryEntry {
        md_index: part(0),
        ma_index: part(1),
        mep_id: part(2),
        cfg_index: part(3),
        history_index: b.history_index.unwrap_or_else(|| part(4)),
        end_time: b.end_time.unwrap_or_default(),
        elapsed_time: b.elapsed_time.unwrap_or_default(),
        suspect: b.suspect.unwrap_or_default(),
        frame_delay_two_way_min: b.two_way[0].unwrap_or_default(),
        frame_delay_two_way_max: b.two_way[1].unwrap_or_default(),
        frame_delay_two_way_avg: b.two_way[2].unwrap_or_default(),
        frame_delay_forward_min: b.forward[0],
        frame_delay_forward_max: b.forward[1],
        frame_delay_forward_avg: b.forward[2],
        frame_delay_backward_min: b.backward[0],
        frame_delay_backward_max: b.backward[1],
        frame_delay_backward_avg: b.backward[2],
        ifdv_forward_min: b.ifdv_forward[0],
        ifdv_forward_max: b.ifdv_forward[1],
        ifdv_forward_avg: b.ifdv_forward[2],
        ifdv_backward_min: b.ifdv_backward[0],
        ifdv_backward_max: b.ifdv_backward[1],
        ifdv_backward_avg: b.ifdv_backward[2],
    }
}

/// Форма со стандартным OID записи.
pub fn dm_history_shape() -> DmHistoryShape {
    TableShape::new(TABLE_NAME, default_entry_oid(), 5, columns(), finish)
}

/// SNMPv2-TC DateAndTime (8 или 11 октетов) в виде текста RFC 3339.
pub fn decode_date_and_time(bytes: &[u8]) -> Result<String, FieldError> {
    let invalid = || FieldError {
        expected: "DateAndTime",
        found: format!("{} octets", bytes.len()),
    };

    if bytes.len() != 8 && bytes.len() != 11 {
        return Err(invalid());
    }

    let year = i32::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    let date = NaiveDate::from_ymd_opt(year, u32::from(bytes[2]), u32::from(bytes[3]))
        .ok_or_else(invalid)?;
    let time = date
        .and_hms_milli_opt(
            u32::from(bytes[4]),
            u32::from(bytes[5]),
            u32::from(bytes[6]),
            u32::from(bytes[7]) * 100,
        )
        .ok_or_else(invalid)?;

    let offset_secs = if bytes.len() == 11 {
        let secs = i32::from(bytes[9]) * 3600 + i32::from(bytes[10]) * 60;
        match bytes[8] {
            b'+' => secs,
            b'-' => -secs,
            _ => return Err(invalid()),
        }
    } else {
        0
    };

    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(invalid)?;
    let stamp = offset
        .from_local_datetime(&time)
        .single()
        .ok_or_else(invalid)?;
    Ok(stamp.to_rfc3339())
}

impl fmt::Display for DmHistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MefSoamDmHistoryStatsEntry{{dot1agCfmMdIndex={}, dot1agCfmMaIndex={}, \
             dot1agCfmMepIdentifier={}, mefSoamDmCfgIndex={}, mefSoamDmHistoryStatsIndex={}, \
             endTime={}, elapsedTime={}, suspect={}, frameDelayTwoWayMin={}, \
             frameDelayTwoWayMax={}, frameDelayTwoWayAvg={}",
            self.md_index,
            self.ma_index,
            self.mep_id,
            self.cfg_index,
            self.history_index,
            self.end_time,
            self.elapsed_time,
            self.suspect,
            self.frame_delay_two_way_min,
            self.frame_delay_two_way_max,
            self.frame_delay_two_way_avg,
        )?;

        let optional = [
            ("frameDelayForwardMin", self.frame_delay_forward_min),
            ("frameDelayForwardMax", self.frame_delay_forward_max),
            ("frameDelayForwardAvg", self.frame_delay_forward_avg),
            ("frameDelayBackwardMin", self.frame_delay_backward_min),
            ("frameDelayBackwardMax", self.frame_delay_backward_max),
            ("frameDelayBackwardAvg", self.frame_delay_backward_avg),
            ("ifdvForwardMin", self.ifdv_forward_min),
            ("ifdvForwardMax", self.ifdv_forward_max),
            ("ifdvForwardAvg", self.ifdv_forward_avg),
            ("ifdvBackwardMin", self.ifdv_backward_min),
            ("ifdvBackwardMax", self.ifdv_backward_max),
            ("ifdvBackwardAvg", self.ifdv_backward_avg),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                write!(f, ", {}={}", name, value)?;
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::Credential;
    use crate::snmp::sim::SimulatedNetwork;
    use crate::table::{RowSet, TableWalker};
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_date_and_time_with_offset() {
        let bytes = [0x07, 0xe8, 10, 19, 12, 30, 5, 3, b'+', 2, 0];
        assert_eq!(
            decode_date_and_time(&bytes).unwrap(),
            "2024-10-19T12:30:05.300+02:00"
        );
    }

    #[test]
    fn decodes_short_date_and_time_as_utc() {
        let bytes = [0x07, 0xe8, 1, 2, 3, 4, 5, 0];
        assert_eq!(
            decode_date_and_time(&bytes).unwrap(),
            "2024-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(decode_date_and_time(&[0x07, 0xe8, 13, 1, 0, 0, 0, 0]).is_err());
        assert!(decode_date_and_time(&[1, 2, 3]).is_err());
    }

    #[test]
    fn builds_entry_from_index_and_columns() {
        let shape = dm_history_shape();
        let index = [1, 2, 3, 1, 7];
        let cell = |column: u32| {
            let mut arcs = vec![column];
            arcs.extend_from_slice(&index);
            shape.entry().child(&arcs)
        };

        let mut rows = RowSet::new(&shape, 8);
        let cells = [
            (1, SnmpValue::Unsigned32(7)),
            (2, SnmpValue::OctetString(vec![0x07, 0xe8, 10, 19, 12, 0, 0, 0])),
            (3, SnmpValue::Unsigned32(90_000)),
            (4, SnmpValue::Integer(2)),
            (5, SnmpValue::Unsigned32(110)),
            (6, SnmpValue::Unsigned32(480)),
            (7, SnmpValue::Unsigned32(205)),
            (10, SnmpValue::Unsigned32(101)),
        ];
        for (column, value) in &cells {
            rows.accept(&cell(*column), value).unwrap();
        }

        let records = rows.finish().into_records();
        assert_eq!(records.len(), 1);
        let entry = &records[0];
        assert_eq!(entry.md_index, 1);
        assert_eq!(entry.mep_id, 3);
        assert_eq!(entry.history_index, 7);
        assert!(!entry.suspect);
        assert_eq!(entry.frame_delay_two_way_avg, 205);
        assert_eq!(entry.frame_delay_forward_avg, Some(101));
        assert_eq!(entry.frame_delay_forward_min, None);
        assert!(entry.to_string().contains("frameDelayForwardAvg=101"));
        assert!(!entry.to_string().contains("frameDelayForwardMin"));
    }

    #[tokio::test]
    async fn rows_without_index_column_take_history_index_from_row_index() {
        let shape = dm_history_shape();
        let net = SimulatedNetwork::new();
        net.set_row(
            "192.0.2.1",
            shape.entry(),
            &[1, 1, 1, 1, 7],
            [
                (2, SnmpValue::OctetString(vec![0x07, 0xea, 10, 19, 8, 0, 0, 0])),
                (3, SnmpValue::Unsigned32(90_000)),
                (4, SnmpValue::Integer(2)),
                (5, SnmpValue::Unsigned32(100)),
                (6, SnmpValue::Unsigned32(300)),
                (7, SnmpValue::Unsigned32(150)),
            ],
        );

        let result = TableWalker::default()
            .walk(&net, &Credential::new("192.0.2.1", "public"), &shape)
            .await
            .unwrap();

        assert!(result.dropped().is_empty());
        let records = result.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].history_index, 7);
        assert_eq!(records[0].frame_delay_two_way_avg, 150);
    }
}
