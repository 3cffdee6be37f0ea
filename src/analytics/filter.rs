//! Report filter parsing
//!
//! Raw filter strings (as typed on the command line) are validated once into a
//! [`ReportFilter`], which then renders itself as SQL predicates.

use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::types::Value;

use crate::core::entity::format_timestamp;
use crate::core::error::{Result, ShgError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Store;
use crate::entities::Sponsor;

/// Unvalidated report filters
#[derive(Debug, Default, Clone)]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cluster: Option<String>,
    pub facilitator: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub woreda: Option<String>,
    pub group_age: Option<String>,
    /// Restrict to a single group (scope reports)
    pub group: Option<String>,
}

/// Inclusive UTC time window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Validated report filters
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilter {
    /// Survey timestamp window
    pub period: Option<DateRange>,
    /// Cluster or facilitator owning the groups
    pub owner: Option<Sponsor>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub woreda: Option<String>,
    /// Group creation window derived from a group age in years
    pub group_window: Option<DateRange>,
    pub group: Option<EntityId>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

/// Parse a filter date; a bare date resolves to the start or end of that day
pub fn parse_date(s: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(if end_of_day { end_of(date) } else { start_of(date) });
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ShgError::validation(format!(
                "Invalid date '{}'. Use YYYY-MM-DD or an RFC 3339 date-time.",
                s
            ))
        })
}

/// Creation window for groups that are `age` whole years old on `as_of`
pub fn group_age_window(age: u32, as_of: NaiveDate) -> Result<DateRange> {
    let out_of_range = || ShgError::validation(format!("group_age {} is out of range", age));
    let newest_months = age.checked_mul(12).ok_or_else(out_of_range)?;
    let oldest_months = newest_months.checked_add(12).ok_or_else(out_of_range)?;
    let oldest = as_of
        .checked_sub_months(Months::new(oldest_months))
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .ok_or_else(out_of_range)?;
    let newest = as_of
        .checked_sub_months(Months::new(newest_months))
        .ok_or_else(out_of_range)?;
    Ok(DateRange {
        start: start_of(oldest),
        end: end_of(newest),
    })
}

impl ReportFilter {
    /// A filter with no restrictions
    pub fn all() -> Self {
        Self {
            period: None,
            owner: None,
            region: None,
            zone: None,
            woreda: None,
            group_window: None,
            group: None,
        }
    }

    /// Validate raw filters; ids are resolved and must exist in the store
    pub fn parse(params: &FilterParams, store: &Store, as_of: NaiveDate) -> Result<Self> {
        let period = match (non_empty(&params.start_date), non_empty(&params.end_date)) {
            (Some(start), Some(end)) => {
                let range = DateRange {
                    start: parse_date(&start, false)?,
                    end: parse_date(&end, true)?,
                };
                if range.start > range.end {
                    return Err(ShgError::validation(
                        "start_date must not be after end_date.",
                    ));
                }
                Some(range)
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("date filter needs both start_date and end_date; ignoring it");
                None
            }
            (None, None) => None,
        };

        let owner = match (non_empty(&params.cluster), non_empty(&params.facilitator)) {
            (Some(_), Some(_)) => {
                return Err(ShgError::validation(
                    "Filter by cluster or by facilitator, not both.",
                ))
            }
            (Some(cluster), None) => {
                let id = store.resolve_id(&cluster, EntityPrefix::Clu)?;
                store.require(&id)?;
                Some(Sponsor::Cluster(id))
            }
            (None, Some(facilitator)) => {
                let id = store.resolve_id(&facilitator, EntityPrefix::Stf)?;
                store.require(&id)?;
                Some(Sponsor::Facilitator(id))
            }
            (None, None) => None,
        };

        let group_window = match non_empty(&params.group_age) {
            Some(raw) => {
                let age: u32 = raw.parse().map_err(|_| {
                    ShgError::validation(format!(
                        "group_age must be a non-negative whole number of years, got '{}'",
                        raw
                    ))
                })?;
                Some(group_age_window(age, as_of)?)
            }
            None => None,
        };

        let group = match non_empty(&params.group) {
            Some(raw) => {
                let id = store.resolve_id(&raw, EntityPrefix::Shg)?;
                store.require(&id)?;
                Some(id)
            }
            None => None,
        };

        Ok(Self {
            period,
            owner,
            region: non_empty(&params.region),
            zone: non_empty(&params.zone),
            woreda: non_empty(&params.woreda),
            group_window,
            group,
        })
    }

    /// Predicates on the `g` (groups) alias, each prefixed with " AND"
    pub fn group_clause(&self, sql: &mut String, values: &mut Vec<Value>) {
        match &self.owner {
            Some(Sponsor::Cluster(id)) => {
                sql.push_str(" AND g.cluster_id = ?");
                values.push(Value::Text(id.to_string()));
            }
            Some(Sponsor::Facilitator(id)) => {
                sql.push_str(" AND g.facilitator_id = ?");
                values.push(Value::Text(id.to_string()));
            }
            None => {}
        }

        for (column, value) in [
            ("g.region", &self.region),
            ("g.zone", &self.zone),
            ("g.woreda", &self.woreda),
        ] {
            if let Some(v) = value {
                sql.push_str(&format!(" AND {} = ?", column));
                values.push(Value::Text(v.clone()));
            }
        }

        if let Some(window) = &self.group_window {
            sql.push_str(" AND g.created_at BETWEEN ? AND ?");
            values.push(Value::Text(format_timestamp(&window.start)));
            values.push(Value::Text(format_timestamp(&window.end)));
        }

        if let Some(group) = &self.group {
            sql.push_str(" AND g.id = ?");
            values.push(Value::Text(group.to_string()));
        }
    }

    /// Survey timestamp predicate on the `s` alias
    pub fn period_clause(&self, sql: &mut String, values: &mut Vec<Value>) {
        if let Some(period) = &self.period {
            sql.push_str(" AND s.created_at BETWEEN ? AND ?");
            values.push(Value::Text(format_timestamp(&period.start)));
            values.push(Value::Text(format_timestamp(&period.end)));
        }
    }
}
