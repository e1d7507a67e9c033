use std::collections::HashMap;

use chrono::{DateTime, Utc};
use platform_authn::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::opportunity::Opportunity;
use crate::stage::Stage;
use crate::user::User;

/// Summary cards above the opportunity table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    pub total_value: f64,
    pub average_value: f64,
    pub average_probability: f64,
    pub active_count: usize,
}

pub fn quick_stats<'a>(records: impl IntoIterator<Item = &'a Opportunity>) -> QuickStats {
    let mut stats = QuickStats::default();
    let mut count = 0usize;
    let mut probability_sum = 0f64;
    for record in records {
        count += 1;
        stats.total_value += record.value;
        probability_sum += f64::from(record.probability);
        if !record.stage.is_closed() {
            stats.active_count += 1;
        }
    }
    if count > 0 {
        stats.average_value = stats.total_value / count as f64;
        stats.average_probability = probability_sum / count as f64;
    }
    stats
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_revenue: f64,
    pub active_opportunities: usize,
    pub conversion_rate: f64,
    pub average_value: f64,
    pub won_deals: usize,
}

pub fn dashboard_metrics(records: &[Opportunity]) -> DashboardMetrics {
    let total = records.len();
    let won: Vec<&Opportunity> = records.iter().filter(|r| r.stage.is_won()).collect();
    let total_value: f64 = records.iter().map(|r| r.value).sum();
    DashboardMetrics {
        total_revenue: won.iter().map(|r| r.value).sum(),
        active_opportunities: records.iter().filter(|r| !r.stage.is_closed()).count(),
        conversion_rate: percentage(won.len(), total),
        average_value: if total > 0 { total_value / total as f64 } else { 0.0 },
        won_deals: won.len(),
    }
}

/// Record count per stage, pipeline order, empty stages omitted.
pub fn stage_distribution(records: &[Opportunity]) -> Vec<(Stage, usize)> {
    Stage::ALL
        .into_iter()
        .map(|stage| (stage, records.iter().filter(|r| r.stage == stage).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

/// Highest-value records still in play.
pub fn top_open(records: &[Opportunity], limit: usize) -> Vec<&Opportunity> {
    let mut open: Vec<&Opportunity> = records.iter().filter(|r| !r.stage.is_closed()).collect();
    open.sort_by(|a, b| b.value.total_cmp(&a.value));
    open.truncate(limit);
    open
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub opportunities_count: usize,
    pub activities_count: usize,
    pub total_value: f64,
    pub won_deals: usize,
    pub last_active: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_opportunities: usize,
    pub total_revenue: f64,
    pub avg_opportunity_value: f64,
    pub conversion_rate: f64,
    pub total_activities: usize,
    pub user_stats: Vec<UserStat>,
}

pub fn admin_stats(
    users: &[User],
    opportunities: &[Opportunity],
    activities: &[ActivityLog],
) -> AdminStats {
    let metrics = dashboard_metrics(opportunities);

    let mut by_owner: HashMap<Uuid, Vec<&Opportunity>> = HashMap::new();
    for record in opportunities {
        by_owner.entry(record.owner_id).or_default().push(record);
    }
    let mut activity_count: HashMap<Uuid, usize> = HashMap::new();
    let mut last_activity: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for entry in activities {
        *activity_count.entry(entry.user_id).or_default() += 1;
        last_activity
            .entry(entry.user_id)
            .and_modify(|ts| *ts = (*ts).max(entry.created_at))
            .or_insert(entry.created_at);
    }

    let user_stats = users
        .iter()
        .map(|user| {
            let owned = by_owner.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
            UserStat {
                user_id: user.id,
                email: user.email.clone(),
                name: if user.name.is_empty() {
                    user.email.clone()
                } else {
                    user.name.clone()
                },
                role: user.role,
                opportunities_count: owned.len(),
                activities_count: activity_count.get(&user.id).copied().unwrap_or(0),
                total_value: owned.iter().map(|r| r.value).sum(),
                won_deals: owned.iter().filter(|r| r.stage.is_won()).count(),
                last_active: last_activity
                    .get(&user.id)
                    .copied()
                    .unwrap_or(user.created_at),
            }
        })
        .collect();

    AdminStats {
        total_users: users.len(),
        total_opportunities: opportunities.len(),
        total_revenue: metrics.total_revenue,
        avg_opportunity_value: metrics.average_value,
        conversion_rate: metrics.conversion_rate,
        total_activities: activities.len(),
        user_stats,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
