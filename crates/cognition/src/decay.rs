//! Time Decay - 时间衰减模型
//!
//! 把记忆年龄转换为乘性权重：
//! - RecencyBoost: 查询提到"最近"时，新记忆加权
//! - NoDecay: 查询带具体时间时，不按年龄衰减
//! - Standard: 一周内不衰减，一月内按月幂次衰减，之后线性降到下限

use chrono::{DateTime, Utc};
use memrank_core::{DecayConfig, QueryFlags};

/// 衰减模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayMode {
    RecencyBoost,
    NoDecay,
    Standard,
}

impl DecayMode {
    /// 根据查询意图选择模式（"最近" 优先于具体时间）
    pub fn for_query(flags: QueryFlags) -> Self {
        if flags.is_recent_reference {
            Self::RecencyBoost
        } else if flags.is_time_reference {
            Self::NoDecay
        } else {
            Self::Standard
        }
    }
}

/// 时间衰减模型
#[derive(Debug, Clone, Default)]
pub struct TimeDecayModel {
    config: DecayConfig,
}

impl TimeDecayModel {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    /// 计算时间因子
    pub fn decay(&self, timestamp: DateTime<Utc>, mode: DecayMode, now: DateTime<Utc>) -> f64 {
        self.decay_for_age(age_days(timestamp, now), mode)
    }

    pub fn decay_for_age(&self, age_days: f64, mode: DecayMode) -> f64 {
        let c = &self.config;
        match mode {
            DecayMode::NoDecay => 1.0,
            DecayMode::RecencyBoost => {
                if age_days <= c.week_days {
                    c.week_boost
                } else if age_days <= c.month_days {
                    c.month_boost
                } else {
                    1.0
                }
            }
            DecayMode::Standard => {
                if age_days <= c.week_days {
                    1.0
                } else if age_days <= c.month_days {
                    c.monthly_base.powf(age_days / c.month_days)
                } else {
                    let capped = age_days.min(c.horizon_days);
                    let remaining = (c.horizon_days - capped) / (c.horizon_days - c.month_days);
                    c.floor + c.span * remaining
                }
            }
        }
    }
}

/// 新近度权重 `1 / (1 + age/horizon)`，用于预筛选的综合分
pub fn recency_weight(timestamp: DateTime<Utc>, now: DateTime<Utc>, horizon_days: f64) -> f64 {
    1.0 / (1.0 + age_days(timestamp, now) / horizon_days)
}

fn age_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - timestamp).num_seconds().max(0)) as f64 / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mode_selection() {
        let recent = QueryFlags {
            is_recent_reference: true,
            is_time_reference: true,
            ..Default::default()
        };
        let timed = QueryFlags {
            is_time_reference: true,
            ..Default::default()
        };

        assert_eq!(DecayMode::for_query(recent), DecayMode::RecencyBoost);
        assert_eq!(DecayMode::for_query(timed), DecayMode::NoDecay);
        assert_eq!(DecayMode::for_query(QueryFlags::default()), DecayMode::Standard);
    }

    #[test]
    fn test_recency_boost_tiers() {
        let model = TimeDecayModel::default();
        assert!(approx(model.decay_for_age(0.0, DecayMode::RecencyBoost), 1.5));
        assert!(approx(model.decay_for_age(7.0, DecayMode::RecencyBoost), 1.5));
        assert!(approx(model.decay_for_age(20.0, DecayMode::RecencyBoost), 1.2));
        assert!(approx(model.decay_for_age(31.0, DecayMode::RecencyBoost), 1.0));
    }

    #[test]
    fn test_no_decay() {
        let model = TimeDecayModel::default();
        assert!(approx(model.decay_for_age(1000.0, DecayMode::NoDecay), 1.0));
    }

    #[test]
    fn test_standard_decay_curve() {
        let model = TimeDecayModel::default();
        assert!(approx(model.decay_for_age(3.0, DecayMode::Standard), 1.0));
        assert!(approx(model.decay_for_age(30.0, DecayMode::Standard), 0.9));
        assert!(approx(model.decay_for_age(15.0, DecayMode::Standard), 0.9f64.sqrt()));

        // 一月之后从 0.8 线性降到 0.5
        assert!(approx(model.decay_for_age(30.0 + 1e-9, DecayMode::Standard), 0.8));
        assert!(approx(model.decay_for_age(365.0, DecayMode::Standard), 0.5));
        assert!(approx(model.decay_for_age(2000.0, DecayMode::Standard), 0.5));
    }

    #[test]
    fn test_standard_decay_is_monotonic() {
        let model = TimeDecayModel::default();
        let mut previous = f64::INFINITY;
        for day in 0..400 {
            let value = model.decay_for_age(day as f64, DecayMode::Standard);
            assert!(value <= previous, "decay increased at day {day}");
            previous = value;
        }
    }

    #[test]
    fn test_future_timestamp_counts_as_new() {
        let model = TimeDecayModel::default();
        let now = Utc::now();
        let future = now + Duration::days(3);
        assert!(approx(model.decay(future, DecayMode::RecencyBoost, now), 1.5));
    }

    #[test]
    fn test_recency_weight() {
        let now = Utc::now();
        assert!(approx(recency_weight(now, now, 30.0), 1.0));
        assert!(approx(recency_weight(now - Duration::days(30), now, 30.0), 0.5));
    }
}
