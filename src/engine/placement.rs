// ==========================================
// 设备异常检修排程引擎 - 窗口落位策略
// ==========================================
// 职责: 决定合成窗口的开始时间
// ==========================================

use crate::domain::maintenance_window::MaintenanceWindow;
use chrono::{DateTime, Utc};

/// 窗口落位策略
pub trait WindowPlacement: Send + Sync {
    /// 策略名称（日志用）
    fn name(&self) -> &'static str;

    /// 计算新窗口的开始时间
    fn start_date(&self, now: DateTime<Utc>, existing: &[MaintenanceWindow]) -> DateTime<Utc>;
}

/// 立即开始: start = now
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediatePlacement;

impl WindowPlacement for ImmediatePlacement {
    fn name(&self) -> &'static str {
        "immediate"
    }

    fn start_date(&self, now: DateTime<Utc>, _existing: &[MaintenanceWindow]) -> DateTime<Utc> {
        now
    }
}

/// 下一个空档: start = max(now, 所有活动窗口的最晚结束时间)
///
/// 已完成与已取消的窗口不占用时段。
#[derive(Debug, Clone, Copy, Default)]
pub struct NextAvailableSlot;

impl WindowPlacement for NextAvailableSlot {
    fn name(&self) -> &'static str {
        "next_available_slot"
    }

    fn start_date(&self, now: DateTime<Utc>, existing: &[MaintenanceWindow]) -> DateTime<Utc> {
        existing
            .iter()
            .filter(|w| w.status.is_active())
            .map(|w| w.end_date)
            .fold(now, |latest, end| latest.max(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{WindowStatus, WindowType};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_immediate() {
        assert_eq!(ImmediatePlacement.start_date(now(), &[]), now());
    }

    #[test]
    fn test_next_available_slot_skips_inactive_windows() {
        let active = MaintenanceWindow::planned("A", WindowType::Minor, 5.0, now() + Duration::days(1), false);
        let mut cancelled =
            MaintenanceWindow::planned("C", WindowType::Major, 30.0, now() + Duration::days(1), false);
        cancelled.status = WindowStatus::Cancelled;

        let start = NextAvailableSlot.start_date(now(), &[active.clone(), cancelled]);
        assert_eq!(start, active.end_date);
    }

    #[test]
    fn test_next_available_slot_never_in_past() {
        let past = MaintenanceWindow::planned("P", WindowType::Force, 1.0, now() - Duration::days(10), false);
        assert_eq!(NextAvailableSlot.start_date(now(), &[past]), now());
    }
}
