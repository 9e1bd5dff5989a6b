use std::fmt;

/// Uptime and downtime carried from one report to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UptimeLedger {
    target_days: u64,
    previous_uptime_days: u64,
    total_downtime_days: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UptimeReport {
    pub current_uptime_days: u64,
    pub total_uptime_days: u64,
    pub total_downtime_days: u64,
}

impl UptimeLedger {
    pub fn new(target_days: u64) -> Self {
        Self {
            target_days,
            previous_uptime_days: 0,
            total_downtime_days: 0,
        }
    }

    /// Adds this period's shortfall against the target to the downtime total.
    pub fn record(&mut self, current_uptime_days: u64) -> UptimeReport {
        self.total_downtime_days += self.target_days.saturating_sub(current_uptime_days);
        UptimeReport {
            current_uptime_days,
            total_uptime_days: current_uptime_days + self.previous_uptime_days,
            total_downtime_days: self.total_downtime_days,
        }
    }

    /// Called once the report has been delivered.
    pub fn carry_forward(&mut self, report: &UptimeReport) {
        self.previous_uptime_days = report.total_uptime_days;
    }
}

impl fmt::Display for UptimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Current uptime: {} days\nTotal uptime: {} days\nTotal downtime: {} days",
            self.current_uptime_days, self.total_uptime_days, self.total_downtime_days
        )
    }
}
